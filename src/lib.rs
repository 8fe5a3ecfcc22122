//! badge-aggregator crate
//!
//! Keeps a shared cache of user badges collected from many independent upstream sources. A periodic
//! refresh cycle pulls each source (plain HTTP documents, documents plus a plugin manifest, or git
//! repositories of per-user files), normalizes it into a common badge shape, and stores it in a
//! key/value store under versioned keys. Consumers read the cache through [`query::QueryService`].
//!
//! The command-line front end in [`commands`] wires these pieces to Redis; the rest of the library
//! only needs something implementing [`store::KvStore`].

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod badge;
pub mod commands;
pub mod config;
pub mod metrics;
pub mod query;
pub mod refresh;
pub mod sources;
pub mod store;

pub use crate::commands::{Host, run};
