//! Retrieval, normalization, and storage of source data on a schedule.
//!
//! # Implementation Model
//!
//! The [`Orchestrator`] owns everything needed to refresh sources: a [`Fetcher`] for HTTP
//! sources, the git syncer and working tree reader for git-backed sources, a [`DistributedLock`]
//! so only one instance syncs a given repository at a time, and the badge cache it writes into.
//!
//! A cycle first walks the cached sources in order and stops at the first one that is missing,
//! stale, or (for git-backed sources) lacks a working tree. If any is found, every cached source
//! is refreshed concurrently, each one independently:
//!
//! - HTTP sources are fetched with retries. A 4xx response is not retried.
//! - Sources with a plugin manifest fetch both documents. Either may be refused without failing
//!   the source.
//! - Git-backed sources take the lock, pull or clone, release the lock, and read the tree. If the
//!   pull fails but an older tree exists, the older tree is used.
//!
//! Whatever was retrieved is normalized and stored together with the cycle start time. A source
//! that fails keeps its previous cache entry.
//!
//! The [`Scheduler`] runs the startup cycle and then one cycle per period until stopped.

pub mod file_tree;
pub mod git;
mod lock;
mod orchestrator;
mod resilient_http;
mod scheduler;

pub use lock::DistributedLock;
pub use orchestrator::{Orchestrator, RefreshOutcome, RefreshReport, SkipReason};
pub use resilient_http::{FetchError, Fetcher, RetryPolicy};
pub use scheduler::Scheduler;
