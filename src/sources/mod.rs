//! The closed set of upstream badge sources and how their data is normalized.
//!
//! Each source has a [`SourceDescriptor`] naming how it is retrieved ([`SourceKind`]) and which
//! [`Format`] its data arrives in. Retrieval produces a [`RawPayload`], and the format's normalizer
//! turns that into a [`crate::badge::BadgeMap`].
//!
//! Normalizers never fail as a whole. A record that does not fit its format's shape is dropped
//! and the rest of the payload is kept.

mod format;
pub mod keywords;
mod normalizers;
mod raw_payload;
mod registry;
mod source_descriptor;
mod source_id;

pub use format::Format;
pub use raw_payload::{RawPayload, TreeSnapshot};
pub use registry::{SourceOverride, SourceRegistry};
pub use source_descriptor::{SourceDescriptor, SourceKind, TreeLayout};
pub use source_id::SourceId;
