//! Foundation types for perfvault.
//!
//! This crate provides the identity and listing types shared by the run
//! store and its callers. Every other perfvault crate depends on `pv-types`.
//!
//! # Key Types
//!
//! - [`RunId`] — Opaque run identifier (caller-supplied or UUID v7 generated)
//! - [`Namespace`] — Caller-defined grouping tag for runs
//! - [`Payload`] — The opaque, arbitrarily nested profiling data
//! - [`RunEntry`] — One run as discovered by a listing query
//! - [`RunGroup`] — Listing entries grouped under a single namespace
//! - [`ProfileData`] — Typed view over the call-edge payload shape

pub mod entry;
pub mod error;
pub mod profile;
pub mod run;

pub use entry::{group_entries, RunEntry, RunGroup};
pub use error::TypeError;
pub use profile::{CallEdge, Metrics, ProfileData, EDGE_SEPARATOR};
pub use run::{validate_component, Namespace, RunId, FIELD_SEPARATOR};

/// The opaque profiling payload.
///
/// No schema is enforced: any nested mapping/sequence/scalar value is a
/// valid payload.
pub type Payload = serde_json::Value;
