//! Run persistence for perfvault.
//!
//! This crate stores profiling runs: opaque, arbitrarily nested payloads
//! produced by an instrumentation engine, each identified by an id that is
//! unique within a namespace. Runs can be fetched back, listed, and grouped
//! by namespace.
//!
//! # Storage Backends
//!
//! All backends implement the [`RunStore`] trait:
//!
//! - [`FileRunStore`] -- one JSON file per run in a flat directory
//! - [`InMemoryRunStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. The file name `<id>.<namespace>.pvrun` is the index; there is no other.
//! 2. Ids and namespaces never contain `.` or path separators.
//! 3. Saving an existing `(id, namespace)` pair overwrites it.
//! 4. Listings are ordered by modification time, most recent first.
//! 5. The store never interprets payload contents.
//! 6. I/O errors are converted to [`StoreError`] and never abort the process.

pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod naming;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{resolve_dir, DirSource, StoreConfig, OUTPUT_DIR_ENV};
pub use error::{StoreError, StoreResult};
pub use file::FileRunStore;
pub use memory::InMemoryRunStore;
pub use naming::RUN_FILE_SUFFIX;
pub use traits::{RunStore, RunStoreExt, StoredRun};
