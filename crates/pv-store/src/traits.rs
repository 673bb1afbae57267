//! The [`RunStore`] trait defining the run persistence interface.
//!
//! Any backend (filesystem, in-memory, database) implements this trait to
//! save and fetch profiling runs and to enumerate what it holds.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use pv_types::{group_entries, Namespace, Payload, RunEntry, RunGroup, RunId};

use crate::error::{StoreError, StoreResult};

/// A run fetched from a store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredRun {
    pub id: RunId,
    pub namespace: Namespace,
    /// The deserialized profiling payload.
    pub payload: Payload,
    /// Human-readable description derived from the namespace.
    pub description: String,
}

/// Storage backend for profiling runs.
///
/// All implementations must satisfy these invariants:
/// - `(id, namespace)` maps to at most one payload; saving the same pair
///   again replaces it.
/// - Payloads round-trip exactly: `get` returns a value equal to the one
///   passed to `save`.
/// - Listings are ordered most recent first.
/// - Backend I/O errors are converted to [`StoreError`] at this boundary.
pub trait RunStore: Send + Sync {
    /// Persist `payload` under `namespace`.
    ///
    /// If `id` is `None` a fresh id is generated. Returns the id used. On
    /// [`StoreError::WriteFailure`] the error carries the attempted id and the
    /// run is not retrievable.
    fn save(
        &self,
        payload: &Payload,
        namespace: &Namespace,
        id: Option<&RunId>,
    ) -> StoreResult<RunId>;

    /// Fetch the run saved under `(id, namespace)`.
    ///
    /// Returns [`StoreError::NotFound`] if there is none.
    fn get(&self, id: &RunId, namespace: &Namespace) -> StoreResult<StoredRun>;

    /// Check whether a run exists.
    fn exists(&self, id: &RunId, namespace: &Namespace) -> StoreResult<bool>;

    /// All runs, most recently modified first.
    fn list_runs(&self) -> StoreResult<Vec<RunEntry>>;

    /// Runs in one namespace, most recently modified first.
    fn list_runs_for(&self, namespace: &Namespace) -> StoreResult<Vec<RunEntry>> {
        let mut runs = self.list_runs()?;
        runs.retain(|entry| &entry.namespace == namespace);
        Ok(runs)
    }

    /// Runs grouped by namespace. Groups are ordered by their latest run.
    fn list_by_namespace(&self) -> StoreResult<Vec<RunGroup>> {
        Ok(group_entries(self.list_runs()?))
    }

    /// Namespaces that hold at least one run, ordered by their latest run.
    fn list_sources(&self) -> StoreResult<Vec<Namespace>> {
        Ok(self
            .list_by_namespace()?
            .into_iter()
            .map(|group| group.namespace)
            .collect())
    }

    /// Fetch two runs of the same namespace for side-by-side comparison.
    fn get_pair(
        &self,
        first: &RunId,
        second: &RunId,
        namespace: &Namespace,
    ) -> StoreResult<(StoredRun, StoredRun)> {
        Ok((self.get(first, namespace)?, self.get(second, namespace)?))
    }
}

/// Typed convenience methods available on every [`RunStore`].
pub trait RunStoreExt: RunStore {
    /// Serialize `value` to a payload and save it.
    fn save_as<T: Serialize>(
        &self,
        value: &T,
        namespace: &Namespace,
        id: Option<&RunId>,
    ) -> StoreResult<RunId> {
        let payload =
            serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.save(&payload, namespace, id)
    }

    /// Fetch a run and deserialize its payload into `T`.
    ///
    /// Returns the value together with the run description.
    fn get_as<T: DeserializeOwned>(
        &self,
        id: &RunId,
        namespace: &Namespace,
    ) -> StoreResult<(T, String)> {
        let run = self.get(id, namespace)?;
        let value = serde_json::from_value(run.payload)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok((value, run.description))
    }
}

impl<S: RunStore + ?Sized> RunStoreExt for S {}
