use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use pv_types::{Namespace, Payload, RunEntry, RunId};

use crate::error::{StoreError, StoreResult};
use crate::naming;
use crate::traits::{RunStore, StoredRun};

#[derive(Clone, Debug)]
struct Record {
    payload: Payload,
    modified: DateTime<Utc>,
    /// Write order; listings sort on this instead of the wall clock.
    seq: u64,
}

#[derive(Default)]
struct Inner {
    runs: HashMap<(Namespace, RunId), Record>,
    next_seq: u64,
}

/// In-memory, HashMap-based run store.
///
/// Intended for tests and embedding. Runs are held behind a `RwLock` and
/// cloned on read. Listing entries report the file name the run would have
/// in a [`FileRunStore`](crate::FileRunStore) as their path.
pub struct InMemoryRunStore {
    inner: RwLock<Inner>,
}

impl InMemoryRunStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Number of runs currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").runs.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all runs from the store.
    pub fn clear(&self) {
        self.inner.write().expect("lock poisoned").runs.clear();
    }
}

impl Default for InMemoryRunStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStore for InMemoryRunStore {
    fn save(
        &self,
        payload: &Payload,
        namespace: &Namespace,
        id: Option<&RunId>,
    ) -> StoreResult<RunId> {
        let id = id.cloned().unwrap_or_else(RunId::generate);
        let mut inner = self.inner.write().expect("lock poisoned");
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.runs.insert(
            (namespace.clone(), id.clone()),
            Record {
                payload: payload.clone(),
                modified: Utc::now(),
                seq,
            },
        );
        Ok(id)
    }

    fn get(&self, id: &RunId, namespace: &Namespace) -> StoreResult<StoredRun> {
        let inner = self.inner.read().expect("lock poisoned");
        let record = inner
            .runs
            .get(&(namespace.clone(), id.clone()))
            .ok_or_else(|| StoreError::NotFound {
                id: id.clone(),
                namespace: namespace.clone(),
            })?;
        Ok(StoredRun {
            id: id.clone(),
            namespace: namespace.clone(),
            payload: record.payload.clone(),
            description: namespace.describe_run(),
        })
    }

    fn exists(&self, id: &RunId, namespace: &Namespace) -> StoreResult<bool> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner.runs.contains_key(&(namespace.clone(), id.clone())))
    }

    fn list_runs(&self) -> StoreResult<Vec<RunEntry>> {
        let inner = self.inner.read().expect("lock poisoned");
        let mut records: Vec<_> = inner.runs.iter().collect();
        records.sort_by(|a, b| b.1.seq.cmp(&a.1.seq));
        Ok(records
            .into_iter()
            .map(|((namespace, id), record)| RunEntry {
                id: id.clone(),
                namespace: namespace.clone(),
                path: PathBuf::from(naming::file_name(id, namespace)),
                modified: record.modified,
            })
            .collect())
    }
}

impl std::fmt::Debug for InMemoryRunStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRunStore")
            .field("run_count", &self.len())
            .finish()
    }
}
