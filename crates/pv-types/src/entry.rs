use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::run::{Namespace, RunId};

/// A stored run as discovered by a listing query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEntry {
    /// The run's identifier.
    pub id: RunId,
    /// The namespace the run was saved under.
    pub namespace: Namespace,
    /// Location of the run on the backing medium.
    pub path: PathBuf,
    /// Last modification time of the run.
    pub modified: DateTime<Utc>,
}

/// Listing entries that share a namespace, most recent first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunGroup {
    pub namespace: Namespace,
    pub runs: Vec<RunEntry>,
}

impl RunGroup {
    /// The most recently modified run in the group.
    pub fn latest(&self) -> Option<&RunEntry> {
        self.runs.first()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Group an ordered entry sequence by namespace.
///
/// Groups appear in the order their namespace is first seen, and entries
/// keep their relative order. Feeding a most-recent-first listing therefore
/// yields groups ordered by their latest run.
pub fn group_entries(entries: impl IntoIterator<Item = RunEntry>) -> Vec<RunGroup> {
    let mut groups: Vec<RunGroup> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|g| g.namespace == entry.namespace) {
            Some(group) => group.runs.push(entry),
            None => groups.push(RunGroup {
                namespace: entry.namespace.clone(),
                runs: vec![entry],
            }),
        }
    }
    groups
}
