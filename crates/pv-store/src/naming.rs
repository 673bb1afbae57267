//! Run file naming.
//!
//! A run is stored as `<id>.<namespace>.<suffix>`. The file name is the only
//! index the filesystem store has, so this module is the single place that
//! builds and parses it.

use std::path::{Path, PathBuf};

use pv_types::{Namespace, RunId, FIELD_SEPARATOR};

use crate::error::{StoreError, StoreResult};

/// Fixed suffix marking run files. Changing it orphans existing runs.
pub const RUN_FILE_SUFFIX: &str = "pvrun";

/// File name for a run: `<id>.<namespace>.pvrun`.
pub fn file_name(id: &RunId, namespace: &Namespace) -> String {
    format!("{id}{FIELD_SEPARATOR}{namespace}{FIELD_SEPARATOR}{RUN_FILE_SUFFIX}")
}

/// Full path of a run file under `dir`.
pub fn file_path(dir: &Path, id: &RunId, namespace: &Namespace) -> PathBuf {
    dir.join(file_name(id, namespace))
}

/// Returns `true` if `name` carries the run file suffix.
pub fn has_run_suffix(name: &str) -> bool {
    strip_suffix(name).is_some()
}

fn strip_suffix(name: &str) -> Option<&str> {
    name.strip_suffix(RUN_FILE_SUFFIX)?
        .strip_suffix(FIELD_SEPARATOR)
}

/// Parse a run file name back into its `(id, namespace)` pair.
///
/// Exactly two fields must precede the suffix, and both must be valid
/// components. Anything else is [`StoreError::MalformedFilename`].
pub fn parse_file_name(name: &str) -> StoreResult<(RunId, Namespace)> {
    let malformed = |reason: &str| StoreError::MalformedFilename {
        file_name: name.to_string(),
        reason: reason.to_string(),
    };

    let stem = strip_suffix(name).ok_or_else(|| malformed("missing run file suffix"))?;
    let (id, namespace) = stem
        .split_once(FIELD_SEPARATOR)
        .ok_or_else(|| malformed("expected <id>.<namespace> before the suffix"))?;

    let id = RunId::new(id).map_err(|e| malformed(&format!("bad run id: {e}")))?;
    let namespace =
        Namespace::new(namespace).map_err(|e| malformed(&format!("bad namespace: {e}")))?;
    Ok((id, namespace))
}
