use std::path::PathBuf;

use pv_types::{Namespace, RunId, TypeError};

/// Errors from run store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No run exists for the requested `(id, namespace)` pair.
    #[error("invalid run id `{id}` (namespace `{namespace}`)")]
    NotFound { id: RunId, namespace: Namespace },

    /// The backing medium rejected a write. The run is not retrievable.
    #[error("could not write run `{id}` to {}: {source}", path.display())]
    WriteFailure {
        /// The id the run would have been stored under.
        id: RunId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file name does not follow the `<id>.<namespace>.<suffix>` grammar.
    #[error("malformed run file name {file_name:?}: {reason}")]
    MalformedFilename { file_name: String, reason: String },

    /// A foundation type rejected its input, e.g. a run id or namespace that
    /// cannot be used as a file-name component.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` if the error reports a missing run.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The id of the run a failed write was attempting to store.
    pub fn attempted_id(&self) -> Option<&RunId> {
        match self {
            Self::WriteFailure { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_mentions_id() {
        let err = StoreError::NotFound {
            id: RunId::new("nonexistent-id").unwrap(),
            namespace: Namespace::new("nonexistent-namespace").unwrap(),
        };
        assert!(err.is_not_found());
        assert!(err.to_string().contains("nonexistent-id"));
        assert!(err.to_string().starts_with("invalid run id"));
    }

    #[test]
    fn write_failure_carries_attempted_id() {
        let err = StoreError::WriteFailure {
            id: RunId::new("r1").unwrap(),
            path: PathBuf::from("/nowhere/r1.app.pvrun"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.attempted_id().map(RunId::as_str), Some("r1"));
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("/nowhere/r1.app.pvrun"));
    }

    #[test]
    fn type_errors_are_transparent() {
        let type_err = pv_types::validate_component("a.b").unwrap_err();
        let expected = type_err.to_string();
        let err = StoreError::from(type_err);
        assert_eq!(err.to_string(), expected);
        assert!(matches!(err, StoreError::Type(TypeError::InvalidName { .. })));
        assert!(err.attempted_id().is_none());
    }

    #[test]
    fn call_edge_errors_keep_their_kind() {
        let err = StoreError::from(TypeError::InvalidCallEdge("==>".into()));
        assert!(matches!(err, StoreError::Type(TypeError::InvalidCallEdge(_))));
        assert!(!err.is_not_found());
    }
}
