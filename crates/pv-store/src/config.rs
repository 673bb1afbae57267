use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Environment variable naming the default run directory.
pub const OUTPUT_DIR_ENV: &str = "PERFVAULT_OUTPUT_DIR";

/// Configuration for a [`FileRunStore`](crate::FileRunStore).
///
/// Loaded from the `[store]` table of a TOML file, from the environment, or
/// built in code. An explicit directory passed to the store constructor
/// always wins over `output_dir`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Default directory for run files.
    pub output_dir: Option<PathBuf>,
    /// Write to a temporary file and rename it into place.
    pub atomic_writes: bool,
    /// Pretty-print payload JSON on disk.
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            atomic_writes: true,
            pretty: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    store: StoreConfig,
}

impl StoreConfig {
    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Parse the `[store]` table of a TOML document. A missing table yields
    /// the defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let file: ConfigFile = toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))?;
        Ok(file.store)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(OUTPUT_DIR_ENV).filter(|v| !v.is_empty()) {
            self.output_dir = Some(PathBuf::from(dir));
        }
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

/// Where a store's base directory came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirSource {
    /// Passed to the constructor.
    Explicit,
    /// Taken from [`StoreConfig::output_dir`].
    Configured,
    /// Neither was set; the platform temp directory is used.
    TempFallback,
}

/// Resolve the base directory: explicit argument, then configuration, then
/// the platform temp directory. Empty paths count as unset.
///
/// Falling back to the temp directory is allowed but logged as a warning,
/// since runs stored there may not survive a reboot.
pub fn resolve_dir(explicit: Option<&Path>, config: &StoreConfig) -> (PathBuf, DirSource) {
    if let Some(dir) = explicit.filter(|d| !d.as_os_str().is_empty()) {
        return (dir.to_path_buf(), DirSource::Explicit);
    }
    if let Some(dir) = config
        .output_dir
        .as_deref()
        .filter(|d| !d.as_os_str().is_empty())
    {
        return (dir.to_path_buf(), DirSource::Configured);
    }

    let dir = std::env::temp_dir();
    tracing::warn!(
        dir = %dir.display(),
        "no run directory configured; falling back to the temp directory \
         (pass a directory to the store or set {OUTPUT_DIR_ENV})"
    );
    (dir, DirSource::TempFallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert!(c.output_dir.is_none());
        assert!(c.atomic_writes);
        assert!(!c.pretty);
    }

    #[test]
    fn parse_store_table() {
        let c = StoreConfig::from_toml_str(
            r#"
            [store]
            output_dir = "/var/lib/perfvault"
            pretty = true
            "#,
        )
        .unwrap();
        assert_eq!(c.output_dir, Some(PathBuf::from("/var/lib/perfvault")));
        assert!(c.pretty);
        assert!(c.atomic_writes);
    }

    #[test]
    fn missing_table_yields_defaults() {
        let c = StoreConfig::from_toml_str("[other]\nkey = 1\n").unwrap();
        assert_eq!(c, StoreConfig::default());
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = StoreConfig::from_toml_str("[store\n").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perfvault.toml");
        std::fs::write(&path, "[store]\natomic_writes = false\n").unwrap();
        let c = StoreConfig::load(&path).unwrap();
        assert!(!c.atomic_writes);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StoreConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn env_override_sets_output_dir() {
        let c = StoreConfig::default().with_overrides_from(|key| {
            (key == OUTPUT_DIR_ENV).then(|| "/srv/runs".to_string())
        });
        assert_eq!(c.output_dir, Some(PathBuf::from("/srv/runs")));
    }

    #[test]
    fn empty_env_value_is_ignored() {
        let c = StoreConfig::default()
            .with_output_dir("/keep")
            .with_overrides_from(|_| Some(String::new()));
        assert_eq!(c.output_dir, Some(PathBuf::from("/keep")));
    }

    #[test]
    fn explicit_dir_wins() {
        let config = StoreConfig::default().with_output_dir("/configured");
        let (dir, source) = resolve_dir(Some(Path::new("/explicit")), &config);
        assert_eq!(dir, PathBuf::from("/explicit"));
        assert_eq!(source, DirSource::Explicit);
    }

    #[test]
    fn configured_dir_used_when_no_explicit() {
        let config = StoreConfig::default().with_output_dir("/configured");
        let (dir, source) = resolve_dir(None, &config);
        assert_eq!(dir, PathBuf::from("/configured"));
        assert_eq!(source, DirSource::Configured);
    }

    #[test]
    fn empty_paths_fall_back_to_temp() {
        let config = StoreConfig::default().with_output_dir("");
        let (dir, source) = resolve_dir(Some(Path::new("")), &config);
        assert_eq!(dir, std::env::temp_dir());
        assert_eq!(source, DirSource::TempFallback);
    }
}
