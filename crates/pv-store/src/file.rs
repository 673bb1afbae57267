use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use pv_types::{Namespace, Payload, RunEntry, RunId};

use crate::config::{resolve_dir, DirSource, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::naming::{self, has_run_suffix, parse_file_name};
use crate::traits::{RunStore, StoredRun};

/// A run file found by a directory scan.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ScannedFile {
    path: PathBuf,
    file_name: String,
    modified: SystemTime,
}

/// Filesystem-backed run store: one JSON file per run in a flat directory.
///
/// The file name `<id>.<namespace>.pvrun` is the only index. Listings scan
/// the directory and parse names back, so they cost one `read_dir` plus one
/// `stat` per file.
///
/// The store takes no locks. Concurrent writers to the same run race at the
/// filesystem level; with `atomic_writes` enabled readers always see a
/// complete file.
pub struct FileRunStore {
    dir: PathBuf,
    source: DirSource,
    atomic_writes: bool,
    pretty: bool,
}

impl FileRunStore {
    /// Create a store, resolving the directory from `dir`, then
    /// `config.output_dir`, then the temp directory.
    ///
    /// The directory is not created; saving into a missing directory is a
    /// [`StoreError::WriteFailure`].
    pub fn new(dir: Option<&Path>, config: &StoreConfig) -> Self {
        let (dir, source) = resolve_dir(dir, config);
        debug!(dir = %dir.display(), ?source, "run store opened");
        Self {
            dir,
            source,
            atomic_writes: config.atomic_writes,
            pretty: config.pretty,
        }
    }

    /// Create a store over an explicit directory with default settings.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        Self::new(Some(dir.as_ref()), &StoreConfig::default())
    }

    /// The base directory holding run files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// How the base directory was chosen.
    pub fn dir_source(&self) -> DirSource {
        self.source
    }

    /// Path of the file backing `(id, namespace)`.
    pub fn file_name(&self, id: &RunId, namespace: &Namespace) -> PathBuf {
        naming::file_path(&self.dir, id, namespace)
    }

    /// All run files in the base directory, most recently modified first.
    ///
    /// A missing directory yields an empty list.
    pub fn list_files(&self) -> StoreResult<Vec<PathBuf>> {
        Ok(self.scan()?.into_iter().map(|f| f.path).collect())
    }

    fn scan(&self) -> StoreResult<Vec<ScannedFile>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if !has_run_suffix(&file_name) {
                continue;
            }

            // Follow symlinks like `get` does. Files, or link targets, can
            // disappear between read_dir and stat.
            let metadata = match fs::metadata(entry.path()) {
                Ok(m) => m,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !metadata.is_file() {
                continue;
            }

            files.push(ScannedFile {
                path: entry.path(),
                file_name,
                modified: metadata.modified()?,
            });
        }

        files.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.file_name.cmp(&a.file_name))
        });
        debug!(dir = %self.dir.display(), count = files.len(), "scanned run directory");
        Ok(files)
    }

    fn encode(&self, payload: &Payload) -> StoreResult<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(payload)
        } else {
            serde_json::to_vec(payload)
        };
        bytes.map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if !self.atomic_writes {
            return fs::write(path, bytes);
        }

        // The temp name never carries the run suffix, so scans ignore it.
        let mut tmp = temp_file_builder().tempfile_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Temp files default to owner-only. Run files get the create mode of a plain
/// write instead (0o666 less the umask).
fn temp_file_builder() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
}

impl RunStore for FileRunStore {
    fn save(
        &self,
        payload: &Payload,
        namespace: &Namespace,
        id: Option<&RunId>,
    ) -> StoreResult<RunId> {
        let bytes = self.encode(payload)?;
        let id = id.cloned().unwrap_or_else(RunId::generate);
        let path = self.file_name(&id, namespace);

        if let Err(source) = self.write_file(&path, &bytes) {
            error!(
                id = %id,
                namespace = %namespace,
                path = %path.display(),
                error = %source,
                "could not write run file"
            );
            return Err(StoreError::WriteFailure { id, path, source });
        }

        debug!(id = %id, namespace = %namespace, len = bytes.len(), "saved run");
        Ok(id)
    }

    fn get(&self, id: &RunId, namespace: &Namespace) -> StoreResult<StoredRun> {
        let path = self.file_name(id, namespace);
        let contents = match fs::read(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "could not find run file");
                return Err(StoreError::NotFound {
                    id: id.clone(),
                    namespace: namespace.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let payload: Payload = serde_json::from_slice(&contents)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        Ok(StoredRun {
            id: id.clone(),
            namespace: namespace.clone(),
            payload,
            description: namespace.describe_run(),
        })
    }

    fn exists(&self, id: &RunId, namespace: &Namespace) -> StoreResult<bool> {
        Ok(self.file_name(id, namespace).is_file())
    }

    fn list_runs(&self) -> StoreResult<Vec<RunEntry>> {
        let runs = self
            .scan()?
            .into_iter()
            .filter_map(|file| match parse_file_name(&file.file_name) {
                Ok((id, namespace)) => Some(RunEntry {
                    id,
                    namespace,
                    path: file.path,
                    modified: DateTime::<Utc>::from(file.modified),
                }),
                Err(e) => {
                    debug!(error = %e, "skipping run file");
                    None
                }
            })
            .collect();
        Ok(runs)
    }
}

impl std::fmt::Debug for FileRunStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRunStore")
            .field("dir", &self.dir)
            .field("source", &self.source)
            .field("atomic_writes", &self.atomic_writes)
            .finish()
    }
}
