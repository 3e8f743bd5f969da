//! Durable local snapshot of the client preset list.
//!
//! # Responsibility
//! - Hold one named entry with the JSON-serialized preset list.
//! - Encode/decode snapshot and export documents.
//!
//! # Invariants
//! - Every write replaces the whole entry; there are no partial updates.
//! - File-backed writes go through a temp file and rename, so readers never
//!   observe a half-written snapshot.

use crate::client::local_preset::ClientPreset;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

/// Name of the single snapshot entry.
pub const SNAPSHOT_KEY: &str = "three_viewer_presets";

/// Suggested file name for exported documents.
pub const EXPORT_FILE_NAME: &str = "camera_presets.json";

pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[derive(Debug)]
pub enum SnapshotError {
    Io { path: PathBuf, source: io::Error },
    Encode(serde_json::Error),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "snapshot io failed at `{}`: {source}", path.display())
            }
            Self::Encode(err) => write!(f, "failed to encode presets: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
        }
    }
}

/// Storage for the single snapshot entry.
pub trait SnapshotStore {
    /// Returns the stored entry, `None` when nothing was written yet.
    fn load(&self) -> SnapshotResult<Option<String>>;
    /// Replaces the entry wholesale.
    fn save(&mut self, contents: &str) -> SnapshotResult<()>;
    /// Removes the entry. Removing a missing entry succeeds.
    fn clear(&mut self) -> SnapshotResult<()>;
}

/// Snapshot entry kept as one JSON file.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `<dir>/three_viewer_presets.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{SNAPSHOT_KEY}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> SnapshotResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn save(&mut self, contents: &str) -> SnapshotResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
            }
        }

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        std::fs::write(&staging, contents).map_err(|err| self.io_error(err))?;
        std::fs::rename(&staging, &self.path).map_err(|err| {
            let _ = std::fs::remove_file(&staging);
            self.io_error(err)
        })
    }

    fn clear(&mut self) -> SnapshotResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

/// Snapshot entry kept in memory; counts writes for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    contents: Option<String>,
    writes: usize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with an existing entry, as left by an earlier session.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
            writes: 0,
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// Number of `save` calls since construction.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> SnapshotResult<Option<String>> {
        Ok(self.contents.clone())
    }

    fn save(&mut self, contents: &str) -> SnapshotResult<()> {
        self.contents = Some(contents.to_string());
        self.writes += 1;
        Ok(())
    }

    fn clear(&mut self) -> SnapshotResult<()> {
        self.contents = None;
        Ok(())
    }
}

/// Compact encoding used for the snapshot entry.
pub fn encode_snapshot(presets: &[ClientPreset]) -> SnapshotResult<String> {
    serde_json::to_string(presets).map_err(SnapshotError::Encode)
}

/// Human-readable encoding (2-space indent) used for exports.
pub fn encode_export(presets: &[ClientPreset]) -> SnapshotResult<String> {
    serde_json::to_string_pretty(presets).map_err(SnapshotError::Encode)
}

/// Decodes a snapshot or export document.
pub fn decode_presets(contents: &str) -> Result<Vec<ClientPreset>, serde_json::Error> {
    serde_json::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::{FileSnapshotStore, SnapshotStore};

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileSnapshotStore::in_dir(dir.path().join("nested"));

        assert_eq!(store.load().unwrap(), None);
        store.save("[]").unwrap();
        store.save("[1]").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("[1]"));
        assert!(store.path().ends_with("three_viewer_presets.json"));

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn failed_rename_removes_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("three_viewer_presets.json");
        std::fs::create_dir_all(target.join("occupied")).unwrap();
        let mut store = FileSnapshotStore::new(&target);

        assert!(store.save("[]").is_err());
        assert!(!dir.path().join("three_viewer_presets.json.tmp").exists());
        assert!(target.is_dir());
    }
}
