//! Preset synchronization between the viewer list, local snapshot and store.
//!
//! # Responsibility
//! - Own the single in-memory preset list and its durable snapshot.
//! - Mediate save / delete / reconcile / import / export / clear actions.
//! - Surface every outcome through the notifier.
//!
//! # Invariants
//! - The list is most-recent-first; persisted saves are prepended.
//! - A failed save leaves the list and snapshot untouched.
//! - A preset is never dropped locally when the store failed to delete it.
//! - Every list mutation rewrites the whole snapshot.
//! - Saving without a current user never contacts the store.
//!
//! Initialization order: `load()` the snapshot, then optionally `reconcile()`.

use crate::client::local_preset::{ClientPreset, LocalId, PresetIdentity};
use crate::client::notify::{Notice, Notifier};
use crate::client::remote::{PresetRemote, RemoteError};
use crate::client::snapshot::{
    decode_presets, encode_export, encode_snapshot, SnapshotError, SnapshotStore,
};
use crate::client::viewer::ViewerScene;
use chrono::Utc;
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MSG_LOGIN_REQUIRED: &str = "You must be logged in to save a view";
const MSG_SYNC_LOGIN_REQUIRED: &str = "You must be logged in to sync presets";
const MSG_SAVE_OK: &str = "View saved to database!";
const MSG_SAVE_FAILED: &str = "Failed to save";
const MSG_SAVE_UNREACHABLE: &str = "Error connecting to server";
const MSG_DELETE_OK: &str = "Preset deleted successfully";
const MSG_DELETE_REJECTED: &str = "Failed to delete from server";
const MSG_DELETE_FAILED: &str = "Failed to delete preset";
const MSG_UNKNOWN_PRESET: &str = "Preset not found";
const MSG_SYNC_OK: &str = "Presets synced from database";
const MSG_SYNC_FAILED: &str = "Failed to fetch presets";
const MSG_IMPORT_OK: &str = "Presets imported successfully!";
const MSG_IMPORT_INVALID: &str = "Invalid file format";
const MSG_SNAPSHOT_FAILED: &str = "Failed to update local presets";

pub type SyncResult<T> = Result<T, SyncError>;

/// Failure of one client operation.
#[derive(Debug)]
pub enum SyncError {
    /// No identified user; the store was not contacted.
    NotLoggedIn,
    Remote(RemoteError),
    Snapshot(SnapshotError),
    /// Import document is not a preset array.
    InvalidDocument(String),
    UnknownPreset(LocalId),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotLoggedIn => write!(f, "no logged-in user"),
            Self::Remote(err) => write!(f, "{err}"),
            Self::Snapshot(err) => write!(f, "{err}"),
            Self::InvalidDocument(message) => write!(f, "invalid preset document: {message}"),
            Self::UnknownPreset(id) => write!(f, "unknown preset: {id}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            Self::Snapshot(err) => Some(err),
            Self::NotLoggedIn => None,
            Self::InvalidDocument(_) => None,
            Self::UnknownPreset(_) => None,
        }
    }
}

impl From<RemoteError> for SyncError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<SnapshotError> for SyncError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

/// Single owner of the client's preset state.
pub struct PresetSync<R, S, N>
where
    R: PresetRemote,
    S: SnapshotStore,
    N: Notifier,
{
    remote: R,
    snapshot: S,
    notifier: N,
    user: Option<String>,
    presets: Vec<ClientPreset>,
}

impl<R, S, N> PresetSync<R, S, N>
where
    R: PresetRemote,
    S: SnapshotStore,
    N: Notifier,
{
    /// Creates an empty client with no user; call [`Self::load`] next.
    pub fn new(remote: R, snapshot: S, notifier: N) -> Self {
        Self {
            remote,
            snapshot,
            notifier,
            user: None,
            presets: Vec::new(),
        }
    }

    /// Sets the identity supplied by the session provider. Blank ids count as absent.
    pub fn set_user(&mut self, user: Option<String>) {
        self.user = user.filter(|value| !value.trim().is_empty());
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn presets(&self) -> &[ClientPreset] {
        &self.presets
    }

    pub fn find(&self, local_id: LocalId) -> Option<&ClientPreset> {
        self.presets
            .iter()
            .find(|preset| preset.local_id() == local_id)
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    pub fn snapshot_store(&self) -> &S {
        &self.snapshot
    }

    pub fn snapshot_store_mut(&mut self) -> &mut S {
        &mut self.snapshot
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// Replaces the in-memory list with the snapshot contents.
    ///
    /// A missing, unreadable or malformed snapshot yields an empty list.
    /// Returns the number of presets loaded.
    pub fn load(&mut self) -> usize {
        self.presets = match self.snapshot.load() {
            Ok(Some(contents)) => decode_presets(&contents).unwrap_or_else(|err| {
                warn!(
                    "event=snapshot_load module=client status=error error_code=snapshot_invalid error={}",
                    err
                );
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(
                    "event=snapshot_load module=client status=error error_code=snapshot_unreadable error={}",
                    err
                );
                Vec::new()
            }
        };

        info!(
            "event=snapshot_load module=client status=ok count={}",
            self.presets.len()
        );
        self.presets.len()
    }

    /// Captures the live view and persists it to the store.
    ///
    /// `name` defaults to `Preset {n}` when absent or blank.
    ///
    /// # Errors
    /// - `NotLoggedIn` when no user is set; the store is not contacted.
    /// - `Remote` when the store rejects or cannot be reached; the captured
    ///   preset is discarded.
    pub fn save(
        &mut self,
        name: Option<&str>,
        scene: &impl ViewerScene,
    ) -> SyncResult<ClientPreset> {
        let Some(user) = self.user.clone() else {
            self.notifier.notify(Notice::error(MSG_LOGIN_REQUIRED));
            return Err(SyncError::NotLoggedIn);
        };

        let name = name
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Preset {}", self.presets.len() + 1));
        let captured = ClientPreset::capture(user, name, scene, Utc::now());

        let stored = match self.remote.save(&captured) {
            Ok(stored) => stored,
            Err(err) => {
                let message = match &err {
                    RemoteError::Rejected { message, .. } => {
                        message.clone().unwrap_or_else(|| MSG_SAVE_FAILED.to_string())
                    }
                    RemoteError::Transport(_) => MSG_SAVE_UNREACHABLE.to_string(),
                };
                warn!(
                    "event=preset_save module=client status=error local_id={} error={}",
                    captured.local_id(),
                    err
                );
                self.notifier.notify(Notice::error(message));
                return Err(err.into());
            }
        };

        let persisted = captured.into_persisted(stored);
        self.presets.insert(0, persisted.clone());
        self.write_snapshot();

        info!(
            "event=preset_save module=client status=ok local_id={} store_id={}",
            persisted.local_id(),
            persisted.store_id().unwrap_or_default()
        );
        self.notifier.notify(Notice::success(MSG_SAVE_OK));
        Ok(persisted)
    }

    /// Deletes a preset from the store (when persisted) and then locally.
    ///
    /// # Errors
    /// - `UnknownPreset` when `local_id` is not in the list.
    /// - `Remote` when the store delete fails; the preset is kept.
    pub fn delete(&mut self, local_id: LocalId) -> SyncResult<()> {
        let Some(identity) = self.find(local_id).map(|preset| preset.identity.clone()) else {
            self.notifier.notify(Notice::error(MSG_UNKNOWN_PRESET));
            return Err(SyncError::UnknownPreset(local_id));
        };

        if let PresetIdentity::Persisted { store_id, .. } = &identity {
            if let Err(err) = self.remote.delete(store_id) {
                let message = match &err {
                    RemoteError::Rejected { message, .. } => message
                        .clone()
                        .unwrap_or_else(|| MSG_DELETE_REJECTED.to_string()),
                    RemoteError::Transport(_) => MSG_DELETE_FAILED.to_string(),
                };
                warn!(
                    "event=preset_delete module=client status=error local_id={} store_id={} error={}",
                    local_id, store_id, err
                );
                self.notifier.notify(Notice::error(message));
                return Err(err.into());
            }
        }

        let store_id = identity.store_id();
        self.presets.retain(|preset| {
            preset.local_id() != local_id
                && (store_id.is_none() || preset.store_id() != store_id)
        });
        self.write_snapshot();

        info!(
            "event=preset_delete module=client status=ok local_id={} store_id={}",
            local_id,
            store_id.unwrap_or_default()
        );
        self.notifier.notify(Notice::success(MSG_DELETE_OK));
        Ok(())
    }

    /// Replaces the list with the store's view of the current user.
    ///
    /// Known store ids keep their local ids; local-only presets are kept
    /// after the store records. Returns the resulting list length.
    ///
    /// # Errors
    /// - `NotLoggedIn` when no user is set.
    /// - `Remote` when listing fails; state is unchanged.
    pub fn reconcile(&mut self) -> SyncResult<usize> {
        let Some(user) = self.user.clone() else {
            self.notifier.notify(Notice::error(MSG_SYNC_LOGIN_REQUIRED));
            return Err(SyncError::NotLoggedIn);
        };

        let stored = match self.remote.list(&user) {
            Ok(stored) => stored,
            Err(err) => {
                warn!("event=preset_reconcile module=client status=error error={err}");
                let message = err.store_message().unwrap_or(MSG_SYNC_FAILED).to_string();
                self.notifier.notify(Notice::error(message));
                return Err(err.into());
            }
        };

        let mut merged: Vec<ClientPreset> = {
            let known: HashMap<&str, LocalId> = self
                .presets
                .iter()
                .filter_map(|preset| preset.store_id().map(|id| (id, preset.local_id())))
                .collect();
            stored
                .into_iter()
                .map(|record| {
                    let local_id = known
                        .get(record.store_id.as_str())
                        .copied()
                        .unwrap_or_else(Uuid::new_v4);
                    ClientPreset::from_stored(local_id, record)
                })
                .collect()
        };
        merged.extend(
            self.presets
                .iter()
                .filter(|preset| preset.store_id().is_none())
                .cloned(),
        );

        self.presets = merged;
        self.write_snapshot();

        info!(
            "event=preset_reconcile module=client status=ok count={}",
            self.presets.len()
        );
        self.notifier.notify(Notice::success(MSG_SYNC_OK));
        Ok(self.presets.len())
    }

    /// Removes the snapshot entry, then empties the list.
    ///
    /// # Errors
    /// - `Snapshot` when the entry cannot be removed; the list is kept.
    pub fn clear(&mut self) -> SyncResult<()> {
        if let Err(err) = self.snapshot.clear() {
            warn!(
                "event=snapshot_clear module=client status=error error_code=snapshot_clear_failed error={}",
                err
            );
            self.notifier.notify(Notice::error(MSG_SNAPSHOT_FAILED));
            return Err(err.into());
        }
        self.presets.clear();
        info!("event=snapshot_clear module=client status=ok");
        Ok(())
    }

    /// Serializes the full list as an indented JSON array.
    pub fn export(&self) -> SyncResult<String> {
        Ok(encode_export(&self.presets)?)
    }

    /// Prepends presets from an exported document; ids already present are skipped.
    ///
    /// Returns the number of presets added.
    ///
    /// # Errors
    /// - `InvalidDocument` when the document is not a valid preset array;
    ///   state is unchanged.
    pub fn import(&mut self, document: &str) -> SyncResult<usize> {
        let imported = match decode_import(document) {
            Ok(presets) => presets,
            Err(message) => {
                warn!("event=preset_import module=client status=error error={message}");
                self.notifier.notify(Notice::error(MSG_IMPORT_INVALID));
                return Err(SyncError::InvalidDocument(message));
            }
        };

        let mut seen: HashSet<LocalId> =
            self.presets.iter().map(ClientPreset::local_id).collect();
        let mut merged: Vec<ClientPreset> = imported
            .into_iter()
            .filter(|preset| seen.insert(preset.local_id()))
            .collect();
        let added = merged.len();
        merged.append(&mut self.presets);

        self.presets = merged;
        self.write_snapshot();

        info!("event=preset_import module=client status=ok added={added}");
        self.notifier.notify(Notice::success(MSG_IMPORT_OK));
        Ok(added)
    }

    /// Rewrites the snapshot from the in-memory list.
    ///
    /// A failed write is surfaced; the in-memory mutation stands.
    fn write_snapshot(&mut self) {
        let result = encode_snapshot(&self.presets).and_then(|json| self.snapshot.save(&json));
        if let Err(err) = result {
            warn!(
                "event=snapshot_write module=client status=error error_code=snapshot_write_failed error={}",
                err
            );
            self.notifier.notify(Notice::error(MSG_SNAPSHOT_FAILED));
        }
    }
}

fn decode_import(document: &str) -> Result<Vec<ClientPreset>, String> {
    let presets = decode_presets(document).map_err(|err| err.to_string())?;
    for preset in &presets {
        preset.body.validate().map_err(|err| err.to_string())?;
    }
    Ok(presets)
}
