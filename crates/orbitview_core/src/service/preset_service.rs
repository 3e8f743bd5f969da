//! Preset store use-case service.
//!
//! # Responsibility
//! - Provide create / list-by-user / delete-by-id entry points.
//! - Assign store identity and creation time on create.
//!
//! # Invariants
//! - `store_id` is generated exactly once, here, and never reassigned.
//! - Create returns the read-back record, not the caller's input.
//! - Service APIs never bypass repository validation.

use crate::model::preset::{PresetDraft, PresetInput, StoredPreset};
use crate::repo::preset_repo::{PresetRepository, RepoError, RepoResult};
use chrono::Utc;
use log::{info, warn};
use std::time::Instant;

/// Use-case service wrapper over a preset repository.
pub struct PresetService<R: PresetRepository> {
    repo: R,
}

impl<R: PresetRepository> PresetService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates raw input and persists it as a new preset.
    ///
    /// # Errors
    /// - `RepoError::Validation` when a required field is missing or invalid.
    /// - `RepoError::Db` on storage faults.
    pub fn create_from_input(&self, input: PresetInput) -> RepoResult<StoredPreset> {
        let draft = input.into_draft().map_err(|err| {
            warn!(
                "event=preset_create module=service status=error error_code=validation_failed error={}",
                err
            );
            RepoError::Validation(err)
        })?;
        self.create_preset(draft)
    }

    /// Persists a typed draft, assigning `store_id` and `created_at` when absent.
    pub fn create_preset(&self, draft: PresetDraft) -> RepoResult<StoredPreset> {
        let started_at = Instant::now();
        let preset = StoredPreset::from_draft(draft, Utc::now());
        let store_id = self.repo.create_preset(&preset)?;

        let stored = self.repo.get_preset(&store_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("created preset `{store_id}` not found in read-back"))
        })?;

        info!(
            "event=preset_create module=service status=ok store_id={} duration_ms={}",
            stored.store_id,
            started_at.elapsed().as_millis()
        );
        Ok(stored)
    }

    /// Lists one user's presets, newest first. Empty `user` yields an empty list.
    pub fn list_by_user(&self, user: &str) -> RepoResult<Vec<StoredPreset>> {
        let presets = self.repo.list_presets_by_user(user)?;
        info!(
            "event=preset_list module=service status=ok count={}",
            presets.len()
        );
        Ok(presets)
    }

    /// Deletes one preset by store id.
    ///
    /// Returns `RepoError::NotFound` without side effects when the id is unknown.
    pub fn delete_by_id(&self, store_id: &str) -> RepoResult<()> {
        self.repo.delete_preset(store_id)?;
        info!("event=preset_delete module=service status=ok store_id={store_id}");
        Ok(())
    }

    /// Gets one preset by store id.
    pub fn get_by_id(&self, store_id: &str) -> RepoResult<Option<StoredPreset>> {
        self.repo.get_preset(store_id)
    }
}
