//! Core domain logic for OrbitView camera presets.
//! This crate is the single source of truth for preset invariants, shared by
//! the HTTP store and the viewer-side client.

pub mod client;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use client::local_preset::{ClientPreset, LocalId, PresetIdentity};
pub use client::notify::{Notice, NoticeKind, NoticeLog, Notifier};
pub use client::remote::{HttpPresetRemote, PresetRemote, RemoteError, RemoteResult};
pub use client::snapshot::{
    FileSnapshotStore, MemorySnapshotStore, SnapshotError, SnapshotStore, EXPORT_FILE_NAME,
    SNAPSHOT_KEY,
};
pub use client::sync::{PresetSync, SyncError, SyncResult};
pub use client::viewer::{apply_preset, SceneState, ViewState, ViewerScene};
pub use config::{ConfigError, OrbitViewConfig};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use model::preset::{
    CameraInput, CameraPose, PresetBody, PresetDraft, PresetInput, PresetValidationError,
    StoreId, StoredPreset, UNKNOWN_MODEL_NAME,
};
pub use repo::preset_repo::{PresetRepository, RepoError, RepoResult, SqlitePresetRepository};
pub use service::preset_service::PresetService;

/// Health-check reply served by `GET /ping`.
pub fn ping() -> &'static str {
    "PONG"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
