use chrono::{TimeZone, Utc};
use orbitview_core::client::snapshot::SnapshotResult;
use orbitview_core::{
    apply_preset, CameraPose, ClientPreset, MemorySnapshotStore, NoticeKind, NoticeLog,
    PresetRemote, PresetSync, RemoteError, RemoteResult, SceneState, SnapshotError,
    SnapshotStore, StoredPreset, SyncError, ViewState, ViewerScene,
};
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Save(String),
    List(String),
    Delete(String),
}

/// In-process store double that records every call.
#[derive(Default)]
struct FakeRemote {
    calls: Vec<Call>,
    stored: Vec<StoredPreset>,
    next_id: u32,
    failures: VecDeque<RemoteError>,
}

impl FakeRemote {
    fn fail_next(&mut self, err: RemoteError) {
        self.failures.push_back(err);
    }

    fn seed(&mut self, store_id: &str, name: &str) {
        self.stored.insert(
            0,
            StoredPreset {
                store_id: store_id.to_string(),
                body: ClientPreset::capture("alice", name, &front_scene(), Utc::now()).body,
                created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            },
        );
    }
}

impl PresetRemote for FakeRemote {
    fn save(&mut self, preset: &ClientPreset) -> RemoteResult<StoredPreset> {
        self.calls.push(Call::Save(preset.body.name.clone()));
        if let Some(err) = self.failures.pop_front() {
            return Err(err);
        }
        self.next_id += 1;
        let stored = StoredPreset {
            store_id: format!("store-{}", self.next_id),
            body: preset.body.clone(),
            created_at: preset.created_at,
        };
        self.stored.insert(0, stored.clone());
        Ok(stored)
    }

    fn list(&mut self, user: &str) -> RemoteResult<Vec<StoredPreset>> {
        self.calls.push(Call::List(user.to_string()));
        if let Some(err) = self.failures.pop_front() {
            return Err(err);
        }
        Ok(self
            .stored
            .iter()
            .filter(|preset| preset.body.user == user)
            .cloned()
            .collect())
    }

    fn delete(&mut self, store_id: &str) -> RemoteResult<()> {
        self.calls.push(Call::Delete(store_id.to_string()));
        if let Some(err) = self.failures.pop_front() {
            return Err(err);
        }
        self.stored.retain(|preset| preset.store_id != store_id);
        Ok(())
    }
}

/// Snapshot double whose writes or removal can be made to fail.
#[derive(Default)]
struct FlakySnapshot {
    inner: MemorySnapshotStore,
    fail_save: bool,
    fail_clear: bool,
}

impl FlakySnapshot {
    fn read_only_error() -> SnapshotError {
        SnapshotError::Io {
            path: PathBuf::from("three_viewer_presets.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        }
    }
}

impl SnapshotStore for FlakySnapshot {
    fn load(&self) -> SnapshotResult<Option<String>> {
        self.inner.load()
    }

    fn save(&mut self, contents: &str) -> SnapshotResult<()> {
        if self.fail_save {
            return Err(Self::read_only_error());
        }
        self.inner.save(contents)
    }

    fn clear(&mut self) -> SnapshotResult<()> {
        if self.fail_clear {
            return Err(Self::read_only_error());
        }
        self.inner.clear()
    }
}

type TestSync = PresetSync<FakeRemote, MemorySnapshotStore, NoticeLog>;
type FlakySync = PresetSync<FakeRemote, FlakySnapshot, NoticeLog>;

fn logged_in_flaky() -> FlakySync {
    let mut sync = PresetSync::new(
        FakeRemote::default(),
        FlakySnapshot::default(),
        NoticeLog::new(),
    );
    sync.set_user(Some("alice".to_string()));
    sync
}

fn front_scene() -> SceneState {
    SceneState::new(
        ViewState {
            camera: CameraPose {
                position: [0.0, 1.5, 3.0],
                quaternion: [0.0, 0.0, 0.0, 1.0],
            },
            controls_target: [0.0, 0.0, 0.0],
        },
        Some("chair.glb".to_string()),
    )
}

fn side_scene() -> SceneState {
    SceneState::new(
        ViewState {
            camera: CameraPose {
                position: [3.0, 1.0, 0.0],
                quaternion: [0.0, 0.7071, 0.0, 0.7071],
            },
            controls_target: [0.0, 0.5, 0.0],
        },
        Some("chair.glb".to_string()),
    )
}

fn logged_in() -> TestSync {
    let mut sync = PresetSync::new(
        FakeRemote::default(),
        MemorySnapshotStore::new(),
        NoticeLog::new(),
    );
    sync.set_user(Some("alice".to_string()));
    sync
}

fn last_notice(sync: &TestSync) -> (NoticeKind, String) {
    let notice = sync.notifier().last().expect("a notice should be emitted");
    (notice.kind, notice.message.clone())
}

fn snapshot_presets(sync: &TestSync) -> Vec<ClientPreset> {
    let contents = sync.snapshot_store().contents().expect("snapshot written");
    serde_json::from_str(contents).unwrap()
}

#[test]
fn save_without_user_never_contacts_store() {
    let mut sync = PresetSync::new(
        FakeRemote::default(),
        MemorySnapshotStore::new(),
        NoticeLog::new(),
    );
    sync.set_user(Some("   ".to_string()));

    let err = sync.save(Some("Front"), &front_scene()).unwrap_err();

    assert!(matches!(err, SyncError::NotLoggedIn));
    assert!(sync.remote().calls.is_empty());
    assert!(sync.presets().is_empty());
    assert_eq!(sync.snapshot_store().writes(), 0);
    assert_eq!(
        last_notice(&sync),
        (
            NoticeKind::Error,
            "You must be logged in to save a view".to_string()
        )
    );
}

#[test]
fn save_prepends_persisted_preset_and_rewrites_snapshot() {
    let mut sync = logged_in();

    let first = sync.save(Some("Front"), &front_scene()).unwrap();
    let second = sync.save(None, &side_scene()).unwrap();

    assert_eq!(first.store_id(), Some("store-1"));
    assert_eq!(second.body.name, "Preset 2");
    assert_eq!(second.body.camera.position, [3.0, 1.0, 0.0]);
    assert_eq!(sync.presets(), &[second.clone(), first.clone()]);
    assert_eq!(snapshot_presets(&sync), vec![second, first]);
    assert_eq!(
        last_notice(&sync),
        (NoticeKind::Success, "View saved to database!".to_string())
    );
}

#[test]
fn blank_name_falls_back_to_numbered_default() {
    let mut sync = logged_in();

    let saved = sync.save(Some("  "), &front_scene()).unwrap();

    assert_eq!(saved.body.name, "Preset 1");
    assert_eq!(sync.remote().calls, vec![Call::Save("Preset 1".to_string())]);
}

#[test]
fn save_defaults_unknown_model_name() {
    let mut sync = logged_in();
    let mut scene = front_scene();
    scene.model_name = None;

    let saved = sync.save(Some("Front"), &scene).unwrap();
    assert_eq!(saved.body.model_name, "unknown");
}

#[test]
fn failed_save_leaves_list_and_snapshot_unchanged() {
    let mut sync = logged_in();
    sync.save(Some("Front"), &front_scene()).unwrap();
    let before = sync.presets().to_vec();
    let writes_before = sync.snapshot_store().writes();

    sync.remote_mut().fail_next(RemoteError::Rejected {
        status: 500,
        message: Some("Server error saving camera view".to_string()),
    });
    let err = sync.save(Some("Side"), &side_scene()).unwrap_err();

    assert!(matches!(err, SyncError::Remote(RemoteError::Rejected { status: 500, .. })));
    assert_eq!(sync.presets(), before.as_slice());
    assert_eq!(sync.snapshot_store().writes(), writes_before);
    assert_eq!(
        last_notice(&sync),
        (
            NoticeKind::Error,
            "Server error saving camera view".to_string()
        )
    );
}

#[test]
fn unreachable_store_reports_connection_error() {
    let mut sync = logged_in();
    sync.remote_mut()
        .fail_next(RemoteError::Transport("connection refused".to_string()));

    assert!(sync.save(Some("Front"), &front_scene()).is_err());
    assert!(sync.presets().is_empty());
    assert_eq!(
        last_notice(&sync),
        (NoticeKind::Error, "Error connecting to server".to_string())
    );
}

#[test]
fn delete_removes_preset_after_store_confirms() {
    let mut sync = logged_in();
    let front = sync.save(Some("Front"), &front_scene()).unwrap();
    let side = sync.save(Some("Side"), &side_scene()).unwrap();

    sync.delete(front.local_id()).unwrap();

    assert_eq!(
        sync.remote().calls.last(),
        Some(&Call::Delete("store-1".to_string()))
    );
    assert_eq!(sync.presets(), &[side.clone()]);
    assert_eq!(snapshot_presets(&sync), vec![side]);
    assert_eq!(
        last_notice(&sync),
        (NoticeKind::Success, "Preset deleted successfully".to_string())
    );
}

#[test]
fn failed_delete_keeps_preset() {
    let mut sync = logged_in();
    let front = sync.save(Some("Front"), &front_scene()).unwrap();
    sync.remote_mut().fail_next(RemoteError::Rejected {
        status: 404,
        message: Some("Preset not found".to_string()),
    });

    let err = sync.delete(front.local_id()).unwrap_err();

    assert!(matches!(err, SyncError::Remote(ref remote) if remote.is_not_found()));
    assert_eq!(sync.presets(), &[front.clone()]);
    assert_eq!(snapshot_presets(&sync), vec![front]);
    assert_eq!(
        last_notice(&sync),
        (NoticeKind::Error, "Preset not found".to_string())
    );
}

#[test]
fn deleting_local_only_preset_skips_store() {
    let local = ClientPreset::capture("alice", "Draft", &front_scene(), Utc::now());
    let document = serde_json::to_string(&vec![local.clone()]).unwrap();
    let mut sync = PresetSync::new(
        FakeRemote::default(),
        MemorySnapshotStore::with_contents(document),
        NoticeLog::new(),
    );
    assert_eq!(sync.load(), 1);

    sync.delete(local.local_id()).unwrap();

    assert!(sync.remote().calls.is_empty());
    assert!(sync.presets().is_empty());
    assert_eq!(sync.snapshot_store().contents(), Some("[]"));
}

#[test]
fn deleting_unknown_preset_is_reported() {
    let mut sync = logged_in();
    let stray = ClientPreset::capture("alice", "Stray", &front_scene(), Utc::now());

    let err = sync.delete(stray.local_id()).unwrap_err();

    assert!(matches!(err, SyncError::UnknownPreset(id) if id == stray.local_id()));
    assert!(sync.remote().calls.is_empty());
}

#[test]
fn reconcile_adopts_store_records_and_keeps_local_ids() {
    let mut sync = logged_in();
    let front = sync.save(Some("Front"), &front_scene()).unwrap();
    sync.remote_mut().seed("seeded-1", "From another device");

    let count = sync.reconcile().unwrap();

    assert_eq!(count, 2);
    let presets = sync.presets();
    assert_eq!(presets[0].store_id(), Some("seeded-1"));
    assert_eq!(presets[0].body.name, "From another device");
    assert_eq!(presets[1].local_id(), front.local_id());
    assert_eq!(sync.remote().calls.last(), Some(&Call::List("alice".to_string())));
    assert_eq!(
        last_notice(&sync),
        (NoticeKind::Success, "Presets synced from database".to_string())
    );
}

#[test]
fn reconcile_keeps_local_only_presets_after_store_records() {
    let local = ClientPreset::capture("alice", "Offline", &front_scene(), Utc::now());
    let document = serde_json::to_string(&vec![local.clone()]).unwrap();
    let mut sync = PresetSync::new(
        FakeRemote::default(),
        MemorySnapshotStore::with_contents(document),
        NoticeLog::new(),
    );
    sync.set_user(Some("alice".to_string()));
    sync.load();
    sync.remote_mut().seed("seeded-1", "Remote");

    sync.reconcile().unwrap();

    let names: Vec<&str> = sync
        .presets()
        .iter()
        .map(|preset| preset.body.name.as_str())
        .collect();
    assert_eq!(names, vec!["Remote", "Offline"]);
}

#[test]
fn failed_reconcile_leaves_state_unchanged() {
    let mut sync = logged_in();
    let front = sync.save(Some("Front"), &front_scene()).unwrap();
    sync.remote_mut()
        .fail_next(RemoteError::Transport("timed out".to_string()));

    assert!(sync.reconcile().is_err());
    assert_eq!(sync.presets(), &[front]);
    assert_eq!(
        last_notice(&sync),
        (NoticeKind::Error, "Failed to fetch presets".to_string())
    );
}

#[test]
fn export_then_import_restores_same_presets() {
    let mut sync = logged_in();
    sync.save(Some("Front"), &front_scene()).unwrap();
    sync.save(Some("Side"), &side_scene()).unwrap();
    let exported = sync.export().unwrap();
    let exported_presets = sync.presets().to_vec();
    assert!(exported.contains('\n'));

    let mut fresh = PresetSync::new(
        FakeRemote::default(),
        MemorySnapshotStore::new(),
        NoticeLog::new(),
    );
    let added = fresh.import(&exported).unwrap();

    assert_eq!(added, 2);
    assert_eq!(fresh.presets(), exported_presets.as_slice());
    assert_eq!(snapshot_presets(&fresh), exported_presets);
    assert!(fresh.remote().calls.is_empty());
    assert_eq!(
        fresh.notifier().last().map(|notice| notice.message.as_str()),
        Some("Presets imported successfully!")
    );
}

#[test]
fn import_skips_presets_already_present() {
    let mut sync = logged_in();
    sync.save(Some("Front"), &front_scene()).unwrap();
    let exported = sync.export().unwrap();

    let added = sync.import(&exported).unwrap();

    assert_eq!(added, 0);
    assert_eq!(sync.presets().len(), 1);
}

#[test]
fn import_rejects_invalid_document_without_changes() {
    let mut sync = logged_in();
    let front = sync.save(Some("Front"), &front_scene()).unwrap();

    for document in [
        "not json",
        r#"{"id": "not-an-array"}"#,
        r#"[{"id": "5d7c1d90-3b4e-4f3a-9f1e-6f1c9a8f2b11", "name": "no pose"}]"#,
    ] {
        let err = sync.import(document).unwrap_err();
        assert!(matches!(err, SyncError::InvalidDocument(_)));
        assert_eq!(
            last_notice(&sync),
            (NoticeKind::Error, "Invalid file format".to_string())
        );
    }

    assert_eq!(sync.presets(), &[front]);
}

#[test]
fn load_treats_corrupt_snapshot_as_empty() {
    let mut sync = PresetSync::new(
        FakeRemote::default(),
        MemorySnapshotStore::with_contents("{corrupt"),
        NoticeLog::new(),
    );

    assert_eq!(sync.load(), 0);
    assert!(sync.presets().is_empty());
}

#[test]
fn clear_empties_list_and_snapshot() {
    let mut sync = logged_in();
    sync.save(Some("Front"), &front_scene()).unwrap();

    sync.clear().unwrap();

    assert!(sync.presets().is_empty());
    assert!(sync.snapshot_store().load().unwrap().is_none());
}

#[test]
fn apply_preset_moves_scene_without_side_effects() {
    let mut sync = logged_in();
    let side = sync.save(Some("Side"), &side_scene()).unwrap();
    let calls_before = sync.remote().calls.len();
    let writes_before = sync.snapshot_store().writes();

    let mut scene = front_scene();
    apply_preset(&side, &mut scene);

    assert_eq!(scene.current_view(), side.view());
    assert_eq!(scene.current_view().controls_target, [0.0, 0.5, 0.0]);
    assert_eq!(sync.remote().calls.len(), calls_before);
    assert_eq!(sync.snapshot_store().writes(), writes_before);
}

#[test]
fn snapshot_write_failure_keeps_saved_preset_and_is_reported() {
    let mut sync = logged_in_flaky();
    sync.snapshot_store_mut().fail_save = true;

    let saved = sync.save(Some("Front"), &front_scene()).unwrap();

    assert_eq!(sync.presets(), &[saved]);
    let messages: Vec<&str> = sync
        .notifier()
        .notices()
        .iter()
        .map(|notice| notice.message.as_str())
        .collect();
    assert_eq!(
        messages,
        vec!["Failed to update local presets", "View saved to database!"]
    );
}

#[test]
fn failed_clear_keeps_list_and_snapshot_in_step() {
    let mut sync = logged_in_flaky();
    let front = sync.save(Some("Front"), &front_scene()).unwrap();
    sync.snapshot_store_mut().fail_clear = true;

    let err = sync.clear().unwrap_err();

    assert!(matches!(err, SyncError::Snapshot(SnapshotError::Io { .. })));
    assert_eq!(sync.presets(), &[front.clone()]);
    assert!(sync.snapshot_store().inner.contents().is_some());
    assert_eq!(
        sync.notifier().last().map(|notice| (notice.kind, notice.message.as_str())),
        Some((NoticeKind::Error, "Failed to update local presets"))
    );

    sync.snapshot_store_mut().fail_clear = false;
    assert_eq!(sync.load(), 1);
    assert_eq!(sync.presets(), &[front]);
}
