//! Client-side preset representation with dual identity.
//!
//! # Invariants
//! - `local_id` is minted once per preset and survives persistence.
//! - A `Persisted` identity always carries the store id returned by create.
//! - The serialized form is flat: `id`, optional `storeId`, then body fields.

use crate::client::viewer::{ViewState, ViewerScene};
use crate::model::preset::{PresetBody, StoreId, StoredPreset, UNKNOWN_MODEL_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client-generated identifier, unique within a client session.
pub type LocalId = Uuid;

/// Whether the store has acknowledged a preset yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetIdentity {
    /// Captured or imported, never confirmed by the store.
    Local { local_id: LocalId },
    /// Acknowledged by the store.
    Persisted { local_id: LocalId, store_id: StoreId },
}

impl PresetIdentity {
    pub fn local_id(&self) -> LocalId {
        match self {
            Self::Local { local_id } | Self::Persisted { local_id, .. } => *local_id,
        }
    }

    pub fn store_id(&self) -> Option<&str> {
        match self {
            Self::Local { .. } => None,
            Self::Persisted { store_id, .. } => Some(store_id.as_str()),
        }
    }
}

/// Preset as held in the client list, the local snapshot and exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ClientPresetRecord", into = "ClientPresetRecord")]
pub struct ClientPreset {
    pub identity: PresetIdentity,
    pub body: PresetBody,
    pub created_at: DateTime<Utc>,
}

impl ClientPreset {
    /// Captures the live view of `scene` as a new local-only preset.
    pub fn capture(
        user: impl Into<String>,
        name: impl Into<String>,
        scene: &impl ViewerScene,
        now: DateTime<Utc>,
    ) -> Self {
        let view = scene.current_view();
        Self {
            identity: PresetIdentity::Local {
                local_id: Uuid::new_v4(),
            },
            body: PresetBody {
                user: user.into(),
                name: name.into(),
                camera: view.camera,
                controls_target: view.controls_target,
                model_name: scene
                    .loaded_model_name()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_MODEL_NAME.to_string()),
            },
            created_at: now,
        }
    }

    /// Wraps a store record, keeping `local_id` as the client identity.
    pub fn from_stored(local_id: LocalId, stored: StoredPreset) -> Self {
        Self {
            identity: PresetIdentity::Persisted {
                local_id,
                store_id: stored.store_id,
            },
            body: stored.body,
            created_at: stored.created_at,
        }
    }

    /// Adopts the store's identity and authoritative timestamp.
    pub fn into_persisted(self, stored: StoredPreset) -> Self {
        Self::from_stored(self.local_id(), stored)
    }

    pub fn local_id(&self) -> LocalId {
        self.identity.local_id()
    }

    pub fn store_id(&self) -> Option<&str> {
        self.identity.store_id()
    }

    pub fn view(&self) -> ViewState {
        ViewState {
            camera: self.body.camera,
            controls_target: self.body.controls_target,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientPresetRecord {
    id: LocalId,
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    store_id: Option<StoreId>,
    #[serde(flatten)]
    body: PresetBody,
    created_at: DateTime<Utc>,
}

impl From<ClientPresetRecord> for ClientPreset {
    fn from(record: ClientPresetRecord) -> Self {
        let identity = match record.store_id {
            Some(store_id) => PresetIdentity::Persisted {
                local_id: record.id,
                store_id,
            },
            None => PresetIdentity::Local {
                local_id: record.id,
            },
        };
        Self {
            identity,
            body: record.body,
            created_at: record.created_at,
        }
    }
}

impl From<ClientPreset> for ClientPresetRecord {
    fn from(preset: ClientPreset) -> Self {
        let (id, store_id) = match preset.identity {
            PresetIdentity::Local { local_id } => (local_id, None),
            PresetIdentity::Persisted { local_id, store_id } => (local_id, Some(store_id)),
        };
        Self {
            id,
            store_id,
            body: preset.body,
            created_at: preset.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientPreset, PresetIdentity};
    use crate::client::viewer::{SceneState, ViewState};
    use crate::model::preset::{CameraPose, StoredPreset};
    use chrono::Utc;

    fn scene(model_name: Option<&str>) -> SceneState {
        SceneState::new(
            ViewState {
                camera: CameraPose {
                    position: [0.0, 1.5, 3.0],
                    quaternion: [0.0, 0.0, 0.0, 1.0],
                },
                controls_target: [0.0, 0.0, 0.0],
            },
            model_name.map(str::to_string),
        )
    }

    #[test]
    fn capture_defaults_model_name_to_unknown() {
        let preset = ClientPreset::capture("alice", "Front", &scene(None), Utc::now());
        assert_eq!(preset.body.model_name, "unknown");
        assert!(preset.store_id().is_none());
    }

    #[test]
    fn local_preset_serializes_without_store_id() {
        let preset = ClientPreset::capture("alice", "Front", &scene(Some("chair.glb")), Utc::now());
        let value = serde_json::to_value(&preset).unwrap();
        assert_eq!(value["id"], preset.local_id().to_string());
        assert!(value.get("storeId").is_none());
        assert_eq!(value["modelName"], "chair.glb");
        assert_eq!(value["camera"]["quaternion"][3], 1.0);
    }

    #[test]
    fn persisted_identity_keeps_local_id() {
        let preset = ClientPreset::capture("alice", "Front", &scene(Some("chair.glb")), Utc::now());
        let local_id = preset.local_id();
        let stored = StoredPreset {
            store_id: "abc123".to_string(),
            body: preset.body.clone(),
            created_at: preset.created_at,
        };

        let persisted = preset.into_persisted(stored);
        assert_eq!(
            persisted.identity,
            PresetIdentity::Persisted {
                local_id,
                store_id: "abc123".to_string()
            }
        );

        let value = serde_json::to_value(&persisted).unwrap();
        assert_eq!(value["storeId"], "abc123");
        let decoded: ClientPreset = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, persisted);
    }
}
