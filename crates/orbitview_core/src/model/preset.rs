//! Camera preset model and validation.
//!
//! # Responsibility
//! - Define the preset body (owner, label, pose, orbit target, model label).
//! - Convert loosely-typed create input into a typed draft.
//! - Validate required-field invariants before persistence.
//!
//! # Invariants
//! - `user`, `name` and `model_name` are non-empty.
//! - Position and orbit target carry exactly 3 numbers, quaternion exactly 4.
//! - Every coordinate is finite.
//! - `created_at` is kept at millisecond precision once stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Durable identity assigned by the store at creation time.
///
/// Kept as a type alias so signatures read by intent; the value is opaque.
pub type StoreId = String;

/// Model label recorded when no model was loaded at capture time.
pub const UNKNOWN_MODEL_NAME: &str = "unknown";

/// Camera pose: world position plus orientation quaternion `[x, y, z, w]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: [f64; 3],
    pub quaternion: [f64; 4],
}

/// Validated-shape preset fields shared by every preset representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetBody {
    /// Owner identifier supplied by the session provider.
    pub user: String,
    /// Display label.
    pub name: String,
    pub camera: CameraPose,
    /// Orbit pivot point.
    pub controls_target: [f64; 3],
    /// Label of the model loaded at capture time.
    pub model_name: String,
}

impl PresetBody {
    /// Checks required-field invariants.
    ///
    /// # Errors
    /// - `EmptyField` when `user`, `name` or `model_name` is empty.
    /// - `NonFinite` when any coordinate is NaN or infinite.
    pub fn validate(&self) -> Result<(), PresetValidationError> {
        for (field, value) in [
            ("user", self.user.as_str()),
            ("name", self.name.as_str()),
            ("modelName", self.model_name.as_str()),
        ] {
            if value.is_empty() {
                return Err(PresetValidationError::EmptyField(field));
            }
        }

        ensure_finite("camera.position", &self.camera.position)?;
        ensure_finite("camera.quaternion", &self.camera.quaternion)?;
        ensure_finite("controlsTarget", &self.controls_target)?;
        Ok(())
    }
}

/// Typed create request: body plus optional caller-supplied timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetDraft {
    pub body: PresetBody,
    /// When `None`, the store assigns the creation time.
    pub created_at: Option<DateTime<Utc>>,
}

impl PresetDraft {
    pub fn new(body: PresetBody) -> Self {
        Self {
            body,
            created_at: None,
        }
    }
}

/// Record as persisted and returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPreset {
    /// `_id` is accepted for records exported by older document stores.
    #[serde(alias = "_id")]
    pub store_id: StoreId,
    #[serde(flatten)]
    pub body: PresetBody,
    pub created_at: DateTime<Utc>,
}

impl StoredPreset {
    /// Builds a stored record with a freshly generated store id.
    ///
    /// `created_at` is truncated to milliseconds to match storage precision.
    pub fn from_draft(draft: PresetDraft, now: DateTime<Utc>) -> Self {
        let created_at = truncate_to_millis(draft.created_at.unwrap_or(now));
        Self {
            store_id: new_store_id(),
            body: draft.body,
            created_at,
        }
    }

    pub fn validate(&self) -> Result<(), PresetValidationError> {
        if self.store_id.trim().is_empty() {
            return Err(PresetValidationError::EmptyField("storeId"));
        }
        self.body.validate()
    }
}

/// Loosely-typed create input as decoded from an untrusted request body.
///
/// Every field is optional so absent values surface as validation errors
/// rather than decode failures. Unknown fields (such as a client `id`) are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetInput {
    pub user: Option<String>,
    pub name: Option<String>,
    pub camera: Option<CameraInput>,
    pub controls_target: Option<Vec<f64>>,
    pub model_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Loosely-typed camera section of [`PresetInput`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CameraInput {
    pub position: Option<Vec<f64>>,
    pub quaternion: Option<Vec<f64>>,
}

impl PresetInput {
    /// Converts raw input into a typed draft.
    ///
    /// # Errors
    /// - `MissingField` when a required field is absent.
    /// - `WrongLength` when a vector does not have the expected arity.
    /// - Any error from [`PresetBody::validate`].
    pub fn into_draft(self) -> Result<PresetDraft, PresetValidationError> {
        let user = self.user.ok_or(PresetValidationError::MissingField("user"))?;
        let name = self.name.ok_or(PresetValidationError::MissingField("name"))?;
        let camera = self
            .camera
            .ok_or(PresetValidationError::MissingField("camera"))?;
        let position = camera
            .position
            .ok_or(PresetValidationError::MissingField("camera.position"))?;
        let quaternion = camera
            .quaternion
            .ok_or(PresetValidationError::MissingField("camera.quaternion"))?;
        let controls_target = self
            .controls_target
            .ok_or(PresetValidationError::MissingField("controlsTarget"))?;
        let model_name = self
            .model_name
            .ok_or(PresetValidationError::MissingField("modelName"))?;

        let body = PresetBody {
            user,
            name,
            camera: CameraPose {
                position: fixed_array("camera.position", position)?,
                quaternion: fixed_array("camera.quaternion", quaternion)?,
            },
            controls_target: fixed_array("controlsTarget", controls_target)?,
            model_name,
        };
        body.validate()?;

        Ok(PresetDraft {
            body,
            created_at: self.created_at,
        })
    }
}

/// Validation error for preset invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetValidationError {
    MissingField(&'static str),
    EmptyField(&'static str),
    WrongLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    NonFinite(&'static str),
}

impl Display for PresetValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::EmptyField(field) => write!(f, "field `{field}` must not be empty"),
            Self::WrongLength {
                field,
                expected,
                actual,
            } => write!(
                f,
                "field `{field}` must contain {expected} numbers, got {actual}"
            ),
            Self::NonFinite(field) => write!(f, "field `{field}` contains a non-finite number"),
        }
    }
}

impl Error for PresetValidationError {}

/// Generates a new opaque store id (32 lowercase hex characters).
pub fn new_store_id() -> StoreId {
    Uuid::new_v4().simple().to_string()
}

/// Drops sub-millisecond precision from a timestamp.
pub fn truncate_to_millis(value: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or(value)
}

fn fixed_array<const N: usize>(
    field: &'static str,
    values: Vec<f64>,
) -> Result<[f64; N], PresetValidationError> {
    let actual = values.len();
    values
        .try_into()
        .map_err(|_| PresetValidationError::WrongLength {
            field,
            expected: N,
            actual,
        })
}

fn ensure_finite(field: &'static str, values: &[f64]) -> Result<(), PresetValidationError> {
    if values.iter().all(|value| value.is_finite()) {
        Ok(())
    } else {
        Err(PresetValidationError::NonFinite(field))
    }
}
