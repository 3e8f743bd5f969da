//! Preset repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/get/list/delete over canonical `camera_presets` storage.
//! - Keep SQL details inside the store persistence boundary.
//!
//! # Invariants
//! - Write paths call `StoredPreset::validate()` before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Per-user listing is ordered by `created_at DESC`, newest insert first on ties.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::preset::{
    CameraPose, PresetBody, PresetValidationError, StoreId, StoredPreset,
};
use chrono::DateTime;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PRESET_TABLE: &str = "camera_presets";

const PRESET_COLUMNS: &[&str] = &[
    "store_id",
    "owner",
    "name",
    "position_x",
    "position_y",
    "position_z",
    "quaternion_x",
    "quaternion_y",
    "quaternion_z",
    "quaternion_w",
    "target_x",
    "target_y",
    "target_z",
    "model_name",
    "created_at",
];

const PRESET_SELECT_SQL: &str = "SELECT
    store_id,
    owner,
    name,
    position_x,
    position_y,
    position_z,
    quaternion_x,
    quaternion_y,
    quaternion_z,
    quaternion_w,
    target_x,
    target_y,
    target_z,
    model_name,
    created_at
FROM camera_presets";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for preset persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(PresetValidationError),
    Db(DbError),
    NotFound(StoreId),
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "preset not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted preset data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "preset repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "preset repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "preset repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<PresetValidationError> for RepoError {
    fn from(value: PresetValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for preset persistence.
pub trait PresetRepository {
    fn create_preset(&self, preset: &StoredPreset) -> RepoResult<StoreId>;
    fn get_preset(&self, store_id: &str) -> RepoResult<Option<StoredPreset>>;
    fn list_presets_by_user(&self, user: &str) -> RepoResult<Vec<StoredPreset>>;
    fn delete_preset(&self, store_id: &str) -> RepoResult<()>;
}

/// SQLite-backed preset repository.
pub struct SqlitePresetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePresetRepository<'conn> {
    /// Wraps a connection after checking that migrations were applied.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `user_version` is not the latest.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_preset_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PresetRepository for SqlitePresetRepository<'_> {
    fn create_preset(&self, preset: &StoredPreset) -> RepoResult<StoreId> {
        preset.validate()?;

        let body = &preset.body;
        let [position_x, position_y, position_z] = body.camera.position;
        let [quaternion_x, quaternion_y, quaternion_z, quaternion_w] = body.camera.quaternion;
        let [target_x, target_y, target_z] = body.controls_target;

        self.conn.execute(
            "INSERT INTO camera_presets (
                store_id,
                owner,
                name,
                position_x,
                position_y,
                position_z,
                quaternion_x,
                quaternion_y,
                quaternion_z,
                quaternion_w,
                target_x,
                target_y,
                target_z,
                model_name,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15);",
            params![
                preset.store_id.as_str(),
                body.user.as_str(),
                body.name.as_str(),
                position_x,
                position_y,
                position_z,
                quaternion_x,
                quaternion_y,
                quaternion_z,
                quaternion_w,
                target_x,
                target_y,
                target_z,
                body.model_name.as_str(),
                preset.created_at.timestamp_millis(),
            ],
        )?;

        Ok(preset.store_id.clone())
    }

    fn get_preset(&self, store_id: &str) -> RepoResult<Option<StoredPreset>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PRESET_SELECT_SQL} WHERE store_id = ?1;"))?;

        let mut rows = stmt.query([store_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_preset_row(row)?));
        }

        Ok(None)
    }

    fn list_presets_by_user(&self, user: &str) -> RepoResult<Vec<StoredPreset>> {
        if user.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "{PRESET_SELECT_SQL}
             WHERE owner = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([user])?;
        let mut presets = Vec::new();

        while let Some(row) = rows.next()? {
            presets.push(parse_preset_row(row)?);
        }

        Ok(presets)
    }

    fn delete_preset(&self, store_id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM camera_presets WHERE store_id = ?1;", [store_id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(store_id.to_string()));
        }

        Ok(())
    }
}

fn parse_preset_row(row: &Row<'_>) -> RepoResult<StoredPreset> {
    let created_at_ms: i64 = row.get("created_at")?;
    let created_at = DateTime::from_timestamp_millis(created_at_ms).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{created_at_ms}` in camera_presets.created_at"
        ))
    })?;

    let preset = StoredPreset {
        store_id: row.get("store_id")?,
        body: PresetBody {
            user: row.get("owner")?,
            name: row.get("name")?,
            camera: CameraPose {
                position: [
                    row.get("position_x")?,
                    row.get("position_y")?,
                    row.get("position_z")?,
                ],
                quaternion: [
                    row.get("quaternion_x")?,
                    row.get("quaternion_y")?,
                    row.get("quaternion_z")?,
                    row.get("quaternion_w")?,
                ],
            },
            controls_target: [
                row.get("target_x")?,
                row.get("target_y")?,
                row.get("target_z")?,
            ],
            model_name: row.get("model_name")?,
        },
        created_at,
    };
    preset
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("row `{}`: {err}", preset.store_id)))?;
    Ok(preset)
}

fn ensure_preset_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, PRESET_TABLE)? {
        return Err(RepoError::MissingRequiredTable(PRESET_TABLE));
    }

    for &column in PRESET_COLUMNS {
        if !table_has_column(conn, PRESET_TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: PRESET_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
