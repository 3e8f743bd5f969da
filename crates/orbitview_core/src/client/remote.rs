//! Remote preset store contract and HTTP implementation.
//!
//! # Responsibility
//! - Define the client's view of the store (`save`, `list`, `delete`).
//! - Map HTTP status/body pairs into `RemoteError` without retrying.
//!
//! # Invariants
//! - Non-2xx responses become `Rejected`, carrying the body's `error` text.
//! - Connection failures and request timeouts become `Transport`.

use crate::client::local_preset::ClientPreset;
use crate::model::preset::StoredPreset;
use log::{info, warn};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The store answered with a failure status.
    Rejected {
        status: u16,
        message: Option<String>,
    },
    /// The store could not be reached or answered with an unreadable body.
    Transport(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status: 404, .. })
    }

    /// Store-provided error text, if any.
    pub fn store_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref(),
            Self::Transport(_) => None,
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected {
                status,
                message: Some(message),
            } => write!(f, "store rejected request ({status}): {message}"),
            Self::Rejected {
                status,
                message: None,
            } => write!(f, "store rejected request ({status})"),
            Self::Transport(message) => write!(f, "store unreachable: {message}"),
        }
    }
}

impl Error for RemoteError {}

/// Client-side contract of the preset store.
pub trait PresetRemote {
    /// Creates a preset; returns the stored record with its `store_id`.
    fn save(&mut self, preset: &ClientPreset) -> RemoteResult<StoredPreset>;
    /// Lists one user's presets, newest first.
    fn list(&mut self, user: &str) -> RemoteResult<Vec<StoredPreset>>;
    fn delete(&mut self, store_id: &str) -> RemoteResult<()>;
}

#[derive(Deserialize)]
struct SaveResponse {
    data: StoredPreset,
}

#[derive(Deserialize)]
struct DeleteResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
}

/// Preset store reached over the `/api/viewer` HTTP API.
pub struct HttpPresetRemote {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpPresetRemote {
    /// Builds a remote for `base_url` (for example `http://localhost:3080`).
    ///
    /// `timeout`, when set, bounds each whole request; expiry is reported as
    /// `RemoteError::Transport`.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/viewer{path}", self.base_url)
    }
}

impl PresetRemote for HttpPresetRemote {
    fn save(&mut self, preset: &ClientPreset) -> RemoteResult<StoredPreset> {
        let started_at = Instant::now();
        let response = self
            .agent
            .post(&self.endpoint("/save"))
            .send_json(preset)
            .map_err(|err| log_failure("remote_save", started_at, convert_error(err)))?;
        let body: SaveResponse = response.into_json().map_err(|err| {
            log_failure(
                "remote_save",
                started_at,
                RemoteError::Transport(format!("invalid save response: {err}")),
            )
        })?;

        info!(
            "event=remote_save module=client status=ok store_id={} duration_ms={}",
            body.data.store_id,
            started_at.elapsed().as_millis()
        );
        Ok(body.data)
    }

    fn list(&mut self, user: &str) -> RemoteResult<Vec<StoredPreset>> {
        let started_at = Instant::now();
        let url = self.endpoint(&format!("/views/{}", urlencoding::encode(user)));
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| log_failure("remote_list", started_at, convert_error(err)))?;
        let presets: Vec<StoredPreset> = response.into_json().map_err(|err| {
            log_failure(
                "remote_list",
                started_at,
                RemoteError::Transport(format!("invalid list response: {err}")),
            )
        })?;

        info!(
            "event=remote_list module=client status=ok count={} duration_ms={}",
            presets.len(),
            started_at.elapsed().as_millis()
        );
        Ok(presets)
    }

    fn delete(&mut self, store_id: &str) -> RemoteResult<()> {
        let started_at = Instant::now();
        let url = self.endpoint(&format!("/delete/{}", urlencoding::encode(store_id)));
        let response = self
            .agent
            .delete(&url)
            .call()
            .map_err(|err| log_failure("remote_delete", started_at, convert_error(err)))?;
        let status = response.status();
        let body: DeleteResponse = response.into_json().map_err(|err| {
            log_failure(
                "remote_delete",
                started_at,
                RemoteError::Transport(format!("invalid delete response: {err}")),
            )
        })?;

        if !body.success {
            return Err(log_failure(
                "remote_delete",
                started_at,
                RemoteError::Rejected {
                    status,
                    message: body.message,
                },
            ));
        }

        info!(
            "event=remote_delete module=client status=ok store_id={} duration_ms={}",
            store_id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

fn convert_error(err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, response) => {
            let message = response
                .into_json::<ErrorResponse>()
                .ok()
                .and_then(|body| body.error);
            RemoteError::Rejected { status, message }
        }
        ureq::Error::Transport(transport) => RemoteError::Transport(transport.to_string()),
    }
}

fn log_failure(event: &str, started_at: Instant, err: RemoteError) -> RemoteError {
    warn!(
        "event={} module=client status=error duration_ms={} error={}",
        event,
        started_at.elapsed().as_millis(),
        err
    );
    err
}
