//! Request routing for the `/api/viewer` preset API.
//!
//! # Invariants
//! - Every failure reply is `{ "error": <message> }`; internal detail only
//!   reaches the log.
//! - Path segments are percent-decoded before they reach the service.

use log::{error, warn};
use orbitview_core::{PresetInput, PresetRepository, PresetService, RepoError, StoredPreset};
use serde::Serialize;
use serde_json::Value;
use tiny_http::Method;

const MSG_SAVE_OK: &str = "Camera view saved successfully";
const MSG_SAVE_FAILED: &str = "Server error saving camera view";
const MSG_INVALID_VIEW: &str = "Invalid camera view";
const MSG_LIST_FAILED: &str = "Error fetching views";
const MSG_DELETE_OK: &str = "Preset deleted successfully";
const MSG_DELETE_MISSING: &str = "Preset not found";
const MSG_DELETE_FAILED: &str = "Server error deleting preset";
const MSG_NOT_FOUND: &str = "Not found";
pub(crate) const MSG_SERVER_ERROR: &str = "Server error";

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(&'static str),
    Empty,
}

/// Status and body of one reply, before headers are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl ApiResponse {
    fn json(status: u16, payload: &impl Serialize) -> Self {
        match serde_json::to_value(payload) {
            Ok(value) => Self {
                status,
                body: ResponseBody::Json(value),
            },
            Err(err) => {
                error!("event=http_encode module=server status=error error={err}");
                Self::error(500, MSG_SERVER_ERROR)
            }
        }
    }

    pub(crate) fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: ResponseBody::Json(Value::from_iter([(
                "error".to_string(),
                Value::String(message.to_string()),
            )])),
        }
    }

    fn not_found() -> Self {
        Self::error(404, MSG_NOT_FOUND)
    }

    /// JSON payload, `None` for text and empty replies.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) | ResponseBody::Empty => None,
        }
    }
}

#[derive(Serialize)]
struct SaveReply<'a> {
    message: &'a str,
    data: &'a StoredPreset,
}

#[derive(Serialize)]
struct DeleteReply<'a> {
    success: bool,
    message: &'a str,
}

/// Dispatches one request. `url` may carry a query string, which is ignored.
pub fn route<R: PresetRepository>(
    service: &PresetService<R>,
    method: &Method,
    url: &str,
    body: &[u8],
) -> ApiResponse {
    let path = url.split('?').next().unwrap_or_default();
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        (Method::Options, _) => ApiResponse {
            status: 204,
            body: ResponseBody::Empty,
        },
        (Method::Get, ["ping"]) => ApiResponse {
            status: 200,
            body: ResponseBody::Text(orbitview_core::ping()),
        },
        (Method::Post, ["api", "viewer", "save"]) => save_view(service, body),
        (Method::Get, ["api", "viewer", "views"]) => list_views(service, ""),
        (Method::Get, ["api", "viewer", "views", user]) => match urlencoding::decode(user) {
            Ok(user) => list_views(service, &user),
            Err(_) => ApiResponse::not_found(),
        },
        (Method::Delete, ["api", "viewer", "delete", store_id]) => {
            match urlencoding::decode(store_id) {
                Ok(store_id) => delete_preset(service, &store_id),
                Err(_) => ApiResponse::error(404, MSG_DELETE_MISSING),
            }
        }
        _ => ApiResponse::not_found(),
    }
}

fn save_view<R: PresetRepository>(service: &PresetService<R>, body: &[u8]) -> ApiResponse {
    let input: PresetInput = match serde_json::from_slice(body) {
        Ok(input) => input,
        Err(err) => {
            warn!(
                "event=view_save module=server status=error error_code=invalid_body error={err}"
            );
            return ApiResponse::error(500, &format!("{MSG_INVALID_VIEW}: {err}"));
        }
    };

    match service.create_from_input(input) {
        Ok(stored) => ApiResponse::json(
            200,
            &SaveReply {
                message: MSG_SAVE_OK,
                data: &stored,
            },
        ),
        Err(RepoError::Validation(err)) => {
            ApiResponse::error(500, &format!("{MSG_INVALID_VIEW}: {err}"))
        }
        Err(err) => {
            error!("event=view_save module=server status=error error={err}");
            ApiResponse::error(500, MSG_SAVE_FAILED)
        }
    }
}

fn list_views<R: PresetRepository>(service: &PresetService<R>, user: &str) -> ApiResponse {
    match service.list_by_user(user) {
        Ok(presets) => ApiResponse::json(200, &presets),
        Err(err) => {
            error!("event=view_list module=server status=error error={err}");
            ApiResponse::error(500, MSG_LIST_FAILED)
        }
    }
}

fn delete_preset<R: PresetRepository>(service: &PresetService<R>, store_id: &str) -> ApiResponse {
    match service.delete_by_id(store_id) {
        Ok(()) => ApiResponse::json(
            200,
            &DeleteReply {
                success: true,
                message: MSG_DELETE_OK,
            },
        ),
        Err(RepoError::NotFound(_)) => ApiResponse::error(404, MSG_DELETE_MISSING),
        Err(err) => {
            error!(
                "event=view_delete module=server status=error store_id={store_id} error={err}"
            );
            ApiResponse::error(500, MSG_DELETE_FAILED)
        }
    }
}
