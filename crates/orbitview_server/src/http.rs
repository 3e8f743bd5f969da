//! Blocking accept loop over `tiny_http`.
//!
//! Requests are handled one at a time on the calling thread; the store
//! connection is never shared across threads.

use crate::routes::{route, ApiResponse, ResponseBody, MSG_SERVER_ERROR};
use log::{info, warn};
use orbitview_core::{PresetRepository, PresetService};
use std::io::{Cursor, Read};
use std::time::Instant;
use tiny_http::{Header, Request, Response, Server};

const ALLOWED_METHODS: &str = "GET, POST, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";
const ENCODE_FALLBACK: &[u8] = br#"{"error":"Server error"}"#;

/// Serves requests until the server is unblocked or its socket closes.
pub fn serve_requests<R: PresetRepository>(server: &Server, service: &PresetService<R>) {
    for request in server.incoming_requests() {
        handle_request(request, service);
    }
    info!("event=server_stop module=server status=ok");
}

/// Routes one request and writes the reply.
pub fn handle_request<R: PresetRepository>(mut request: Request, service: &PresetService<R>) {
    let started_at = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or_default().to_string();

    let mut body = Vec::new();
    let reply = match request.as_reader().read_to_end(&mut body) {
        Ok(_) => route(service, &method, &url, &body),
        Err(err) => {
            warn!(
                "event=http_request module=server status=error error_code=body_read_failed path={} error={}",
                path, err
            );
            ApiResponse::error(500, MSG_SERVER_ERROR)
        }
    };

    let http_status = reply.status;
    if let Err(err) = request.respond(into_http_response(reply)) {
        warn!(
            "event=http_request module=server status=error error_code=respond_failed method={} path={} error={}",
            method, path, err
        );
        return;
    }

    info!(
        "event=http_request module=server status=ok method={} path={} http_status={} duration_ms={}",
        method,
        path,
        http_status,
        started_at.elapsed().as_millis()
    );
}

fn into_http_response(reply: ApiResponse) -> Response<Cursor<Vec<u8>>> {
    let (bytes, content_type) = match reply.body {
        ResponseBody::Json(value) => (
            serde_json::to_vec(&value).unwrap_or_else(|_| ENCODE_FALLBACK.to_vec()),
            Some("application/json"),
        ),
        ResponseBody::Text(text) => (text.as_bytes().to_vec(), Some("text/plain; charset=utf-8")),
        ResponseBody::Empty => (Vec::new(), None),
    };

    let mut response = Response::from_data(bytes).with_status_code(reply.status);
    if let Some(content_type) = content_type {
        response = with_header(response, "Content-Type", content_type);
    }
    response = with_header(response, "Access-Control-Allow-Origin", "*");
    response = with_header(response, "Access-Control-Allow-Methods", ALLOWED_METHODS);
    with_header(response, "Access-Control-Allow-Headers", ALLOWED_HEADERS)
}

fn with_header(
    response: Response<Cursor<Vec<u8>>>,
    name: &str,
    value: &str,
) -> Response<Cursor<Vec<u8>>> {
    match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}
