//! HTTP front of the OrbitView preset store.
//!
//! `routes` maps one request to one store operation and a JSON reply;
//! `http` owns the socket loop and response headers.

pub mod http;
pub mod routes;

pub use http::{handle_request, serve_requests};
pub use routes::{route, ApiResponse, ResponseBody};
