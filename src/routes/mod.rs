//! HTTP route handlers

pub mod admin_routes;
pub mod health;
pub mod profile;
pub mod upload;

pub use admin_routes::{handle_admin_contributors, handle_admin_delete, handle_admin_verify};
pub use health::{health_check, version_info};
pub use profile::{handle_contributors, handle_profile};
pub use upload::handle_upload;

use base64::Engine;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{header::HeaderMap, Response, StatusCode};
use serde::Serialize;
use tracing::warn;

use crate::identity::{CredentialSet, SocialSession};
use crate::types::ArchwayError;

/// Build the visitor's credential set from request headers.
///
/// The frontend forwards the connected wallet in `X-Wallet-Address` and the
/// social session as base64-encoded JSON in `X-Social-Session`. A malformed
/// session header is dropped rather than failing the request; the visitor
/// simply browses with fewer credentials.
pub fn credentials_from_headers(headers: &HeaderMap) -> CredentialSet {
    let wallet = headers
        .get("x-wallet-address")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let session = headers
        .get("x-social-session")
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| {
            base64::engine::general_purpose::STANDARD
                .decode(raw)
                .ok()
                .or_else(|| {
                    warn!("X-Social-Session header is not valid base64");
                    None
                })
        })
        .and_then(|decoded| {
            serde_json::from_slice::<SocialSession>(&decoded)
                .map_err(|e| warn!("X-Social-Session payload rejected: {}", e))
                .ok()
        });

    CredentialSet::new(wallet, session)
}

/// JSON success response
pub fn json_response<T: Serialize>(status: StatusCode, payload: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(payload)
        .unwrap_or_else(|_| r#"{"error":"Serialization failed"}"#.to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// JSON error response carrying the stable error code
pub fn error_response(err: ArchwayError) -> Response<Full<Bytes>> {
    let code = err.code();
    let (status, message) = err.into_status_code_and_body();
    let body = serde_json::json!({
        "error": message,
        "code": code,
    });

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

/// 503 for routes whose backing service is not wired up (dev mode)
pub fn service_unavailable(what: &str) -> Response<Full<Bytes>> {
    error_response(ArchwayError::RegistryUnavailable(format!(
        "{} is not available",
        what
    )))
}
