//! Artifact upload route
//!
//! POST /artifacts with a JSON body carrying the image as base64. The
//! submission service handles the blob-then-row sequence.

use base64::Engine;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::schemas::ContentType;
use crate::gallery::SubmissionRequest;
use crate::routes::{credentials_from_headers, error_response, json_response, service_unavailable};
use crate::server::AppState;
use crate::types::ArchwayError;

#[derive(Deserialize)]
struct UploadBody {
    file_name: String,
    /// Base64-encoded image bytes
    image: String,
    #[serde(default = "default_mime")]
    image_mime: String,
    content_type: String,
    description: String,
    #[serde(default)]
    message_link: Option<String>,
    /// Defaults to private; contributors opt in to public visibility
    #[serde(default = "default_private")]
    private: bool,
}

fn default_mime() -> String {
    "image/png".to_string()
}

fn default_private() -> bool {
    true
}

/// Handle POST /artifacts
pub async fn handle_upload(req: Request<Incoming>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let Some(submissions) = state.submissions.as_ref() else {
        return service_unavailable("Submission service");
    };

    let uploader = credentials_from_headers(req.headers());

    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            return error_response(ArchwayError::BadRequest(format!(
                "Failed to read request body: {}",
                e
            )))
        }
    };

    let upload: UploadBody = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return error_response(ArchwayError::BadRequest(format!("Invalid JSON: {}", e)))
        }
    };

    let image_bytes = match base64::engine::general_purpose::STANDARD.decode(&upload.image) {
        Ok(bytes) => bytes,
        Err(_) => {
            return error_response(ArchwayError::BadRequest(
                "Image must be base64 encoded".to_string(),
            ))
        }
    };

    let request = SubmissionRequest {
        file_name: upload.file_name,
        image_bytes,
        image_mime: upload.image_mime,
        kind: ContentType::parse(&upload.content_type),
        description: upload.description,
        message_link: upload.message_link.filter(|link| !link.trim().is_empty()),
        private: upload.private,
    };

    match submissions.submit(&uploader, request).await {
        Ok(receipt) => json_response(StatusCode::CREATED, &receipt),
        Err(err) => error_response(err),
    }
}
