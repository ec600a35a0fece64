//! Gallery and profile routes
//!
//! GET /contributors - public gallery aggregated by contributor
//! GET /u/{key}      - one contributor's visible records
//!
//! Both routes resolve the visitor's credentials from headers and let the
//! registry filter at the fetch boundary, so the response never carries a
//! record the visitor cannot see.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::gallery::{aggregate_contributors, ContributorSummary};
use crate::registry::Contribution;
use crate::routes::{credentials_from_headers, error_response, json_response, service_unavailable};
use crate::server::AppState;
use crate::types::ArchwayError;

#[derive(Serialize)]
struct GalleryResponse {
    contributors: Vec<ContributorSummary>,
}

#[derive(Serialize)]
struct ProfileResponse {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<String>,
    verified: bool,
    records: Vec<Contribution>,
}

/// Handle GET /contributors
pub async fn handle_contributors(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let Some(registry) = state.registry.as_ref() else {
        return service_unavailable("Contribution registry");
    };

    let viewer = credentials_from_headers(req.headers());

    match registry.fetch_visible(&viewer).await {
        Ok(records) => {
            let contributors = aggregate_contributors(records);
            debug!(count = contributors.len(), "gallery rendered");
            json_response(StatusCode::OK, &GalleryResponse { contributors })
        }
        Err(err) => error_response(err),
    }
}

/// Handle GET /u/{key}
pub async fn handle_profile(
    req: Request<Incoming>,
    state: Arc<AppState>,
    raw_key: &str,
) -> Response<Full<Bytes>> {
    let Some(registry) = state.registry.as_ref() else {
        return service_unavailable("Contribution registry");
    };

    let key = match urlencoding::decode(raw_key) {
        Ok(decoded) if !decoded.trim().is_empty() => decoded.into_owned(),
        _ => {
            return error_response(ArchwayError::BadRequest(
                "Missing contributor key".to_string(),
            ))
        }
    };

    let viewer = credentials_from_headers(req.headers());

    match registry.fetch_profile(&viewer, &key).await {
        Ok(records) => {
            // Aggregation yields at most one summary since every record
            // shares the requested owner key
            let mut summaries = aggregate_contributors(records);
            let response = match summaries.pop() {
                Some(summary) => ProfileResponse {
                    key,
                    display_name: Some(summary.display_name),
                    avatar_url: Some(summary.avatar_url),
                    verified: summary.verified,
                    records: summary.records,
                },
                // No visible records still renders an empty profile page
                None => ProfileResponse {
                    key,
                    display_name: None,
                    avatar_url: None,
                    verified: false,
                    records: Vec::new(),
                },
            };
            json_response(StatusCode::OK, &response)
        }
        Err(err) => error_response(err),
    }
}
