//! Operator dashboard routes
//!
//! All three routes require a credential on the operator allow-list. The
//! route layer rejects early so non-operators cannot probe for record
//! existence; the admin gateway re-checks before every mutation.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::gallery::{aggregate_contributors, ContributorSummary};
use crate::identity::CredentialSet;
use crate::registry::{contribution_from_doc, ArtifactStore};
use crate::routes::{credentials_from_headers, error_response, json_response, service_unavailable};
use crate::server::AppState;
use crate::types::ArchwayError;

#[derive(Serialize)]
struct DashboardStats {
    total_records: usize,
    total_contributors: usize,
    verified_contributors: usize,
    private_records: usize,
}

#[derive(Serialize)]
struct DashboardResponse {
    stats: DashboardStats,
    contributors: Vec<ContributorSummary>,
}

fn require_operator(state: &AppState, actor: &CredentialSet) -> Result<(), ArchwayError> {
    if state.allowlist.any_privileged(&actor.identities()) {
        Ok(())
    } else {
        Err(ArchwayError::Unauthorized(
            "Operator privileges required".to_string(),
        ))
    }
}

/// Handle GET /admin/contributors
pub async fn handle_admin_contributors(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let actor = credentials_from_headers(req.headers());
    if let Err(err) = require_operator(&state, &actor) {
        return error_response(err);
    }

    let Some(registry) = state.registry.as_ref() else {
        return service_unavailable("Contribution registry");
    };

    match registry.fetch_all().await {
        Ok(records) => {
            let total_records = records.len();
            let private_records = records.iter().filter(|r| r.private).count();
            let contributors = aggregate_contributors(records);
            let stats = DashboardStats {
                total_records,
                total_contributors: contributors.len(),
                verified_contributors: contributors.iter().filter(|c| c.verified).count(),
                private_records,
            };
            json_response(StatusCode::OK, &DashboardResponse { stats, contributors })
        }
        Err(err) => error_response(err),
    }
}

/// Handle DELETE /admin/artifacts/{id}
pub async fn handle_admin_delete(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<Full<Bytes>> {
    let actor = credentials_from_headers(req.headers());
    if let Err(err) = require_operator(&state, &actor) {
        return error_response(err);
    }

    let (Some(registry), Some(admin)) = (state.registry.as_ref(), state.admin.as_ref()) else {
        return service_unavailable("Admin gateway");
    };

    let record = match registry.store().find_by_id(id).await {
        Ok(Some(doc)) => contribution_from_doc(&doc),
        Ok(None) => {
            return error_response(ArchwayError::NotFound(format!(
                "No contribution with id {}",
                id
            )))
        }
        Err(err) => return error_response(err),
    };

    match admin.delete_contribution(&actor, &record).await {
        Ok(()) => {
            info!(%id, "artifact deleted via admin route");
            json_response(StatusCode::OK, &serde_json::json!({ "deleted": id }))
        }
        Err(err) => error_response(err),
    }
}

/// Handle POST /admin/contributors/{key}/verify
pub async fn handle_admin_verify(
    req: Request<Incoming>,
    state: Arc<AppState>,
    raw_key: &str,
) -> Response<Full<Bytes>> {
    let actor = credentials_from_headers(req.headers());
    if let Err(err) = require_operator(&state, &actor) {
        return error_response(err);
    }

    let Some(admin) = state.admin.as_ref() else {
        return service_unavailable("Admin gateway");
    };

    let key = match urlencoding::decode(raw_key) {
        Ok(decoded) if !decoded.trim().is_empty() => decoded.into_owned(),
        _ => {
            return error_response(ArchwayError::BadRequest(
                "Missing contributor key".to_string(),
            ))
        }
    };

    match admin.mark_verified(&actor, &key).await {
        Ok(receipt) if receipt.updated == 0 => {
            // Zero matches is not success; the operator probably mistyped
            let body = serde_json::json!({
                "error": format!("No records found for contributor {}", key),
                "code": "NO_MATCHING_RECORDS",
            });
            Response::builder()
                .status(StatusCode::NOT_FOUND)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(Full::new(Bytes::from(body.to_string())))
                .unwrap()
        }
        Ok(receipt) => json_response(StatusCode::OK, &receipt),
        Err(err) => error_response(err),
    }
}
