//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection. Routing is a flat
//! match over method and path; handlers live in `crate::routes`.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::admin::AdminGateway;
use crate::config::Args;
use crate::gallery::SubmissionService;
use crate::identity::OperatorAllowlist;
use crate::registry::ContributionRegistry;
use crate::routes;
use crate::types::ArchwayError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub allowlist: OperatorAllowlist,
    /// None in dev mode without MongoDB; registry routes answer 503
    pub registry: Option<ContributionRegistry>,
    pub submissions: Option<SubmissionService>,
    pub admin: Option<AdminGateway>,
}

impl AppState {
    /// Create AppState without backing services (dev mode probe-only)
    pub fn new(args: Args) -> Self {
        let allowlist = OperatorAllowlist::from_args(&args);
        Self {
            args,
            allowlist,
            registry: None,
            submissions: None,
            admin: None,
        }
    }

    /// Create AppState with the full service set
    pub fn with_services(
        args: Args,
        registry: ContributionRegistry,
        submissions: SubmissionService,
        admin: AdminGateway,
    ) -> Self {
        let allowlist = OperatorAllowlist::from_args(&args);
        Self {
            args,
            allowlist,
            registry: Some(registry),
            submissions: Some(submissions),
            admin: Some(admin),
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), ArchwayError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Archway listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - backing services are optional");
    }

    if state.allowlist.is_empty() {
        warn!("Operator allow-list is empty - admin routes will refuse everyone");
    } else {
        info!("Operator allow-list loaded ({} entries)", state.allowlist.len());
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // CORS preflight
        (Method::OPTIONS, _) => preflight_response(),

        // Public gallery, aggregated by contributor
        (Method::GET, "/contributors") => {
            routes::handle_contributors(req, Arc::clone(&state)).await
        }

        // One contributor's profile page
        (Method::GET, p) if p.starts_with("/u/") => {
            let key = p.strip_prefix("/u/").unwrap_or("");
            routes::handle_profile(req, Arc::clone(&state), key).await
        }

        // Artifact submission
        (Method::POST, "/artifacts") => {
            routes::handle_upload(req, Arc::clone(&state)).await
        }

        // Operator dashboard: every contributor including private records
        (Method::GET, "/admin/contributors") => {
            routes::handle_admin_contributors(req, Arc::clone(&state)).await
        }

        // Operator delete
        (Method::DELETE, p) if p.starts_with("/admin/artifacts/") => {
            let id = p.strip_prefix("/admin/artifacts/").unwrap_or("");
            routes::handle_admin_delete(req, Arc::clone(&state), id).await
        }

        // Operator verification sweep
        (Method::POST, p)
            if p.starts_with("/admin/contributors/") && p.ends_with("/verify") =>
        {
            let key = p
                .strip_prefix("/admin/contributors/")
                .and_then(|s| s.strip_suffix("/verify"))
                .unwrap_or("");
            routes::handle_admin_verify(req, Arc::clone(&state), key).await
        }

        // Not found
        _ => not_found_response(&path),
    };

    Ok(response)
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
