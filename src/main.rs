//! Archway - identity and access gateway for the community artifact archive

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use archway::{
    admin::AdminGateway,
    config::Args,
    db::MongoClient,
    gallery::SubmissionService,
    identity::OperatorAllowlist,
    registry::{ContributionRegistry, MongoArtifactStore},
    server,
    storage::HttpBlobStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("archway={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Archway - Artifact Archive Gateway");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("Database: {}", args.mongodb_db);

    // Connect to MongoDB; optional in dev mode so the gateway can come up
    // for probe and route smoke-testing without a database
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => Some(client),
        Err(e) if args.dev_mode => {
            warn!("MongoDB unavailable in dev mode: {}", e);
            None
        }
        Err(e) => {
            error!("Failed to connect to MongoDB: {}", e);
            std::process::exit(1);
        }
    };

    let state = match (mongo, args.storage_url.as_deref()) {
        (Some(mongo), Some(storage_url)) => {
            let store = Arc::new(MongoArtifactStore::new(&mongo).await?);
            let blobs = Arc::new(HttpBlobStore::new(
                storage_url,
                &args.storage_bucket,
                Duration::from_millis(args.request_timeout_ms),
            )?);
            let allowlist = OperatorAllowlist::from_args(&args);

            let registry =
                ContributionRegistry::new(store.clone(), allowlist.clone(), &args);
            let submissions = SubmissionService::new(store.clone(), blobs.clone());
            let admin = AdminGateway::new(store, blobs, allowlist);

            server::AppState::with_services(args, registry, submissions, admin)
        }
        _ => {
            warn!("Running without backing services - registry routes will answer 503");
            server::AppState::new(args)
        }
    };

    server::run(Arc::new(state)).await?;

    Ok(())
}
