mod applications;
mod config;
mod db;
mod edits;
mod errors;
mod llm_client;
mod models;
mod profile;
mod routes;
mod session;
mod state;
mod store;
mod templates;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::blob::S3BlobStore;
use crate::store::postgres::{PgApplicationStore, PgProfileStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL (migrations run on connect)
    let db = create_pool(&config.database_url).await?;

    // S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let blobs = S3BlobStore::new(s3, config.s3_bucket.clone(), config.s3_public_url.clone());
    info!("S3 blob store initialized (bucket: {})", config.s3_bucket);

    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    info!(
        "Edit sessions: autosave after {}ms idle, escalate after {} failed saves, close after {}s unused",
        config.autosave_debounce_ms,
        config.save_failure_escalation,
        config.session_idle_timeout_secs
    );

    let state = AppState::new(
        config.clone(),
        llm,
        Arc::new(blobs),
        Arc::new(PgProfileStore::new(db.clone())),
        Arc::new(PgApplicationStore::new(db)),
    );

    tokio::spawn(sweep_idle_sessions(state.clone()));

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// How often idle edit sessions are looked for.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

async fn sweep_idle_sessions(state: AppState) {
    let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        let swept = state.sweep_idle_sessions();
        if swept > 0 {
            debug!("Closed {swept} idle edit sessions");
        }
    }
}

/// S3 client for MinIO locally or AWS in production.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "tailor-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
