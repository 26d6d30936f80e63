use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use audit_forwarder::checkpoint::FileCheckpointStore;
use audit_forwarder::config::Settings;
use audit_forwarder::credentials::CacheConfig;
use audit_forwarder::server::{AppState, build_router};
use audit_forwarder::source::FetchOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_CHECKPOINT_PATH: &str = "state/checkpoint.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audit_forwarder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = env_or("LISTEN_ADDR", DEFAULT_LISTEN_ADDR)
        .parse()
        .context("LISTEN_ADDR is not a socket address")?;
    let checkpoint_path = env_or("CHECKPOINT_PATH", DEFAULT_CHECKPOINT_PATH);
    let cache_config = match std::env::var("TOKEN_CACHE_MAX_AGE_SECS") {
        Ok(secs) => CacheConfig {
            max_age: Duration::from_secs(
                secs.parse()
                    .context("TOKEN_CACHE_MAX_AGE_SECS is not a number of seconds")?,
            ),
            ..CacheConfig::DEFAULT
        },
        Err(_) => CacheConfig::DEFAULT,
    };

    let http = reqwest::Client::builder()
        .user_agent(concat!("audit-forwarder/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let settings = Settings::from_env();
    tracing::debug!(settings = ?settings, "Sampled settings");

    let state = AppState::new(
        settings,
        http,
        Arc::new(FileCheckpointStore::new(&checkpoint_path)),
        cache_config,
        FetchOptions::default(),
    );
    let app = build_router(state);

    tracing::info!(%addr, checkpoint = %checkpoint_path, "listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
