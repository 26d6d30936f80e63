//! HTTP trigger service.
//!
//! # Endpoints
//!
//! - `GET /`, `POST /` - Run one extraction (200 with a run summary)
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::checkpoint::CheckpointStore;
use crate::config::Settings;
use crate::credentials::{CacheConfig, CachedCredentialProvider, ClientCredentialsLoader};
use crate::source::FetchOptions;

pub mod health;
pub mod trigger;

pub use health::health_handler;
pub use trigger::{TriggerError, trigger_handler};

/// The process-wide credential provider.
pub type SharedCredentials = CachedCredentialProvider<ClientCredentialsLoader>;

/// Shared application state.
///
/// Everything here outlives a single run: the HTTP connection pool, the
/// credential cache, the checkpoint store and the lock that keeps runs from
/// overlapping.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Raw settings, validated on every trigger.
    settings: Settings,
    http: reqwest::Client,
    credentials: SharedCredentials,
    store: Arc<dyn CheckpointStore>,
    run_lock: Mutex<()>,
    /// Retry tuning; the page size comes from settings.
    fetch_options: FetchOptions,
}

impl AppState {
    pub fn new(
        settings: Settings,
        http: reqwest::Client,
        store: Arc<dyn CheckpointStore>,
        cache_config: CacheConfig,
        fetch_options: FetchOptions,
    ) -> Self {
        let credentials =
            CachedCredentialProvider::new(ClientCredentialsLoader::new(http.clone()), cache_config);
        AppState {
            inner: Arc::new(AppStateInner {
                settings,
                http,
                credentials,
                store,
                run_lock: Mutex::new(()),
                fetch_options,
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub fn credentials(&self) -> &SharedCredentials {
        &self.inner.credentials
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.inner.store
    }

    pub fn run_lock(&self) -> &Mutex<()> {
        &self.inner.run_lock
    }

    pub fn fetch_options(&self) -> FetchOptions {
        self.inner.fetch_options
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::get;

    axum::Router::new()
        .route("/", get(trigger_handler).post(trigger_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
