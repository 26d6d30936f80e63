//! Run trigger endpoint.
//!
//! `GET /` and `POST /` run one extraction and answer with its summary.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::info;

use super::AppState;
use crate::config::{Config, ConfigError};
use crate::run::{Orchestrator, RunError, RunSummary};
use crate::sink::LogAnalyticsSink;
use crate::source::{Auth0LogSource, FetchOptions};

/// Errors surfaced by the trigger endpoint.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Required settings are missing or invalid. Nothing was attempted.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// The run failed.
    #[error(transparent)]
    Run(#[from] RunError),
}

impl IntoResponse for TriggerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            TriggerError::Configuration(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string() }),
            ),
            TriggerError::Run(run) => {
                let mut body = json!({ "error": self.to_string() });
                if let Some(summary) = run.summary() {
                    body["summary"] = json!(summary);
                    body["warning"] = json!("records were delivered but the checkpoint was not saved");
                }
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Runs one extraction.
///
/// # Response
///
/// - 200 OK with the [`RunSummary`], even if some records were rejected
/// - 400 Bad Request when configuration is missing or invalid
/// - 500 Internal Server Error on authentication, fetch or checkpoint failure
///
/// Runs in one process never overlap: a trigger that arrives mid-run waits
/// for it to finish and then resumes from its checkpoint.
pub async fn trigger_handler(
    State(app_state): State<AppState>,
) -> Result<Json<RunSummary>, TriggerError> {
    let config = Config::from_settings(app_state.settings())?;

    let _running = app_state.run_lock().lock().await;
    info!(
        domain = %config.source.domain,
        namespace = %config.sink.namespace,
        "Triggered run"
    );

    let source = Auth0LogSource::new(app_state.http().clone(), config.source.base_url.clone());
    let sink = LogAnalyticsSink::new(app_state.http().clone(), config.sink.clone());
    let fetch_options = FetchOptions {
        page_size: config.source.page_size,
        ..app_state.fetch_options()
    };

    let summary = Orchestrator::new(
        &source,
        &sink,
        app_state.credentials(),
        app_state.store(),
        config.source.credential_request(),
    )
    .with_fetch_options(fetch_options)
    .run()
    .await?;

    Ok(Json(summary))
}
