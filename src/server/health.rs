//! Liveness probe.

use axum::http::StatusCode;

/// Always 200 `OK` while the server accepts connections. Says nothing about
/// whether the configured source or sink are reachable.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
