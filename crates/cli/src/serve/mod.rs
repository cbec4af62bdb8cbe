//! `iras-relay serve` -- HTTP JSON API for IRAS callback notifications.
//!
//! Exposes the validation engine and the bounded event log as an async HTTP
//! service using `axum` + `tokio`. Supports concurrent request handling; the
//! event log is the only shared mutable state.
//!
//! Endpoints:
//! - POST /iras/{kind}/callback        - Receive a filing callback
//!   (kind: gst-return, form-cs, commission-records, donation-records, e-stamping)
//! - GET  /                            - Service info
//! - GET  /docs                        - API documentation
//! - GET  /health                      - Health and log occupancy
//! - GET  /logs?limit=N                - Recent log entries (newest last)
//! - GET  /logs/stats                  - Aggregate log statistics
//! - DELETE /logs                      - Clear the log (development aid)
//! - POST /test/mock-gst-callback      - Generate and process a mock GST callback
//! - POST /test/mock-form-cs-callback  - Generate and process a mock Form CS callback
//! - POST /test/validate-callback      - Validator only, no log append
//!
//! All responses use Content-Type: application/json.

mod docs;
mod handlers;
mod state;
mod testing;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use self::docs::{handle_docs, handle_root};
use self::handlers::{
    handle_callback, handle_clear_logs, handle_health, handle_log_stats, handle_logs,
    handle_not_found,
};
use self::state::AppState;
use self::testing::{handle_mock_form_cs, handle_mock_gst, handle_validate_only};

/// Maximum request body size: 1 MB.
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Default number of entries returned by GET /logs.
const DEFAULT_LOGS_LIMIT: usize = 10;

/// Hard cap on GET /logs?limit=N.
const MAX_LOGS_LIMIT: usize = 200;

/// Current time as an RFC 3339 string, used for all response timestamps.
pub(crate) fn now_timestamp() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

/// 8-character opaque token for request/error correlation.
pub(crate) fn short_id() -> String {
    use rand::Rng;
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}

/// The standard error response body. Every error carries a correlation
/// identifier so operators can locate the corresponding log line.
pub(crate) fn error_body(
    message: &str,
    error_id: &str,
    submission_id: Option<&str>,
) -> serde_json::Value {
    serde_json::json!({
        "status": "error",
        "message": message,
        "error_id": error_id,
        "submissionId": submission_id,
        "timestamp": now_timestamp(),
    })
}

/// Start the HTTP server on the given port.
///
/// CORS is permissive: this receiver fronts integration-testing traffic from
/// arbitrary origins. There is no authentication; see the deployment notes.
pub async fn start_server(
    port: u16,
    log_capacity: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(log_capacity));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_root))
        .route("/docs", get(handle_docs))
        .route("/health", get(handle_health))
        .route("/iras/{kind}/callback", post(handle_callback))
        .route("/logs", get(handle_logs).delete(handle_clear_logs))
        .route("/logs/stats", get(handle_log_stats))
        .route("/test/mock-gst-callback", post(handle_mock_gst))
        .route("/test/mock-form-cs-callback", post(handle_mock_form_cs))
        .route("/test/validate-callback", post(handle_validate_only))
        .fallback(handle_not_found)
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!(
        "IRAS callback receiver listening on http://0.0.0.0:{} (log capacity {})",
        port, log_capacity
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    eprintln!("\nServer shut down.");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    eprintln!("\nReceived shutdown signal...");
}
