//! Core HTTP route handlers: callbacks, health, logs, stats, clear.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use iras_relay_core::{
    validate, EntryStatus, LogEntry, SubmissionDetail, SubmissionRecord, SubmissionStatus,
    SubmissionType,
};

use super::state::AppState;
use super::{error_body, now_timestamp, short_id, DEFAULT_LOGS_LIMIT, MAX_LOGS_LIMIT};

/// Request headers retained in log entries. Everything else is dropped.
const RETAINED_HEADERS: [&str; 5] = [
    "content-type",
    "content-length",
    "user-agent",
    "x-forwarded-for",
    "x-real-ip",
];

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "status": "error",
            "message": "Endpoint not found",
            "available_endpoints": [
                "/iras/gst-return/callback",
                "/iras/form-cs/callback",
                "/iras/commission-records/callback",
                "/iras/donation-records/callback",
                "/iras/e-stamping/callback",
                "/health",
                "/docs",
                "/logs",
            ],
            "timestamp": now_timestamp(),
        })),
    )
}

/// Client address for the log entry, honoring proxy headers over the
/// socket address (X-Forwarded-For first hop, then X-Real-IP).
fn client_address(headers: &HeaderMap, addr: SocketAddr) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        return real.to_string();
    }
    addr.ip().to_string()
}

/// The retained-header subset of the request headers.
fn retained_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    RETAINED_HEADERS
        .iter()
        .filter_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
}

/// Human-readable outcome line echoed back in the acknowledgement.
pub(crate) fn outcome_message(record: &SubmissionRecord) -> String {
    let subject = match &record.detail {
        SubmissionDetail::GstReturn {
            form_type,
            tax_period,
            ..
        } => format!(
            "GST {} submission for period {}",
            form_type.as_str(),
            tax_period
        ),
        SubmissionDetail::FormCs { filing_type, .. } => {
            format!("Form CS ({}) submission", filing_type)
        }
        SubmissionDetail::Commission {
            record_type,
            record_period,
            ..
        } => format!("Commission records ({}) for {}", record_type, record_period),
        SubmissionDetail::Donation {
            donation_type,
            donation_period,
            ..
        } => format!("Donation records ({}) for {}", donation_type, donation_period),
        SubmissionDetail::EStamp { document_type, .. } => {
            format!("E-stamping for {}", document_type)
        }
    };
    match record.submission_status {
        SubmissionStatus::Success => format!("{} processed successfully", subject),
        SubmissionStatus::Failed => format!("{} failed", subject),
        status => format!("{} is {}", subject, status.as_str().to_lowercase()),
    }
}

/// POST /iras/{kind}/callback
///
/// Validation failures are client faults: reported with a 400 and a
/// correlation id, but not appended to the event log.
pub(crate) async fn handle_callback(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(kind) = SubmissionType::from_path_segment(&kind) else {
        return handle_not_found().await.into_response();
    };

    let request_id = short_id();

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            eprintln!(
                "[{}] {} callback rejected: invalid JSON: {}",
                request_id,
                kind.endpoint_tag(),
                e
            );
            return (
                StatusCode::BAD_REQUEST,
                Json(error_body(
                    &format!("Invalid JSON payload: {}", e),
                    &request_id,
                    None,
                )),
            )
                .into_response();
        }
    };

    match validate(kind, &payload) {
        Ok(record) => {
            eprintln!(
                "[{}] {} callback received: submission {} status {}",
                request_id,
                kind.endpoint_tag(),
                record.submission_id,
                record.submission_status.as_str()
            );
            let entry = LogEntry {
                request_id: request_id.clone(),
                timestamp: now_timestamp(),
                endpoint: kind.endpoint_tag().to_string(),
                payload,
                headers: retained_headers(&headers),
                client_address: client_address(&headers, addr),
                method: "POST".to_string(),
                status: EntryStatus::Success,
            };
            state.log.lock().await.append(entry);

            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "status": "received",
                    "message": outcome_message(&record),
                    "submissionId": record.submission_id,
                    "timestamp": now_timestamp(),
                    "requestId": request_id,
                })),
            )
                .into_response()
        }
        Err(e) => {
            let submission_id = payload.get("submissionId").and_then(|v| v.as_str());
            eprintln!(
                "[{}] {} callback rejected: {}",
                request_id,
                kind.endpoint_tag(),
                e
            );
            (
                StatusCode::BAD_REQUEST,
                Json(error_body(&e.to_string(), &request_id, submission_id)),
            )
                .into_response()
        }
    }
}

/// GET /health
pub(crate) async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let log = state.log.lock().await;
    let count = log.len();
    // "high" once the buffer passes 80% of capacity
    let memory_usage = if count * 5 >= log.capacity() * 4 {
        "high"
    } else {
        "normal"
    };
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "timestamp": now_timestamp(),
            "logs_count": count,
            "memory_usage": memory_usage,
        })),
    )
}

#[derive(Deserialize)]
pub(crate) struct LogsQuery {
    limit: Option<usize>,
}

/// GET /logs?limit=N -- recent entries, newest last.
pub(crate) async fn handle_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_LOGS_LIMIT).min(MAX_LOGS_LIMIT);
    let log = state.log.lock().await;
    let logs = log.recent(limit);
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "total_callbacks": log.len(),
            "returned_logs": logs.len(),
            "logs": logs,
        })),
    )
}

/// GET /logs/stats
pub(crate) async fn handle_log_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let log = state.log.lock().await;
    let stats = log.stats();
    let recent_activity: Vec<serde_json::Value> = log
        .recent(10)
        .iter()
        .map(|e| {
            serde_json::json!({
                "timestamp": e.timestamp,
                "endpoint": e.endpoint,
                "status": e.status,
                "submissionId": e.payload.get("submissionId").and_then(|v| v.as_str()),
            })
        })
        .collect();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "total_callbacks": stats.total,
            "endpoint_breakdown": stats.by_endpoint,
            "status_breakdown": stats.by_status,
            "oldest_callback": stats.oldest_timestamp,
            "latest_callback": stats.newest_timestamp,
            "recent_activity": recent_activity,
        })),
    )
}

/// DELETE /logs -- development aid; irreversible.
pub(crate) async fn handle_clear_logs(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dropped = state.log.lock().await.clear();
    eprintln!("Cleared {} callback logs", dropped);
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "message": format!("Cleared {} callback logs", dropped),
            "timestamp": now_timestamp(),
        })),
    )
}
