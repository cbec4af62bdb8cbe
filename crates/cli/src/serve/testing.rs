//! Development aids: mock callback generators and a validate-only endpoint.
//!
//! Not part of the production contract. Mocks run through the same validator
//! and event log as the real endpoints, tagged with a `-TEST` suffix so they
//! are distinguishable in `/logs/stats`.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use iras_relay_core::{validate, EntryStatus, LogEntry, SubmissionType};

use super::handlers::outcome_message;
use super::state::AppState;
use super::{error_body, now_timestamp, short_id};

/// Timestamp-derived identifier suffix for mock payloads, e.g. "20250115143000".
fn mock_serial() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// Run a server-generated mock payload through the validator and log it.
///
/// A mock the server itself built failing validation is a server fault, so
/// that path answers 500 and appends an ERROR entry for operators.
async fn process_mock(
    state: Arc<AppState>,
    kind: SubmissionType,
    mock: serde_json::Value,
    message: &str,
) -> Response {
    let request_id = short_id();
    let endpoint = format!("{}-TEST", kind.endpoint_tag());

    match validate(kind, &mock) {
        Ok(record) => {
            let entry = LogEntry {
                request_id: request_id.clone(),
                timestamp: now_timestamp(),
                endpoint,
                payload: mock.clone(),
                headers: BTreeMap::new(),
                client_address: "internal".to_string(),
                method: "POST".to_string(),
                status: EntryStatus::Success,
            };
            state.log.lock().await.append(entry);

            let callback_response = serde_json::json!({
                "status": "received",
                "message": outcome_message(&record),
                "submissionId": record.submission_id,
                "timestamp": now_timestamp(),
                "requestId": request_id,
            });
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "message": message,
                    "mock_data": mock,
                    "callback_response": callback_response,
                })),
            )
                .into_response()
        }
        Err(e) => {
            eprintln!(
                "[{}] mock {} payload failed validation: {}",
                request_id,
                kind.endpoint_tag(),
                e
            );
            let entry = LogEntry {
                request_id: request_id.clone(),
                timestamp: now_timestamp(),
                endpoint,
                payload: mock,
                headers: BTreeMap::new(),
                client_address: "internal".to_string(),
                method: "POST".to_string(),
                status: EntryStatus::Error,
            };
            state.log.lock().await.append(entry);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_body("Error processing callback", &request_id, None)),
            )
                .into_response()
        }
    }
}

/// POST /test/mock-gst-callback
pub(crate) async fn handle_mock_gst(State(state): State<Arc<AppState>>) -> Response {
    let serial = mock_serial();
    let mock = serde_json::json!({
        "submissionId": format!("GST{}", serial),
        "submissionStatus": "SUCCESS",
        "formType": "F5",
        "submissionDateTime": now_timestamp(),
        "companyUEN": "201234567D",
        "taxPeriod": "202412",
        "acknowledgementNumber": format!("ACK{}", serial),
        "totalTaxAmount": 15000.50,
        "errors": []
    });
    process_mock(
        state,
        SubmissionType::GstReturn,
        mock,
        "Mock GST callback generated and processed successfully",
    )
    .await
}

/// POST /test/mock-form-cs-callback
pub(crate) async fn handle_mock_form_cs(State(state): State<Arc<AppState>>) -> Response {
    let serial = mock_serial();
    let mock = serde_json::json!({
        "submissionId": format!("CS{}", serial),
        "submissionStatus": "SUCCESS",
        "submissionDateTime": now_timestamp(),
        "companyUEN": "201234567D",
        "formVersion": "2025.1",
        "filingType": "ANNUAL_RETURN",
        "effectiveDate": "2025-01-01",
        "acknowledgementNumber": format!("ACK{}", serial),
        "errors": []
    });
    process_mock(
        state,
        SubmissionType::FormCs,
        mock,
        "Mock Form CS callback generated and processed successfully",
    )
    .await
}

#[derive(Deserialize)]
pub(crate) struct ValidateQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// POST /test/validate-callback?type={kind} -- validator only, no append.
pub(crate) async fn handle_validate_only(
    Query(query): Query<ValidateQuery>,
    body: Bytes,
) -> Response {
    let raw_kind = query.kind.unwrap_or_else(|| "gst-return".to_string());
    let Some(kind) = SubmissionType::from_path_segment(&raw_kind) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(error_body(
                &format!("unknown submission type '{}'", raw_kind),
                &short_id(),
                None,
            )),
        )
            .into_response();
    };

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(error_body(
                    &format!("Invalid JSON payload: {}", e),
                    &short_id(),
                    None,
                )),
            )
                .into_response();
        }
    };

    match validate(kind, &payload) {
        Ok(record) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "valid",
                "message": format!("Callback data validation passed for {}", raw_kind),
                "validated_data": record,
                "timestamp": now_timestamp(),
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "status": "invalid",
                "message": "Validation failed",
                "error": e.to_string(),
                "problems": e.problems,
                "timestamp": now_timestamp(),
            })),
        )
            .into_response(),
    }
}
