//! Service info and API documentation endpoints.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use iras_relay_core::{optional_fields, required_fields, SubmissionType};

use super::now_timestamp;

fn describe(kind: SubmissionType) -> &'static str {
    match kind {
        SubmissionType::GstReturn => "GST Return submission callback (F5, F8)",
        SubmissionType::FormCs => "Form C-S corporate filing submission callback",
        SubmissionType::Commission => "Commission records submission callback",
        SubmissionType::Donation => "Donation records submission callback",
        SubmissionType::EStamp => "E-stamping submission callback",
    }
}

/// GET /
pub(crate) async fn handle_root() -> impl IntoResponse {
    let mut endpoints = serde_json::Map::new();
    for kind in SubmissionType::ALL {
        endpoints.insert(
            kind.path_segment().replace('-', "_"),
            serde_json::json!(format!("/iras/{}/callback", kind.path_segment())),
        );
    }
    endpoints.insert("health".to_string(), serde_json::json!("/health"));
    endpoints.insert("logs".to_string(), serde_json::json!("/logs"));

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "IRAS Callback API Server",
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": endpoints,
            "documentation": "Visit /docs for endpoint documentation",
            "timestamp": now_timestamp(),
        })),
    )
}

/// GET /docs
pub(crate) async fn handle_docs() -> impl IntoResponse {
    let endpoints: Vec<serde_json::Value> = SubmissionType::ALL
        .iter()
        .map(|kind| {
            serde_json::json!({
                "path": format!("/iras/{}/callback", kind.path_segment()),
                "method": "POST",
                "description": describe(*kind),
                "required_fields": required_fields(*kind),
                "optional_fields": optional_fields(*kind),
            })
        })
        .collect();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "title": "IRAS Callback API Documentation",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Callback receiver for IRAS filing notifications",
            "endpoints": endpoints,
            "example_payload": {
                "submissionId": "GST202501001234",
                "submissionStatus": "SUCCESS",
                "submissionDateTime": "2025-01-15T14:30:00+08:00",
                "companyUEN": "201234567D",
                "formType": "F5",
                "taxPeriod": "202412",
                "acknowledgementNumber": "ACK123456789",
                "totalTaxAmount": 15000.50
            },
        })),
    )
}
