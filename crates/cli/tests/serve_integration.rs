//! Integration tests for the `iras-relay serve` HTTP API.
//!
//! Each test starts the server as a child process on a unique port,
//! makes HTTP requests, and verifies the responses.

use std::io::Read;
use std::net::TcpStream;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

/// Atomic port counter to avoid port conflicts between parallel tests.
/// Base port is derived from process ID so parallel `cargo test --workspace`
/// runs (separate test binaries) don't collide on the same port range.
static NEXT_PORT: AtomicU16 = AtomicU16::new(0);
static PORT_INIT: std::sync::Once = std::sync::Once::new();

fn next_port() -> u16 {
    PORT_INIT.call_once(|| {
        let base = 20000 + (std::process::id() as u16 % 20000);
        NEXT_PORT.store(base, Ordering::SeqCst);
    });
    NEXT_PORT.fetch_add(1, Ordering::SeqCst)
}

/// Helper: start the receiver process on the given port.
fn start_server(port: u16) -> Child {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_iras-relay"));
    cmd.arg("serve").arg("--port").arg(port.to_string());
    // Redirect stdout/stderr to avoid blocking
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    let child = cmd.spawn().expect("failed to start iras-relay serve");
    // Wait for server to be ready by polling the port
    for _ in 0..50 {
        if TcpStream::connect(format!("127.0.0.1:{}", port)).is_ok() {
            return child;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    child
}

/// Helper: make an HTTP request and return (status, body).
fn http_request(port: u16, method: &str, path: &str, body: Option<&str>) -> (u16, String) {
    let mut stream = TcpStream::connect(format!("127.0.0.1:{}", port)).expect("failed to connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();

    let body = body.unwrap_or("");
    let request = format!(
        "{} {} HTTP/1.1\r\nHost: localhost:{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        method, path, port, body.len(), body
    );
    std::io::Write::write_all(&mut stream, request.as_bytes()).expect("failed to write");

    let mut response = String::new();
    let _ = stream.read_to_string(&mut response);

    parse_http_response(&response)
}

fn http_get(port: u16, path: &str) -> (u16, String) {
    http_request(port, "GET", path, None)
}

fn http_post(port: u16, path: &str, body: &str) -> (u16, String) {
    http_request(port, "POST", path, Some(body))
}

/// Parse an HTTP response into (status_code, body).
fn parse_http_response(response: &str) -> (u16, String) {
    let parts: Vec<&str> = response.splitn(2, "\r\n\r\n").collect();
    let headers = parts.first().unwrap_or(&"").to_string();
    let body = parts.get(1).unwrap_or(&"").to_string();

    let status_line = headers.lines().next().unwrap_or("");
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(0);

    // Handle chunked transfer encoding
    let body = if headers.contains("Transfer-Encoding: chunked") {
        decode_chunked(&body)
    } else {
        body
    };

    (status, body)
}

/// Decode chunked transfer encoding.
fn decode_chunked(data: &str) -> String {
    let mut result = String::new();
    let mut remaining = data;

    while let Some(line_end) = remaining.find("\r\n") {
        let size_str = &remaining[..line_end];
        let size = match usize::from_str_radix(size_str.trim(), 16) {
            Ok(s) => s,
            Err(_) => break,
        };
        if size == 0 {
            break;
        }
        let chunk_start = line_end + 2;
        let chunk_end = chunk_start + size;
        if chunk_end > remaining.len() {
            // Partial chunk, take what we have
            result.push_str(&remaining[chunk_start..]);
            break;
        }
        result.push_str(&remaining[chunk_start..chunk_end]);
        remaining = if chunk_end + 2 <= remaining.len() {
            &remaining[chunk_end + 2..]
        } else {
            ""
        };
    }

    result
}

/// The documented GST example payload.
fn gst_example_body() -> String {
    serde_json::json!({
        "submissionId": "GST202501001234",
        "submissionStatus": "SUCCESS",
        "submissionDateTime": "2025-01-15T14:30:00+08:00",
        "companyUEN": "201234567D",
        "formType": "F5",
        "taxPeriod": "202412",
        "acknowledgementNumber": "ACK123456789",
        "totalTaxAmount": 15000.50
    })
    .to_string()
}

#[test]
fn health_returns_200_healthy() {
    let port = next_port();
    let mut child = start_server(port);

    let (status, body) = http_get(port, "/health");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["logs_count"], 0);
    assert_eq!(json["memory_usage"], "normal");
}

#[test]
fn gst_callback_success_echoes_submission_id() {
    let port = next_port();
    let mut child = start_server(port);

    let (status, body) = http_post(port, "/iras/gst-return/callback", &gst_example_body());
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200, "body: {}", body);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["status"], "received");
    assert_eq!(json["submissionId"], "GST202501001234");
    let message = json["message"].as_str().expect("message string");
    assert!(
        message.contains("F5") && message.contains("202412"),
        "message: {}",
        message
    );
    let request_id = json["requestId"].as_str().expect("requestId string");
    assert_eq!(request_id.len(), 8);
}

#[test]
fn gst_callback_missing_fields_returns_400() {
    let port = next_port();
    let mut child = start_server(port);

    let (status, body) = http_post(
        port,
        "/iras/gst-return/callback",
        r#"{"submissionId": "GST1", "submissionStatus": "SUCCESS"}"#,
    );
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 400, "body: {}", body);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["status"], "error");
    assert_eq!(json["submissionId"], "GST1");
    let message = json["message"].as_str().expect("message string");
    assert!(
        message.starts_with("Missing required fields:"),
        "message: {}",
        message
    );
    assert!(message.contains("formType"), "message: {}", message);
    assert!(message.contains("companyUEN"), "message: {}", message);
    assert!(message.contains("taxPeriod"), "message: {}", message);
    let error_id = json["error_id"].as_str().expect("error_id string");
    assert_eq!(error_id.len(), 8);
}

#[test]
fn gst_callback_bad_tax_period_names_the_field() {
    let port = next_port();
    let mut child = start_server(port);

    let mut payload: serde_json::Value = serde_json::from_str(&gst_example_body()).unwrap();
    payload["taxPeriod"] = serde_json::json!("202413");
    let (status, body) = http_post(port, "/iras/gst-return/callback", &payload.to_string());
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 400, "body: {}", body);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["status"], "error");
    let message = json["message"].as_str().expect("message string");
    assert!(message.contains("taxPeriod"), "message: {}", message);
}

#[test]
fn invalid_json_body_returns_400() {
    let port = next_port();
    let mut child = start_server(port);

    let (status, body) = http_post(port, "/iras/gst-return/callback", "{not json");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 400, "body: {}", body);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["status"], "error");
    assert_eq!(json["submissionId"], serde_json::Value::Null);
}

#[test]
fn unknown_callback_kind_returns_404() {
    let port = next_port();
    let mut child = start_server(port);

    let (status, body) = http_post(port, "/iras/income-tax/callback", &gst_example_body());
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 404, "body: {}", body);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "Endpoint not found");
}

#[test]
fn not_found_lists_available_endpoints() {
    let port = next_port();
    let mut child = start_server(port);

    let (status, body) = http_get(port, "/nonexistent");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 404);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    let available = json["available_endpoints"].as_array().expect("array");
    assert!(available
        .iter()
        .any(|e| e == "/iras/gst-return/callback"));
}

#[test]
fn form_cs_callback_success() {
    let port = next_port();
    let mut child = start_server(port);

    let body = serde_json::json!({
        "submissionId": "CS202501000001",
        "submissionStatus": "PROCESSING",
        "submissionDateTime": "2025-01-15T14:30:00+08:00",
        "companyUEN": "201234567D",
        "formVersion": "2025.1",
        "filingType": "ANNUAL_RETURN"
    })
    .to_string();
    let (status, resp_body) = http_post(port, "/iras/form-cs/callback", &body);
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200, "body: {}", resp_body);
    let json: serde_json::Value = serde_json::from_str(&resp_body).expect("valid JSON");
    assert_eq!(json["status"], "received");
    assert_eq!(json["submissionId"], "CS202501000001");
    let message = json["message"].as_str().expect("message string");
    assert!(
        message.contains("ANNUAL_RETURN") && message.contains("is processing"),
        "message: {}",
        message
    );
}

#[test]
fn logs_stats_and_clear_round_trip() {
    let port = next_port();
    let mut child = start_server(port);

    // Two callbacks on different endpoints
    let (status, _) = http_post(port, "/iras/gst-return/callback", &gst_example_body());
    assert_eq!(status, 200);
    let estamp = serde_json::json!({
        "submissionId": "ES202501000001",
        "submissionStatus": "SUCCESS",
        "submissionDateTime": "2025-01-15T14:30:00+08:00",
        "companyUEN": "201234567D",
        "documentType": "TENANCY_AGREEMENT"
    })
    .to_string();
    let (status, _) = http_post(port, "/iras/e-stamping/callback", &estamp);
    assert_eq!(status, 200);

    // A rejected callback must not be appended
    let (status, _) = http_post(port, "/iras/gst-return/callback", r#"{}"#);
    assert_eq!(status, 400);

    // /logs with limit
    let (status, body) = http_get(port, "/logs?limit=1");
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["total_callbacks"], 2);
    assert_eq!(json["returned_logs"], 1);
    let logs = json["logs"].as_array().expect("logs array");
    // newest last, so the single returned entry is the e-stamping one
    assert_eq!(logs[0]["endpoint"], "E-STAMPING");
    assert_eq!(logs[0]["status"], "SUCCESS");
    assert_eq!(logs[0]["method"], "POST");
    assert_eq!(logs[0]["payload"]["submissionId"], "ES202501000001");

    // /logs/stats
    let (status, body) = http_get(port, "/logs/stats");
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["total_callbacks"], 2);
    assert_eq!(json["endpoint_breakdown"]["GST-RETURN"], 1);
    assert_eq!(json["endpoint_breakdown"]["E-STAMPING"], 1);
    assert_eq!(json["status_breakdown"]["SUCCESS"], 2);
    let activity = json["recent_activity"].as_array().expect("array");
    assert_eq!(activity.len(), 2);
    assert_eq!(activity[1]["submissionId"], "ES202501000001");

    // DELETE /logs
    let (status, body) = http_request(port, "DELETE", "/logs", None);
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["message"], "Cleared 2 callback logs");

    // stats after clear report nothing
    let (status, body) = http_get(port, "/logs/stats");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["total_callbacks"], 0);
    assert!(json["endpoint_breakdown"]
        .as_object()
        .expect("object")
        .is_empty());
    assert_eq!(json["latest_callback"], serde_json::Value::Null);
}

#[test]
fn mock_gst_callback_appends_test_tagged_entry() {
    let port = next_port();
    let mut child = start_server(port);

    let (status, body) = http_post(port, "/test/mock-gst-callback", "");
    assert_eq!(status, 200, "body: {}", body);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["mock_data"]["formType"], "F5");
    assert_eq!(json["callback_response"]["status"], "received");

    let (status, body) = http_get(port, "/logs");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    let logs = json["logs"].as_array().expect("logs array");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["endpoint"], "GST-RETURN-TEST");
    assert_eq!(logs[0]["clientAddress"], "internal");
}

#[test]
fn validate_callback_valid_and_invalid() {
    let port = next_port();
    let mut child = start_server(port);

    let (status, body) = http_post(
        port,
        "/test/validate-callback?type=gst-return",
        &gst_example_body(),
    );
    assert_eq!(status, 200, "body: {}", body);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["status"], "valid");
    assert_eq!(json["validated_data"]["submissionId"], "GST202501001234");
    assert_eq!(json["validated_data"]["submissionType"], "GST_RETURN");

    let mut bad: serde_json::Value = serde_json::from_str(&gst_example_body()).unwrap();
    bad["companyUEN"] = serde_json::json!("201234567d");
    let (status, body) = http_post(
        port,
        "/test/validate-callback?type=gst-return",
        &bad.to_string(),
    );

    // validation-only requests never touch the log
    let (log_status, log_body) = http_get(port, "/logs");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 400, "body: {}", body);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["status"], "invalid");
    assert_eq!(json["message"], "Validation failed");
    assert!(json["error"]
        .as_str()
        .expect("error string")
        .contains("companyUEN"));

    assert_eq!(log_status, 200);
    let log_json: serde_json::Value = serde_json::from_str(&log_body).expect("valid JSON");
    assert_eq!(log_json["total_callbacks"], 0);
}

#[test]
fn docs_lists_all_five_callback_endpoints() {
    let port = next_port();
    let mut child = start_server(port);

    let (status, body) = http_get(port, "/docs");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    let endpoints = json["endpoints"].as_array().expect("endpoints array");
    assert_eq!(endpoints.len(), 5);
    let gst = &endpoints[0];
    assert_eq!(gst["path"], "/iras/gst-return/callback");
    let required = gst["required_fields"].as_array().expect("array");
    assert!(required.iter().any(|f| f == "taxPeriod"));
}

#[test]
fn get_on_callback_endpoint_is_method_not_allowed() {
    let port = next_port();
    let mut child = start_server(port);

    let (status, _) = http_get(port, "/iras/gst-return/callback");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 405);
}
