//! Payload validation: required-field checks and per-field format checks.
//!
//! [`validate()`] is a pure function over `(SubmissionType, serde_json::Value)`.
//! Malformed input is the expected majority case and is reported through the
//! `Result` channel, never via a panic.
//!
//! Problem granularity follows two rules:
//! - every missing or empty required field is aggregated into ONE
//!   "Missing required fields: ..." problem, listing the names in check order;
//! - format checks run only on a structurally complete payload, and each
//!   failure is its own problem entry, in field-check order.

use serde_json::Value;
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::submission::{
    FormType, SubmissionDetail, SubmissionRecord, SubmissionStatus, SubmissionType,
};

/// A failed validation: a non-empty, ordered list of human-readable problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .problems.join("; "))]
pub struct ValidationError {
    pub problems: Vec<String>,
}

impl ValidationError {
    fn single(problem: impl Into<String>) -> Self {
        ValidationError {
            problems: vec![problem.into()],
        }
    }
}

/// Required fields per submission type, in check order.
///
/// Public so the documentation endpoint can render the contract without
/// duplicating the tables.
pub fn required_fields(kind: SubmissionType) -> &'static [&'static str] {
    match kind {
        SubmissionType::GstReturn => &[
            "submissionId",
            "submissionStatus",
            "formType",
            "submissionDateTime",
            "companyUEN",
            "taxPeriod",
        ],
        SubmissionType::FormCs => &[
            "submissionId",
            "submissionStatus",
            "submissionDateTime",
            "companyUEN",
            "formVersion",
            "filingType",
        ],
        SubmissionType::Commission => &[
            "submissionId",
            "submissionStatus",
            "submissionDateTime",
            "companyUEN",
            "recordType",
            "recordPeriod",
        ],
        SubmissionType::Donation => &[
            "submissionId",
            "submissionStatus",
            "submissionDateTime",
            "companyUEN",
            "donationType",
            "donationPeriod",
        ],
        SubmissionType::EStamp => &[
            "submissionId",
            "submissionStatus",
            "submissionDateTime",
            "companyUEN",
            "documentType",
        ],
    }
}

/// Optional fields per submission type, documentation order.
pub fn optional_fields(kind: SubmissionType) -> &'static [&'static str] {
    match kind {
        SubmissionType::GstReturn => &["acknowledgementNumber", "totalTaxAmount", "errors"],
        SubmissionType::FormCs => &["effectiveDate", "acknowledgementNumber", "errors"],
        SubmissionType::Commission => &[
            "totalRecords",
            "totalCommissionAmount",
            "acknowledgementNumber",
            "errors",
        ],
        SubmissionType::Donation => &[
            "totalDonations",
            "totalDonationAmount",
            "acknowledgementNumber",
            "errors",
        ],
        SubmissionType::EStamp => &[
            "stampDuty",
            "stampCertificateNumber",
            "acknowledgementNumber",
            "errors",
        ],
    }
}

/// Non-empty string field accessor. Absent, null, non-string, and `""` all
/// read as "not there" for required-field purposes.
fn get_str<'a>(payload: &'a Value, field: &str) -> Option<&'a str> {
    payload
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

/// UEN format: exactly 8 or 9 ASCII digits followed by one uppercase letter.
fn is_valid_uen(uen: &str) -> bool {
    let bytes = uen.as_bytes();
    if bytes.len() != 9 && bytes.len() != 10 {
        return false;
    }
    let (digits, suffix) = bytes.split_at(bytes.len() - 1);
    digits.iter().all(|b| b.is_ascii_digit()) && suffix[0].is_ascii_uppercase()
}

/// ISO-8601 date-time, offset permitted but not required.
fn is_iso8601(s: &str) -> bool {
    OffsetDateTime::parse(s, &Iso8601::DEFAULT).is_ok()
        || PrimitiveDateTime::parse(s, &Iso8601::DEFAULT).is_ok()
        || OffsetDateTime::parse(s, &Rfc3339).is_ok()
}

/// Tax period format: YYYYMM, year in [2000,2100], month in [01,12].
fn check_tax_period(period: &str) -> Result<(), String> {
    if period.len() != 6 || !period.bytes().all(|b| b.is_ascii_digit()) {
        return Err("Invalid taxPeriod format. Expected format: YYYYMM (e.g., 202412)".to_string());
    }
    let year: u32 = period[..4].parse().unwrap_or(0);
    let month: u32 = period[4..].parse().unwrap_or(0);
    if !(2000..=2100).contains(&year) {
        return Err("Invalid year in taxPeriod (expected 2000-2100)".to_string());
    }
    if !(1..=12).contains(&month) {
        return Err("Invalid month in taxPeriod (expected 01-12)".to_string());
    }
    Ok(())
}

/// Optional non-negative amount. Absent/null is fine; anything else must be
/// a non-negative JSON number.
fn opt_amount(payload: &Value, field: &str, problems: &mut Vec<String>) -> Option<f64> {
    match payload.get(field) {
        None | Some(Value::Null) => None,
        Some(v) => match v.as_f64() {
            Some(n) if n >= 0.0 => Some(n),
            _ => {
                problems.push(format!("{} must be a non-negative number", field));
                None
            }
        },
    }
}

/// Optional non-negative integer count.
fn opt_count(payload: &Value, field: &str, problems: &mut Vec<String>) -> Option<u64> {
    match payload.get(field) {
        None | Some(Value::Null) => None,
        Some(v) => match v.as_u64() {
            Some(n) => Some(n),
            None => {
                problems.push(format!("{} must be a non-negative integer", field));
                None
            }
        },
    }
}

/// Optional string field, `None` when absent or empty.
fn opt_str(payload: &Value, field: &str) -> Option<String> {
    get_str(payload, field).map(str::to_string)
}

/// The `errors` array, passed through verbatim if present.
fn errors_passthrough(payload: &Value) -> Vec<String> {
    payload
        .get("errors")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Per-type detail assembly. Pushes a problem for each malformed field and
/// returns `None` only when a constituent failed to parse.
fn build_detail(
    kind: SubmissionType,
    payload: &Value,
    form_type: Option<FormType>,
    problems: &mut Vec<String>,
) -> Option<SubmissionDetail> {
    match kind {
        SubmissionType::GstReturn => {
            let tax_period = get_str(payload, "taxPeriod").unwrap_or_default();
            if let Err(problem) = check_tax_period(tax_period) {
                problems.push(problem);
            }
            let total_tax_amount = opt_amount(payload, "totalTaxAmount", problems);
            Some(SubmissionDetail::GstReturn {
                form_type: form_type?,
                tax_period: tax_period.to_string(),
                total_tax_amount,
            })
        }
        SubmissionType::FormCs => Some(SubmissionDetail::FormCs {
            form_version: get_str(payload, "formVersion").unwrap_or_default().to_string(),
            filing_type: get_str(payload, "filingType").unwrap_or_default().to_string(),
            effective_date: opt_str(payload, "effectiveDate"),
        }),
        SubmissionType::Commission => {
            let total_records = opt_count(payload, "totalRecords", problems);
            let total_commission_amount = opt_amount(payload, "totalCommissionAmount", problems);
            Some(SubmissionDetail::Commission {
                record_type: get_str(payload, "recordType").unwrap_or_default().to_string(),
                record_period: get_str(payload, "recordPeriod").unwrap_or_default().to_string(),
                total_records,
                total_commission_amount,
            })
        }
        SubmissionType::Donation => {
            let total_donations = opt_count(payload, "totalDonations", problems);
            let total_donation_amount = opt_amount(payload, "totalDonationAmount", problems);
            Some(SubmissionDetail::Donation {
                donation_type: get_str(payload, "donationType").unwrap_or_default().to_string(),
                donation_period: get_str(payload, "donationPeriod")
                    .unwrap_or_default()
                    .to_string(),
                total_donations,
                total_donation_amount,
            })
        }
        SubmissionType::EStamp => {
            let stamp_duty = opt_amount(payload, "stampDuty", problems);
            Some(SubmissionDetail::EStamp {
                document_type: get_str(payload, "documentType").unwrap_or_default().to_string(),
                stamp_duty,
                stamp_certificate_number: opt_str(payload, "stampCertificateNumber"),
            })
        }
    }
}

/// Validate a decoded callback payload for the given submission type.
///
/// Returns the normalized [`SubmissionRecord`] on success, or a
/// [`ValidationError`] carrying every problem found. The submission type is
/// set from the endpoint context, never read from the payload.
pub fn validate(kind: SubmissionType, payload: &Value) -> Result<SubmissionRecord, ValidationError> {
    if !payload.is_object() {
        return Err(ValidationError::single(
            "invalid payload: expected a JSON object",
        ));
    }

    let missing: Vec<&str> = required_fields(kind)
        .iter()
        .copied()
        .filter(|field| get_str(payload, field).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::single(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let mut problems = Vec::new();

    let status_raw = get_str(payload, "submissionStatus").unwrap_or_default();
    let status = SubmissionStatus::parse(status_raw);
    if status.is_none() {
        problems.push(format!(
            "Invalid submissionStatus '{}'. Must be one of: SUCCESS, FAILED, PROCESSING, PENDING, REJECTED, CANCELLED",
            status_raw
        ));
    }

    let mut form_type = None;
    if kind == SubmissionType::GstReturn {
        let raw = get_str(payload, "formType").unwrap_or_default();
        form_type = FormType::parse(raw);
        if form_type.is_none() {
            problems.push("Invalid formType. Must be F5 or F8".to_string());
        }
    }

    let date_time = get_str(payload, "submissionDateTime").unwrap_or_default();
    if !is_iso8601(date_time) {
        problems.push(
            "Invalid submissionDateTime format. Expected an ISO-8601 date-time (e.g., 2025-01-15T14:30:00+08:00)"
                .to_string(),
        );
    }

    let uen = get_str(payload, "companyUEN").unwrap_or_default();
    if !is_valid_uen(uen) {
        problems.push("Invalid companyUEN format. Expected format: 12345678A or 123456789A".to_string());
    }

    let detail = build_detail(kind, payload, form_type, &mut problems);

    match (status, detail) {
        (Some(submission_status), Some(detail)) if problems.is_empty() => Ok(SubmissionRecord {
            submission_id: get_str(payload, "submissionId").unwrap_or_default().to_string(),
            submission_type: kind,
            submission_status,
            submission_date_time: date_time.to_string(),
            company_uen: uen.to_string(),
            detail,
            acknowledgement_number: opt_str(payload, "acknowledgementNumber"),
            errors: errors_passthrough(payload),
        }),
        _ => {
            debug_assert!(!problems.is_empty());
            Err(ValidationError { problems })
        }
    }
}
