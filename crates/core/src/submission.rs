//! Submission vocabulary: the five filing categories, the status enum,
//! and the normalized record produced by a successful validation.

use serde::Serialize;

/// The five IRAS filing categories, one per callback endpoint.
///
/// The type is determined by which endpoint received the request, never by
/// the payload itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionType {
    #[serde(rename = "GST_RETURN")]
    GstReturn,
    #[serde(rename = "FORM_CS")]
    FormCs,
    #[serde(rename = "COMMISSION")]
    Commission,
    #[serde(rename = "DONATION")]
    Donation,
    #[serde(rename = "ESTAMP")]
    EStamp,
}

impl SubmissionType {
    /// All submission types, in endpoint-documentation order.
    pub const ALL: [SubmissionType; 5] = [
        SubmissionType::GstReturn,
        SubmissionType::FormCs,
        SubmissionType::Commission,
        SubmissionType::Donation,
        SubmissionType::EStamp,
    ];

    /// Parse the `{kind}` path segment of `/iras/{kind}/callback`.
    pub fn from_path_segment(segment: &str) -> Option<SubmissionType> {
        match segment {
            "gst-return" => Some(SubmissionType::GstReturn),
            "form-cs" => Some(SubmissionType::FormCs),
            "commission-records" => Some(SubmissionType::Commission),
            "donation-records" => Some(SubmissionType::Donation),
            "e-stamping" => Some(SubmissionType::EStamp),
            _ => None,
        }
    }

    /// The URL path segment for this type.
    pub fn path_segment(&self) -> &'static str {
        match self {
            SubmissionType::GstReturn => "gst-return",
            SubmissionType::FormCs => "form-cs",
            SubmissionType::Commission => "commission-records",
            SubmissionType::Donation => "donation-records",
            SubmissionType::EStamp => "e-stamping",
        }
    }

    /// The tag recorded in the event log `endpoint` field.
    pub fn endpoint_tag(&self) -> &'static str {
        match self {
            SubmissionType::GstReturn => "GST-RETURN",
            SubmissionType::FormCs => "FORM-CS",
            SubmissionType::Commission => "COMMISSION-RECORDS",
            SubmissionType::Donation => "DONATION-RECORDS",
            SubmissionType::EStamp => "E-STAMPING",
        }
    }
}

/// Submission status reported by IRAS. Case-sensitive on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Success,
    Failed,
    Processing,
    Pending,
    Rejected,
    Cancelled,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 6] = [
        SubmissionStatus::Success,
        SubmissionStatus::Failed,
        SubmissionStatus::Processing,
        SubmissionStatus::Pending,
        SubmissionStatus::Rejected,
        SubmissionStatus::Cancelled,
    ];

    /// Exact-match parse. `"success"` is NOT `SUCCESS`.
    pub fn parse(s: &str) -> Option<SubmissionStatus> {
        match s {
            "SUCCESS" => Some(SubmissionStatus::Success),
            "FAILED" => Some(SubmissionStatus::Failed),
            "PROCESSING" => Some(SubmissionStatus::Processing),
            "PENDING" => Some(SubmissionStatus::Pending),
            "REJECTED" => Some(SubmissionStatus::Rejected),
            "CANCELLED" => Some(SubmissionStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Success => "SUCCESS",
            SubmissionStatus::Failed => "FAILED",
            SubmissionStatus::Processing => "PROCESSING",
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Rejected => "REJECTED",
            SubmissionStatus::Cancelled => "CANCELLED",
        }
    }
}

/// GST return form type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormType {
    F5,
    F8,
}

impl FormType {
    pub fn parse(s: &str) -> Option<FormType> {
        match s {
            "F5" => Some(FormType::F5),
            "F8" => Some(FormType::F8),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::F5 => "F5",
            FormType::F8 => "F8",
        }
    }
}

/// The normalized result of a successful validation.
///
/// Invariant: never constructed with a missing required field or a malformed
/// UEN/date/period -- such inputs produce a [`crate::ValidationError`]
/// instead. Serializes to the camelCase wire names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub submission_id: String,
    pub submission_type: SubmissionType,
    pub submission_status: SubmissionStatus,
    /// Verbatim ISO-8601 string, already validated.
    pub submission_date_time: String,
    pub company_uen: String,
    #[serde(flatten)]
    pub detail: SubmissionDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledgement_number: Option<String>,
    /// Error strings reported by IRAS, passed through verbatim.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Per-type fields of a validated submission. Flattened into the record on
/// serialization, so the wire shape matches the inbound payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SubmissionDetail {
    #[serde(rename_all = "camelCase")]
    GstReturn {
        form_type: FormType,
        tax_period: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_tax_amount: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    FormCs {
        form_version: String,
        filing_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        effective_date: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Commission {
        record_type: String,
        record_period: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_records: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_commission_amount: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Donation {
        donation_type: String,
        donation_period: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_donations: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_donation_amount: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    EStamp {
        document_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stamp_duty: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stamp_certificate_number: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segment_round_trip() {
        for kind in SubmissionType::ALL {
            assert_eq!(
                SubmissionType::from_path_segment(kind.path_segment()),
                Some(kind)
            );
        }
        assert_eq!(SubmissionType::from_path_segment("gst"), None);
        assert_eq!(SubmissionType::from_path_segment("GST-RETURN"), None);
    }

    #[test]
    fn status_parse_is_case_sensitive() {
        assert_eq!(
            SubmissionStatus::parse("SUCCESS"),
            Some(SubmissionStatus::Success)
        );
        assert_eq!(SubmissionStatus::parse("success"), None);
        assert_eq!(SubmissionStatus::parse("UNKNOWN"), None);
    }

    #[test]
    fn record_serializes_with_wire_names() {
        let record = SubmissionRecord {
            submission_id: "GST202501001234".to_string(),
            submission_type: SubmissionType::GstReturn,
            submission_status: SubmissionStatus::Success,
            submission_date_time: "2025-01-15T14:30:00+08:00".to_string(),
            company_uen: "201234567D".to_string(),
            detail: SubmissionDetail::GstReturn {
                form_type: FormType::F5,
                tax_period: "202412".to_string(),
                total_tax_amount: Some(15000.50),
            },
            acknowledgement_number: Some("ACK123456789".to_string()),
            errors: Vec::new(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["submissionId"], "GST202501001234");
        assert_eq!(json["submissionType"], "GST_RETURN");
        assert_eq!(json["submissionStatus"], "SUCCESS");
        assert_eq!(json["formType"], "F5");
        assert_eq!(json["taxPeriod"], "202412");
        assert_eq!(json["totalTaxAmount"], 15000.50);
        // empty errors array is omitted
        assert!(json.get("errors").is_none());
    }
}
