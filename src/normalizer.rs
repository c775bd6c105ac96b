//! Record Normalization
//!
//! Maps one raw log record, whatever its origin, onto the fixed tuple
//! `{service, region, action, subject}` the pipeline works with.
//!
//! Two origins exist: a record object from a gzipped CloudTrail JSON batch,
//! and one row from a tabular CSV export with a fixed column order
//! (service, region, action, subject). Both are parsed into a typed
//! [`RawRecord`] up front so that missing or mistyped fields fail fast with
//! a clear decode error instead of surfacing late in the reduction.
//!
//! Records without an identity (no `userIdentity.arn`, or an explicitly
//! null one) normalize to `None` and are silently excluded from the index:
//! anonymous events are out of scope for an identity-centric report.

use serde::Deserialize;

/// Identity block of a CloudTrail record. Only the ARN matters here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserIdentity {
    #[serde(default)]
    pub arn: Option<String>,
}

/// One raw log record as decoded from a batch object.
///
/// The required fields are `Option` at the serde layer so that a missing
/// field can be reported with its name rather than as a generic parse error.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "eventSource")]
    pub event_source: Option<String>,
    #[serde(rename = "awsRegion")]
    pub aws_region: Option<String>,
    #[serde(rename = "eventName")]
    pub event_name: Option<String>,
    #[serde(rename = "userIdentity", default)]
    pub user_identity: Option<UserIdentity>,
}

impl RawRecord {
    /// Build a record from one CSV row in the fixed export column order:
    /// service, region, action, subject.
    pub fn from_csv_row(row: &csv::StringRecord) -> Result<Self, String> {
        if row.len() < 4 {
            return Err(format!("expected 4 columns, got {}", row.len()));
        }
        let field = |i: usize| {
            let value = row[i].trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        Ok(Self {
            event_source: field(0),
            aws_region: field(1),
            event_name: field(2),
            user_identity: Some(UserIdentity { arn: field(3) }),
        })
    }
}

/// The validated tuple a raw record normalizes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub service: String,
    pub region: String,
    pub action: String,
    pub subject: String,
}

/// Normalize one raw record.
///
/// Returns `Ok(None)` for records with no identity (the skip sentinel) and
/// an error naming the first missing required field otherwise.
pub fn normalize(record: RawRecord) -> Result<Option<NormalizedRecord>, String> {
    let subject = match record.user_identity.and_then(|id| id.arn) {
        Some(arn) => arn,
        None => return Ok(None),
    };

    let service = record.event_source.ok_or("missing field eventSource")?;
    let region = record.aws_region.ok_or("missing field awsRegion")?;
    let action = record.event_name.ok_or("missing field eventName")?;

    Ok(Some(NormalizedRecord {
        service,
        region,
        action,
        subject,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_record(raw: &str) -> RawRecord {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_normalize_json_record() {
        let record = json_record(
            r#"{
                "eventSource": "s3.amazonaws.com",
                "awsRegion": "us-east-1",
                "eventName": "GetObject",
                "userIdentity": {"arn": "arn:aws:iam::111111111111:user/alice"}
            }"#,
        );
        let normalized = normalize(record).unwrap().unwrap();
        assert_eq!(normalized.service, "s3.amazonaws.com");
        assert_eq!(normalized.region, "us-east-1");
        assert_eq!(normalized.action, "GetObject");
        assert_eq!(normalized.subject, "arn:aws:iam::111111111111:user/alice");
    }

    #[test]
    fn test_null_identity_is_skip_not_error() {
        let record = json_record(
            r#"{
                "eventSource": "s3.amazonaws.com",
                "awsRegion": "us-east-1",
                "eventName": "GetObject",
                "userIdentity": {"arn": null}
            }"#,
        );
        assert_eq!(normalize(record).unwrap(), None);
    }

    #[test]
    fn test_absent_identity_is_skip_not_error() {
        let record = json_record(
            r#"{
                "eventSource": "s3.amazonaws.com",
                "awsRegion": "us-east-1",
                "eventName": "GetObject"
            }"#,
        );
        assert_eq!(normalize(record).unwrap(), None);
    }

    #[test]
    fn test_missing_required_field_fails_fast() {
        let record = json_record(
            r#"{
                "awsRegion": "us-east-1",
                "eventName": "GetObject",
                "userIdentity": {"arn": "arn:aws:iam::1:user/alice"}
            }"#,
        );
        let err = normalize(record).unwrap_err();
        assert!(err.contains("eventSource"));
    }

    #[test]
    fn test_csv_row_fixed_column_order() {
        let row = csv::StringRecord::from(vec![
            "s3.amazonaws.com",
            "us-east-1",
            "PutObject",
            "arn:aws:sts::1:assumed-role/deploy",
        ]);
        let record = RawRecord::from_csv_row(&row).unwrap();
        let normalized = normalize(record).unwrap().unwrap();
        assert_eq!(normalized.action, "PutObject");
        assert_eq!(normalized.subject, "arn:aws:sts::1:assumed-role/deploy");
    }

    #[test]
    fn test_csv_row_empty_subject_is_skip() {
        let row =
            csv::StringRecord::from(vec!["s3.amazonaws.com", "us-east-1", "PutObject", ""]);
        let record = RawRecord::from_csv_row(&row).unwrap();
        assert_eq!(normalize(record).unwrap(), None);
    }

    #[test]
    fn test_csv_row_too_short() {
        let row = csv::StringRecord::from(vec!["s3.amazonaws.com", "us-east-1"]);
        assert!(RawRecord::from_csv_row(&row).is_err());
    }
}
