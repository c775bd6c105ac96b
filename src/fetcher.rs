//! Batch discovery and retrieval
//!
//! Lists the candidate batch objects for one day's prefix and turns each
//! object into its raw record sequence. Two container formats are
//! recognized by suffix: `.json.gz` (gzipped CloudTrail batch with a
//! `Records` envelope) and `.csv` (tabular export, header row first).
//!
//! Decode failures are fatal by contract: a corrupt or inaccessible batch
//! invalidates the whole day's report, since the report claims completeness.

use flate2::read::GzDecoder;
use serde::Deserialize;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::normalizer::RawRecord;
use crate::store::ObjectStore;

const BATCH_SUFFIXES: [&str; 2] = [".json.gz", ".csv"];

/// Envelope of a CloudTrail JSON batch object.
#[derive(Debug, Deserialize)]
struct BatchEnvelope {
    #[serde(rename = "Records")]
    records: Vec<RawRecord>,
}

pub struct BatchFetcher {
    store: Arc<dyn ObjectStore>,
}

impl BatchFetcher {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// List batch-object keys under the day's prefix, keeping only
    /// recognized batch suffixes. An empty filtered listing is an error:
    /// the requested day has nothing to report on.
    pub async fn list_batch_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        info!(bucket, prefix, "looking for log batches");

        let keys: Vec<String> = self
            .store
            .list(bucket, prefix)
            .await?
            .into_iter()
            .filter(|key| BATCH_SUFFIXES.iter().any(|suffix| key.ends_with(suffix)))
            .collect();

        if keys.is_empty() {
            return Err(Error::NoBatchesFound {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
            });
        }

        debug!(count = keys.len(), "found log batches");
        Ok(keys)
    }

    /// Retrieve one batch object and decode it into raw records.
    pub async fn fetch_batch(&self, bucket: &str, key: &str) -> Result<Vec<RawRecord>> {
        let bytes = self.store.get(bucket, key).await?;

        if key.ends_with(".json.gz") {
            decode_json_batch(key, &bytes)
        } else if key.ends_with(".csv") {
            decode_csv_batch(key, &bytes)
        } else {
            Err(Error::Decode {
                key: key.to_string(),
                reason: "unrecognized batch suffix".to_string(),
            })
        }
    }
}

fn decode_json_batch(key: &str, bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut json = Vec::new();
    decoder.read_to_end(&mut json).map_err(|e| Error::Decode {
        key: key.to_string(),
        reason: format!("gzip: {e}"),
    })?;

    let envelope: BatchEnvelope = serde_json::from_slice(&json).map_err(|e| Error::Decode {
        key: key.to_string(),
        reason: format!("json: {e}"),
    })?;

    Ok(envelope.records)
}

fn decode_csv_batch(key: &str, bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(bytes);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| Error::Decode {
            key: key.to_string(),
            reason: format!("csv: {e}"),
        })?;
        let record = RawRecord::from_csv_row(&row).map_err(|reason| Error::Decode {
            key: key.to_string(),
            reason,
        })?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_json_batch() {
        let body = gzip(
            r#"{"Records": [{
                "eventSource": "s3.amazonaws.com",
                "awsRegion": "us-east-1",
                "eventName": "GetObject",
                "userIdentity": {"arn": "arn:aws:iam::1:user/alice"}
            }]}"#,
        );
        let records = decode_json_batch("a.json.gz", &body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_name.as_deref(), Some("GetObject"));
    }

    #[test]
    fn test_decode_json_batch_rejects_truncated_gzip() {
        let mut body = gzip(r#"{"Records": []}"#);
        body.truncate(body.len() / 2);
        let err = decode_json_batch("a.json.gz", &body).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_decode_json_batch_rejects_missing_envelope() {
        let body = gzip(r#"{"NotRecords": []}"#);
        let err = decode_json_batch("a.json.gz", &body).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_decode_csv_batch_skips_header() {
        let body = b"service,region,action,subject\n\
            s3.amazonaws.com,us-east-1,GetObject,arn:aws:iam::1:user/alice\n";
        let records = decode_csv_batch("a.csv", body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].aws_region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_decode_csv_batch_rejects_short_rows() {
        let body = b"service,region,action,subject\ns3.amazonaws.com,us-east-1\n";
        assert!(decode_csv_batch("a.csv", body).is_err());
    }
}
