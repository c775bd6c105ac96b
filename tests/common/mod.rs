use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::io::Write;

use cloudtrail_daily::error::{Error, Result};
use cloudtrail_daily::store::ObjectStore;

/// In-memory object store for pipeline tests.
#[derive(Default)]
pub struct MemoryStore {
    objects: BTreeMap<(String, String), Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bucket: &str, key: &str, bytes: Vec<u8>) {
        self.objects
            .insert((bucket.to_string(), key.to_string()), bytes);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| Error::Fetch {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: "no such object".to_string(),
            })
    }
}

/// Object store whose every operation fails, for asserting a path is never
/// taken.
pub struct UnreachableStore;

#[async_trait]
impl ObjectStore for UnreachableStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        Err(Error::Fetch {
            bucket: bucket.to_string(),
            key: prefix.to_string(),
            reason: "store must not be touched".to_string(),
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        Err(Error::Fetch {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: "store must not be touched".to_string(),
        })
    }
}

/// Gzip a JSON batch body the way CloudTrail delivers them.
pub fn gzip(body: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

/// A single-record CloudTrail batch envelope.
pub fn json_batch(service: &str, region: &str, action: &str, arn: &str) -> Vec<u8> {
    gzip(&format!(
        r#"{{"Records": [{{
            "eventSource": "{service}",
            "awsRegion": "{region}",
            "eventName": "{action}",
            "userIdentity": {{"arn": "{arn}"}}
        }}]}}"#
    ))
}
