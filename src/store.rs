//! Object store access
//!
//! The core only needs two operations against a bucket: list keys under a
//! prefix and get one object's bytes. [`ObjectStore`] captures exactly that
//! surface so the pipeline stays independent of the storage technology and
//! tests can supply an in-memory store.
//!
//! [`S3Store`] is the production implementation, speaking to Amazon S3 or
//! any S3-compatible service (MinIO, LocalStack) via a custom endpoint with
//! path-style addressing.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use tracing::debug;

use crate::error::{Error, Result};

/// Minimal object-store surface the pipeline depends on.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List all object keys under `prefix`, in listing order.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Retrieve one object's full contents.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
}

/// Amazon S3 implementation of [`ObjectStore`].
pub struct S3Store {
    client: S3Client,
}

impl S3Store {
    /// Connect using the default AWS credential chain for `region`.
    ///
    /// `endpoint_url` switches to an S3-compatible service and forces
    /// path-style addressing.
    pub async fn connect(region: &str, endpoint_url: Option<&str>) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&aws_config);
        if let Some(endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: S3Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        debug!(bucket, prefix, "listing objects");

        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| Error::Fetch {
                bucket: bucket.to_string(),
                key: prefix.to_string(),
                reason: e.to_string(),
            })?;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }
        }

        Ok(keys)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        debug!(bucket, key, "fetching object");

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::Fetch {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        let body = output.body.collect().await.map_err(|e| Error::Fetch {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        Ok(body.into_bytes().to_vec())
    }
}
