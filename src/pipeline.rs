//! Aggregation Pipeline
//!
//! The concurrency core: fan out one fetch-and-normalize task per batch key
//! with a bounded number in flight, funnel every task's classified events
//! into a single collector, and fold them into one [`UsageIndex`].
//!
//! ## Completion and failure semantics
//!
//! - The fold is serialized by construction: only the collector loop touches
//!   the index, and producers never hold a reference to it.
//! - Insertion is idempotent and commutative, so task completion order does
//!   not affect the result.
//! - The index is final only once the stream is exhausted; completion is
//!   observed, never raced.
//! - The first fetch/decode error aborts the run and discards all progress.
//!   There is no partial report: either the full day aggregates or nothing
//!   does. Classification failures follow the configured
//!   [`MalformedPolicy`].

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::classifier::classify;
use crate::config::{MalformedPolicy, ProcessingConfig};
use crate::error::{Error, Result};
use crate::fetcher::BatchFetcher;
use crate::models::{ClassifiedEvent, UsageIndex};
use crate::normalizer::{normalize, RawRecord};
use crate::store::ObjectStore;

pub struct Aggregator {
    fetcher: BatchFetcher,
    max_concurrent_fetches: usize,
    on_malformed: MalformedPolicy,
}

impl Aggregator {
    pub fn new(store: Arc<dyn ObjectStore>, processing: &ProcessingConfig) -> Self {
        Self {
            fetcher: BatchFetcher::new(store),
            max_concurrent_fetches: processing.max_concurrent_fetches,
            on_malformed: processing.on_malformed,
        }
    }

    /// Run the full pipeline for one day's prefix and return the folded
    /// index.
    pub async fn aggregate(&self, bucket: &str, prefix: &str) -> Result<UsageIndex> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("aggregate", %run_id, bucket, prefix);

        async {
            let keys = self.fetcher.list_batch_keys(bucket, prefix).await?;
            let total = keys.len();

            let mut batches = stream::iter(keys.into_iter().enumerate().map(|(i, key)| {
                let fetcher = &self.fetcher;
                let policy = self.on_malformed;
                async move {
                    let records = fetcher.fetch_batch(bucket, &key).await?;
                    debug!(batch = i + 1, total, key = %key, "processing batch");
                    process_batch(&key, records, policy)
                }
            }))
            .buffer_unordered(self.max_concurrent_fetches);

            // Single writer: the index lives here and nowhere else.
            let mut index = UsageIndex::new();
            while let Some(events) = batches.next().await {
                for event in events? {
                    index.insert(event);
                }
            }

            info!(
                batches = total,
                distinct_actions = index.distinct_actions(),
                "aggregation complete"
            );
            Ok(index)
        }
        .instrument(span)
        .await
    }
}

/// Normalize and classify every record of one batch.
fn process_batch(
    key: &str,
    records: Vec<RawRecord>,
    policy: MalformedPolicy,
) -> Result<Vec<ClassifiedEvent>> {
    let mut events = Vec::new();

    for record in records {
        let normalized = match normalize(record) {
            Ok(Some(n)) => n,
            // Anonymous event, out of scope for an identity-centric report.
            Ok(None) => continue,
            Err(reason) => {
                return Err(Error::Decode {
                    key: key.to_string(),
                    reason,
                })
            }
        };

        match classify(&normalized.subject) {
            Ok((subject, subject_key)) => events.push(ClassifiedEvent {
                region: normalized.region,
                subject_key,
                subject,
                service: normalized.service,
                action: normalized.action,
            }),
            Err(err) => match policy {
                MalformedPolicy::Abort => return Err(err),
                MalformedPolicy::Skip => {
                    warn!(key, subject = %normalized.subject, "skipping unclassifiable record");
                }
            },
        }
    }

    Ok(events)
}
