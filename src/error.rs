//! Error taxonomy for the aggregation pipeline
//!
//! Every failure in the core maps onto one of these variants. Nothing here
//! retries: errors propagate to the top level and the process exits non-zero.
//! A failed run never updates the report cache.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration, detected before the pipeline starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The suffix-filtered listing for the requested day came back empty.
    #[error("no log batches found under s3://{bucket}/{prefix}")]
    NoBatchesFound { bucket: String, prefix: String },

    /// Object-store retrieval failed. Aborts the whole run.
    #[error("failed to fetch s3://{bucket}/{key}: {reason}")]
    Fetch {
        bucket: String,
        key: String,
        reason: String,
    },

    /// Container decode failed (gzip, JSON envelope, or CSV). Aborts the
    /// whole run: a corrupt batch invalidates the day's report.
    #[error("failed to decode batch {key}: {reason}")]
    Decode { key: String, reason: String },

    /// Subject string matched none of the recognized ARN shapes.
    #[error("no matching role/user pattern for subject: {subject}")]
    Classification { subject: String },

    /// Report cache file could not be read or written.
    #[error("report cache error: {0}")]
    Cache(String),
}
