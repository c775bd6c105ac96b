//! CloudTrail Daily Library
//!
//! Aggregates a day's worth of CloudTrail-style audit-log batches from an
//! object store into a hierarchical usage report answering "which identity
//! invoked which action on which service, in which region".
//!
//! ## Architecture Overview
//!
//! - [`models`] - The usage index: region -> subject -> service -> action
//! - [`classifier`] - ARN-shaped subject string classification
//! - [`normalizer`] - Typed raw records (JSON batch / CSV row) and the
//!   normalize-or-skip step
//! - [`store`] - The object-store seam (`ObjectStore` trait + S3 client)
//! - [`fetcher`] - Batch-key listing and container decoding
//! - [`pipeline`] - Bounded fan-out, single-collector aggregation
//! - [`cache`] - File-backed report memoization keyed by bucket/region/date
//! - [`report`] - Deterministic nested text rendering
//! - [`config`] / [`logging`] - Runtime configuration and structured logging
//!
//! The pipeline is fail-fast: a fetch or decode error anywhere aborts the
//! whole run and nothing is cached. The report claims completeness for its
//! day or it does not exist.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod store;

pub use error::{Error, Result};
pub use models::{ClassifiedEvent, Identity, RegionUsage, Subject, Usage, UsageIndex};
pub use pipeline::Aggregator;
