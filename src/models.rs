//! Core Data Models
//!
//! Data structures for the usage report, from a single classified event up to
//! the full nested index.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`crate::normalizer::RawRecord`] - one record from a log batch
//! 2. **Classified**: [`ClassifiedEvent`] - the four-tuple a pipeline task emits
//! 3. **Aggregate**: [`UsageIndex`] - region -> subject -> service -> action
//!
//! The index is a presence index, not an event counter: re-inserting the
//! same four-tuple is a no-op, so insertion is idempotent and commutative
//! and the report answers "did X ever do Y", not "how often".
//!
//! All nesting levels use `BTreeMap` so that rendering and serialization are
//! deterministic regardless of task completion order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Account/name pair carried by both subject kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub account: String,
    pub name: String,
}

/// The authenticated identity that performed an action.
///
/// Exactly one variant; classification failure is a hard error upstream,
/// never an empty subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    User(Identity),
    Role(Identity),
}

impl Subject {
    /// Display name for report rendering.
    pub fn name(&self) -> &str {
        match self {
            Subject::User(id) | Subject::Role(id) => &id.name,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Subject::User(_) => "User",
            Subject::Role(_) => "Role",
        }
    }
}

/// One distinct (service, action-name) event type seen for a subject.
///
/// `resources` is reserved in the data model but never populated by the
/// current reduction; see DESIGN.md.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub actions: BTreeMap<String, Action>,
}

/// Everything one subject did within a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub subject: Subject,
    pub services: BTreeMap<String, Service>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionUsage {
    pub region: String,
    /// Keyed by canonical subject key ("user:alice", "role:deploy", ...).
    pub usages: BTreeMap<String, Usage>,
}

/// One normalized, classified log record: the unit the pipeline folds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub region: String,
    pub subject_key: String,
    pub subject: Subject,
    pub service: String,
    pub action: String,
}

/// The top-level aggregate produced by one pipeline run:
/// region -> canonical subject key -> service -> action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageIndex {
    pub regions: BTreeMap<String, RegionUsage>,
}

impl UsageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Idempotent upsert along the four nesting levels. Each level is
    /// created with empty children on first reference; re-inserting an
    /// identical event leaves the index unchanged.
    pub fn insert(&mut self, event: ClassifiedEvent) {
        let region_usage = self
            .regions
            .entry(event.region.clone())
            .or_insert_with(|| RegionUsage {
                region: event.region,
                usages: BTreeMap::new(),
            });
        let usage = region_usage
            .usages
            .entry(event.subject_key)
            .or_insert_with(|| Usage {
                subject: event.subject,
                services: BTreeMap::new(),
            });
        let service = usage.services.entry(event.service).or_default();
        service.actions.entry(event.action).or_default();
    }

    /// Total number of distinct (region, subject, service, action) tuples.
    pub fn distinct_actions(&self) -> usize {
        self.regions
            .values()
            .flat_map(|r| r.usages.values())
            .flat_map(|u| u.services.values())
            .map(|s| s.actions.len())
            .sum()
    }
}
