//! Report Cache
//!
//! File-backed memoization of computed usage indexes, keyed by
//! `"<bucket>/<region>/<date>"`. The whole file is read once at startup
//! (empty map if absent) and rewritten in full after any update. Report
//! sizes are bounded by distinct identity-action counts, not raw event
//! volume, so whole-file rewrites stay cheap.
//!
//! The cache is consulted before running the pipeline and only updated
//! after a successful run; a failed run never touches it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::UsageIndex;

pub struct ReportCache {
    path: PathBuf,
    entries: BTreeMap<String, UsageIndex>,
}

impl ReportCache {
    /// Load the cache file, starting empty when it does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| Error::Cache(format!("read {}: {e}", path.display())))?;
            serde_json::from_str(&content)
                .map_err(|e| Error::Cache(format!("parse {}: {e}", path.display())))?
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = entries.len(), "loaded report cache");
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    fn key(bucket: &str, region: &str, date: &str) -> String {
        format!("{bucket}/{region}/{date}")
    }

    /// Return the stored index for the scan key, if any.
    pub fn lookup(&self, bucket: &str, region: &str, date: &str) -> Option<&UsageIndex> {
        self.entries.get(&Self::key(bucket, region, date))
    }

    /// Insert the index under the scan key and rewrite the whole file.
    pub fn store(
        &mut self,
        bucket: &str,
        region: &str,
        date: &str,
        index: UsageIndex,
    ) -> Result<()> {
        self.entries.insert(Self::key(bucket, region, date), index);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Cache(format!("create {}: {e}", parent.display())))?;
        }
        let content = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| Error::Cache(format!("serialize: {e}")))?;

        // Write to a sibling temp file and rename over the target, so an
        // interrupted write never leaves a truncated cache behind.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .map_err(|e| Error::Cache(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Cache(format!("rename {}: {e}", self.path.display())))?;

        info!(path = %self.path.display(), "report cache updated");
        Ok(())
    }
}
