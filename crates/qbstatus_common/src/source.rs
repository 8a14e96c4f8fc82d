//! Data source boundary.
//!
//! The reporter never talks to the mirror database or the Web Connector
//! tables directly. Everything it consumes comes through `SyncSource`.
//! `SnapshotSource` is an in-memory implementation backed by a JSON snapshot
//! of that state, used by qbstatusctl and the tests.

use crate::error::{Result, StatusError};
use crate::escalation::ConnectionEvidence;
use crate::mirror::{parse_date_bound, RowQuery, StorageLocation};
use crate::queue::QueueRecord;
use crate::row::RawRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Everything the status reporter needs from the outside world.
pub trait SyncSource {
    /// Username used when the caller does not name one.
    fn default_user(&self) -> Result<String>;

    /// Last login / last action for `user`, `None` if never seen.
    fn last_contact(&self, user: &str) -> Result<Option<ConnectionEvidence>>;

    /// Queue jobs for `user`, optionally bounded by enqueue time.
    fn queue_jobs(
        &self,
        user: &str,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Result<Vec<QueueRecord>>;

    /// Table and error column holding mirrored rows of `entity_type`.
    fn storage_location(&self, entity_type: &str) -> Option<StorageLocation>;

    /// Execute a row predicate built by the mirror pipeline.
    fn query_rows(&self, query: &RowQuery) -> Result<Vec<RawRow>>;
}

/// Serialized state consumed by `SnapshotSource`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub default_user: String,
    /// Per-user last-contact evidence
    #[serde(default)]
    pub auth: BTreeMap<String, ConnectionEvidence>,
    #[serde(default)]
    pub queue: Vec<QueueRecord>,
    /// Entity type → storage location
    #[serde(default)]
    pub schema: BTreeMap<String, StorageLocation>,
    /// Physical table name (prefix included) → rows
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<RawRow>>,
}

/// In-memory `SyncSource` over a `Snapshot`.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let source = Self::from_json_str(&content)?;
        debug!(
            path = %path.display(),
            jobs = source.snapshot.queue.len(),
            tables = source.snapshot.tables.len(),
            "Loaded snapshot"
        );
        Ok(source)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl SyncSource for SnapshotSource {
    fn default_user(&self) -> Result<String> {
        if self.snapshot.default_user.is_empty() {
            return Err(StatusError::Source(
                "snapshot has no default user".to_string(),
            ));
        }
        Ok(self.snapshot.default_user.clone())
    }

    fn last_contact(&self, user: &str) -> Result<Option<ConnectionEvidence>> {
        Ok(self.snapshot.auth.get(user).cloned())
    }

    fn queue_jobs(
        &self,
        user: &str,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Result<Vec<QueueRecord>> {
        let from = parse_date_bound(date_from);
        let to = parse_date_bound(date_to);

        let jobs = self
            .snapshot
            .queue
            .iter()
            .filter(|job| job.user.as_deref().map_or(true, |u| u == user))
            .filter(|job| {
                if from.is_none() && to.is_none() {
                    return true;
                }
                let Some(enqueued) = job.enqueue_at.map(|t| t.naive_utc()) else {
                    return false;
                };
                from.map_or(true, |f| enqueued >= f) && to.map_or(true, |t| enqueued <= t)
            })
            .cloned()
            .collect();

        Ok(jobs)
    }

    fn storage_location(&self, entity_type: &str) -> Option<StorageLocation> {
        self.snapshot.schema.get(entity_type).cloned()
    }

    fn query_rows(&self, query: &RowQuery) -> Result<Vec<RawRow>> {
        let rows = self
            .snapshot
            .tables
            .get(&query.table)
            .ok_or_else(|| StatusError::Source(format!("no such table: {}", query.table)))?;

        Ok(rows.iter().filter(|r| query.matches(r)).cloned().collect())
    }
}
