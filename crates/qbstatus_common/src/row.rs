//! Uniform report row shared by the queue and mirror pipelines.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A raw row from the mirror store, keyed by column name.
pub type RawRow = BTreeMap<String, Value>;

/// Render a cell as text. `Null` and missing cells are absent.
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// First column among `candidates` that is present (and non-null) in `row`.
pub fn first_present(row: &RawRow, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|name| row.get(*name).and_then(cell_text))
}

/// Queue-only columns carried alongside the uniform fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDetails {
    pub priority: i64,
    /// Human label for the job status
    pub status: String,
    pub enqueued_at: Option<String>,
}

/// One normalized report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Queue id or mirror SQL id
    pub id: String,
    /// ListID / TxnID, or the queued record ident
    pub entity_key: Option<String>,
    /// Name / RefNumber, or the queued action
    pub entity_label: Option<String>,
    pub entity_date: Option<String>,
    /// Customer or vendor on the record
    pub related_party: Option<String>,
    pub error_code: String,
    pub error_message: String,
    pub error_description: String,
    pub processed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_record: Option<RawRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueDetails>,
}

impl ReportRow {
    pub fn has_error(&self) -> bool {
        !self.error_code.is_empty() || !self.error_message.is_empty()
    }
}
