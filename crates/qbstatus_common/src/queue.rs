//! Queue report pipeline.
//!
//! Normalizes Web Connector queue jobs into report rows: status codes become
//! labels, the combined "code: message" field is split, and the error code is
//! explained through the error descriptor.

use crate::descriptor::ErrorDescriptor;
use crate::error::{Result, StatusError};
use crate::row::{QueueDetails, ReportRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Code used when a message carries no "code:" prefix.
pub const UNKNOWN_ERROR_CODE: &str = "?";

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Closed set of queue job states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Queued,
    Success,
    Error,
    Processing,
    Handled,
    Cancelled,
    Removed,
    Noop,
}

impl QueueStatus {
    pub const ALL: [QueueStatus; 8] = [
        QueueStatus::Queued,
        QueueStatus::Success,
        QueueStatus::Error,
        QueueStatus::Processing,
        QueueStatus::Handled,
        QueueStatus::Cancelled,
        QueueStatus::Removed,
        QueueStatus::Noop,
    ];

    /// Single-character code stored in the queue table.
    pub fn code(&self) -> &'static str {
        match self {
            QueueStatus::Queued => "q",
            QueueStatus::Success => "s",
            QueueStatus::Error => "e",
            QueueStatus::Processing => "i",
            QueueStatus::Handled => "h",
            QueueStatus::Cancelled => "c",
            QueueStatus::Removed => "r",
            QueueStatus::Noop => "n",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueueStatus::Queued => "Queued",
            QueueStatus::Success => "Successfully processed",
            QueueStatus::Error => "Error",
            QueueStatus::Processing => "Currently being processed",
            QueueStatus::Handled => "An error occurred, but the error was handled",
            QueueStatus::Cancelled => "Cancelled",
            QueueStatus::Removed => "Removed from queue",
            QueueStatus::Noop => "No operation occurred",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

/// Status code → label table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLabels {
    labels: BTreeMap<String, String>,
}

impl StatusLabels {
    pub fn label(&self, code: &str) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            labels: QueueStatus::ALL
                .into_iter()
                .map(|s| (s.code().to_string(), s.label().to_string()))
                .collect(),
        }
    }
}

/// A processed (or pending) job from the Web Connector queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRecord {
    pub queue_id: i64,
    /// Web Connector username the job belongs to
    #[serde(default)]
    pub user: Option<String>,
    pub action: String,
    pub ident: String,
    #[serde(default)]
    pub priority: i64,
    pub status_code: String,
    /// Combined "code: message" error text
    #[serde(default)]
    pub msg: Option<String>,
    pub enqueue_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dequeue_at: Option<DateTime<Utc>>,
}

/// Error code and message split out of a combined field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorParts {
    pub code: String,
    pub message: String,
}

/// Split "code: message" on the first colon.
///
/// - empty input: both parts empty
/// - no colon: code is `?`, message is the whole text
/// - otherwise: one space after the colon is dropped from the message
pub fn split_error_message(msg: &str) -> ErrorParts {
    if msg.is_empty() {
        return ErrorParts::default();
    }

    match msg.split_once(':') {
        Some((code, rest)) => ErrorParts {
            code: code.trim().to_string(),
            message: rest.strip_prefix(' ').unwrap_or(rest).to_string(),
        },
        None => ErrorParts {
            code: UNKNOWN_ERROR_CODE.to_string(),
            message: msg.to_string(),
        },
    }
}

fn display_time(at: Option<DateTime<Utc>>) -> Option<String> {
    at.map(|t| t.format(DISPLAY_TIME_FORMAT).to_string())
}

/// Build queue report rows in input order.
///
/// A status code outside the label table is a contract violation from the
/// data source and fails the whole report.
pub fn build_queue_report(
    jobs: &[QueueRecord],
    labels: &StatusLabels,
    descriptor: &ErrorDescriptor,
) -> Result<Vec<ReportRow>> {
    let mut rows = Vec::with_capacity(jobs.len());

    for job in jobs {
        let status = labels
            .label(&job.status_code)
            .ok_or_else(|| StatusError::UnmappedStatusCode {
                queue_id: job.queue_id.to_string(),
                code: job.status_code.clone(),
            })?;

        let parts = split_error_message(job.msg.as_deref().unwrap_or(""));
        let error_description = descriptor.describe(&parts.code, &parts.message);

        rows.push(ReportRow {
            id: job.queue_id.to_string(),
            entity_key: Some(job.ident.clone()),
            entity_label: Some(job.action.clone()),
            entity_date: None,
            related_party: None,
            error_code: parts.code,
            error_message: parts.message,
            error_description,
            processed_at: display_time(job.dequeue_at),
            full_record: None,
            queue: Some(QueueDetails {
                priority: job.priority,
                status: status.to_string(),
                enqueued_at: display_time(job.enqueue_at),
            }),
        });
    }

    debug!(rows = rows.len(), "Built queue report");
    Ok(rows)
}
