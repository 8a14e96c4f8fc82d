//! Shared types and logic for qbstatus.
//!
//! Classifies the health of a QuickBooks Web Connector connection from its
//! last-contact time, and normalizes queue jobs and mirrored-record sync
//! errors into uniform report rows.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod escalation;
pub mod mirror;
pub mod queue;
pub mod report;
pub mod row;
pub mod source;

pub use config::StatusConfig;
pub use descriptor::{describe, DescriptorEntry, ErrorDescriptor};
pub use error::StatusError;
pub use escalation::{
    evaluate, ConnectionEvidence, Severity, StatusResult, ThresholdLevel, ThresholdTable,
};
pub use mirror::{MirrorReport, MirrorSchema, MirrorSection, RowQuery, StorageLocation};
pub use queue::{QueueRecord, QueueStatus, StatusLabels};
pub use report::{Report, ReportMode, ReportRequest, StatusReporter};
pub use row::{first_present, RawRow, ReportRow};
pub use source::{Snapshot, SnapshotSource, SyncSource};
