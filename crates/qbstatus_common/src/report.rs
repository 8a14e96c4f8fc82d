//! Status reporter: the entry point that ties the pipelines together.
//!
//! `StatusReporter` owns the immutable lookup tables (thresholds, status
//! labels, error descriptor, mirror schema) and a data source. Each call
//! builds its result from scratch; nothing is cached between calls.

use crate::config::{StatusConfig, DEFAULT_ENTITY_TYPES};
use crate::descriptor::ErrorDescriptor;
use crate::error::{Result, StatusError};
use crate::escalation::{evaluate, StatusResult, ThresholdTable};
use crate::mirror::{build_mirror_report, MirrorReport, MirrorRequest, MirrorSchema};
use crate::queue::{build_queue_report, StatusLabels};
use crate::row::ReportRow;
use crate::source::SyncSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::{debug, info};

/// Which pipeline a report is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    Queue,
    Mirror,
}

impl ReportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportMode::Queue => "queue",
            ReportMode::Mirror => "mirror",
        }
    }
}

impl std::fmt::Display for ReportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReportMode {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(ReportMode::Queue),
            "mirror" => Ok(ReportMode::Mirror),
            _ => Err(StatusError::InvalidMode(s.to_string())),
        }
    }
}

/// Parameters of a report request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRequest {
    /// Web Connector user; the source's default user when absent
    pub user: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Attach the raw mirror row to each report row
    pub fetch_full_record: bool,
    /// Entity types to include; empty means all
    pub restrict: BTreeSet<String>,
}

impl ReportRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_date_from(mut self, date: impl Into<String>) -> Self {
        self.date_from = Some(date.into());
        self
    }

    pub fn with_date_to(mut self, date: impl Into<String>) -> Self {
        self.date_to = Some(date.into());
        self
    }

    pub fn with_full_record(mut self, fetch: bool) -> Self {
        self.fetch_full_record = fetch;
        self
    }

    pub fn restrict_to<I, T>(mut self, entity_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.restrict.extend(entity_types.into_iter().map(Into::into));
        self
    }
}

/// A finished report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "report", rename_all = "lowercase")]
pub enum Report {
    Queue(Vec<ReportRow>),
    Mirror(MirrorReport),
}

impl Report {
    pub fn mode(&self) -> ReportMode {
        match self {
            Report::Queue(_) => ReportMode::Queue,
            Report::Mirror(_) => ReportMode::Mirror,
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            Report::Queue(rows) => rows.len(),
            Report::Mirror(mirror) => mirror.total_rows(),
        }
    }

    pub fn as_queue(&self) -> Option<&[ReportRow]> {
        match self {
            Report::Queue(rows) => Some(rows),
            Report::Mirror(_) => None,
        }
    }

    pub fn as_mirror(&self) -> Option<&MirrorReport> {
        match self {
            Report::Mirror(mirror) => Some(mirror),
            Report::Queue(_) => None,
        }
    }
}

/// Builds status results and reports against a `SyncSource`.
#[derive(Debug, Clone)]
pub struct StatusReporter<S> {
    source: S,
    thresholds: ThresholdTable,
    labels: StatusLabels,
    descriptor: ErrorDescriptor,
    entity_types: Vec<String>,
    schema: MirrorSchema,
}

impl<S: SyncSource> StatusReporter<S> {
    /// Reporter with built-in tables.
    pub fn new(source: S) -> Self {
        Self {
            source,
            thresholds: ThresholdTable::default(),
            labels: StatusLabels::default(),
            descriptor: ErrorDescriptor::default(),
            entity_types: DEFAULT_ENTITY_TYPES.iter().map(|s| s.to_string()).collect(),
            schema: MirrorSchema::default(),
        }
    }

    pub fn from_config(source: S, config: &StatusConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            thresholds: config.threshold_table()?,
            labels: StatusLabels::default(),
            descriptor: config.error_descriptor(),
            entity_types: config.mirror.entity_types.clone(),
            schema: config.mirror.schema.clone(),
        })
    }

    pub fn with_thresholds(mut self, thresholds: ThresholdTable) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_descriptor(mut self, descriptor: ErrorDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    pub fn with_entity_types<I, T>(mut self, entity_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.entity_types = entity_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_schema(mut self, schema: MirrorSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn entity_types(&self) -> &[String] {
        &self.entity_types
    }

    fn resolve_user(&self, user: Option<&str>) -> Result<String> {
        match user {
            Some(u) if !u.is_empty() => Ok(u.to_string()),
            _ => {
                let user = self.source.default_user()?;
                debug!(user = %user, "Using default user");
                Ok(user)
            }
        }
    }

    /// Build a report for a mode given by name (`queue` / `mirror`).
    pub fn create_report_for(&self, mode: &str, request: &ReportRequest) -> Result<Report> {
        let mode = mode.parse::<ReportMode>()?;
        self.create_report(mode, request)
    }

    pub fn create_report(&self, mode: ReportMode, request: &ReportRequest) -> Result<Report> {
        let user = self.resolve_user(request.user.as_deref())?;
        info!(mode = %mode, user = %user, "Creating report");

        let report = match mode {
            ReportMode::Queue => {
                let jobs = self.source.queue_jobs(
                    &user,
                    request.date_from.as_deref(),
                    request.date_to.as_deref(),
                )?;
                Report::Queue(build_queue_report(&jobs, &self.labels, &self.descriptor)?)
            }
            ReportMode::Mirror => {
                let mirror_request = MirrorRequest {
                    date_from: request.date_from.as_deref(),
                    date_to: request.date_to.as_deref(),
                    fetch_full_record: request.fetch_full_record,
                    restrict: &request.restrict,
                };
                Report::Mirror(build_mirror_report(
                    &self.source,
                    &self.entity_types,
                    &self.schema,
                    &self.descriptor,
                    &mirror_request,
                ))
            }
        };

        info!(mode = %mode, rows = report.row_count(), "Report ready");
        Ok(report)
    }

    /// Connection status for `user` as of now.
    pub fn status(
        &self,
        user: Option<&str>,
        thresholds: Option<&ThresholdTable>,
    ) -> Result<StatusResult> {
        self.status_at(user, thresholds, Utc::now())
    }

    /// Connection status for `user` as of `now`.
    pub fn status_at(
        &self,
        user: Option<&str>,
        thresholds: Option<&ThresholdTable>,
        now: DateTime<Utc>,
    ) -> Result<StatusResult> {
        let user = self.resolve_user(user)?;
        let evidence = self.source.last_contact(&user)?;
        let table = thresholds.unwrap_or(&self.thresholds);
        let result = evaluate(evidence.as_ref(), table, now);
        debug!(user = %user, severity = %result.severity, "Status evaluated");
        Ok(result)
    }

    pub fn describe(&self, code: &str, message: &str) -> String {
        self.descriptor.describe(code, message)
    }
}
