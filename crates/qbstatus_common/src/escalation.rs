//! Connection health escalation.
//!
//! Maps the time elapsed since the last successful contact with the
//! QuickBooks Web Connector into a severity level and an interpolated message.
//!
//! Thresholds are keyed by their floor (seconds). Two floors are reserved:
//! - `0` is the OK baseline
//! - `-1` is the Unknown baseline (no last-contact evidence)
//!
//! The table is scanned from the largest floor down; the first floor that the
//! elapsed time strictly exceeds wins.

use crate::error::{Result, StatusError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Floor of the OK baseline level.
pub const OK_FLOOR: i64 = 0;

/// Floor of the Unknown baseline level.
pub const UNKNOWN_FLOOR: i64 = -1;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

/// Health classification of a connection.
///
/// `Ok` through `Danger` are ordered by urgency. `Unknown` sits outside that
/// order: it means there is no evidence to classify.
///
/// Serialized under the same names `Display` prints. Lowercase names are
/// accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "OK", alias = "ok")]
    Ok,
    #[serde(alias = "notice")]
    Notice,
    #[serde(alias = "caution")]
    Caution,
    #[serde(alias = "warning")]
    Warning,
    #[serde(alias = "danger")]
    Danger,
    #[serde(alias = "unknown")]
    Unknown,
}

impl Severity {
    /// Urgency rank, `None` for `Unknown`.
    pub fn urgency(&self) -> Option<u8> {
        match self {
            Severity::Ok => Some(0),
            Severity::Notice => Some(1),
            Severity::Caution => Some(2),
            Severity::Warning => Some(3),
            Severity::Danger => Some(4),
            Severity::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Notice => "Notice",
            Severity::Caution => "Caution",
            Severity::Warning => "Warning",
            Severity::Danger => "Danger",
            Severity::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the threshold table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdLevel {
    /// Elapsed seconds that must be strictly exceeded
    pub floor_secs: i64,
    pub severity: Severity,
    /// Message with up to three positional `%d` placeholders
    /// (days, hours, minutes)
    pub message: String,
}

impl ThresholdLevel {
    pub fn new(floor_secs: i64, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            floor_secs,
            severity,
            message: message.into(),
        }
    }
}

/// Ordered threshold table with guaranteed OK and Unknown baselines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdTable {
    levels: BTreeMap<i64, ThresholdLevel>,
}

impl ThresholdTable {
    /// Build a table from caller-supplied levels.
    ///
    /// Floors must be unique. Missing OK/Unknown baselines are injected.
    pub fn from_levels(levels: impl IntoIterator<Item = ThresholdLevel>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for level in levels {
            let floor = level.floor_secs;
            if map.insert(floor, level).is_some() {
                return Err(StatusError::Config(format!(
                    "duplicate threshold floor {}",
                    floor
                )));
            }
        }
        let mut table = Self { levels: map };
        table.ensure_baselines();
        Ok(table)
    }

    /// Like `from_levels`, but an empty input yields the built-in table.
    pub fn from_levels_or_default(levels: Vec<ThresholdLevel>) -> Result<Self> {
        if levels.is_empty() {
            Ok(Self::default())
        } else {
            Self::from_levels(levels)
        }
    }

    fn ensure_baselines(&mut self) {
        self.levels
            .entry(OK_FLOOR)
            .or_insert_with(|| ThresholdLevel::new(OK_FLOOR, Severity::Ok, "Status is OK!"));
        self.levels.entry(UNKNOWN_FLOOR).or_insert_with(|| {
            ThresholdLevel::new(UNKNOWN_FLOOR, Severity::Unknown, "Status is unknown.")
        });
    }

    /// Levels from the largest floor to the smallest.
    pub fn descending(&self) -> impl Iterator<Item = &ThresholdLevel> {
        self.levels.values().rev()
    }

    pub fn ok_level(&self) -> &ThresholdLevel {
        &self.levels[&OK_FLOOR]
    }

    pub fn unknown_level(&self) -> &ThresholdLevel {
        &self.levels[&UNKNOWN_FLOOR]
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        let levels = [
            ThresholdLevel::new(
                12 * SECS_PER_HOUR,
                Severity::Notice,
                "Notice: A connection has not been made in %d days, %d hours and %d minutes.",
            ),
            ThresholdLevel::new(
                24 * SECS_PER_HOUR,
                Severity::Caution,
                "Caution: A connection has not been made in %d days, %d hours and %d minutes.",
            ),
            ThresholdLevel::new(
                36 * SECS_PER_HOUR,
                Severity::Warning,
                "Warning: A connection has not been made in %d days, %d hours and %d minutes.",
            ),
            ThresholdLevel::new(
                48 * SECS_PER_HOUR,
                Severity::Danger,
                "ERROR: A connection has not been made in %d days, %d hours and %d minutes! Contact support to get this issue resolved!",
            ),
        ];
        let mut table = Self {
            levels: levels.into_iter().map(|l| (l.floor_secs, l)).collect(),
        };
        table.ensure_baselines();
        table
    }
}

/// Last-contact timestamps supplied by the auth collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEvidence {
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_action_at: Option<DateTime<Utc>>,
}

impl ConnectionEvidence {
    /// Timestamp elapsed time is measured from: last action, else last login.
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.last_action_at.or(self.last_login_at)
    }
}

/// Elapsed time split into days, hours and minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedParts {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl ElapsedParts {
    /// Each unit is computed after subtracting the larger ones.
    pub fn from_secs(elapsed: i64) -> Self {
        let elapsed = elapsed.max(0);
        let days = elapsed / SECS_PER_DAY;
        let hours = (elapsed - days * SECS_PER_DAY) / SECS_PER_HOUR;
        let minutes = (elapsed - days * SECS_PER_DAY - hours * SECS_PER_HOUR) / SECS_PER_MINUTE;
        Self {
            days,
            hours,
            minutes,
        }
    }
}

/// Outcome of a status evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
    pub severity: Severity,
    pub message: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_action_at: Option<DateTime<Utc>>,
    /// Seconds since last contact (after clamping), absent for Unknown
    pub elapsed_secs: Option<i64>,
    /// Set when the evidence lies in the future; holds the skew in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock_skew_secs: Option<i64>,
}

/// Fill positional `%d` placeholders in order. `%%` is a literal percent.
/// Placeholders beyond the supplied values are left untouched.
pub fn interpolate(template: &str, values: &[i64]) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut values = values.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some('d') => {
                chars.next();
                match values.next() {
                    Some(v) => out.push_str(&v.to_string()),
                    None => out.push_str("%d"),
                }
            }
            _ => out.push('%'),
        }
    }

    out
}

/// Classify connection health at `now`.
///
/// Absent evidence (or evidence with no timestamps) returns the Unknown level
/// verbatim.
pub fn evaluate(
    evidence: Option<&ConnectionEvidence>,
    table: &ThresholdTable,
    now: DateTime<Utc>,
) -> StatusResult {
    let Some((evidence, reference)) = evidence.and_then(|e| e.reference_time().map(|t| (e, t)))
    else {
        let unknown = table.unknown_level();
        return StatusResult {
            severity: unknown.severity,
            message: unknown.message.clone(),
            last_login_at: evidence.and_then(|e| e.last_login_at),
            last_action_at: evidence.and_then(|e| e.last_action_at),
            elapsed_secs: None,
            clock_skew_secs: None,
        };
    };

    let raw_elapsed = (now - reference).num_seconds();
    let clock_skew_secs = if raw_elapsed < 0 {
        warn!(
            skew_secs = -raw_elapsed,
            reference = %reference,
            "Last contact is in the future; treating elapsed time as zero"
        );
        Some(-raw_elapsed)
    } else {
        None
    };
    let elapsed = raw_elapsed.max(0);

    let level = table
        .descending()
        .filter(|level| level.floor_secs >= 0)
        .find(|level| elapsed > level.floor_secs)
        .unwrap_or_else(|| table.ok_level());

    let parts = ElapsedParts::from_secs(elapsed);
    debug!(elapsed, severity = %level.severity, "Evaluated connection status");

    StatusResult {
        severity: level.severity,
        message: interpolate(&level.message, &[parts.days, parts.hours, parts.minutes]),
        last_login_at: evidence.last_login_at,
        last_action_at: evidence.last_action_at,
        elapsed_secs: Some(elapsed),
        clock_skew_secs,
    }
}
