//! Mirror report pipeline.
//!
//! Walks the configured entity types, pulls mirrored rows that carry a
//! failed-sync error number, and normalizes them into report rows. Missing
//! schema mappings and failed per-type queries degrade to empty sections.

use crate::descriptor::ErrorDescriptor;
use crate::row::{cell_text, first_present, RawRow, ReportRow};
use crate::source::SyncSource;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

pub const IDENTITY_FIELDS: &[&str] = &["ListID", "TxnID"];
pub const LABEL_FIELDS: &[&str] = &["FullName", "Name", "RefNumber"];
pub const DATE_FIELDS: &[&str] = &["TxnDate"];
pub const RELATED_PARTY_FIELDS: &[&str] = &["Customer_FullName", "Vendor_FullName"];

const SQL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column naming used by the mirror store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorSchema {
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_error_message_column")]
    pub error_message_column: String,
    #[serde(default = "default_processed_at_column")]
    pub processed_at_column: String,
    #[serde(default = "default_created_column")]
    pub created_column: String,
    /// Error-number column for locations that do not name their own
    #[serde(default = "default_error_number_column")]
    pub error_number_column: String,
}

fn default_table_prefix() -> String {
    "qb_".to_string()
}

fn default_id_column() -> String {
    "qbsql_id".to_string()
}

pub fn default_error_number_column() -> String {
    "qbsql_last_errnum".to_string()
}

fn default_error_message_column() -> String {
    "qbsql_last_errmsg".to_string()
}

fn default_processed_at_column() -> String {
    "qbsql_last_dequeue_datetime".to_string()
}

fn default_created_column() -> String {
    "TimeCreated".to_string()
}

impl Default for MirrorSchema {
    fn default() -> Self {
        Self {
            table_prefix: default_table_prefix(),
            id_column: default_id_column(),
            error_message_column: default_error_message_column(),
            processed_at_column: default_processed_at_column(),
            created_column: default_created_column(),
            error_number_column: default_error_number_column(),
        }
    }
}

/// Physical location of an entity type's mirrored rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    pub table: String,
    /// `None` means the schema's `error_number_column`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_column: Option<String>,
}

impl StorageLocation {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            error_column: None,
        }
    }

    pub fn with_error_column(mut self, column: impl Into<String>) -> Self {
        self.error_column = Some(column.into());
        self
    }

    pub fn is_resolved(&self) -> bool {
        !self.table.is_empty() && self.error_column.as_ref().map_or(true, |c| !c.is_empty())
    }

    /// Error-number column to query, falling back to `schema`.
    pub fn error_column_in<'a>(&'a self, schema: &'a MirrorSchema) -> &'a str {
        self.error_column
            .as_deref()
            .unwrap_or(schema.error_number_column.as_str())
    }
}

/// Predicate for "rows of `table` with a non-empty error number, created
/// inside the optional window". Executed by the data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowQuery {
    /// Full table name, prefix included
    pub table: String,
    pub error_column: String,
    pub created_column: String,
    pub created_from: Option<NaiveDateTime>,
    pub created_to: Option<NaiveDateTime>,
}

impl RowQuery {
    /// Does `row` satisfy the predicate?
    pub fn matches(&self, row: &RawRow) -> bool {
        let has_error = row
            .get(&self.error_column)
            .and_then(cell_text)
            .is_some_and(|v| !v.is_empty());
        if !has_error {
            return false;
        }

        if self.created_from.is_none() && self.created_to.is_none() {
            return true;
        }

        let Some(created) = row
            .get(&self.created_column)
            .and_then(cell_text)
            .and_then(|v| parse_timestamp(&v))
        else {
            return false;
        };

        self.created_from.map_or(true, |from| created >= from)
            && self.created_to.map_or(true, |to| created <= to)
    }

    /// SQL text a relational mirror would run for this predicate.
    pub fn to_sql(&self) -> String {
        let mut sql = format!(
            "SELECT * FROM {} WHERE LENGTH({}) > 0",
            self.table, self.error_column
        );
        if let Some(from) = self.created_from {
            sql.push_str(&format!(
                " AND {} >= '{}'",
                self.created_column,
                from.format(SQL_TIME_FORMAT)
            ));
        }
        if let Some(to) = self.created_to {
            sql.push_str(&format!(
                " AND {} <= '{}'",
                self.created_column,
                to.format(SQL_TIME_FORMAT)
            ));
        }
        sql
    }
}

/// Parse a timestamp in any of the accepted formats.
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }
    for format in [SQL_TIME_FORMAT, "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// A date bound applies only if it parses to a strictly positive timestamp.
pub fn parse_date_bound(input: Option<&str>) -> Option<NaiveDateTime> {
    let raw = input?;
    match parse_timestamp(raw) {
        Some(dt) if dt.and_utc().timestamp() > 0 => Some(dt),
        _ => {
            if !raw.trim().is_empty() {
                debug!(bound = raw, "Ignoring unusable date bound");
            }
            None
        }
    }
}

/// Display label for an entity type name.
///
/// A space goes before each uppercase letter whose predecessor is neither
/// uppercase nor whitespace, so "InventoryItem" becomes "Inventory Item"
/// and a run of capitals stays in one word ("USTaxCode" becomes
/// "USTax Code"). Digits and other characters never start a word.
pub fn pretty_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;

    for c in name.chars() {
        if let Some(p) = prev {
            if c.is_uppercase() && !p.is_uppercase() && !p.is_whitespace() {
                out.push(' ');
            }
        }
        out.push(c);
        prev = Some(c);
    }

    out
}

/// Rows for one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorSection {
    pub entity_type: String,
    /// Display name derived from `entity_type`
    pub label: String,
    pub rows: Vec<ReportRow>,
}

/// Mirror report sections in entity-type declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorReport {
    pub sections: Vec<MirrorSection>,
}

impl MirrorReport {
    pub fn get(&self, label: &str) -> Option<&MirrorSection> {
        self.sections.iter().find(|s| s.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.label.as_str()).collect()
    }

    pub fn total_rows(&self) -> usize {
        self.sections.iter().map(|s| s.rows.len()).sum()
    }

    pub fn non_empty(&self) -> impl Iterator<Item = &MirrorSection> {
        self.sections.iter().filter(|s| !s.rows.is_empty())
    }
}

/// Inputs of one mirror report run.
#[derive(Debug, Clone)]
pub struct MirrorRequest<'a> {
    pub date_from: Option<&'a str>,
    pub date_to: Option<&'a str>,
    pub fetch_full_record: bool,
    pub restrict: &'a BTreeSet<String>,
}

/// Build the mirror report.
pub fn build_mirror_report<S: SyncSource + ?Sized>(
    source: &S,
    entity_types: &[String],
    schema: &MirrorSchema,
    descriptor: &ErrorDescriptor,
    request: &MirrorRequest<'_>,
) -> MirrorReport {
    let created_from = parse_date_bound(request.date_from);
    let created_to = parse_date_bound(request.date_to);
    let mut report = MirrorReport::default();

    for entity_type in entity_types {
        if !request.restrict.is_empty() && !request.restrict.contains(entity_type) {
            continue;
        }

        let mut section = MirrorSection {
            entity_type: entity_type.clone(),
            label: pretty_name(entity_type),
            rows: Vec::new(),
        };

        let location = match source.storage_location(entity_type) {
            Some(loc) if loc.is_resolved() => loc,
            _ => {
                warn!(entity_type = %entity_type, "No storage mapping; section left empty");
                report.sections.push(section);
                continue;
            }
        };

        let error_column = location.error_column_in(schema).to_string();
        let query = RowQuery {
            table: format!("{}{}", schema.table_prefix, location.table),
            error_column: error_column.clone(),
            created_column: schema.created_column.clone(),
            created_from,
            created_to,
        };

        match source.query_rows(&query) {
            Ok(raw_rows) => {
                for raw in raw_rows {
                    let row =
                        normalize_row(raw, &location, &error_column, schema, descriptor, request);
                    if let Some(row) = row {
                        section.rows.push(row);
                    }
                }
            }
            Err(e) => {
                warn!(entity_type = %entity_type, error = %e, "Mirror query failed; section left empty");
            }
        }

        debug!(entity_type = %entity_type, rows = section.rows.len(), "Built mirror section");
        report.sections.push(section);
    }

    report
}

fn normalize_row(
    raw: RawRow,
    location: &StorageLocation,
    error_column: &str,
    schema: &MirrorSchema,
    descriptor: &ErrorDescriptor,
    request: &MirrorRequest<'_>,
) -> Option<ReportRow> {
    let Some(id) = first_present(&raw, &[schema.id_column.as_str()]) else {
        warn!(table = %location.table, "Mirror row has no id column; skipped");
        return None;
    };

    let error_code =
        first_present(&raw, &[error_column]).unwrap_or_default();
    let error_message =
        first_present(&raw, &[schema.error_message_column.as_str()]).unwrap_or_default();
    let error_description = descriptor.describe(&error_code, &error_message);

    Some(ReportRow {
        id,
        entity_key: first_present(&raw, IDENTITY_FIELDS),
        entity_label: first_present(&raw, LABEL_FIELDS),
        entity_date: first_present(&raw, DATE_FIELDS),
        related_party: first_present(&raw, RELATED_PARTY_FIELDS),
        error_code,
        error_message,
        error_description,
        processed_at: first_present(&raw, &[schema.processed_at_column.as_str()]),
        full_record: if request.fetch_full_record {
            Some(raw)
        } else {
            None
        },
        queue: None,
    })
}
