//! Plain-text rendering of status results and reports.
//!
//! Deterministic: output depends only on the value rendered.

use qbstatus_common::mirror::MirrorReport;
use qbstatus_common::{Report, ReportRow, StatusResult};

const QUEUE_HEADERS: [&str; 10] = [
    "Queue ID",
    "Action",
    "Record ID",
    "Priority",
    "Status",
    "Error Number",
    "Error Message",
    "Error Details",
    "Queued",
    "Processed",
];

const MIRROR_HEADERS: [&str; 9] = [
    "SQL ID",
    "ListID or TxnID",
    "Name or RefNumber",
    "Transaction Date",
    "Entity Name",
    "Error Number",
    "Error Message",
    "Error Details",
    "Date/Time",
];

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn text(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.replace('|', "\\|")
    }
}

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = format!("| {} |\n", headers.join(" | "));
    out.push_str(&format!(
        "|{}|\n",
        headers
            .iter()
            .map(|h| "-".repeat(h.len() + 2))
            .collect::<Vec<_>>()
            .join("|")
    ));
    for row in rows {
        out.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    out
}

fn queue_cells(row: &ReportRow) -> Vec<String> {
    let (priority, status, queued) = match &row.queue {
        Some(q) => (q.priority.to_string(), q.status.clone(), opt(&q.enqueued_at)),
        None => ("-".to_string(), "-".to_string(), "-".to_string()),
    };
    vec![
        row.id.clone(),
        opt(&row.entity_label),
        opt(&row.entity_key),
        priority,
        status,
        text(&row.error_code),
        text(&row.error_message),
        text(&row.error_description),
        queued,
        opt(&row.processed_at),
    ]
}

fn mirror_cells(row: &ReportRow) -> Vec<String> {
    vec![
        row.id.clone(),
        opt(&row.entity_key),
        opt(&row.entity_label),
        opt(&row.entity_date),
        opt(&row.related_party),
        text(&row.error_code),
        text(&row.error_message),
        text(&row.error_description),
        opt(&row.processed_at),
    ]
}

/// Format a queue report as a table.
pub fn format_queue(rows: &[ReportRow]) -> String {
    if rows.is_empty() {
        return "No queued jobs found.\n".to_string();
    }
    let cells: Vec<Vec<String>> = rows.iter().map(queue_cells).collect();
    table(&QUEUE_HEADERS, &cells)
}

/// Format a mirror report, one table per entity type.
pub fn format_mirror(report: &MirrorReport, skip_empty: bool) -> String {
    let mut out = String::new();

    for section in &report.sections {
        if skip_empty && section.rows.is_empty() {
            continue;
        }
        out.push_str(&format!("## {}\n\n", section.label));
        if section.rows.is_empty() {
            out.push_str("No sync errors.\n\n");
            continue;
        }
        let cells: Vec<Vec<String>> = section.rows.iter().map(mirror_cells).collect();
        out.push_str(&table(&MIRROR_HEADERS, &cells));
        out.push('\n');
    }

    if out.is_empty() {
        out.push_str("No sync errors found.\n");
    }
    out
}

pub fn format_report(report: &Report, skip_empty: bool) -> String {
    match report {
        Report::Queue(rows) => format_queue(rows),
        Report::Mirror(mirror) => format_mirror(mirror, skip_empty),
    }
}

/// Format a status result for the terminal.
pub fn format_status(status: &StatusResult) -> String {
    let mut out = format!("[{}] {}\n", status.severity, status.message);
    if let Some(at) = status.last_login_at {
        out.push_str(&format!("  Last login:  {}\n", at.format("%Y-%m-%d %H:%M:%S")));
    }
    if let Some(at) = status.last_action_at {
        out.push_str(&format!("  Last action: {}\n", at.format("%Y-%m-%d %H:%M:%S")));
    }
    if let Some(skew) = status.clock_skew_secs {
        out.push_str(&format!(
            "  Clock skew:  last contact is {}s in the future\n",
            skew
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbstatus_common::mirror::MirrorSection;
    use qbstatus_common::row::QueueDetails;
    use qbstatus_common::Severity;

    fn mirror_row(id: &str) -> ReportRow {
        ReportRow {
            id: id.to_string(),
            entity_key: Some("80000001-1".into()),
            entity_label: Some("Acme".into()),
            entity_date: None,
            related_party: None,
            error_code: "3100".into(),
            error_message: "Name in use".into(),
            error_description: String::new(),
            processed_at: None,
            full_record: None,
            queue: None,
        }
    }

    fn mirror_report() -> MirrorReport {
        MirrorReport {
            sections: vec![
                MirrorSection {
                    entity_type: "Customer".into(),
                    label: "Customer".into(),
                    rows: vec![mirror_row("11")],
                },
                MirrorSection {
                    entity_type: "InventoryItem".into(),
                    label: "Inventory Item".into(),
                    rows: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_mirror_skips_empty_sections() {
        let out = format_mirror(&mirror_report(), true);
        assert!(out.contains("## Customer"));
        assert!(!out.contains("Inventory Item"));
    }

    #[test]
    fn test_mirror_shows_empty_sections() {
        let out = format_mirror(&mirror_report(), false);
        assert!(out.contains("## Inventory Item"));
        assert!(out.contains("No sync errors."));
    }

    #[test]
    fn test_mirror_all_empty() {
        let out = format_mirror(&MirrorReport::default(), true);
        assert_eq!(out, "No sync errors found.\n");
    }

    #[test]
    fn test_queue_row_cells() {
        let mut row = mirror_row("7");
        row.entity_label = Some("CustomerAdd".into());
        row.queue = Some(QueueDetails {
            priority: 3,
            status: "Error".into(),
            enqueued_at: Some("2024-03-18 09:00:00".into()),
        });
        let out = format_queue(&[row]);
        assert!(out.starts_with("| Queue ID | Action |"));
        assert!(out.contains("| 7 | CustomerAdd | 80000001-1 | 3 | Error | 3100 |"));
    }

    #[test]
    fn test_pipe_escaped() {
        assert_eq!(text("a|b"), "a\\|b");
        assert_eq!(text(""), "-");
    }

    #[test]
    fn golden_status_text() {
        let status = StatusResult {
            severity: Severity::Unknown,
            message: "Status is unknown.".into(),
            last_login_at: None,
            last_action_at: None,
            elapsed_secs: None,
            clock_skew_secs: None,
        };
        assert_eq!(format_status(&status), "[Unknown] Status is unknown.\n");
    }
}
