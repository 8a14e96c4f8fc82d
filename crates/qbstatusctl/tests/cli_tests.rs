//! CLI-level tests: parse real argument lists and run them against
//! snapshot + config files in a temp directory.

use clap::Parser;
use qbstatusctl::cli::Cli;
use qbstatusctl::commands::execute;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const SNAPSHOT: &str = r#"{
    "default_user": "quickbooks",
    "auth": {
        "quickbooks": {
            "last_login_at": "2020-01-01T00:00:00Z",
            "last_action_at": "2020-01-01T00:00:00Z"
        }
    },
    "queue": [
        { "queue_id": 1, "user": "quickbooks", "action": "CustomerAdd", "ident": "15",
          "priority": 5, "status_code": "e", "msg": "3100: Name already exists",
          "enqueue_at": "2024-03-01T09:00:00Z", "dequeue_at": "2024-03-01T09:01:00Z" }
    ],
    "schema": {
        "Customer": { "table": "customer" },
        "InventoryItem": { "table": "inventoryitem" }
    },
    "tables": {
        "qb_customer": [
            { "qbsql_id": 11, "ListID": "80000001-1", "Name": "Acme",
              "qbsql_last_errnum": "3100", "qbsql_last_errmsg": "Name in use" }
        ],
        "qb_inventoryitem": []
    }
}"#;

const CONFIG: &str = r#"
[mirror]
entity_types = ["Customer", "InventoryItem"]

[[descriptors]]
code = "3170"
description = "The record is open for editing in QuickBooks."
"#;

struct Fixture {
    _dir: TempDir,
    config: PathBuf,
    snapshot: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let snapshot = dir.path().join("snapshot.json");
    fs::write(&config, CONFIG).unwrap();
    fs::write(&snapshot, SNAPSHOT).unwrap();
    Fixture {
        _dir: dir,
        config,
        snapshot,
    }
}

fn run(fx: &Fixture, args: &[&str]) -> anyhow::Result<String> {
    let mut argv = vec![
        "qbstatusctl".to_string(),
        "--config".to_string(),
        fx.config.display().to_string(),
        "--snapshot".to_string(),
        fx.snapshot.display().to_string(),
    ];
    argv.extend(args.iter().map(|s| s.to_string()));
    let cli = Cli::try_parse_from(argv).unwrap();
    execute(&cli)
}

#[test]
fn test_status_text() {
    let fx = fixture();
    let out = run(&fx, &["status"]).unwrap();
    assert!(out.starts_with("[Danger] ERROR: A connection has not been made in"));
    assert!(out.contains("Last action: 2020-01-01 00:00:00"));
}

#[test]
fn test_status_unknown_user_json() {
    let fx = fixture();
    let out = run(&fx, &["status", "--user", "ghost", "--json"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["severity"], "Unknown");
    assert_eq!(value["message"], "Status is unknown.");
}

#[test]
fn test_queue_report_text() {
    let fx = fixture();
    let out = run(&fx, &["report", "queue"]).unwrap();
    assert!(out.contains("| 1 | CustomerAdd | 15 | 5 | Error | 3100 | Name already exists |"));
    assert!(out.contains("must be unique"));
}

#[test]
fn test_mirror_report_skips_empty_by_default() {
    let fx = fixture();
    let out = run(&fx, &["report", "mirror"]).unwrap();
    assert!(out.contains("## Customer"));
    assert!(!out.contains("Inventory Item"));

    let out = run(&fx, &["report", "mirror", "--show-empty"]).unwrap();
    assert!(out.contains("## Inventory Item"));
}

#[test]
fn test_mirror_report_json_with_full_record() {
    let fx = fixture();
    let out = run(&fx, &["report", "mirror", "--full", "--json"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["mode"], "mirror");
    let sections = value["report"]["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["rows"][0]["full_record"]["Name"], "Acme");
}

#[test]
fn test_mirror_report_restrict() {
    let fx = fixture();
    let out = run(
        &fx,
        &["report", "mirror", "--restrict", "InventoryItem", "--show-empty"],
    )
    .unwrap();
    assert!(out.contains("## Inventory Item"));
    assert!(!out.contains("## Customer"));
}

#[test]
fn test_invalid_mode_is_error() {
    let fx = fixture();
    let err = run(&fx, &["report", "xml"]).unwrap_err();
    assert!(err.to_string().contains("Invalid report mode"));
}

#[test]
fn test_describe_uses_config_descriptors() {
    let fx = fixture();
    let out = run(&fx, &["describe", "3170"]).unwrap();
    assert_eq!(out, "The record is open for editing in QuickBooks.\n");

    let out = run(&fx, &["describe", "42"]).unwrap();
    assert_eq!(out, "No description available for error 42.\n");
}

#[test]
fn test_missing_snapshot_is_error() {
    let fx = fixture();
    fs::remove_file(&fx.snapshot).unwrap();
    let err = run(&fx, &["status"]).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to load snapshot"));
}
