//! Command execution.
//!
//! Every command returns its stdout text so the CLI can be exercised
//! without spawning the binary.

use crate::cli::{Cli, Commands};
use crate::render;
use anyhow::{Context, Result};
use qbstatus_common::config::config_path;
use qbstatus_common::{ReportRequest, SnapshotSource, StatusConfig, StatusReporter};
use std::path::Path;
use tracing::debug;

/// Load the configuration named on the command line, or the system one.
pub fn load_config(path: Option<&Path>) -> Result<StatusConfig> {
    match path {
        Some(p) => StatusConfig::load(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => {
            let p = config_path();
            StatusConfig::load_or_default(&p)
                .with_context(|| format!("Failed to load config {}", p.display()))
        }
    }
}

pub fn load_reporter(
    config: &StatusConfig,
    snapshot: Option<&Path>,
) -> Result<StatusReporter<SnapshotSource>> {
    let path = snapshot.unwrap_or(config.source.snapshot_path.as_path());
    debug!(path = %path.display(), "Loading snapshot");
    let source = SnapshotSource::load(path)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
    StatusReporter::from_config(source, config).context("Invalid configuration")
}

pub fn execute(cli: &Cli) -> Result<String> {
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Status { user, json } => {
            let reporter = load_reporter(&config, cli.snapshot.as_deref())?;
            let status = reporter.status(user.as_deref(), None)?;
            if *json {
                Ok(serde_json::to_string_pretty(&status)? + "\n")
            } else {
                Ok(render::format_status(&status))
            }
        }

        Commands::Report {
            mode,
            user,
            from,
            to,
            full,
            restrict,
            show_empty,
            json,
        } => {
            let reporter = load_reporter(&config, cli.snapshot.as_deref())?;
            let request = ReportRequest {
                user: user.clone(),
                date_from: from.clone(),
                date_to: to.clone(),
                fetch_full_record: *full,
                restrict: restrict.iter().cloned().collect(),
            };
            let report = reporter.create_report_for(mode, &request)?;
            if *json {
                Ok(serde_json::to_string_pretty(&report)? + "\n")
            } else {
                Ok(render::format_report(&report, !*show_empty))
            }
        }

        Commands::Describe { code, message } => {
            let description = config.error_descriptor().describe(code, message);
            if description.is_empty() {
                Ok(format!("No description available for error {}.\n", code))
            } else {
                Ok(format!("{}\n", description))
            }
        }
    }
}
