//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// qbstatus CLI
#[derive(Parser, Debug)]
#[command(name = "qbstatusctl")]
#[command(about = "QuickBooks Web Connector sync status and error reports", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Config file (defaults to /etc/qbstatus/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Snapshot file (overrides [source].snapshot_path)
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show connection health for a Web Connector user
    Status {
        /// Web Connector username (default user when omitted)
        #[arg(long)]
        user: Option<String>,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Build a queue or mirror error report
    Report {
        /// Report mode: queue or mirror
        mode: String,

        /// Web Connector username (default user when omitted)
        #[arg(long)]
        user: Option<String>,

        /// Only include records created on or after this date
        #[arg(long)]
        from: Option<String>,

        /// Only include records created on or before this date
        #[arg(long)]
        to: Option<String>,

        /// Attach the raw mirrored record to each row (JSON output)
        #[arg(long)]
        full: bool,

        /// Limit the mirror report to these entity types (repeatable)
        #[arg(long = "restrict", value_name = "ENTITY_TYPE")]
        restrict: Vec<String>,

        /// Show mirror sections that have no errors
        #[arg(long)]
        show_empty: bool,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Explain a QuickBooks error code
    Describe {
        /// Error code (e.g. 3100)
        code: String,

        /// Error message as reported by QuickBooks
        #[arg(default_value = "")]
        message: String,
    },
}
