//! Logging setup for qbstatusctl.
//!
//! Logs go to stderr so report output on stdout stays machine-readable.
//! `QBSTATUS_LOG` takes an EnvFilter directive; `--verbose` forces debug.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "QBSTATUS_LOG";

/// Filter directive in effect for the given flags.
pub fn filter_directive(verbose: bool) -> String {
    if verbose {
        return "debug".to_string();
    }
    std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| "warn".to_string())
}

pub fn init(verbose: bool) {
    let filter = EnvFilter::try_new(filter_directive(verbose))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second init (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
