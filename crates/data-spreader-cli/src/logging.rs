//! Logging setup: console plus a per-run plain-text log file.
//!
//! Each command writes to `<log_dir>/<command>.log`. The file is created
//! with truncation, so it always holds exactly the latest run of that
//! command; operators reading after a failed overnight job see one run, not
//! a month of appended noise.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Initialize logging for one command run.
///
/// `verbosity` accepts the usual level words (`debug`, `info`, `warn`,
/// `error`) or a full filter directive; `format` switches the console
/// between `text` and `json`. The file log is always plain text.
pub fn setup(verbosity: &str, format: &str, log_dir: &Path, command: &str) -> Result<(), String> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| format!("cannot create log directory {:?}: {}", log_dir, e))?;

    let log_path = log_dir.join(format!("{}.log", command));
    // File::create truncates: one run per file.
    let log_file = File::create(&log_path)
        .map_err(|e| format!("cannot create log file {:?}: {}", log_path, e))?;

    let file_writer = Arc::new(log_file);

    if format == "json" {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .with_target(false)
                    .with_filter(parse_filter(verbosity)),
            )
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(file_writer)
                    .with_filter(parse_filter(verbosity)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_filter(parse_filter(verbosity)),
            )
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(file_writer)
                    .with_filter(parse_filter(verbosity)),
            )
            .init();
    }

    Ok(())
}

fn parse_filter(verbosity: &str) -> EnvFilter {
    EnvFilter::try_new(verbosity).unwrap_or_else(|_| EnvFilter::new("info"))
}
