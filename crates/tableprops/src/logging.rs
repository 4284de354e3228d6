//! Log setup.
//!
//! Logs go to stderr, so statements printed on stdout can be piped
//! straight into an execution tool, or to a file given with `--log`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::error::{Result, ToolError};

/// Environment variable holding the log level.
pub const LOG_LEVEL_ENV: &str = "TP_LOG_LEVEL";

/// Level used when neither `--verbose` nor [`LOG_LEVEL_ENV`] is given.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Maps a user-supplied level name to a filter directive.
///
/// Accepts the usual names plus `warning`, `fatal` and `critical`. Unknown
/// names fall back to [`DEFAULT_LOG_LEVEL`].
#[must_use]
pub fn level_directive(level: Option<&str>) -> &'static str {
    let Some(level) = level else {
        return DEFAULT_LOG_LEVEL;
    };
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" | "notset" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "fatal" | "critical" => "error",
        "off" => "off",
        _ => DEFAULT_LOG_LEVEL,
    }
}

/// Installs the global subscriber.
///
/// `verbose` forces debug output; otherwise the level comes from
/// [`LOG_LEVEL_ENV`].
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let directive = if verbose {
        "debug"
    } else {
        level_directive(std::env::var(LOG_LEVEL_ENV).ok().as_deref())
    };
    let filter = EnvFilter::new(directive);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| ToolError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        None => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time();
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
    };

    installed.map_err(|err| ToolError::Logging(err.to_string()))
}
