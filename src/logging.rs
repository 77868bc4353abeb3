// SPDX-License-Identifier: MIT
//
// Logging — tracing output to a file, never to the terminal.
//
// The terminal is in raw mode and owned by the screen, so nothing may be
// printed to stdout or stderr while the browser runs. Without a log file
// no subscriber is installed and tracing macros cost next to nothing.
//
// The filter comes from `--log-level` / `log_level`, then `RUST_LOG`,
// then the default `piko=info`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "piko=info";

/// Build the filter for an optional explicit directive string.
///
/// # Errors
///
/// Fails when `level` is not a valid filter directive.
pub fn filter(level: Option<&str>) -> Result<EnvFilter> {
    match level {
        Some(level) => EnvFilter::try_new(level).with_context(|| format!("invalid log filter `{level}`")),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Install the global subscriber writing to `file`, appending. Does
/// nothing when `file` is `None`.
///
/// # Errors
///
/// Fails when the file can't be opened, the filter is invalid, or a
/// subscriber is already installed.
pub fn init(file: Option<&Path>, level: Option<&str>) -> Result<()> {
    let Some(path) = file else {
        return Ok(());
    };
    let filter = filter(level)?;
    let out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(out))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!(e))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_is_parsed() {
        assert!(filter(Some("piko=debug,reqwest=warn")).is_ok());
    }

    #[test]
    fn bad_filter_is_an_error() {
        assert!(filter(Some("piko=loud")).is_err());
    }

    #[test]
    fn no_file_installs_nothing() {
        assert!(init(None, Some("piko=loud")).is_ok());
    }
}
