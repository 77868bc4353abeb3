// SPDX-License-Identifier: MIT
//
// piko — a terminal browser for piko markup pages.
//
// This is the main binary that wires together the crates:
//
//   piko-term → terminal control, rendering, input parsing, event loop
//   piko-page → document model, layout, compositing, focus and editing
//
// The Browser struct implements piko-term's App trait, connecting the
// event loop to the session state. Each keypress flows through:
//
//   stdin → parser → on_event → key map → focus / edit / navigation
//   on_tick → loader hand-off → [start] / [redirect] actions
//   paint → URL bar + compositor canvas + debug overlay → diff renderer
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ URL bar                    ✔ │  ← 1 row (chrome)
//   ├──────────────────────────────┤
//   │ page viewport                │  ← h - 1 rows (compositor)
//   │                              │
//   ├──────────────────────────────┤
//   │ debug log (Alt+K)            │  ← overlays the last rows
//   └──────────────────────────────┘

mod browser;
mod chrome;
mod config;
mod keymap;
mod loader;
mod logging;
mod lua;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use piko_term::event_loop::{EventLoop, LoopConfig};
use tracing::info;

use crate::browser::Browser;
use crate::config::Config;
use crate::loader::Source;

// ─── CLI ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "piko", version, about = "A terminal browser for piko markup pages")]
struct Cli {
    /// Page to open. Defaults to the configured home page.
    #[arg(value_name = "URL", conflicts_with = "url_flag")]
    url: Option<String>,

    /// Page to open, as a flag.
    #[arg(long = "url", value_name = "URL")]
    url_flag: Option<String>,

    /// Config file. Defaults to `<config dir>/piko/config.toml`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write tracing output to this file.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Tracing filter, e.g. `piko=debug`.
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

impl Cli {
    /// The URL to open first: positional, then `--url`, then `home`.
    fn start_url(&self, config: &Config) -> String {
        self.url
            .clone()
            .or_else(|| self.url_flag.clone())
            .unwrap_or_else(|| config.home.clone())
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    let log_file = cli.log_file.as_deref().or(config.log_file.as_deref());
    let log_level = cli.log_level.as_deref().or(config.log_level.as_deref());
    logging::init(log_file, log_level)?;

    let url = cli.start_url(&config);
    info!(%url, fps = config.fps, "starting");

    let source = Source {
        pages_dir: config.pages_dir.clone(),
        user_agent: config.user_agent.clone(),
    };
    let mut browser = Browser::new(&url, source, config.debug_height);

    EventLoop::with_config(LoopConfig::from_fps(config.fps))
        .run(&mut browser)
        .context("terminal error")?;

    info!("exiting");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("piko: {e:#}");
        process::exit(1);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn start_url_precedence() {
        let config = Config::default();
        let cli = Cli::parse_from(["piko"]);
        assert_eq!(cli.start_url(&config), "piko://welcome");

        let cli = Cli::parse_from(["piko", "--url", "piko://help"]);
        assert_eq!(cli.start_url(&config), "piko://help");

        let cli = Cli::parse_from(["piko", "https://example.com", "--log-level", "piko=debug"]);
        assert_eq!(cli.start_url(&config), "https://example.com");
        assert_eq!(cli.log_level.as_deref(), Some("piko=debug"));
    }

    #[test]
    fn positional_and_flag_conflict() {
        assert!(Cli::try_parse_from(["piko", "a", "--url", "b"]).is_err());
    }
}
