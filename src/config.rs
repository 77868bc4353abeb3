// SPDX-License-Identifier: MIT
//
// Configuration — a TOML file under the user's config directory.
//
// Every key is optional. A missing file means all defaults; a file that
// exists but can't be read or parsed is a startup error, so a typo never
// silently falls back to defaults.
//
//   home         = "piko://welcome"   # page opened when no URL is given
//   fps          = 60                 # frame rate of the render loop
//   user_agent   = "Piko"             # sent with every HTTP request
//   pages_dir    = "~/piko-pages"     # searched for piko:// pages first
//   debug_height = 8                  # rows of the Alt+K overlay
//   log_file     = "/tmp/piko.log"    # tracing output; none if unset
//   log_level    = "piko=debug"       # tracing filter

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub home: String,
    pub fps: u32,
    pub user_agent: String,
    pub pages_dir: Option<PathBuf>,
    pub debug_height: u16,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home: "piko://welcome".to_owned(),
            fps: 60,
            user_agent: "Piko".to_owned(),
            pages_dir: None,
            debug_height: 8,
            log_file: None,
            log_level: None,
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/piko/config.toml` or the platform equivalent.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("piko").join("config.toml"))
    }

    /// Read `path`, or the default location when `None`.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but can't be read or isn't valid TOML
    /// for this structure.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::default());
        };
        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text)
                .with_context(|| format!("invalid config file {}", path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("cannot read config file {}", path.display())),
        }
    }

    /// Parse config text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed text or unknown keys.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_text_is_all_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = Config::parse("home = \"https://example.com\"\nfps = 30\n").unwrap();
        assert_eq!(cfg.home, "https://example.com");
        assert_eq!(cfg.fps, 30);
        assert_eq!(cfg.user_agent, "Piko");
        assert_eq!(cfg.debug_height, 8);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("colour = \"red\"").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "pages_dir = \"/srv/pages\"\ndebug_height = 4\n").unwrap();
        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.pages_dir, Some(PathBuf::from("/srv/pages")));
        assert_eq!(cfg.debug_height, 4);
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "fps = \"fast\"").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().starts_with("invalid config file"), "{err}");
    }
}
