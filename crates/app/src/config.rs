//! Runtime configuration.
//!
//! Each setting resolves in this order: command line, environment
//! (`PARCOURS_BIND`, `PARCOURS_DB_URL`, folded into the command line by
//! clap), TOML file, compiled default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use services::ServiceOptions;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_DB_URL: &str = "sqlite:parcours.sqlite3";
pub const DEFAULT_CONFIG_FILE: &str = "parcours.toml";

/// Contents of the optional TOML file. Every key may be omitted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub bind: Option<String>,
    pub database_url: Option<String>,
    pub autosave_debounce_ms: Option<u64>,
    pub plan_limit_max: Option<u32>,
}

impl FileConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid configuration file")
    }

    /// Read `explicit` if given (it must exist), else `parcours.toml` in the
    /// working directory when present.
    pub fn load(explicit: Option<&Path>) -> Result<Option<Self>> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok(None);
                }
                fallback
            }
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::parse(&content).map(Some)
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub bind: Option<String>,
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: String,
    pub database_url: String,
    pub autosave_debounce_ms: u64,
    pub plan_limit_max: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let options = ServiceOptions::default();
        Self {
            bind: DEFAULT_BIND.to_owned(),
            database_url: DEFAULT_DB_URL.to_owned(),
            autosave_debounce_ms: u64::try_from(options.autosave_delay.as_millis())
                .unwrap_or(u64::MAX),
            plan_limit_max: options.plan_limit_max,
        }
    }
}

impl AppConfig {
    #[must_use]
    pub fn resolve(overrides: Overrides, file: Option<FileConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();
        Self {
            bind: overrides.bind.or(file.bind).unwrap_or(defaults.bind),
            database_url: overrides
                .database_url
                .or(file.database_url)
                .unwrap_or(defaults.database_url),
            autosave_debounce_ms: file
                .autosave_debounce_ms
                .unwrap_or(defaults.autosave_debounce_ms),
            plan_limit_max: file
                .plan_limit_max
                .unwrap_or(defaults.plan_limit_max)
                .max(1),
        }
    }

    #[must_use]
    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            autosave_delay: Duration::from_millis(self.autosave_debounce_ms),
            plan_limit_max: self.plan_limit_max,
        }
    }
}
