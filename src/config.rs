// src/config.rs
//! Runtime configuration: env-backed knobs plus the TOML source list.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::change_detector::DEFAULT_CHANGE_THRESHOLD;
use crate::fetch::DEFAULT_TIMEOUT_SECS;

pub const ENV_DB_PATH: &str = "LOVSONAR_DB";
pub const ENV_RETENTION_DAYS: &str = "LOVSONAR_RETENTION_DAYS";
pub const ENV_CHANGE_THRESHOLD: &str = "LOVSONAR_CHANGE_THRESHOLD";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "LOVSONAR_HTTP_TIMEOUT_SECS";
pub const ENV_REPORT_DAYS: &str = "LOVSONAR_REPORT_DAYS";
pub const ENV_SOURCES_PATH: &str = "LOVSONAR_SOURCES_PATH";

pub const DEFAULT_DB_PATH: &str = "state/lovsonar.db";
pub const DEFAULT_RETENTION_DAYS: i64 = 180;
pub const DEFAULT_REPORT_DAYS: i64 = 7;
pub const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";

/// Source list compiled into the binary; used when no file is present.
const BUILTIN_SOURCES: &str = include_str!("../config/sources.toml");

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub retention_days: i64,
    pub change_threshold: f64,
    pub http_timeout: Duration,
    /// How far back the `report` run mode looks.
    pub report_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH)),
            retention_days: env_parse(ENV_RETENTION_DAYS, DEFAULT_RETENTION_DAYS),
            change_threshold: env_parse(ENV_CHANGE_THRESHOLD, DEFAULT_CHANGE_THRESHOLD),
            http_timeout: Duration::from_secs(env_parse(
                ENV_HTTP_TIMEOUT_SECS,
                DEFAULT_TIMEOUT_SECS,
            )),
            report_days: env_parse(ENV_REPORT_DAYS, DEFAULT_REPORT_DAYS),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/* ----------------------------
Source list (TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct FeedCfg {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub hearing: bool,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

fn default_max_items() -> usize {
    15
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StortingetCfg {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentCfg {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub feeds: Vec<FeedCfg>,
    #[serde(default)]
    pub stortinget: StortingetCfg,
    #[serde(default)]
    pub documents: Vec<DocumentCfg>,
}

impl SourcesConfig {
    /// Load from `$LOVSONAR_SOURCES_PATH`, else `config/sources.toml`, else
    /// the built-in default list.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
            return Self::from_path(Path::new(&p));
        }
        let default = Path::new(DEFAULT_SOURCES_PATH);
        if default.exists() {
            return Self::from_path(default);
        }
        Self::from_toml_str(BUILTIN_SOURCES)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading source list from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).context("parsing source list")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_sources_parse() {
        let cfg = SourcesConfig::from_toml_str(BUILTIN_SOURCES).expect("builtin sources");
        assert!(!cfg.feeds.is_empty());
        assert!(!cfg.documents.is_empty());
        assert!(cfg.feeds.iter().any(|f| f.hearing));
    }

    #[test]
    fn feed_defaults_apply() {
        let cfg = SourcesConfig::from_toml_str(
            r#"
[[feeds]]
name = "Test"
url = "https://example.no/rss"
"#,
        )
        .unwrap();
        assert_eq!(cfg.feeds[0].max_items, 15);
        assert!(!cfg.feeds[0].hearing);
        assert!(!cfg.stortinget.enabled);
        assert!(cfg.documents.is_empty());
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_are_parsed() {
        std::env::set_var(ENV_RETENTION_DAYS, "90");
        std::env::set_var(ENV_CHANGE_THRESHOLD, "1.5");
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.retention_days, 90);
        assert!((cfg.change_threshold - 1.5).abs() < 1e-9);
        std::env::remove_var(ENV_RETENTION_DAYS);
        std::env::remove_var(ENV_CHANGE_THRESHOLD);

        let cfg = AppConfig::from_env();
        assert_eq!(cfg.retention_days, DEFAULT_RETENTION_DAYS);
    }
}
