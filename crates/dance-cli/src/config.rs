//! Configuration loading and parsing.
//!
//! Defines the CLI config schema and resolves defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_CACHE_DIR: &str = ".dance-cache";
const DEFAULT_PLAYBACK_MS: u64 = 10_000;
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Top-level configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    /// Path to the JSON dance catalog.
    pub catalog: Option<String>,
    /// Base URL prepended to relative source references.
    pub base_url: Option<String>,
    /// Download cache directory.
    pub cache_dir: Option<String>,
    /// Simulated playback length in milliseconds.
    pub playback_ms: Option<u64>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl CliConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<CliConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }
}

/// Resolve the catalog path, preferring the CLI override.
pub fn catalog_from_config(cfg: &CliConfig, cli: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = cli {
        return Ok(path.to_path_buf());
    }
    let path = cfg
        .catalog
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| anyhow::anyhow!("catalog is required; set it in config or use --catalog"))?;
    Ok(PathBuf::from(path))
}

/// Normalize the optional base URL, dropping a trailing slash.
pub fn base_url_from_config(cfg: &CliConfig, cli: Option<&str>) -> Option<String> {
    cli.or(cfg.base_url.as_deref())
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(|url| url.trim_end_matches('/').to_string())
}

pub fn cache_dir_from_config(cfg: &CliConfig) -> PathBuf {
    cfg.cache_dir
        .as_deref()
        .map(str::trim)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR))
}

pub fn playback_from_config(cfg: &CliConfig) -> Duration {
    Duration::from_millis(cfg.playback_ms.unwrap_or(DEFAULT_PLAYBACK_MS))
}

pub fn timeout_from_config(cfg: &CliConfig) -> Duration {
    Duration::from_millis(cfg.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS).max(1))
}
