//! Configuration loading and base URL resolution
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--api-base-url`, `--port`, ...)
//! 2. Environment variables (`IMGSIM_API_BASE_URL`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing TOML file is never fatal: the client logs a warning and
//! starts with defaults. A TOML file that exists but does not parse is a
//! configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Compiled default for the remote service base URL
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Environment variable carrying the remote service base URL
pub const API_BASE_URL_ENV: &str = "IMGSIM_API_BASE_URL";

/// Default port for the local HTTP surface
pub const DEFAULT_PORT: u16 = 5780;

/// Metrics polling bounds (seconds)
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;
pub const MAX_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Remote service base URL, including the `/api/v1` prefix
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Local HTTP surface port
    #[serde(default)]
    pub port: Option<u16>,

    /// Metrics poll period in seconds (clamped to 5-30)
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default)]
    pub log_level: Option<String>,

    /// Search request defaults
    #[serde(default)]
    pub search: SearchSettings,
}

/// Parameters applied to every search request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Maximum number of results
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Minimum score the service should return (0.0-1.0)
    #[serde(default)]
    pub threshold: f32,

    /// Ask the service for per-result metadata
    #[serde(default = "default_true")]
    pub include_metadata: bool,
}

fn default_top_k() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            threshold: 0.0,
            include_metadata: true,
        }
    }
}

impl SearchSettings {
    /// Clamp settings into their valid ranges, warning on each adjustment
    pub fn validated(self) -> Self {
        let mut settings = self;
        if settings.top_k == 0 {
            warn!("search.top_k = 0 is invalid, using 1");
            settings.top_k = 1;
        }
        if !(0.0..=1.0).contains(&settings.threshold) {
            let clamped = if settings.threshold.is_nan() {
                0.0
            } else {
                settings.threshold.clamp(0.0, 1.0)
            };
            warn!(
                "search.threshold = {} outside [0, 1], using {}",
                settings.threshold, clamped
            );
            settings.threshold = clamped;
        }
        settings
    }
}

/// Locate the configuration file
///
/// An explicit path wins. Otherwise `~/.config/imgsim/config.toml` is tried,
/// then `/etc/imgsim/config.toml` on Linux.
pub fn config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let user_config = dirs::config_dir().map(|d| d.join("imgsim").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/imgsim/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load the TOML configuration
///
/// Returns defaults when no file is found. Returns [`Error::Config`] when a
/// file exists but cannot be parsed.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = config_file_path(explicit) else {
        warn!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file {} not found, using built-in defaults", path.display());
            return Ok(TomlConfig::default());
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let config = toml::from_str::<TomlConfig>(&content).map_err(|e| {
        Error::Config(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    info!("Config loaded from {}", path.display());
    Ok(config)
}

/// Resolve the remote service base URL
///
/// Priority: command line > environment variable > TOML > compiled default.
/// Trailing slashes are trimmed. The result must be an absolute http(s) URL.
pub fn resolve_api_base_url(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> Result<String> {
    // Priority 1: Command-line argument
    if let Some(url) = cli_arg {
        return normalize_base_url(url);
    }

    // Priority 2: Environment variable
    if let Ok(url) = std::env::var(env_var_name) {
        return normalize_base_url(&url);
    }

    // Priority 3: TOML config file
    if let Some(url) = toml_config.api_base_url.as_deref() {
        return normalize_base_url(url);
    }

    // Priority 4: Compiled default
    normalize_base_url(DEFAULT_API_BASE_URL)
}

/// Trim and validate a base URL
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');

    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "API base URL must start with http:// or https://: '{}'",
                raw
            ))
        })?;

    if rest.is_empty() || rest.starts_with('/') {
        return Err(Error::InvalidInput(format!(
            "API base URL has no host: '{}'",
            raw
        )));
    }

    Ok(trimmed.to_string())
}

/// Clamp the metrics poll period into the supported range
pub fn poll_interval(secs: Option<u64>) -> Duration {
    let requested = secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
    let clamped = requested.clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS);
    if clamped != requested {
        warn!(
            "poll_interval_secs = {} outside [{}, {}], using {}",
            requested, MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS, clamped
        );
    }
    Duration::from_secs(clamped)
}
