//! Runtime configuration for imgsim-ui
//!
//! Merges command-line overrides with the TOML file. See
//! [`imgsim_common::config`] for the priority order.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use imgsim_common::config::{
    load_toml_config, poll_interval, resolve_api_base_url, SearchSettings, TomlConfig,
    API_BASE_URL_ENV, DEFAULT_PORT,
};
use imgsim_common::Result;
use tracing::info;

/// Default tracing directives when neither `RUST_LOG` nor `log_level` is set
pub const DEFAULT_LOG_FILTER: &str = "imgsim_ui=debug,imgsim_common=info,tower_http=debug";

/// Values given on the command line (or their clap `env` fallbacks)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub port: Option<u16>,
    pub poll_interval_secs: Option<u64>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub port: u16,
    pub poll_interval: Duration,
    pub search: SearchSettings,
    pub log_level: Option<String>,
}

impl Config {
    /// Load the TOML file and merge it with `overrides`
    pub fn load(overrides: &CliOverrides) -> Result<Self> {
        let toml_config = load_toml_config(overrides.config_path.as_deref())?;
        Self::from_sources(overrides, &toml_config)
    }

    /// Merge already-loaded sources
    pub fn from_sources(overrides: &CliOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let api_base_url = resolve_api_base_url(
            overrides.api_base_url.as_deref(),
            API_BASE_URL_ENV,
            toml_config,
        )?;
        let port = overrides.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
        let poll_interval = poll_interval(overrides.poll_interval_secs.or(toml_config.poll_interval_secs));

        let config = Self {
            api_base_url,
            port,
            poll_interval,
            search: toml_config.search.validated(),
            log_level: toml_config.log_level.clone(),
        };

        info!(
            api_base_url = %config.api_base_url,
            port = config.port,
            poll_interval_secs = config.poll_interval.as_secs(),
            top_k = config.search.top_k,
            threshold = config.search.threshold,
            "Configuration resolved"
        );
        Ok(config)
    }

    /// Local HTTP surface address (loopback only)
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.port)
    }

    /// Tracing directives for the configured `log_level`
    pub fn log_filter(&self) -> String {
        match self.log_level.as_deref() {
            Some(level) => format!(
                "imgsim_ui={level},imgsim_common={level},tower_http={level}",
                level = level.trim().to_ascii_lowercase()
            ),
            None => DEFAULT_LOG_FILTER.to_string(),
        }
    }
}
