//! Configuration infrastructure
//!
//! A single JSON file holds the listing source, HTTP behavior, crawl
//! concurrency, logging and selector settings. Every section has defaults so
//! a partial (or missing) file is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use super::parsing::ParsingConfig;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub http: HttpConfig,
    pub crawling: CrawlingConfig,
    pub logging: LoggingConfig,
    pub parsing: ParsingConfig,
}

/// Where the listing comes from and where artifacts go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Listing page or JSON API endpoint
    pub listing_url: String,

    /// Request the listing as a JSON API response
    pub json_api: bool,

    /// Listing artifact, written by the listing stage and read by the detail stage
    pub listing_path: PathBuf,

    /// Detailed artifact
    pub detailed_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub user_agent: String,
    pub follow_redirects: bool,
}

/// Detail-stage scheduling and diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlingConfig {
    /// Maximum concurrent detail fetches; 1 runs sequentially
    pub detail_max_concurrent: usize,

    /// Directory for raw detail page dumps
    pub dump_dir: Option<PathBuf>,

    /// Dump only the first detail page of the run
    pub dump_first_detail: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    pub console_output: bool,
    pub file_output: bool,

    /// Directory for the log file; defaults to `logs/` beside the executable
    pub log_dir: Option<PathBuf>,

    /// Per-target level overrides (e.g. "reqwest": "warn")
    pub module_filters: BTreeMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            listing_url: defaults::LISTING_URL.to_string(),
            json_api: false,
            listing_path: PathBuf::from(defaults::LISTING_FILE),
            detailed_path: PathBuf::from(defaults::DETAILED_FILE),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_retries: defaults::MAX_RETRIES,
            retry_base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            user_agent: defaults::USER_AGENT.to_string(),
            follow_redirects: true,
        }
    }
}

impl Default for CrawlingConfig {
    fn default() -> Self {
        Self {
            detail_max_concurrent: defaults::DETAIL_MAX_CONCURRENT,
            dump_dir: None,
            dump_first_detail: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let module_filters = [
            ("reqwest", "info"),
            ("hyper", "warn"),
            ("h2", "warn"),
            ("html5ever", "warn"),
            ("selectors", "warn"),
        ]
        .into_iter()
            .map(|(target, level)| (target.to_string(), level.to_string()))
            .collect();

        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            module_filters,
        }
    }
}

/// Loads and saves `AppConfig` as pretty JSON
#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);
        Ok(config_dir)
    }

    /// Manager for the default config location
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_path: Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME),
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// Load configuration; a missing file yields the defaults
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, using defaults: {:?}", self.config_path);
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| {
                format!("Failed to read configuration file {}", self.config_path.display())
            })?;

        let config = serde_json::from_str::<AppConfig>(&content)
            .with_context(|| format!("Invalid configuration file {}", self.config_path.display()))?;

        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Default configuration values
pub mod defaults {
    pub const APP_DIR_NAME: &str = "merger-tracker";
    pub const CONFIG_FILE_NAME: &str = "merger_tracker_config.json";

    /// Competition regulator merger cases listing
    pub const LISTING_URL: &str = "https://www.gov.uk/cma-cases?case_type%5B%5D=mergers";

    pub const LISTING_FILE: &str = "cases.json";
    pub const DETAILED_FILE: &str = "cases_detailed.json";

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
    pub const MAX_RETRIES: u32 = 3;
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;
    pub const USER_AGENT: &str =
        "merger-tracker/0.2 (+https://github.com/merger-tracker/merger-tracker)";

    /// Concurrent detail page fetches
    pub const DETAIL_MAX_CONCURRENT: usize = 10;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_FILE_NAME: &str = "merger-tracker.log";
}
