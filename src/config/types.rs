//! Core configuration types for scans
//!
//! This module contains the main `ScanConfig` struct, the nested
//! `AnalysisConfig` for the completion backend, and the validation error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils::constants::{
    ASSET_FETCH_TIMEOUT_SECS, CAPTURED_CONTENT_TYPES, DEFAULT_ANALYSIS_ENDPOINT,
    DEFAULT_ANALYSIS_MODEL, DEFAULT_USER_AGENT, MAX_ANALYSIS_INPUT_CHARS, PAGE_LOAD_TIMEOUT_SECS,
    ROOT_FETCH_TIMEOUT_SECS, TRAFFIC_SETTLE_SECS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Main configuration struct for scans
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// User agent sent by the static crawler's HTTP client
    pub(crate) user_agent: String,

    /// Timeout for the root document GET. Failure aborts the static crawl.
    ///
    /// Default: 25 seconds
    pub(crate) root_fetch_timeout_secs: u64,

    /// Timeout for each linked script/stylesheet GET. Failure skips that
    /// asset only.
    ///
    /// Default: 20 seconds
    pub(crate) asset_fetch_timeout_secs: u64,

    /// Upper bound for browser navigation and page load
    ///
    /// Default: 40 seconds
    pub(crate) page_load_timeout_secs: u64,

    /// How long to keep observing traffic after the page has loaded
    ///
    /// Default: 8 seconds
    pub(crate) settle_secs: u64,

    pub(crate) headless: bool,

    /// Explicit Chrome/Chromium binary; discovered when `None`
    pub(crate) chrome_executable: Option<PathBuf>,

    /// Response content types the traffic interceptor keeps (substring match)
    pub(crate) captured_content_types: Vec<String>,

    pub(crate) analysis: AnalysisConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            root_fetch_timeout_secs: ROOT_FETCH_TIMEOUT_SECS,
            asset_fetch_timeout_secs: ASSET_FETCH_TIMEOUT_SECS,
            page_load_timeout_secs: PAGE_LOAD_TIMEOUT_SECS,
            settle_secs: TRAFFIC_SETTLE_SECS,
            headless: true,
            chrome_executable: None,
            captured_content_types: CAPTURED_CONTENT_TYPES.iter().map(|s| (*s).to_string()).collect(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl ScanConfig {
    #[must_use]
    pub fn builder() -> super::ScanConfigBuilder {
        super::ScanConfigBuilder::default()
    }

    /// Load a JSON config file. Missing fields take their defaults; the
    /// result goes through the same validation as the builder.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("root_fetch_timeout_secs", self.root_fetch_timeout_secs),
            ("asset_fetch_timeout_secs", self.asset_fetch_timeout_secs),
            ("page_load_timeout_secs", self.page_load_timeout_secs),
            ("analysis.timeout_secs", self.analysis.timeout_secs),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "user_agent",
                reason: "must not be empty".to_string(),
            });
        }

        if self.captured_content_types.iter().all(|ct| ct.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "captured_content_types",
                reason: "at least one content type is required".to_string(),
            });
        }

        if self.analysis.max_input_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "analysis.max_input_chars",
                reason: "must be greater than zero".to_string(),
            });
        }

        url::Url::parse(&self.analysis.endpoint).map_err(|e| ConfigError::Invalid {
            field: "analysis.endpoint",
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

/// Settings for the completion backend used for summaries and deep dives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Base URL of the Ollama server
    pub endpoint: String,
    pub model: String,
    /// Longer inputs are truncated to this many characters
    pub max_input_chars: usize,
    pub summary_temperature: f32,
    pub summary_max_tokens: u32,
    pub deep_dive_temperature: f32,
    pub deep_dive_max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ANALYSIS_ENDPOINT.to_string(),
            model: DEFAULT_ANALYSIS_MODEL.to_string(),
            max_input_chars: MAX_ANALYSIS_INPUT_CHARS,
            summary_temperature: 0.2,
            summary_max_tokens: 300,
            deep_dive_temperature: 0.1,
            deep_dive_max_tokens: 700,
            timeout_secs: 120,
        }
    }
}

impl AnalysisConfig {
    /// Apply `OLLAMA_HOST` if set. A bare `host:port` gets an `http://` scheme.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            let host = host.trim();
            if host.is_empty() {
                return;
            }
            self.endpoint = if host.contains("://") {
                host.to_string()
            } else {
                format!("http://{host}")
            };
            tracing::debug!("Analysis endpoint overridden by OLLAMA_HOST: {}", self.endpoint);
        }
    }
}
