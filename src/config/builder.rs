//! Fluent builder for `ScanConfig`
//!
//! Every field has a default, so the builder starts from
//! `ScanConfig::default()` and validates once in [`ScanConfigBuilder::build`].

use std::path::PathBuf;

use super::types::{AnalysisConfig, ConfigError, ScanConfig};

#[derive(Debug, Clone, Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn root_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.root_fetch_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn asset_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.asset_fetch_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn page_load_timeout_secs(mut self, secs: u64) -> Self {
        self.config.page_load_timeout_secs = secs;
        self
    }

    /// Post-load observation window. Zero disables the settle wait.
    #[must_use]
    pub fn settle_secs(mut self, secs: u64) -> Self {
        self.config.settle_secs = secs;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    #[must_use]
    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    /// Replace the captured content types
    #[must_use]
    pub fn captured_content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.captured_content_types = types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn analysis(mut self, analysis: AnalysisConfig) -> Self {
        self.config.analysis = analysis;
        self
    }

    #[must_use]
    pub fn analysis_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.analysis.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn analysis_model(mut self, model: impl Into<String>) -> Self {
        self.config.analysis.model = model.into();
        self
    }

    #[must_use]
    pub fn max_analysis_input_chars(mut self, chars: usize) -> Self {
        self.config.analysis.max_input_chars = chars;
        self
    }

    /// Pick up `OLLAMA_HOST` from the environment
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        self.config.analysis.apply_env_overrides();
        self
    }

    pub fn build(self) -> Result<ScanConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
