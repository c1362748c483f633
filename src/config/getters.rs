//! Getter methods for `ScanConfig`

use std::path::Path;
use std::time::Duration;

use super::types::{AnalysisConfig, ScanConfig};

impl ScanConfig {
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn root_fetch_timeout_secs(&self) -> u64 {
        self.root_fetch_timeout_secs
    }

    #[must_use]
    pub fn root_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.root_fetch_timeout_secs)
    }

    #[must_use]
    pub fn asset_fetch_timeout_secs(&self) -> u64 {
        self.asset_fetch_timeout_secs
    }

    #[must_use]
    pub fn asset_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.asset_fetch_timeout_secs)
    }

    #[must_use]
    pub fn page_load_timeout_secs(&self) -> u64 {
        self.page_load_timeout_secs
    }

    #[must_use]
    pub fn settle_period(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_executable(&self) -> Option<&Path> {
        self.chrome_executable.as_deref()
    }

    #[must_use]
    pub fn captured_content_types(&self) -> &[String] {
        &self.captured_content_types
    }

    #[must_use]
    pub fn analysis(&self) -> &AnalysisConfig {
        &self.analysis
    }
}
