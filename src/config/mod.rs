//! Configuration module for attack-surface scans
//!
//! This module provides the `ScanConfig` struct and its validating builder,
//! covering crawl timeouts, browser settings, captured content types and the
//! analysis backend.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::ScanConfigBuilder;
pub use types::{AnalysisConfig, ConfigError, ScanConfig};
