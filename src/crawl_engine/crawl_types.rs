//! Core types shared by the static crawler and the traffic interceptor.
//!
//! `CrawlError` is reserved for failures that abort a whole crawl call.
//! Failures of a single asset or exchange are reported as [`SkippedItem`]
//! values next to the artifacts that did make it.

use std::fmt;

use crate::artifact::{Artifact, ArtifactKind};

/// Errors that abort a crawl call
#[derive(Debug, Clone)]
pub enum CrawlError {
    /// Target URL cannot be requested at all
    InvalidUrl(String),
    /// Root document could not be fetched or returned an error status
    RootFetch { url: String, message: String },
    /// Browser session could not be acquired
    BrowserError(String),
    /// Navigation failed or timed out
    Navigation { url: String, message: String },
    /// Writing to the session workspace failed
    StorageError(String),
    /// Other errors
    Other(String),
}

impl fmt::Display for CrawlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(url) => write!(f, "Invalid target URL: {url}"),
            Self::RootFetch { url, message } => {
                write!(f, "Failed to fetch root document {url}: {message}")
            }
            Self::BrowserError(msg) => write!(f, "Browser error: {msg}"),
            Self::Navigation { url, message } => write!(f, "Navigation to {url} failed: {message}"),
            Self::StorageError(msg) => write!(f, "Storage error: {msg}"),
            Self::Other(msg) => write!(f, "Crawl error: {msg}"),
        }
    }
}

impl std::error::Error for CrawlError {}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // Use {:#} to preserve full error chain with context
        Self::Other(format!("{err:#}"))
    }
}

impl From<crate::artifact::ArtifactError> for CrawlError {
    fn from(err: crate::artifact::ArtifactError) -> Self {
        Self::StorageError(err.to_string())
    }
}

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;

/// One asset or exchange that was left out of a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub url: String,
    pub kind: ArtifactKind,
    pub reason: String,
}

impl SkippedItem {
    pub fn new(url: impl Into<String>, kind: ArtifactKind, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SkippedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed {} [{}]: {}", self.url, self.kind, self.reason)
    }
}

/// Output of a successful static crawl
#[derive(Debug, Default)]
pub struct StaticCrawl {
    /// Root document first, then linked assets in document order
    pub artifacts: Vec<Artifact>,
    pub skipped: Vec<SkippedItem>,
}

/// Output of a successful traffic capture
#[derive(Debug, Default)]
pub struct TrafficCapture {
    /// `api_request`/`api_response` pairs, in observation order
    pub artifacts: Vec<Artifact>,
    pub skipped: Vec<SkippedItem>,
    /// Exchanges dropped by the content-type filter
    pub discarded: usize,
}
