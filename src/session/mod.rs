//! One scan session: the workspace on disk and the artifacts collected in it.
//!
//! Everything a session gathers lives in a temporary directory that is
//! removed when the session is dropped. Each crawl and each upload batch gets
//! its own numbered sub-directory.

pub mod uploads;

pub use uploads::{UploadedFile, classify_upload, is_textual_media_type, store_upload, upload_file_name};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Client;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::analysis::{Analyzer, CompletionBackend};
use crate::artifact::Artifact;
use crate::collection::{ArtifactCollection, CollectionError};
use crate::config::ScanConfig;
use crate::crawl_engine::{self, CrawlResult, SkippedItem};
use crate::network_capture::TrafficProbe;

/// What one crawl call added to the session
#[derive(Debug, Default)]
pub struct CrawlReport {
    pub added: usize,
    pub skipped: Vec<SkippedItem>,
    /// Exchanges dropped by the content-type filter
    pub discarded: usize,
    pub rejected: Vec<CollectionError>,
}

/// An upload that could not be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct UploadReport {
    pub added: usize,
    pub failed: Vec<UploadFailure>,
}

pub struct ScanSession {
    workspace: TempDir,
    collection: ArtifactCollection,
    client: Client,
    config: ScanConfig,
    batches: usize,
}

impl ScanSession {
    pub fn new(config: ScanConfig) -> Result<Self> {
        let workspace = tempfile::Builder::new()
            .prefix("websec_scan_")
            .tempdir()
            .context("Failed to create session workspace")?;
        let client = crawl_engine::build_http_client(&config)?;
        info!("Scan session workspace: {}", workspace.path().display());

        Ok(Self {
            workspace,
            collection: ArtifactCollection::new(),
            client,
            config,
            batches: 0,
        })
    }

    #[must_use]
    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    #[must_use]
    pub fn collection(&self) -> &ArtifactCollection {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut ArtifactCollection {
        &mut self.collection
    }

    /// Static crawl of `url` into a fresh crawl directory.
    ///
    /// On error the collection is untouched.
    pub async fn crawl_static(&mut self, url: &str) -> CrawlResult<CrawlReport> {
        let dir = self.next_batch_dir("crawl");
        self.crawl_static_into(url, &dir).await
    }

    /// Traffic capture of `url` into a fresh crawl directory.
    ///
    /// On error the collection is untouched.
    pub async fn capture_traffic<P: TrafficProbe>(
        &mut self,
        url: &str,
        probe: &P,
    ) -> CrawlResult<CrawlReport> {
        let dir = self.next_batch_dir("crawl");
        self.capture_traffic_into(url, probe, &dir).await
    }

    /// Static crawl followed by traffic capture, sharing one crawl directory.
    ///
    /// If the capture fails, the static artifacts stay in the collection and
    /// the capture error is returned.
    pub async fn crawl_target<P: TrafficProbe>(
        &mut self,
        url: &str,
        probe: &P,
    ) -> CrawlResult<CrawlReport> {
        let dir = self.next_batch_dir("crawl");
        let mut report = self.crawl_static_into(url, &dir).await?;
        let traffic = self.capture_traffic_into(url, probe, &dir).await?;

        report.added += traffic.added;
        report.skipped.extend(traffic.skipped);
        report.discarded += traffic.discarded;
        report.rejected.extend(traffic.rejected);
        Ok(report)
    }

    /// Store a batch of uploads in their own directory
    pub async fn add_uploads(&mut self, files: Vec<UploadedFile>) -> UploadReport {
        let mut report = UploadReport::default();
        let dir = self.next_batch_dir("upload");
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!("Failed to create upload directory {}: {e}", dir.display());
            report.failed = files
                .into_iter()
                .map(|file| UploadFailure {
                    name: file.name,
                    reason: e.to_string(),
                })
                .collect();
            return report;
        }

        let mut used_names = HashSet::new();
        for (index, file) in files.into_iter().enumerate() {
            let file_name = unique_upload_name(&file.name, index, &mut used_names);

            let name = file.name.clone();
            let stored = match store_upload(&dir, &file_name, file).await {
                Ok(artifact) => artifact,
                Err(e) => {
                    warn!("Failed to store upload {name}: {e}");
                    report.failed.push(UploadFailure {
                        name,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match self.collection.add(stored) {
                Ok(_) => report.added += 1,
                Err(e) => report.failed.push(UploadFailure {
                    name,
                    reason: e.to_string(),
                }),
            }
        }

        info!("Stored {} uploads", report.added);
        report
    }

    /// Summarize every text artifact that has no summary yet.
    ///
    /// Returns how many summaries were written.
    pub async fn summarize_pending<B: CompletionBackend>(&mut self, analyzer: &Analyzer<B>) -> usize {
        let mut written = 0;
        for artifact in self.collection.iter_mut() {
            if analyzer.summarize_artifact(artifact).await {
                written += 1;
            }
        }
        written
    }

    /// Deep dive for the artifact at 1-based `position`, computed once.
    ///
    /// `None` if the position is out of range or the artifact is binary.
    pub async fn deep_dive<B: CompletionBackend>(
        &mut self,
        position: usize,
        analyzer: &Analyzer<B>,
    ) -> Option<&str> {
        let artifact = self.collection.get_mut(position.checked_sub(1)?)?;
        analyzer.deep_dive_artifact(artifact).await
    }

    /// Copy every artifact's stored bytes into `dir`.
    ///
    /// Files are named `{position}_{display name}` so artifacts from
    /// different crawls never overwrite each other.
    pub async fn export_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

        let mut written = Vec::with_capacity(self.collection.len());
        for view in self.collection.views() {
            let target = dir.join(format!("{:03}_{}", view.position, view.display_name));
            tokio::fs::write(&target, view.bytes)
                .await
                .with_context(|| format!("Failed to export {}", target.display()))?;
            written.push(target);
        }
        Ok(written)
    }

    async fn crawl_static_into(&mut self, url: &str, dir: &Path) -> CrawlResult<CrawlReport> {
        let crawl = crawl_engine::crawl_static(url, &self.client, dir, &self.config).await?;
        let mut report = CrawlReport {
            skipped: crawl.skipped,
            ..CrawlReport::default()
        };
        self.absorb(crawl.artifacts, &mut report);
        Ok(report)
    }

    async fn capture_traffic_into<P: TrafficProbe>(
        &mut self,
        url: &str,
        probe: &P,
        dir: &Path,
    ) -> CrawlResult<CrawlReport> {
        let capture = crawl_engine::capture_traffic(probe, url, dir, &self.config).await?;
        let mut report = CrawlReport {
            skipped: capture.skipped,
            discarded: capture.discarded,
            ..CrawlReport::default()
        };
        self.absorb(capture.artifacts, &mut report);
        Ok(report)
    }

    fn absorb(&mut self, artifacts: Vec<Artifact>, report: &mut CrawlReport) {
        let offered = artifacts.len();
        report.rejected = self.collection.extend(artifacts);
        report.added = offered - report.rejected.len();
    }

    fn next_batch_dir(&mut self, prefix: &str) -> PathBuf {
        self.batches += 1;
        self.workspace
            .path()
            .join(format!("{prefix}-{:03}", self.batches))
    }
}

/// Storage name for the `index`-th upload of a batch, distinct from every
/// name already in `used`.
///
/// A repeated name gets a `{index + 1}_` prefix; if that is taken too (the
/// user uploaded a file literally called `3_a.js`), the counter keeps going.
fn unique_upload_name(name: &str, index: usize, used: &mut HashSet<String>) -> String {
    let base = upload_file_name(name);
    if used.insert(base.clone()) {
        return base;
    }

    let mut counter = index + 1;
    loop {
        let candidate = format!("{counter}_{base}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_upload_name_skips_taken_prefixes() {
        let mut used = HashSet::new();
        assert_eq!(unique_upload_name("a.js", 0, &mut used), "a.js");
        assert_eq!(unique_upload_name("3_a.js", 1, &mut used), "3_a.js");
        assert_eq!(unique_upload_name("a.js", 2, &mut used), "4_a.js");
        assert_eq!(unique_upload_name("a.js", 3, &mut used), "5_a.js");
        assert_eq!(used.len(), 4);
    }
}
