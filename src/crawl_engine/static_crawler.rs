//! Passive retrieval of the root document and its linked assets.
//!
//! One GET for the target page, then one GET per `<script src>` and
//! `<link rel=stylesheet>` it references, awaited one after another. A failed
//! root fetch aborts the call; a failed asset is recorded as skipped and the
//! crawl moves on.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{debug, info, warn};

use super::asset_links::{AssetReference, extract_asset_references};
use super::crawl_types::{CrawlError, CrawlResult, SkippedItem, StaticCrawl};
use crate::artifact::{Artifact, ArtifactKind, Payload, identify, persist_artifact};
use crate::config::ScanConfig;
use crate::utils::{is_fetchable_url, normalize_url, resolve_url};

/// File name of the stored root document
pub const ROOT_DOCUMENT_NAME: &str = "index.html";

/// Build the HTTP client the static crawler uses
pub fn build_http_client(config: &ScanConfig) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent())
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("Failed to build HTTP client")
}

/// Fetch `base_url` and every script/stylesheet it links to into
/// `storage_dir`.
///
/// The returned artifacts start with the root `html` document; each asset's
/// `origin` is its resolved, normalized absolute URL.
pub async fn crawl_static(
    base_url: &str,
    client: &Client,
    storage_dir: &Path,
    config: &ScanConfig,
) -> CrawlResult<StaticCrawl> {
    let root_url = normalize_url(base_url.trim());
    if !is_fetchable_url(&root_url) {
        return Err(CrawlError::InvalidUrl(base_url.to_string()));
    }

    info!("Fetching root document: {root_url}");
    let html = fetch_text(
        client,
        &root_url,
        config.root_fetch_timeout(),
        "text/html,application/xhtml+xml,*/*;q=0.8",
    )
    .await
    .map_err(|e| CrawlError::RootFetch {
        url: root_url.clone(),
        message: format!("{e:#}"),
    })?;

    let references = extract_asset_references(&html);
    debug!("Root document references {} assets", references.len());

    tokio::fs::create_dir_all(storage_dir)
        .await
        .map_err(|e| CrawlError::StorageError(format!("{}: {e}", storage_dir.display())))?;

    let root = persist_artifact(
        storage_dir,
        ROOT_DOCUMENT_NAME,
        ArtifactKind::Html,
        Some(root_url.clone()),
        Payload::Text(html),
    )
    .await?;

    let mut crawl = StaticCrawl {
        artifacts: vec![root],
        skipped: Vec::new(),
    };
    let mut seen = HashSet::new();

    for reference in references {
        let asset_url = match resolve_url(&root_url, &reference.href) {
            Ok(url) => url,
            Err(e) => {
                warn!("Failed {}: {e:#}", reference.href);
                crawl
                    .skipped
                    .push(SkippedItem::new(&reference.href, reference.kind, format!("{e:#}")));
                continue;
            }
        };

        if !is_fetchable_url(&asset_url) {
            debug!("Skipping non-HTTP asset reference: {asset_url}");
            crawl.skipped.push(SkippedItem::new(
                asset_url,
                reference.kind,
                "unsupported URL scheme",
            ));
            continue;
        }

        if !seen.insert(asset_url.clone()) {
            debug!("Asset already fetched in this crawl: {asset_url}");
            continue;
        }

        match fetch_asset(client, &asset_url, &reference, storage_dir, config).await {
            Ok(artifact) => crawl.artifacts.push(artifact),
            Err(e) => {
                let reason = format!("{e:#}");
                warn!("Failed {asset_url}: {reason}");
                crawl
                    .skipped
                    .push(SkippedItem::new(asset_url, reference.kind, reason));
            }
        }
    }

    info!(
        "Static crawl of {root_url} complete: {} artifacts, {} skipped",
        crawl.artifacts.len(),
        crawl.skipped.len()
    );
    Ok(crawl)
}

/// File name for a fetched asset: identity of its URL plus a kind extension.
///
/// Stable for a given URL and independent of how long or odd the URL is.
#[must_use]
pub fn asset_file_name(asset_url: &str, kind: ArtifactKind) -> String {
    format!("{}.{}", identify(asset_url.as_bytes()), kind.extension())
}

async fn fetch_asset(
    client: &Client,
    asset_url: &str,
    reference: &AssetReference,
    storage_dir: &Path,
    config: &ScanConfig,
) -> Result<Artifact> {
    let accept = match reference.kind {
        ArtifactKind::Css => "text/css,*/*;q=0.1",
        _ => "*/*",
    };
    let body = fetch_text(client, asset_url, config.asset_fetch_timeout(), accept).await?;

    let artifact = persist_artifact(
        storage_dir,
        &asset_file_name(asset_url, reference.kind),
        reference.kind,
        Some(asset_url.to_string()),
        Payload::Text(body),
    )
    .await?;
    Ok(artifact)
}

/// GET `url` and decode the body as text, replacing invalid sequences.
///
/// Redirects are followed; a final 4xx/5xx status is an error.
async fn fetch_text(client: &Client, url: &str, timeout: Duration, accept: &str) -> Result<String> {
    let response = client
        .get(url)
        .timeout(timeout)
        .header(ACCEPT, accept)
        .send()
        .await
        .context("Request failed")?;

    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(anyhow::anyhow!("HTTP status {status}"));
    }

    response.text().await.context("Failed to read response body")
}
