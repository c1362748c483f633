//! Browser-driven capture of the API traffic a page generates at load time.
//!
//! The probe does the browsing; this module owns the session lifetime and
//! decides what becomes an artifact. Only text-bodied exchanges (JSON, plain
//! text, XML by default) are kept, and each one becomes an `api_request` and
//! an `api_response` artifact with the same origin.

use std::path::Path;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::crawl_types::{CrawlError, CrawlResult, SkippedItem, TrafficCapture};
use super::page_timeout::{with_deadline, with_page_timeout};
use crate::artifact::{ArtifactKind, Payload, identify, persist_artifact};
use crate::config::ScanConfig;
use crate::network_capture::{CleanupResult, ObservedExchange, ProbeSession, TrafficProbe};
use crate::utils::constants::UNDECODABLE_BODY_SENTINEL;
use crate::utils::{is_fetchable_url, normalize_url};

/// Accepted exchange with its decoded response body
struct CapturedExchange {
    exchange: ObservedExchange,
    body: String,
}

struct Observation {
    accepted: Vec<CapturedExchange>,
    discarded: usize,
}

/// Load `base_url` in a browser session from `probe` and store the
/// text-bodied exchanges it observed under `storage_dir`.
///
/// The session is released before this returns on every path. Failing to
/// acquire a session, or to navigate within the page-load timeout, fails the
/// whole call and nothing is stored.
pub async fn capture_traffic<P: TrafficProbe>(
    probe: &P,
    base_url: &str,
    storage_dir: &Path,
    config: &ScanConfig,
) -> CrawlResult<TrafficCapture> {
    let target = normalize_url(base_url.trim());
    if !is_fetchable_url(&target) {
        return Err(CrawlError::InvalidUrl(base_url.to_string()));
    }

    info!("Capturing traffic for {target}");
    let mut session = probe
        .acquire()
        .await
        .map_err(|e| CrawlError::BrowserError(format!("{e:#}")))?;

    let observation = observe(&mut session, &target, config).await;

    match session.release().await {
        CleanupResult::Success => debug!("Browser session released"),
        CleanupResult::PartialFailure(errors) => {
            warn!("Browser session released with errors: {}", errors.join("; "));
        }
    }

    let observation = observation?;
    store_exchanges(observation, storage_dir).await
}

/// Whether a declared content type is one the interceptor keeps
#[must_use]
pub fn is_captured_content_type(content_type: &str, captured: &[String]) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    captured
        .iter()
        .map(|accepted| accepted.trim().to_ascii_lowercase())
        .any(|accepted| !accepted.is_empty() && content_type.contains(&accepted))
}

async fn observe<S: ProbeSession>(
    session: &mut S,
    target: &str,
    config: &ScanConfig,
) -> CrawlResult<Observation> {
    with_page_timeout(
        session.navigate(target),
        config.page_load_timeout_secs(),
        "Page navigation",
    )
    .await
    .map_err(|e| CrawlError::Navigation {
        url: target.to_string(),
        message: format!("{e:#}"),
    })?;

    let settle = config.settle_period();
    if !settle.is_zero() {
        debug!("Waiting {settle:?} for late requests");
        tokio::time::sleep(settle).await;
    }

    let exchanges = session
        .exchanges()
        .await
        .map_err(|e| CrawlError::BrowserError(format!("{e:#}")))?;
    debug!("Observed {} exchanges", exchanges.len());

    let mut observation = Observation {
        accepted: Vec::new(),
        discarded: 0,
    };
    // All body reads together get one page-load timeout
    let body_deadline = Instant::now() + Duration::from_secs(config.page_load_timeout_secs());

    for exchange in exchanges {
        let Some(response) = &exchange.response else {
            continue;
        };
        if !is_captured_content_type(&response.content_type, config.captured_content_types()) {
            debug!(
                "Ignoring {} {} ({}, {})",
                exchange.method, exchange.url, response.status, response.content_type
            );
            observation.discarded += 1;
            continue;
        }
        debug!("Keeping {} {} ({})", exchange.method, exchange.url, response.status);

        let body = match with_deadline(
            session.response_body(&exchange),
            body_deadline,
            "Response body read",
        )
        .await
        {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("Could not read body of {}: {e:#}", exchange.url);
                UNDECODABLE_BODY_SENTINEL.to_string()
            }
        };
        observation.accepted.push(CapturedExchange { exchange, body });
    }

    Ok(observation)
}

async fn store_exchanges(observation: Observation, storage_dir: &Path) -> CrawlResult<TrafficCapture> {
    tokio::fs::create_dir_all(storage_dir)
        .await
        .map_err(|e| CrawlError::StorageError(format!("{}: {e}", storage_dir.display())))?;

    let mut capture = TrafficCapture {
        discarded: observation.discarded,
        ..TrafficCapture::default()
    };

    for (index, CapturedExchange { exchange, body }) in observation.accepted.into_iter().enumerate() {
        let (request_name, response_name) = exchange_file_names(&exchange.url, index + 1);

        let request = match persist_artifact(
            storage_dir,
            &request_name,
            ArtifactKind::ApiRequest,
            Some(exchange.url.clone()),
            Payload::Text(exchange.request_text()),
        )
        .await
        {
            Ok(artifact) => artifact,
            Err(e) => {
                warn!("Failed to store request for {}: {e}", exchange.url);
                capture
                    .skipped
                    .push(SkippedItem::new(&exchange.url, ArtifactKind::ApiRequest, e.to_string()));
                continue;
            }
        };

        match persist_artifact(
            storage_dir,
            &response_name,
            ArtifactKind::ApiResponse,
            Some(exchange.url.clone()),
            Payload::Text(body),
        )
        .await
        {
            Ok(response) => {
                capture.artifacts.push(request);
                capture.artifacts.push(response);
            }
            Err(e) => {
                // Keep request/response pairing symmetric
                warn!("Failed to store response for {}: {e}", exchange.url);
                if let Err(remove_err) = tokio::fs::remove_file(request.location()).await {
                    debug!("Could not remove orphaned request file: {remove_err}");
                }
                capture
                    .skipped
                    .push(SkippedItem::new(&exchange.url, ArtifactKind::ApiResponse, e.to_string()));
            }
        }
    }

    info!(
        "Traffic capture complete: {} artifacts, {} exchanges filtered out",
        capture.artifacts.len(),
        capture.discarded
    );
    Ok(capture)
}

/// Storage names for the request/response pair of the `ordinal`-th
/// accepted exchange. The ordinal keeps repeated calls to one URL apart.
#[must_use]
pub fn exchange_file_names(url: &str, ordinal: usize) -> (String, String) {
    let token = identify(url.as_bytes());
    (
        format!("api_req_{token}_{ordinal:03}.txt"),
        format!("api_res_{token}_{ordinal:03}.txt"),
    )
}
