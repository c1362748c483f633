//! Chromium-backed traffic probe over the DevTools protocol.
//!
//! The session subscribes to `Network.requestWillBeSent` and
//! `Network.responseReceived` on a blank page before navigating, so every
//! request the target page makes is buffered in the event streams until
//! [`ProbeSession::exchanges`] drains them.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine;
use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventRequestWillBeSent, EventResponseReceived, GetRequestPostDataParams,
    GetResponseBodyParams, Headers, RequestId,
};
use chromiumoxide::listeners::EventStream;
use futures::{FutureExt, StreamExt};
use lazy_static::lazy_static;
use log::{debug, warn};
use tempfile::TempDir;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

use super::probe::{CleanupResult, ProbeSession, TrafficProbe};
use super::types::{ObservedExchange, ObservedResponse};
use crate::browser_setup::launch_browser;
use crate::config::ScanConfig;

lazy_static! {
    // One browser session per process at a time.
    static ref BROWSER_SLOT: Arc<Mutex<()>> = Arc::new(Mutex::new(()));
}

/// Launches a fresh headless Chromium for every acquired session
#[derive(Debug, Clone)]
pub struct ChromiumProbe {
    config: ScanConfig,
}

impl ChromiumProbe {
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }
}

impl TrafficProbe for ChromiumProbe {
    type Session = ChromiumSession;

    async fn acquire(&self) -> Result<ChromiumSession> {
        let slot = Arc::clone(&*BROWSER_SLOT).lock_owned().await;
        let (browser, handler, profile_dir) = launch_browser(&self.config).await?;

        let mut session = ChromiumSession {
            browser: Some(browser),
            handler,
            profile_dir: Some(profile_dir),
            page: None,
            requests: None,
            responses: None,
            _slot: slot,
        };

        if let Err(e) = session.open_instrumented_page().await {
            session.release().await;
            return Err(e);
        }
        Ok(session)
    }
}

/// A running browser with one instrumented page.
///
/// Holds the process-wide browser slot until released or dropped.
pub struct ChromiumSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    profile_dir: Option<TempDir>,
    page: Option<Page>,
    requests: Option<EventStream<EventRequestWillBeSent>>,
    responses: Option<EventStream<EventResponseReceived>>,
    _slot: OwnedMutexGuard<()>,
}

impl ChromiumSession {
    async fn open_instrumented_page(&mut self) -> Result<()> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Browser already released"))?;

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to create blank page")?;
        page.execute(EnableParams::default())
            .await
            .context("Failed to enable network domain")?;

        self.requests = Some(
            page.event_listener::<EventRequestWillBeSent>()
                .await
                .context("Failed to subscribe to outgoing requests")?,
        );
        self.responses = Some(
            page.event_listener::<EventResponseReceived>()
                .await
                .context("Failed to subscribe to responses")?,
        );
        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No instrumented page in this session"))
    }

    async fn request_post_data(&self, request_id: &str) -> Option<String> {
        let page = self.page().ok()?;
        match page
            .execute(GetRequestPostDataParams::new(RequestId::new(request_id.to_string())))
            .await
        {
            Ok(response) => Some(response.result.post_data.clone()),
            Err(e) => {
                debug!(target: "websec_surface::capture", "No post data for request {request_id}: {e}");
                None
            }
        }
    }
}

impl ProbeSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let page = self.page()?;
        page.goto(url)
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        Ok(())
    }

    async fn exchanges(&mut self) -> Result<Vec<ObservedExchange>> {
        let mut order: Vec<String> = Vec::new();
        let mut by_id: HashMap<String, ObservedExchange> = HashMap::new();
        let mut with_post_data: Vec<String> = Vec::new();

        if let Some(requests) = self.requests.as_mut() {
            while let Some(Some(event)) = requests.next().now_or_never() {
                let request_id = event.request_id.inner().clone();
                let request = &event.request;
                if request.has_post_data.unwrap_or(false) {
                    with_post_data.push(request_id.clone());
                }

                // A redirect reuses the request id; the last hop wins.
                let exchange = ObservedExchange {
                    request_id: request_id.clone(),
                    method: request.method.clone(),
                    url: request.url.clone(),
                    request_headers: header_pairs(&request.headers),
                    request_body: None,
                    response: None,
                };
                if by_id.insert(request_id.clone(), exchange).is_none() {
                    order.push(request_id);
                }
            }
        }

        if let Some(responses) = self.responses.as_mut() {
            while let Some(Some(event)) = responses.next().now_or_never() {
                let Some(exchange) = by_id.get_mut(event.request_id.inner()) else {
                    continue;
                };
                let content_type = header_pairs(&event.response.headers)
                    .into_iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
                    .map(|(_, value)| value)
                    .unwrap_or_else(|| event.response.mime_type.clone());

                exchange.response = Some(ObservedResponse {
                    status: event.response.status,
                    content_type,
                });
            }
        }

        for request_id in with_post_data {
            let body = self.request_post_data(&request_id).await;
            if let Some(exchange) = by_id.get_mut(&request_id) {
                exchange.request_body = body;
            }
        }

        Ok(order
            .into_iter()
            .filter_map(|request_id| by_id.remove(&request_id))
            .collect())
    }

    async fn response_body(&mut self, exchange: &ObservedExchange) -> Result<Vec<u8>> {
        let page = self.page()?;
        let response = page
            .execute(GetResponseBodyParams::new(RequestId::new(
                exchange.request_id.clone(),
            )))
            .await
            .with_context(|| format!("Failed to read response body for {}", exchange.url))?;

        let body = &response.result;
        if body.base64_encoded {
            base64::engine::general_purpose::STANDARD
                .decode(body.body.as_bytes())
                .context("Response body is not valid base64")
        } else {
            Ok(body.body.clone().into_bytes())
        }
    }

    async fn release(mut self) -> CleanupResult {
        let mut errors = Vec::new();

        self.requests = None;
        self.responses = None;

        if let Some(page) = self.page.take() {
            debug!(target: "websec_surface::cleanup", "Closing instrumented page");
            if let Err(e) = page.close().await {
                warn!(target: "websec_surface::cleanup", "Failed to close page: {e}");
                errors.push(format!("Page close failed: {e}"));
            }
        }

        if let Some(mut browser) = self.browser.take() {
            debug!(target: "websec_surface::cleanup", "Closing browser");
            if let Err(e) = browser.close().await {
                warn!(target: "websec_surface::cleanup", "Failed to close browser: {e}");
                errors.push(format!("Browser close failed: {e}"));
            }

            // Wait for the process to exit so the profile directory is unlocked
            if let Err(e) = browser.wait().await {
                warn!(target: "websec_surface::cleanup", "Failed to wait for browser exit: {e}");
                errors.push(format!("Browser wait failed: {e}"));
            }
        }

        self.handler.abort();

        if let Some(profile_dir) = self.profile_dir.take() {
            let path = profile_dir.path().to_path_buf();
            if let Err(e) = profile_dir.close() {
                warn!(
                    target: "websec_surface::cleanup",
                    "Failed to remove browser profile {}: {e}",
                    path.display()
                );
                errors.push(format!("Profile cleanup failed: {e}"));
            }
        }

        if errors.is_empty() {
            CleanupResult::Success
        } else {
            CleanupResult::PartialFailure(errors)
        }
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Browser::drop kills a process that was never closed
        self.handler.abort();
        if self.browser.is_some() {
            warn!(
                target: "websec_surface::cleanup",
                "ChromiumSession dropped without release; killing browser"
            );
        }
    }
}

fn header_pairs(headers: &Headers) -> Vec<(String, String)> {
    headers
        .inner()
        .as_object()
        .map(|object| {
            object
                .iter()
                .map(|(name, value)| {
                    let value = value
                        .as_str()
                        .map_or_else(|| value.to_string(), str::to_string);
                    (name.clone(), value)
                })
                .collect()
        })
        .unwrap_or_default()
}
