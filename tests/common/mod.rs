//! Test utilities and helper functions for the websec_surface test suite

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use mockito::{Mock, Server};
use tempfile::TempDir;
use websec_surface::{
    CleanupResult, ObservedExchange, ObservedResponse, ProbeSession, ScanConfig, TrafficProbe,
};

/// Creates a temporary directory for test output
#[allow(dead_code)]
pub fn create_test_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Config with no settle wait so interceptor tests run instantly
#[allow(dead_code)]
pub fn fast_config() -> ScanConfig {
    ScanConfig::builder()
        .settle_secs(0)
        .root_fetch_timeout_secs(5)
        .asset_fetch_timeout_secs(5)
        .page_load_timeout_secs(5)
        .build()
        .expect("Failed to create test config")
}

/// Page referencing one script and one stylesheet
#[allow(dead_code)]
pub fn page_with_assets(script: &str, stylesheet: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Target</title>
    <link rel="stylesheet" href="{stylesheet}">
    <link rel="icon" href="/favicon.ico">
</head>
<body>
    <script>inline()</script>
    <script src="{script}"></script>
</body>
</html>"#
    )
}

/// Creates a mock endpoint that returns HTML content
#[allow(dead_code)]
pub async fn create_html_mock(server: &mut Server, path: &str, html: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html)
        .create_async()
        .await
}

/// Creates a mock endpoint that returns a body with the given content type
#[allow(dead_code)]
pub async fn create_asset_mock(server: &mut Server, path: &str, content_type: &str, body: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", content_type)
        .with_body(body)
        .create_async()
        .await
}

/// Creates a mock endpoint that returns an error
#[allow(dead_code)]
pub async fn create_error_mock(server: &mut Server, path: &str, status: usize) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_body("Error")
        .create_async()
        .await
}

/// Helper to create test URLs
#[allow(dead_code)]
pub fn test_url(server: &Server, path: &str) -> String {
    format!("{}{}", server.url(), path)
}

/// Exchange with a response of the given content type
#[allow(dead_code)]
pub fn exchange(id: &str, method: &str, url: &str, content_type: &str) -> ObservedExchange {
    ObservedExchange {
        request_id: id.to_string(),
        method: method.to_string(),
        url: url.to_string(),
        request_headers: vec![("Accept".to_string(), "*/*".to_string())],
        request_body: None,
        response: Some(ObservedResponse {
            status: 200,
            content_type: content_type.to_string(),
        }),
    }
}

/// In-memory browser stand-in.
///
/// Replays a fixed set of exchanges and counts acquisitions and releases so
/// tests can check the session was always torn down.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct FakeProbe {
    pub exchanges: Vec<ObservedExchange>,
    /// Response bodies by request id; an `Err` simulates an unreadable body
    pub bodies: HashMap<String, Result<Vec<u8>, String>>,
    pub fail_acquire: bool,
    pub fail_navigation: bool,
    pub hang_navigation: bool,
    /// Every body read stalls for this long before answering
    pub body_delay: Option<std::time::Duration>,
    pub acquired: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
    pub navigated_to: Arc<std::sync::Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl FakeProbe {
    pub fn with_exchange(mut self, exchange: ObservedExchange, body: &[u8]) -> Self {
        self.bodies
            .insert(exchange.request_id.clone(), Ok(body.to_vec()));
        self.exchanges.push(exchange);
        self
    }

    pub fn with_unreadable_exchange(mut self, exchange: ObservedExchange) -> Self {
        self.bodies.insert(
            exchange.request_id.clone(),
            Err("No resource with given identifier found".to_string()),
        );
        self.exchanges.push(exchange);
        self
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

pub struct FakeSession {
    probe: FakeProbe,
}

impl TrafficProbe for FakeProbe {
    type Session = FakeSession;

    async fn acquire(&self) -> Result<FakeSession> {
        if self.fail_acquire {
            anyhow::bail!("Chrome/Chromium executable not found");
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            probe: self.clone(),
        })
    }
}

impl ProbeSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.probe
            .navigated_to
            .lock()
            .unwrap()
            .push(url.to_string());
        if self.probe.hang_navigation {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        }
        if self.probe.fail_navigation {
            anyhow::bail!("net::ERR_NAME_NOT_RESOLVED");
        }
        Ok(())
    }

    async fn exchanges(&mut self) -> Result<Vec<ObservedExchange>> {
        Ok(self.probe.exchanges.clone())
    }

    async fn response_body(&mut self, exchange: &ObservedExchange) -> Result<Vec<u8>> {
        if let Some(delay) = self.probe.body_delay {
            tokio::time::sleep(delay).await;
        }
        match self.probe.bodies.get(&exchange.request_id) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(message)) => Err(anyhow::anyhow!(message.clone())),
            None => anyhow::bail!("No body recorded for {}", exchange.url),
        }
    }

    async fn release(self) -> CleanupResult {
        self.probe.released.fetch_add(1, Ordering::SeqCst);
        CleanupResult::Success
    }
}
