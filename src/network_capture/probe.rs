//! The seam between the traffic interceptor and a browser engine.
//!
//! A [`TrafficProbe`] hands out exclusive sessions; a [`ProbeSession`]
//! navigates, reports what it saw on the wire and reads response bodies.
//! The interceptor owns acquisition and release, so every engine gets the
//! same release-on-every-path behaviour.

use anyhow::Result;

use super::types::ObservedExchange;

/// Outcome of tearing a session down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

#[allow(async_fn_in_trait)]
pub trait TrafficProbe {
    type Session: ProbeSession;

    /// Start an exclusive, instrumented browser session
    async fn acquire(&self) -> Result<Self::Session>;
}

#[allow(async_fn_in_trait)]
pub trait ProbeSession {
    /// Load `url`, returning once the page has loaded
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Every exchange observed since the session started, in request order
    async fn exchanges(&mut self) -> Result<Vec<ObservedExchange>>;

    /// Raw response body for an observed exchange
    async fn response_body(&mut self, exchange: &ObservedExchange) -> Result<Vec<u8>>;

    /// Shut the session down. Must not fail; problems are reported in the
    /// returned value.
    async fn release(self) -> CleanupResult;
}
