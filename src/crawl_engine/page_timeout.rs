//! Timeout wrapper for browser operations
//!
//! Navigation against a hostile or broken target can hang forever; every
//! browser await in the interceptor goes through [`with_page_timeout`] or
//! [`with_deadline`].

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Run `operation` with a deadline of `timeout_secs`.
///
/// The error message names the operation and says whether the deadline was
/// hit or the operation itself failed.
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout_secs: u64,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {timeout_secs} seconds"
        )),
    }
}

/// Run `operation` until the shared `deadline`.
///
/// For a series of operations that together get one budget.
pub async fn with_deadline<F, T>(operation: F, deadline: Instant, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout_at(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!("{operation_name} deadline passed")),
    }
}
