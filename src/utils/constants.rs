//! Shared configuration constants for websec_surface
//!
//! Default values used by the config builder and the crawl components so the
//! same numbers are not repeated across modules.

/// User agent sent by the static crawler
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (sec-analyzer)";

/// Timeout for the root document fetch
///
/// A failure here aborts the whole static crawl, so it gets a little more
/// room than the per-asset fetches.
pub const ROOT_FETCH_TIMEOUT_SECS: u64 = 25;

/// Timeout for each linked script/stylesheet fetch
pub const ASSET_FETCH_TIMEOUT_SECS: u64 = 20;

/// Upper bound on browser page load
pub const PAGE_LOAD_TIMEOUT_SECS: u64 = 40;

/// Settle period after navigation so late XHR/fetch calls are observed
pub const TRAFFIC_SETTLE_SECS: u64 = 8;

/// Response content types kept by the traffic interceptor
pub const CAPTURED_CONTENT_TYPES: [&str; 3] = ["application/json", "text/plain", "application/xml"];

/// Length of the hex identity token shown next to each artifact
pub const IDENTITY_TOKEN_LEN: usize = 10;

/// Body substituted for a captured response whose bytes could not be read
pub const UNDECODABLE_BODY_SENTINEL: &str = "<binary payload>";

/// Default Ollama endpoint, overridden by `OLLAMA_HOST`
pub const DEFAULT_ANALYSIS_ENDPOINT: &str = "http://localhost:11434";

/// Default completion model
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemma3:4b";

/// Input longer than this many characters is truncated before analysis
pub const MAX_ANALYSIS_INPUT_CHARS: usize = 12_000;

/// Chrome user agent used by the instrumented browser
///
/// Kept close to current stable so sites serve their normal bundles instead
/// of a degraded bot page.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
