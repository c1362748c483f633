pub mod analysis;
pub mod artifact;
pub mod browser_setup;
pub mod collection;
pub mod config;
pub mod crawl_engine;
pub mod network_capture;
pub mod session;
pub mod utils;

pub use analysis::{Analyzer, CompletionBackend, CompletionRequest, OllamaBackend};
pub use artifact::{Artifact, ArtifactError, ArtifactKind, IdentityToken, Payload, identify};
pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use collection::{ArtifactCollection, ArtifactView, CollectionError};
pub use config::{AnalysisConfig, ConfigError, ScanConfig, ScanConfigBuilder};
pub use crawl_engine::{
    CrawlError, CrawlResult, SkippedItem, StaticCrawl, TrafficCapture, capture_traffic,
    crawl_static,
};
pub use network_capture::{
    ChromiumProbe, ChromiumSession, CleanupResult, ObservedExchange, ObservedResponse,
    ProbeSession, TrafficProbe,
};
pub use session::{CrawlReport, ScanSession, UploadFailure, UploadReport, UploadedFile};
pub use utils::{is_fetchable_url, normalize_url, resolve_url};
