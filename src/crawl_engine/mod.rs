//! Crawl Engine Module
//!
//! The two acquisition paths: a passive static crawl of the root document and
//! its linked assets, and a browser-driven capture of the API traffic the page
//! generates. Both write into a caller-provided storage directory and return
//! artifacts plus the items they had to skip.

// Sub-modules
pub mod asset_links;
pub mod crawl_types;
pub mod page_timeout;
pub mod static_crawler;
pub mod traffic_interceptor;

// Re-exports for public API
pub use asset_links::{AssetReference, extract_asset_references};
pub use crawl_types::{CrawlError, CrawlResult, SkippedItem, StaticCrawl, TrafficCapture};
pub use page_timeout::{with_deadline, with_page_timeout};
pub use static_crawler::{ROOT_DOCUMENT_NAME, asset_file_name, build_http_client, crawl_static};
pub use traffic_interceptor::{capture_traffic, exchange_file_names, is_captured_content_type};
