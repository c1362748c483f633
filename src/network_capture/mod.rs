//! Browser-driven observation of a page's network traffic

pub mod chromium;
pub mod probe;
pub mod types;

pub use chromium::{ChromiumProbe, ChromiumSession};
pub use probe::{CleanupResult, ProbeSession, TrafficProbe};
pub use types::{ObservedExchange, ObservedResponse};
