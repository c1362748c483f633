//! Security commentary for collected artifacts.
//!
//! A thin adapter over a text-completion service: a short summary per text
//! artifact and an on-demand deep dive. Failures never propagate; they are
//! returned as displayable sentinel text.

pub mod analyzer;
pub mod backend;
pub mod prompts;

pub use analyzer::{Analyzer, truncate_chars};
pub use backend::{CompletionBackend, CompletionRequest, OllamaBackend};
