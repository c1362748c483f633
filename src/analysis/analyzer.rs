//! Summary and deep-dive generation over a completion backend.
//!
//! Neither operation ever fails. Oversized input is truncated, and a backend
//! error comes back as an `[LLM error: ...]` string that callers store and
//! display like any other result.

use tracing::{debug, warn};

use super::backend::{CompletionBackend, CompletionRequest};
use super::prompts::{deep_dive_prompt, summary_prompt};
use crate::artifact::{Artifact, ArtifactKind};
use crate::config::AnalysisConfig;

pub struct Analyzer<B> {
    backend: B,
    config: AnalysisConfig,
}

impl<B: CompletionBackend> Analyzer<B> {
    pub fn new(backend: B, config: AnalysisConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Short security summary of `text`, described to the model as `role`
    pub async fn summarize(&self, text: &str, role: &str) -> String {
        let input = truncate_chars(text, self.config.max_input_chars);
        let request = CompletionRequest {
            prompt: summary_prompt(role, input),
            temperature: self.config.summary_temperature,
            max_tokens: self.config.summary_max_tokens,
        };
        self.complete(&request).await
    }

    /// Longer OWASP-oriented analysis of `text`
    pub async fn analyze(&self, text: &str, kind: ArtifactKind) -> String {
        let input = truncate_chars(text, self.config.max_input_chars);
        let request = CompletionRequest {
            prompt: deep_dive_prompt(kind.as_str(), input),
            temperature: self.config.deep_dive_temperature,
            max_tokens: self.config.deep_dive_max_tokens,
        };
        self.complete(&request).await
    }

    /// Fill in the summary of a text artifact that has none yet.
    ///
    /// Returns `true` when a summary was written. Binary artifacts and
    /// artifacts that already carry a summary are left alone.
    pub async fn summarize_artifact(&self, artifact: &mut Artifact) -> bool {
        if artifact.summary().is_some() {
            return false;
        }
        let Some(text) = artifact.text() else {
            return false;
        };

        let summary = self.summarize(text, artifact.kind().role()).await;
        match artifact.set_summary(summary) {
            Ok(()) => true,
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }

    /// Deep-dive details for an artifact, computed on first request and
    /// returned from the artifact afterwards. `None` for binary artifacts.
    pub async fn deep_dive_artifact<'a>(&self, artifact: &'a mut Artifact) -> Option<&'a str> {
        if artifact.details().is_none() {
            let text = artifact.text()?;
            let details = self.analyze(text, artifact.kind()).await;
            if let Err(e) = artifact.set_details(details) {
                warn!("{e}");
                return None;
            }
        } else {
            debug!("Using cached deep dive for {}", artifact.display_name());
        }
        artifact.details()
    }

    async fn complete(&self, request: &CompletionRequest) -> String {
        match self.backend.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Completion backend failed: {e:#}");
                format!("[LLM error: {e:#}]")
            }
        }
    }
}

/// First `max_chars` characters of `text`, cut on a char boundary
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Payload;
    use std::sync::Mutex;

    /// Records prompts and replies with a fixed result
    struct Recorder {
        reply: Result<String, String>,
        prompts: Mutex<Vec<CompletionRequest>>,
    }

    impl Recorder {
        fn replying(reply: Result<&str, &str>) -> Self {
            Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl CompletionBackend for Recorder {
        async fn generate(&self, request: &CompletionRequest) -> anyhow::Result<String> {
            self.prompts.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    fn analyzer(reply: Result<&str, &str>) -> Analyzer<Recorder> {
        Analyzer::new(Recorder::replying(reply), AnalysisConfig::default())
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[tokio::test]
    async fn test_error_becomes_sentinel() {
        let analyzer = analyzer(Err("connection refused"));
        let summary = analyzer.summarize("var a = 1;", "JavaScript file").await;
        assert_eq!(summary, "[LLM error: connection refused]");
    }

    #[tokio::test]
    async fn test_oversized_input_is_truncated() {
        let mut config = AnalysisConfig::default();
        config.max_input_chars = 5;
        let analyzer = Analyzer::new(Recorder::replying(Ok("ok")), config);

        analyzer.analyze("0123456789", ArtifactKind::Js).await;

        let prompts = analyzer.backend.prompts.lock().unwrap();
        assert!(prompts[0].prompt.contains("01234\n"));
        assert!(!prompts[0].prompt.contains("012345"));
        assert_eq!(prompts[0].max_tokens, 700);
    }

    #[tokio::test]
    async fn test_summary_written_once() {
        let analyzer = analyzer(Ok("looks fine"));
        let mut artifact =
            Artifact::new("/s/a.js", ArtifactKind::Js, None, Payload::Text("x()".into())).unwrap();

        assert!(analyzer.summarize_artifact(&mut artifact).await);
        assert!(!analyzer.summarize_artifact(&mut artifact).await);
        assert_eq!(artifact.summary(), Some("looks fine"));
        assert_eq!(analyzer.backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_binary_artifact_never_sent() {
        let analyzer = analyzer(Ok("unused"));
        let mut artifact =
            Artifact::new("/s/logo.png", ArtifactKind::Other, None, Payload::Binary(vec![0x89]))
                .unwrap();

        assert!(!analyzer.summarize_artifact(&mut artifact).await);
        assert!(analyzer.deep_dive_artifact(&mut artifact).await.is_none());
        assert_eq!(analyzer.backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_deep_dive_cached() {
        let analyzer = analyzer(Ok("details"));
        let mut artifact =
            Artifact::new("/s/index.html", ArtifactKind::Html, None, Payload::Text("<p>".into()))
                .unwrap();

        assert_eq!(analyzer.deep_dive_artifact(&mut artifact).await, Some("details"));
        assert_eq!(analyzer.deep_dive_artifact(&mut artifact).await, Some("details"));
        assert_eq!(analyzer.backend.calls(), 1);
    }
}
