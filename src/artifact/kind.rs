//! Artifact classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a collected artifact is.
///
/// Fixed when the artifact is created and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Html,
    Js,
    Css,
    ApiRequest,
    ApiResponse,
    Other,
}

impl ArtifactKind {
    /// Kinds whose payload is always decoded text.
    ///
    /// `Other` is absent: it carries text only when the source declared a
    /// textual content type.
    #[must_use]
    pub const fn is_always_text(self) -> bool {
        !matches!(self, Self::Other)
    }

    /// File extension hint used when naming stored files
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Js => "js",
            Self::Css => "css",
            Self::ApiRequest | Self::ApiResponse => "txt",
            Self::Other => "bin",
        }
    }

    /// Short description handed to the analysis backend
    #[must_use]
    pub const fn role(self) -> &'static str {
        match self {
            Self::Html => "HTML document",
            Self::Js => "JavaScript file",
            Self::Css => "CSS stylesheet",
            Self::ApiRequest => "captured API request",
            Self::ApiResponse => "captured API response",
            Self::Other => "file",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Js => "js",
            Self::Css => "css",
            Self::ApiRequest => "api_request",
            Self::ApiResponse => "api_response",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
