//! Collected evidence.
//!
//! An [`Artifact`] is one captured unit: the root document, a linked script
//! or stylesheet, one half of an API exchange, or a user upload. Everything
//! but the analysis fields is fixed at construction; re-fetching produces a
//! new artifact instead of mutating an existing one.

pub mod identity;
pub mod kind;
pub mod payload;
pub mod storage;

pub use identity::{IdentityToken, identify};
pub use kind::ArtifactKind;
pub use payload::Payload;
pub use storage::persist_artifact;

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while building or annotating an artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// A text-bearing kind was given a binary payload
    #[error("{kind} artifacts must carry a text payload")]
    BinaryPayloadForTextKind { kind: ArtifactKind },

    /// Binary artifacts are never analysed
    #[error("Artifact {} has a binary payload and cannot be annotated", .0.display())]
    NotAnalyzable(PathBuf),

    /// Writing the artifact bytes failed
    #[error("Failed to store artifact at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Artifact {
    location: PathBuf,
    kind: ArtifactKind,
    origin: Option<String>,
    payload: Payload,
    identity: IdentityToken,
    captured_at: DateTime<Utc>,
    summary: Option<String>,
    details: Option<String>,
}

impl Artifact {
    /// Build an artifact, checking that the payload variant fits the kind.
    ///
    /// Does not touch the filesystem; see [`persist_artifact`] for the
    /// write-then-build path the crawlers use.
    pub fn new(
        location: impl Into<PathBuf>,
        kind: ArtifactKind,
        origin: Option<String>,
        payload: Payload,
    ) -> Result<Self, ArtifactError> {
        if kind.is_always_text() && !payload.is_text() {
            return Err(ArtifactError::BinaryPayloadForTextKind { kind });
        }

        let identity = identify(payload.as_bytes());
        Ok(Self {
            location: location.into(),
            kind,
            origin,
            payload,
            identity,
            captured_at: Utc::now(),
            summary: None,
            details: None,
        })
    }

    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Source URL; `None` for uploads
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Decoded text, or `None` for binary payloads
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.payload.as_text()
    }

    /// Raw stored bytes (what a download hands out)
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.payload.as_bytes()
    }

    #[must_use]
    pub fn identity(&self) -> &IdentityToken {
        &self.identity
    }

    #[must_use]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// File name of the stored location
    #[must_use]
    pub fn display_name(&self) -> String {
        self.location
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.location.display().to_string())
    }

    #[must_use]
    pub fn is_analyzable(&self) -> bool {
        self.payload.is_text()
    }

    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    #[must_use]
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Store a summary. Overwrites any previous value; the analyzer is the
    /// one that keeps this write-once.
    pub fn set_summary(&mut self, summary: String) -> Result<(), ArtifactError> {
        if !self.is_analyzable() {
            return Err(ArtifactError::NotAnalyzable(self.location.clone()));
        }
        self.summary = Some(summary);
        Ok(())
    }

    /// Store deep-dive details. Same overwrite rules as [`Self::set_summary`].
    pub fn set_details(&mut self, details: String) -> Result<(), ArtifactError> {
        if !self.is_analyzable() {
            return Err(ArtifactError::NotAnalyzable(self.location.clone()));
        }
        self.details = Some(details);
        Ok(())
    }
}
