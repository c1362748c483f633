//! The append-only artifact collection for one scan session.
//!
//! Insertion order is preserved and is the order the presentation layer
//! shows. There is no removal: the session drops the whole collection when it
//! ends.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::artifact::{Artifact, ArtifactKind, IdentityToken};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error("An artifact is already stored at {}", .0.display())]
    DuplicateLocation(PathBuf),
}

#[derive(Debug, Default)]
pub struct ArtifactCollection {
    artifacts: Vec<Artifact>,
    locations: HashSet<PathBuf>,
}

impl ArtifactCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an artifact, returning its zero-based index.
    ///
    /// Rejects an artifact whose location is already taken. Identical content
    /// at two different locations is accepted.
    pub fn add(&mut self, artifact: Artifact) -> Result<usize, CollectionError> {
        if !self.locations.insert(artifact.location().to_path_buf()) {
            return Err(CollectionError::DuplicateLocation(
                artifact.location().to_path_buf(),
            ));
        }
        self.artifacts.push(artifact);
        Ok(self.artifacts.len() - 1)
    }

    /// Append every artifact, returning the rejections
    pub fn extend<I>(&mut self, artifacts: I) -> Vec<CollectionError>
    where
        I: IntoIterator<Item = Artifact>,
    {
        let mut rejected = Vec::new();
        for artifact in artifacts {
            if let Err(e) = self.add(artifact) {
                tracing::warn!("Rejected artifact: {e}");
                rejected.push(e);
            }
        }
        rejected
    }

    /// All artifacts in insertion order
    #[must_use]
    pub fn all(&self) -> &[Artifact] {
        &self.artifacts
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Artifact> {
        self.artifacts.get(index)
    }

    /// Mutable access for the analysis caller to fill `summary`/`details`
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Artifact> {
        self.artifacts.get_mut(index)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Artifact> {
        self.artifacts.iter_mut()
    }

    #[must_use]
    pub fn contains_location(&self, location: &Path) -> bool {
        self.locations.contains(location)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Read-only presentation view, in insertion order
    pub fn views(&self) -> impl Iterator<Item = ArtifactView<'_>> {
        self.artifacts
            .iter()
            .enumerate()
            .map(|(index, artifact)| ArtifactView::new(index + 1, artifact))
    }
}

/// What the presentation layer needs from one artifact
#[derive(Debug, Clone)]
pub struct ArtifactView<'a> {
    pub position: usize,
    pub kind: ArtifactKind,
    pub display_name: String,
    pub identity: &'a IdentityToken,
    pub origin: Option<&'a str>,
    pub captured_at: DateTime<Utc>,
    pub summary: Option<&'a str>,
    pub details: Option<&'a str>,
    pub analyzable: bool,
    pub bytes: &'a [u8],
}

impl<'a> ArtifactView<'a> {
    fn new(position: usize, artifact: &'a Artifact) -> Self {
        Self {
            position,
            kind: artifact.kind(),
            display_name: artifact.display_name(),
            identity: artifact.identity(),
            origin: artifact.origin(),
            captured_at: artifact.captured_at(),
            summary: artifact.summary(),
            details: artifact.details(),
            analyzable: artifact.is_analyzable(),
            bytes: artifact.bytes(),
        }
    }

    /// Heading line, e.g. `3. [JS] 4f2a9c01de.js (9b1c0e77aa)`
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}. [{}] {} ({})",
            self.position,
            self.kind.as_str().to_uppercase(),
            self.display_name,
            self.identity
        )
    }
}
