//! Artifact payloads: decoded text or opaque bytes, never both.

/// Bytes of a collected artifact.
///
/// Text payloads are valid UTF-8 by construction; sources are decoded
/// lossily (invalid sequences become U+FFFD) before they get here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    /// Decode raw bytes, replacing invalid UTF-8 sequences
    #[must_use]
    pub fn lossy_text(bytes: &[u8]) -> Self {
        Self::Text(String::from_utf8_lossy(bytes).into_owned())
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// The bytes exactly as they are written to storage
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}
