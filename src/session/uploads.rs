//! User-supplied files
//!
//! Uploads skip both crawlers: they are classified by declared media type or
//! file name and stored as artifacts with no origin.

use std::path::Path;

use anyhow::{Context, Result};

use crate::artifact::{Artifact, ArtifactError, ArtifactKind, Payload, persist_artifact};

/// A file handed in by the user
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Media type declared by whoever supplied the file, if any
    pub media_type: Option<String>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            media_type: None,
        }
    }

    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Read a local file, naming the upload after its file name
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read upload {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("Upload path has no file name: {}", path.display()))?;
        Ok(Self::new(name, bytes))
    }

    /// Declared media type, or one guessed from the file name
    #[must_use]
    pub fn effective_media_type(&self) -> Option<String> {
        self.media_type
            .clone()
            .filter(|mt| !mt.trim().is_empty())
            .or_else(|| mime_guess::from_path(&self.name).first_raw().map(str::to_string))
    }
}

/// Classify an upload into `js`, `css`, `html` or `other`.
///
/// The media type is checked first, then the file extension.
#[must_use]
pub fn classify_upload(name: &str, media_type: Option<&str>) -> ArtifactKind {
    let media_type = media_type.unwrap_or_default().to_ascii_lowercase();
    let extension = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if media_type.contains("javascript") || extension == "js" {
        ArtifactKind::Js
    } else if media_type.contains("css") || extension == "css" {
        ArtifactKind::Css
    } else if media_type.contains("html") || matches!(extension.as_str(), "html" | "htm") {
        ArtifactKind::Html
    } else {
        ArtifactKind::Other
    }
}

/// Whether an `other` upload with this media type is stored as text
#[must_use]
pub fn is_textual_media_type(media_type: &str) -> bool {
    let media_type = media_type.to_ascii_lowercase();
    media_type.starts_with("text/")
        || ["json", "xml", "javascript", "ecmascript", "yaml", "x-www-form-urlencoded"]
            .iter()
            .any(|marker| media_type.contains(marker))
}

/// Storage name for an upload: sanitized, never empty
#[must_use]
pub fn upload_file_name(name: &str) -> String {
    let sanitized = sanitize_filename::sanitize(name);
    if sanitized.trim().is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}

/// Classify `file` and store it under `dir/file_name`
pub async fn store_upload(
    dir: &Path,
    file_name: &str,
    file: UploadedFile,
) -> Result<Artifact, ArtifactError> {
    let media_type = file.effective_media_type();
    let kind = classify_upload(&file.name, media_type.as_deref());

    let as_text = kind.is_always_text() || media_type.as_deref().is_some_and(is_textual_media_type);
    let payload = if as_text {
        Payload::lossy_text(&file.bytes)
    } else {
        Payload::Binary(file.bytes)
    };

    persist_artifact(dir, file_name, kind, None, payload).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(classify_upload("bundle.JS", None), ArtifactKind::Js);
        assert_eq!(classify_upload("site.css", None), ArtifactKind::Css);
        assert_eq!(classify_upload("page.htm", None), ArtifactKind::Html);
        assert_eq!(classify_upload("data.json", None), ArtifactKind::Other);
        assert_eq!(classify_upload("README", None), ArtifactKind::Other);
    }

    #[test]
    fn test_declared_media_type_wins() {
        assert_eq!(
            classify_upload("payload.bin", Some("application/javascript")),
            ArtifactKind::Js
        );
        assert_eq!(classify_upload("x", Some("text/html; charset=utf-8")), ArtifactKind::Html);
    }

    #[test]
    fn test_textual_media_types() {
        assert!(is_textual_media_type("application/json"));
        assert!(is_textual_media_type("text/plain"));
        assert!(is_textual_media_type("image/svg+xml"));
        assert!(!is_textual_media_type("image/png"));
        assert!(!is_textual_media_type("application/octet-stream"));
    }

    #[test]
    fn test_upload_file_name_strips_path_separators() {
        let name = upload_file_name("../../etc/passwd");
        assert!(!name.contains('/'));
        assert_eq!(upload_file_name("///"), "upload");
    }

    #[tokio::test]
    async fn test_json_upload_stored_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let file = UploadedFile::new("config.json", b"{\"debug\":true}".to_vec());
        let artifact = store_upload(dir.path(), "config.json", file).await.unwrap();

        assert_eq!(artifact.kind(), ArtifactKind::Other);
        assert_eq!(artifact.text(), Some("{\"debug\":true}"));
        assert!(artifact.origin().is_none());
    }

    #[tokio::test]
    async fn test_png_upload_stored_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = vec![0x89, b'P', b'N', b'G', 0xff];
        let file = UploadedFile::new("logo.png", bytes.clone());
        let artifact = store_upload(dir.path(), "logo.png", file).await.unwrap();

        assert!(!artifact.is_analyzable());
        assert_eq!(artifact.bytes(), bytes.as_slice());
    }

    #[tokio::test]
    async fn test_invalid_utf8_script_decoded_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let file = UploadedFile::new("a.js", vec![b'x', 0xff, b'y']);
        let artifact = store_upload(dir.path(), "a.js", file).await.unwrap();
        assert_eq!(artifact.text(), Some("x\u{fffd}y"));
    }
}
