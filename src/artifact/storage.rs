//! Writing artifact bytes to the session workspace

use std::path::Path;

use tokio::io::AsyncWriteExt;

use super::{Artifact, ArtifactError, ArtifactKind, Payload};

/// Write `payload` to `dir/file_name` and return the artifact describing it.
///
/// The payload/kind check runs before anything is written, so a rejected
/// artifact never leaves a file behind. An existing file at the location is
/// never replaced: storing there fails with [`ArtifactError::Storage`].
pub async fn persist_artifact(
    dir: &Path,
    file_name: &str,
    kind: ArtifactKind,
    origin: Option<String>,
    payload: Payload,
) -> Result<Artifact, ArtifactError> {
    let location = dir.join(file_name);
    let artifact = Artifact::new(location.clone(), kind, origin, payload)?;

    let storage_error = |source| ArtifactError::Storage {
        path: location.clone(),
        source,
    };
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&location)
        .await
        .map_err(storage_error)?;
    file.write_all(artifact.bytes()).await.map_err(storage_error)?;
    file.flush().await.map_err(storage_error)?;

    tracing::debug!(
        "Stored {} artifact {} ({} bytes)",
        kind,
        location.display(),
        artifact.bytes().len()
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_writes_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = persist_artifact(
            dir.path(),
            "app.js",
            ArtifactKind::Js,
            Some("https://example.com/app.js".into()),
            Payload::Text("let a = '\u{e9}';".into()),
        )
        .await
        .unwrap();

        let on_disk = tokio::fs::read(artifact.location()).await.unwrap();
        assert_eq!(on_disk, artifact.bytes());
        assert_eq!(artifact.identity(), &crate::artifact::identify(&on_disk));
    }

    #[tokio::test]
    async fn test_rejected_payload_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let result = persist_artifact(
            dir.path(),
            "style.css",
            ArtifactKind::Css,
            None,
            Payload::Binary(vec![0, 1]),
        )
        .await;
        assert!(result.is_err());
        assert!(!dir.path().join("style.css").exists());
    }

    #[tokio::test]
    async fn test_existing_file_is_never_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let first = persist_artifact(dir.path(), "a.js", ArtifactKind::Js, None, Payload::Text("first".into()))
            .await
            .unwrap();

        let err = persist_artifact(dir.path(), "a.js", ArtifactKind::Js, None, Payload::Text("second".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, ArtifactError::Storage { .. }));
        let on_disk = tokio::fs::read(first.location()).await.unwrap();
        assert_eq!(on_disk, b"first");
    }
}
