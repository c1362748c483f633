//! End-to-end session flows with a mock server and an in-memory probe

use mockito::Server;
use websec_surface::{
    AnalysisConfig, Analyzer, ArtifactKind, CompletionBackend, CompletionRequest, CrawlError,
    ScanSession, UploadedFile,
};

mod common;
use common::{FakeProbe, create_asset_mock, create_html_mock, exchange, fast_config, test_url};

struct EchoBackend;

impl CompletionBackend for EchoBackend {
    async fn generate(&self, request: &CompletionRequest) -> anyhow::Result<String> {
        Ok(format!("analysed {} tokens", request.max_tokens))
    }
}

#[tokio::test]
async fn test_crawl_target_collects_both_paths() {
    let mut server = Server::new_async().await;
    let html = common::page_with_assets("/app.js", "/site.css");
    let _root = create_html_mock(&mut server, "/", &html).await;
    let _js = create_asset_mock(&mut server, "/app.js", "application/javascript", "x()").await;
    let _css = create_asset_mock(&mut server, "/site.css", "text/css", "a{}").await;

    let probe = FakeProbe::default().with_exchange(
        exchange("1", "GET", &test_url(&server, "/api/me"), "application/json"),
        b"{\"id\":1}",
    );
    let mut session = ScanSession::new(fast_config()).unwrap();

    let report = session.crawl_target(&test_url(&server, "/"), &probe).await.unwrap();

    assert_eq!(report.added, 5);
    let kinds: Vec<_> = session.collection().all().iter().map(|a| a.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ArtifactKind::Html,
            ArtifactKind::Css,
            ArtifactKind::Js,
            ArtifactKind::ApiRequest,
            ArtifactKind::ApiResponse,
        ]
    );
    assert!(session
        .collection()
        .all()
        .iter()
        .all(|a| a.location().starts_with(session.workspace())));
}

#[tokio::test]
async fn test_failed_static_crawl_leaves_collection_unchanged() {
    let mut server = Server::new_async().await;
    let _root = common::create_error_mock(&mut server, "/", 503).await;
    let probe = FakeProbe::default();
    let mut session = ScanSession::new(fast_config()).unwrap();

    let err = session.crawl_target(&test_url(&server, "/"), &probe).await.unwrap_err();

    assert!(matches!(err, CrawlError::RootFetch { .. }));
    assert!(session.collection().is_empty());
    assert_eq!(probe.acquired(), 0);
}

#[tokio::test]
async fn test_failed_capture_keeps_static_artifacts() {
    let mut server = Server::new_async().await;
    let _root = create_html_mock(&mut server, "/", "<html><body>hi</body></html>").await;
    let probe = FakeProbe {
        fail_navigation: true,
        ..FakeProbe::default()
    };
    let mut session = ScanSession::new(fast_config()).unwrap();

    let err = session.crawl_target(&test_url(&server, "/"), &probe).await.unwrap_err();

    assert!(matches!(err, CrawlError::Navigation { .. }));
    assert_eq!(session.collection().len(), 1);
    assert_eq!(probe.released(), 1);
}

#[tokio::test]
async fn test_two_crawls_of_same_target_do_not_collide() {
    let mut server = Server::new_async().await;
    let _root = create_html_mock(&mut server, "/", "<html></html>").await;
    let mut session = ScanSession::new(fast_config()).unwrap();

    session.crawl_static(&test_url(&server, "/")).await.unwrap();
    let second = session.crawl_static(&test_url(&server, "/")).await.unwrap();

    assert_eq!(second.added, 1);
    assert!(second.rejected.is_empty());
    assert_eq!(session.collection().len(), 2);
}

#[tokio::test]
async fn test_uploads_and_lazy_analysis() {
    let mut session = ScanSession::new(fast_config()).unwrap();
    let report = session
        .add_uploads(vec![
            UploadedFile::new("login.js", b"fetch('/api/login')".to_vec()),
            UploadedFile::new("logo.png", vec![0x89, b'P', b'N', b'G']),
            UploadedFile::new("login.js", b"second copy".to_vec()),
        ])
        .await;
    assert_eq!(report.added, 3);
    assert!(report.failed.is_empty());

    let analyzer = Analyzer::new(EchoBackend, AnalysisConfig::default());
    assert_eq!(session.summarize_pending(&analyzer).await, 2);
    assert_eq!(session.summarize_pending(&analyzer).await, 0);

    let views: Vec<_> = session.collection().views().collect();
    assert_eq!(views[0].summary, Some("analysed 300 tokens"));
    assert_eq!(views[1].summary, None);
    assert!(!views[1].analyzable);
    assert!(views.iter().all(|view| view.origin.is_none()));
    drop(views);

    assert_eq!(
        session.deep_dive(1, &analyzer).await,
        Some("analysed 700 tokens")
    );
    assert_eq!(session.deep_dive(2, &analyzer).await, None);
    assert_eq!(session.deep_dive(0, &analyzer).await, None);
    assert_eq!(session.deep_dive(99, &analyzer).await, None);
}

#[tokio::test]
async fn test_renamed_duplicate_upload_never_overwrites() {
    let mut session = ScanSession::new(fast_config()).unwrap();
    let report = session
        .add_uploads(vec![
            UploadedFile::new("a.js", b"first".to_vec()),
            UploadedFile::new("3_a.js", b"second".to_vec()),
            UploadedFile::new("a.js", b"third".to_vec()),
        ])
        .await;

    assert_eq!(report.added, 3);
    assert!(report.failed.is_empty());

    let texts: Vec<_> = session.collection().all().iter().map(|a| a.text()).collect();
    assert_eq!(texts, vec![Some("first"), Some("second"), Some("third")]);
    for artifact in session.collection().all() {
        let on_disk = tokio::fs::read(artifact.location()).await.unwrap();
        assert_eq!(on_disk, artifact.bytes());
    }
}

#[tokio::test]
async fn test_export_copies_bytes() {
    let mut session = ScanSession::new(fast_config()).unwrap();
    session
        .add_uploads(vec![UploadedFile::new("style.css", b"a{}".to_vec())])
        .await;
    let out = common::create_test_dir().unwrap();

    let written = session.export_to(out.path()).await.unwrap();

    assert_eq!(written.len(), 1);
    assert!(written[0].ends_with("001_style.css"));
    assert_eq!(tokio::fs::read(&written[0]).await.unwrap(), b"a{}");
}

#[tokio::test]
async fn test_workspace_removed_with_session() {
    let session = ScanSession::new(fast_config()).unwrap();
    let workspace = session.workspace().to_path_buf();
    assert!(workspace.exists());
    drop(session);
    assert!(!workspace.exists());
}
