mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use webrev_audit::extract::{ExtractionError, Extractor, MAX_PAGE_BYTES};

use common::{spawn, SAMPLE_PAGE};

fn html(body: impl Into<Body>) -> Response {
    Response::builder()
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(body.into())
        .unwrap()
}

async fn test_server() -> String {
    let oversized = "a".repeat(MAX_PAGE_BYTES + 1);
    let oversized_stream = oversized.clone();

    let app = Router::new()
        .route("/", get(|| async { html(SAMPLE_PAGE) }))
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "gone").into_response() }),
        )
        .route(
            "/json",
            get(|| async {
                Response::builder()
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap()
            }),
        )
        .route(
            "/untyped",
            get(|| async {
                Response::builder()
                    .body(Body::from("<p>hi</p>"))
                    .unwrap()
            }),
        )
        .route(
            "/huge",
            get(move || {
                let body = oversized.clone();
                async move { html(body) }
            }),
        )
        .route(
            "/huge-chunked",
            get(move || {
                let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
                    vec![Ok(oversized_stream.clone().into_bytes())];
                async move { html(Body::from_stream(tokio_stream::iter(chunks))) }
            }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                html(SAMPLE_PAGE)
            }),
        );

    let addr = spawn(app).await;
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_extracts_sample_page() {
    let base = test_server().await;
    let page = Extractor::new().unwrap().extract(&format!("{base}/")).await.unwrap();

    assert_eq!(page.title, "Acme Widgets");
    assert_eq!(page.description, "Widgets for everyone");
    assert_eq!(page.headings.len(), 1);
    assert_eq!(page.image_count, 2);
    assert_eq!(page.images.len(), 2);
    assert_eq!(page.content.len(), 3);
    assert_eq!(page.url, format!("{base}/"));
    assert_eq!(page.raw_size_bytes, SAMPLE_PAGE.len());
}

#[tokio::test]
async fn test_non_success_status_is_propagated() {
    let base = test_server().await;
    let err = Extractor::new()
        .unwrap()
        .extract(&format!("{base}/missing"))
        .await
        .unwrap_err();
    match err {
        ExtractionError::FetchFailed { status, reason } => {
            assert_eq!(status, Some(404));
            assert_eq!(reason, "Not Found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rejects_non_html() {
    let base = test_server().await;
    let extractor = Extractor::new().unwrap();
    for path in ["/json", "/untyped"] {
        let err = extractor.extract(&format!("{base}{path}")).await.unwrap_err();
        assert!(
            matches!(err, ExtractionError::UnsupportedContentType),
            "{path}: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_rejects_declared_oversize() {
    let base = test_server().await;
    let err = Extractor::new()
        .unwrap()
        .extract(&format!("{base}/huge"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionError::PageTooLarge));
}

#[tokio::test]
async fn test_rejects_oversize_body_without_length_header() {
    let base = test_server().await;
    let err = Extractor::new()
        .unwrap()
        .extract(&format!("{base}/huge-chunked"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionError::PageTooLarge));
}

#[tokio::test]
async fn test_deadline_yields_timeout() {
    let base = test_server().await;
    let extractor = Extractor::with_deadline(Duration::from_millis(200)).unwrap();
    let err = extractor.extract(&format!("{base}/slow")).await.unwrap_err();
    assert!(matches!(err, ExtractionError::FetchTimeout));
}

#[tokio::test]
async fn test_connection_failure_on_ip_host() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = Extractor::new()
        .unwrap()
        .extract(&format!("http://{addr}/"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionError::FetchFailed { status: None, .. }));
}
