use std::net::SocketAddr;
use std::time::Duration;

use axum::{Router, body::Body, body::Bytes, routing::get};
use futures_util::stream;

use qraft::AppError;
use qraft::features::qr::BackgroundFetcher;

/// `/sized` 带 Content-Length；`/chunked` 分块传输（无 Content-Length）。
async fn start_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let router = Router::new()
        .route("/small", get(|| async { vec![7u8; 8] }))
        .route("/sized", get(|| async { vec![7u8; 64] }))
        .route(
            "/chunked",
            get(|| async {
                let chunks = (0..8).map(|_| Ok::<_, std::io::Error>(Bytes::from(vec![7u8; 8])));
                Body::from_stream(stream::iter(chunks))
            }),
        );
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

fn fetcher(max_bytes: usize) -> BackgroundFetcher {
    BackgroundFetcher::new(Duration::from_secs(5), max_bytes).expect("fetcher")
}

fn assert_too_large(result: Result<Vec<u8>, AppError>) {
    match result {
        Err(AppError::BackgroundFetch(msg)) => {
            assert!(msg.contains("exceeds 16 bytes"), "unexpected message: {msg}")
        }
        other => panic!("expected BackgroundFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn body_within_limit_is_returned() {
    let addr = start_server().await;
    let bytes = fetcher(16)
        .fetch(&format!("http://{addr}/small"))
        .await
        .expect("fetch");
    assert_eq!(bytes, vec![7u8; 8]);
}

#[tokio::test]
async fn declared_length_over_limit_is_rejected() {
    let addr = start_server().await;
    assert_too_large(fetcher(16).fetch(&format!("http://{addr}/sized")).await);
}

#[tokio::test]
async fn streamed_body_over_limit_is_rejected() {
    let addr = start_server().await;
    assert_too_large(fetcher(16).fetch(&format!("http://{addr}/chunked")).await);

    // 同一分块响应在上限内可完整读取
    let bytes = fetcher(1024)
        .fetch(&format!("http://{addr}/chunked"))
        .await
        .expect("fetch chunked");
    assert_eq!(bytes.len(), 64);
}

#[tokio::test]
async fn not_found_is_fetch_error() {
    let addr = start_server().await;
    let result = fetcher(16).fetch(&format!("http://{addr}/missing")).await;
    assert!(matches!(result, Err(AppError::BackgroundFetch(_))));
}
