use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request};
use http_body_util::BodyExt;
use image::{Rgba, RgbaImage};
use tower::ServiceExt;

use super::*;
use crate::imaging::export::encode_png;
use crate::routes::app;

fn png_bytes() -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(3, 3, Rgba([200, 0, 0, 255]))).unwrap()
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

async fn request_upload_url(router: &Router) -> String {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/objects/upload")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(router, req).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice::<UploadUrlResponse>(&body).unwrap().upload_url
}

fn put_bytes(upload_url: &str, content_type: &str, bytes: Vec<u8>) -> Request<Body> {
    let path = upload_url.strip_prefix("http://studio.test").unwrap();
    Request::builder()
        .method(Method::PUT)
        .uri(path)
        .header("content-type", content_type)
        .body(Body::from(bytes))
        .unwrap()
}

fn register(icon_url: &str) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri("/api/contact-icons")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "iconURL": icon_url }).to_string()))
        .unwrap()
}

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn upload_publish_serve_flow() {
    let router = app(AppState::in_memory("http://studio.test"));
    let upload_url = request_upload_url(&router).await;
    assert!(upload_url.starts_with("http://studio.test/api/objects/uploads/"));

    let (status, _, _) = send(&router, put_bytes(&upload_url, "image/png", png_bytes())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(&router, register(&upload_url)).await;
    assert_eq!(status, StatusCode::OK);
    let object_path = serde_json::from_slice::<ObjectPathResponse>(&body).unwrap().object_path;
    assert!(object_path.starts_with("/objects/uploads/"));

    let (status, headers, body) = send(&router, get(&object_path)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, png_bytes());
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers[header::CACHE_CONTROL], OBJECT_CACHE_CONTROL);
    assert_eq!(headers[header::ETAG].to_str().unwrap().len(), 66);
}

#[tokio::test]
async fn private_object_is_not_served() {
    let router = app(AppState::in_memory("http://studio.test"));
    let upload_url = request_upload_url(&router).await;
    let (_, _, body) = send(&router, put_bytes(&upload_url, "image/png", png_bytes())).await;
    let object_path = serde_json::from_slice::<ObjectPathResponse>(&body).unwrap().object_path;

    let (status, _, body) = send(&router, get(&object_path)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["code"], "E_OBJECT_NOT_FOUND");
}

#[tokio::test]
async fn matching_etag_is_not_modified() {
    let router = app(AppState::in_memory("http://studio.test"));
    let upload_url = request_upload_url(&router).await;
    send(&router, put_bytes(&upload_url, "image/png", png_bytes())).await;
    let (_, _, body) = send(&router, register(&upload_url)).await;
    let object_path = serde_json::from_slice::<ObjectPathResponse>(&body).unwrap().object_path;

    let (_, headers, _) = send(&router, get(&object_path)).await;
    let etag = headers[header::ETAG].clone();

    let req = Request::builder()
        .uri(&object_path)
        .header(header::IF_NONE_MATCH, etag)
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::NOT_MODIFIED);
    assert!(body.is_empty());
}

#[tokio::test]
async fn bad_token_is_forbidden() {
    let router = app(AppState::in_memory("http://studio.test"));
    let upload_url = request_upload_url(&router).await;
    let forged = format!("{upload_url}x");
    let (status, _, body) = send(&router, put_bytes(&forged, "image/png", png_bytes())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["code"], "E_TICKET_REJECTED");
    assert_eq!(err["retryable"], false);
}

#[tokio::test]
async fn non_image_upload_is_unsupported() {
    let router = app(AppState::in_memory("http://studio.test"));
    let upload_url = request_upload_url(&router).await;
    let (status, _, _) = send(&router, put_bytes(&upload_url, "text/html", b"<html>".to_vec())).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn registering_foreign_url_is_bad_request() {
    let router = app(AppState::in_memory("http://studio.test"));
    let (status, _, _) = send(&router, register("https://elsewhere.test/icon.png")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn limited_router(per_client: usize, global: usize) -> Router {
    let config = crate::config::StudioConfig {
        upload_rate_per_client: per_client,
        upload_rate_global: global,
        ..crate::config::StudioConfig::in_memory("http://studio.test")
    };
    app(AppState::new(
        std::sync::Arc::new(config),
        std::sync::Arc::new(crate::storage::MemoryStore::new()),
    ))
}

fn upload_request_from(peer: Option<SocketAddr>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri("/api/objects/upload");
    if let Some(addr) = peer {
        builder = builder.extension(ConnectInfo(addr));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn upload_requests_are_rate_limited_globally() {
    let router = limited_router(10, 2);
    for _ in 0..2 {
        let (status, _, _) = send(&router, upload_request_from(None)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _, body) = send(&router, upload_request_from(None)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["code"], "E_RATE_LIMITED_GLOBAL");
    assert_eq!(err["retryable"], true);
}

#[tokio::test]
async fn upload_requests_are_rate_limited_per_peer() {
    let router = limited_router(1, 10);
    let alice: SocketAddr = "192.0.2.1:5000".parse().unwrap();
    let bob: SocketAddr = "192.0.2.2:5000".parse().unwrap();

    let (status, _, _) = send(&router, upload_request_from(Some(alice))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, body) = send(&router, upload_request_from(Some(alice))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["code"], "E_RATE_LIMITED");

    let (status, _, _) = send(&router, upload_request_from(Some(bob))).await;
    assert_eq!(status, StatusCode::OK);
}
