use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use super::*;
use crate::routes::app;
use crate::state::AppState;

async fn post_render(body: serde_json::Value) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/signatures/render")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app(AppState::in_memory("http://studio.test"))
        .oneshot(req)
        .await
        .unwrap();
    let status = resp.status();
    (status, resp.into_body().collect().await.unwrap().to_bytes().to_vec())
}

#[tokio::test]
async fn renders_html_and_text() {
    let (status, body) = post_render(serde_json::json!({
        "template": "corporate",
        "personal": { "name": "Ada Lovelace", "title": "Analyst", "email": "ada@engine.test" },
        "social": { "twitter": "twitter.com/ada" }
    }))
    .await;
    assert_eq!(status, StatusCode::OK);

    let rendered: RenderedSignature = serde_json::from_slice(&body).unwrap();
    assert!(rendered.html.contains(r#"data-template="corporate""#));
    assert!(rendered.html.contains("Ada Lovelace"));
    assert!(rendered.html.contains(r#"href="https://twitter.com/ada""#));
    assert!(rendered.text.starts_with("-- \n"));
    assert!(rendered.text.contains("ada@engine.test"));
}

#[tokio::test]
async fn empty_design_uses_defaults() {
    let (status, body) = post_render(serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let rendered: RenderedSignature = serde_json::from_slice(&body).unwrap();
    assert!(rendered.html.contains(r#"data-template="minimal""#));
}

#[tokio::test]
async fn invalid_accent_color_is_rejected() {
    let (status, body) = post_render(serde_json::json!({ "accentColor": "red; background:url(x)" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["code"], "E_INVALID_COLOR");
}

#[tokio::test]
async fn script_link_is_rejected() {
    let (status, _) = post_render(serde_json::json!({ "social": { "linkedin": "javascript:alert(1)" } })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
