use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use quizlink_core::ShortLinkMapping;
use quizlink_lookup::{InMemoryLookup, UnconfiguredLookup};
use quizlink_service::ShortLinkResolver;
use serde_json::Value;
use tower::ServiceExt;

use crate::{AppState, create_router};

fn router() -> axum::Router {
    let lookup = InMemoryLookup::with_mappings([
        ShortLinkMapping {
            short_id: "abc123".to_owned(),
            doctor_id: "d1".to_owned(),
            quiz_type: Some("snot22".to_owned()),
        },
        ShortLinkMapping {
            short_id: "weird".to_owned(),
            doctor_id: "d2".to_owned(),
            quiz_type: Some("bogus".to_owned()),
        },
    ]);
    create_router(Arc::new(AppState { resolver: ShortLinkResolver::new(Arc::new(lookup)) }))
}

async fn get(router: axum::Router, uri: &str) -> Response {
    router.oneshot(Request::get(uri).body(Body::empty()).unwrap()).await.unwrap()
}

fn location(response: &Response) -> &str {
    response.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_short_link_redirects_to_share_page() {
    let response = get(router(), "/s/abc123").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/share/snot22/d1");
}

#[tokio::test]
async fn test_unknown_short_link_redirects_to_not_found() {
    let response = get(router(), "/s/zzz").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/404");
}

#[tokio::test]
async fn test_unconfigured_lookup_fails_closed() {
    let router = create_router(Arc::new(AppState {
        resolver: ShortLinkResolver::new(Arc::new(UnconfiguredLookup)),
    }));
    let response = get(router, "/s/abc123").await;
    assert_eq!(location(&response), "/404");
}

#[tokio::test]
async fn test_short_link_with_unknown_quiz_is_json_404() {
    let response = get(router(), "/s/weird").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("quiz not found"));
}

#[tokio::test]
async fn test_resolve_api_reports_outcome() {
    let body = json_body(get(router(), "/api/resolve/abc123").await).await;
    assert_eq!(body["code"], "abc123");
    assert_eq!(body["outcome"], "resolved");
    assert_eq!(body["path"], "/share/snot22/d1");

    let missing = json_body(get(router(), "/api/resolve/zzz").await).await;
    assert_eq!(missing["outcome"], "not_found");
    assert_eq!(missing["path"], "/404");
}

#[tokio::test]
async fn test_assessment_deep_link_redirects() {
    let response = get(router(), "/assessment/dhi?key=K1&doctor=D1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/quiz?type=DHI&key=K1&doctor=D1&mode=single");
}

#[tokio::test]
async fn test_assessment_without_signal_returns_start_url() {
    let response = get(router(), "/assessment/dhi?utm_source=mail").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["quiz_type"], "DHI");
    assert_eq!(body["start_url"], "/quiz?type=DHI&mode=single");
}

#[tokio::test]
async fn test_unknown_assessment_is_json_404() {
    let response = get(router(), "/assessment/bogus").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let explicit = get(router(), "/assessment/dhi?type=nope&key=K1").await;
    assert_eq!(explicit.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_version() {
    let health = get(router(), "/health").await;
    assert_eq!(health.status(), StatusCode::OK);

    let version = json_body(get(router(), "/api/version").await).await;
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
}
