use std::time::Duration;

use quizlink_core::ShortLinkMapping;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{HttpLookupClient, SHORT_LINKS_PATH};
use crate::error::LookupError;
use crate::{InMemoryLookup, ShortLinkLookup, UnconfiguredLookup};

fn create_client(server: &MockServer) -> HttpLookupClient {
    HttpLookupClient::with_timeout("anon-key".to_owned(), server.uri(), Duration::from_secs(2))
        .unwrap()
}

#[tokio::test]
async fn test_lookup_returns_first_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHORT_LINKS_PATH))
        .and(query_param("short_id", "eq.abc123"))
        .and(query_param("limit", "1"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"short_id": "abc123", "doctor_id": "d1", "quiz_type": "snot22"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mapping = create_client(&server).lookup("abc123").await.unwrap().unwrap();
    assert_eq!(mapping.doctor_id, "d1");
    assert_eq!(mapping.quiz_type.as_deref(), Some("snot22"));
}

#[tokio::test]
async fn test_empty_array_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHORT_LINKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    assert!(create_client(&server).lookup("zzz").await.unwrap().is_none());
}

#[tokio::test]
async fn test_legacy_row_without_quiz_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHORT_LINKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"short_id": "old1", "doctor_id": "d9", "quiz_type": null}
        ])))
        .mount(&server)
        .await;

    let mapping = create_client(&server).lookup("old1").await.unwrap().unwrap();
    assert_eq!(mapping.quiz_type, None);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHORT_LINKS_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let err = create_client(&server).lookup("abc123").await.unwrap_err();
    match err {
        LookupError::HttpStatus { code, body } => {
            assert_eq!(code, 503);
            assert_eq!(body, "Service Unavailable");
        },
        other => panic!("Expected HttpStatus error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHORT_LINKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = create_client(&server).lookup("abc123").await.unwrap_err();
    assert!(matches!(err, LookupError::JsonParse { .. }));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHORT_LINKS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = HttpLookupClient::with_timeout(
        "anon-key".to_owned(),
        server.uri(),
        Duration::from_millis(100),
    )
    .unwrap();
    let err = client.lookup("abc123").await.unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_in_memory_lookup() {
    let lookup = InMemoryLookup::with_mappings([ShortLinkMapping {
        short_id: "abc123".to_owned(),
        doctor_id: "d1".to_owned(),
        quiz_type: Some("snot22".to_owned()),
    }]);
    assert!(lookup.lookup("abc123").await.unwrap().is_some());
    assert!(lookup.lookup("zzz").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unconfigured_lookup_always_errors() {
    let err = UnconfiguredLookup.lookup("abc123").await.unwrap_err();
    assert!(matches!(err, LookupError::NotConfigured));
}

#[test]
fn test_debug_redacts_api_key() {
    let client = HttpLookupClient::with_timeout(
        "secret-key".to_owned(),
        "http://localhost/".to_owned(),
        Duration::from_secs(1),
    )
    .unwrap();
    assert_eq!(client.base_url(), "http://localhost");
    assert!(!format!("{client:?}").contains("secret-key"));
}
