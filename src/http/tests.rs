//! Tests for the HTTP transport module

use super::*;
use crate::auth::AuthConfig;
use crate::types::{Format, Method};
use std::time::Duration;
use wiremock::matchers::{body_string, body_string_contains, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder().base_url(server.uri()).build();
    HttpClient::new(config).unwrap()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.verify_tls);
    assert!(config.base_url.is_none());
    assert!(config.user_agent.starts_with("jss-client/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://jss.example.com:8443")
        .timeout(Duration::from_secs(60))
        .verify_tls(false)
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url.as_deref(), Some("https://jss.example.com:8443"));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert!(!config.verify_tls);
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_build_url_joins_slashes() {
    let config = HttpClientConfig::builder()
        .base_url("https://jss.example.com/")
        .build();
    let client = HttpClient::new(config).unwrap();
    assert_eq!(
        client.build_url("/JSSResource/computers"),
        "https://jss.example.com/JSSResource/computers"
    );
    assert_eq!(client.build_url("https://other/x"), "https://other/x");
}

#[test]
fn test_api_request_builders() {
    let request = ApiRequest::put("JSSResource/policies/id/1", Format::Xml, "<policy/>")
        .header("X-Trace", "1");
    assert_eq!(request.method, Method::PUT);
    assert_eq!(request.body.as_deref(), Some("<policy/>"));
    assert_eq!(request.headers.get("X-Trace").map(String::as_str), Some("1"));
    assert!(ApiRequest::get("x", Format::Json).body.is_none());
}

#[test]
fn test_api_response_helpers() {
    let response = ApiResponse::new(201, Some("application/json".into()), "{}");
    assert!(response.is_success());
    assert_eq!(response.format(), Some(Format::Json));
    assert!(!ApiResponse::new(404, None, "").is_success());
}

#[tokio::test]
async fn test_get_sends_accept_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/JSSResource/computers/id/1"))
        .and(header("Accept", "text/xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/xml;charset=UTF-8")
                .set_body_string("<computer><general><id>1</id></general></computer>"),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .execute(&ApiRequest::get("JSSResource/computers/id/1", Format::Xml))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.format(), Some(Format::Xml));
    assert!(response.body.contains("<id>1</id>"));
}

#[tokio::test]
async fn test_put_sends_body_and_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/buildings/3"))
        .and(header("Content-Type", "application/json"))
        .and(body_string(r#"{"name":"HQ"}"#))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .execute(&ApiRequest::put("api/v1/buildings/3", Format::Json, r#"{"name":"HQ"}"#))
        .await
        .unwrap();
    assert_eq!(response.status, 202);
}

#[tokio::test]
async fn test_upload_sends_multipart_form() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/JSSResource/fileuploads/computers/id/3"))
        .and(header_regex("Content-Type", "^multipart/form-data; boundary="))
        .and(body_string_contains(r#"name="name"; filename="notes.txt""#))
        .and(body_string_contains("Content-Type: text/plain"))
        .and(body_string_contains("asset notes"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let upload = Upload {
        field: "name".to_string(),
        file_name: "notes.txt".to_string(),
        content_type: "text/plain".to_string(),
        data: bytes::Bytes::from_static(b"asset notes"),
    };
    let request = ApiRequest::new(Method::POST, "JSSResource/fileuploads/computers/id/3", Format::Xml)
        .with_upload(upload);

    let response = client_for(&mock_server).execute(&request).await.unwrap();
    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn test_error_statuses_are_returned_not_raised() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<p>Not Found</p>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .execute(&ApiRequest::get("JSSResource/computers/id/999", Format::Xml))
        .await
        .unwrap();
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_basic_auth_401_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder().base_url(mock_server.uri()).build();
    let client = HttpClient::with_auth(
        config,
        AuthConfig::Basic {
            username: "u".into(),
            password: "p".into(),
        },
    )
    .unwrap();

    let response = client
        .execute(&ApiRequest::get("JSSResource/computers", Format::Xml))
        .await
        .unwrap();
    assert_eq!(response.status, 401);
}

#[tokio::test]
async fn test_token_refreshed_and_replayed_once_on_401() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "tok",
            "expires": "2099-01-01T00:00:00Z"
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    // First attempt is rejected, the replay succeeds
    Mock::given(method("GET"))
        .and(path("/JSSResource/buildings"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/JSSResource/buildings"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<buildings><size>0</size></buildings>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder().base_url(mock_server.uri()).build();
    let client = HttpClient::with_auth(
        config,
        AuthConfig::token(
            format!("{}/api/v1/auth/token", mock_server.uri()),
            "admin",
            "secret",
        ),
    )
    .unwrap();

    let response = client
        .execute(&ApiRequest::get("JSSResource/buildings", Format::Xml))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_token_replay_happens_only_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "tok"})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/JSSResource/buildings"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder().base_url(mock_server.uri()).build();
    let client = HttpClient::with_auth(
        config,
        AuthConfig::token(
            format!("{}/api/v1/auth/token", mock_server.uri()),
            "admin",
            "secret",
        ),
    )
    .unwrap();

    let response = client
        .execute(&ApiRequest::get("JSSResource/buildings", Format::Xml))
        .await
        .unwrap();
    assert_eq!(response.status, 401);
}

#[tokio::test]
async fn test_timeout_maps_to_timeout_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .timeout(Duration::from_millis(50))
        .build();
    let client = HttpClient::new(config).unwrap();

    let err = client
        .execute(&ApiRequest::get("JSSResource/computers", Format::Xml))
        .await
        .unwrap_err();
    assert!(matches!(err, crate::Error::Timeout { timeout_ms: 50 }));
}
