//! Tests for the server binding

use super::*;
use crate::error::Error;
use crate::query::{QueryOptions, SearchArg};
use crate::summary::QueryResult;
use crate::test_support::{jss, StubTransport};
use crate::types::Method;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const BUILDINGS: &str = "<buildings><size>2</size>\
    <building><id>1</id><name>HQ</name></building>\
    <building><id>2</id><name>Annex</name></building></buildings>";

#[tokio::test]
async fn test_listing_query_returns_summaries() {
    let stub = StubTransport::new();
    stub.route(Method::GET, "JSSResource/buildings", 200, BUILDINGS);

    let result = jss(&stub)
        .query("Building", SearchArg::All, QueryOptions::new())
        .await
        .unwrap();

    let set = result.into_records().unwrap();
    assert_eq!(set.names(), vec!["HQ", "Annex"]);
    assert_eq!(stub.call_count(), 1);
}

#[tokio::test]
async fn test_id_query_returns_fresh_record() {
    let stub = StubTransport::new();
    stub.route(
        Method::GET,
        "JSSResource/buildings/id/1",
        200,
        "<building><id>1</id><name>HQ</name></building>",
    );

    let resource = jss(&stub)
        .buildings(1_u64, QueryOptions::new())
        .await
        .unwrap()
        .into_record()
        .unwrap();

    assert!(resource.cache_state().is_fresh());
    assert_eq!(resource.name(), "HQ");
}

#[tokio::test]
async fn test_match_query_returns_listing() {
    let stub = StubTransport::new();
    stub.route(
        Method::GET,
        "JSSResource/computers/match/lab*",
        200,
        "<computers><size>1</size><computer><id>3</id><name>lab-03</name></computer></computers>",
    );

    let result = jss(&stub)
        .computers("lab*", QueryOptions::new())
        .await
        .unwrap();
    assert!(!result.is_record());
    assert_eq!(result.into_records().unwrap().ids(), vec!["3"]);
}

#[tokio::test]
async fn test_keyed_search_and_subset() {
    let stub = StubTransport::new();
    stub.route(
        Method::GET,
        "JSSResource/computers/serialnumber/C02X1234/subset/hardware&general",
        200,
        "<computer><general><id>3</id><name>lab-03</name></general><hardware/></computer>",
    );

    let resource = jss(&stub)
        .computers(
            "serial_number=C02X1234",
            QueryOptions::new().subset_str("hardware"),
        )
        .await
        .unwrap()
        .into_record()
        .unwrap();

    assert!(resource.cache_state().is_partial());
    assert_eq!(resource.id(), "3");
}

#[tokio::test]
async fn test_singleton_query() {
    let stub = StubTransport::new();
    stub.route(
        Method::GET,
        "JSSResource/activationcode",
        200,
        "<activation_code><organization_name>Example</organization_name><code>ABCD</code></activation_code>",
    );

    let resource = jss(&stub)
        .activation_code(SearchArg::All, QueryOptions::new())
        .await
        .unwrap()
        .into_record()
        .unwrap();

    assert!(resource.cache_state().is_fresh());
    assert_eq!(resource.data().text("code").as_deref(), Some("ABCD"));
}

#[tokio::test]
async fn test_pro_listing() {
    let stub = StubTransport::new();
    stub.route(
        Method::GET,
        "api/v1/buildings",
        200,
        r#"{"totalCount":1,"results":[{"id":"1","name":"HQ","city":"Oslo"}]}"#,
    );

    let set = jss(&stub)
        .api_buildings(SearchArg::All, QueryOptions::new())
        .await
        .unwrap()
        .into_records()
        .unwrap();
    assert_eq!(set.names(), vec!["HQ"]);
}

#[tokio::test]
async fn test_local_failures_make_no_request() {
    let stub = StubTransport::new();
    let jss = jss(&stub);

    assert!(matches!(
        jss.query("Gadget", SearchArg::All, QueryOptions::new()).await,
        Err(Error::UnknownResource { .. })
    ));
    assert!(matches!(
        jss.computers("colour=red", QueryOptions::new()).await,
        Err(Error::UnsupportedSearchKey { .. })
    ));
    assert!(matches!(
        jss.computer_application_usage(SearchArg::All, QueryOptions::new())
            .await,
        Err(Error::InvalidConstructionArgument { .. })
    ));
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_responses() {
    let stub = StubTransport::new();
    stub.route(Method::GET, "JSSResource/buildings/id/1", 200, "<building><id>1</id>");
    stub.route(Method::GET, "JSSResource/buildings/id/2", 200, r#"{"id": 2}"#);
    let jss = jss(&stub);

    assert!(matches!(
        jss.buildings(1_u64, QueryOptions::new()).await,
        Err(Error::MalformedResponse { .. })
    ));
    assert!(matches!(
        jss.buildings(2_u64, QueryOptions::new()).await,
        Err(Error::MalformedResponse { .. })
    ));
}

#[tokio::test]
async fn test_status_mapping() {
    let stub = StubTransport::new();
    stub.route(Method::GET, "JSSResource/buildings", 401, "");
    stub.route(Method::GET, "JSSResource/sites", 409, "<p>Conflict</p>");
    let jss = jss(&stub);

    assert!(jss
        .buildings(SearchArg::All, QueryOptions::new())
        .await
        .unwrap_err()
        .is_authentication());
    assert_eq!(
        jss.sites(SearchArg::All, QueryOptions::new())
            .await
            .unwrap_err()
            .status(),
        Some(409)
    );
}

#[tokio::test]
async fn test_snapshot_records_failures_and_continues() {
    let stub = StubTransport::new();
    stub.route(Method::GET, "JSSResource/buildings", 200, BUILDINGS);
    stub.route(
        Method::GET,
        "JSSResource/buildings/id/1",
        200,
        "<building><id>1</id><name>HQ</name></building>",
    );
    stub.route(
        Method::GET,
        "JSSResource/buildings/id/2",
        200,
        "<building><id>2</id><name>Annex</name></building>",
    );

    let snapshot = jss(&stub)
        .snapshot(&["Building".to_string(), "Department".to_string()])
        .await;

    assert_eq!(snapshot.record_count(), 2);
    assert!(!snapshot.is_complete());
    assert!(snapshot.failures.contains_key("Department"));
    assert_eq!(
        snapshot.records["Building"][1],
        serde_json::json!({"id": "2", "name": "Annex"})
    );

    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    snapshot.write_json(&path).await.unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["Building"][0]["name"], "HQ");
    assert!(written.get("Department").is_none());
}

#[tokio::test]
async fn test_snapshot_write_failure_names_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("snapshot.json");

    let err = Snapshot::default().write_json(&path).await.unwrap_err();
    match err {
        Error::Other(message) => {
            assert!(message.starts_with("Failed to write snapshot"));
            assert!(message.contains("snapshot.tmp"));
        }
        other => panic!("Expected Other, got {other:?}"),
    }
}

#[test]
fn test_builder_requires_transport() {
    assert!(matches!(Jss::builder().build(), Err(Error::Config { .. })));
}

#[test]
fn test_builder_defaults() {
    let stub = StubTransport::new();
    let jss = jss(&stub);
    assert_eq!(jss.resolve_concurrency(), DEFAULT_RESOLVE_CONCURRENCY);
    assert!(jss.registry().contains("Policy"));
    assert_eq!(
        jss.url_for("JSSResource/policies/id/1"),
        "https://jss.example.com:8443/JSSResource/policies/id/1"
    );
    assert!(jss.distribution_points().is_empty());
}

#[tokio::test]
async fn test_query_results_share_the_binding() {
    let stub = StubTransport::new();
    stub.route(Method::GET, "JSSResource/buildings", 200, BUILDINGS);
    stub.route(
        Method::GET,
        "JSSResource/buildings/id/2",
        200,
        "<building><id>2</id><name>Annex</name></building>",
    );

    let result = jss(&stub)
        .query("building", None::<u64>, QueryOptions::new())
        .await
        .unwrap();
    let QueryResult::Records(set) = result else {
        panic!("expected a listing");
    };
    let annex = set.resolve_by_id("2").await.unwrap().unwrap();
    assert_eq!(annex.url(), "https://jss.example.com:8443/JSSResource/buildings/id/2");
}

// ============================================================================
// Flush and Upload Endpoints
// ============================================================================

#[tokio::test]
async fn test_command_flush_paths() {
    let stub = StubTransport::new();
    stub.route(
        Method::DELETE,
        "JSSResource/commandflush/computers/id/1,2/status/Pending+Failed",
        200,
        "",
    );
    stub.route(Method::DELETE, "JSSResource/commandflush", 200, "");
    let jss = jss(&stub);

    endpoints::command_flush(&jss, FlushTarget::Computers, &[1, 2], CommandStatus::PendingAndFailed)
        .await
        .unwrap();

    let body = "<commandflush><status>Failed</status></commandflush>";
    endpoints::command_flush_with_xml(&jss, body).await.unwrap();
    let calls = stub.calls();
    assert_eq!(calls[1].body.as_deref(), Some(body));

    assert!(endpoints::command_flush(&jss, FlushTarget::MobileDevices, &[], CommandStatus::Pending)
        .await
        .is_err());
    assert_eq!(stub.call_count(), 2);
}

#[tokio::test]
async fn test_log_flush_paths() {
    let stub = StubTransport::new();
    stub.route(
        Method::DELETE,
        "JSSResource/logflush/policies/interval/Three+Months",
        200,
        "",
    );
    stub.route(
        Method::DELETE,
        "JSSResource/logflush/policies/id/7/interval/One+Week",
        200,
        "",
    );
    let jss = jss(&stub);

    endpoints::log_flush_for_interval(&jss, None, "Three Months").await.unwrap();
    endpoints::log_flush_for_record(&jss, Some("policies"), 7, "One+Week")
        .await
        .unwrap();
    assert!(endpoints::log_flush_for_interval(&jss, None, "  ").await.is_err());

    assert_eq!(stub.call_count(), 2);
}

#[tokio::test]
async fn test_log_flush_error_status_is_raised() {
    let stub = StubTransport::new();
    let err = endpoints::log_flush_for_interval(&jss(&stub), Some("computers"), "Zero Days")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        stub.calls()[0].path,
        "JSSResource/logflush/computers/interval/Zero+Days"
    );
}

#[tokio::test]
async fn test_upload_file_posts_multipart_part() {
    let stub = StubTransport::new();
    stub.route(Method::POST, "JSSResource/fileuploads/policies/id/7", 201, "");
    stub.route(Method::POST, "JSSResource/fileuploads/computers/name/lab%20mac", 201, "");
    let dir = tempdir().unwrap();
    let icon = dir.path().join("Firefox.PNG");
    std::fs::write(&icon, b"\x89PNG").unwrap();
    let jss = jss(&stub);

    endpoints::upload_file(&jss, "policies", 7_u64, &icon).await.unwrap();
    endpoints::upload_file(&jss, "computers", "lab mac", &icon).await.unwrap();

    let calls = stub.calls();
    let upload = calls[0].upload.as_ref().unwrap();
    assert_eq!(calls[0].method, Method::POST);
    assert_eq!(upload.field, "name");
    assert_eq!(upload.file_name, "Firefox.PNG");
    assert_eq!(upload.content_type, "image/png");
    assert_eq!(upload.data.as_ref(), b"\x89PNG");
    assert!(calls[0].body.is_none());
    assert_eq!(stub.call_count(), 2);
}

#[tokio::test]
async fn test_upload_file_rejects_bad_arguments() {
    let stub = StubTransport::new();
    let jss = jss(&stub);
    let dir = tempdir().unwrap();

    let missing = endpoints::upload_file(&jss, "policies", 7_u64, &dir.path().join("none.png")).await;
    assert!(matches!(missing, Err(Error::FileNotFound { .. })));

    let file = dir.path().join("notes.txt");
    std::fs::write(&file, "notes").unwrap();
    let wrong_type = endpoints::upload_file(&jss, "buildings", 1_u64, &file).await;
    assert!(matches!(wrong_type, Err(Error::InvalidConstructionArgument { .. })));
    assert_eq!(stub.call_count(), 0);
}

#[test]
fn test_guess_content_type() {
    assert_eq!(endpoints::guess_content_type("icon.png"), "image/png");
    assert_eq!(endpoints::guess_content_type("printer.ppd"), "application/vnd.cups-ppd");
    assert_eq!(endpoints::guess_content_type("App.ipa"), "application/octet-stream");
    assert_eq!(endpoints::guess_content_type("README"), "application/octet-stream");
}
