//! Integration tests for `FleetApiClient` using wiremock HTTP mocks.

use fleetcron_engine::jobs::{ReminderDispatcher, TripFinalizer, TripOptimizer};
use fleetcron_engine::{EffectError, FleetApiClient};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> FleetApiClient {
    FleetApiClient::new(base_url, Some("test-key"), 30)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn finalize_posts_lead_hours_and_reads_count() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/internal/jobs/schedule-upcoming-trips"))
        .and(header("X-API-Key", "test-key"))
        .and(body_json(serde_json::json!({ "lead_hours": 24 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "processed": 7 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let finalized = test_client(&server.uri())
        .finalize_trips(24)
        .await
        .expect("finalize should succeed");

    assert_eq!(finalized, 7);
}

#[tokio::test]
async fn reminders_post_empty_object() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/internal/jobs/trip-reminder"))
        .and(body_json(serde_json::json!({})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "processed": 12 })),
        )
        .mount(&server)
        .await;

    let sent = test_client(&server.uri())
        .send_trip_reminders()
        .await
        .expect("reminders should succeed");

    assert_eq!(sent, 12);
}

#[tokio::test]
async fn empty_response_body_counts_as_zero() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/internal/jobs/trip-optimize"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server.uri())
        .optimize_trips()
        .await
        .expect("optimize should succeed");
}

#[tokio::test]
async fn missing_processed_field_counts_as_zero() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/internal/jobs/trip-reminder"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ok" })),
        )
        .mount(&server)
        .await;

    let sent = test_client(&server.uri())
        .send_trip_reminders()
        .await
        .unwrap();

    assert_eq!(sent, 0);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/internal/jobs/trip-optimize"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .optimize_trips()
        .await
        .unwrap_err();

    match err {
        EffectError::UnexpectedStatus { status, url } => {
            assert_eq!(status, 503);
            assert!(url.ends_with("/internal/jobs/trip-optimize"), "{url}");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_json_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/internal/jobs/schedule-upcoming-trips"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .finalize_trips(6)
        .await
        .unwrap_err();

    assert!(matches!(err, EffectError::Deserialize { .. }), "{err:?}");
}

#[tokio::test]
async fn api_key_header_is_omitted_when_unset() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/internal/jobs/trip-reminder"))
        .and(header("X-API-Key", "test-key"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/internal/jobs/trip-reminder"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "processed": 1 })),
        )
        .mount(&server)
        .await;

    let client = FleetApiClient::new(&server.uri(), None, 30).unwrap();
    assert_eq!(client.send_trip_reminders().await.unwrap(), 1);
}
