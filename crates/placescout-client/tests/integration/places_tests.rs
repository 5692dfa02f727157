use std::time::Duration;

use placescout_client::KeyCheck;
use placescout_core::error::AppError;
use placescout_core::ratelimit::{RateLimitConfig, RateLimitedApi};
use placescout_core::traits::PlacesApi;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::integration::common::{TEST_KEY, client, search_body, status_body};

#[tokio::test]
async fn text_search_sends_query_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/textsearch/json"))
        .and(query_param("query", "bakery madrid"))
        .and(query_param("key", TEST_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["A", "B"], Some("tok"))))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server)
        .text_search("bakery madrid", None)
        .await
        .unwrap();

    assert_eq!(page.candidates.len(), 2);
    assert_eq!(page.candidates[0].place_id, "A");
    assert_eq!(page.candidates[0].name, "Name A");
    assert_eq!(page.next_page_token.as_deref(), Some("tok"));
}

#[tokio::test]
async fn continuation_token_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/textsearch/json"))
        .and(query_param("pagetoken", "tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["C"], None)))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server)
        .text_search("bakery", Some("tok-2"))
        .await
        .unwrap();

    assert_eq!(page.candidates.len(), 1);
    assert!(page.next_page_token.is_none());
}

#[tokio::test]
async fn results_without_id_are_dropped_and_names_defaulted() {
    let server = MockServer::start().await;
    Mock::given(path("/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                {"name": "No id"},
                {"place_id": "", "name": "Empty id"},
                {"place_id": "P1"}
            ]
        })))
        .mount(&server)
        .await;

    let page = client(&server).text_search("x", None).await.unwrap();

    assert_eq!(page.candidates.len(), 1);
    assert_eq!(page.candidates[0].name, "(unnamed)");
}

#[tokio::test]
async fn zero_results_is_an_empty_page() {
    let server = MockServer::start().await;
    Mock::given(path("/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ZERO_RESULTS"})))
        .mount(&server)
        .await;

    let page = client(&server).text_search("x", None).await.unwrap();
    assert!(page.candidates.is_empty());
}

#[tokio::test]
async fn http_and_body_statuses_share_one_taxonomy() {
    let server = MockServer::start().await;
    Mock::given(path("/textsearch/json"))
        .and(query_param("query", "http429"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(path("/textsearch/json"))
        .and(query_param("query", "body429"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("OVER_QUERY_LIMIT")))
        .mount(&server)
        .await;
    Mock::given(path("/textsearch/json"))
        .and(query_param("query", "http403"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;
    Mock::given(path("/textsearch/json"))
        .and(query_param("query", "denied"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("REQUEST_DENIED")))
        .mount(&server)
        .await;
    Mock::given(path("/textsearch/json"))
        .and(query_param("query", "http500"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let api = client(&server);
    assert!(matches!(
        api.text_search("http429", None).await,
        Err(AppError::RateLimitExceeded)
    ));
    assert!(matches!(
        api.text_search("body429", None).await,
        Err(AppError::RateLimitExceeded)
    ));
    assert!(matches!(
        api.text_search("http403", None).await,
        Err(AppError::PermissionDenied(_))
    ));
    assert!(matches!(
        api.text_search("denied", None).await,
        Err(AppError::PermissionDenied(msg)) if msg.contains("REQUEST_DENIED")
    ));
    assert!(matches!(
        api.text_search("http500", None).await,
        Err(AppError::HttpError { status: 500, .. })
    ));
}

#[tokio::test]
async fn details_requests_only_selected_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/details/json"))
        .and(query_param("place_id", "P1"))
        .and(query_param("fields", "name,formatted_phone_number,opening_hours"))
        .and(query_param("key", TEST_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "result": {
                "name": "Café Luna",
                "formatted_phone_number": "+34 600 000 000",
                "opening_hours": {
                    "open_now": true,
                    "weekday_text": ["Monday: 9:00 AM – 5:00 PM", "Sunday: Closed"]
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let details = client(&server)
        .place_details("P1", &["name", "formatted_phone_number", "opening_hours"])
        .await
        .unwrap();

    assert_eq!(details.name.as_deref(), Some("Café Luna"));
    assert!(details.website.is_none());
    assert_eq!(
        details.opening_hours.and_then(|h| h.summary()).as_deref(),
        Some("Monday: 9:00 AM – 5:00 PM; Sunday: Closed")
    );
}

#[tokio::test]
async fn details_not_found_and_invalid_request_map_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(path("/details/json"))
        .and(query_param("place_id", "GONE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "NOT_FOUND"})))
        .mount(&server)
        .await;
    Mock::given(path("/details/json"))
        .and(query_param("place_id", "BAD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "INVALID_REQUEST"})))
        .mount(&server)
        .await;
    Mock::given(path("/details/json"))
        .and(query_param("place_id", "HTTP404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let api = client(&server);
    for id in ["GONE", "BAD", "HTTP404"] {
        assert!(
            matches!(api.place_details(id, &["name"]).await, Err(AppError::NotFound(_))),
            "{id}"
        );
    }
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(path("/textsearch/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_body(&["A"], None))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let api = client(&server).with_timeout(Duration::from_secs(1)).unwrap();
    assert!(matches!(
        api.text_search("x", None).await,
        Err(AppError::Timeout(1))
    ));
}

#[tokio::test]
async fn rate_limited_request_is_retried_once() {
    let server = MockServer::start().await;
    Mock::given(path("/textsearch/json"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(path("/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["A"], None)))
        .mount(&server)
        .await;

    let api = RateLimitedApi::new(
        client(&server),
        RateLimitConfig::new(Duration::from_millis(50)),
    );
    let page = api.text_search("gyms", None).await.unwrap();

    assert_eq!(page.candidates.len(), 1);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url.query(), requests[1].url.query());
}

#[tokio::test]
async fn key_validation_classifies_statuses() {
    for (status, expected) in [
        ("OK", KeyCheck::Valid),
        ("ZERO_RESULTS", KeyCheck::Valid),
        ("INVALID_REQUEST", KeyCheck::Valid),
        (
            "REQUEST_DENIED",
            KeyCheck::Invalid("REQUEST_DENIED from test".into()),
        ),
        (
            "UNKNOWN_ERROR",
            KeyCheck::Inconclusive("UNKNOWN_ERROR: UNKNOWN_ERROR from test".into()),
        ),
    ] {
        let server = MockServer::start().await;
        Mock::given(path("/textsearch/json"))
            .and(query_param("query", "test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body(status)))
            .mount(&server)
            .await;

        assert_eq!(client(&server).validate_key().await.unwrap(), expected, "{status}");
    }
}
