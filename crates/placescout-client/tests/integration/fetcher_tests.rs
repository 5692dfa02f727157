use std::time::Duration;

use placescout_client::ReqwestPageFetcher;
use placescout_client::fetcher::BROWSER_USER_AGENT;
use placescout_core::error::AppError;
use placescout_core::traits::PageFetcher;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetches_html_with_browser_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contact"))
        .and(header("user-agent", BROWSER_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<footer>hi@shop.es</footer>"))
        .expect(1)
        .mount(&server)
        .await;

    let html = ReqwestPageFetcher::new()
        .unwrap()
        .fetch(&format!("{}/contact", server.uri()), Duration::from_secs(8))
        .await
        .unwrap();

    assert!(html.contains("hi@shop.es"));
}

#[tokio::test]
async fn non_200_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(path("/empty"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let fetcher = ReqwestPageFetcher::new().unwrap();
    let timeout = Duration::from_secs(8);
    assert!(matches!(
        fetcher
            .fetch(&format!("{}/missing", server.uri()), timeout)
            .await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        fetcher.fetch(&format!("{}/empty", server.uri()), timeout).await,
        Err(AppError::HttpError { status: 204, .. })
    ));
}

#[tokio::test]
async fn per_request_timeout_applies() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let result = ReqwestPageFetcher::new()
        .unwrap()
        .fetch(&format!("{}/slow", server.uri()), Duration::from_secs(1))
        .await;

    assert!(matches!(result, Err(AppError::Timeout(1))));
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let result = ReqwestPageFetcher::new()
        .unwrap()
        .fetch("http://127.0.0.1:9/", Duration::from_secs(2))
        .await;

    assert!(matches!(
        result,
        Err(AppError::NetworkError(_) | AppError::Timeout(_))
    ));
}
