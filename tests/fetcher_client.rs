mod helpers;

use headline::fetcher::FetchError;
use helpers::{fast_fetcher, fetcher_with_timeout};
use std::time::{Duration, Instant};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(
                    "<html><head><title>Test</title></head><body>Hello World</body></html>"
                        .as_bytes(),
                )
                .insert_header("Content-Type", "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/test", mock_server.uri());
    let result = fast_fetcher(3).fetch(&url).await.unwrap();

    assert!(result.status.is_success());
    assert!(result.body_utf8.contains("Hello World"));
    assert_eq!(result.url_final.as_str(), url);
}

#[tokio::test]
async fn test_403_twice_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/guarded"))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/guarded"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<rss></rss>"))
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher(3);
    let url = format!("{}/guarded", mock_server.uri());
    let started = Instant::now();
    let result = fetcher.fetch_with_retry(&url).await.unwrap();

    assert!(result.status.is_success());
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    // Two retries: 10ms + 20ms of backoff, bounded by the policy total.
    assert!(fetcher.policy().total_delay() <= Duration::from_millis(30));
    assert!(started.elapsed() >= Duration::from_millis(30));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_404_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notfound"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/notfound", mock_server.uri());
    let result = fast_fetcher(3).fetch_with_retry(&url).await;

    match result {
        Err(FetchError::Http { status }) => assert_eq!(status.as_u16(), 404),
        other => panic!("Expected HTTP 404 error, got {:?}", other.map(|p| p.status)),
    }
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_retries_exhausted_reports_url_and_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let url = format!("{}/limited", mock_server.uri());
    let result = fast_fetcher(3).fetch_with_retry(&url).await;

    match result {
        Err(FetchError::RetriesExhausted {
            url: failed_url,
            attempts,
            last,
        }) => {
            assert_eq!(failed_url, url);
            assert_eq!(attempts, 3);
            assert_eq!(last.status().map(|s| s.as_u16()), Some(429));
        }
        other => panic!("Expected RetriesExhausted, got {:?}", other.map(|p| p.status)),
    }
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let url = format!("{}/slow", mock_server.uri());
    let result = fetcher_with_timeout(Duration::from_millis(100), 1)
        .fetch(&url)
        .await;

    assert!(matches!(result, Err(FetchError::RequestTimeout)));
}

#[tokio::test]
async fn test_timeout_is_retried_until_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stalled"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let url = format!("{}/stalled", mock_server.uri());
    let result = fetcher_with_timeout(Duration::from_millis(100), 2)
        .fetch_with_retry(&url)
        .await;

    match result {
        Err(FetchError::RetriesExhausted { attempts, last, .. }) => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last, FetchError::RequestTimeout));
        }
        other => panic!("Expected RetriesExhausted, got {:?}", other.map(|p| p.status)),
    }
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_timeout_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<rss></rss>"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/flaky", mock_server.uri());
    let result = fetcher_with_timeout(Duration::from_millis(100), 3)
        .fetch_with_retry(&url)
        .await
        .unwrap();

    assert!(result.status.is_success());
    assert_eq!(result.body_utf8, "<rss></rss>");
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_browser_headers_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/headers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/headers", mock_server.uri());
    fast_fetcher(1).fetch(&url).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let headers = &requests[0].headers;
    let user_agent = headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(user_agent.starts_with("Mozilla/5.0"));
    assert!(headers.get("accept").is_some());
    assert!(headers.get("accept-language").is_some());
}

#[tokio::test]
async fn test_fetch_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/redirect"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/final"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/final"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("<html><body>Final page</body></html>".as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/redirect", mock_server.uri());
    let result = fast_fetcher(3).fetch(&url).await.unwrap();

    assert!(result.status.is_success());
    assert!(result.body_utf8.contains("Final page"));
    assert!(result.url_final.as_str().ends_with("/final"));
}

#[tokio::test]
async fn test_fetch_gzip_compression() {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let original_content =
        "<html><head><title>Compressed</title></head><body>This content is gzipped!</body></html>";

    // Gzip the content
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(original_content.as_bytes()).unwrap();
    let compressed_data = encoder.finish().unwrap();

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gzipped"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(compressed_data)
                .insert_header("Content-Type", "text/html; charset=utf-8")
                .insert_header("Content-Encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/gzipped", mock_server.uri());
    let result = fast_fetcher(3).fetch(&url).await.unwrap();

    assert!(result.status.is_success());
    assert!(result.body_utf8.contains("This content is gzipped!"));
}

#[tokio::test]
async fn test_windows_1252_body_is_decoded() {
    let mock_server = MockServer::start().await;

    // "café" with 0xE9 for é
    let body = b"<html><body>caf\xE9</body></html>".to_vec();
    Mock::given(method("GET"))
        .and(path("/latin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .insert_header("Content-Type", "text/html; charset=windows-1252"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/latin", mock_server.uri());
    let result = fast_fetcher(1).fetch(&url).await.unwrap();

    assert!(result.body_utf8.contains("café"));
}

#[tokio::test]
async fn test_fetch_body_too_large() {
    let mock_server = MockServer::start().await;

    // 11MB > 10MB limit
    let large_body = "x".repeat(11 * 1024 * 1024);

    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(large_body.as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/large", mock_server.uri());
    let result = fast_fetcher(1).fetch(&url).await;

    match result {
        Err(FetchError::BodyTooLarge(size)) => {
            assert_eq!(size, 11 * 1024 * 1024);
        }
        _ => panic!("Expected BodyTooLarge error"),
    }
}

#[tokio::test]
async fn test_fetch_invalid_url() {
    let result = fast_fetcher(3).fetch_with_retry("not-a-valid-url").await;

    match result {
        Err(FetchError::InvalidUrl(_)) => {}
        _ => panic!("Expected InvalidUrl error"),
    }
}
