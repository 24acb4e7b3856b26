//! Integration tests for the web client against a local mock server.
//!
//! These tests exercise the real reqwest transport:
//! - Headers, redirects and error statuses
//! - Retry budgets and exclusions
//! - Disk cache round-trips, including redirect markers
//! - History navigation and referer inference

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use webchain::{CacheConfig, ClientConfig, ErrorKind, FetchError, HistoryLimit, WebClient};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{test_config, TEST_AGENT};

async fn page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_get_sends_configured_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .and(header("user-agent", TEST_AGENT))
        .and(header("accept", "*/*"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hi there"))
        .expect(1)
        .mount(&server)
        .await;

    let client = WebClient::new(test_config()).unwrap();
    let url = format!("{}/hello", server.uri());
    let response = client.open(&url).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.redirect(), None);
    assert!(!response.from_cache());
    assert_eq!(response.text().await.unwrap(), "hi there");
}

#[tokio::test]
async fn test_redirect_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri())),
        )
        .mount(&server)
        .await;
    page(&server, "/new", "moved here").await;

    let client = WebClient::new(test_config()).unwrap();
    let old = format!("{}/old", server.uri());
    let new = format!("{}/new", server.uri());
    assert_eq!(client.get(Some(old.as_str())).await.unwrap(), "moved here");
    assert_eq!(client.redirect(), Some(new.clone()));
    assert_eq!(client.final_url(), Some(new));
    assert_eq!(client.response(None).await.unwrap().requested_url(), old);
}

#[tokio::test]
async fn test_bare_host_is_not_a_redirect() {
    let server = MockServer::start().await;
    page(&server, "/", "root").await;

    let client = WebClient::new(test_config()).unwrap();
    // reqwest normalizes this to ".../", which designates the same page
    client.open(&server.uri()).await.unwrap();
    assert_eq!(client.redirect(), None);
}

#[tokio::test]
async fn test_error_status_carries_code_and_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = WebClient::new(ClientConfig {
        retry_on_error: Some(3),
        ..test_config()
    })
    .unwrap();
    let url = format!("{}/missing", server.uri());
    let err = client.open(&url).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    assert_eq!(err.url(), Some(url.as_str()));
}

#[tokio::test]
async fn test_server_errors_are_retried_until_budget_is_spent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = WebClient::new(ClientConfig {
        retry_on_error: Some(2),
        ..test_config()
    })
    .unwrap();
    let err = client
        .open(&format!("{}/flaky", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_timeouts_are_retried_by_timeout_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(2)
        .mount(&server)
        .await;

    let client = WebClient::new(ClientConfig {
        timeout: Some(Duration::from_millis(200)),
        retry_on_timeout: Some(1),
        // Timeouts are excluded from the generic policy
        retry_on_error: Some(5),
        ..test_config()
    })
    .unwrap();
    let err = client
        .open(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_connection_failure_is_distinct_from_timeout() {
    let client = WebClient::new(ClientConfig {
        retry_on_timeout: Some(2),
        ..test_config()
    })
    .unwrap();
    let err = client.open("http://127.0.0.1:1/").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connect);
}

#[tokio::test]
async fn test_cache_serves_second_request_from_disk() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cached"))
        .respond_with(ResponseTemplate::new(200).set_body_string("stored once"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = WebClient::new(ClientConfig {
        cache: Some(CacheConfig::new(dir.path())),
        ..test_config()
    })
    .unwrap();
    let url = format!("{}/cached", server.uri());

    let first = client.open(&url).await.unwrap();
    assert!(!first.from_cache());
    assert_eq!(first.text().await.unwrap(), "stored once");

    let second = client.open(&url).await.unwrap();
    assert!(second.from_cache());
    assert_eq!(second.text().await.unwrap(), "stored once");
}

#[tokio::test]
async fn test_cache_follows_redirect_marker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/short"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/long", server.uri())),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/long"))
        .respond_with(ResponseTemplate::new(200).set_body_string("target"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = WebClient::new(ClientConfig {
        cache: Some(CacheConfig::new(dir.path())),
        ..test_config()
    })
    .unwrap();
    let short = format!("{}/short", server.uri());
    let long = format!("{}/long", server.uri());

    assert_eq!(client.get(Some(short.as_str())).await.unwrap(), "target");
    let cached = client.open(&short).await.unwrap();
    assert!(cached.from_cache());
    assert_eq!(cached.final_url(), long);
    assert_eq!(cached.text().await.unwrap(), "target");
    assert!(client.open(&long).await.unwrap().from_cache());
}

#[tokio::test]
async fn test_history_navigation_over_network() {
    let server = MockServer::start().await;
    for n in 1..=4 {
        page(&server, &format!("/p{n}"), &format!("page {n}")).await;
    }

    let client = WebClient::new(ClientConfig {
        history: HistoryLimit::Unbounded,
        ..test_config()
    })
    .unwrap();
    let url = |n: u32| format!("{}/p{n}", server.uri());
    for n in 1..=3 {
        client.open(&url(n)).await.unwrap();
    }

    assert_eq!(client.back().unwrap().final_url(), url(2));
    assert_eq!(client.back().unwrap().final_url(), url(1));
    assert_eq!(client.forward().unwrap().final_url(), url(2));
    client.back();

    client.open(&url(4)).await.unwrap();
    assert_eq!(client.history().len(), 2);
    assert_eq!(client.back().unwrap().final_url(), url(1));
    assert_eq!(client.get(None).await.unwrap(), "page 1");
}

#[tokio::test]
async fn test_referer_points_at_linking_page() {
    let server = MockServer::start().await;
    page(&server, "/list", r#"<a href="/item/42">item 42</a>"#).await;
    let list = format!("{}/list", server.uri());
    Mock::given(method("GET"))
        .and(path("/item/42"))
        .and(header("referer", list.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("item"))
        .expect(1)
        .mount(&server)
        .await;

    let client = WebClient::new(ClientConfig {
        referer: true,
        ..test_config()
    })
    .unwrap();
    client.get(Some(list.as_str())).await.unwrap();
    let item = client
        .get(Some(format!("{}/item/42", server.uri()).as_str()))
        .await
        .unwrap();
    assert_eq!(item, "item");
}

#[tokio::test]
async fn test_download_saves_page() {
    let server = MockServer::start().await;
    page(&server, "/file", "file contents").await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("saved.html");
    let client = WebClient::new(test_config()).unwrap();
    client
        .download(&target, Some(format!("{}/file", server.uri()).as_str()))
        .await
        .unwrap();
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "file contents");
}

/// Serves `hello` on every connection, except that the first one sends the
/// headers and then stalls the body for `stall`. Returns the base URL and the
/// connection counter.
async fn stalling_server(stall: Duration) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let nth = counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let head = "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\n";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                if nth == 0 {
                    tokio::time::sleep(stall).await;
                }
                let _ = socket.write_all(b"hello").await;
                let _ = socket.shutdown().await;
            });
        }
    });
    (format!("http://{}", addr), connections)
}

#[tokio::test]
async fn test_stalled_body_is_retried_as_timeout() {
    let (base, connections) = stalling_server(Duration::from_secs(3)).await;

    let client = WebClient::new(ClientConfig {
        timeout: Some(Duration::from_millis(500)),
        retry_on_timeout: Some(2),
        ..test_config()
    })
    .unwrap();
    let url = format!("{}/slow", base);
    assert_eq!(client.get(Some(url.as_str())).await.unwrap(), "hello");
    assert_eq!(connections.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stalled_body_surfaces_timeout_without_retry() {
    let (base, connections) = stalling_server(Duration::from_secs(3)).await;

    let client = WebClient::new(ClientConfig {
        timeout: Some(Duration::from_millis(500)),
        ..test_config()
    })
    .unwrap();
    let url = format!("{}/slow", base);
    let err = client.open(&url).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(connections.load(Ordering::SeqCst), 1);
    // A failed attempt is not recorded
    assert!(client.history().is_empty());
}
