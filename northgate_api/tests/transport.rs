use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use northgate_api::{Error, PortalRequest, RequestHeaders, Transport, TransportConfig};
use wiremock::matchers::{body_string, header, header_exists, method, path};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config() -> TransportConfig {
    TransportConfig {
        max_attempts: 3,
        retry_delay: Duration::from_millis(0),
        timeout: Duration::from_secs(5),
        ..TransportConfig::default()
    }
}

#[tokio::test]
async fn get_injects_default_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header_exists("user-agent"))
        .and(header("referer", "https://www.wandsworth.gov.uk/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = Transport::new(fast_config()).unwrap();
    let resp = transport
        .get(&format!("{}/page", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.text(), "<html>ok</html>");
}

#[tokio::test]
async fn caller_headers_are_not_merged_with_defaults() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let transport = Transport::new(fast_config()).unwrap();
    let req = PortalRequest::get(format!("{}/page", mock_server.uri()))
        .with_headers(RequestHeaders::from_pairs([("x-probe", "yes")]));
    transport.send(&req).await.unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let headers = &received[0].headers;
    assert_eq!(headers.get("x-probe").unwrap(), "yes");
    assert!(headers.get("referer").is_none());
    assert!(headers.get("accept-language").is_none());
}

#[tokio::test]
async fn post_sends_form_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/form"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("a=1&b=2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("posted"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = Transport::new(fast_config()).unwrap();
    let url = format!("{}/form", mock_server.uri());
    let req = PortalRequest::post(&url, "a=1&b=2")
        .with_headers(RequestHeaders::postback(&mock_server.uri(), &url));
    let resp = transport.send(&req).await.unwrap();
    assert_eq!(resp.text(), "posted");
}

#[tokio::test]
async fn status_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = Transport::new(fast_config()).unwrap();
    let result = transport
        .get(&format!("{}/broken", mock_server.uri()))
        .await;

    match result {
        Err(Error::HttpStatus { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected HttpStatus error, got {:?}", other.map(|r| r.status)),
    }
}

#[tokio::test]
async fn connection_failure_exhausts_retries() {
    // Bind and immediately drop a listener so the port is closed.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let transport = Transport::new(fast_config()).unwrap();
    let result = transport.get(&format!("http://{}/", addr)).await;

    match result {
        Err(err @ Error::Transport { .. }) => {
            assert!(err.is_transient());
            if let Error::Transport { attempts, .. } = err {
                assert_eq!(attempts, 3);
            }
        }
        other => panic!("expected Transport error, got {:?}", other.map(|r| r.status)),
    }
}

#[tokio::test]
async fn content_type_is_captured() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        )
        .mount(&mock_server)
        .await;

    let transport = Transport::new(fast_config()).unwrap();
    let resp = transport
        .get(&format!("{}/doc.pdf", mock_server.uri()))
        .await
        .unwrap();
    assert!(resp.is_pdf());
    assert_eq!(resp.body, b"%PDF-1.4");
}

#[tokio::test]
async fn request_timeout_overrides_default_and_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .expect(3)
        .mount(&mock_server)
        .await;

    let transport = Transport::new(fast_config()).unwrap();
    let req = PortalRequest::get(format!("{}/slow", mock_server.uri()))
        .with_timeout(Duration::from_millis(50));
    let result = transport.send(&req).await;

    match result {
        Err(Error::Transport { attempts, source, .. }) => {
            assert_eq!(attempts, 3);
            assert!(source.is_timeout());
        }
        other => panic!("expected Transport error, got {:?}", other.map(|r| r.status)),
    }
}

#[tokio::test]
async fn stalled_body_is_retried_as_connectivity_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));

    let seen = Arc::clone(&connections);
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            seen.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                // promise 100 bytes, send 7, then stall
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nContent-Type: text/html\r\n\r\npartial")
                    .await;
                tokio::time::sleep(Duration::from_secs(5)).await;
            });
        }
    });

    let config = TransportConfig {
        max_attempts: 2,
        timeout: Duration::from_millis(200),
        ..fast_config()
    };
    let transport = Transport::new(config).unwrap();
    let result = transport.get(&format!("http://{}/stall", addr)).await;

    match result {
        Err(Error::Transport { attempts, .. }) => assert_eq!(attempts, 2),
        other => panic!("expected Transport error, got {:?}", other.map(|r| r.status)),
    }
    assert_eq!(connections.load(Ordering::SeqCst), 2);
}
