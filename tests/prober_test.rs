//! HTTP prober tests against a local mock server.

use leakcheck::probe::{HttpProber, Phase, PhaseRunner, Probe, ProbeStatus};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn http_prober(timeout: Duration) -> HttpProber {
    HttpProber::new("http", timeout).unwrap()
}

fn host_of(server: &MockServer) -> String {
    server.address().to_string()
}

#[tokio::test]
async fn test_probe_success_hits_phase_path_with_cache_buster() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let prober = http_prober(Duration::from_secs(5));
    let result = prober.probe(&host_of(&mock_server), Phase::Initial).await;

    assert_eq!(result.status, ProbeStatus::Success);
    assert!(result.error.is_none());
    assert!(result.duration > Duration::ZERO);
    assert_eq!(result.phase, Phase::Initial);

    let requests = mock_server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default().to_string();
    assert!(query.starts_with("cb="), "query was {query}");
}

#[tokio::test]
async fn test_probe_status_code_is_not_inspected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/probe"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let prober = http_prober(Duration::from_secs(5));
    let result = prober.probe(&host_of(&mock_server), Phase::Liveness).await;

    assert_eq!(result.status, ProbeStatus::Success);
}

#[tokio::test]
async fn test_probe_timeout_is_measured() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/probe"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let prober = http_prober(Duration::from_millis(300));
    let result = prober.probe(&host_of(&mock_server), Phase::Liveness).await;

    assert_eq!(result.status, ProbeStatus::Timeout);
    assert!(result.error.is_some());
    assert!(result.duration >= Duration::from_millis(300));
    assert!(result.duration < Duration::from_secs(3));
}

#[tokio::test]
async fn test_probe_connection_refused_is_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let prober = http_prober(Duration::from_secs(5));
    let result = prober
        .probe(&format!("127.0.0.1:{port}"), Phase::Initial)
        .await;

    assert_eq!(result.status, ProbeStatus::Error);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_runner_with_http_prober() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/probe"))
        .respond_with(ResponseTemplate::new(200))
        .expect(25)
        .mount(&mock_server)
        .await;

    let subdomains: Vec<String> = (0..25).map(|_| host_of(&mock_server)).collect();
    let runner = PhaseRunner::new(http_prober(Duration::from_secs(5)));
    let results = runner.run_phase(&subdomains, Phase::Liveness).await;

    assert_eq!(results.len(), 25);
    assert!(results.iter().all(|r| r.status == ProbeStatus::Success));

    // every request carries its own cache buster
    let requests = mock_server.received_requests().await.unwrap();
    let mut busters: Vec<String> = requests
        .iter()
        .map(|r| r.url.query().unwrap_or_default().to_string())
        .collect();
    busters.sort();
    busters.dedup();
    assert_eq!(busters.len(), 25);
}

/// Keep-alive HTTP server that counts accepted connections.
async fn counting_server() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let body = r#"{"ip":"203.0.113.7","isp":"Example ISP"}"#;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                let mut buf = [0u8; 4096];
                while let Ok(n) = socket.read(&mut buf).await {
                    if n == 0 || socket.write_all(response.as_bytes()).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    (addr, accepted)
}

#[tokio::test]
async fn test_each_request_opens_a_new_connection() {
    let (addr, accepted) = counting_server().await;
    let prober = http_prober(Duration::from_secs(5));

    for _ in 0..3 {
        let result = prober.probe(&addr.to_string(), Phase::Liveness).await;
        assert_eq!(result.status, ProbeStatus::Success);
    }

    assert_eq!(accepted.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_aborted_handshake_is_tls_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            // Read the whole ClientHello record, then hang up without answering.
            let mut header = [0u8; 5];
            if socket.read_exact(&mut header).await.is_err() {
                continue;
            }
            let len = u16::from_be_bytes([header[3], header[4]]) as usize;
            let mut record = vec![0u8; len];
            let _ = socket.read_exact(&mut record).await;
        }
    });

    let prober = HttpProber::new("https", Duration::from_secs(5)).unwrap();
    let result = prober.probe(&addr.to_string(), Phase::Initial).await;

    assert_eq!(result.status, ProbeStatus::TlsError, "{:?}", result.error);
}

#[tokio::test]
async fn test_https_against_plain_http_server() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let prober = HttpProber::new("https", Duration::from_secs(5)).unwrap();
    let result = prober.probe(&host_of(&mock_server), Phase::Initial).await;

    assert_ne!(result.status, ProbeStatus::Success);
    assert_ne!(result.status, ProbeStatus::Timeout);

    // The error text carries the whole source chain, and the status follows it.
    let text = result.error.unwrap();
    assert!(text.contains(": "), "{text}");
    let tls_text = ["tls", "TLS", "SSL", "x509", "certificate"]
        .iter()
        .any(|token| text.contains(token));
    assert_eq!(result.status == ProbeStatus::TlsError, tls_text, "{text}");
}
