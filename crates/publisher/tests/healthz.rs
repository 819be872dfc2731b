use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use publisher::{AppState, SubscriberRegistry};

async fn get_healthz(addr: std::net::SocketAddr) -> serde_json::Value {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "unexpected response: {response}");
    let body = response.split("\r\n\r\n").nth(1).unwrap();
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn healthz_reports_subscriber_count() {
    let registry = SubscriberRegistry::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(publisher::serve(
        AppState {
            registry: registry.clone(),
        },
        listener,
    ));

    let body = get_healthz(addr).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["subscribers"], 0);

    let (_a, _rx_a) = registry.subscribe().await;
    let (_b, _rx_b) = registry.subscribe().await;
    let body = get_healthz(addr).await;
    assert_eq!(body["subscribers"], 2);
}
