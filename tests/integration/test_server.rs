//! Integration tests against a live server: HTTP API, WebSocket events and
//! static image files.

use std::net::SocketAddr;
use std::time::Duration;

use coast_engine::{create_router, AppState, Coast, Config, ImageRecord, Manifest};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    _images: TempDir,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

fn manifest() -> Manifest {
    Manifest::new(vec![
        ImageRecord::new("west-seattle-01", "west/seattle-01.jpg", "Seattle", Coast::West),
        ImageRecord::new("east-miami-01", "east/miami-01.jpg", "Miami", Coast::East),
    ])
}

/// Starts a server with short feedback delays and a temp images directory.
async fn spawn_test_server() -> TestServer {
    let images = TempDir::new().expect("temp dir");
    std::fs::create_dir_all(images.path().join("west")).expect("mkdir");
    std::fs::write(images.path().join("west/seattle-01.jpg"), b"jpeg bytes").expect("write");

    let mut config = Config::default();
    config.images_dir = images.path().display().to_string();
    config.feedback.correct_delay_ms = 20;
    config.feedback.incorrect_delay_ms = 30;

    let router = create_router(AppState::new(config, manifest()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    TestServer {
        addr,
        _images: images,
        _handle: handle,
    }
}

async fn connect_client(server: &TestServer) -> WsClient {
    let (ws_stream, _) = connect_async(server.ws_url())
        .await
        .expect("Failed to connect to WebSocket");
    ws_stream
}

/// Receives the next event, answering pings along the way.
async fn receive_event(client: &mut WsClient) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timeout waiting for message")
            .expect("Stream ended")
            .expect("WebSocket error");

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("Failed to parse event");
            }
            Message::Ping(data) => {
                client
                    .send(Message::Pong(data))
                    .await
                    .expect("Failed to send pong");
            }
            Message::Pong(_) => {}
            other => unreachable!("Expected text message, got: {other:?}"),
        }
    }
}

async fn post_guess(http: &reqwest::Client, server: &TestServer, coast: &str) -> Value {
    http.post(server.url("/api/round/guess"))
        .json(&json!({ "guess": coast }))
        .send()
        .await
        .expect("guess request")
        .json()
        .await
        .expect("guess body")
}

fn opposite(coast: &str) -> &'static str {
    if coast == "west" {
        "east"
    } else {
        "west"
    }
}

// ============================================================================
// HTTP API
// ============================================================================

#[tokio::test]
async fn test_round_lifecycle_over_http() {
    let server = spawn_test_server().await;
    let http = reqwest::Client::new();

    let response = http.get(server.url("/api/round")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let response = http.post(server.url("/api/round")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let round: Value = response.json().await.unwrap();
    assert_eq!(round["progress"]["total"], 2);
    assert_eq!(round["state"]["phase"], "awaiting_guess");

    let coast = round["currentImage"]["coast"].as_str().unwrap().to_string();
    let city = round["currentImage"]["city"].as_str().unwrap().to_string();

    let body = post_guess(&http, &server, opposite(&coast)).await;
    assert_eq!(body["accepted"], true);
    assert_eq!(body["feedback"]["isCorrect"], false);
    assert_eq!(body["feedback"]["city"], city.as_str());

    let body = post_guess(&http, &server, &coast).await;
    assert_eq!(body["accepted"], false);
    assert_eq!(body["reason"], "feedback_pending");

    tokio::time::sleep(Duration::from_millis(200)).await;

    let round: Value = http
        .get(server.url("/api/round"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(round["state"]["phase"], "terminated");
    assert_eq!(round["state"]["finalScore"], 0);
    assert_eq!(round["state"]["offendingCity"], city.as_str());
}

#[tokio::test]
async fn test_manifest_and_images_are_served() {
    let server = spawn_test_server().await;
    let http = reqwest::Client::new();

    let manifest: Value = http
        .get(server.url("/api/manifest"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(manifest["images"].as_array().unwrap().len(), 2);

    let image = http
        .get(server.url("/images/west/seattle-01.jpg"))
        .send()
        .await
        .unwrap();
    assert_eq!(image.status(), reqwest::StatusCode::OK);
    assert_eq!(image.bytes().await.unwrap().as_ref(), b"jpeg bytes");

    let missing = http
        .get(server.url("/images/east/nowhere.jpg"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
}

// ============================================================================
// WebSocket
// ============================================================================

#[tokio::test]
async fn test_connected_event_without_round() {
    let server = spawn_test_server().await;
    let mut client = connect_client(&server).await;

    let event = receive_event(&mut client).await;
    assert_eq!(event["event"], "connected");
    assert!(event["payload"]["round"].is_null());
}

#[tokio::test]
async fn test_perfect_round_streams_events() {
    let server = spawn_test_server().await;
    let http = reqwest::Client::new();
    let mut client = connect_client(&server).await;
    assert_eq!(receive_event(&mut client).await["event"], "connected");

    http.post(server.url("/api/round")).send().await.unwrap();
    let started = receive_event(&mut client).await;
    assert_eq!(started["event"], "round_started");

    let first = started["payload"]["round"]["currentImage"]["coast"]
        .as_str()
        .unwrap()
        .to_string();
    post_guess(&http, &server, &first).await;

    let feedback = receive_event(&mut client).await;
    assert_eq!(feedback["event"], "feedback");
    assert_eq!(feedback["payload"]["feedback"]["isCorrect"], true);

    let advanced = receive_event(&mut client).await;
    assert_eq!(advanced["event"], "round_advanced");
    assert_eq!(advanced["payload"]["round"]["state"]["streak"], 1);

    let second = advanced["payload"]["round"]["currentImage"]["coast"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(first, second);
    post_guess(&http, &server, &second).await;

    assert_eq!(receive_event(&mut client).await["event"], "feedback");

    let over = receive_event(&mut client).await;
    assert_eq!(over["event"], "game_over");
    assert_eq!(over["payload"]["result"]["finalScore"], 2);
    assert!(over["payload"]["result"]["offendingCity"].is_null());
    assert_eq!(over["payload"]["message"], "You got them all!");
}

#[tokio::test]
async fn test_late_client_sees_current_round() {
    let server = spawn_test_server().await;
    let http = reqwest::Client::new();
    http.post(server.url("/api/round")).send().await.unwrap();

    let mut client = connect_client(&server).await;
    let event = receive_event(&mut client).await;

    assert_eq!(event["event"], "connected");
    assert_eq!(event["payload"]["round"]["progress"]["total"], 2);
}

#[tokio::test]
async fn test_server_continues_after_client_disconnect() {
    let server = spawn_test_server().await;

    let mut first = connect_client(&server).await;
    receive_event(&mut first).await;
    first.close(None).await.expect("close");

    let mut second = connect_client(&server).await;
    assert_eq!(receive_event(&mut second).await["event"], "connected");
}
