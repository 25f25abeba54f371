//! Integration tests for the agent control channel.
//!
//! These spin up the real WebSocket server on a random port with a canned
//! handler and verify the request/response contract end to end.
//!
//! Run with: cargo test --test control_channel_test

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use dvdebug::control::{
    self, ControlHandler, ControlRequest, ControlResponse, PanelProbe,
};

/// Find a free port by binding to port 0 and reading the assigned port.
async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

struct CannedHandler {
    inject_calls: AtomicU32,
}

impl CannedHandler {
    fn new() -> Self {
        Self {
            inject_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ControlHandler for CannedHandler {
    async fn handle(&self, request: ControlRequest) -> ControlResponse {
        match request {
            ControlRequest::Ping => ControlResponse::Pong {
                success: true,
                timestamp: 1_724_500_000_000,
            },
            ControlRequest::InjectDebug => {
                self.inject_calls.fetch_add(1, Ordering::SeqCst);
                ControlResponse::Injected {
                    success: true,
                    error: None,
                }
            }
            ControlRequest::CheckStatus => ControlResponse::Status {
                success: true,
                status: PanelProbe {
                    has_api: true,
                    is_injected: false,
                    has_component: true,
                    has_react: true,
                    has_react_dom: true,
                    is_open: false,
                },
            },
        }
    }
}

/// Start the server with a canned handler, returning the port and the
/// handler for inspection.
async fn start_server() -> (u16, Arc<CannedHandler>) {
    let port = free_port().await;
    let handler = Arc::new(CannedHandler::new());

    let server_handler: Arc<dyn ControlHandler> = handler.clone();
    tokio::spawn(async move {
        let _ = control::serve(port, server_handler).await;
    });

    // Give the listener a moment to bind
    for _ in 0..50 {
        if tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    (port, handler)
}

#[tokio::test]
async fn ping_round_trips() {
    let (port, _) = start_server().await;

    let response = control::request(port, &ControlRequest::Ping).await.unwrap();

    match response {
        ControlResponse::Pong { success, timestamp } => {
            assert!(success);
            assert_eq!(timestamp, 1_724_500_000_000);
        }
        other => panic!("expected Pong, got {:?}", other),
    }
}

#[tokio::test]
async fn check_status_reports_the_probe() {
    let (port, _) = start_server().await;

    let response = control::request(port, &ControlRequest::CheckStatus)
        .await
        .unwrap();

    match response {
        ControlResponse::Status { success, status } => {
            assert!(success);
            assert!(status.has_api);
            assert!(!status.is_injected);
            assert!(status.has_react_dom);
        }
        other => panic!("expected Status, got {:?}", other),
    }
}

#[tokio::test]
async fn inject_debug_reaches_the_handler() {
    let (port, handler) = start_server().await;

    let response = control::request(port, &ControlRequest::InjectDebug)
        .await
        .unwrap();

    assert!(matches!(
        response,
        ControlResponse::Injected { success: true, .. }
    ));
    assert_eq!(handler.inject_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn multiple_requests_share_one_connection() {
    let (port, _) = start_server().await;

    let url = format!("ws://127.0.0.1:{}", port);
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

    for _ in 0..3 {
        ws.send(Message::Text(r#"{"type":"ping"}"#.to_string().into()))
            .await
            .unwrap();

        let reply = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => break text.to_string(),
                Some(Ok(_)) => continue,
                other => panic!("connection dropped: {:?}", other),
            }
        };

        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["success"], true);
    }
}

#[tokio::test]
async fn malformed_frames_get_an_error_payload_not_a_hangup() {
    let (port, _) = start_server().await;

    let url = format!("ws://127.0.0.1:{}", port);
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

    ws.send(Message::Text("this is not json".to_string().into()))
        .await
        .unwrap();

    let reply = loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => break text.to_string(),
            Some(Ok(_)) => continue,
            other => panic!("connection dropped: {:?}", other),
        }
    };

    let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(value["success"], false);

    // The connection survives for a valid follow-up
    ws.send(Message::Text(r#"{"type":"ping"}"#.to_string().into()))
        .await
        .unwrap();
    let reply = loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => break text.to_string(),
            Some(Ok(_)) => continue,
            other => panic!("connection dropped: {:?}", other),
        }
    };
    let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(value["success"], true);
}

#[tokio::test]
async fn request_fails_fast_when_no_agent_listens() {
    let port = free_port().await;

    let result = control::request(port, &ControlRequest::Ping).await;
    assert!(result.is_err());
}
