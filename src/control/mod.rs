//! Loopback control channel between one-shot CLI invocations and a running
//! agent. One JSON request per WebSocket text frame, answered on the same
//! socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use crate::error::{DvDebugError, Result};

/// Request kinds the agent answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlRequest {
    /// Liveness echo
    Ping,
    /// Trigger an injection attempt now
    InjectDebug,
    /// Report what the page currently exposes
    CheckStatus,
}

/// What check-status reports about the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelProbe {
    pub has_api: bool,
    pub is_injected: bool,
    pub has_component: bool,
    pub has_react: bool,
    #[serde(rename = "hasReactDOM")]
    pub has_react_dom: bool,
    pub is_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlResponse {
    Status {
        success: bool,
        status: PanelProbe,
    },
    Pong {
        success: bool,
        timestamp: u64,
    },
    Injected {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Answers control requests. The agent is the one real implementation; the
/// seam exists so the channel can be tested against a canned handler.
#[async_trait]
pub trait ControlHandler: Send + Sync {
    async fn handle(&self, request: ControlRequest) -> ControlResponse;
}

/// Serve the control channel for a running agent. Loopback only; every text
/// frame is parsed as one `ControlRequest` and answered asynchronously.
/// Runs until the task is dropped.
pub async fn serve(port: u16, handler: Arc<dyn ControlHandler>) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| DvDebugError::ControlChannel(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Control channel listening on ws://{}", addr);

    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| DvDebugError::ControlChannel(format!("Accept failed: {}", e)))?;

        if !peer.ip().is_loopback() {
            tracing::warn!("Rejected non-loopback connection from {}", peer);
            drop(stream);
            continue;
        }

        tracing::debug!("Control connection from {}", peer);
        let handler = Arc::clone(&handler);
        tokio::spawn(handle_connection(stream, handler));
    }
}

async fn handle_connection(stream: TcpStream, handler: Arc<dyn ControlHandler>) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut write, mut read) = ws.split();

    while let Some(msg) = read.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!("Control connection error: {}", e);
                break;
            }
        };

        let reply = match serde_json::from_str::<ControlRequest>(text.as_str()) {
            Ok(request) => {
                tracing::debug!("Control request: {:?}", request);
                serde_json::to_string(&handler.handle(request).await)
            }
            Err(e) => serde_json::to_string(&ControlResponse::Injected {
                success: false,
                error: Some(format!("Unrecognized request: {}", e)),
            }),
        };

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Failed to serialize control response: {}", e);
                continue;
            }
        };

        if write.send(Message::Text(reply.into())).await.is_err() {
            break;
        }
    }
}

/// One-shot client: connect, send a single request, read a single response.
pub async fn request(port: u16, request: &ControlRequest) -> Result<ControlResponse> {
    let url = format!("ws://127.0.0.1:{}", port);

    let connect = tokio_tungstenite::connect_async(&url);
    let (mut ws, _) = tokio::time::timeout(Duration::from_secs(5), connect)
        .await
        .map_err(|_| DvDebugError::ControlChannel("Connection timed out".to_string()))?
        .map_err(|e| {
            DvDebugError::ControlChannel(format!(
                "No agent on port {} ({}). Start one with 'dvdebug agent run'.",
                port, e
            ))
        })?;

    let payload = serde_json::to_string(request)?;
    ws.send(Message::Text(payload.into()))
        .await
        .map_err(|e| DvDebugError::ControlChannel(format!("Send failed: {}", e)))?;

    let reply = tokio::time::timeout(Duration::from_secs(30), async {
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Text(text)) => return Ok(text.to_string()),
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    return Err(DvDebugError::ControlChannel(format!(
                        "Receive failed: {}",
                        e
                    )))
                }
            }
        }
        Err(DvDebugError::ControlChannel(
            "Connection closed before a response arrived".to_string(),
        ))
    })
    .await
    .map_err(|_| DvDebugError::ControlChannel("Response timed out".to_string()))??;

    Ok(serde_json::from_str(&reply)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_use_kebab_case_tags() {
        assert_eq!(
            serde_json::to_value(&ControlRequest::Ping).unwrap(),
            serde_json::json!({ "type": "ping" })
        );
        assert_eq!(
            serde_json::to_value(&ControlRequest::InjectDebug).unwrap(),
            serde_json::json!({ "type": "inject-debug" })
        );
        assert_eq!(
            serde_json::to_value(&ControlRequest::CheckStatus).unwrap(),
            serde_json::json!({ "type": "check-status" })
        );
    }

    #[test]
    fn status_response_is_camel_case_on_the_wire() {
        let response = ControlResponse::Status {
            success: true,
            status: PanelProbe {
                has_api: true,
                is_injected: true,
                has_component: true,
                has_react: true,
                has_react_dom: false,
                is_open: false,
            },
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"]["hasApi"], true);
        assert_eq!(value["status"]["hasReactDOM"], false);
        assert_eq!(value["status"]["isOpen"], false);
    }

    #[test]
    fn injected_error_roundtrips() {
        let json = r#"{ "success": false, "error": "Timed out waiting for debug component" }"#;
        let response: ControlResponse = serde_json::from_str(json).unwrap();

        match response {
            ControlResponse::Injected { success, error } => {
                assert!(!success);
                assert!(error.unwrap().contains("debug component"));
            }
            other => panic!("expected Injected, got {:?}", other),
        }
    }

    #[test]
    fn pong_deserializes_before_injected() {
        let json = r#"{ "success": true, "timestamp": 1724500000000 }"#;
        let response: ControlResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response, ControlResponse::Pong { .. }));
    }
}
