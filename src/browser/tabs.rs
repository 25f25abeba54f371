use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::error::{DvDebugError, Result};

/// Page info from CDP /json/list endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub page_type: String,
    pub web_socket_debugger_url: Option<String>,
}

fn http_client() -> reqwest::Client {
    // Bypass any system proxy for loopback
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// List open pages on the browser's CDP port, filtered to real tabs
/// (no extensions, service workers, devtools).
pub async fn list_pages(cdp_port: u16) -> Result<Vec<PageInfo>> {
    let url = format!("http://127.0.0.1:{}/json/list", cdp_port);

    let response = http_client().get(&url).send().await.map_err(|e| {
        DvDebugError::CdpConnectionFailed(format!("Failed to list pages: {}", e))
    })?;

    let pages: Vec<PageInfo> = response.json().await.map_err(|e| {
        DvDebugError::CdpConnectionFailed(format!("Failed to parse page list: {}", e))
    })?;

    Ok(pages
        .into_iter()
        .filter(|p| p.page_type == "page")
        .collect())
}

/// Resolve the tab to drive: a pinned page id if configured, otherwise the
/// frontmost page. Fails with `NoActiveTab` when the browser has no tabs.
pub async fn resolve_active_tab(cdp_port: u16, tab_id: Option<&str>) -> Result<TabHandle> {
    let pages = list_pages(cdp_port).await?;

    let page = match tab_id {
        Some(id) => pages.into_iter().find(|p| p.id == id),
        None => pages.into_iter().next(),
    }
    .ok_or(DvDebugError::NoActiveTab)?;

    TabHandle::from_page(cdp_port, page)
}

/// Handle to a single browser tab, executing JavaScript in its page context
/// over the per-tab WebSocket debugger endpoint.
#[derive(Debug, Clone)]
pub struct TabHandle {
    pub id: String,
    pub url: String,
    ws_url: String,
    cdp_port: u16,
}

impl TabHandle {
    fn from_page(cdp_port: u16, page: PageInfo) -> Result<Self> {
        let ws_url = page.web_socket_debugger_url.ok_or_else(|| {
            DvDebugError::CdpConnectionFailed("Page has no WebSocket debugger URL".to_string())
        })?;

        Ok(Self {
            id: page.id,
            url: page.url,
            ws_url,
            cdp_port,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_page_for_tests(cdp_port: u16, page: PageInfo) -> Self {
        Self::from_page(cdp_port, page).unwrap()
    }

    /// Evaluate a JavaScript expression in the tab's page context and return
    /// its JSON value. One WebSocket round trip per call; no session state.
    pub async fn eval(&self, expression: &str) -> Result<serde_json::Value> {
        let (mut ws, _) = connect_async(&self.ws_url).await.map_err(|e| {
            DvDebugError::ExecutionFailed(format!("WebSocket connection failed: {}", e))
        })?;

        let cmd = serde_json::json!({
            "id": 1,
            "method": "Runtime.evaluate",
            "params": {
                "expression": expression,
                "returnByValue": true
            }
        });

        ws.send(Message::Text(cmd.to_string().into()))
            .await
            .map_err(|e| DvDebugError::ExecutionFailed(format!("Failed to send command: {}", e)))?;

        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let response: serde_json::Value = serde_json::from_str(text.as_str())?;
                    if response.get("id") != Some(&serde_json::json!(1)) {
                        continue;
                    }

                    if let Some(error) = response.get("error") {
                        return Err(DvDebugError::ExecutionFailed(error.to_string()));
                    }

                    let result = response
                        .get("result")
                        .cloned()
                        .unwrap_or(serde_json::Value::Null);

                    if let Some(exception) = result.get("exceptionDetails") {
                        let text = exception
                            .get("text")
                            .and_then(|t| t.as_str())
                            .unwrap_or("uncaught exception");
                        return Err(DvDebugError::ExecutionFailed(text.to_string()));
                    }

                    if let Some(value) = result.get("result").and_then(|r| r.get("value")) {
                        return Ok(value.clone());
                    }
                    return Ok(serde_json::Value::Null);
                }
                Ok(_) => continue,
                Err(e) => {
                    return Err(DvDebugError::ExecutionFailed(format!(
                        "WebSocket error: {}",
                        e
                    )))
                }
            }
        }

        Err(DvDebugError::ExecutionFailed(
            "No response received".to_string(),
        ))
    }

    /// Re-read this tab's current URL from /json/list. Detects SPA
    /// navigation, which changes location without a page load.
    pub async fn current_url(&self) -> Result<String> {
        let pages = list_pages(self.cdp_port).await?;
        pages
            .into_iter()
            .find(|p| p.id == self.id)
            .map(|p| p.url)
            .ok_or(DvDebugError::NoActiveTab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_info_deserializes_cdp_shape() {
        let json = r#"{
            "id": "ABC123",
            "title": "Dragvertising",
            "url": "https://dragvertising.com/",
            "type": "page",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/ABC123"
        }"#;

        let page: PageInfo = serde_json::from_str(json).unwrap();
        assert_eq!(page.id, "ABC123");
        assert_eq!(page.page_type, "page");
        assert!(page.web_socket_debugger_url.is_some());
    }

    #[test]
    fn tab_handle_requires_ws_url() {
        let page = PageInfo {
            id: "X".to_string(),
            title: String::new(),
            url: "https://dragvertising.com/".to_string(),
            page_type: "page".to_string(),
            web_socket_debugger_url: None,
        };

        assert!(matches!(
            TabHandle::from_page(9222, page),
            Err(DvDebugError::CdpConnectionFailed(_))
        ));
    }
}
