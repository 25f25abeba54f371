use std::time::Duration;

use serde::Serialize;

use crate::browser::{resolve_active_tab, TabHandle};
use crate::config::{Config, OriginsConfig};
use crate::error::{DvDebugError, Result};
use crate::remote::ops::RemoteOp;

/// Panel state as read from the page.
#[derive(Debug, Clone, Serialize)]
pub struct PanelState {
    pub is_open: bool,
    pub tool: String,
}

/// What one status poll knows about the world.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionState {
    pub connected: bool,
    pub is_open: bool,
    pub tool: Option<String>,
    pub tab_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionState {
    pub fn connected(tab_id: String, state: PanelState) -> Self {
        Self {
            connected: true,
            is_open: state.is_open,
            tool: Some(state.tool),
            tab_id: Some(tab_id),
            error: None,
        }
    }

    pub fn failed(tab_id: Option<String>, error: &DvDebugError) -> Self {
        Self {
            connected: false,
            is_open: false,
            tool: None,
            tab_id,
            error: Some(error.to_string()),
        }
    }
}

/// Check a tab URL against the allow-list: http/https only, host exactly the
/// dev host (port included) or the production domain with an optional `www.`
/// prefix. Exact host comparison rejects suffix tricks like
/// `dragvertising.com.evil.com`. A bare host with no trailing slash also
/// passes; `/json/list` always reports tab URLs with at least a `/` path,
/// so the two spellings name the same page.
pub fn allowed_url(url: &str, origins: &OriginsConfig) -> bool {
    let Some((scheme, rest)) = url.split_once("://") else {
        return false;
    };
    if scheme != "http" && scheme != "https" {
        return false;
    }

    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .to_lowercase();
    if host.is_empty() {
        return false;
    }

    host == origins.dev_host.to_lowercase()
        || host == origins.production_domain.to_lowercase()
        || host == format!("www.{}", origins.production_domain.to_lowercase())
}

/// Bridges user commands to the page's debug API. No persistent connection:
/// every operation is a fresh one-shot execution against the resolved tab.
pub struct RemoteControl {
    config: Config,
    tab: TabHandle,
}

impl RemoteControl {
    /// Resolve the active tab and wrap it. Does not validate the URL yet -
    /// `load_state` does, so the caller gets the guidance message.
    pub async fn connect(config: Config) -> Result<Self> {
        let tab = resolve_active_tab(config.cdp.port, config.cdp.tab.as_deref()).await?;
        Ok(Self { config, tab })
    }

    pub fn tab_id(&self) -> &str {
        &self.tab.id
    }

    pub fn tab_url(&self) -> &str {
        &self.tab.url
    }

    /// Execute one remote operation and classify its envelope.
    pub async fn execute(&self, op: &RemoteOp) -> Result<serde_json::Value> {
        let js = op.render(&self.config.keys);
        let envelope = self.tab.eval(&js).await?;

        match envelope.get("ok").and_then(|v| v.as_bool()) {
            Some(true) => Ok(envelope),
            Some(false) => {
                let reason = envelope
                    .get("error")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                if reason == "api-unavailable" {
                    Err(DvDebugError::ApiUnavailable)
                } else {
                    Err(DvDebugError::ExecutionFailed(reason.to_string()))
                }
            }
            None => Err(DvDebugError::StateUnreadable),
        }
    }

    /// Full state load: allow-list gate, best-effort injection nudge, settle,
    /// then read.
    pub async fn load_state(&self) -> Result<PanelState> {
        if !allowed_url(&self.tab.url, &self.config.origins) {
            return Err(DvDebugError::UrlNotAllowed(self.tab.url.clone()));
        }

        // Non-fatal: a page with no listener simply ignores the event.
        if let Err(e) = self.execute(&RemoteOp::RequestInjection).await {
            tracing::debug!("Injection request not delivered: {}", e);
        }

        tokio::time::sleep(Duration::from_millis(self.config.timing.settle_ms)).await;

        let envelope = self.execute(&RemoteOp::GetState).await?;
        Self::classify_state(envelope)
    }

    fn classify_state(envelope: serde_json::Value) -> Result<PanelState> {
        if envelope.is_null() {
            return Err(DvDebugError::StateUnreadable);
        }

        let has_api = envelope
            .get("hasApi")
            .and_then(|v| v.as_bool())
            .ok_or(DvDebugError::StateUnreadable)?;
        if !has_api {
            return Err(DvDebugError::ApiUnavailable);
        }

        Ok(PanelState {
            is_open: envelope
                .get("isOpen")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            tool: envelope
                .get("tool")
                .and_then(|v| v.as_str())
                .unwrap_or("role")
                .to_string(),
        })
    }
}
