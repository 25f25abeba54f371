use std::time::Duration;

use crate::browser::TabHandle;
use crate::config::StorageKeys;
use crate::error::{DvDebugError, Result};

/// Presence beacon: marks the controller as alive on the page by writing a
/// flag and a millisecond timestamp to the page's localStorage.
///
/// This is a liveness signal only. Storage failures (disabled, quota) are
/// logged and never fatal - the host page works fine without the flag.
pub struct PresenceBeacon {
    tab: TabHandle,
    keys: StorageKeys,
    heartbeat: Duration,
}

impl PresenceBeacon {
    pub fn new(tab: TabHandle, keys: StorageKeys, heartbeat: Duration) -> Self {
        Self {
            tab,
            keys,
            heartbeat,
        }
    }

    /// Write both the presence flag and the timestamp.
    pub async fn announce(&self) -> Result<()> {
        let js = format!(
            r#"(function () {{
                try {{
                    localStorage.setItem({flag_key}, '1');
                    localStorage.setItem({ts_key}, Date.now().toString());
                    return {{ ok: true }};
                }} catch (e) {{
                    return {{ ok: false, error: String(e && e.message || e) }};
                }}
            }})()"#,
            flag_key = serde_json::to_string(&self.keys.presence)?,
            ts_key = serde_json::to_string(&self.keys.timestamp)?,
        );

        self.check_write(self.tab.eval(&js).await?)
    }

    /// Rewrite only the timestamp. `Date.now()` runs in the page, so the
    /// stored value is non-decreasing across heartbeats.
    pub async fn heartbeat(&self) -> Result<()> {
        let js = format!(
            r#"(function () {{
                try {{
                    localStorage.setItem({ts_key}, Date.now().toString());
                    return {{ ok: true }};
                }} catch (e) {{
                    return {{ ok: false, error: String(e && e.message || e) }};
                }}
            }})()"#,
            ts_key = serde_json::to_string(&self.keys.timestamp)?,
        );

        self.check_write(self.tab.eval(&js).await?)
    }

    fn check_write(&self, envelope: serde_json::Value) -> Result<()> {
        if envelope.get("ok").and_then(|v| v.as_bool()) == Some(true) {
            return Ok(());
        }

        let reason = envelope
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        Err(DvDebugError::StorageUnavailable(reason))
    }

    /// Announce once, then refresh the timestamp on the heartbeat cadence
    /// until the task is dropped. Failures are logged, never propagated.
    pub async fn run(&self) {
        if let Err(e) = self.announce().await {
            tracing::warn!("Could not set presence flag: {}", e);
        }

        let mut ticker = tokio::time::interval(self.heartbeat);
        ticker.tick().await; // first tick fires immediately

        loop {
            ticker.tick().await;
            if let Err(e) = self.heartbeat().await {
                tracing::warn!("Presence heartbeat failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beacon() -> PresenceBeacon {
        let page = crate::browser::PageInfo {
            id: "T".to_string(),
            title: String::new(),
            url: "http://localhost:8080/".to_string(),
            page_type: "page".to_string(),
            web_socket_debugger_url: Some("ws://127.0.0.1:9222/devtools/page/T".to_string()),
        };
        let tab = crate::browser::tabs::TabHandle::from_page_for_tests(9222, page);
        PresenceBeacon::new(tab, StorageKeys::default(), Duration::from_secs(5))
    }

    #[test]
    fn successful_write_envelope_is_ok() {
        let b = beacon();
        assert!(b.check_write(serde_json::json!({ "ok": true })).is_ok());
    }

    #[test]
    fn failed_write_reports_storage_unavailable() {
        let b = beacon();
        let result = b.check_write(serde_json::json!({ "ok": false, "error": "SecurityError" }));

        assert!(matches!(
            result,
            Err(DvDebugError::StorageUnavailable(reason)) if reason == "SecurityError"
        ));
    }

    #[test]
    fn null_envelope_reports_storage_unavailable() {
        let b = beacon();
        assert!(matches!(
            b.check_write(serde_json::Value::Null),
            Err(DvDebugError::StorageUnavailable(_))
        ));
    }
}
