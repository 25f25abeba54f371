use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;

use crate::browser::{resolve_active_tab, TabHandle};
use crate::config::Config;
use async_trait::async_trait;

use crate::control::{self, ControlHandler, ControlRequest, ControlResponse};
use crate::error::{DvDebugError, Result};
use crate::page::injector::REQUEST_INJECT_EVENT;
use crate::page::{Injector, PresenceBeacon};
use crate::remote::allowed_url;

/// The page-side half of the system, attached to one tab: presence beacon,
/// component injector with SPA-navigation re-attempts, and the control
/// channel answering ping / inject-debug / check-status.
pub struct PageAgent {
    tab: TabHandle,
    config: Config,
    injector: Mutex<Injector>,
}

impl PageAgent {
    /// Resolve the active tab and attach. Refuses tabs outside the
    /// allow-list up front.
    pub async fn attach(config: Config) -> Result<Self> {
        let tab = resolve_active_tab(config.cdp.port, config.cdp.tab.as_deref()).await?;

        if !allowed_url(&tab.url, &config.origins) {
            return Err(DvDebugError::UrlNotAllowed(tab.url));
        }

        let injector = Mutex::new(Injector::new(
            tab.clone(),
            config.keys.clone(),
            config.timing.clone(),
        ));

        Ok(Self {
            tab,
            config,
            injector,
        })
    }

    pub fn tab_url(&self) -> &str {
        &self.tab.url
    }

    pub fn control_port(&self) -> u16 {
        self.config.control.port
    }

    /// Run until Ctrl-C: beacon heartbeats, injection attempts, navigation
    /// watching, and the control server, all cooperatively on one tab.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let beacon = PresenceBeacon::new(
            self.tab.clone(),
            self.config.keys.clone(),
            Duration::from_millis(self.config.timing.heartbeat_ms),
        );

        let handler: Arc<dyn ControlHandler> = Arc::clone(&self) as Arc<dyn ControlHandler>;
        let control = control::serve(self.config.control.port, handler);

        tokio::select! {
            r = control => r,
            _ = beacon.run() => Ok(()),
            _ = self.page_loop() => Ok(()),
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down agent");
                Ok(())
            }
        }
    }

    /// Initial injection attempt, then watch for SPA navigation and in-page
    /// injection requests. Auto-attempt failures are swallowed and logged at
    /// debug level - an on-demand inject-debug can still succeed later.
    async fn page_loop(&self) {
        let delay = self.injector.lock().await.initial_delay().await;
        tokio::time::sleep(delay).await;

        self.install_request_listener().await;
        self.auto_attempt().await;

        let mut last_url = self.tab.url.clone();
        let poll = Duration::from_millis(self.config.timing.navigation_delay_ms);

        loop {
            tokio::time::sleep(poll).await;

            match self.tab.current_url().await {
                Ok(url) if url != last_url => {
                    tracing::debug!("Navigation detected: {} -> {}", last_url, url);
                    last_url = url;

                    if let Err(e) = self.injector.lock().await.reset_for_navigation().await {
                        tracing::debug!("Could not reset injection flag: {}", e);
                    }

                    tokio::time::sleep(Duration::from_millis(
                        self.config.timing.navigation_delay_ms,
                    ))
                    .await;
                    self.install_request_listener().await;
                    self.auto_attempt().await;
                }
                Ok(_) => {
                    if self.take_injection_request().await {
                        self.auto_attempt().await;
                    }
                }
                Err(e) => {
                    tracing::debug!("Tab poll failed: {}", e);
                }
            }
        }
    }

    async fn auto_attempt(&self) {
        if let Err(e) = self.injector.lock().await.attempt().await {
            tracing::debug!("Auto-injection attempt failed: {}", e);
        }
    }

    /// One listener for the lifetime of the page: flips a flag we poll, so
    /// an injection request dispatched on the page reaches the injector
    /// without a push channel from the page.
    async fn install_request_listener(&self) {
        let js = format!(
            r#"(function () {{
                if (window.__dvDebugInjectListener) return true;
                window.__dvDebugInjectListener = true;
                document.addEventListener('{event}', function () {{
                    window.__dvDebugInjectRequested = true;
                }});
                return true;
            }})()"#,
            event = REQUEST_INJECT_EVENT,
        );

        if let Err(e) = self.tab.eval(&js).await {
            tracing::debug!("Could not install injection-request listener: {}", e);
        }
    }

    async fn take_injection_request(&self) -> bool {
        let js = r#"(function () {
            var requested = window.__dvDebugInjectRequested === true;
            window.__dvDebugInjectRequested = false;
            return requested;
        })()"#;

        self.tab
            .eval(js)
            .await
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Answer one control request. Every arm responds; nothing is dropped.
#[async_trait]
impl ControlHandler for PageAgent {
    async fn handle(&self, request: ControlRequest) -> ControlResponse {
        match request {
            ControlRequest::Ping => ControlResponse::Pong {
                success: true,
                timestamp: now_ms(),
            },
            ControlRequest::InjectDebug => {
                match self.injector.lock().await.attempt().await {
                    Ok(_) => ControlResponse::Injected {
                        success: true,
                        error: None,
                    },
                    Err(e) => ControlResponse::Injected {
                        success: false,
                        error: Some(e.to_string()),
                    },
                }
            }
            ControlRequest::CheckStatus => match self.injector.lock().await.probe().await {
                Ok(status) => ControlResponse::Status {
                    success: true,
                    status,
                },
                Err(e) => ControlResponse::Injected {
                    success: false,
                    error: Some(e.to_string()),
                },
            },
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_ms_is_non_decreasing() {
        let a = now_ms();
        let b = now_ms();
        assert!(b >= a);
        assert!(a > 1_700_000_000_000); // sanity: after Nov 2023
    }
}
