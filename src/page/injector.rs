use std::time::Duration;

use crate::browser::TabHandle;
use crate::config::{StorageKeys, TimingConfig};
use crate::control::PanelProbe;
use crate::error::{DvDebugError, Result};
use crate::page::wait::poll_until;

/// Well-known id of the injected container element. The injection flag and
/// this element must agree: the flag is true iff the container exists.
pub const CONTAINER_ID: &str = "dv-debug-ext-root";

/// Injection flag on the page's global scope.
pub const INJECTED_FLAG: &str = "__dvDebugInjected";

/// Global namespace the host app publishes the mountable panel under.
pub const COMPONENT_NAMESPACE: &str = "DvDebugComponents";
pub const COMPONENT_NAME: &str = "DebugPanel";

/// Custom events on the page: emitted after a successful mount, and listened
/// for as an on-demand injection request.
pub const INJECTED_EVENT: &str = "dv-debug-injected";
pub const REQUEST_INJECT_EVENT: &str = "dv-debug-request-inject";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectPhase {
    Idle,
    WaitingForDependencies,
    Mounted,
}

/// Mounts the host-page-provided debug panel into the DOM.
///
/// The host app only defines the component; it never mounts it for regular
/// users. The injector waits for the component namespace and the rendering
/// library to appear on the page's global scope, then mounts the panel into
/// a fixed-position overlay container appended to the body.
pub struct Injector {
    tab: TabHandle,
    keys: StorageKeys,
    timing: TimingConfig,
    phase: InjectPhase,
}

/// Outcome of one injection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
    Mounted,
    AlreadyMounted,
}

impl Injector {
    pub fn new(tab: TabHandle, keys: StorageKeys, timing: TimingConfig) -> Self {
        Self {
            tab,
            keys,
            timing,
            phase: InjectPhase::Idle,
        }
    }

    pub fn phase(&self) -> InjectPhase {
        self.phase
    }

    /// Delay before the first attempt: longer while the document is still
    /// loading, shorter once it has settled.
    pub async fn initial_delay(&self) -> Duration {
        let still_loading = self
            .tab
            .eval("document.readyState === 'loading'")
            .await
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if still_loading {
            Duration::from_millis(self.timing.initial_delay_loading_ms)
        } else {
            Duration::from_millis(self.timing.initial_delay_ready_ms)
        }
    }

    /// One injection attempt: idempotent, aborts without side effects on
    /// dependency timeout.
    pub async fn attempt(&mut self) -> Result<InjectOutcome> {
        if self.is_injected().await? {
            tracing::debug!("Panel already mounted, skipping injection");
            self.phase = InjectPhase::Mounted;
            return Ok(InjectOutcome::AlreadyMounted);
        }

        self.phase = InjectPhase::WaitingForDependencies;
        if let Err(e) = self.wait_for_dependencies().await {
            self.phase = InjectPhase::Idle;
            return Err(e);
        }

        match self.mount().await {
            Ok(()) => {
                self.phase = InjectPhase::Mounted;
                Ok(InjectOutcome::Mounted)
            }
            Err(e) => {
                self.phase = InjectPhase::Idle;
                Err(e)
            }
        }
    }

    /// Injection flag and container must both be present to count as
    /// injected; a half-state (stale flag after DOM teardown) re-injects.
    async fn is_injected(&self) -> Result<bool> {
        let js = format!(
            "!!(window.{flag} && document.getElementById('{container}'))",
            flag = INJECTED_FLAG,
            container = CONTAINER_ID,
        );
        Ok(self.tab.eval(&js).await?.as_bool().unwrap_or(false))
    }

    /// Poll the tab until a boolean expression turns true.
    async fn wait_for_global(
        &self,
        label: &str,
        expression: &str,
        timeout: Duration,
    ) -> Result<()> {
        let tab = &self.tab;
        poll_until(
            label,
            timeout,
            Duration::from_millis(self.timing.dependency_poll_ms),
            move || async move {
                let present = tab.eval(expression).await?;
                Ok(present.as_bool().unwrap_or(false).then_some(()))
            },
        )
        .await
    }

    async fn wait_for_dependencies(&self) -> Result<()> {
        let component_js = format!(
            "!!(window.{ns} && window.{ns}.{name})",
            ns = COMPONENT_NAMESPACE,
            name = COMPONENT_NAME,
        );
        self.wait_for_global(
            "debug component",
            &component_js,
            Duration::from_millis(self.timing.component_timeout_ms),
        )
        .await?;

        self.wait_for_global(
            "rendering library",
            "!!(window.React && window.ReactDOM && typeof window.ReactDOM.createRoot === 'function')",
            Duration::from_millis(self.timing.renderer_timeout_ms),
        )
        .await?;

        Ok(())
    }

    async fn mount(&self) -> Result<()> {
        // The body can lag behind the globals on slow first paints.
        self.wait_for_global(
            "document body",
            "!!document.body",
            Duration::from_millis(self.timing.component_timeout_ms),
        )
        .await?;

        let js = format!(
            r#"(function () {{
                try {{
                    if (window.{flag} && document.getElementById('{container}')) {{
                        return {{ ok: true, already: true }};
                    }}
                    var stale = document.getElementById('{container}');
                    if (stale && stale.parentNode) {{
                        stale.parentNode.removeChild(stale);
                    }}
                    var container = document.createElement('div');
                    container.id = '{container}';
                    container.style.position = 'fixed';
                    container.style.top = '0';
                    container.style.left = '0';
                    container.style.width = '100vw';
                    container.style.height = '100vh';
                    container.style.zIndex = '2147483647';
                    container.style.pointerEvents = 'none';
                    document.body.appendChild(container);
                    var root = window.ReactDOM.createRoot(container);
                    root.render(window.React.createElement(window.{ns}.{name}));
                    window.{flag} = true;
                    document.dispatchEvent(new CustomEvent('{event}', {{
                        detail: {{ container: container, root: root }}
                    }}));
                    return {{ ok: true, already: false }};
                }} catch (e) {{
                    return {{ ok: false, error: String(e && e.message || e) }};
                }}
            }})()"#,
            flag = INJECTED_FLAG,
            container = CONTAINER_ID,
            ns = COMPONENT_NAMESPACE,
            name = COMPONENT_NAME,
            event = INJECTED_EVENT,
        );

        let envelope = self.tab.eval(&js).await?;
        if envelope.get("ok").and_then(|v| v.as_bool()) == Some(true) {
            tracing::info!("Debug panel mounted into #{}", CONTAINER_ID);
            return Ok(());
        }

        let reason = envelope
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("mount returned no envelope")
            .to_string();
        Err(DvDebugError::ExecutionFailed(reason))
    }

    /// SPA navigation reset: clear the in-page flag so the next attempt
    /// mounts fresh. The container is gone with the old view anyway.
    pub async fn reset_for_navigation(&mut self) -> Result<()> {
        self.phase = InjectPhase::Idle;
        let js = format!("window.{flag} = false; true", flag = INJECTED_FLAG);
        self.tab.eval(&js).await?;
        Ok(())
    }

    /// Snapshot of everything the check-status request reports.
    pub async fn probe(&self) -> Result<PanelProbe> {
        let js = format!(
            r#"(function () {{
                var hasApi = !!window.dvDebug;
                var isOpen = false;
                try {{
                    isOpen = hasApi
                        ? !!window.dvDebug.isOpen()
                        : localStorage.getItem({vis_key}) === '1';
                }} catch (e) {{}}
                return {{
                    hasApi: hasApi,
                    isInjected: !!(window.{flag} && document.getElementById('{container}')),
                    hasComponent: !!(window.{ns} && window.{ns}.{name}),
                    hasReact: !!window.React,
                    hasReactDOM: !!(window.ReactDOM && typeof window.ReactDOM.createRoot === 'function'),
                    isOpen: isOpen
                }};
            }})()"#,
            vis_key = serde_json::to_string(&self.keys.visibility)?,
            flag = INJECTED_FLAG,
            container = CONTAINER_ID,
            ns = COMPONENT_NAMESPACE,
            name = COMPONENT_NAME,
        );

        let value = self.tab.eval(&js).await?;
        serde_json::from_value(value).map_err(|_| DvDebugError::StateUnreadable)
    }
}
