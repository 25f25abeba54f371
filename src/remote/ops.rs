use serde::Serialize;
use serde_json::Value;

use crate::config::StorageKeys;

/// Closed set of operations that run inside the page context.
///
/// Each renders to a self-contained IIFE with no closure over our state:
/// arguments are embedded as JSON literals and results come back as a JSON
/// envelope (`{ok: ...}`), never a thrown exception.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOp {
    /// `Some(true)` opens, `Some(false)` closes, `None` toggles.
    Toggle(Option<bool>),
    /// Select the active tool by identifier.
    SetTool(String),
    /// Read `{isOpen, tool, hasApi}`, preferring the live API and falling
    /// back to the page's localStorage keys.
    GetState,
    /// Ask any page-side listener (a running agent, the host app itself) to
    /// perform an injection attempt.
    RequestInjection,
}

/// Serialize a value for embedding in page JS, degrading instead of failing:
/// anything serde_json rejects (non-finite floats, non-string map keys)
/// becomes its display string, or null when no string form exists.
pub fn safe_json<T: Serialize + std::fmt::Debug>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(v) => v,
        Err(_) => Value::String(format!("{:?}", value)),
    }
}

fn embed(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

impl RemoteOp {
    /// Render the operation to a JavaScript expression.
    pub fn render(&self, keys: &StorageKeys) -> String {
        match self {
            RemoteOp::Toggle(desired) => {
                let desired = embed(&safe_json(desired));
                format!(
                    r#"(function () {{
                        var desired = {desired};
                        if (!window.dvDebug) {{
                            return {{ ok: false, error: 'api-unavailable' }};
                        }}
                        if (desired === true) {{
                            window.dvDebug.open();
                        }} else if (desired === false) {{
                            window.dvDebug.close();
                        }} else {{
                            window.dvDebug.toggle();
                        }}
                        return {{ ok: true }};
                    }})()"#
                )
            }
            RemoteOp::SetTool(tool) => {
                let tool = embed(&safe_json(tool));
                format!(
                    r#"(function () {{
                        if (!window.dvDebug) {{
                            return {{ ok: false, error: 'api-unavailable' }};
                        }}
                        window.dvDebug.setTool({tool});
                        return {{ ok: true }};
                    }})()"#
                )
            }
            RemoteOp::GetState => {
                let vis_key = embed(&safe_json(&keys.visibility));
                let tool_key = embed(&safe_json(&keys.tool));
                format!(
                    r#"(function () {{
                        var hasApi = !!window.dvDebug;
                        var isOpen = false;
                        try {{
                            isOpen = hasApi
                                ? !!window.dvDebug.isOpen()
                                : localStorage.getItem({vis_key}) === '1';
                        }} catch (e) {{}}
                        var tool = 'role';
                        try {{
                            tool = localStorage.getItem({tool_key}) || 'role';
                        }} catch (e) {{}}
                        return {{ ok: true, isOpen: isOpen, tool: tool, hasApi: hasApi }};
                    }})()"#
                )
            }
            RemoteOp::RequestInjection => format!(
                r#"(function () {{
                    document.dispatchEvent(new CustomEvent('{event}'));
                    return {{ ok: true }};
                }})()"#,
                event = crate::page::injector::REQUEST_INJECT_EVENT,
            ),
        }
    }
}
