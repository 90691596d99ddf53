//! Scripts evaluated in the detached page.
//!
//! Every builder returns a single expression for `Runtime.evaluate`. Values
//! are embedded as JSON literals, never spliced as raw text.

use pipdock_protocols::SessionMetadata;
use serde_json::Value;

/// Binding the page calls to raise events (`Runtime.bindingCalled`).
pub const BINDING_NAME: &str = "__pipdockEmit";

const PAGE_MAIN: &str = include_str!("../assets/page_main.js");
const BRIDGE: &str = include_str!("../assets/bridge.js");
const MINIMAL_UI_CSS: &str = include_str!("../assets/minimal_ui.css");

const STYLE_ELEMENT_ID: &str = "pipdock-minimal-ui";

pub fn page_main() -> &'static str {
    PAGE_MAIN
}

pub fn bridge() -> &'static str {
    BRIDGE
}

fn literal<T: serde::Serialize + ?Sized>(value: &T) -> String {
    // Serializing a str or a derived struct cannot fail.
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

pub fn mark_window(sentinel: &str) -> String {
    format!("window.name = {}; true", literal(sentinel))
}

/// Insert the minimal-UI stylesheet once.
pub fn insert_stylesheet() -> String {
    format!(
        "(() => {{ \
            if (document.getElementById({id})) return true; \
            const style = document.createElement('style'); \
            style.id = {id}; \
            style.textContent = {css}; \
            (document.head || document.documentElement).appendChild(style); \
            return true; \
        }})()",
        id = literal(STYLE_ELEMENT_ID),
        css = literal(MINIMAL_UI_CSS),
    )
}

pub fn deliver_metadata(metadata: &SessionMetadata) -> String {
    format!(
        "window.__pipdockSession = {}; true",
        literal(metadata)
    )
}

pub fn bridge_ready() -> String {
    "window.__pipdockBridge && window.__pipdockBridge.markReady(); true".to_string()
}

pub fn bridge_unavailable(reason: &str) -> String {
    format!(
        "window.__pipdockBridge && window.__pipdockBridge.markUnavailable({}); true",
        literal(reason)
    )
}

/// Call `window.__pipdock.<name>(args...)`.
pub fn helper_call(name: &str, args: &[Value]) -> String {
    let args = args.iter().map(literal).collect::<Vec<_>>().join(", ");
    format!(
        "(() => {{ \
            if (!window.__pipdock) throw new Error('pipdock page script not loaded'); \
            return window.__pipdock.{}({}); \
        }})()",
        name, args
    )
}

/// Available screen area as seen by the page.
pub const SCREEN_AREA: &str = "({ \
    availLeft: screen.availLeft || 0, \
    availTop: screen.availTop || 0, \
    availWidth: screen.availWidth, \
    availHeight: screen.availHeight \
})";

pub const DOCUMENT_STATE: &str = "({ readyState: document.readyState, href: location.href })";
