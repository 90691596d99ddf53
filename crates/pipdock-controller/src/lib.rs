//! # pipdock Controller
//!
//! Owns the single detached popup window: placement, the open/close/minimize
//! lifecycle, the injection pipeline, and the message router and bridge that
//! feed it requests.

pub mod bridge;
pub mod controller;
pub mod history;
pub mod pipeline;
pub mod placement;
pub mod router;
pub mod session;

#[cfg(test)]
mod test_support;

pub use bridge::{BridgeClient, BridgeServer};
pub use controller::{ControllerSettings, HostServices, PopupWindowController};
pub use history::InMemoryHistory;
pub use pipeline::OpenPath;
pub use placement::PopupDefaults;
pub use router::{Router, RouterHandle};
pub use session::DetachedWindowSession;
