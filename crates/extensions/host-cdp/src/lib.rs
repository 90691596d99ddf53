//! # pipdock Host (CDP)
//!
//! Host services backed by a Chromium browser running with remote debugging.
//!
//! - [`CdpHost`] implements the windowing, tab, and injection services the
//!   popup window controller needs.
//! - [`CdpPageHost`] gives the page orchestrator live access to a detached page.
//! - [`PageRuntime`] feeds page events to that orchestrator.

pub mod cdp;
pub mod host;
pub mod page_host;
pub mod runtime;
pub mod scripts;

pub use cdp::{CdpClient, CdpError};
pub use host::{CdpHost, CdpHostConfig};
pub use page_host::CdpPageHost;
pub use runtime::PageRuntime;
