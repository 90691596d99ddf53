//! # pipdock Protocols
//!
//! Core protocol definitions (traits) and shared types for pipdock.
//! Contains only interface definitions - no implementations.
//!
//! ## Host Traits
//!
//! - [`WindowingService`] - Create, update, and remove the detached popup window
//! - [`TabService`] - Observe the popup tab's load state
//! - [`InjectionService`] - Run the injection pipeline steps inside the popup tab
//! - [`PageHost`] - Read and act on the live document of a detached page
//! - [`HistoryStore`] - External viewing-history collaborator
//! - [`MinimizeRequester`] - Page-side end of the messaging bridge

pub mod error;
pub mod host;
pub mod page;
pub mod types;

pub use error::{HostError, HostResult, PipdockError};
pub use host::{HistoryStore, InjectionService, MinimizeRequester, TabService, WindowingService};
pub use page::{AdMarkers, AdStatus, MediaTiming, PageEvent, PageHost, SnapshotRequest};
pub use types::*;
