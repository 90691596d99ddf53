//! # pipdock Page
//!
//! Page-side engine for a detached popup: picks the one video worth detaching,
//! drives it into Picture-in-Picture, and keeps in-stream ads out of the way.
//!
//! Everything here talks to the live document through
//! [`pipdock_protocols::PageHost`], so the selection logic stays pure over a
//! [`pipdock_protocols::DomSnapshot`].

pub mod ad_skip;
pub mod filter;
pub mod orchestrator;
pub mod profiles;
pub mod scorer;
pub mod sequencer;

#[cfg(test)]
mod test_support;

pub use ad_skip::{AdSkipMonitor, AdSkipState, SkipAction};
pub use filter::RejectReason;
pub use orchestrator::PageOrchestrator;
pub use profiles::PlatformProfile;
pub use scorer::{RescanThrottle, ScoreResult};
pub use sequencer::{Sequencer, SequencerState};
