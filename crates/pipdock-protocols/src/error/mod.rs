//! Error types for the pipdock protocol layer.

mod engine;
mod host;

pub use engine::*;
pub use host::*;
