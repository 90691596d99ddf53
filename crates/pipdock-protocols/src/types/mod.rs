//! Shared types.

mod geometry;
mod message;
mod platform;
mod session;
mod video;

pub use geometry::*;
pub use message::*;
pub use platform::*;
pub use session::*;
pub use video::*;
