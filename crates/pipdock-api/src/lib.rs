//! # pipdock API
//!
//! HTTP surface over the message router:
//!
//! - `POST /messages` - apply one controller message, answer `{ok, error?}`
//! - `GET /history` - recorded viewing history, newest first
//! - `GET /health` - liveness plus the current session state

pub mod error;
pub mod http;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use http::routes::create_router;
pub use server::ApiServer;
pub use state::AppState;
