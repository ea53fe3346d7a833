//! HTTP surface
//!
//! JSON endpoints for the station directory and the stream health check,
//! plus the audio relay. Everything except the relay body answers with the
//! `{ok, data?, message?}` envelope.

pub mod handlers;
pub mod response;
pub mod server;

pub use response::{ApiError, ApiResponse, CheckResponse};
pub use server::{create_router, serve, AppState};
