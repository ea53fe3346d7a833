//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for native hosts
//! (macOS, Windows, Linux, server deployments).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` with rustls, used by the directory client,
//!   the health prober and the stream relay
//!
//! Audio output and media-session integration are left to the host shell.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use bridge_traits::HttpClient;
//! use std::sync::Arc;
//!
//! let http_client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new()?);
//! ```

mod http;

pub use http::{ReqwestHttpClient, DEFAULT_USER_AGENT};
