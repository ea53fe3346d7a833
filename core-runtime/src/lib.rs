//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the radio core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities every other crate depends on.
//! It establishes the logging conventions, the fail-fast configuration
//! builder, and the broadcast channel the playback engine reports through.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
