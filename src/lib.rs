//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service` for the relay backend, `core-playback` for
//! the headless playback engine). Host applications can depend on
//! `radio-workspace` and enable the documented features without needing to
//! wire each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service;

#[cfg(feature = "headless-engine")]
pub use core_playback;
