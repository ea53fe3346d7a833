//! # Radio Browser Provider
//!
//! Station directory backed by the community Radio Browser API.
//!
//! ## Overview
//!
//! This module provides:
//! - Station listing by country, filtered search and most-clicked lists
//! - Language and tag facets
//! - Ordered failover across the public mirrors

pub mod connector;
pub mod error;
pub mod types;

use async_trait::async_trait;
use bridge_traits::Station;

pub use connector::RadioBrowserConnector;
pub use error::{DirectoryError, Result};
pub use types::{Facet, SearchParams, StationQuery};

/// Read-only station directory.
///
/// Every call either returns the full result of one mirror or fails with
/// [`DirectoryError::Unavailable`]; results are never merged across mirrors.
#[async_trait]
pub trait StationDirectory: Send + Sync {
    async fn list_by_country(&self, country: &str, query: &StationQuery) -> Result<Vec<Station>>;

    async fn search(&self, params: &SearchParams) -> Result<Vec<Station>>;

    /// Most-clicked stations, `count` entries at most
    async fn top_clicked(&self, count: u32) -> Result<Vec<Station>>;

    async fn languages(&self) -> Result<Vec<Facet>>;

    async fn tags(&self) -> Result<Vec<Facet>>;
}
