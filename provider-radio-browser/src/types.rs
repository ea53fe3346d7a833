//! Radio Browser query and response types

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u32 = 50;
pub const DEFAULT_ORDER: &str = "clickcount";

/// Paging and ordering shared by the station listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    /// Sort field understood by Radio Browser (`clickcount`, `name`, `bitrate`, ...)
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

fn default_order() -> String {
    DEFAULT_ORDER.to_string()
}

impl Default for StationQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            order: DEFAULT_ORDER.to_string(),
        }
    }
}

impl StationQuery {
    /// Query pairs sent upstream. Results are always newest-ranked first and
    /// exclude stations the directory has flagged as broken.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
            ("order", self.order.clone()),
            ("reverse", "true".to_string()),
            ("hidebroken", "true".to_string()),
        ]
    }
}

/// Filtered search. Empty filters are omitted from the upstream request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(flatten)]
    pub query: StationQuery,
}

impl SearchParams {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.query.to_pairs();
        for (key, value) in [
            ("name", &self.name),
            ("country", &self.country),
            ("tag", &self.tag),
            ("language", &self.language),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }
        pairs
    }
}

/// Language or tag entry with its station count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub name: String,
    #[serde(default)]
    pub stationcount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso_639: Option<String>,
}
