//! Station model shared by the directory client, the relay backend and the
//! playback engine.
//!
//! Field names on the wire match the Radio Browser API so directory entries
//! pass through the backend unchanged.

use serde::{Deserialize, Serialize};

/// A radio station as listed by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    #[serde(rename = "stationuuid")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Comma separated tag list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(rename = "url", default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
    #[serde(
        rename = "url_resolved",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resolved_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(rename = "bitrate", default, skip_serializing_if = "Option::is_none")]
    pub bitrate_kbps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(
        rename = "clickcount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub click_count: Option<u64>,
    #[serde(
        rename = "lastchangetime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_change_time: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
}

impl Station {
    /// Minimal station, mostly useful for tests and hosts building entries by hand.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            country: String::new(),
            language: None,
            tags: None,
            favicon: None,
            origin_url: None,
            resolved_url: None,
            codec: None,
            bitrate_kbps: None,
            homepage: None,
            click_count: None,
            last_change_time: None,
        }
    }

    pub fn with_origin_url(mut self, url: impl Into<String>) -> Self {
        self.origin_url = Some(url.into());
        self
    }

    pub fn with_resolved_url(mut self, url: impl Into<String>) -> Self {
        self.resolved_url = Some(url.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Stream URLs to try directly, in preference order: resolved first,
    /// then origin. Blank entries are skipped and duplicates collapsed.
    pub fn stream_candidates(&self) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::with_capacity(2);
        for url in [non_blank(&self.resolved_url), non_blank(&self.origin_url)]
            .into_iter()
            .flatten()
        {
            if !candidates.iter().any(|existing| existing == url) {
                candidates.push(url.to_string());
            }
        }
        candidates
    }

    /// Preferred stream URL, if any.
    pub fn primary_url(&self) -> Option<String> {
        self.stream_candidates().into_iter().next()
    }

    pub fn is_playable(&self) -> bool {
        non_blank(&self.resolved_url).is_some() || non_blank(&self.origin_url).is_some()
    }

    /// Tags as a trimmed list.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}
