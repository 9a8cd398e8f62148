// src/api/responses.rs
//! Typed YouTube Data API v3 response bodies.
//!
//! Every field the collector reads is optional on the wire. Missing
//! fields fall back to `Default` here, so enrichment code never has to
//! probe JSON by key.

use serde::{Deserialize, Deserializer};

/// `search.list` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchListResponse {
    pub next_page_token: Option<String>,
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    pub id: SearchResultId,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchResultId {
    pub kind: String,
    pub video_id: Option<String>,
}

/// `videos.list` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VideoListResponse {
    pub items: Vec<VideoResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoResource {
    pub id: String,
    pub snippet: VideoSnippet,
    pub statistics: VideoStatistics,
    pub content_details: VideoContentDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoSnippet {
    pub published_at: Option<String>,
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub default_language: Option<String>,
    pub default_audio_language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(deserialize_with = "count_from_wire")]
    pub view_count: u64,
    #[serde(deserialize_with = "count_from_wire")]
    pub like_count: u64,
    #[serde(deserialize_with = "count_from_wire")]
    pub comment_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VideoContentDetails {
    pub duration: String,
}

/// `channels.list` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelListResponse {
    pub items: Vec<ChannelResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChannelResource {
    pub id: String,
    pub snippet: ChannelSnippet,
    pub statistics: ChannelStatistics,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelSnippet {
    pub title: String,
    pub custom_url: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelStatistics {
    #[serde(deserialize_with = "count_from_wire")]
    pub view_count: u64,
    #[serde(deserialize_with = "count_from_wire")]
    pub subscriber_count: u64,
    pub hidden_subscriber_count: bool,
    #[serde(deserialize_with = "count_from_wire")]
    pub video_count: u64,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorDetail {
    pub message: String,
    pub domain: String,
    pub reason: String,
}

/// YouTube serializes counters as decimal strings; accept numbers too.
/// Anything unreadable counts as zero.
fn count_from_wire<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(text) => text.trim().parse().unwrap_or(0),
        serde_json::Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        _ => 0,
    })
}
