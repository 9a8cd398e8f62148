// src/api/client.rs
//! Blocking HTTP client for the YouTube Data API v3.
//!
//! This module is a thin wrapper around `reqwest::blocking`. It builds
//! request URLs, attaches the API key handed to it, and returns raw
//! response text. Parsing lives in [`super::parser`]; retries and key
//! rotation live in the caller.

use super::responses::{ChannelResource, VideoResource};
use super::{parser, SearchPage, SearchRequest, VideoSource};
use crate::constants::SEARCH_PAGE_SIZE;
use crate::error::AppError;
use crate::types::{ApiKey, ChannelId, ValidationError, VideoId};
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use url::Url;

/// A thin wrapper around a blocking reqwest client for YouTube requests.
#[derive(Clone)]
pub struct YouTubeHttpClient {
    client: Client,
    base_url: Url,
}

impl YouTubeHttpClient {
    /// Creates a client rooted at `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| ValidationError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tubesift/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Makes a GET request to `endpoint` with the given query parameters.
    ///
    /// The key is appended last and never written to the log.
    pub fn get(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        key: &ApiKey,
    ) -> Result<ApiResponse<String>, AppError> {
        let mut url = self.base_url.join(endpoint).map_err(|e| {
            AppError::MissingConfiguration(format!("Invalid endpoint {}: {}", endpoint, e))
        })?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        log::debug!("GET {} (key {})", url, key);
        url.query_pairs_mut().append_pair("key", key.as_str());

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| AppError::Network(e.without_url()))?;
        extract_response_text(response, endpoint)
    }
}

impl VideoSource for YouTubeHttpClient {
    fn search_page(&self, key: &ApiKey, request: &SearchRequest<'_>) -> Result<SearchPage, AppError> {
        let mut params = vec![
            ("part", "id".to_string()),
            ("type", "video".to_string()),
            ("order", "relevance".to_string()),
            ("maxResults", SEARCH_PAGE_SIZE.to_string()),
            ("q", request.keyword.to_string()),
        ];
        if let Some(region) = request.region_code {
            params.push(("regionCode", region.to_string()));
        }
        if let Some(language) = request.relevance_language {
            params.push(("relevanceLanguage", language.to_string()));
        }
        if let Some(token) = request.page_token {
            params.push(("pageToken", token.to_string()));
        }
        let result = self.get("search", &params, key)?;
        parser::parse_search_page(result)
    }

    fn list_videos(&self, key: &ApiKey, ids: &[VideoId]) -> Result<Vec<VideoResource>, AppError> {
        let params = [
            ("part", "snippet,statistics,contentDetails".to_string()),
            ("id", join_ids(ids.iter().map(VideoId::as_str))),
            ("maxResults", ids.len().to_string()),
        ];
        let result = self.get("videos", &params, key)?;
        parser::parse_video_list(result)
    }

    fn list_channels(
        &self,
        key: &ApiKey,
        ids: &[ChannelId],
    ) -> Result<Vec<ChannelResource>, AppError> {
        let params = [
            ("part", "snippet,statistics".to_string()),
            ("id", join_ids(ids.iter().map(ChannelId::as_str))),
            ("maxResults", ids.len().to_string()),
        ];
        let result = self.get("channels", &params, key)?;
        parser::parse_channel_list(result)
    }
}

fn join_ids<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    ids.collect::<Vec<_>>().join(",")
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    /// The endpoint name; the full URL would carry the key.
    pub url: String,
}

/// Extracts the response body as text with metadata.
pub fn extract_response_text(
    response: Response,
    endpoint: &str,
) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| AppError::Network(e.without_url()))?;
    log::debug!("{} responded {} ({} bytes)", endpoint, status, text.len());

    Ok(ApiResponse {
        data: text,
        status,
        url: endpoint.to_string(),
    })
}
