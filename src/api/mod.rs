// src/api/mod.rs
//! YouTube API interaction: the ability to search for videos and look up
//! video and channel details.
//!
//! Business logic depends on the [`VideoSource`] trait, never on HTTP
//! details, so the collector can be driven by scripted sources in tests.

pub mod client;
pub mod parser;
pub mod responses;

use crate::error::AppError;
use crate::types::{ApiKey, ChannelId, VideoId};
use responses::{ChannelResource, VideoResource};

/// Parameters of one `search.list` page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRequest<'a> {
    pub keyword: &'a str,
    pub region_code: Option<&'a str>,
    pub relevance_language: Option<&'a str>,
    pub page_token: Option<&'a str>,
}

/// One page of search results: video ids in provider order plus the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub video_ids: Vec<VideoId>,
    /// `None` when the provider has no further pages.
    pub next_page_token: Option<String>,
}

/// The three remote lookups the collector is built on.
///
/// Every call receives the key to authenticate with; implementations must
/// not cache or choose keys themselves.
pub trait VideoSource {
    /// Fetches one page of video search results.
    fn search_page(&self, key: &ApiKey, request: &SearchRequest<'_>) -> Result<SearchPage, AppError>;

    /// Fetches details for at most one provider-sized group of videos.
    fn list_videos(&self, key: &ApiKey, ids: &[VideoId]) -> Result<Vec<VideoResource>, AppError>;

    /// Fetches attributes for at most one provider-sized group of channels.
    fn list_channels(
        &self,
        key: &ApiKey,
        ids: &[ChannelId],
    ) -> Result<Vec<ChannelResource>, AppError>;
}

impl<S: VideoSource + ?Sized> VideoSource for &S {
    fn search_page(&self, key: &ApiKey, request: &SearchRequest<'_>) -> Result<SearchPage, AppError> {
        (**self).search_page(key, request)
    }

    fn list_videos(&self, key: &ApiKey, ids: &[VideoId]) -> Result<Vec<VideoResource>, AppError> {
        (**self).list_videos(key, ids)
    }

    fn list_channels(
        &self,
        key: &ApiKey,
        ids: &[ChannelId],
    ) -> Result<Vec<ChannelResource>, AppError> {
        (**self).list_channels(key, ids)
    }
}

pub use client::YouTubeHttpClient;
