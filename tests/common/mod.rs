// tests/common/mod.rs
//! Scripted video sources and fixtures shared by the integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use tubesift::api::responses::{
    ChannelResource, ChannelSnippet, ChannelStatistics, VideoContentDetails, VideoResource,
    VideoSnippet, VideoStatistics,
};
use tubesift::{
    ApiKey, AppError, ChannelId, CollectorConfig, RetryPolicy, SearchPage, SearchRequest,
    VideoId, VideoSource, YouTubeErrorReason,
};

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub endpoint: &'static str,
    pub key: String,
    pub ids: Vec<String>,
    pub page_token: Option<String>,
}

/// How the fake answers `search.list`.
pub enum SearchScript {
    /// Fixed pages, chained with `page-N` tokens; the last page has no token.
    Pages(Vec<Vec<String>>),
    /// Fresh ids on every page, forever.
    Endless { page_size: usize },
}

/// A [`VideoSource`] driven entirely by in-memory scripts.
pub struct ScriptedSource {
    search: SearchScript,
    videos: HashMap<String, VideoResource>,
    fixed_details: Option<Vec<VideoResource>>,
    channels: HashMap<String, ChannelResource>,
    quota_keys: HashSet<String>,
    quota_after_calls: Option<usize>,
    failures: RefCell<HashMap<&'static str, VecDeque<AppError>>>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedSource {
    pub fn with_pages(pages: Vec<Vec<String>>) -> Self {
        Self::new(SearchScript::Pages(pages))
    }

    pub fn endless(page_size: usize) -> Self {
        Self::new(SearchScript::Endless { page_size })
    }

    fn new(search: SearchScript) -> Self {
        Self {
            search,
            videos: HashMap::new(),
            fixed_details: None,
            channels: HashMap::new(),
            quota_keys: HashSet::new(),
            quota_after_calls: None,
            failures: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn videos(mut self, videos: impl IntoIterator<Item = VideoResource>) -> Self {
        self.videos
            .extend(videos.into_iter().map(|video| (video.id.clone(), video)));
        self
    }

    /// Every detail lookup answers with exactly these videos.
    pub fn fixed_details(mut self, videos: Vec<VideoResource>) -> Self {
        self.fixed_details = Some(videos);
        self
    }

    pub fn channels(mut self, channels: impl IntoIterator<Item = ChannelResource>) -> Self {
        self.channels
            .extend(channels.into_iter().map(|channel| (channel.id.clone(), channel)));
        self
    }

    /// Every call made with `key` fails with a quota error.
    pub fn quota_for_key(mut self, key: &str) -> Self {
        self.quota_keys.insert(key.to_string());
        self
    }

    /// Once `calls` calls have been made, every key is out of quota.
    pub fn quota_after(mut self, calls: usize) -> Self {
        self.quota_after_calls = Some(calls);
        self
    }

    /// Queues `error` for the next call to `endpoint`.
    pub fn fail_next(self, endpoint: &'static str, error: AppError) -> Self {
        self.failures
            .borrow_mut()
            .entry(endpoint)
            .or_default()
            .push_back(error);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .cloned()
            .collect()
    }

    fn record(
        &self,
        endpoint: &'static str,
        key: &ApiKey,
        ids: Vec<String>,
        page_token: Option<String>,
    ) -> Result<(), AppError> {
        let previous_calls = self.calls.borrow().len();
        self.calls.borrow_mut().push(Call {
            endpoint,
            key: key.as_str().to_string(),
            ids,
            page_token,
        });

        if self.quota_keys.contains(key.as_str()) {
            return Err(quota_error());
        }
        if let Some(limit) = self.quota_after_calls {
            if previous_calls >= limit {
                return Err(quota_error());
            }
        }
        if let Some(error) = self
            .failures
            .borrow_mut()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        Ok(())
    }
}

fn page_index(token: Option<&str>) -> usize {
    token
        .and_then(|token| token.strip_prefix("page-"))
        .and_then(|index| index.parse().ok())
        .unwrap_or(0)
}

impl VideoSource for ScriptedSource {
    fn search_page(&self, key: &ApiKey, request: &SearchRequest<'_>) -> Result<SearchPage, AppError> {
        self.record(
            "search",
            key,
            Vec::new(),
            request.page_token.map(str::to_string),
        )?;
        let index = page_index(request.page_token);

        let page = match &self.search {
            SearchScript::Pages(pages) => match pages.get(index) {
                Some(ids) => SearchPage {
                    video_ids: ids.iter().map(VideoId::new).collect(),
                    next_page_token: (index + 1 < pages.len())
                        .then(|| format!("page-{}", index + 1)),
                },
                None => SearchPage::default(),
            },
            SearchScript::Endless { page_size } => SearchPage {
                video_ids: (0..*page_size)
                    .map(|i| VideoId::new(format!("{}-p{}-{}", request.keyword, index, i)))
                    .collect(),
                next_page_token: Some(format!("page-{}", index + 1)),
            },
        };
        Ok(page)
    }

    fn list_videos(&self, key: &ApiKey, ids: &[VideoId]) -> Result<Vec<VideoResource>, AppError> {
        self.record(
            "videos",
            key,
            ids.iter().map(|id| id.as_str().to_string()).collect(),
            None,
        )?;
        if let Some(fixed) = &self.fixed_details {
            return Ok(fixed.clone());
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.videos.get(id.as_str()).cloned())
            .collect())
    }

    fn list_channels(
        &self,
        key: &ApiKey,
        ids: &[ChannelId],
    ) -> Result<Vec<ChannelResource>, AppError> {
        self.record(
            "channels",
            key,
            ids.iter().map(|id| id.as_str().to_string()).collect(),
            None,
        )?;
        Ok(ids
            .iter()
            .filter_map(|id| self.channels.get(id.as_str()).cloned())
            .collect())
    }
}

pub fn quota_error() -> AppError {
    AppError::YouTubeService {
        status: 403,
        reason: YouTubeErrorReason::QuotaExceeded,
        message: "The request cannot be completed because you have exceeded your quota."
            .to_string(),
    }
}

pub fn backend_error() -> AppError {
    AppError::YouTubeService {
        status: 503,
        reason: YouTubeErrorReason::BackendError,
        message: "Backend Error".to_string(),
    }
}

pub fn bad_request_error() -> AppError {
    AppError::YouTubeService {
        status: 400,
        reason: YouTubeErrorReason::BadRequest,
        message: "Invalid value for parameter q".to_string(),
    }
}

pub fn keys(raw: &[&str]) -> Vec<ApiKey> {
    raw.iter()
        .map(|key| ApiKey::new(*key).expect("test key is valid"))
        .collect()
}

/// Default thresholds, no retry delay.
pub fn test_config(batch_size: usize) -> CollectorConfig {
    CollectorConfig {
        batch_size,
        retry: RetryPolicy {
            max_attempts: 3,
            delay: Duration::ZERO,
        },
        ..CollectorConfig::default()
    }
}

pub fn ids(prefix: &str, range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("{}{:03}", prefix, i)).collect()
}

pub fn video(id: &str, channel_id: &str, category: &str, views: u64, likes: u64) -> VideoResource {
    VideoResource {
        id: id.to_string(),
        snippet: VideoSnippet {
            published_at: Some("2024-03-01T12:00:00Z".to_string()),
            channel_id: channel_id.to_string(),
            title: format!("Review {}", id),
            category_id: category.to_string(),
            ..VideoSnippet::default()
        },
        statistics: VideoStatistics {
            view_count: views,
            like_count: likes,
            comment_count: 0,
        },
        content_details: VideoContentDetails {
            duration: "PT4M13S".to_string(),
        },
    }
}

/// A video every default threshold accepts when owned by [`big_us_channel`].
pub fn passing_video(id: &str, channel_id: &str) -> VideoResource {
    video(id, channel_id, "22", 10_000, 500)
}

/// A video in the wrong category.
pub fn failing_video(id: &str, channel_id: &str) -> VideoResource {
    video(id, channel_id, "10", 10_000, 500)
}

pub fn channel(id: &str, country: &str, subscribers: u64, views: u64) -> ChannelResource {
    ChannelResource {
        id: id.to_string(),
        snippet: ChannelSnippet {
            title: format!("Channel {}", id),
            custom_url: format!("@{}", id),
            country: Some(country.to_string()),
        },
        statistics: ChannelStatistics {
            view_count: views,
            subscriber_count: subscribers,
            hidden_subscriber_count: false,
            video_count: 120,
        },
    }
}

pub fn big_us_channel(id: &str) -> ChannelResource {
    channel(id, "US", 250_000, 40_000_000)
}

/// Alternates passing and failing videos over `ids`, all owned by `channel_id`.
pub fn half_passing(ids: &[String], channel_id: &str) -> Vec<VideoResource> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            if i % 2 == 0 {
                passing_video(id, channel_id)
            } else {
                failing_video(id, channel_id)
            }
        })
        .collect()
}
