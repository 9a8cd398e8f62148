//! Detail and channel enrichment for batches of video ids.

use crate::api::responses::{ChannelResource, VideoResource};
use crate::api::VideoSource;
use crate::constants::{
    CHANNEL_DETAILS_GROUP_SIZE, ENGAGEMENT_RATE_PRECISION, VIDEO_DETAILS_GROUP_SIZE,
};
use crate::error::AppError;
use crate::error_recovery::RetryingInvoker;
use crate::model::{ChannelAttributes, RawItem};
use crate::types::{ChannelId, VideoId};
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .expect("duration pattern is valid")
});

/// Fetches full details for `ids` in provider-sized groups.
///
/// Output order is group order, then the provider's order within a group.
/// Ids the provider does not return (deleted or private videos) are absent.
pub fn fetch_details<S: VideoSource>(
    source: &S,
    invoker: &mut RetryingInvoker,
    ids: &[VideoId],
    keyword: &str,
) -> Result<Vec<RawItem>, AppError> {
    let mut items = Vec::with_capacity(ids.len());
    for group in ids.chunks(VIDEO_DETAILS_GROUP_SIZE) {
        let videos = invoker.invoke("videos", |key| source.list_videos(key, group))?;
        items.extend(
            videos
                .into_iter()
                .filter(|video| !video.id.is_empty())
                .map(|video| raw_item_from_video(video, keyword)),
        );
    }
    Ok(items)
}

/// Fetches channel attributes once per distinct channel id.
///
/// A failed group lookup degrades to "no attributes" for its channels;
/// only credential exhaustion is propagated.
pub fn fetch_owner_attributes<S: VideoSource>(
    source: &S,
    invoker: &mut RetryingInvoker,
    owner_ids: &[ChannelId],
) -> Result<IndexMap<ChannelId, ChannelAttributes>, AppError> {
    let distinct: Vec<ChannelId> = owner_ids
        .iter()
        .filter(|id| !id.is_empty())
        .cloned()
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect();

    let mut owners = IndexMap::with_capacity(distinct.len());
    for group in distinct.chunks(CHANNEL_DETAILS_GROUP_SIZE) {
        match invoker.invoke("channels", |key| source.list_channels(key, group)) {
            Ok(channels) => {
                for channel in channels {
                    let id = ChannelId::new(channel.id.clone());
                    owners.insert(id, channel_attributes(channel));
                }
            }
            Err(error) if error.is_credentials_exhausted() => return Err(error),
            Err(error) => {
                log::warn!(
                    "Channel lookup failed for {} channel(s), using empty attributes: {}",
                    group.len(),
                    error
                );
            }
        }
    }
    Ok(owners)
}

/// Copies each item's channel attributes from `owners`, defaulting when absent.
pub fn merge_owner_attributes(
    items: &mut [RawItem],
    owners: &IndexMap<ChannelId, ChannelAttributes>,
) {
    for item in items {
        item.channel = owners.get(&item.channel_id).cloned().unwrap_or_default();
        if item.channel_title.is_empty() {
            item.channel_title = item.channel.title.clone();
        }
    }
}

/// `(likes + comments) / views * 100`, rounded; zero when there are no views.
pub fn engagement_rate(view_count: u64, like_count: u64, comment_count: u64) -> f64 {
    if view_count == 0 {
        return 0.0;
    }
    let rate = (like_count as f64 + comment_count as f64) / view_count as f64 * 100.0;
    let scale = 10f64.powi(ENGAGEMENT_RATE_PRECISION);
    (rate * scale).round() / scale
}

/// Parses an ISO-8601 duration such as `PT1H2M3S`; unparsable input is 0.
pub fn duration_seconds(iso: &str) -> u64 {
    let Some(captures) = ISO_DURATION.captures(iso.trim()) else {
        return 0;
    };
    let part = |index: usize| {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    part(1) * 86_400 + part(2) * 3_600 + part(3) * 60 + part(4)
}

fn raw_item_from_video(video: VideoResource, keyword: &str) -> RawItem {
    let VideoResource {
        id,
        snippet,
        statistics,
        content_details,
    } = video;

    let published_at = snippet
        .published_at
        .as_deref()
        .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|value| value.with_timezone(&Utc));
    let default_language = snippet
        .default_language
        .or(snippet.default_audio_language)
        .unwrap_or_default();

    RawItem {
        video_id: VideoId::new(id),
        keyword: keyword.to_string(),
        title: snippet.title,
        description: snippet.description,
        channel_id: ChannelId::new(snippet.channel_id),
        channel_title: snippet.channel_title,
        published_at,
        category_id: snippet.category_id,
        tags: snippet.tags,
        default_language,
        duration_seconds: duration_seconds(&content_details.duration),
        duration: content_details.duration,
        view_count: statistics.view_count,
        like_count: statistics.like_count,
        comment_count: statistics.comment_count,
        engagement_rate: engagement_rate(
            statistics.view_count,
            statistics.like_count,
            statistics.comment_count,
        ),
        channel: ChannelAttributes::default(),
        quality_filter_passed: false,
        filter_fail_reason: None,
    }
}

fn channel_attributes(channel: ChannelResource) -> ChannelAttributes {
    ChannelAttributes {
        title: channel.snippet.title,
        country: channel.snippet.country.unwrap_or_default(),
        custom_url: channel.snippet.custom_url,
        subscriber_count: channel.statistics.subscriber_count,
        hidden_subscriber_count: channel.statistics.hidden_subscriber_count,
        channel_view_count: channel.statistics.view_count,
        video_count: channel.statistics.video_count,
    }
}
