//! Domain model for collected videos.
//!
//! A [`RawItem`] is one video as the detail lookup reported it, merged with
//! its channel's attributes and a computed engagement rate. Every item that
//! leaves the collector carries its quality-filter outcome.

use crate::types::{ChannelId, VideoId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ops::Deref;

/// Channel-level attributes merged onto every video the channel owns.
///
/// The default value stands in for channels whose lookup failed or
/// returned nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelAttributes {
    pub title: String,
    pub country: String,
    pub custom_url: String,
    pub subscriber_count: u64,
    pub hidden_subscriber_count: bool,
    pub channel_view_count: u64,
    pub video_count: u64,
}

/// One enriched video, with or without a passing quality verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawItem {
    pub video_id: VideoId,
    pub keyword: String,
    pub title: String,
    pub description: String,
    pub channel_id: ChannelId,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub category_id: String,
    pub tags: Vec<String>,
    pub default_language: String,
    pub duration: String,
    pub duration_seconds: u64,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub engagement_rate: f64,
    pub channel: ChannelAttributes,
    pub quality_filter_passed: bool,
    pub filter_fail_reason: Option<String>,
}

impl RawItem {
    /// Records the quality-filter outcome on the item.
    pub fn attach_verdict(&mut self, passed: bool, reasons: &[String]) {
        self.quality_filter_passed = passed;
        self.filter_fail_reason = if reasons.is_empty() {
            None
        } else {
            Some(reasons.join("; "))
        };
    }
}

/// A [`RawItem`] whose quality verdict passed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilteredItem(RawItem);

impl FilteredItem {
    /// Accepts the item only if its attached verdict passed.
    pub fn accept(item: RawItem) -> Option<Self> {
        if item.quality_filter_passed {
            Some(Self(item))
        } else {
            None
        }
    }
}

impl Deref for FilteredItem {
    type Target = RawItem;

    fn deref(&self) -> &RawItem {
        &self.0
    }
}
