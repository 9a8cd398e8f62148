// src/api/parser.rs
//! Parsing of raw YouTube API responses into typed bodies and errors.
//!
//! Every HTTP result flows through [`parse_api_response`]: success bodies
//! become typed responses, error bodies become [`AppError::YouTubeService`]
//! with the provider's reason decoded.

use super::client::ApiResponse;
use super::responses::{
    ChannelListResponse, ChannelResource, ErrorEnvelope, SearchListResponse, VideoListResponse,
    VideoResource,
};
use super::SearchPage;
use crate::error::{AppError, YouTubeErrorReason};
use crate::types::VideoId;
use reqwest::StatusCode;

/// Maximum characters shown when previewing unparseable bodies.
const BODY_PREVIEW_LENGTH: usize = 300;

/// Parse any YouTube API response into `T`, or into a typed error.
pub fn parse_api_response<T>(result: ApiResponse<String>) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    if result.status.is_success() {
        parse_success(&result.data, &result.url)
    } else {
        Err(parse_error_body(&result.data, result.status))
    }
}

fn parse_success<T>(body: &str, url: &str) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse response from {}: {}", url, e);
        AppError::MalformedResponse(format!("{} (body: {})", e, preview(body)))
    })
}

/// Decodes a YouTube error envelope, falling back to the HTTP status.
pub fn parse_error_body(body: &str, status: StatusCode) -> AppError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() || !envelope.error.errors.is_empty() => {
            let reason = envelope
                .error
                .errors
                .iter()
                .map(|detail| detail.reason.as_str())
                .find(|reason| !reason.is_empty())
                .map(YouTubeErrorReason::from_api_reason)
                .unwrap_or_else(|| YouTubeErrorReason::from_http_status(status.as_u16()));
            AppError::YouTubeService {
                status: status.as_u16(),
                reason,
                message: envelope.error.message,
            }
        }
        _ => AppError::YouTubeService {
            status: status.as_u16(),
            reason: YouTubeErrorReason::from_http_status(status.as_u16()),
            message: preview(body),
        },
    }
}

/// Parse a `search.list` response into the ids it lists, in order.
pub fn parse_search_page(result: ApiResponse<String>) -> Result<SearchPage, AppError> {
    let response: SearchListResponse = parse_api_response(result)?;
    let video_ids = response
        .items
        .into_iter()
        .filter_map(|item| item.id.video_id)
        .filter(|id| !id.is_empty())
        .map(VideoId::new)
        .collect();
    Ok(SearchPage {
        video_ids,
        next_page_token: response.next_page_token.filter(|token| !token.is_empty()),
    })
}

/// Parse a `videos.list` response.
pub fn parse_video_list(result: ApiResponse<String>) -> Result<Vec<VideoResource>, AppError> {
    let response: VideoListResponse = parse_api_response(result)?;
    Ok(response.items)
}

/// Parse a `channels.list` response.
pub fn parse_channel_list(result: ApiResponse<String>) -> Result<Vec<ChannelResource>, AppError> {
    let response: ChannelListResponse = parse_api_response(result)?;
    Ok(response.items)
}

fn preview(body: &str) -> String {
    if body.chars().count() > BODY_PREVIEW_LENGTH {
        let cut: String = body.chars().take(BODY_PREVIEW_LENGTH).collect();
        format!("{}...", cut)
    } else {
        body.to_string()
    }
}
