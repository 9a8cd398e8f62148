//! Domain constants that define the operational boundaries of the collector.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. Reading these constants should tell you how the
//! collector talks to YouTube and what it considers a usable video.

use std::time::Duration;

// ---------------------------------------------------------------------------
// YouTube Data API boundaries
// ---------------------------------------------------------------------------

/// Base URL of the YouTube Data API v3.
pub const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// How many results `search.list` returns per page at most.
///
/// The collector always asks for the maximum to minimize quota spent on
/// pagination round-trips.
pub const SEARCH_PAGE_SIZE: usize = 50;

/// How many ids `videos.list` accepts in a single call.
pub const VIDEO_DETAILS_GROUP_SIZE: usize = 50;

/// How many ids `channels.list` accepts in a single call.
pub const CHANNEL_DETAILS_GROUP_SIZE: usize = 50;

/// Case-insensitive marker that identifies quota exhaustion in an error payload.
pub const QUOTA_ERROR_MARKER: &str = "quota";

/// Per-request timeout for the blocking HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Retry behaviour
// ---------------------------------------------------------------------------

/// Total attempts for a call failing with a transient error.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fixed pause between transient-error attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Collection loop and quality thresholds
// ---------------------------------------------------------------------------

/// New identifiers requested from the search stream per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Consecutive batches without a single new raw item before the run stalls.
pub const DEFAULT_MAX_STALL_BATCHES: usize = 3;

/// YouTube category id the collector keeps by default (People & Blogs).
pub const DEFAULT_TARGET_CATEGORY: &str = "22";

/// ISO 3166-1 alpha-2 country the owning channel must report.
pub const DEFAULT_TARGET_REGION: &str = "US";

/// Subscriber floor for the owning channel.
pub const DEFAULT_MIN_SUBSCRIBERS: u64 = 10_000;

/// Lifetime channel view floor, accepted in place of the subscriber floor.
pub const DEFAULT_MIN_CHANNEL_VIEWS: u64 = 1_000_000;

/// Minimum `(likes + comments) / views * 100`.
pub const DEFAULT_MIN_ENGAGEMENT_RATE: f64 = 1.0;

/// Passing videos requested per keyword when the caller does not say.
pub const DEFAULT_TARGET_COUNT: usize = 50;

/// Decimal places kept on the computed engagement rate.
pub const ENGAGEMENT_RATE_PRECISION: i32 = 4;
