//! Paged id collection from the search stream, deduplicated per run.

use crate::api::{SearchRequest, VideoSource};
use crate::config::QueryDescriptor;
use crate::error::AppError;
use crate::error_recovery::RetryingInvoker;
use crate::types::VideoId;
use std::collections::HashSet;

/// Per-run collection state. Created by each `collect` call and dropped with it.
#[derive(Debug, Default)]
pub struct BatchState {
    seen: HashSet<VideoId>,
    cursor: Option<String>,
    pages_exhausted: bool,
    pages_requested: usize,
    pub(crate) stalled_batches: usize,
}

impl BatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` has been returned by the search stream in this run.
    pub fn has_seen(&self, id: &VideoId) -> bool {
        self.seen.contains(id)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn pages_requested(&self) -> usize {
        self.pages_requested
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

/// Ids gathered for one batch, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBatch {
    pub video_ids: Vec<VideoId>,
    /// The search stream has nothing further to offer this run.
    pub exhausted: bool,
}

/// Pulls search pages until `batch_size_target` new ids are in hand.
///
/// Stops early, reporting exhaustion, when the cursor runs out or a page
/// adds no id that this run has not already seen. Ids from the final page
/// are all kept even if they overshoot the target, since the cursor has
/// already moved past them.
pub fn collect_page_batch<S: VideoSource>(
    source: &S,
    invoker: &mut RetryingInvoker,
    query: &QueryDescriptor,
    batch_size_target: usize,
    state: &mut BatchState,
) -> Result<PageBatch, AppError> {
    let mut video_ids = Vec::new();

    loop {
        if state.pages_exhausted {
            return Ok(PageBatch {
                video_ids,
                exhausted: true,
            });
        }

        let request = SearchRequest {
            keyword: &query.keyword,
            region_code: query.region_code.as_deref(),
            relevance_language: query.relevance_language.as_deref(),
            page_token: state.cursor.as_deref(),
        };
        let page = invoker.invoke("search", |key| source.search_page(key, &request))?;
        state.pages_requested += 1;

        let returned = page.video_ids.len();
        let before = video_ids.len();
        for id in page.video_ids {
            if state.seen.insert(id.clone()) {
                video_ids.push(id);
            }
        }
        let fresh = video_ids.len() - before;
        state.cursor = page.next_page_token;

        log::debug!(
            "Search page {} for '{}': {} returned, {} new",
            state.pages_requested,
            query.keyword,
            returned,
            fresh
        );

        if fresh == 0 {
            log::info!(
                "Search for '{}' returned no unseen videos on page {}; treating as exhausted",
                query.keyword,
                state.pages_requested
            );
            state.pages_exhausted = true;
        } else if state.cursor.is_none() {
            log::info!(
                "Search for '{}' has no further pages after page {}",
                query.keyword,
                state.pages_requested
            );
            state.pages_exhausted = true;
        } else if video_ids.len() >= batch_size_target {
            return Ok(PageBatch {
                video_ids,
                exhausted: false,
            });
        }
    }
}
