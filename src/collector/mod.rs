//! The batched, quota-aware collection engine.
//!
//! One [`CollectorEngine`] owns one credential pool and one source. Each
//! [`collect`](CollectorEngine::collect) call runs the batch loop
//! search → details → channels → filter → accumulate until the target is
//! met, the search stream is exhausted, or batches stop adding videos.

pub mod enrich;
pub mod filter;
pub mod pages;

use crate::api::{VideoSource, YouTubeHttpClient};
use crate::config::{CollectorConfig, QueryDescriptor};
use crate::credentials::CredentialPool;
use crate::error::AppError;
use crate::error_recovery::RetryingInvoker;
use crate::model::{FilteredItem, RawItem};
use crate::types::{ApiKey, VideoId};
use chrono::{DateTime, Utc};
use filter::QualityFilter;
use pages::BatchState;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminalState {
    /// Exactly the requested number of passing videos was collected.
    TargetReached,
    /// The search stream had no further distinct results.
    UpstreamExhausted,
    /// Too many consecutive batches added no new videos.
    Stalled,
    /// Every key ran out of quota; only seen on partial results.
    CredentialsExhausted,
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetReached => write!(f, "target reached"),
            Self::UpstreamExhausted => write!(f, "upstream exhausted"),
            Self::Stalled => write!(f, "stalled"),
            Self::CredentialsExhausted => write!(f, "credentials exhausted"),
        }
    }
}

/// The outcome of one `collect` call.
///
/// `raw_items` holds every enriched video with its verdict. On
/// `TargetReached` the filtered list is cut to the target, so some passing
/// videos may appear in `raw_items` but not in `filtered_items`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionResult {
    pub run_id: Uuid,
    pub keyword: String,
    pub collected_at: DateTime<Utc>,
    pub terminal_state: TerminalState,
    pub batches: usize,
    pub filtered_items: Vec<FilteredItem>,
    pub raw_items: Vec<RawItem>,
    pub identifiers: Vec<VideoId>,
}

/// Loop-private accumulators for one run.
struct Accumulator {
    raw_items: Vec<RawItem>,
    raw_ids: HashSet<VideoId>,
    filtered_items: Vec<FilteredItem>,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            raw_items: Vec::new(),
            raw_ids: HashSet::new(),
            filtered_items: Vec::new(),
        }
    }

    /// Adds items not seen in earlier batches; returns how many were new.
    fn absorb(&mut self, items: Vec<RawItem>) -> usize {
        let mut fresh = 0;
        for item in items {
            if !self.raw_ids.insert(item.video_id.clone()) {
                continue;
            }
            fresh += 1;
            if item.quality_filter_passed {
                self.filtered_items.extend(FilteredItem::accept(item.clone()));
            }
            self.raw_items.push(item);
        }
        fresh
    }

    fn into_result(
        self,
        run_id: Uuid,
        keyword: &str,
        terminal_state: TerminalState,
        batches: usize,
    ) -> CollectionResult {
        let identifiers = self
            .filtered_items
            .iter()
            .map(|item| item.video_id.clone())
            .collect();
        CollectionResult {
            run_id,
            keyword: keyword.to_string(),
            collected_at: Utc::now(),
            terminal_state,
            batches,
            filtered_items: self.filtered_items,
            raw_items: self.raw_items,
            identifiers,
        }
    }
}

/// Collects quality-filtered videos for one query at a time.
pub struct CollectorEngine<S> {
    source: S,
    invoker: RetryingInvoker,
    filter: QualityFilter,
    config: CollectorConfig,
}

impl CollectorEngine<YouTubeHttpClient> {
    /// Builds an engine that talks to the live YouTube API.
    pub fn connect(config: CollectorConfig, api_keys: Vec<ApiKey>) -> Result<Self, AppError> {
        let client = YouTubeHttpClient::new(&config.api_base_url, config.request_timeout)?;
        Self::new(client, config, api_keys)
    }
}

impl<S: VideoSource> CollectorEngine<S> {
    pub fn new(source: S, config: CollectorConfig, api_keys: Vec<ApiKey>) -> Result<Self, AppError> {
        config.validate()?;
        let pool = CredentialPool::new(api_keys)?;
        Ok(Self {
            source,
            invoker: RetryingInvoker::new(pool, config.retry),
            filter: QualityFilter::new(config.filter_criteria()),
            config,
        })
    }

    pub fn credentials(&self) -> &CredentialPool {
        self.invoker.pool()
    }

    pub fn filter(&self) -> &QualityFilter {
        &self.filter
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Runs the batch loop for `query` until a terminal state is reached.
    ///
    /// Fails with [`AppError::CredentialsExhausted`] when every key is out of
    /// quota, or with an upstream error when a search or detail call cannot
    /// be completed.
    pub fn collect(&mut self, query: &QueryDescriptor) -> Result<CollectionResult, AppError> {
        query.validate()?;
        let run_id = Uuid::new_v4();
        log::info!(
            "[{}] Collecting {} video(s) for '{}' (batch size {})",
            run_id,
            query.target_count,
            query.keyword,
            self.config.batch_size
        );

        let mut state = BatchState::new();
        let mut acc = Accumulator::new();
        let mut batches = 0usize;

        let terminal_state = loop {
            match self.run_batch(query, &mut state, &mut acc) {
                Ok(Some(terminal)) => {
                    batches += 1;
                    break terminal;
                }
                Ok(None) => batches += 1,
                Err(AppError::CredentialsExhausted { credentials, .. }) => {
                    log::error!(
                        "[{}] All {} credential(s) exhausted after {} batch(es); {} raw, {} passing",
                        run_id,
                        credentials,
                        batches,
                        acc.raw_items.len(),
                        acc.filtered_items.len()
                    );
                    let partial = self.config.partial_results_on_exhaustion.then(|| {
                        Box::new(acc.into_result(
                            run_id,
                            &query.keyword,
                            TerminalState::CredentialsExhausted,
                            batches,
                        ))
                    });
                    return Err(AppError::CredentialsExhausted {
                        credentials,
                        partial,
                    });
                }
                Err(other) => return Err(other),
            }
        };

        let mut result = acc.into_result(run_id, &query.keyword, terminal_state, batches);
        if terminal_state == TerminalState::TargetReached {
            result.filtered_items.truncate(query.target_count);
            result.identifiers.truncate(query.target_count);
        }

        log::info!(
            "[{}] '{}' finished ({}) after {} batch(es): {} passing of {} raw",
            run_id,
            query.keyword,
            terminal_state,
            batches,
            result.filtered_items.len(),
            result.raw_items.len()
        );
        Ok(result)
    }

    /// One iteration of the loop. `Some` means the run is over.
    fn run_batch(
        &mut self,
        query: &QueryDescriptor,
        state: &mut BatchState,
        acc: &mut Accumulator,
    ) -> Result<Option<TerminalState>, AppError> {
        let batch = pages::collect_page_batch(
            &self.source,
            &mut self.invoker,
            query,
            self.config.batch_size,
            state,
        )?;
        if batch.video_ids.is_empty() {
            return Ok(Some(TerminalState::UpstreamExhausted));
        }

        let mut items =
            enrich::fetch_details(&self.source, &mut self.invoker, &batch.video_ids, &query.keyword)?;
        let owner_ids: Vec<_> = items.iter().map(|item| item.channel_id.clone()).collect();
        let owners = enrich::fetch_owner_attributes(&self.source, &mut self.invoker, &owner_ids)?;
        enrich::merge_owner_attributes(&mut items, &owners);

        for item in &mut items {
            let verdict = self.filter.evaluate(item);
            item.attach_verdict(verdict.passed, &verdict.reasons);
        }

        let batch_len = items.len();
        let fresh = acc.absorb(items);
        if fresh == 0 {
            state.stalled_batches += 1;
        } else {
            state.stalled_batches = 0;
        }

        log::info!(
            "Batch for '{}': {} ids, {} detailed, {} new; {}/{} passing so far",
            query.keyword,
            batch.video_ids.len(),
            batch_len,
            fresh,
            acc.filtered_items.len(),
            query.target_count
        );

        if acc.filtered_items.len() >= query.target_count {
            return Ok(Some(TerminalState::TargetReached));
        }
        if state.stalled_batches >= self.config.max_stall_batches {
            log::warn!(
                "'{}' stalled: {} consecutive batch(es) without new videos",
                query.keyword,
                state.stalled_batches
            );
            return Ok(Some(TerminalState::Stalled));
        }
        if batch.exhausted {
            return Ok(Some(TerminalState::UpstreamExhausted));
        }
        Ok(None)
    }
}
