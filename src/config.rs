use crate::collector::filter::FilterCriteria;
use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_STALL_BATCHES, DEFAULT_MIN_CHANNEL_VIEWS,
    DEFAULT_MIN_ENGAGEMENT_RATE, DEFAULT_MIN_SUBSCRIBERS, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_TARGET_CATEGORY, DEFAULT_TARGET_COUNT, DEFAULT_TARGET_REGION, YOUTUBE_API_BASE_URL,
};
use crate::error::AppError;
use crate::error_recovery::RetryPolicy;
use crate::types::{ApiKey, ValidationError};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding comma-separated keys in rotation order.
pub const API_KEYS_ENV: &str = "YOUTUBE_API_KEYS";

/// Single-key fallback when [`API_KEYS_ENV`] is unset.
pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Search keywords; each one is collected independently, in order
    #[arg(required = true)]
    pub keywords: Vec<String>,

    /// Passing videos wanted per keyword
    #[arg(short, long, default_value_t = DEFAULT_TARGET_COUNT)]
    pub target: usize,

    /// Region hint for search ranking (ISO 3166-1 alpha-2)
    #[arg(long)]
    pub region: Option<String>,

    /// Relevance language hint for search (ISO 639-1)
    #[arg(long)]
    pub language: Option<String>,

    /// YouTube category id a video must belong to
    #[arg(long, default_value = DEFAULT_TARGET_CATEGORY)]
    pub category: String,

    /// Country the owning channel must report
    #[arg(long, default_value = DEFAULT_TARGET_REGION)]
    pub channel_country: String,

    /// Minimum channel subscribers
    #[arg(long, default_value_t = DEFAULT_MIN_SUBSCRIBERS)]
    pub min_subscribers: u64,

    /// Minimum lifetime channel views (accepted instead of subscribers)
    #[arg(long, default_value_t = DEFAULT_MIN_CHANNEL_VIEWS)]
    pub min_channel_views: u64,

    /// Minimum engagement rate in percent
    #[arg(long, default_value_t = DEFAULT_MIN_ENGAGEMENT_RATE)]
    pub min_engagement: f64,

    /// New search results requested per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Consecutive batches without new videos before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_STALL_BATCHES)]
    pub max_stall_batches: usize,

    /// Return what was collected when every API key runs out of quota
    #[arg(long, default_value_t = false)]
    pub partial_on_exhaustion: bool,

    /// Write results as JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Override the API base URL (for proxies and test doubles)
    #[arg(long, default_value = YOUTUBE_API_BASE_URL, hide = true)]
    pub api_base_url: String,
}

/// Explicit engine configuration. Each engine owns its own copy.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    pub target_category: String,
    pub target_owner_region: String,
    pub min_owner_followers: u64,
    pub min_owner_reach: u64,
    pub min_engagement_rate: f64,
    pub batch_size: usize,
    pub max_stall_batches: usize,
    /// Attach accumulated items to the credentials-exhausted error.
    pub partial_results_on_exhaustion: bool,
    pub retry: RetryPolicy,
    pub api_base_url: String,
    pub request_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            target_category: DEFAULT_TARGET_CATEGORY.to_string(),
            target_owner_region: DEFAULT_TARGET_REGION.to_string(),
            min_owner_followers: DEFAULT_MIN_SUBSCRIBERS,
            min_owner_reach: DEFAULT_MIN_CHANNEL_VIEWS,
            min_engagement_rate: DEFAULT_MIN_ENGAGEMENT_RATE,
            batch_size: DEFAULT_BATCH_SIZE,
            max_stall_batches: DEFAULT_MAX_STALL_BATCHES,
            partial_results_on_exhaustion: false,
            retry: RetryPolicy::default(),
            api_base_url: YOUTUBE_API_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl CollectorConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.target_category.trim().is_empty() {
            return Err(ValidationError::EmptyField("target_category"));
        }
        if self.target_owner_region.trim().is_empty() {
            return Err(ValidationError::EmptyField("target_owner_region"));
        }
        if self.batch_size == 0 {
            return Err(ValidationError::BelowMinimum {
                field: "batch_size",
                value: 0,
                min: 1,
            });
        }
        if self.max_stall_batches == 0 {
            return Err(ValidationError::BelowMinimum {
                field: "max_stall_batches",
                value: 0,
                min: 1,
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ValidationError::BelowMinimum {
                field: "retry.max_attempts",
                value: 0,
                min: 1,
            });
        }
        if !self.min_engagement_rate.is_finite() || self.min_engagement_rate < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "min_engagement_rate",
                reason: format!(
                    "{} is not a non-negative number",
                    self.min_engagement_rate
                ),
            });
        }
        Ok(())
    }

    /// The quality thresholds carried by this configuration.
    pub fn filter_criteria(&self) -> FilterCriteria {
        FilterCriteria {
            target_category: self.target_category.clone(),
            target_owner_region: self.target_owner_region.clone(),
            min_owner_followers: self.min_owner_followers,
            min_owner_reach: self.min_owner_reach,
            min_engagement_rate: self.min_engagement_rate,
        }
    }
}

/// What to search for and how many passing videos to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub keyword: String,
    pub region_code: Option<String>,
    pub relevance_language: Option<String>,
    pub target_count: usize,
}

impl QueryDescriptor {
    pub fn new(keyword: impl Into<String>, target_count: usize) -> Self {
        Self {
            keyword: keyword.into(),
            region_code: None,
            relevance_language: None,
            target_count,
        }
    }

    pub fn with_region(mut self, region_code: impl Into<String>) -> Self {
        self.region_code = Some(region_code.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.relevance_language = Some(language.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.keyword.trim().is_empty() {
            return Err(ValidationError::EmptyField("keyword"));
        }
        if self.target_count == 0 {
            return Err(ValidationError::BelowMinimum {
                field: "target_count",
                value: 0,
                min: 1,
            });
        }
        Ok(())
    }
}

/// Everything the binary needs: credentials, engine config and the queries.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub api_keys: Vec<ApiKey>,
    pub collector: CollectorConfig,
    pub queries: Vec<QueryDescriptor>,
    pub output_file: Option<PathBuf>,
    pub verbose: bool,
}

impl PipelineSettings {
    /// Resolves settings from CLI input and an environment lookup.
    pub fn resolve(
        cli: CommandLineInput,
        env_lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let api_keys = resolve_api_keys(&env_lookup)?;

        let collector = CollectorConfig {
            target_category: cli.category,
            target_owner_region: cli.channel_country,
            min_owner_followers: cli.min_subscribers,
            min_owner_reach: cli.min_channel_views,
            min_engagement_rate: cli.min_engagement,
            batch_size: cli.batch_size,
            max_stall_batches: cli.max_stall_batches,
            partial_results_on_exhaustion: cli.partial_on_exhaustion,
            api_base_url: cli.api_base_url,
            ..CollectorConfig::default()
        };
        collector.validate()?;

        let queries = cli
            .keywords
            .into_iter()
            .map(|keyword| {
                let mut query = QueryDescriptor::new(keyword.trim(), cli.target);
                query.region_code = cli.region.clone();
                query.relevance_language = cli.language.clone();
                query.validate().map(|_| query)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            api_keys,
            collector,
            queries,
            output_file: cli.output,
            verbose: cli.verbose,
        })
    }
}

fn resolve_api_keys(env_lookup: &impl Fn(&str) -> Option<String>) -> Result<Vec<ApiKey>, AppError> {
    let raw = env_lookup(API_KEYS_ENV)
        .filter(|value| !value.trim().is_empty())
        .or_else(|| env_lookup(API_KEY_ENV))
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            AppError::MissingConfiguration(format!(
                "{} (or {}) environment variable not set",
                API_KEYS_ENV, API_KEY_ENV
            ))
        })?;
    let keys = ApiKey::parse_list(&raw)?;
    if keys.is_empty() {
        return Err(AppError::MissingConfiguration(format!(
            "{} contains no usable keys",
            API_KEYS_ENV
        )));
    }
    Ok(keys)
}

/// Reads a trimmed, non-empty process environment variable.
pub fn env_var_string(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
