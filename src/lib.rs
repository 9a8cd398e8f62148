// src/lib.rs
//! tubesift library: collects quality-filtered YouTube videos for
//! brand-sentiment datasets without overrunning any API key's quota.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ValidationError`, `classify_error`
//! - **Configuration**: `CollectorConfig`, `QueryDescriptor`
//! - **Credentials**: `CredentialPool`, `RetryingInvoker`
//! - **API client**: `VideoSource`, `YouTubeHttpClient`, typed responses
//! - **Collection**: `CollectorEngine`, `CollectionResult`, `QualityFilter`

pub mod analytics;
pub mod api;
pub mod collector;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod error_recovery;
pub mod model;
pub mod types;

// --- Error Handling ---
pub use crate::error::{classify_error, AppError, ErrorClass, YouTubeErrorReason};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CollectorConfig, QueryDescriptor};

// --- Domain Types ---
pub use crate::model::{ChannelAttributes, FilteredItem, RawItem};
pub use crate::types::{ApiKey, ChannelId, VideoId};

// --- Credentials and Retry ---
pub use crate::credentials::{Credential, CredentialPool};
pub use crate::error_recovery::{RetryPolicy, RetryingInvoker};

// --- API Client ---
pub use crate::api::{SearchPage, SearchRequest, VideoSource, YouTubeHttpClient};

// --- Collection ---
pub use crate::collector::filter::{FilterCriteria, FilterVerdict, Predicate, QualityFilter};
pub use crate::collector::pages::{collect_page_batch, BatchState, PageBatch};
pub use crate::collector::{CollectionResult, CollectorEngine, TerminalState};

// --- Analytics ---
pub use crate::analytics::{summarize, RunSummary};
