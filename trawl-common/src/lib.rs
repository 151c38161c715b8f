//! Common types and utilities shared across trawl crates.
//!
//! This crate defines the normalized output record, the error record emitted when a
//! run cannot produce data, observability helpers, and the shared error type. It is
//! intentionally lightweight so every crate can depend on it.
//!
//! # Overview
//!
//! - [`PostRecord`]: one normalized post, serialized with the fourteen fixed keys
//! - [`ErrorRecord`]: the `{error, detail}` object printed instead of records
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`TrawlError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use trawl_common::PostRecord;
//!
//! let record = PostRecord::new("twitter", "rust", "twitter:1");
//! assert_eq!(record.dedup_key(), "-twitter:1");
//! assert_eq!(record.likes, 0);
//! ```
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub mod observability;

/// Maximum number of characters kept in [`PostRecord::title`].
pub const TITLE_MAX_CHARS: usize = 120;

/// A single post normalized into the schema the caller stores.
///
/// Field order matches the serialized key order. Counters are unsigned and default to
/// zero, so the JSON never carries `null` or negative engagement numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "postId")]
    pub post_id: String,
    pub platform: String,
    pub keyword: String,
    pub author: String,
    pub url: String,
    pub title: String,
    pub desc: String,
    pub published_at: Option<String>,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
    pub followers: u64,
    pub fetched_at: String,
}

impl PostRecord {
    /// Start a record with empty text fields, zero counters and `fetched_at` set to now.
    pub fn new(platform: &str, keyword: &str, post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            platform: platform.to_string(),
            keyword: keyword.to_string(),
            author: String::new(),
            url: String::new(),
            title: String::new(),
            desc: String::new(),
            published_at: None,
            likes: 0,
            comments: 0,
            shares: 0,
            views: 0,
            followers: 0,
            fetched_at: now_rfc3339(),
        }
    }

    /// Set `desc` to the full text and `title` to its first [`TITLE_MAX_CHARS`] characters.
    pub fn with_text(mut self, text: &str) -> Self {
        self.title = text.chars().take(TITLE_MAX_CHARS).collect();
        self.desc = text.to_string();
        self
    }

    /// Composite key used to collapse duplicates: `"<url>-<postId>"`.
    pub fn dedup_key(&self) -> String {
        format!("{}-{}", self.url, self.post_id)
    }
}

/// The single object printed (inside a one-element array) when a run fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
    pub detail: String,
}

impl ErrorRecord {
    pub fn new(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: detail.into(),
        }
    }
}

impl From<&TrawlError> for ErrorRecord {
    fn from(err: &TrawlError) -> Self {
        ErrorRecord::new(err.summary(), err.to_string())
    }
}

/// Current UTC time as RFC 3339 with a `Z` suffix.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Error types used across the trawl workspace.
#[derive(thiserror::Error, Debug)]
pub enum TrawlError {
    /// The HTTP transport backing the session could not be built.
    #[error("session client unavailable: {0}")]
    ClientUnavailable(String),

    /// One or both cookie values are missing from the environment.
    #[error("set {0} in the environment")]
    MissingCredentials(String),

    /// The session refused the supplied cookie values.
    #[error("cookie rejected: {0}")]
    CredentialsRejected(String),

    /// Settings were incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Anything else that aborted the run.
    #[error("{0}")]
    Runtime(#[from] anyhow::Error),
}

impl TrawlError {
    /// Short, human-readable headline for the `error` key of an [`ErrorRecord`].
    pub fn summary(&self) -> &'static str {
        match self {
            TrawlError::ClientUnavailable(_) => "failed to initialise twitter client",
            TrawlError::MissingCredentials(_) => {
                "missing cookie (TWITTER_AUTH_TOKEN / TWITTER_CT0)"
            }
            TrawlError::CredentialsRejected(_) => "failed to set cookies",
            TrawlError::Config(_) => "invalid configuration",
            TrawlError::Runtime(_) => "run failed",
        }
    }
}

/// Convenient alias for results that use [`TrawlError`].
pub type Result<T> = std::result::Result<T, TrawlError>;
