//! Twitter/X integration surface.
//!
//! `client` talks to the web GraphQL endpoints with session cookies, `extract` turns
//! raw timeline items into records, `pipeline` walks pages per keyword and merges the
//! results, and `types` holds the page/trend models plus the [`SearchSession`] seam.
pub mod client;
pub mod extract;
pub mod pipeline;
pub mod types;

pub use client::TwitterSession;
pub use pipeline::{FetchPlan, collect_posts, dedup_posts, fetch_for_keyword};
pub use types::{SearchPage, SearchProduct, SearchSession, Trend, TwitterError};

/// Value of the `platform` key on every record produced here.
pub const PLATFORM: &str = "twitter";
