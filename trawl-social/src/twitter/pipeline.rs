//! Keyword fetch, merge and dedup pipeline.
//!
//! Every keyword is fetched in turn with the full `count` budget, never split across
//! keywords. Failures shrink the output instead of aborting: a bad item is skipped, a
//! failed page ends that keyword's pagination, a failed first search yields nothing.
//! When the whole run comes back empty, one trending topic is searched instead.
use std::collections::HashSet;

use trawl_common::PostRecord;

use crate::twitter::extract::tweet_to_record;
use crate::twitter::types::{SearchProduct, SearchSession};

pub const DEFAULT_TREND_CATEGORY: &str = "trending";

/// What one run should fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub keywords: Vec<String>,
    /// Per-keyword item cap, at least 1.
    pub count: usize,
    pub product: SearchProduct,
    pub trend_category: String,
}

impl FetchPlan {
    pub fn new(keywords: Vec<String>, count: usize, product: SearchProduct) -> Self {
        Self {
            keywords,
            count: count.max(1),
            product,
            trend_category: DEFAULT_TREND_CATEGORY.to_string(),
        }
    }

    pub fn with_trend_category(mut self, category: impl Into<String>) -> Self {
        self.trend_category = category.into();
        self
    }

    /// Maximum number of records returned by [`collect_posts`].
    ///
    /// ```
    /// use trawl_social::twitter::{FetchPlan, SearchProduct};
    ///
    /// let plan = FetchPlan::new(vec!["a".into(), "b".into()], 5, SearchProduct::Latest);
    /// assert_eq!(plan.output_bound(), 10);
    /// assert_eq!(FetchPlan::new(vec![], 5, SearchProduct::Latest).output_bound(), 5);
    /// ```
    pub fn output_bound(&self) -> usize {
        self.count.saturating_mul(self.keywords.len().max(1))
    }
}

/// Fetch up to `limit` records for one keyword, walking result pages.
pub async fn fetch_for_keyword<S>(
    session: &S,
    keyword: &str,
    limit: usize,
    product: SearchProduct,
) -> Vec<PostRecord>
where
    S: SearchSession + ?Sized,
{
    let mut records = Vec::new();
    let mut page = match session.search(keyword, product).await {
        Ok(page) => page,
        Err(err) => {
            tracing::warn!(target: "social.twitter", keyword, error = %err, "twitter.keyword.search_failed");
            return records;
        }
    };

    let mut pages = 1usize;
    while records.len() < limit && !page.is_empty() {
        for raw in &page.items {
            match tweet_to_record(raw, keyword, records.len()) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::debug!(target: "social.twitter", keyword, error = %err, "twitter.item.skipped");
                    continue;
                }
            }
            if records.len() >= limit {
                break;
            }
        }
        if records.len() >= limit {
            break;
        }

        page = match session.next_page(&page).await {
            Ok(Some(next)) => next,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(
                    target: "social.twitter",
                    keyword,
                    pages,
                    collected = records.len(),
                    error = %err,
                    "twitter.keyword.page_failed"
                );
                break;
            }
        };
        pages += 1;
    }

    tracing::info!(target: "social.twitter", keyword, pages, collected = records.len(), "twitter.keyword.done");
    records
}

/// Run the whole plan: every keyword in order, the trending fallback, dedup, truncate.
pub async fn collect_posts<S>(session: &S, plan: &FetchPlan) -> Vec<PostRecord>
where
    S: SearchSession + ?Sized,
{
    let mut all = Vec::new();
    for keyword in &plan.keywords {
        let part = fetch_for_keyword(session, keyword, plan.count, plan.product).await;
        all.extend(part);
    }

    if plan.keywords.is_empty() || all.is_empty() {
        match trending_keyword(session, &plan.trend_category).await {
            Some(keyword) => {
                tracing::info!(target: "social.twitter", keyword = %keyword, "twitter.trending.fallback");
                all.extend(fetch_for_keyword(session, &keyword, plan.count, plan.product).await);
            }
            None => tracing::info!(target: "social.twitter", "twitter.trending.none"),
        }
    }

    let mut unique = dedup_posts(all);
    unique.truncate(plan.output_bound());
    unique
}

async fn trending_keyword<S>(session: &S, category: &str) -> Option<String>
where
    S: SearchSession + ?Sized,
{
    match session.trends(category).await {
        Ok(trends) => trends
            .first()
            .and_then(|t| t.keyword())
            .map(str::to_string),
        Err(err) => {
            tracing::warn!(target: "social.twitter", category, error = %err, "twitter.trending.failed");
            None
        }
    }
}

/// Drop records whose `"<url>-<postId>"` key was already seen, keeping order.
pub fn dedup_posts(records: Vec<PostRecord>) -> Vec<PostRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.dedup_key()))
        .collect()
}
