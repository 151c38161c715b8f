use async_trait::async_trait;
use serde_json::Value;
use trawl_http::HttpError;

#[derive(Debug, thiserror::Error)]
pub enum TwitterError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("invalid cookie {name}: {reason}")]
    InvalidCookie { name: &'static str, reason: String },

    #[error("no session cookies set")]
    NotAuthenticated,

    #[error("unexpected response shape: {0}")]
    Shape(String),
}

/// Result ordering requested from search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchProduct {
    /// Chronological.
    #[default]
    Latest,
    /// Engagement-ranked.
    Top,
}

impl SearchProduct {
    /// `"top"` in any case selects [`SearchProduct::Top`]; every other value is `Latest`.
    ///
    /// ```
    /// use trawl_social::twitter::SearchProduct;
    ///
    /// assert_eq!(SearchProduct::from_mode("TOP"), SearchProduct::Top);
    /// assert_eq!(SearchProduct::from_mode("popular"), SearchProduct::Latest);
    /// ```
    pub fn from_mode(mode: &str) -> Self {
        if mode.trim().eq_ignore_ascii_case("top") {
            SearchProduct::Top
        } else {
            SearchProduct::Latest
        }
    }

    /// Name the search endpoint expects in its `product` variable.
    pub fn as_str(self) -> &'static str {
        match self {
            SearchProduct::Latest => "Latest",
            SearchProduct::Top => "Top",
        }
    }
}

/// One page of search results plus what is needed to request the next one.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub query: String,
    pub product: SearchProduct,
    /// Raw tweet payloads in timeline order; `Value::Null` marks an entry whose
    /// result was missing.
    pub items: Vec<Value>,
    pub next_cursor: Option<String>,
}

impl SearchPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A trending topic as listed by the trends guide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trend {
    pub name: String,
    pub query: Option<String>,
}

impl Trend {
    /// Search keyword for this trend: its name, else its query.
    pub fn keyword(&self) -> Option<&str> {
        let name = self.name.trim();
        if !name.is_empty() {
            return Some(name);
        }
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// Authenticated capability the fetch pipeline drives.
#[async_trait]
pub trait SearchSession: Send + Sync {
    /// First page of results for `query`.
    async fn search(&self, query: &str, product: SearchProduct)
    -> Result<SearchPage, TwitterError>;

    /// Page following `page`, or `None` when `page` was the last one.
    async fn next_page(&self, page: &SearchPage) -> Result<Option<SearchPage>, TwitterError>;

    /// Trending topics for a guide tab such as `"trending"`.
    async fn trends(&self, category: &str) -> Result<Vec<Trend>, TwitterError>;
}
