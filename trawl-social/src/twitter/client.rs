//! Cookie-authenticated session for the X web API.
//!
//! Searches go through the `SearchTimeline` GraphQL operation and trends through the
//! `guide.json` explore endpoint, both with the headers a logged-in browser sends.
//! Pagination is cursor based: every [`SearchPage`] remembers its bottom cursor.
use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Duration;
use trawl_config::{Credentials, TwitterSettings};
use trawl_http::{Auth, HttpClient, HttpError, RequestOpts};

use crate::twitter::extract::{parse_search_timeline, parse_trends};
use crate::twitter::types::{SearchPage, SearchProduct, SearchSession, Trend, TwitterError};

const TRENDS_PATH: &str = "i/api/2/guide.json";
const TRENDS_COUNT: u32 = 20;

/// Cookie names the session needs; everything else in the jar is passed through.
const AUTH_COOKIE: &str = "auth_token";
const CSRF_COOKIE: &str = "ct0";

#[derive(Clone)]
pub struct TwitterSession {
    http: HttpClient,
    settings: TwitterSettings,
    cookies: BTreeMap<String, String>,
}

impl std::fmt::Debug for TwitterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterSession")
            .field("base", &self.http.base().as_str())
            .field("locale", &self.settings.locale)
            .field("cookies", &self.cookies.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TwitterSession {
    /// Build an unauthenticated session; fails only when the HTTP transport cannot be built.
    pub fn new(settings: &TwitterSettings) -> Result<Self, TwitterError> {
        let http = HttpClient::new(&settings.base_url)?
            .with_timeout(Duration::from_secs(settings.timeout_secs.max(1)));
        Ok(Self {
            http,
            settings: settings.clone(),
            cookies: BTreeMap::new(),
        })
    }

    /// Install `auth_token` and `ct0`, optionally dropping every cookie held before.
    pub fn set_cookies(
        &mut self,
        credentials: &Credentials,
        clear_existing: bool,
    ) -> Result<(), TwitterError> {
        for (name, value) in [
            (AUTH_COOKIE, &credentials.auth_token),
            (CSRF_COOKIE, &credentials.ct0),
        ] {
            validate_cookie(name, value)?;
        }
        if clear_existing {
            self.cookies.clear();
        }
        self.cookies
            .insert(AUTH_COOKIE.to_string(), credentials.auth_token.clone());
        self.cookies
            .insert(CSRF_COOKIE.to_string(), credentials.ct0.clone());
        tracing::debug!(cookies = self.cookies.len(), "twitter.session.cookies_set");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.cookies.contains_key(AUTH_COOKIE) && self.cookies.contains_key(CSRF_COOKIE)
    }

    fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn browser_headers(&self) -> Result<HeaderMap, TwitterError> {
        let mut headers = HeaderMap::new();
        let mut put = |name: HeaderName, value: &str| -> Result<(), TwitterError> {
            let value = HeaderValue::from_str(value)
                .map_err(|e| HttpError::Build(format!("invalid {} header: {e}", name.as_str())))?;
            headers.insert(name, value);
            Ok(())
        };
        put(CONTENT_TYPE, "application/json")?;
        put(USER_AGENT, &self.settings.user_agent)?;
        put(ACCEPT_LANGUAGE, &self.settings.locale)?;
        put(HeaderName::from_static("x-twitter-auth-type"), "OAuth2Session")?;
        put(HeaderName::from_static("x-twitter-active-user"), "yes")?;
        put(
            HeaderName::from_static("x-twitter-client-language"),
            self.settings.language(),
        )?;
        Ok(headers)
    }

    async fn get_authenticated(
        &self,
        path: &str,
        query: Vec<(&str, std::borrow::Cow<'_, str>)>,
    ) -> Result<Value, TwitterError> {
        let csrf = self
            .cookies
            .get(CSRF_COOKIE)
            .filter(|_| self.is_authenticated())
            .ok_or(TwitterError::NotAuthenticated)?;
        let cookie = self.cookie_header();

        let resp = self
            .http
            .get_json(
                path,
                RequestOpts {
                    auth: Some(Auth::CookieSession {
                        bearer: &self.settings.bearer_token,
                        cookie: &cookie,
                        csrf,
                    }),
                    headers: Some(self.browser_headers()?),
                    query: Some(query),
                    ..Default::default()
                },
            )
            .await?;
        Ok(resp)
    }

    async fn search_timeline(
        &self,
        query: &str,
        product: SearchProduct,
        cursor: Option<&str>,
    ) -> Result<SearchPage, TwitterError> {
        let mut variables = json!({
            "rawQuery": query,
            "count": self.settings.page_size,
            "querySource": "typed_query",
            "product": product.as_str(),
        });
        if let Some(cursor) = cursor {
            variables["cursor"] = Value::from(cursor);
        }

        let path = format!(
            "i/api/graphql/{}/SearchTimeline",
            self.settings.search_query_id
        );
        let body = self
            .get_authenticated(
                &path,
                vec![
                    ("variables", variables.to_string().into()),
                    ("features", search_features().to_string().into()),
                ],
            )
            .await?;

        let (items, next_cursor) = parse_search_timeline(&body)?;
        tracing::debug!(
            target: "social.twitter",
            query = %query,
            product = product.as_str(),
            paged = cursor.is_some(),
            items = items.len(),
            has_next = next_cursor.is_some(),
            "twitter.search.page"
        );
        Ok(SearchPage {
            query: query.to_string(),
            product,
            items,
            next_cursor,
        })
    }
}

#[async_trait]
impl SearchSession for TwitterSession {
    async fn search(
        &self,
        query: &str,
        product: SearchProduct,
    ) -> Result<SearchPage, TwitterError> {
        self.search_timeline(query, product, None).await
    }

    async fn next_page(&self, page: &SearchPage) -> Result<Option<SearchPage>, TwitterError> {
        let Some(cursor) = page.next_cursor.as_deref() else {
            return Ok(None);
        };
        self.search_timeline(&page.query, page.product, Some(cursor))
            .await
            .map(Some)
    }

    async fn trends(&self, category: &str) -> Result<Vec<Trend>, TwitterError> {
        let count = TRENDS_COUNT.to_string();
        let body = self
            .get_authenticated(
                TRENDS_PATH,
                vec![
                    ("count", count.into()),
                    ("include_page_configuration", "false".into()),
                    ("initial_tab_id", category.into()),
                ],
            )
            .await?;
        let trends = parse_trends(&body)?;
        tracing::debug!(target: "social.twitter", category, trends = trends.len(), "twitter.trends");
        Ok(trends)
    }
}

fn validate_cookie(name: &'static str, value: &str) -> Result<(), TwitterError> {
    let reason = if value.is_empty() {
        Some("empty value")
    } else if value
        .bytes()
        .any(|b| b < 0x21 || b == 0x7F || b == b';' || b == b',' || b == b'"' || b == b'\\')
    {
        Some("contains characters not allowed in a cookie value")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(TwitterError::InvalidCookie {
            name,
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Feature switches the web client sends with `SearchTimeline`.
fn search_features() -> Value {
    json!({
        "rweb_tipjar_consumption_enabled": true,
        "responsive_web_graphql_exclude_directive_enabled": true,
        "verified_phone_label_enabled": false,
        "creator_subscriptions_tweet_preview_api_enabled": true,
        "responsive_web_graphql_timeline_navigation_enabled": true,
        "responsive_web_graphql_skip_user_profile_image_extensions_enabled": false,
        "communities_web_enable_tweet_community_results_fetch": true,
        "c9s_tweet_anatomy_moderator_badge_enabled": true,
        "articles_preview_enabled": true,
        "tweetypie_unmention_optimization_enabled": true,
        "responsive_web_edit_tweet_api_enabled": true,
        "graphql_is_translatable_rweb_tweet_is_translatable_enabled": true,
        "view_counts_everywhere_api_enabled": true,
        "longform_notetweets_consumption_enabled": true,
        "responsive_web_twitter_article_tweet_consumption_enabled": true,
        "tweet_awards_web_tipping_enabled": false,
        "creator_subscriptions_quote_tweet_preview_enabled": false,
        "freedom_of_speech_not_reach_fetch_enabled": true,
        "standardized_nudges_misinfo": true,
        "tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled": true,
        "rweb_video_timestamps_enabled": true,
        "longform_notetweets_rich_text_read_enabled": true,
        "longform_notetweets_inline_media_enabled": true,
        "responsive_web_enhance_cards_enabled": false
    })
}
