//! JSON extraction for the web timeline payloads.
//!
//! Field-level problems never fail: missing text becomes `""`, missing counters become
//! `0`, an unreadable timestamp becomes `None`. Only an item that is not a tweet at all
//! (tombstone, empty result) is rejected, and the caller skips it.
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use trawl_common::PostRecord;
use url::Url;

use crate::twitter::PLATFORM;
use crate::twitter::types::{Trend, TwitterError};

/// Host used for canonical status links.
pub const STATUS_HOST: &str = "x.com";

/// `created_at` layout used by the legacy tweet object.
const LEGACY_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Map one raw timeline tweet into a record for `keyword`.
///
/// `index` is the number of records already collected for the keyword and only shows
/// up in the synthetic `postId` given to tweets without an id.
pub fn tweet_to_record(raw: &Value, keyword: &str, index: usize) -> Result<PostRecord, TwitterError> {
    let tweet = unwrap_visibility(raw);
    let legacy = tweet
        .get("legacy")
        .filter(|l| l.is_object())
        .ok_or_else(|| {
            let kind = tweet
                .get("__typename")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            TwitterError::Shape(format!("timeline item is not a tweet ({kind})"))
        })?;

    let tweet_id = str_at(tweet, &["rest_id"])
        .or_else(|| str_at(legacy, &["id_str"]))
        .unwrap_or_default();

    let user = tweet.pointer("/core/user_results/result");
    let handle = user
        .and_then(|u| {
            str_at(u, &["legacy", "screen_name"]).or_else(|| str_at(u, &["core", "screen_name"]))
        })
        .unwrap_or_default();

    let post_id = if tweet_id.is_empty() {
        format!("{PLATFORM}:{keyword}:{index}")
    } else {
        format!("{PLATFORM}:{tweet_id}")
    };

    let text = str_at(tweet, &["note_tweet", "note_tweet_results", "result", "text"])
        .or_else(|| str_at(legacy, &["full_text"]))
        .or_else(|| str_at(legacy, &["text"]))
        .unwrap_or_default();

    let mut record = PostRecord::new(PLATFORM, keyword, post_id).with_text(text);
    record.author = handle.to_string();
    record.url = status_url(handle, tweet_id);
    record.published_at = legacy
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(normalize_created_at);
    record.likes = counter(legacy.get("favorite_count"));
    record.comments = counter(legacy.get("reply_count"));
    record.shares = counter(legacy.get("retweet_count"));
    record.views = counter(tweet.pointer("/views/count"));
    record.followers = counter(user.and_then(|u| u.pointer("/legacy/followers_count")));
    Ok(record)
}

/// `https://x.com/<handle>/status/<id>`, or `""` unless both parts are known.
pub fn status_url(handle: &str, tweet_id: &str) -> String {
    if handle.is_empty() || tweet_id.is_empty() {
        String::new()
    } else {
        format!("https://{STATUS_HOST}/{handle}/status/{tweet_id}")
    }
}

/// Convert the legacy `created_at` (or an RFC 3339 string) to RFC 3339 UTC.
pub fn normalize_created_at(raw: &str) -> Option<String> {
    let raw = raw.trim();
    DateTime::parse_from_str(raw, LEGACY_TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| {
            dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        })
}

/// Non-negative count from a number or a decimal string; everything else is 0.
fn counter(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn unwrap_visibility(raw: &Value) -> &Value {
    match raw.get("__typename").and_then(Value::as_str) {
        Some("TweetWithVisibilityResults") => raw.get("tweet").unwrap_or(raw),
        _ => raw,
    }
}

/// Non-empty string at `path`.
fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |cur, key| cur.get(*key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Raw tweet items and the bottom cursor of one `SearchTimeline` response.
pub fn parse_search_timeline(body: &Value) -> Result<(Vec<Value>, Option<String>), TwitterError> {
    let instructions = body
        .pointer("/data/search_by_raw_query/search_timeline/timeline/instructions")
        .and_then(Value::as_array)
        .ok_or_else(|| TwitterError::Shape("search response has no timeline instructions".into()))?;

    let mut items = Vec::new();
    let mut cursor = None;
    for instruction in instructions {
        match instruction.get("type").and_then(Value::as_str) {
            Some("TimelineAddEntries") => {
                let entries = instruction
                    .get("entries")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                for entry in entries {
                    read_entry(entry, &mut items, &mut cursor);
                }
            }
            Some("TimelineReplaceEntry") => {
                if let Some(entry) = instruction.get("entry") {
                    read_entry(entry, &mut items, &mut cursor);
                }
            }
            _ => {}
        }
    }
    Ok((items, cursor))
}

fn read_entry(entry: &Value, items: &mut Vec<Value>, cursor: &mut Option<String>) {
    let Some(entry_id) = entry.get("entryId").and_then(Value::as_str) else {
        return;
    };
    if entry_id.starts_with("tweet-") {
        let result = entry
            .pointer("/content/itemContent/tweet_results/result")
            .cloned()
            .unwrap_or(Value::Null);
        items.push(result);
    } else if entry_id.starts_with("cursor-bottom") {
        *cursor = entry
            .pointer("/content/value")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
    }
}

/// Trends listed by a `guide.json` response, in display order.
pub fn parse_trends(body: &Value) -> Result<Vec<Trend>, TwitterError> {
    let instructions = body
        .pointer("/timeline/instructions")
        .and_then(Value::as_array)
        .ok_or_else(|| TwitterError::Shape("trends response has no timeline instructions".into()))?;

    let trends = instructions
        .iter()
        .filter_map(|i| i.pointer("/addEntries/entries").and_then(Value::as_array))
        .flatten()
        .filter(|entry| {
            entry
                .get("entryId")
                .and_then(Value::as_str)
                .is_some_and(|id| id.contains("trends"))
        })
        .filter_map(|entry| entry.pointer("/content/timelineModule/items").and_then(Value::as_array))
        .flatten()
        .filter_map(|item| item.pointer("/item/content/trend"))
        .map(|trend| Trend {
            name: trend
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            query: trend
                .get("query")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| trend.pointer("/url/url").and_then(Value::as_str).and_then(query_param)),
        })
        .collect();
    Ok(trends)
}

fn query_param(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "query")
        .map(|(_, v)| v.into_owned())
}
