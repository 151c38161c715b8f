use serde_json::{Value, json};
use trawl_config::{Credentials, TwitterSettings};
use trawl_social::twitter::{
    FetchPlan, SearchProduct, SearchSession, TwitterSession, collect_posts, fetch_for_keyword,
};
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches on the JSON-encoded `variables` query parameter of a search call.
struct Variables {
    raw_query: &'static str,
    cursor: Option<&'static str>,
}

impl Match for Variables {
    fn matches(&self, request: &Request) -> bool {
        let Some((_, raw)) = request.url.query_pairs().find(|(k, _)| k == "variables") else {
            return false;
        };
        let vars: Value = serde_json::from_str(&raw).unwrap_or_default();
        vars.get("rawQuery").and_then(Value::as_str) == Some(self.raw_query)
            && vars.get("cursor").and_then(Value::as_str) == self.cursor
    }
}

fn tweet_entry(id: &str, handle: &str, text: &str) -> Value {
    json!({
        "entryId": format!("tweet-{id}"),
        "content": { "itemContent": { "tweet_results": { "result": {
            "__typename": "Tweet",
            "rest_id": id,
            "core": { "user_results": { "result": {
                "legacy": { "screen_name": handle, "followers_count": 42 }
            }}},
            "views": { "count": "1000" },
            "legacy": {
                "full_text": text,
                "created_at": "Tue Jan 02 03:04:05 +0000 2024",
                "favorite_count": 5,
                "reply_count": 1,
                "retweet_count": 2
            }
        }}}}
    })
}

fn timeline(entries: Vec<Value>, cursor: Option<&str>) -> Value {
    let mut entries = entries;
    if let Some(cursor) = cursor {
        entries.push(json!({ "entryId": "cursor-bottom-0", "content": { "value": cursor } }));
    }
    json!({ "data": { "search_by_raw_query": { "search_timeline": { "timeline": {
        "instructions": [ { "type": "TimelineAddEntries", "entries": entries } ]
    }}}}})
}

fn settings(server: &MockServer) -> TwitterSettings {
    TwitterSettings {
        base_url: server.uri(),
        ..TwitterSettings::default()
    }
}

async fn session(server: &MockServer) -> TwitterSession {
    let mut session = TwitterSession::new(&settings(server)).unwrap();
    session
        .set_cookies(&Credentials::new("tok", "csrf"), true)
        .unwrap();
    session
}

#[tokio::test]
async fn search_pages_follow_the_bottom_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/i/api/graphql/[^/]+/SearchTimeline$"))
        .and(header("x-csrf-token", "csrf"))
        .and(header("cookie", "auth_token=tok; ct0=csrf"))
        .and(header("x-twitter-auth-type", "OAuth2Session"))
        .and(Variables {
            raw_query: "rust",
            cursor: None,
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline(
            vec![tweet_entry("1", "alice", "first 推文")],
            Some("CURSOR-1"),
        )))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(Variables {
            raw_query: "rust",
            cursor: Some("CURSOR-1"),
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline(
            vec![tweet_entry("2", "bob", "second")],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let first = session.search("rust", SearchProduct::Latest).await.unwrap();
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.next_cursor.as_deref(), Some("CURSOR-1"));

    let records = fetch_for_keyword(&session, "rust", 10, SearchProduct::Latest).await;
    assert_eq!(records.len(), 2);
    let first = &records[0];
    assert_eq!(first.post_id, "twitter:1");
    assert_eq!(first.url, "https://x.com/alice/status/1");
    assert_eq!(first.desc, "first 推文");
    assert_eq!(first.published_at.as_deref(), Some("2024-01-02T03:04:05Z"));
    assert_eq!(
        (first.likes, first.comments, first.shares, first.views, first.followers),
        (5, 1, 2, 1000, 42)
    );
    assert_eq!(records[1].author, "bob");
}

#[tokio::test]
async fn rejected_session_yields_no_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"errors":[{"code":32,"message":"Could not authenticate you."}]})),
        )
        .mount(&server)
        .await;

    let session = session(&server).await;
    assert!(session.search("rust", SearchProduct::Top).await.is_err());
    assert!(
        fetch_for_keyword(&session, "rust", 5, SearchProduct::Top)
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn empty_run_searches_the_first_trend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/i/api/2/guide.json"))
        .and(query_param("initial_tab_id", "trending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "timeline": { "instructions": [ { "addEntries": { "entries": [
                { "entryId": "trends", "content": { "timelineModule": { "items": [
                    { "item": { "content": { "trend": { "name": "foo" }}}}
                ]}}}
            ]}}]}
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(Variables {
            raw_query: "foo",
            cursor: None,
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline(
            vec![tweet_entry("7", "carol", "trending post")],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server).await;
    let trends = session.trends("trending").await.unwrap();
    assert_eq!(trends[0].name, "foo");

    let records = collect_posts(&session, &FetchPlan::new(vec![], 20, SearchProduct::Latest)).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].keyword, "foo");
}
