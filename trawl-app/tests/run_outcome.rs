use serde_json::{Value, json};
use serial_test::serial;
use trawl_app::{Outcome, execute};
use trawl_config::{AUTH_TOKEN_VARS, CT0_VARS, Credentials, TwitterSettings};
use trawl_social::twitter::{FetchPlan, SearchProduct};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tweet(id: &str, handle: &str) -> Value {
    json!({
        "entryId": format!("tweet-{id}"),
        "content": { "itemContent": { "tweet_results": { "result": {
            "rest_id": id,
            "core": { "user_results": { "result": { "legacy": { "screen_name": handle } } } },
            "legacy": { "full_text": format!("post {id} ✓"), "favorite_count": 3 }
        }}}}
    })
}

fn timeline(entries: Vec<Value>) -> Value {
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

#[test]
#[serial]
fn unset_cookies_print_an_error_without_searching() {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(timeline(vec![])))
            .expect(0)
            .mount(&server),
    );

    let unset: Vec<&str> = AUTH_TOKEN_VARS.iter().chain(CT0_VARS.iter()).copied().collect();
    let outcome = temp_env::with_vars_unset(unset, || {
        rt.block_on(execute(
            FetchPlan::new(vec!["rust".into()], 5, SearchProduct::Latest),
            settings(&server),
            Credentials::from_env(),
        ))
    });

    assert_eq!(outcome.exit_code(), 0);
    let parsed: Value = serde_json::from_str(&outcome.render()).unwrap();
    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 1);
    let object = items[0].as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert!(object["detail"].as_str().unwrap().contains("TWITTER_AUTH_TOKEN"));
    rt.block_on(server.verify());
}

#[tokio::test]
async fn duplicate_posts_across_keywords_are_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"/SearchTimeline$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(timeline(vec![tweet("1", "alice"), tweet("2", "bob")])),
        )
        .expect(2)
        .mount(&server)
        .await;

    let outcome = execute(
        FetchPlan::new(vec!["a".into(), "b".into()], 5, SearchProduct::Top),
        settings(&server),
        Ok(Credentials::new("tok", "csrf")),
    )
    .await;

    let Outcome::Records(records) = &outcome else {
        panic!("expected records, got {outcome:?}");
    };
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.keyword == "a"));

    let line = outcome.render();
    assert!(line.contains("post 1 ✓"));
    let parsed: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(parsed[0].as_object().unwrap().len(), 14);
    assert_eq!(parsed[0]["url"], "https://x.com/alice/status/1");
}

#[tokio::test]
async fn nothing_found_and_no_trends_prints_an_empty_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"/SearchTimeline$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline(vec![])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/i/api/2/guide.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = execute(
        FetchPlan::new(vec!["nothing".into()], 5, SearchProduct::Latest),
        settings(&server),
        Ok(Credentials::new("tok", "csrf")),
    )
    .await;

    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.render(), "[]");
}
