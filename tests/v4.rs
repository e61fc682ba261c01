// Integration tests for the v4 client: single endpoint calls, envelope
// handling, forwarding, and the batch compositions against a fake server.

mod common;

use std::{collections::HashMap, time::Duration};

use axum::{
    extract::Query,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use botarc::{
    error::ErrorKind,
    protocol::{Difficulty, RecentCount, UserKey},
    v4,
};

use common::{best30, failure, score, serve, song_info, success, user_info};

type Params = Query<HashMap<String, String>>;

// ── single endpoints ──

#[tokio::test]
async fn user_info_sends_params_and_unwraps_content() {
    let router = Router::new().route(
        "/v4/user/info",
        get(|Query(params): Params| async move {
            assert_eq!(params.get("user").map(String::as_str), Some("Toaster"));
            assert_eq!(params.get("recent").map(String::as_str), Some("3"));
            assert!(!params.contains_key("usercode"));
            Json(success(user_info(&["a", "b", "c"])))
        }),
    );
    let client = v4::Client::new(&serve(router).await).unwrap();

    let info = client
        .user()
        .info(&UserKey::new("Toaster", true), RecentCount::new(3))
        .await
        .unwrap();

    assert_eq!(info.name, "Toaster");
    assert_eq!(info.recent_score.map(|scores| scores.len()), Some(3));
}

#[tokio::test]
async fn failure_envelope_rejects_with_message() {
    let router = Router::new().route(
        "/v4/user/best",
        get(|| async { Json(failure(-3, "user_not_found")) }),
    );
    let client = v4::Client::new(&serve(router).await).unwrap();

    let error = client
        .user()
        .best(&UserKey::new("000000001", false), "gl", Some(Difficulty::Beyond))
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Rejected);
    assert_eq!(error.failure().unwrap().to_string(), "user_not_found");
}

#[tokio::test]
async fn song_endpoints_use_post() {
    let router = Router::new()
        .route(
            "/v4/song/info",
            post(|Query(params): Params| async move {
                Json(success(song_info(&params["songname"])))
            }),
        )
        .route(
            "/v4/song/alias",
            post(|Query(params): Params| async move {
                assert_eq!(params["songid"], "grievouslady");
                Json(success(json!({ "alias": ["gl", "grievous"] })))
            }),
        )
        .route(
            "/v4/song/rating",
            post(|Query(params): Params| async move {
                assert_eq!(params["start"], "10.5");
                assert!(!params.contains_key("end"));
                Json(success(json!({
                    "rating": [{ "sid": "grievouslady", "rating": 113, "rating_class": 2, "difficulty": 22 }]
                })))
            }),
        );
    let client = v4::Client::new(&serve(router).await).unwrap();

    let info = client.song().info("grievous lady").await.unwrap();
    assert_eq!(info.id, "grievous lady");

    let alias = client.song().alias("grievouslady").await.unwrap();
    assert_eq!(alias.alias, vec!["gl".to_owned(), "grievous".to_owned()]);

    let rating = client.song().rating(10.5, None).await.unwrap();
    assert_eq!(rating.rating[0].rating_class, Difficulty::Future);
}

#[tokio::test]
async fn non_envelope_error_is_unavailable() {
    let router = Router::new().route(
        "/v4/update",
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let client = v4::Client::new(&serve(router).await).unwrap();

    let error = client.update().await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::Unavailable);
}

#[tokio::test]
async fn slow_server_exceeds_deadline() {
    let router = Router::new().route(
        "/v4/connect",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(success(json!({ "key": "late" })))
        }),
    );
    let config = serve(router)
        .await
        .with_timeout(Duration::from_millis(100));
    let client = v4::Client::new(&config).unwrap();

    let error = client.connect().await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::DeadlineExceeded);
}

// ── forwarding ──

#[tokio::test]
async fn forward_passes_bearer_token() {
    let router = Router::new()
        .route(
            "/v4/forward/alloc",
            get(|Query(params): Params| async move {
                assert_eq!(params["time"], "600");
                Json(success(json!({ "access_token": "tok", "valid_time": 600 })))
            }),
        )
        .route(
            "/v4/forward/forward/user/me",
            post(|headers: HeaderMap| async move {
                let authorization = headers
                    .get(AUTHORIZATION)
                    .and_then(|value| value.to_str().ok());
                if authorization == Some("Bearer tok") {
                    Json(success(json!({ "name": "Toaster" })))
                } else {
                    Json(failure(-1, "unauthorized"))
                }
            }),
        )
        .route("/v4/forward/recycle", get(|| async { Json(json!({ "status": 0 })) }));
    let client = v4::Client::new(&serve(router).await).unwrap();
    let forward = client.forward();

    let token = forward.alloc(Some(600), None).await.unwrap();
    assert_eq!(token.valid_time, Duration::from_secs(600));

    let me = forward
        .forward(
            &token,
            reqwest::Method::POST,
            "/user/me",
            botarc::protocol::Query::new(),
        )
        .await
        .unwrap();
    assert_eq!(me["name"], "Toaster");

    forward.recycle(&token).await.unwrap();
}

// ── batch ──

fn calls(params: &HashMap<String, String>) -> Vec<Value> {
    serde_json::from_str(&params["calls"]).unwrap()
}

#[tokio::test]
async fn batch_returns_raw_results() {
    let router = Router::new().route(
        "/v4/batch",
        post(|Query(params): Params| async move {
            let ids: Vec<Value> = calls(&params).iter().map(|call| call["id"].clone()).collect();
            let results: Vec<Value> = ids
                .into_iter()
                .rev()
                .map(|id| json!({ "id": id, "result": failure(-5, "nothing here") }))
                .collect();
            Json(success(Value::Array(results)))
        }),
    );
    let client = v4::Client::new(&serve(router).await).unwrap();

    let results = client
        .batch_str(r#"[{"id": 7, "endpoint": "song/info?songname=x"}, {"id": 9, "endpoint": "update"}]"#)
        .await
        .unwrap();

    assert_eq!(results.iter().map(|r| r.id).collect::<Vec<_>>(), vec![9, 7]);
    assert!(results.iter().all(|r| !r.result.is_success()));
}

#[tokio::test]
async fn batch_str_rejects_malformed_plans() {
    let client = v4::Client::new(&serve(Router::new()).await).unwrap();

    let error = client.batch_str("not a plan").await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn batch_outer_failure_rejects() {
    let router = Router::new().route(
        "/v4/batch",
        post(|| async { Json(failure(-233, "batch disabled")) }),
    );
    let client = v4::Client::new(&serve(router).await).unwrap();

    let error = client
        .util()
        .user_best(&UserKey::new("000000001", false), "gl", None)
        .await
        .unwrap_err();
    assert_eq!(error.failure().unwrap().to_string(), "batch disabled");
}

#[tokio::test]
async fn util_user_best_sends_plan_and_assembles() {
    let router = Router::new().route(
        "/v4/batch",
        post(|Query(params): Params| async move {
            let calls = calls(&params);
            assert_eq!(
                Value::Array(calls),
                json!([
                    {
                        "id": 0,
                        "bind": { "$sid": "song_id" },
                        "endpoint": "user/best?usercode=abc123&songname=grievous%20lady&difficulty=2"
                    },
                    { "id": 1, "endpoint": "song/info?songname=$sid" },
                    { "id": 2, "endpoint": "song/alias?songid=$sid" }
                ])
            );

            Json(success(json!([
                { "id": 2, "result": success(json!({ "alias": ["gl"] })) },
                { "id": 1, "result": success(song_info("grievouslady")) },
                { "id": 0, "result": success(score("grievouslady")) }
            ])))
        }),
    );
    let client = v4::Client::new(&serve(router).await).unwrap();

    let bundle = client
        .util()
        .user_best(
            &UserKey::new("abc123", false),
            "grievous lady",
            Some(Difficulty::Future),
        )
        .await
        .unwrap();

    assert_eq!(bundle.user_best.score, 9_876_543);
    assert_eq!(bundle.song_info.artist, "artist of grievouslady");
    assert_eq!(bundle.song_alias, vec!["gl".to_owned()]);
}

/// Answers a best 30 plan the way the server would for a user whose best
/// 30 holds `a`, `b` and `c` and whose most recent play is `r`. The lookup
/// for `b` fails, as do lookups for best 30 slots that are empty.
fn best30_results(calls: &[Value]) -> Vec<Value> {
    let best = ["a", "b", "c"];
    let recent = ["r"];

    calls
        .iter()
        .map(|call| {
            let id = call["id"].as_u64().unwrap();
            let endpoint = call["endpoint"].as_str().unwrap();

            let result = match id {
                0 => success(best30(&best)),
                1 => success(user_info(&recent)),
                _ => {
                    let slot: usize = endpoint
                        .rsplit('$')
                        .next()
                        .and_then(|n| n.parse().ok())
                        .unwrap();
                    let song = if slot <= 30 {
                        best.get(slot - 1)
                    } else {
                        recent.get(slot - 31)
                    };
                    match song {
                        Some(&"b") | None => failure(-5, "song not found"),
                        Some(id) => success(song_info(id)),
                    }
                }
            };

            json!({ "id": id, "result": result })
        })
        .rev()
        .collect()
}

#[tokio::test]
async fn util_user_best30_enriches_what_it_can() {
    let router = Router::new().route(
        "/v4/batch",
        post(|Query(params): Params| async move {
            let calls = calls(&params);
            assert_eq!(calls.len(), 2 + 30 + 1);
            assert_eq!(calls[1]["endpoint"], "user/info?usercode=000000001&recent=1");
            Json(success(Value::Array(best30_results(&calls))))
        }),
    );
    let client = v4::Client::new(&serve(router).await).unwrap();

    let aggregate = client
        .util()
        .user_best30(&UserKey::new("000000001", false), RecentCount::new(1))
        .await
        .unwrap();

    let list = &aggregate.user_best30.best30_list;
    assert_eq!(list.len(), 3);
    assert_eq!(list[0].song_info.as_ref().unwrap().id, "a");
    assert!(list[1].song_info.is_none());
    assert_eq!(list[2].song_info.as_ref().unwrap().id, "c");

    let recent = aggregate.user_info.recent_score.unwrap();
    assert_eq!(recent[0].song_info.as_ref().unwrap().id, "r");
}

#[tokio::test]
async fn util_user_best30_fails_on_primary_failure() {
    let router = Router::new().route(
        "/v4/batch",
        post(|Query(params): Params| async move {
            let results: Vec<Value> = calls(&params)
                .iter()
                .map(|call| json!({ "id": call["id"], "result": failure(-3, "user_not_found") }))
                .collect();
            Json(success(Value::Array(results)))
        }),
    );
    let client = v4::Client::new(&serve(router).await).unwrap();

    let error = client
        .util()
        .user_best30(&UserKey::new("nobody", true), RecentCount::new(99))
        .await
        .unwrap_err();
    assert_eq!(error.kind, ErrorKind::Rejected);
    assert_eq!(error.failure().unwrap().status, -3);
}
