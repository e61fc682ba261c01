// In-process stand-in for the BotArcApi, served on an ephemeral port.

#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use botarc::config::Config;
use serde_json::{json, Value};

/// Serves `router` on 127.0.0.1 and returns a configuration pointing at it.
pub async fn serve(router: Router) -> Config {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Config::parse(&format!("http://{addr}/"))
        .unwrap()
        .with_timeout(Duration::from_secs(5))
}

pub fn success(content: Value) -> Value {
    json!({ "status": 0, "content": content })
}

pub fn failure(status: i64, message: &str) -> Value {
    json!({ "status": status, "message": message })
}

pub fn score(song_id: &str) -> Value {
    json!({
        "song_id": song_id,
        "difficulty": 2,
        "score": 9_876_543,
        "shiny_perfect_count": 1024,
        "perfect_count": 1400,
        "near_count": 12,
        "miss_count": 3,
        "clear_type": 1,
        "best_clear_type": 5,
        "health": 100,
        "time_played": 1_614_950_400_000_u64,
        "modifier": 0,
        "rating": 11.54
    })
}

pub fn song_info(id: &str) -> Value {
    json!({
        "id": id,
        "title_localized": { "en": id.to_uppercase() },
        "artist": format!("artist of {id}"),
        "bpm": "200",
        "bpm_base": 200,
        "set": "base",
        "audioTimeSec": 120,
        "side": 0,
        "remote_dl": false,
        "world_unlock": false,
        "date": 1_551_312_001,
        "difficulties": []
    })
}

pub fn user_info(recent: &[&str]) -> Value {
    json!({
        "user_id": 1,
        "name": "Toaster",
        "recent_score": recent.iter().map(|id| score(id)).collect::<Vec<_>>(),
        "character": 5,
        "join_date": 1_487_816_563_340_u64,
        "rating": 1250,
        "is_skill_sealed": false,
        "is_char_uncapped": true,
        "is_char_uncapped_override": false,
        "is_mutual": false
    })
}

pub fn best30(song_ids: &[&str]) -> Value {
    json!({
        "best30_avg": 12.01,
        "recent10_avg": 11.87,
        "best30_list": song_ids.iter().map(|id| score(id)).collect::<Vec<_>>()
    })
}
