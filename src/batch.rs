//! Composed operations on top of `v4/batch`.
//!
//! Two compositions save round trips by letting the server chain calls:
//!
//! * [`user_best_plan`]: one best score, the song it was set on and that
//!   song's aliases.
//! * [`user_best30_plan`]: the best 30 list and account info, with a
//!   `song/info` lookup for every best 30 entry and every requested recent
//!   score.
//!
//! The server answers a plan with a flat list of [`BatchResult`]s in no
//! particular order. The correlators pick results by id and assemble them:
//!
//! * [`correlate_user_best`] needs all three results and reports the first
//!   failure in the order `0`, `1`, `2`.
//! * [`correlate_user_best30`] needs only ids `0` and `1`. Failed song
//!   lookups leave the affected entries without `songInfo`.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    protocol::{
        song::AliasContent, BatchCall, BatchPlan, BatchResult, CallId, Difficulty, EnrichedScore,
        Envelope, FieldPath, Placeholder, Query, RecentCount, Score, SongInfo, UserBest30,
        UserInfo, UserKey,
    },
};

/// Number of entries in a best 30 list.
pub const BEST30_SIZE: usize = 30;

/// Id of the `user/best` call in a user best plan, and of the
/// `user/best30` call in a best 30 plan.
pub const PRIMARY_ID: CallId = 0;

/// Id of the `user/info` call in a best 30 plan.
pub const USER_INFO_ID: CallId = 1;

const SONG_INFO_ID: CallId = 1;
const SONG_ALIAS_ID: CallId = 2;

/// Placeholder bound to the song of the best score in a user best plan.
const SONG_PLACEHOLDER: &str = "sid";

/// Builds the plan behind [`correlate_user_best`].
///
/// ```text
/// 0: user/best?usercode=..&songname=..&difficulty=..   binds $sid = song_id
/// 1: song/info?songname=$sid
/// 2: song/alias?songid=$sid
/// ```
///
/// `difficulty` defaults to [`Difficulty::Future`].
///
/// # Errors
///
/// Returns `Internal` if the plan comes out malformed.
pub fn user_best_plan(
    user: &UserKey,
    song: &str,
    difficulty: Option<Difficulty>,
) -> Result<BatchPlan> {
    let sid = placeholder(SONG_PLACEHOLDER)?;
    let query = Query::new()
        .with_user(user)
        .with("songname", song)
        .with("difficulty", difficulty.unwrap_or_default().index());

    let plan = BatchPlan::from(vec![
        BatchCall::new(PRIMARY_ID, "user/best", &query)
            .with_binding(sid.clone(), FieldPath::new("song_id")),
        BatchCall::bound(SONG_INFO_ID, "song/info", "songname", &sid),
        BatchCall::bound(SONG_ALIAS_ID, "song/alias", "songid", &sid),
    ]);

    checked(plan)
}

/// Builds the plan behind [`correlate_user_best30`].
///
/// ```text
/// 0:       user/best30                binds $1..$30 = best30_list[i].song_id
/// 1:       user/info[?recent=k]       binds $31..   = recent_score[i].song_id
/// 2..=31:  song/info?songname=$1..$30
/// 32..:    song/info?songname=$31..   (one per recent score)
/// ```
///
/// A `recent` count of zero requests no recent scores and emits no lookups
/// for them.
///
/// # Errors
///
/// Returns `Internal` if the plan comes out malformed.
pub fn user_best30_plan(user: &UserKey, recent: RecentCount) -> Result<BatchPlan> {
    let user_query = Query::new().with_user(user);

    let mut best30 = BatchCall::new(PRIMARY_ID, "user/best30", &user_query).with_empty_bind();
    let mut info = BatchCall::new(
        USER_INFO_ID,
        "user/info",
        &user_query.clone().with_opt("recent", recent.as_param()),
    )
    .with_empty_bind();

    let mut lookups = Vec::with_capacity(BEST30_SIZE + usize::from(recent.get()));
    let mut next_id = USER_INFO_ID + 1;

    for index in 0..BEST30_SIZE {
        let token = placeholder(&(index + 1).to_string())?;
        best30 = best30.with_binding(
            token.clone(),
            FieldPath::new(format!("best30_list[{index}].song_id")),
        );
        lookups.push(BatchCall::bound(next_id, "song/info", "songname", &token));
        next_id += 1;
    }

    for index in 0..usize::from(recent.get()) {
        let token = placeholder(&(BEST30_SIZE + index + 1).to_string())?;
        info = info.with_binding(
            token.clone(),
            FieldPath::new(format!("recent_score[{index}].song_id")),
        );
        lookups.push(BatchCall::bound(next_id, "song/info", "songname", &token));
        next_id += 1;
    }

    let plan = [best30, info].into_iter().chain(lookups).collect();
    checked(plan)
}

/// Assembled result of a user best plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBestBundle {
    pub user_best: Score,
    pub song_info: SongInfo,
    pub song_alias: Vec<String>,
}

/// Assembled result of a best 30 plan, every score enriched with its song.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Best30Aggregate {
    pub user_info: UserInfo<EnrichedScore>,
    pub user_best30: UserBest30<EnrichedScore>,
}

/// Assembles the results of a [`user_best_plan`].
///
/// # Errors
///
/// * `Rejected` with the first failing result, checked in id order
/// * `DataLoss` if a result is missing
/// * a decoding error if a payload has an unexpected shape
pub fn correlate_user_best(results: &[BatchResult]) -> Result<UserBestBundle> {
    let user_best = succeeded(results, PRIMARY_ID)?;
    let song_info = succeeded(results, SONG_INFO_ID)?;
    let song_alias = succeeded(results, SONG_ALIAS_ID)?;

    Ok(UserBestBundle {
        user_best: user_best.decode()?,
        song_info: song_info.decode()?,
        song_alias: song_alias.decode::<AliasContent>()?.into(),
    })
}

/// Assembles the results of a [`user_best30_plan`].
///
/// Every result with an id above [`USER_INFO_ID`] that succeeded and
/// decodes as a [`SongInfo`] joins the lookup pool. The best 30 list, its
/// overflow and the recent scores are each joined against that pool with
/// [`join_song_info`].
///
/// # Errors
///
/// * `Rejected` if the best 30 or the user info call failed, best 30 first
/// * `DataLoss` if either of them is missing
/// * a decoding error if either payload has an unexpected shape
pub fn correlate_user_best30(results: &[BatchResult]) -> Result<Best30Aggregate> {
    let best30 = succeeded(results, PRIMARY_ID)?;
    let info = succeeded(results, USER_INFO_ID)?;

    let user_best30: UserBest30 = best30.decode()?;
    let user_info: UserInfo = info.decode()?;

    let lookups: Vec<&BatchResult> = results
        .iter()
        .filter(|result| result.id > USER_INFO_ID)
        .collect();
    let pool: Vec<SongInfo> = lookups
        .iter()
        .filter(|lookup| lookup.result.is_success())
        .filter_map(|lookup| match lookup.result.decode::<SongInfo>() {
            Ok(song_info) => Some(song_info),
            Err(e) => {
                warn!("batch: skipping song lookup {}: {e}", lookup.id);
                None
            }
        })
        .collect();

    debug!(
        "batch: {} of {} song lookups succeeded",
        pool.len(),
        lookups.len()
    );

    Ok(Best30Aggregate {
        user_info: user_info.map_scores(|score| enrich(score, &pool)),
        user_best30: user_best30.map_scores(|score| enrich(score, &pool)),
    })
}

/// Left outer join of `scores` with `pool` on `song_id == id`.
///
/// Returns a new sequence in the order and of the length of `scores`.
/// Each entry carries the first song in `pool` with a matching id, or no
/// song at all.
#[must_use]
pub fn join_song_info(scores: Vec<Score>, pool: &[SongInfo]) -> Vec<EnrichedScore> {
    scores
        .into_iter()
        .map(|score| enrich(score, pool))
        .collect()
}

fn enrich(score: Score, pool: &[SongInfo]) -> EnrichedScore {
    let song_info = pool.iter().find(|song| song.id == score.song_id).cloned();
    EnrichedScore { score, song_info }
}

/// Finds the result with `id` and checks that it succeeded.
fn succeeded(results: &[BatchResult], id: CallId) -> Result<&Envelope<serde_json::Value>> {
    let envelope = results
        .iter()
        .find(|result| result.id == id)
        .map(|result| &result.result)
        .ok_or_else(|| Error::data_loss(format!("batch result {id} is missing")))?;

    match envelope.failure() {
        Some(failure) => Err(Error::rejected(failure)),
        None => Ok(envelope),
    }
}

fn placeholder(name: &str) -> Result<Placeholder> {
    Placeholder::new(name).map_err(|e| Error::internal(e.error))
}

fn checked(plan: BatchPlan) -> Result<BatchPlan> {
    plan.validate().map_err(Error::internal)?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{error::ErrorKind, protocol::ClearType};

    fn score(song_id: &str) -> Score {
        serde_json::from_value(json!({
            "song_id": song_id,
            "difficulty": 2,
            "score": 9_800_000,
            "shiny_perfect_count": 900,
            "perfect_count": 1000,
            "near_count": 5,
            "miss_count": 1,
            "clear_type": 1,
            "health": 100,
            "time_played": 1_614_950_400_000_u64,
            "modifier": 0,
            "rating": 11.0
        }))
        .unwrap()
    }

    fn song(id: &str, artist: &str) -> SongInfo {
        SongInfo {
            id: id.to_owned(),
            artist: artist.to_owned(),
            ..SongInfo::default()
        }
    }

    fn ok(id: CallId, content: serde_json::Value) -> BatchResult {
        BatchResult {
            id,
            result: Envelope {
                status: 0,
                content: Some(content),
                message: None,
            },
        }
    }

    fn failed(id: CallId, status: i64, message: &str) -> BatchResult {
        BatchResult {
            id,
            result: Envelope {
                status,
                content: None,
                message: Some(message.to_owned()),
            },
        }
    }

    fn best30_content(song_ids: &[&str]) -> serde_json::Value {
        json!({
            "best30_avg": 12.0,
            "recent10_avg": 11.5,
            "best30_list": song_ids.iter().map(|id| score(id)).collect::<Vec<_>>(),
        })
    }

    fn user_info_content(recent: &[&str]) -> serde_json::Value {
        json!({
            "user_id": 1,
            "name": "Toaster",
            "recent_score": recent.iter().map(|id| score(id)).collect::<Vec<_>>(),
            "character": 5,
            "join_date": 1_487_816_563_340_u64,
            "rating": 1250,
        })
    }

    fn song_content(id: &str) -> serde_json::Value {
        serde_json::to_value(song(id, &format!("artist of {id}"))).unwrap()
    }

    // ── builders ──

    #[test]
    fn user_best_plan_matches_wire_scenario() {
        let plan = user_best_plan(
            &UserKey::new("abc123", false),
            "grievous lady",
            Some(Difficulty::Future),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&plan).unwrap(),
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
    }

    #[test]
    fn user_best_plan_defaults_to_future() {
        let plan = user_best_plan(&UserKey::new("Toaster", true), "gl", None).unwrap();
        assert_eq!(
            plan.calls()[0].endpoint,
            "user/best?user=Toaster&songname=gl&difficulty=2"
        );
    }

    #[test]
    fn best30_plan_has_one_lookup_per_score() {
        for k in 0..=RecentCount::MAX {
            let plan = user_best30_plan(&UserKey::new("1", false), RecentCount::from(k)).unwrap();
            let k = usize::from(k);

            assert_eq!(plan.len(), 2 + BEST30_SIZE + k);

            let ids: Vec<CallId> = plan.calls().iter().map(|call| call.id).collect();
            let expected: Vec<CallId> = (0..).take(2 + BEST30_SIZE + k).collect();
            assert_eq!(ids, expected);
            assert!(plan.validate().is_ok());
        }
    }

    #[test]
    fn best30_plan_ignores_out_of_range_recent() {
        for raw in [-1, 8, 100] {
            let plan = user_best30_plan(&UserKey::new("1", false), RecentCount::new(raw)).unwrap();
            assert_eq!(plan.len(), 2 + BEST30_SIZE);
            assert_eq!(plan.calls()[1].endpoint, "user/info?usercode=1");
            assert_eq!(plan.calls()[1].declared().count(), 0);
        }
    }

    #[test]
    fn best30_plan_binds_and_references() {
        let plan = user_best30_plan(&UserKey::new("1", false), RecentCount::new(2)).unwrap();
        let calls = plan.calls();

        assert_eq!(calls[0].endpoint, "user/best30?usercode=1");
        assert_eq!(calls[0].declared().count(), BEST30_SIZE);
        assert_eq!(
            calls[0].bind.as_ref().unwrap()[29].1,
            FieldPath::new("best30_list[29].song_id")
        );

        assert_eq!(calls[1].endpoint, "user/info?usercode=1&recent=2");
        let recent_bind = calls[1].bind.as_ref().unwrap();
        assert_eq!(recent_bind[0].0.to_string(), "$31");
        assert_eq!(recent_bind[1].1, FieldPath::new("recent_score[1].song_id"));

        assert_eq!(calls[2].endpoint, "song/info?songname=$1");
        assert_eq!(calls[31].endpoint, "song/info?songname=$30");
        assert_eq!(calls[32].endpoint, "song/info?songname=$31");
        assert_eq!(calls[33].id, 33);
    }

    #[test]
    fn best30_plan_sends_empty_binds() {
        let plan = user_best30_plan(&UserKey::new("1", false), RecentCount::default()).unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json[1]["bind"], json!({}));
    }

    // ── user best correlation ──

    #[test]
    fn user_best_assembles_all_three() {
        let results = vec![
            ok(2, json!({ "alias": ["gl"] })),
            ok(0, serde_json::to_value(score("grievouslady")).unwrap()),
            ok(1, song_content("grievouslady")),
        ];

        let bundle = correlate_user_best(&results).unwrap();
        assert_eq!(bundle.user_best.song_id, "grievouslady");
        assert_eq!(bundle.song_info.id, "grievouslady");
        assert_eq!(bundle.song_alias, vec!["gl".to_owned()]);
    }

    #[test]
    fn user_best_reports_first_failure_in_id_order() {
        let results = vec![
            failed(2, -7, "alias failed"),
            failed(1, -6, "info failed"),
            failed(0, -3, "user_not_found"),
        ];

        let error = correlate_user_best(&results).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Rejected);
        assert_eq!(error.failure().unwrap().to_string(), "user_not_found");

        let results = vec![
            failed(2, -7, "alias failed"),
            ok(0, serde_json::to_value(score("a")).unwrap()),
            failed(1, -6, "info failed"),
        ];
        let error = correlate_user_best(&results).unwrap_err();
        assert_eq!(error.failure().unwrap().to_string(), "info failed");
    }

    #[test]
    fn missing_result_is_data_loss() {
        let results = vec![ok(0, serde_json::to_value(score("a")).unwrap())];
        let error = correlate_user_best(&results).unwrap_err();
        assert_eq!(error.kind, ErrorKind::DataLoss);
    }

    // ── best 30 correlation ──

    #[test]
    fn best30_enriches_matching_scores() {
        let results = vec![
            ok(3, song_content("b")),
            ok(0, best30_content(&["a", "b"])),
            ok(32, song_content("r")),
            ok(1, user_info_content(&["r"])),
            ok(2, song_content("a")),
        ];

        let aggregate = correlate_user_best30(&results).unwrap();
        let list = &aggregate.user_best30.best30_list;
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].song_id, "a");
        assert_eq!(list[0].song_info.as_ref().unwrap().artist, "artist of a");
        assert_eq!(list[1].song_info.as_ref().unwrap().id, "b");

        let recent = aggregate.user_info.recent_score.unwrap();
        assert_eq!(recent[0].song_info.as_ref().unwrap().id, "r");
    }

    #[test]
    fn best30_tolerates_failed_lookups() {
        let results = vec![
            ok(0, best30_content(&["a", "b"])),
            ok(1, user_info_content(&[])),
            ok(2, song_content("a")),
            failed(3, -5, "song not found"),
            ok(4, json!("not a song")),
        ];

        let aggregate = correlate_user_best30(&results).unwrap();
        let list = &aggregate.user_best30.best30_list;
        assert!(list[0].song_info.is_some());
        assert!(list[1].song_info.is_none());
    }

    #[test]
    fn best30_attaches_songs_with_sparse_charts() {
        let sparse = json!({
            "id": "a",
            "difficulties": [
                { "ratingClass": 2, "chartDesigner": "n", "rating": 9, "totalNotes": 1000 }
            ]
        });
        let results = vec![
            ok(0, best30_content(&["a"])),
            ok(1, user_info_content(&[])),
            ok(2, sparse),
        ];

        let aggregate = correlate_user_best30(&results).unwrap();
        let info = aggregate.user_best30.best30_list[0]
            .song_info
            .as_ref()
            .unwrap();
        assert_eq!(info.id, "a");
        assert_eq!(info.difficulties[0].jacket_designer, "");
        assert_eq!(info.difficulties[0].total_notes, 1000);
    }

    #[test]
    fn best30_keeps_scores_with_unknown_clear_type() {
        let mut odd = serde_json::to_value(score("b")).unwrap();
        odd["clear_type"] = json!(6);
        let best30 = json!({
            "best30_avg": 12.0,
            "recent10_avg": 11.5,
            "best30_list": [score("a"), odd],
        });
        let results = vec![ok(0, best30), ok(1, user_info_content(&[]))];

        let aggregate = correlate_user_best30(&results).unwrap();
        let list = &aggregate.user_best30.best30_list;
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].clear_type, ClearType::Unknown(6));
    }

    #[test]
    fn best30_failure_wins_over_everything_else() {
        let results = vec![
            failed(1, -4, "info failed"),
            failed(0, -3, "user_not_found"),
            failed(2, -5, "song not found"),
        ];

        let error = correlate_user_best30(&results).unwrap_err();
        assert_eq!(error.failure().unwrap().to_string(), "user_not_found");
    }

    #[test]
    fn best30_primary_results_are_required() {
        let results = vec![ok(0, best30_content(&[]))];
        let error = correlate_user_best30(&results).unwrap_err();
        assert_eq!(error.kind, ErrorKind::DataLoss);
    }

    // ── join ──

    #[test]
    fn join_attaches_exact_match_only() {
        let pool = vec![song("x", "first"), song("y", "other"), song("x", "second")];
        let joined = join_song_info(vec![score("x"), score("z"), score("y")], &pool);

        assert_eq!(joined.len(), 3);
        assert_eq!(joined[0].song_info, Some(song("x", "first")));
        assert_eq!(joined[1].song_info, None);
        assert_eq!(joined[2].song_info, Some(song("y", "other")));
        assert_eq!(
            joined.iter().map(|e| e.song_id.as_str()).collect::<Vec<_>>(),
            vec!["x", "z", "y"]
        );
    }

    #[test]
    fn enriched_score_serializes_song_info_inline() {
        let joined = join_song_info(vec![score("x")], &[song("x", "artist")]);
        let json = serde_json::to_value(&joined[0]).unwrap();

        assert_eq!(json["song_id"], "x");
        assert_eq!(json["songInfo"]["artist"], "artist");
    }
}
