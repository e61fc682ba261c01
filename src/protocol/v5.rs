//! Shapes specific to API v5.
//!
//! v5 wraps account data in `account_info` and, when asked with
//! `withsonginfo=true`, returns per-chart metadata next to the scores it
//! describes. Those `*songinfo` lists are aligned with their score lists by
//! position rather than keyed by song id.
//!
//! # Example Response
//!
//! `user/best30?usercode=000000001&withsonginfo=true`:
//! ```json
//! {
//!     "best30_avg": 12.01,
//!     "recent10_avg": 11.87,
//!     "account_info": { "code": "000000001", "name": "Toaster", ... },
//!     "best30_list": [ { "song_id": "grievouslady", ... } ],
//!     "best30_overflow": [ ... ],
//!     "best30_songinfo": [ { "name_en": "Grievous Lady", "difficulty": 22, ... } ],
//!     "best30_overflow_songinfo": [ ... ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::{EnrichedScore, Score, UserBest30};

/// Account of a player as reported by v5.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountInfo {
    pub code: String,
    pub name: String,
    pub user_id: u64,
    #[serde(default)]
    pub is_mutual: bool,
    #[serde(default)]
    pub is_char_uncapped_override: bool,
    #[serde(default)]
    pub is_char_uncapped: bool,
    #[serde(default)]
    pub is_skill_sealed: bool,
    /// Potential times 100, or `-1` when hidden.
    pub rating: i32,
    pub join_date: u64,
    pub character: u32,
}

/// Metadata of a single chart.
///
/// Fields missing on the wire are left at their defaults; the server omits
/// several of them for older songs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartInfo {
    pub name_en: String,
    pub name_jp: String,
    pub artist: String,
    pub bpm: String,
    pub bpm_base: f64,
    pub set: String,
    pub set_friendly: String,
    /// Length in seconds.
    pub time: u32,
    pub side: u8,
    pub world_unlock: bool,
    pub remote_download: bool,
    pub bg: String,
    pub date: u64,
    pub version: String,
    /// Level encoded as `2 × level + plus`.
    pub difficulty: u8,
    /// Chart constant times 10.
    pub rating: u32,
    pub note: u32,
    pub chart_designer: String,
    pub jacket_designer: String,
    pub jacket_override: bool,
    pub audio_override: bool,
}

/// Content of v5 `song/info`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SongInfoV5 {
    pub song_id: String,
    #[serde(default)]
    pub difficulties: Vec<ChartInfo>,
}

/// Content of v5 `user/info`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserInfoV5 {
    pub account_info: AccountInfo,
    #[serde(default)]
    pub recent_score: Vec<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub songinfo: Option<Vec<ChartInfo>>,
}

impl UserInfoV5 {
    /// Attaches `songinfo` to the recent scores by position.
    #[must_use]
    pub fn into_enriched(self) -> (AccountInfo, Vec<EnrichedScore<ChartInfo>>) {
        let recent = zip_charts(self.recent_score, self.songinfo.unwrap_or_default());
        (self.account_info, recent)
    }
}

/// Content of v5 `user/best`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserBestV5 {
    pub account_info: AccountInfo,
    pub record: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub songinfo: Option<Vec<ChartInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_score: Option<Score>,
}

/// Content of v5 `user/best30`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Best30V5 {
    pub best30_avg: f64,
    pub recent10_avg: f64,
    pub account_info: AccountInfo,
    pub best30_list: Vec<Score>,
    #[serde(default)]
    pub best30_overflow: Vec<Score>,
    #[serde(default)]
    pub best30_songinfo: Vec<ChartInfo>,
    #[serde(default)]
    pub best30_overflow_songinfo: Vec<ChartInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_score: Option<Score>,
}

/// A v5 best 30 with chart metadata attached to every entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Best30AggregateV5 {
    pub account_info: AccountInfo,
    #[serde(flatten)]
    pub best30: UserBest30<EnrichedScore<ChartInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_score: Option<Score>,
}

impl Best30V5 {
    /// Joins `best30_songinfo` onto `best30_list` and
    /// `best30_overflow_songinfo` onto `best30_overflow`, by position.
    ///
    /// Entries beyond the end of their metadata list are left without
    /// `songInfo`.
    #[must_use]
    pub fn into_aggregate(self) -> Best30AggregateV5 {
        Best30AggregateV5 {
            account_info: self.account_info,
            best30: UserBest30 {
                best30_avg: self.best30_avg,
                recent10_avg: self.recent10_avg,
                best30_list: zip_charts(self.best30_list, self.best30_songinfo),
                best30_overflow: zip_charts(self.best30_overflow, self.best30_overflow_songinfo),
            },
            recent_score: self.recent_score,
        }
    }
}

fn zip_charts(scores: Vec<Score>, charts: Vec<ChartInfo>) -> Vec<EnrichedScore<ChartInfo>> {
    let mut charts = charts.into_iter();
    scores
        .into_iter()
        .map(|score| EnrichedScore {
            score,
            song_info: charts.next(),
        })
        .collect()
}
