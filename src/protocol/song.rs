//! Song metadata.
//!
//! # Wire Format
//!
//! ```json
//! {
//!     "id": "grievouslady",
//!     "title_localized": { "en": "Grievous Lady" },
//!     "artist": "Team Grimoire vs Laur",
//!     "bpm": "210",
//!     "bpm_base": 210,
//!     "set": "yugamu",
//!     "audioTimeSec": 143,
//!     "side": 1,
//!     "remote_dl": true,
//!     "world_unlock": false,
//!     "date": 1551312001,
//!     "difficulties": [
//!         {
//!             "ratingClass": 2,
//!             "chartDesigner": "Nitro",
//!             "jacketDesigner": "",
//!             "rating": 11,
//!             "ratingReal": 11.3,
//!             "totalNotes": 1450
//!         }
//!     ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::Difficulty;

/// Titles of a song in the languages it was published in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalizedTitle {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ja: Option<String>,
    #[serde(rename = "zh-Hans")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zh_hans: Option<String>,
    #[serde(rename = "zh-Hant")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zh_hant: Option<String>,
}

/// Metadata of one song across its difficulty tiers.
///
/// Joined onto a [`Score`](super::Score) where `id` equals `song_id`.
/// Fields missing on the wire are left at their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongInfo {
    pub id: String,
    pub title_localized: LocalizedTitle,
    pub artist: String,
    pub bpm: String,
    pub bpm_base: f64,
    pub set: String,
    #[serde(rename = "audioTimeSec")]
    pub audio_time_sec: u32,
    /// `0` for the light side, `1` for the conflict side.
    pub side: u8,
    pub remote_dl: bool,
    pub world_unlock: bool,
    /// Release date in seconds since the epoch.
    #[serde(alias = "data")]
    pub date: u64,
    pub difficulties: Vec<DifficultyClass>,
}

impl SongInfo {
    /// The chart of the given tier, if the song has one.
    #[must_use]
    pub fn chart(&self, difficulty: Difficulty) -> Option<&DifficultyClass> {
        self.difficulties
            .iter()
            .find(|chart| chart.rating_class == difficulty)
    }
}

/// One chart of a song.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DifficultyClass {
    pub rating_class: Difficulty,
    pub chart_designer: String,
    pub jacket_designer: String,
    #[serde(rename = "jacket_night")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jacket_night: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jacket_override: Option<bool>,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_plus: Option<bool>,
    pub rating_real: f64,
    pub total_notes: u32,
}

/// Known aliases of a song.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SongAlias {
    pub alias: Vec<String>,
}

/// Song id an alias resolves to, as returned by v3.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SongId {
    pub id: String,
}

/// Alias payload as either `{"alias": [...]}` or a bare list.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum AliasContent {
    Wrapped(SongAlias),
    Bare(Vec<String>),
}

impl From<AliasContent> for Vec<String> {
    fn from(content: AliasContent) -> Self {
        match content {
            AliasContent::Wrapped(SongAlias { alias }) | AliasContent::Bare(alias) => alias,
        }
    }
}

/// A song rolled from a rating range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomSong {
    pub id: String,
    #[serde(default, alias = "ratingClass")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_class: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, alias = "songinfo")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_info: Option<SongInfo>,
}

/// One chart within a rating range.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatingInfo {
    pub sid: String,
    pub rating: u32,
    pub rating_class: Difficulty,
    /// Level encoded as `2 × level + plus`, see [`crate::format`].
    pub difficulty: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rating {
    pub rating: Vec<RatingInfo>,
}
