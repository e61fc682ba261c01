//! Play records.
//!
//! # Wire Format
//!
//! ```json
//! {
//!     "song_id": "grievouslady",
//!     "difficulty": 2,
//!     "score": 9876543,
//!     "shiny_perfect_count": 1024,
//!     "perfect_count": 1400,
//!     "near_count": 12,
//!     "miss_count": 3,
//!     "clear_type": 1,
//!     "best_clear_type": 5,
//!     "health": 100,
//!     "time_played": 1614950400000,
//!     "modifier": 0,
//!     "rating": 11.54
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::SongInfo;

/// Difficulty tier of a chart.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Hash,
    Serialize_repr,
    Deserialize_repr,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
)]
#[repr(u8)]
pub enum Difficulty {
    Past = 0,
    Present = 1,
    /// Tier queried when none is given.
    #[default]
    Future = 2,
    Beyond = 3,
}

impl Difficulty {
    /// Maps a raw tier index, falling back to [`Difficulty::Future`] for
    /// anything outside `0..=3`.
    #[must_use]
    pub fn from_raw(index: i64) -> Self {
        match index {
            0 => Self::Past,
            1 => Self::Present,
            3 => Self::Beyond,
            _ => Self::Future,
        }
    }

    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Short name as shown in game.
    #[must_use]
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::Past => "PST",
            Self::Present => "PRS",
            Self::Future => "FTR",
            Self::Beyond => "BYD",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// How a play ended.
///
/// Values this client does not know are kept as [`ClearType::Unknown`] so
/// that one unexpected record does not fail a whole list.
#[derive(
    Copy, Clone, Debug, Default, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
#[serde(from = "u8", into = "u8")]
pub enum ClearType {
    #[default]
    Fail,
    Normal,
    FullRecall,
    PureMemory,
    Easy,
    Hard,
    Unknown(u8),
}

impl From<u8> for ClearType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Fail,
            1 => Self::Normal,
            2 => Self::FullRecall,
            3 => Self::PureMemory,
            4 => Self::Easy,
            5 => Self::Hard,
            other => Self::Unknown(other),
        }
    }
}

impl From<ClearType> for u8 {
    fn from(clear_type: ClearType) -> Self {
        match clear_type {
            ClearType::Fail => 0,
            ClearType::Normal => 1,
            ClearType::FullRecall => 2,
            ClearType::PureMemory => 3,
            ClearType::Easy => 4,
            ClearType::Hard => 5,
            ClearType::Unknown(value) => value,
        }
    }
}

impl fmt::Display for ClearType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fail => "Track Lost",
            Self::Normal => "Normal Clear",
            Self::FullRecall => "Full Recall",
            Self::PureMemory => "Pure Memory",
            Self::Easy => "Easy Clear",
            Self::Hard => "Hard Clear",
            Self::Unknown(value) => return write!(f, "Clear type {value}"),
        };
        write!(f, "{name}")
    }
}

/// Letter grade of a score.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grade {
    ExPlus,
    Ex,
    AA,
    A,
    B,
    C,
    D,
}

impl Grade {
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        match score {
            9_900_000.. => Self::ExPlus,
            9_800_000.. => Self::Ex,
            9_500_000.. => Self::AA,
            9_200_000.. => Self::A,
            8_900_000.. => Self::B,
            8_600_000.. => Self::C,
            _ => Self::D,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ExPlus => "EX+",
            Self::Ex => "EX",
            Self::AA => "AA",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        };
        write!(f, "{name}")
    }
}

/// One play record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub song_id: String,
    pub difficulty: Difficulty,
    pub score: u32,
    pub shiny_perfect_count: u32,
    pub perfect_count: u32,
    pub near_count: u32,
    pub miss_count: u32,
    pub clear_type: ClearType,
    #[serde(default)]
    pub best_clear_type: Option<ClearType>,
    pub health: i32,
    /// Milliseconds since the epoch.
    pub time_played: u64,
    pub modifier: u32,
    pub rating: f64,
}

impl Score {
    #[must_use]
    pub fn grade(&self) -> Grade {
        Grade::from_score(self.score)
    }
}

/// A [`Score`] joined with the metadata of its song.
///
/// `song_info` is absent when the lookup for the song failed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnrichedScore<I = SongInfo> {
    #[serde(flatten)]
    pub score: Score,

    #[serde(rename = "songInfo")]
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub song_info: Option<I>,
}

impl<I> std::ops::Deref for EnrichedScore<I> {
    type Target = Score;

    fn deref(&self) -> &Self::Target {
        &self.score
    }
}
