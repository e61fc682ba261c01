//! Account info and best 30 lists.
//!
//! Both shapes are generic over the score type so that the raw payloads and
//! their song-enriched counterparts share one definition:
//!
//! * `UserInfo<Score>` is what `user/info` returns
//! * `UserInfo<EnrichedScore>` is what the batch composition returns

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::Score;

/// Account info of a user, with up to seven recent scores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserInfo<S = Score> {
    pub user_id: u64,
    pub name: String,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub recent_score: Option<Vec<S>>,
    pub character: u32,
    pub join_date: u64,
    /// Potential times 100, or `-1` when hidden.
    pub rating: i32,
    #[serde(default)]
    pub is_skill_sealed: bool,
    #[serde(default)]
    pub is_char_uncapped: bool,
    #[serde(default)]
    pub is_char_uncapped_override: bool,
    #[serde(default)]
    pub is_mutual: bool,
}

impl<S> UserInfo<S> {
    /// Rebuilds the info with every recent score mapped through `f`,
    /// keeping order and length.
    pub fn map_scores<T, F>(self, f: F) -> UserInfo<T>
    where
        F: FnMut(S) -> T,
    {
        UserInfo {
            user_id: self.user_id,
            name: self.name,
            recent_score: self
                .recent_score
                .map(|scores| scores.into_iter().map(f).collect()),
            character: self.character,
            join_date: self.join_date,
            rating: self.rating,
            is_skill_sealed: self.is_skill_sealed,
            is_char_uncapped: self.is_char_uncapped,
            is_char_uncapped_override: self.is_char_uncapped_override,
            is_mutual: self.is_mutual,
        }
    }
}

/// The 30 best scores of a user, plus the overflow entries ranked below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserBest30<S = Score> {
    pub best30_avg: f64,
    pub recent10_avg: f64,
    pub best30_list: Vec<S>,
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub best30_overflow: Vec<S>,
}

impl<S> UserBest30<S> {
    /// Rebuilds the lists with every score mapped through `f`, keeping order
    /// and length.
    pub fn map_scores<T, F>(self, mut f: F) -> UserBest30<T>
    where
        F: FnMut(S) -> T,
    {
        UserBest30 {
            best30_avg: self.best30_avg,
            recent10_avg: self.recent10_avg,
            best30_list: self.best30_list.into_iter().map(&mut f).collect(),
            best30_overflow: self.best30_overflow.into_iter().map(&mut f).collect(),
        }
    }
}

/// Number of recent scores to request along with user info.
///
/// Always within `0..=7`. Anything else, including text that is not a
/// number, counts as zero.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecentCount(u8);

impl RecentCount {
    pub const MAX: u8 = 7;

    #[must_use]
    pub fn new(count: i64) -> Self {
        match u8::try_from(count) {
            Ok(count) if count <= Self::MAX => Self(count),
            _ => Self(0),
        }
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The count as a query value; zero is left out of requests.
    #[must_use]
    pub fn as_param(self) -> Option<u8> {
        (!self.is_zero()).then_some(self.0)
    }
}

impl From<u8> for RecentCount {
    fn from(count: u8) -> Self {
        Self::new(count.into())
    }
}

impl FromStr for RecentCount {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.trim().parse::<i64>().map(Self::new).unwrap_or_default())
    }
}

impl fmt::Display for RecentCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_count_clamps_to_zero() {
        for count in [-1, 8, 30, i64::MAX, i64::MIN] {
            assert_eq!(RecentCount::new(count).get(), 0);
        }
        for count in 0..=7 {
            assert_eq!(RecentCount::new(count).get(), u8::try_from(count).unwrap());
        }
    }

    #[test]
    fn recent_count_parses_leniently() {
        assert_eq!("5".parse::<RecentCount>().unwrap().get(), 5);
        assert_eq!("seven".parse::<RecentCount>().unwrap().get(), 0);
        assert_eq!("12".parse::<RecentCount>().unwrap().get(), 0);
        assert_eq!("".parse::<RecentCount>().unwrap().get(), 0);
    }

    #[test]
    fn zero_recent_is_not_sent() {
        assert_eq!(RecentCount::new(0).as_param(), None);
        assert_eq!(RecentCount::new(3).as_param(), Some(3));
    }

    #[test]
    fn map_scores_keeps_order_and_length() {
        let best30 = UserBest30 {
            best30_avg: 12.0,
            recent10_avg: 12.1,
            best30_list: vec![3, 1, 2],
            best30_overflow: vec![9],
        };
        let mapped = best30.map_scores(|n| n * 10);
        assert_eq!(mapped.best30_list, vec![30, 10, 20]);
        assert_eq!(mapped.best30_overflow, vec![90]);
    }

    fn score(song_id: &str) -> serde_json::Value {
        serde_json::json!({
            "song_id": song_id,
            "difficulty": 2,
            "score": 9_876_543,
            "shiny_perfect_count": 1024,
            "perfect_count": 1400,
            "near_count": 12,
            "miss_count": 3,
            "clear_type": 1,
            "health": 100,
            "time_played": 1_614_950_400_000_u64,
            "modifier": 0,
            "rating": 11.54
        })
    }

    #[test]
    fn best30_without_overflow_decodes() {
        let best30: UserBest30<Score> = serde_json::from_value(serde_json::json!({
            "best30_avg": 12.01,
            "recent10_avg": 11.87,
            "best30_list": [score("a"), score("b")]
        }))
        .unwrap();

        assert_eq!(best30.best30_list.len(), 2);
        assert!(best30.best30_overflow.is_empty());
    }

    #[test]
    fn user_info_without_recent_decodes() {
        let info: UserInfo<Score> = serde_json::from_value(serde_json::json!({
            "user_id": 1,
            "name": "Toaster",
            "character": 5,
            "join_date": 1_487_816_563_340_u64,
            "rating": 1250
        }))
        .unwrap();

        assert_eq!(info.name, "Toaster");
        assert_eq!(info.recent_score, None);
    }
}
