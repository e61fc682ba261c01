//! API v5.
//!
//! Paths are relative to the v5 root, so the configured base URL must point
//! at it (`https://example.org/botarcapi/v5/`), not at the API root.
//!
//! v5 can return per-chart song info next to scores, see
//! [`Best30V5::into_aggregate`], and serves game assets as binary data.

use reqwest::Method;

use crate::{
    config::Config,
    error::Result,
    gateway::{Endpoint, Gateway},
    protocol::{
        Best30V5, Difficulty, Query, RandomSong, RecentCount, SongAlias, SongInfoV5, Update,
        UserBestV5, UserInfoV5, UserKey,
    },
};

/// How a song is looked up.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum SongQuery {
    /// Name or alias, matched fuzzily, sent as `songname`.
    Name(String),
    /// Exact song id, sent as `songid`.
    Id(String),
}

impl SongQuery {
    /// Picks the lookup mode from a `fuzzy` flag.
    pub fn new(song: impl Into<String>, fuzzy: bool) -> Self {
        if fuzzy {
            Self::Name(song.into())
        } else {
            Self::Id(song.into())
        }
    }

    fn to_query(&self) -> Query {
        match self {
            Self::Name(name) => Query::new().with("songname", name),
            Self::Id(id) => Query::new().with("songid", id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserInfoRequest {
    pub user: UserKey,
    pub recent: RecentCount,
    pub with_song_info: bool,
}

impl Endpoint for UserInfoRequest {
    const PATH: &'static str = "user/info";
    const METHOD: Method = Method::GET;
    type Content = UserInfoV5;

    fn query(&self) -> Query {
        Query::new()
            .with_user(&self.user)
            .with_opt("recent", self.recent.as_param())
            .with_opt("withsonginfo", self.with_song_info.then_some(true))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserBestRequest {
    pub user: UserKey,
    pub song: String,
    /// Defaults to [`Difficulty::Future`].
    pub difficulty: Option<Difficulty>,
    pub with_recent: bool,
    pub with_song_info: bool,
}

impl Endpoint for UserBestRequest {
    const PATH: &'static str = "user/best";
    const METHOD: Method = Method::GET;
    type Content = UserBestV5;

    fn query(&self) -> Query {
        Query::new()
            .with_user(&self.user)
            .with("songname", &self.song)
            .with("difficulty", self.difficulty.unwrap_or_default().index())
            .with_opt("withrecent", self.with_recent.then_some(true))
            .with_opt("withsonginfo", self.with_song_info.then_some(true))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserBest30Request {
    pub user: UserKey,
    /// Number of entries ranked below the best 30 to include.
    pub overflow: u8,
    pub with_recent: bool,
    pub with_song_info: bool,
}

impl UserBest30Request {
    pub const MAX_OVERFLOW: u8 = 10;
}

impl Endpoint for UserBest30Request {
    const PATH: &'static str = "user/best30";
    const METHOD: Method = Method::GET;
    type Content = Best30V5;

    fn query(&self) -> Query {
        let overflow = self.overflow.min(Self::MAX_OVERFLOW);
        Query::new()
            .with_user(&self.user)
            .with_opt("overflow", (overflow > 0).then_some(overflow))
            .with_opt("withrecent", self.with_recent.then_some(true))
            .with_opt("withsonginfo", self.with_song_info.then_some(true))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SongInfoRequest {
    pub song: SongQuery,
}

impl Endpoint for SongInfoRequest {
    const PATH: &'static str = "song/info";
    const METHOD: Method = Method::POST;
    type Content = SongInfoV5;

    fn query(&self) -> Query {
        self.song.to_query()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SongAliasRequest {
    pub song: SongQuery,
}

impl Endpoint for SongAliasRequest {
    const PATH: &'static str = "song/alias";
    const METHOD: Method = Method::POST;
    type Content = SongAlias;

    fn query(&self) -> Query {
        self.song.to_query()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RandomRequest {
    pub start: Option<u8>,
    pub end: Option<u8>,
    pub with_info: bool,
}

impl Endpoint for RandomRequest {
    const PATH: &'static str = "song/random";
    const METHOD: Method = Method::GET;
    type Content = RandomSong;

    fn query(&self) -> Query {
        Query::new()
            .with_opt("start", self.start)
            .with_opt("end", self.end)
            .with_opt("withsonginfo", self.with_info.then_some(true))
    }
}

/// Artwork of a partner. Answered with image data, so only usable with
/// [`Gateway::fetch_binary`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CharRequest {
    pub partner: u32,
    pub awakened: bool,
}

impl Endpoint for CharRequest {
    const PATH: &'static str = "assets/char";
    const METHOD: Method = Method::POST;
    type Content = ();

    fn query(&self) -> Query {
        Query::new()
            .with("partner", self.partner)
            .with("awakened", self.awakened)
    }
}

/// Icon of a partner. Answered with image data.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct IconRequest {
    pub partner: u32,
    pub awakened: bool,
}

impl Endpoint for IconRequest {
    const PATH: &'static str = "assets/icon";
    const METHOD: Method = Method::POST;
    type Content = ();

    fn query(&self) -> Query {
        Query::new()
            .with("partner", self.partner)
            .with("awakened", self.awakened)
    }
}

/// Cover art of a song. Answered with image data.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SongArtRequest {
    pub song: SongQuery,
}

impl Endpoint for SongArtRequest {
    const PATH: &'static str = "assets/song";
    const METHOD: Method = Method::POST;
    type Content = ();

    fn query(&self) -> Query {
        self.song.to_query()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UpdateRequest;

impl Endpoint for UpdateRequest {
    const PATH: &'static str = "update";
    const METHOD: Method = Method::GET;
    type Content = Update;

    fn query(&self) -> Query {
        Query::new()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConnectRequest;

impl Endpoint for ConnectRequest {
    const PATH: &'static str = "connect";
    const METHOD: Method = Method::GET;
    type Content = String;

    fn query(&self) -> Query {
        Query::new()
    }
}

/// Client for API v5.
pub struct Client {
    gateway: Gateway,
}

impl Client {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            gateway: Gateway::new(config)?,
        })
    }

    #[must_use]
    pub fn user(&self) -> UserApi<'_> {
        UserApi {
            gateway: &self.gateway,
        }
    }

    #[must_use]
    pub fn song(&self) -> SongApi<'_> {
        SongApi {
            gateway: &self.gateway,
        }
    }

    #[must_use]
    pub fn assets(&self) -> AssetsApi<'_> {
        AssetsApi {
            gateway: &self.gateway,
        }
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn update(&self) -> Result<Update> {
        self.gateway.call(&UpdateRequest).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn connect(&self) -> Result<String> {
        self.gateway.call(&ConnectRequest).await
    }
}

/// User operations of API v5.
pub struct UserApi<'a> {
    gateway: &'a Gateway,
}

impl UserApi<'_> {
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn info(
        &self,
        user: &UserKey,
        recent: RecentCount,
        with_song_info: bool,
    ) -> Result<UserInfoV5> {
        let request = UserInfoRequest {
            user: user.clone(),
            recent,
            with_song_info,
        };
        self.gateway.call(&request).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn best(
        &self,
        user: &UserKey,
        song: &str,
        difficulty: Option<Difficulty>,
        with_recent: bool,
        with_song_info: bool,
    ) -> Result<UserBestV5> {
        let request = UserBestRequest {
            user: user.clone(),
            song: song.to_owned(),
            difficulty,
            with_recent,
            with_song_info,
        };
        self.gateway.call(&request).await
    }

    /// Best 30 with up to `overflow` further entries, capped at
    /// [`UserBest30Request::MAX_OVERFLOW`].
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn best30(
        &self,
        user: &UserKey,
        overflow: u8,
        with_recent: bool,
        with_song_info: bool,
    ) -> Result<Best30V5> {
        let request = UserBest30Request {
            user: user.clone(),
            overflow,
            with_recent,
            with_song_info,
        };
        self.gateway.call(&request).await
    }
}

/// Song operations of API v5.
pub struct SongApi<'a> {
    gateway: &'a Gateway,
}

impl SongApi<'_> {
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn info(&self, song: SongQuery) -> Result<SongInfoV5> {
        self.gateway.call(&SongInfoRequest { song }).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn alias(&self, song: SongQuery) -> Result<SongAlias> {
        self.gateway.call(&SongAliasRequest { song }).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn random(
        &self,
        start: Option<u8>,
        end: Option<u8>,
        with_info: bool,
    ) -> Result<RandomSong> {
        let request = RandomRequest {
            start,
            end,
            with_info,
        };
        self.gateway.call(&request).await
    }
}

/// Binary assets of API v5.
pub struct AssetsApi<'a> {
    gateway: &'a Gateway,
}

impl AssetsApi<'_> {
    /// Partner artwork as image data.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` if the server answered with a failure envelope,
    /// or any transport error.
    pub async fn char(&self, partner: u32, awakened: bool) -> Result<Vec<u8>> {
        self.gateway
            .fetch_binary(&CharRequest { partner, awakened })
            .await
    }

    /// Partner icon as image data.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` if the server answered with a failure envelope,
    /// or any transport error.
    pub async fn icon(&self, partner: u32, awakened: bool) -> Result<Vec<u8>> {
        self.gateway
            .fetch_binary(&IconRequest { partner, awakened })
            .await
    }

    /// Song cover as image data.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` if the server answered with a failure envelope,
    /// or any transport error.
    pub async fn song(&self, song: SongQuery) -> Result<Vec<u8>> {
        self.gateway.fetch_binary(&SongArtRequest { song }).await
    }
}
