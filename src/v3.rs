//! API v3.
//!
//! v3 looks users up by code only and reports failures by status alone:
//! errors returned by this client carry a [`Failure`](crate::protocol::Failure)
//! without message.

use std::borrow::Cow;

use reqwest::Method;
use serde::de::IgnoredAny;

use crate::{
    config::Config,
    error::Result,
    gateway::{Endpoint, Gateway},
    protocol::{
        ConnectKey, Difficulty, ForwardToken, Query, RandomSong, Score, SongId, SongInfo, Update,
        UserBest30, UserInfo,
    },
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserInfoRequest {
    pub usercode: String,
    /// Whether to include the most recent score.
    pub recent: bool,
}

impl Endpoint for UserInfoRequest {
    const PATH: &'static str = "v3/userinfo";
    const METHOD: Method = Method::GET;
    type Content = UserInfo;

    fn query(&self) -> Query {
        Query::new()
            .with("usercode", &self.usercode)
            .with("recent", self.recent)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserBestRequest {
    pub usercode: String,
    pub song: String,
    pub difficulty: Difficulty,
}

impl Endpoint for UserBestRequest {
    const PATH: &'static str = "v3/userbest";
    const METHOD: Method = Method::GET;
    type Content = Score;

    fn query(&self) -> Query {
        Query::new()
            .with("usercode", &self.usercode)
            .with("songname", &self.song)
            .with("difficulty", self.difficulty.index())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserBest30Request {
    pub usercode: String,
}

impl Endpoint for UserBest30Request {
    const PATH: &'static str = "v3/userbest30";
    const METHOD: Method = Method::GET;
    type Content = UserBest30;

    fn query(&self) -> Query {
        Query::new().with("usercode", &self.usercode)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SongInfoRequest {
    pub song: String,
}

impl Endpoint for SongInfoRequest {
    const PATH: &'static str = "v3/songinfo";
    const METHOD: Method = Method::GET;
    type Content = SongInfo;

    fn query(&self) -> Query {
        Query::new().with("songname", &self.song)
    }
}

/// Resolves an alias to a song id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SongAliasRequest {
    pub song: String,
}

impl Endpoint for SongAliasRequest {
    const PATH: &'static str = "v3/songalias";
    const METHOD: Method = Method::GET;
    type Content = SongId;

    fn query(&self) -> Query {
        Query::new().with("songname", &self.song)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RandomRequest {
    pub start: Option<u8>,
    pub end: Option<u8>,
    /// Whether to include the song's info.
    pub with_info: bool,
}

impl Endpoint for RandomRequest {
    const PATH: &'static str = "v3/random";
    const METHOD: Method = Method::GET;
    type Content = RandomSong;

    fn query(&self) -> Query {
        Query::new()
            .with_opt("start", self.start)
            .with_opt("end", self.end)
            .with("info", self.with_info)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UpdateRequest;

impl Endpoint for UpdateRequest {
    const PATH: &'static str = "v3/update";
    const METHOD: Method = Method::GET;
    type Content = Update;

    fn query(&self) -> Query {
        Query::new()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConnectRequest;

impl Endpoint for ConnectRequest {
    const PATH: &'static str = "v3/connect";
    const METHOD: Method = Method::GET;
    type Content = ConnectKey;

    fn query(&self) -> Query {
        Query::new()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ArcAllocRequest {
    /// Seconds to hold the account for.
    pub time: Option<u64>,
    pub clear: Option<bool>,
}

impl Endpoint for ArcAllocRequest {
    const PATH: &'static str = "v3/arc/alloc";
    const METHOD: Method = Method::GET;
    type Content = ForwardToken;

    fn query(&self) -> Query {
        Query::new()
            .with_opt("time", self.time)
            .with_opt("clear", self.clear)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArcForwardRequest {
    pub method: Method,
    pub path: String,
    pub query: Query,
}

impl Endpoint for ArcForwardRequest {
    const PATH: &'static str = "v3/arc/forward";
    const METHOD: Method = Method::GET;
    type Content = serde_json::Value;

    fn query(&self) -> Query {
        self.query.clone()
    }

    fn path(&self) -> Cow<'_, str> {
        format!("{}/{}", Self::PATH, self.path.trim_start_matches('/')).into()
    }

    fn method(&self) -> Method {
        self.method.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArcRecycleRequest {
    pub token: String,
}

impl Endpoint for ArcRecycleRequest {
    const PATH: &'static str = "v3/arc/recycle";
    const METHOD: Method = Method::GET;
    type Content = IgnoredAny;

    fn query(&self) -> Query {
        Query::new().with("token", &self.token)
    }
}

/// Client for API v3.
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
    pub fn arc(&self) -> ArcApi<'_> {
        ArcApi {
            gateway: &self.gateway,
        }
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn user_info(&self, usercode: &str, recent: bool) -> Result<UserInfo> {
        let request = UserInfoRequest {
            usercode: usercode.to_owned(),
            recent,
        };
        self.gateway.call(&request).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn user_best(
        &self,
        usercode: &str,
        song: &str,
        difficulty: Difficulty,
    ) -> Result<Score> {
        let request = UserBestRequest {
            usercode: usercode.to_owned(),
            song: song.to_owned(),
            difficulty,
        };
        self.gateway.call(&request).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn user_best30(&self, usercode: &str) -> Result<UserBest30> {
        let request = UserBest30Request {
            usercode: usercode.to_owned(),
        };
        self.gateway.call(&request).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn song_info(&self, song: &str) -> Result<SongInfo> {
        let request = SongInfoRequest {
            song: song.to_owned(),
        };
        self.gateway.call(&request).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn song_alias(&self, song: &str) -> Result<SongId> {
        let request = SongAliasRequest {
            song: song.to_owned(),
        };
        self.gateway.call(&request).await
    }

    /// Rolls a song from a level range.
    ///
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

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn update(&self) -> Result<Update> {
        self.gateway.call(&UpdateRequest).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn connect(&self) -> Result<ConnectKey> {
        self.gateway.call(&ConnectRequest).await
    }
}

/// Account forwarding of API v3.
pub struct ArcApi<'a> {
    gateway: &'a Gateway,
}

impl ArcApi<'_> {
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn alloc(&self, time: Option<u64>, clear: Option<bool>) -> Result<ForwardToken> {
        self.gateway.call(&ArcAllocRequest { time, clear }).await
    }

    /// Proxies a request to `path` through the account behind `token`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn forward(
        &self,
        token: &ForwardToken,
        method: Method,
        path: &str,
        query: Query,
    ) -> Result<serde_json::Value> {
        let request = ArcForwardRequest {
            method,
            path: path.to_owned(),
            query,
        };
        self.gateway
            .call_authorized(&request, &token.access_token)
            .await
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn recycle(&self, token: &ForwardToken) -> Result<()> {
        let request = ArcRecycleRequest {
            token: token.access_token.clone(),
        };
        self.gateway.call(&request).await.map(drop)
    }
}
