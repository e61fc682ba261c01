//! API v4.
//!
//! Besides the single endpoint operations, v4 is the only version with the
//! `batch` endpoint, which [`UtilApi`] builds its compositions on.
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> botarc::error::Result<()> {
//! use botarc::{config::Config, protocol::{RecentCount, UserKey}, v4};
//!
//! let client = v4::Client::new(&Config::parse("https://example.org/botarcapi/")?)?;
//! let user = UserKey::new("000000001", false);
//!
//! let best30 = client.util().user_best30(&user, RecentCount::new(3)).await?;
//! for entry in &best30.user_best30.best30_list {
//!     println!("{} {}", entry.song_id, entry.score);
//! }
//! # Ok(())
//! # }
//! ```

use reqwest::Method;
use serde::de::IgnoredAny;

use crate::{
    batch::{self, Best30Aggregate, UserBestBundle},
    config::Config,
    error::Result,
    gateway::{Endpoint, Gateway},
    protocol::{
        BatchPlan, BatchResult, ConnectKey, Difficulty, ForwardToken, Query, RandomSong,
        Rating, RecentCount, Score, SongAlias, SongInfo, Update, UserBest30, UserInfo, UserKey,
    },
};

/// `user/info`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserInfoRequest {
    pub user: UserKey,
    pub recent: RecentCount,
}

impl Endpoint for UserInfoRequest {
    const PATH: &'static str = "v4/user/info";
    const METHOD: Method = Method::GET;
    type Content = UserInfo;

    fn query(&self) -> Query {
        Query::new()
            .with_user(&self.user)
            .with_opt("recent", self.recent.as_param())
    }
}

/// `user/best`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserBestRequest {
    pub user: UserKey,
    pub song: String,
    /// Defaults to [`Difficulty::Future`].
    pub difficulty: Option<Difficulty>,
}

impl Endpoint for UserBestRequest {
    const PATH: &'static str = "v4/user/best";
    const METHOD: Method = Method::GET;
    type Content = Score;

    fn query(&self) -> Query {
        Query::new()
            .with_user(&self.user)
            .with("songname", &self.song)
            .with("difficulty", self.difficulty.unwrap_or_default().index())
    }
}

/// `user/best30`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserBest30Request {
    pub user: UserKey,
}

impl Endpoint for UserBest30Request {
    const PATH: &'static str = "v4/user/best30";
    const METHOD: Method = Method::GET;
    type Content = UserBest30;

    fn query(&self) -> Query {
        Query::new().with_user(&self.user)
    }
}

/// `song/info`, by song name or alias.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SongInfoRequest {
    pub song: String,
}

impl Endpoint for SongInfoRequest {
    const PATH: &'static str = "v4/song/info";
    const METHOD: Method = Method::POST;
    type Content = SongInfo;

    fn query(&self) -> Query {
        Query::new().with("songname", &self.song)
    }
}

/// `song/alias`, by song id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SongAliasRequest {
    pub song_id: String,
}

impl Endpoint for SongAliasRequest {
    const PATH: &'static str = "v4/song/alias";
    const METHOD: Method = Method::POST;
    type Content = SongAlias;

    fn query(&self) -> Query {
        Query::new().with("songid", &self.song_id)
    }
}

/// `song/random`, with levels in the `2 × level + plus` encoding.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RandomRequest {
    pub start: Option<u8>,
    pub end: Option<u8>,
}

impl Endpoint for RandomRequest {
    const PATH: &'static str = "v4/song/random";
    const METHOD: Method = Method::POST;
    type Content = RandomSong;

    fn query(&self) -> Query {
        Query::new()
            .with_opt("start", self.start)
            .with_opt("end", self.end)
    }
}

/// `song/rating`, charts whose constant lies within `start..=end`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RatingRequest {
    pub start: f64,
    pub end: Option<f64>,
}

impl Endpoint for RatingRequest {
    const PATH: &'static str = "v4/song/rating";
    const METHOD: Method = Method::POST;
    type Content = Rating;

    fn query(&self) -> Query {
        Query::new()
            .with("start", self.start)
            .with_opt("end", self.end)
    }
}

/// `forward/alloc`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ForwardAllocRequest {
    /// Seconds to hold the account for.
    pub time: Option<u64>,
    pub clear: Option<bool>,
}

impl Endpoint for ForwardAllocRequest {
    const PATH: &'static str = "v4/forward/alloc";
    const METHOD: Method = Method::GET;
    type Content = ForwardToken;

    fn query(&self) -> Query {
        Query::new()
            .with_opt("time", self.time)
            .with_opt("clear", self.clear)
    }
}

/// `forward/forward/<path>`, a request proxied through an allocated
/// account. Requires the token as bearer authorization.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ForwardRequest {
    pub method: Method,
    pub path: String,
    pub query: Query,
}

impl Endpoint for ForwardRequest {
    const PATH: &'static str = "v4/forward/forward";
    const METHOD: Method = Method::GET;
    type Content = serde_json::Value;

    fn query(&self) -> Query {
        self.query.clone()
    }

    fn path(&self) -> std::borrow::Cow<'_, str> {
        format!("{}/{}", Self::PATH, self.path.trim_start_matches('/')).into()
    }

    fn method(&self) -> Method {
        self.method.clone()
    }
}

/// `forward/recycle`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ForwardRecycleRequest {
    pub token: String,
}

impl Endpoint for ForwardRecycleRequest {
    const PATH: &'static str = "v4/forward/recycle";
    const METHOD: Method = Method::GET;
    type Content = IgnoredAny;

    fn query(&self) -> Query {
        Query::new().with("token", &self.token)
    }
}

/// `forward/feed`, extends the validity of a token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ForwardFeedRequest {
    pub token: String,
}

impl Endpoint for ForwardFeedRequest {
    const PATH: &'static str = "v4/forward/feed";
    const METHOD: Method = Method::GET;
    type Content = IgnoredAny;

    fn query(&self) -> Query {
        Query::new().with("token", &self.token)
    }
}

/// `batch`, with the plan serialized into the `calls` parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BatchRequest {
    calls: String,
}

impl BatchRequest {
    /// # Errors
    ///
    /// Returns error if the plan cannot be serialized.
    pub fn new(plan: &BatchPlan) -> Result<Self> {
        Ok(Self {
            calls: plan.to_json()?,
        })
    }
}

impl Endpoint for BatchRequest {
    const PATH: &'static str = "v4/batch";
    const METHOD: Method = Method::POST;
    type Content = Vec<BatchResult>;

    fn query(&self) -> Query {
        Query::new().with("calls", &self.calls)
    }
}

/// `update`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UpdateRequest;

impl Endpoint for UpdateRequest {
    const PATH: &'static str = "v4/update";
    const METHOD: Method = Method::GET;
    type Content = Update;

    fn query(&self) -> Query {
        Query::new()
    }
}

/// `connect`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConnectRequest;

impl Endpoint for ConnectRequest {
    const PATH: &'static str = "v4/connect";
    const METHOD: Method = Method::GET;
    type Content = ConnectKey;

    fn query(&self) -> Query {
        Query::new()
    }
}

/// Client for API v4.
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
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
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
    pub fn forward(&self) -> ForwardApi<'_> {
        ForwardApi {
            gateway: &self.gateway,
        }
    }

    #[must_use]
    pub fn util(&self) -> UtilApi<'_> {
        UtilApi { client: self }
    }

    /// Submits `plan` in one request and returns the raw results.
    ///
    /// The plan is sent as is; the results are neither reordered nor
    /// checked.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the batch as a whole is
    /// rejected.
    pub async fn batch(&self, plan: &BatchPlan) -> Result<Vec<BatchResult>> {
        let results = self.gateway.call(&BatchRequest::new(plan)?).await?;
        debug!("batch: {} calls, {} results", plan.len(), results.len());
        Ok(results)
    }

    /// Like [`Client::batch`], with the plan given as JSON text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `calls` is not a plan, otherwise the
    /// same as [`Client::batch`].
    pub async fn batch_str(&self, calls: &str) -> Result<Vec<BatchResult>> {
        let plan: BatchPlan = calls.parse()?;
        self.batch(&plan).await
    }

    /// Latest client version.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn update(&self) -> Result<Update> {
        self.gateway.call(&UpdateRequest).await
    }

    /// Current connect code.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn connect(&self) -> Result<ConnectKey> {
        self.gateway.call(&ConnectRequest).await
    }
}

/// User operations of API v4.
pub struct UserApi<'a> {
    gateway: &'a Gateway,
}

impl UserApi<'_> {
    /// Account info with up to `recent` recent scores.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn info(&self, user: &UserKey, recent: RecentCount) -> Result<UserInfo> {
        let request = UserInfoRequest {
            user: user.clone(),
            recent,
        };
        self.gateway.call(&request).await
    }

    /// Best score of a user on one chart.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn best(
        &self,
        user: &UserKey,
        song: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<Score> {
        let request = UserBestRequest {
            user: user.clone(),
            song: song.to_owned(),
            difficulty,
        };
        self.gateway.call(&request).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn best30(&self, user: &UserKey) -> Result<UserBest30> {
        let request = UserBest30Request { user: user.clone() };
        self.gateway.call(&request).await
    }
}

/// Song operations of API v4.
pub struct SongApi<'a> {
    gateway: &'a Gateway,
}

impl SongApi<'_> {
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn info(&self, song: &str) -> Result<SongInfo> {
        let request = SongInfoRequest {
            song: song.to_owned(),
        };
        self.gateway.call(&request).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn alias(&self, song_id: &str) -> Result<SongAlias> {
        let request = SongAliasRequest {
            song_id: song_id.to_owned(),
        };
        self.gateway.call(&request).await
    }

    /// Rolls a song from a level range.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn random(&self, start: Option<u8>, end: Option<u8>) -> Result<RandomSong> {
        self.gateway.call(&RandomRequest { start, end }).await
    }

    /// Charts whose constant lies within `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn rating(&self, start: f64, end: Option<f64>) -> Result<Rating> {
        self.gateway.call(&RatingRequest { start, end }).await
    }
}

/// Account forwarding of API v4.
pub struct ForwardApi<'a> {
    gateway: &'a Gateway,
}

impl ForwardApi<'_> {
    /// Borrows an account for `time` seconds.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn alloc(&self, time: Option<u64>, clear: Option<bool>) -> Result<ForwardToken> {
        self.gateway.call(&ForwardAllocRequest { time, clear }).await
    }

    /// Proxies a request to `path` through the account behind `token`.
    ///
    /// The content is returned undecoded since its shape depends on `path`.
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
        let request = ForwardRequest {
            method,
            path: path.to_owned(),
            query,
        };
        self.gateway
            .call_authorized(&request, &token.access_token)
            .await
    }

    /// Returns the account behind `token`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn recycle(&self, token: &ForwardToken) -> Result<()> {
        let request = ForwardRecycleRequest {
            token: token.access_token.clone(),
        };
        self.gateway.call(&request).await.map(drop)
    }

    /// Extends the validity of `token`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn feed(&self, token: &ForwardToken) -> Result<()> {
        let request = ForwardFeedRequest {
            token: token.access_token.clone(),
        };
        self.gateway.call(&request).await.map(drop)
    }
}

/// Compositions that fetch several endpoints in one batch.
pub struct UtilApi<'a> {
    client: &'a Client,
}

impl UtilApi<'_> {
    /// Best score of a user on one chart, with the song's info and aliases.
    ///
    /// # Errors
    ///
    /// * `Rejected` with the first failing call, in the order score, song
    ///   info, aliases
    /// * any error of [`Client::batch`]
    pub async fn user_best(
        &self,
        user: &UserKey,
        song: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<UserBestBundle> {
        let plan = batch::user_best_plan(user, song, difficulty)?;
        let results = self.client.batch(&plan).await?;
        batch::correlate_user_best(&results)
    }

    /// Best 30 and account info of a user with song info attached to every
    /// score. Scores whose song could not be looked up are kept, without
    /// `songInfo`.
    ///
    /// # Errors
    ///
    /// * `Rejected` if the best 30 or the account info call failed
    /// * any error of [`Client::batch`]
    pub async fn user_best30(&self, user: &UserKey, recent: RecentCount) -> Result<Best30Aggregate> {
        let plan = batch::user_best30_plan(user, recent)?;
        let results = self.client.batch(&plan).await?;
        batch::correlate_user_best30(&results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_info_omits_zero_recent() {
        let request = UserInfoRequest {
            user: UserKey::new("Toaster", true),
            recent: RecentCount::new(0),
        };
        assert_eq!(request.query().encode(), "user=Toaster");
    }

    #[test]
    fn forward_path_is_appended() {
        let request = ForwardRequest {
            method: Method::POST,
            path: "/user/me".to_owned(),
            query: Query::new(),
        };
        assert_eq!(request.path(), "v4/forward/forward/user/me");
        assert_eq!(request.method(), Method::POST);
    }

    #[test]
    fn batch_request_carries_plan_as_json() {
        let plan = batch::user_best_plan(&UserKey::new("1", false), "gl", None).unwrap();
        let request = BatchRequest::new(&plan).unwrap();
        let query = request.query();

        assert_eq!(query.pairs()[0].0, "calls");
        let decoded: BatchPlan = query.pairs()[0].1.parse().unwrap();
        assert_eq!(decoded, plan);
    }
}
