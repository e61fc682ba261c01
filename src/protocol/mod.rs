//! Wire types of the BotArcApi.
//!
//! Every endpoint answers with the same [`Envelope`]:
//!
//! ```json
//! { "status": 0, "content": { ... } }
//! { "status": -3, "message": "user not found" }
//! ```
//!
//! `status == 0` means success and `content` holds the payload. Any other
//! status is a failure. API v3 sends no `message`, only the status.
//!
//! # Submodules
//!
//! * [`batch`] - batch plans, placeholders and batch results
//! * [`forward`] - forwarding tokens
//! * [`score`] - play records, difficulties and clear types
//! * [`server`] - client updates and the connect code
//! * [`song`] - song metadata
//! * [`user`] - account info and best 30 lists
//! * [`v5`] - shapes specific to API v5

pub mod batch;
pub mod forward;
pub mod score;
pub mod server;
pub mod song;
pub mod user;
pub mod v5;

pub use batch::{BatchCall, BatchPlan, BatchResult, CallId, FieldPath, PlanError, Placeholder};
pub use forward::ForwardToken;
pub use score::{ClearType, Difficulty, EnrichedScore, Grade, Score};
pub use server::{ConnectKey, Update};
pub use song::{
    DifficultyClass, LocalizedTitle, RandomSong, Rating, RatingInfo, SongAlias, SongId,
    SongInfo,
};
pub use user::{RecentCount, UserBest30, UserInfo};
pub use v5::{
    AccountInfo, Best30AggregateV5, Best30V5, ChartInfo, SongInfoV5, UserBestV5, UserInfoV5,
};

use std::fmt::{self, Debug};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parses and logs JSON responses from the API.
///
/// Successfully parsed responses are logged at TRACE level. If parsing
/// fails, valid JSON is dumped at TRACE level and anything else is logged
/// at ERROR level.
///
/// # Errors
///
/// Returns error if `body` is not valid JSON or does not match `T`.
pub fn json<T>(body: &str, origin: &str) -> Result<T>
where
    T: DeserializeOwned + Debug,
{
    match serde_json::from_str(body) {
        Ok(result) => {
            trace!("{origin}: {result:#?}");
            Ok(result)
        }
        Err(e) => {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
                trace!("{origin}: {json:#?}");
            } else {
                error!("{origin}: failed parsing response ({e:?})");
                trace!("{body}");
            }
            Err(e.into())
        }
    }
}

/// Response wrapper around every endpoint's payload.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Envelope<T> {
    pub status: i64,

    #[serde(default = "Option::default")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<T>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    /// The failure described by this envelope, if it is one.
    #[must_use]
    pub fn failure(&self) -> Option<Failure> {
        (!self.is_success()).then(|| Failure {
            status: self.status,
            message: self.message.clone(),
        })
    }
}

impl<T> Envelope<T>
where
    T: DeserializeOwned,
{
    /// Unwraps the envelope into its content.
    ///
    /// A success envelope without `content` is only accepted when `T` can be
    /// built from `null`, as is the case for endpoints that return nothing.
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::Rejected`](crate::error::ErrorKind::Rejected) if the
    ///   status is not zero
    /// * [`ErrorKind::DataLoss`](crate::error::ErrorKind::DataLoss) if a
    ///   required `content` is missing
    pub fn into_content(self) -> Result<T> {
        if let Some(failure) = self.failure() {
            return Err(Error::rejected(failure));
        }

        match self.content {
            Some(content) => Ok(content),
            None => serde_json::from_value(serde_json::Value::Null)
                .map_err(|_| Error::data_loss("success envelope without content")),
        }
    }
}

impl Envelope<serde_json::Value> {
    /// Decodes untyped content into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Envelope::into_content`], plus a decoding error if the
    /// content does not match `T`.
    pub fn decode<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if let Some(failure) = self.failure() {
            return Err(Error::rejected(failure));
        }

        let content = self.content.clone().unwrap_or(serde_json::Value::Null);
        serde_json::from_value(content).map_err(Into::into)
    }
}

/// Status and message of a failure envelope.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Failure {
    pub status: i64,
    pub message: Option<String>,
}

impl std::error::Error for Failure {}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{message}"),
            None => write!(f, "status {}", self.status),
        }
    }
}

/// How a user is looked up.
///
/// Every endpoint that takes a user accepts either the exact friend code or
/// a display name that the server matches fuzzily.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum UserKey {
    /// Exact user code, sent as `usercode`.
    Code(String),
    /// Display name, sent as `user`.
    Name(String),
}

impl UserKey {
    /// Picks the lookup mode from a `fuzzy` flag.
    pub fn new(identifier: impl Into<String>, fuzzy: bool) -> Self {
        if fuzzy {
            Self::Name(identifier.into())
        } else {
            Self::Code(identifier.into())
        }
    }

    #[must_use]
    pub fn param(&self) -> &'static str {
        match self {
            Self::Code(_) => "usercode",
            Self::Name(_) => "user",
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Code(value) | Self::Name(value) => value,
        }
    }
}

/// Ordered query parameters of one request.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Query(Vec<(&'static str, String)>);

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    #[must_use]
    pub fn with_opt<V: ToString>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    #[must_use]
    pub fn with_user(self, user: &UserKey) -> Self {
        self.with(user.param(), user.value())
    }

    #[must_use]
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Percent-encodes the parameters as `key=value&key=value`.
    ///
    /// Spaces become `%20` rather than `+` so the result can be embedded in
    /// batch endpoint strings verbatim.
    #[must_use]
    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("{key}={}", encode_component(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Percent-encodes one query component.
///
/// `byte_serialize` escapes a literal `+` as `%2B`, so every `+` left in its
/// output stands for a space.
#[must_use]
pub fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
