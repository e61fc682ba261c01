//! Batch plans and batch results.
//!
//! A batch plan is an ordered list of calls that the server executes as one
//! unit. Later calls can use values produced by earlier ones: a call
//! declares placeholders in its `bind` map, each pointing at a field of its
//! own result, and later endpoints reference them as `$name`. Substitution
//! happens on the server; this client only builds and checks the plan.
//!
//! # Wire Format
//!
//! Plan, sent as the `calls` parameter of `v4/batch`:
//! ```json
//! [
//!     { "id": 0, "bind": { "$sid": "song_id" }, "endpoint": "user/best?usercode=000000001&songname=gl&difficulty=2" },
//!     { "id": 1, "endpoint": "song/info?songname=$sid" }
//! ]
//! ```
//!
//! Results, in no particular order:
//! ```json
//! [
//!     { "id": 1, "result": { "status": 0, "content": { ... } } },
//!     { "id": 0, "result": { "status": 0, "content": { ... } } }
//! ]
//! ```

use std::{
    collections::HashSet,
    fmt,
    ops::Deref,
    str::FromStr,
    sync::LazyLock,
};

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use thiserror::Error;

use super::{Envelope, Query};
use crate::error::{Error, Result};

/// Identifier of a call within one plan.
pub type CallId = u32;

/// Matches placeholder references such as `$sid` or `$31`.
static PLACEHOLDER_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z0-9_]+)").expect("invalid placeholder pattern"));

/// A named value that the server substitutes into later endpoints.
///
/// Stored without the leading `$`; [`Display`](fmt::Display) renders the
/// token as it appears on the wire.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Placeholder(String);

impl Placeholder {
    /// Creates a placeholder from its bare name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` unless `name` is a non-empty run of ASCII
    /// letters, digits and underscores.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty()
            || !name
                .chars()
                .all(|chr| chr.is_ascii_alphanumeric() || chr == '_')
        {
            return Err(Error::invalid_argument(format!(
                "invalid placeholder name \"{name}\""
            )));
        }

        Ok(Self(name))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl FromStr for Placeholder {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.strip_prefix('$') {
            Some(name) => Self::new(name),
            None => Err(Error::invalid_argument(format!(
                "placeholder \"{s}\" does not start with '$'"
            ))),
        }
    }
}

/// Dot and bracket path into a call's own result, such as
/// `best30_list[3].song_id`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(pub String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }
}

impl Deref for FieldPath {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One call of a batch plan.
#[serde_as]
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BatchCall {
    pub id: CallId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<serde_with::Map<DisplayFromStr, _>>")]
    pub bind: Option<Vec<(Placeholder, FieldPath)>>,

    /// Path relative to the API version root, with query string.
    pub endpoint: String,
}

impl BatchCall {
    /// Creates a call of `path` with literal, percent-encoded parameters.
    #[must_use]
    pub fn new(id: CallId, path: &str, query: &Query) -> Self {
        let endpoint = if query.is_empty() {
            path.to_owned()
        } else {
            format!("{path}?{}", query.encode())
        };

        Self {
            id,
            bind: None,
            endpoint,
        }
    }

    /// Creates a call of `path` whose only parameter `key` is filled in by
    /// the server from `placeholder`.
    #[must_use]
    pub fn bound(id: CallId, path: &str, key: &str, placeholder: &Placeholder) -> Self {
        Self {
            id,
            bind: None,
            endpoint: format!("{path}?{key}={placeholder}"),
        }
    }

    /// Declares `placeholder` as the value at `path` in this call's result.
    #[must_use]
    pub fn with_binding(mut self, placeholder: Placeholder, path: FieldPath) -> Self {
        self.bind
            .get_or_insert_with(Vec::new)
            .push((placeholder, path));
        self
    }

    /// Sends an empty `bind` map instead of leaving it out.
    #[must_use]
    pub fn with_empty_bind(mut self) -> Self {
        self.bind.get_or_insert_with(Vec::new);
        self
    }

    /// Placeholders declared by this call, in declaration order.
    pub fn declared(&self) -> impl Iterator<Item = &Placeholder> {
        self.bind.iter().flatten().map(|(placeholder, _)| placeholder)
    }

    /// Bare names of the placeholders referenced by the endpoint.
    pub fn referenced(&self) -> impl Iterator<Item = &str> {
        PLACEHOLDER_REFERENCE
            .captures_iter(&self.endpoint)
            .filter_map(|captures| captures.get(1))
            .map(|name| name.as_str())
    }
}

/// Ways in which a plan can be malformed.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum PlanError {
    #[error("call id {0} is used more than once")]
    DuplicateId(CallId),

    #[error("call {id} references ${name} before any earlier call binds it")]
    UnboundPlaceholder { id: CallId, name: String },

    #[error("call {id} binds {placeholder} which is already bound")]
    DuplicatePlaceholder { id: CallId, placeholder: Placeholder },
}

/// An ordered sequence of batch calls.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchPlan(Vec<BatchCall>);

impl BatchPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, call: BatchCall) {
        self.0.push(call);
    }

    #[must_use]
    pub fn calls(&self) -> &[BatchCall] {
        &self.0
    }

    /// Mutable access to the call with `id`.
    pub fn call_mut(&mut self, id: CallId) -> Option<&mut BatchCall> {
        self.0.iter_mut().find(|call| call.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks that ids are unique and that every placeholder referenced by
    /// a call was bound by an earlier call.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in plan order.
    pub fn validate(&self) -> std::result::Result<(), PlanError> {
        let mut ids = HashSet::new();
        let mut bound = HashSet::new();

        for call in &self.0 {
            if !ids.insert(call.id) {
                return Err(PlanError::DuplicateId(call.id));
            }

            if let Some(name) = call.referenced().find(|name| !bound.contains(*name)) {
                return Err(PlanError::UnboundPlaceholder {
                    id: call.id,
                    name: name.to_owned(),
                });
            }

            for placeholder in call.declared() {
                if !bound.insert(placeholder.name()) {
                    return Err(PlanError::DuplicatePlaceholder {
                        id: call.id,
                        placeholder: placeholder.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Serializes the plan into the `calls` parameter.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails, which it does not for plans
    /// built through this type.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }
}

impl From<Vec<BatchCall>> for BatchPlan {
    fn from(calls: Vec<BatchCall>) -> Self {
        Self(calls)
    }
}

impl FromIterator<BatchCall> for BatchPlan {
    fn from_iter<I: IntoIterator<Item = BatchCall>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Decodes a plan from its JSON form.
impl FromStr for BatchPlan {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        serde_json::from_str(s).map_err(Into::into)
    }
}

/// Result of one batch call, matched to its call by `id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub id: CallId,
    pub result: Envelope<serde_json::Value>,
}
