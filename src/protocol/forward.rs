//! Forwarding tokens.
//!
//! The forward endpoints lend out a game account for a limited time. The
//! token they return authorizes proxied requests through that account and
//! must be passed back as `Authorization: Bearer <token>`.
//!
//! # Example Response
//!
//! ```json
//! {
//!     "access_token": "secret_token",
//!     "valid_time": 3600
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{formats::Flexible, serde_as, DurationSeconds};
use veil::Redact;

/// An allocated forwarding token.
#[serde_as]
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, Redact, Hash)]
pub struct ForwardToken {
    #[redact]
    pub access_token: String,

    /// How long the token remains valid.
    #[serde_as(as = "DurationSeconds<u64, Flexible>")]
    pub valid_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_redacted_in_debug() {
        let token: ForwardToken =
            serde_json::from_str(r#"{"access_token":"hunter2","valid_time":600}"#).unwrap();

        assert_eq!(token.valid_time, Duration::from_secs(600));
        assert!(!format!("{token:?}").contains("hunter2"));
    }
}
