//! Server-level information: client updates and the connect code.

use serde::{Deserialize, Serialize};

/// Latest client version and where to download it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Update {
    pub url: String,
    pub version: String,
}

/// Content of v3 and v4 `connect`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectKey {
    pub key: String,
}
