use std::{fs, num::NonZeroU32, path::Path, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

/// Settings shared by every request of one client.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Config {
    /// Root of the API, always ending in `/`.
    pub base_url: Url,

    /// Total time allowed for one request.
    pub timeout: Duration,

    pub user_agent: String,

    /// Requests per second; `None` leaves requests unthrottled.
    pub rate_limit: Option<NonZeroU32>,
}

/// On-disk form of [`Config`].
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_url: Url,
    timeout_ms: Option<u64>,
    rate_limit: Option<NonZeroU32>,
}

impl Config {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

    /// Configuration files are tiny; anything larger is refused.
    const MAX_FILE_SIZE: u64 = 4096;

    #[must_use]
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url: Self::normalize(base_url),
            timeout: Self::DEFAULT_TIMEOUT,
            user_agent: Self::user_agent(),
            rate_limit: None,
        }
    }

    /// Parses `base_url` and builds a configuration around it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `base_url` is not an absolute URL.
    pub fn parse(base_url: &str) -> Result<Self> {
        Ok(Self::with_base_url(base_url.parse()?))
    }

    /// Loads a configuration from a TOML file:
    ///
    /// ```toml
    /// base_url = "https://example.org/botarcapi/"
    /// timeout_ms = 10000
    /// rate_limit = 5
    /// ```
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is larger than 4 KiB, or
    /// does not match the format above.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file_size = fs::metadata(path)?.len();
        if file_size > Self::MAX_FILE_SIZE {
            return Err(Error::invalid_argument(format!(
                "{} is too large",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        contents.parse()
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_rate_limit(mut self, per_second: Option<NonZeroU32>) -> Self {
        self.rate_limit = per_second;
        self
    }

    /// Relative endpoint paths are joined under the base URL, which only
    /// works when the base path ends in a slash.
    fn normalize(mut base_url: Url) -> Url {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        base_url
    }

    /// Builds the `User-Agent` from the package and operating system.
    ///
    /// # Panics
    ///
    /// Panics if the package name or version contain `/` or `;`.
    fn user_agent() -> String {
        let app_name = env!("CARGO_PKG_NAME");
        let app_version = env!("CARGO_PKG_VERSION");

        let illegal_chars = |chr| chr == '/' || chr == ';';
        assert!(
            !(app_name.is_empty()
                || app_name.contains(illegal_chars)
                || app_version.is_empty()
                || app_version.contains(illegal_chars)),
            "application name and/or version invalid (\"{app_name}\"; \"{app_version}\")"
        );

        let os_name = std::env::consts::OS;
        let os_version = sysinfo::System::os_version()
            .filter(|version| !version.is_empty() && !version.contains(illegal_chars))
            .unwrap_or_else(|| String::from("0"));

        let user_agent = format!("{app_name}/{app_version} (Rust; {os_name}/{os_version})");
        trace!("user agent: {user_agent}");

        user_agent
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(s)?;

        let mut config = Self::with_base_url(file.base_url).with_rate_limit(file.rate_limit);
        if let Some(timeout_ms) = file.timeout_ms {
            config.timeout = Duration::from_millis(timeout_ms);
        }

        Ok(config)
    }
}
