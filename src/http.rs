//! HTTP transport for the BotArcApi.
//!
//! This module provides a wrapper around `reqwest::Client` that adds:
//! * A total request timeout taken from [`Config`]
//! * Optional client-side rate limiting
//! * Consistent headers
//!
//! One client is built per API client instance and reused for all of its
//! requests. Requests are never retried.

use std::{future::Future, num::NonZeroU32, time::Duration};

use futures_util::{future::Either, FutureExt, TryFutureExt};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{header::HeaderMap, Method, Url};

use crate::{config::Config, error::Result};

/// HTTP client with an optional rate limiter in front.
pub struct Client {
    /// Unlimited request client for special cases.
    ///
    /// Direct access to underlying client without rate limiting.
    pub unlimited: reqwest::Client,

    /// Throttle applied before each request, if configured.
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

impl Client {
    /// Duration to keep idle connections alive.
    ///
    /// Prevents frequent reconnection overhead for subsequent requests.
    const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Creates a new client from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built, for instance when
    /// no TLS backend can be initialized.
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .tcp_keepalive(Self::KEEPALIVE_TIMEOUT)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            unlimited: http_client,
            rate_limiter: config.rate_limit.map(Self::rate_limiter),
        })
    }

    fn rate_limiter(per_second: NonZeroU32) -> DefaultDirectRateLimiter {
        governor::RateLimiter::direct(Quota::per_second(per_second))
    }

    /// Builds a request with query parameters and extra headers.
    ///
    /// # Errors
    ///
    /// Returns error if the query cannot be encoded.
    pub fn request(
        &self,
        method: Method,
        url: Url,
        query: &[(&'static str, String)],
        headers: Option<HeaderMap>,
    ) -> Result<reqwest::Request> {
        let mut builder = self.unlimited.request(method, url).query(query);
        if let Some(headers) = headers {
            builder = builder.headers(headers);
        }

        builder.build().map_err(Into::into)
    }

    /// Executes a request, waiting for the rate limiter first if there is
    /// one.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or times out.
    pub fn execute(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response>> + '_ {
        let throttle = match self.rate_limiter {
            Some(ref limiter) => Either::Left(limiter.until_ready()),
            None => Either::Right(futures_util::future::ready(())),
        };

        throttle.then(move |()| self.unlimited.execute(request).map_err(Into::into))
    }
}
