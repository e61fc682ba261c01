//! The endpoint invoker shared by every API version.
//!
//! Each operation is described by one request record implementing
//! [`Endpoint`]: its path below the base URL, its HTTP verb, the type of
//! its content, and the query it sends. [`Gateway::call`] issues the
//! request and unwraps the [`Envelope`].

use std::{borrow::Cow, fmt::Debug};

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, Url,
};
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::{Error, Result},
    http::Client as HttpClient,
    protocol::{self, Envelope, Query},
};

/// One API operation.
pub trait Endpoint {
    /// Path relative to the base URL, including any version prefix.
    const PATH: &'static str;

    /// HTTP verb of the operation.
    const METHOD: Method;

    /// Type of the envelope's `content`.
    type Content: DeserializeOwned + Debug;

    /// Query parameters to send.
    fn query(&self) -> Query;

    /// Path of this particular request. Only passthrough endpoints, whose
    /// path is chosen by the caller, differ from [`Endpoint::PATH`].
    fn path(&self) -> Cow<'_, str> {
        Cow::Borrowed(Self::PATH)
    }

    fn method(&self) -> Method {
        Self::METHOD
    }
}

pub struct Gateway {
    http_client: HttpClient,
    base_url: Url,
}

impl Gateway {
    /// Creates the gateway and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http_client: HttpClient::new(config)?,
            base_url: config.base_url.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Calls `endpoint` and resolves with the envelope's content.
    ///
    /// # Errors
    ///
    /// * transport errors as classified by [`Error`]
    /// * `Rejected` if the envelope reports a failure
    /// * `Unavailable` if the body is not an envelope and the HTTP status
    ///   is not a success
    pub async fn call<E>(&self, endpoint: &E) -> Result<E::Content>
    where
        E: Endpoint,
    {
        self.call_with_headers(endpoint, None).await
    }

    /// Calls `endpoint` with an `Authorization: Bearer` header.
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::call`], plus `InvalidArgument` if `token` cannot
    /// be put in a header.
    pub async fn call_authorized<E>(&self, endpoint: &E, token: &str) -> Result<E::Content>
    where
        E: Endpoint,
    {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );

        self.call_with_headers(endpoint, Some(headers)).await
    }

    async fn call_with_headers<E>(
        &self,
        endpoint: &E,
        headers: Option<HeaderMap>,
    ) -> Result<E::Content>
    where
        E: Endpoint,
    {
        let path = endpoint.path();
        let response = self.send(endpoint, headers).await?;
        let status = response.status();
        let body = response.text().await?;

        match protocol::json::<Envelope<E::Content>>(&body, &path) {
            Ok(envelope) => envelope.into_content(),
            Err(_) if !status.is_success() => Err(Error::unavailable(format!(
                "{path} returned HTTP {status}"
            ))),
            Err(e) => Err(e),
        }
    }

    /// Calls an endpoint that answers with a binary body on success and a
    /// JSON envelope on failure, told apart by `Content-Type`.
    ///
    /// # Errors
    ///
    /// * transport errors as classified by [`Error`]
    /// * `Rejected` if the server answered with a failure envelope
    /// * `DataLoss` if the server answered with JSON that is no envelope
    pub async fn fetch_binary<E>(&self, endpoint: &E) -> Result<Vec<u8>>
    where
        E: Endpoint,
    {
        let path = endpoint.path();
        let response = self.send(endpoint, None).await?;

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));

        if is_json {
            let body = response.text().await?;
            let envelope = protocol::json::<Envelope<serde_json::Value>>(&body, &path)
                .map_err(|e| Error::data_loss(format!("{path}: {e}")))?;

            return Err(match envelope.failure() {
                Some(failure) => Error::rejected(failure),
                None => Error::data_loss(format!("{path} returned JSON instead of data")),
            });
        }

        if let Err(e) = response.error_for_status_ref() {
            return Err(e.into());
        }

        let bytes = response.bytes().await?;
        trace!("{path}: {} bytes", bytes.len());

        Ok(bytes.to_vec())
    }

    async fn send<E>(&self, endpoint: &E, headers: Option<HeaderMap>) -> Result<reqwest::Response>
    where
        E: Endpoint,
    {
        // Check the URL early to not needlessly hit the rate limiter.
        let url = self.base_url.join(&endpoint.path())?;
        let method = endpoint.method();
        let query = endpoint.query();
        debug!("{method} {url} {:?}", query.pairs());

        let request = self
            .http_client
            .request(method, url, query.pairs(), headers)?;

        self.http_client.execute(request).await
    }
}
