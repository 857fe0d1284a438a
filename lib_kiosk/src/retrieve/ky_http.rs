//! # HTTP Retrieval Utilities
//!
//! An asynchronous API client around `reqwest` for the kiosk backend. It joins
//! endpoint paths onto a base URL, applies a per-request timeout and maps every
//! failure onto [`FetchError`].
//!
//! There are no retries here: the pollers call again on their own schedule.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::ingestors::{ArrivalsSource, ContentSource, FetchError};
use crate::models::{ArrivalsResponse, ContentResponse};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("lib_kiosk/", env!("CARGO_PKG_VERSION"));

/// A standardized container for API responses.
///
/// Wraps the raw body together with the status so that failed responses can
/// still report what the server said.
#[derive(Debug)]
pub struct ApiResponse {
    /// The response body, if it could be read.
    pub body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
}

impl ApiResponse {
    /// Decodes a successful body, or turns the response into a `FetchError`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, FetchError> {
        if !self.success {
            return Err(FetchError::Status { status: self.status, body: self.body });
        }
        let body = self.body.unwrap_or_default();
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// # Api Client
///
/// Base URL plus a configured `reqwest::Client`. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The underlying client.
    inner: Client,
    /// The base URL to which all endpoint paths are joined.
    base_url: Url,
}

impl ApiClient {
    /// Creates a client for `base_url` (e.g. `http://localhost:8000/api/`).
    ///
    /// # Errors
    /// `FetchError::Url` if the base URL is not absolute, `FetchError::Transport`
    /// if the TLS backend cannot be initialised.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|e| FetchError::Url(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Url(format!("{base_url} cannot be used as a base URL")));
        }

        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { inner, base_url })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `{base}/{segments...}`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Url(format!("{} cannot be used as a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Performs one request and captures status and body.
    ///
    /// # Errors
    /// Network failures and timeouts. Non-2xx statuses are not errors at this
    /// level; they are reported through `ApiResponse::success`.
    pub async fn request(&self, method: Method, url: Url) -> Result<ApiResponse, FetchError> {
        let response = self.inner.request(method, url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.text().await.ok();

        Ok(ApiResponse { body, status: status.as_u16(), success: status.is_success() })
    }

    /// `GET` an endpoint and decode its JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, FetchError> {
        let url = self.endpoint(segments)?;
        log::trace!("GET {}", url);
        self.request(Method::GET, url).await?.into_json()
    }

    /// `HEAD` an absolute URL; `true` when it answers with a 2xx status.
    pub async fn head_ok(&self, url: &Url) -> Result<bool, FetchError> {
        let response = self.inner.head(url.clone()).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        // Some media servers do not implement HEAD; treat that as reachable.
        Ok(status.is_success() || status == StatusCode::METHOD_NOT_ALLOWED)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_decode() {
        FetchError::Decode(e.to_string())
    } else {
        FetchError::Transport(e.to_string())
    }
}

impl ArrivalsSource for ApiClient {
    async fn fetch_arrivals(&self, stop_id: &str) -> Result<ArrivalsResponse, FetchError> {
        self.get_json(&["arrivals", stop_id]).await
    }
}

impl ContentSource for ApiClient {
    async fn fetch_content(&self) -> Result<ContentResponse, FetchError> {
        self.get_json(&["content"]).await
    }
}
