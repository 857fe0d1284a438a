//! Data source seams for the pollers.
//!
//! The HTTP client in `retrieve` implements both traits; tests plug in
//! in-memory sources instead.

use std::future::Future;

use thiserror::Error;

use crate::models::{ArrivalsResponse, ContentResponse};

/// # Fetch Error
///
/// Why a single fetch produced no data. All variants are transient from the
/// kiosk's point of view: they are logged, shown as a stale marker, and the
/// next scheduled fetch runs as usual.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, reset, etc.
    #[error("network error: {0}")]
    Transport(String),

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("server returned HTTP {status}")]
    Status {
        /// Numeric HTTP status.
        status: u16,
        /// Response body, if it could be read.
        body: Option<String>,
    },

    /// The body was not the expected JSON.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The request URL could not be built.
    #[error("invalid request URL: {0}")]
    Url(String),
}

/// Provides per-stop arrival data.
pub trait ArrivalsSource: Send + Sync + 'static {
    /// Fetches `GET /arrivals/{stop_id}`.
    fn fetch_arrivals(
        &self,
        stop_id: &str,
    ) -> impl Future<Output = Result<ArrivalsResponse, FetchError>> + Send;
}

/// Provides the shared ad/news/alert inventory.
pub trait ContentSource: Send + Sync + 'static {
    /// Fetches `GET /content`.
    fn fetch_content(&self) -> impl Future<Output = Result<ContentResponse, FetchError>> + Send;
}
