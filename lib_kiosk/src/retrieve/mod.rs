//! # Data Retrieval Module
//!
//! HTTP access to the kiosk backend.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: `ApiClient`, a `reqwest` client bound to the backend's
//!   base URL. It implements both `ArrivalsSource` (`GET arrivals/{stopId}`)
//!   and `ContentSource` (`GET content`), and can `HEAD`-probe image URLs.
//!
//! Pollers depend only on the source traits, so everything above this module
//! can be exercised without a network.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Backend API client.
pub mod ky_http;

// --- Public API Re-exports ---
pub use ky_http::{ApiClient, ApiResponse, USER_AGENT};
