//! # Data Ingestors Module
//!
//! The two self-scheduling pollers that bring data into the kiosk. They run
//! independently of each other, on very different cadences.
//!
//! ## Contained Modules:
//! - **`arrival_poller`**: per-stop arrival countdowns, every 30 seconds by
//!   default, with loading/error/success state.
//! - **`content_poller`**: the shared ad/news/alert inventory, every 5 minutes
//!   by default.
//! - **`source`**: the `ArrivalsSource` / `ContentSource` traits the pollers
//!   fetch through, and the `FetchError` they report.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Per-stop arrival polling.
pub mod arrival_poller;
/// Shared content inventory polling.
pub mod content_poller;
/// Data source traits and fetch errors.
pub mod source;

use std::time::Duration;

/// Default arrivals refresh period.
pub const ARRIVALS_INTERVAL: Duration = Duration::from_secs(30);
/// Default content refresh period.
pub const CONTENT_INTERVAL: Duration = Duration::from_secs(300);

// --- Public API Re-exports ---
pub use arrival_poller::{ArrivalPoller, ArrivalState};
pub use content_poller::{ContentPoller, ContentState};
pub use source::{ArrivalsSource, ContentSource, FetchError};
