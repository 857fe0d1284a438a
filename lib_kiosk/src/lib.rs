//! # lib_kiosk
//!
//! Display orchestration for bus-stop kiosks. A kiosk shows live arrival
//! countdowns for one stop next to a rotating carousel of ads and news, with
//! the most severe active service alert overlaid on the arrivals.
//!
//! ## Module Map:
//! - **`models`**: wire types for the arrivals and content endpoints, and the
//!   `Slide` union.
//! - **`utils`**: countdown formatting, route name normalization, image
//!   reference resolution.
//! - **`alerts`**: per-stop alert filtering and primary alert selection.
//! - **`core`**: owned timer handles, poll policies and the poll loop.
//! - **`ingestors`**: the arrival and content pollers.
//! - **`scheduler`**: the slide rotation state machine and its driver.
//! - **`display`**: frame composition and the `DisplaySession` that wires
//!   everything together.
//! - **`retrieve`** (feature `retrieve`): the HTTP client for the backend.
//! - **`loggers`** (feature `loggers`): the `fern` file/console logger.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod alerts;
pub mod core;
pub mod display;
pub mod ingestors;
#[cfg(feature = "loggers")]
pub mod loggers;
pub mod models;
#[cfg(feature = "retrieve")]
pub mod retrieve;
pub mod scheduler;
pub mod utils;

// --- Public API Re-exports ---
pub use display::{DisplaySession, Frame, SessionConfig};
pub use ingestors::{ArrivalsSource, ContentSource, FetchError};
