//! # Utilities Module
//!
//! Small, pure helpers shared by the composer and the prioritizer.
//!
//! ## Contained Modules:
//!
//! - **`countdown`**: converts "minutes remaining" into display text and an
//!   urgency level with its color.
//! - **`text`**: route name normalization and comma-list splitting.
//! - **`media`**: resolves image references against the media base URL and
//!   remembers images that failed to load.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Countdown text and urgency colors for arrival rows.
pub mod countdown;
/// Image reference resolution with placeholder fallback.
pub mod media;
/// Route name normalization and list splitting.
pub mod text;

pub use countdown::{format_minutes, Urgency};
pub use media::{ImageSource, MediaResolver};
pub use text::{normalize_route_name, split_list};
