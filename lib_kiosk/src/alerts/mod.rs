//! # Alerts Module
//!
//! Narrows the global alert inventory down to what one stop should show and
//! picks the single alert that gets the banner.
//!
//! ## Contained Modules:
//! - **`prioritizer`**: stop filtering, severity ranking and the banner model
//!   with its suppressed-alert count.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Stop filtering, severity ranking and banner construction.
pub mod prioritizer;

pub use prioritizer::{pick_primary, select_stop_alerts, AlertBanner};
