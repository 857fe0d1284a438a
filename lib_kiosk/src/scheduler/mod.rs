//! # Slide Scheduler Module
//!
//! Rotates the ads-then-news slide sequence on the kiosk's right pane.
//!
//! ## Contained Modules:
//! - **`rotation`**: the `Idle` / `Showing` / `Transitioning` state machine.
//!   Pure and synchronous; it decides, the driver executes.
//! - **`driver`**: the spawned task that feeds content snapshots and timer
//!   events into the state machine and publishes `RotationView` snapshots.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Async timer driver for the rotation.
pub mod driver;
/// Rotation state machine.
pub mod rotation;

// --- Public API Re-exports ---
pub use driver::{spawn_rotation, RotationTiming};
pub use rotation::{Command, Phase, Rotation, RotationView, FADE_DURATION, PROGRESS_TICK};
