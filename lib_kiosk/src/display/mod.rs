//! # Display Module
//!
//! Everything between the data loops and the screen.
//!
//! ## Contained Modules:
//! - **`composer`**: pure `compose()` from snapshots to a two-pane `Frame`.
//! - **`session`**: `DisplaySession`, which owns the pollers, the rotation and
//!   the composer task for one kiosk.
//! - **`tty`** (feature `tty`): a colored terminal renderer for frames.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Frame composition.
pub mod composer;
/// Session wiring.
pub mod session;
/// Terminal rendering.
#[cfg(feature = "tty")]
pub mod tty;

// --- Public API Re-exports ---
pub use composer::{
    compose, compose_arrivals, compose_slides, ArrivalRow, ArrivalsPane, ComposeOptions, Frame, Language, PaneStatus,
    SlideBody, SlideCard, SlidesPane, DEFAULT_TIMEZONE,
};
pub use session::{DisplaySession, SessionConfig, CLOCK_TICK};
