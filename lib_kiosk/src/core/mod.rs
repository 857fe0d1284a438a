//! # Core Engine Module
//!
//! The scheduling primitives every kiosk component is built on.
//!
//! ## Core Components:
//!
//! - **`timer`**: `TimerHandle`, the owned, cancel-on-drop handle of a spawned
//!   background loop. Every periodic operation in the engine is one.
//!
//! - **`policy`**: `PollPolicy` and its two strategies, `FixedInterval` (the
//!   default) and `CappedBackoff`.
//!
//! - **`poller`**: `spawn_poller`, the self-scheduling fetch loop shared by the
//!   arrival and content pollers, with wall-clock scheduling and newest-wins
//!   result ordering.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Fixed and backoff poll scheduling strategies.
pub mod policy;
/// The shared self-scheduling fetch loop.
pub mod poller;
/// Owned, cancel-on-drop handles for background loops.
pub mod timer;

// --- Public API Re-exports ---
pub use policy::{CappedBackoff, FixedInterval, PollPolicy};
pub use poller::spawn_poller;
pub use timer::TimerHandle;
