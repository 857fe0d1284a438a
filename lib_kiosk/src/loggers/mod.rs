//! # Loggers Module
//!
//! File and console logging for the display binary, built on `fern` behind the
//! `log` facade. The library itself only ever calls `log` macros.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Implements a local logger with file rotation and optional stdout output.
pub mod loggerlocal;

// --- Public API Re-exports ---
pub use loggerlocal::{
    build_dispatch, log_file_path, parse_level, rotate_logs, setup_logging, LoggerError, LoggerLocalOptions,
};
