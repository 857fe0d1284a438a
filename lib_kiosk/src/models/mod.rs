//! # Wire Models
//!
//! Typed mirrors of the two JSON documents the kiosk consumes:
//! `GET /arrivals/{stopId}` and `GET /content`.
//!
//! ## Decoding Rules:
//! - Every optional field decodes from either a missing key or an explicit
//!   `null`. Missing data is never a decode error; defaults are applied by the
//!   accessor methods (route colors, destinations, durations, translations).
//! - Alert severities are kept as a closed enum plus an `Other` bucket, so an
//!   unknown severity string survives a round trip and ranks like `info`.
//!
//! The `slide` submodule builds the tagged `Slide` union the rotation scheduler
//! consumes.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The merged ad/news slide type and the default duration rules.
pub mod slide;

pub use slide::{build_slides, Slide, SlideKey, AD_DEFAULT_SECONDS, NEWS_DEFAULT_SECONDS};

/// Route badge background when the backend has no GTFS color.
pub const DEFAULT_ROUTE_COLOR: &str = "FFFFFF";
/// Route badge text color when the backend has no GTFS color.
pub const DEFAULT_ROUTE_TEXT_COLOR: &str = "000000";
/// Destination shown when the trip headsign is unknown.
pub const UNKNOWN_DESTINATION: &str = "Unknown Destination";

/// Treats an explicit JSON `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// # Stop Info
///
/// Identity of the stop being displayed. Used for the header only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StopInfo {
    /// The stop identifier, e.g. `"6300"`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub stop_id: String,
    /// Human readable stop name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub stop_name: String,
    /// Latitude, when the backend knows the stop.
    #[serde(default)]
    pub stop_lat: Option<f64>,
    /// Longitude, when the backend knows the stop.
    #[serde(default)]
    pub stop_lon: Option<f64>,
}

/// # Arrival
///
/// One predicted or scheduled bus arrival. Arrivals carry no identity across
/// polls; each poll replaces the whole list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Arrival {
    /// Public route number, e.g. `"30"` or `"Α1"`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub route_short_name: String,
    /// Predicted time of day, `HH:MM` or `HH:MM:SS`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub arrival_time: String,
    /// Minutes until arrival. Zero or negative means the bus is due now.
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_left: i64,
    /// GTFS route id, when the backend could match the route.
    #[serde(default)]
    pub route_id: Option<String>,
    /// Destination text.
    #[serde(default)]
    pub trip_headsign: Option<String>,
    /// Route badge background color as hex without `#`.
    #[serde(default)]
    pub route_color: Option<String>,
    /// Route badge text color as hex without `#`.
    #[serde(default)]
    pub route_text_color: Option<String>,
    /// `true` for vehicles tracked in real time, `false` for timetable estimates.
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_live: bool,
}

fn default_true() -> bool {
    true
}

fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

impl Arrival {
    /// Destination text, or a fixed placeholder when the headsign is missing.
    pub fn destination(&self) -> &str {
        match self.trip_headsign.as_deref() {
            Some(h) if !h.trim().is_empty() => h,
            _ => UNKNOWN_DESTINATION,
        }
    }

    /// Parsed badge background color.
    pub fn badge_color(&self) -> RgbColor {
        RgbColor::parse_or(self.route_color.as_deref(), DEFAULT_ROUTE_COLOR)
    }

    /// Parsed badge text color.
    pub fn badge_text_color(&self) -> RgbColor {
        RgbColor::parse_or(self.route_text_color.as_deref(), DEFAULT_ROUTE_TEXT_COLOR)
    }
}

/// A route serving the stop, as listed next to the arrivals.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteInfo {
    /// GTFS route id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub route_id: String,
    /// Public route number.
    #[serde(default, deserialize_with = "null_as_default")]
    pub route_short_name: String,
    /// Long route name.
    #[serde(default)]
    pub route_long_name: Option<String>,
}

/// Body of `GET /arrivals/{stopId}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrivalsResponse {
    /// The stop the arrivals belong to.
    #[serde(default)]
    pub stop_info: Option<StopInfo>,
    /// Upcoming arrivals.
    #[serde(default, deserialize_with = "null_as_default")]
    pub arrivals: Vec<Arrival>,
    /// Routes serving the stop.
    #[serde(default, deserialize_with = "null_as_default")]
    pub routes: Vec<RouteInfo>,
}

/// # Ad
///
/// An advertisement slide.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ad {
    /// Backend identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    /// Title shown under the image.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Absolute URL or path relative to the media base URL.
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    /// Optional click-through link, shown as text on the kiosk.
    #[serde(default)]
    pub link_url: Option<String>,
    /// Optional advertiser name.
    #[serde(default)]
    pub advertiser_name: Option<String>,
    /// Display time in whole seconds. Zero or missing means the ad default.
    #[serde(default)]
    pub duration_seconds: Option<i64>,
}

/// # News Item
///
/// A bilingual government announcement. Greek is the primary language.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewsItem {
    /// Backend identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    /// Greek title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title_el: String,
    /// Greek body.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_el: String,
    /// English title.
    #[serde(default)]
    pub title_en: Option<String>,
    /// English body.
    #[serde(default)]
    pub content_en: Option<String>,
    /// Optional image reference.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Attribution, e.g. "Ministry of Transport".
    #[serde(default)]
    pub source: Option<String>,
    /// Display time in whole seconds. Zero or missing means the news default.
    #[serde(default)]
    pub duration_seconds: Option<i64>,
}

impl NewsItem {
    /// English title, falling back to the Greek one.
    pub fn title_secondary(&self) -> &str {
        non_empty(self.title_en.as_deref()).unwrap_or(&self.title_el)
    }

    /// English body, falling back to the Greek one.
    pub fn content_secondary(&self) -> &str {
        non_empty(self.content_en.as_deref()).unwrap_or(&self.content_el)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// # Severity
///
/// Alert severity. Ordering for display is given by [`Severity::rank`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    /// Service is disrupted.
    Critical,
    /// Service is degraded.
    Warning,
    /// Informational notice.
    #[default]
    Info,
    /// A severity this kiosk does not know; ranked like `Info`.
    Other(String),
}

impl Severity {
    /// Rank used for primary alert selection: lower is more important.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
            Severity::Info | Severity::Other(_) => 2,
        }
    }

    /// Wire spelling.
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "warning" => Severity::Warning,
            "info" => Severity::Info,
            _ => Severity::Other(value),
        }
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Alert
///
/// A service disruption notice. Alerts without an affected-stop list apply to
/// every stop.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Alert {
    /// Backend identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    /// Short headline.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Full text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    /// Severity level.
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: Severity,
    /// Comma separated route ids or names.
    #[serde(default)]
    pub affected_routes: Option<String>,
    /// Comma separated stop ids.
    #[serde(default)]
    pub affected_stops: Option<String>,
}

/// Body of `GET /content`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentResponse {
    /// Active ads in display order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ads: Vec<Ad>,
    /// Active news in display order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub news: Vec<NewsItem>,
    /// Active alerts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub alerts: Vec<Alert>,
}

/// An sRGB color parsed from a GTFS hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl RgbColor {
    /// Parses `RRGGBB` or `#RRGGBB`.
    pub fn parse(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    fn parse_or(hex: Option<&str>, fallback: &str) -> Self {
        hex.and_then(Self::parse)
            .or_else(|| Self::parse(fallback))
            .unwrap_or(Self { r: 0, g: 0, b: 0 })
    }
}
