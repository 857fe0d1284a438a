//! # Project Test Support
//!
//! Shared fixtures for the workspace integration tests under `tests/`: a local
//! HTTP server for exercising the real client, and scripted in-memory sources
//! for running a whole display session on virtual time.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder for consistency
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Scripted arrivals and content sources.
pub mod fakes;
/// Thread-backed mock HTTP server.
pub mod mock_http;

use lib_kiosk::models::{Ad, Alert, Arrival, ArrivalsResponse, NewsItem, StopInfo};

/// An arrivals body for `stop_id` with one row per `(route, minutes)`.
pub fn arrivals(stop_id: &str, rows: &[(&str, i64)]) -> ArrivalsResponse {
    ArrivalsResponse {
        stop_info: Some(StopInfo { stop_id: stop_id.to_string(), stop_name: format!("Stop {stop_id}"), ..Default::default() }),
        arrivals: rows
            .iter()
            .map(|(route, minutes)| Arrival {
                route_short_name: route.to_string(),
                time_left: *minutes,
                trip_headsign: Some("Center".to_string()),
                ..Default::default()
            })
            .collect(),
        routes: Vec::new(),
    }
}

/// An ad with a display duration.
pub fn ad(id: i64, seconds: i64) -> Ad {
    Ad { id, title: format!("Ad {id}"), image_url: format!("/uploads/ad{id}.png"), duration_seconds: Some(seconds), ..Default::default() }
}

/// A news item with a display duration.
pub fn news(id: i64, seconds: i64) -> NewsItem {
    NewsItem { id, title_el: format!("Είδηση {id}"), content_el: "Κείμενο".to_string(), duration_seconds: Some(seconds), ..Default::default() }
}

/// An alert with the given severity and stop list.
pub fn alert(id: i64, severity: &str, stops: Option<&str>) -> Alert {
    Alert {
        id,
        title: format!("Alert {id}"),
        message: String::new(),
        severity: severity.to_string().into(),
        affected_routes: None,
        affected_stops: stops.map(str::to_string),
    }
}
