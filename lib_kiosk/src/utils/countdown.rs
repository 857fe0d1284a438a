//! Countdown formatting for the arrivals pane.

use crate::models::RgbColor;

/// How close a bus is, for coloring the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// At the stop or overdue (`minutes <= 0`).
    Due,
    /// Arriving within five minutes.
    Imminent,
    /// Further away.
    Scheduled,
}

impl Urgency {
    /// Classifies minutes until arrival.
    pub fn from_minutes(minutes: i64) -> Self {
        match minutes {
            m if m <= 0 => Urgency::Due,
            1..=5 => Urgency::Imminent,
            _ => Urgency::Scheduled,
        }
    }

    /// Display color as hex.
    pub fn color_hex(self) -> &'static str {
        match self {
            Urgency::Due => "DC2626",
            Urgency::Imminent => "F59E0B",
            Urgency::Scheduled => "16A34A",
        }
    }

    /// Display color as RGB.
    pub fn color(self) -> RgbColor {
        match self {
            Urgency::Due => RgbColor { r: 0xDC, g: 0x26, b: 0x26 },
            Urgency::Imminent => RgbColor { r: 0xF5, g: 0x9E, b: 0x0B },
            Urgency::Scheduled => RgbColor { r: 0x16, g: 0xA3, b: 0x4A },
        }
    }
}

/// Formats minutes until arrival: `Now`, `7 min`, or `1h 05m` past an hour.
pub fn format_minutes(minutes: i64) -> String {
    match minutes {
        m if m <= 0 => "Now".to_string(),
        m if m < 60 => format!("{m} min"),
        m => format!("{}h {:02}m", m / 60, m % 60),
    }
}
