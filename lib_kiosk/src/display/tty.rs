//! # Terminal Renderer
//!
//! Draws a [`Frame`] as colored text: the arrivals pane on top, the slide pane
//! below. Route badges use the route's own colors; countdowns use the urgency
//! palette.

use std::fmt::Write as _;

use colored::{ColoredString, Colorize};

use crate::display::composer::{ArrivalsPane, Frame, PaneStatus, SlideBody, SlidesPane};
use crate::models::{RgbColor, Severity};
use crate::utils::ImageSource;

/// Width of the slide progress bar, in cells.
pub const PROGRESS_WIDTH: usize = 40;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Renders a full screen, prefixed with the clear-screen sequence.
pub fn render_screen(frame: &Frame) -> String {
    format!("{CLEAR_SCREEN}{}", render_frame(frame))
}

/// Renders both panes.
pub fn render_frame(frame: &Frame) -> String {
    let mut out = render_arrivals(&frame.arrivals);
    out.push('\n');
    out.push_str(&render_slides(&frame.slides));
    out
}

fn paint(text: &str, fg: RgbColor, bg: Option<RgbColor>) -> ColoredString {
    let s = text.truecolor(fg.r, fg.g, fg.b);
    match bg {
        Some(bg) => s.on_truecolor(bg.r, bg.g, bg.b),
        None => s,
    }
}

/// Renders the arrivals pane.
pub fn render_arrivals(pane: &ArrivalsPane) -> String {
    let mut out = String::new();
    let name = pane.stop_name.as_deref().unwrap_or("");
    let _ = writeln!(out, "{} {} {}", format!("Stop {}", pane.stop_id).bold(), name.bold(), pane.clock.dimmed());

    if let Some(banner) = &pane.banner {
        let label = format!(" {} ", banner.severity().as_str().to_uppercase());
        let badge = match banner.severity() {
            Severity::Critical => label.bright_white().on_red(),
            Severity::Warning => label.black().on_yellow(),
            Severity::Info | Severity::Other(_) => label.bright_white().on_blue(),
        };
        let mut line = format!("{badge} {}", banner.primary.title.bold());
        if banner.affects_stop_routes {
            line.push_str(&format!(" {}", "(affects your routes)".italic()));
        }
        if let Some(more) = banner.more_label() {
            line.push_str(&format!(" {}", more.dimmed()));
        }
        let _ = writeln!(out, "{line}");
        if !banner.primary.message.is_empty() {
            let _ = writeln!(out, "  {}", banner.primary.message);
        }
    }

    match &pane.status {
        PaneStatus::Loading => {
            let _ = writeln!(out, "{}", "Loading arrivals...".dimmed());
        }
        PaneStatus::Error(message) => {
            let _ = writeln!(out, "{}", message.red());
        }
        PaneStatus::Ready if pane.rows.is_empty() => {
            let _ = writeln!(out, "{}", "No upcoming arrivals".dimmed());
        }
        PaneStatus::Ready => {
            for row in &pane.rows {
                let badge = paint(&format!(" {:<4}", row.route), row.badge_text, Some(row.badge));
                let eta = paint(&format!("{:>8}", row.eta), row.urgency.color(), None).bold();
                let live = if row.is_live { "●".green() } else { "○".dimmed() };
                let _ = writeln!(out, "{badge} {live} {:<28} {} {}", row.destination, row.arrival_time.dimmed(), eta);
            }
        }
    }

    let mut footer = String::new();
    if let Some(at) = &pane.last_updated {
        footer.push_str(&format!("Updated {at}"));
    }
    if pane.stale {
        footer.push_str(" (stale)");
    }
    if !footer.is_empty() {
        let _ = writeln!(out, "{}", footer.dimmed());
    }
    out
}

/// Renders the slides pane.
pub fn render_slides(pane: &SlidesPane) -> String {
    let mut out = String::new();
    let Some(card) = &pane.card else {
        let _ = writeln!(out, "{}", "No announcements".dimmed());
        return out;
    };

    if pane.visible {
        let image = match &card.image {
            ImageSource::Remote(url) => format!("[image {url}]"),
            ImageSource::Placeholder => "[image unavailable]".to_string(),
        };
        let _ = writeln!(out, "{}", image.dimmed());
        match &card.body {
            SlideBody::Ad { title, advertiser, link } => {
                let _ = writeln!(out, "{}", title.bold());
                if let Some(advertiser) = advertiser {
                    let _ = writeln!(out, "{}", advertiser.italic());
                }
                if let Some(link) = link {
                    let _ = writeln!(out, "{}", link.underline());
                }
            }
            SlideBody::News { headline, paragraphs, source } => {
                let _ = writeln!(out, "{}", headline.bold());
                for paragraph in paragraphs {
                    let _ = writeln!(out, "{paragraph}");
                }
                if let Some(source) = source {
                    let _ = writeln!(out, "Source: {}", source.italic());
                }
            }
        }
    } else {
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "{} {}", progress_bar(pane.progress, PROGRESS_WIDTH), position_dots(pane));
    out
}

/// A bar of `width` cells, `progress` of them filled.
pub fn progress_bar(progress: f32, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn position_dots(pane: &SlidesPane) -> String {
    (1..=pane.total)
        .map(|i| if i == pane.position { "●" } else { "·" })
        .collect::<Vec<_>>()
        .join("")
}
