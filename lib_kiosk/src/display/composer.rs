//! # Frame Composer
//!
//! Turns the latest poller and rotation snapshots into a [`Frame`]: the full
//! content of both panes, already formatted, for a renderer to draw.
//!
//! ## Key Design Principles:
//! - **Pure**: `compose` reads its inputs and the wall clock it is given; it
//!   keeps nothing between calls.
//! - **Independent panes**: the arrivals pane and the slides pane are built by
//!   separate functions from separate inputs, so an error state in one never
//!   affects the other.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::alerts::AlertBanner;
use crate::ingestors::{ArrivalState, ContentState};
use crate::models::{Arrival, RgbColor, Slide, SlideKey};
use crate::scheduler::{Phase, RotationView};
use crate::utils::{format_minutes, ImageSource, MediaResolver, Urgency};

/// Default kiosk timezone.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Nicosia;

/// Which news translation the slides pane shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Greek only.
    El,
    /// English only, falling back to Greek when untranslated.
    En,
    /// Greek headline and body, followed by the English translation.
    #[default]
    Both,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "el" => Ok(Language::El),
            "en" => Ok(Language::En),
            "both" => Ok(Language::Both),
            other => Err(format!("unknown language '{other}' (expected el, en or both)")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::El => "el",
            Language::En => "en",
            Language::Both => "both",
        })
    }
}

/// Settings that shape a frame but never change while the kiosk runs.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    /// News language mode.
    pub language: Language,
    /// Timezone for the header clock and the last-updated footer.
    pub timezone: Tz,
    /// Image reference resolver.
    pub media: MediaResolver,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self { language: Language::default(), timezone: DEFAULT_TIMEZONE, media: MediaResolver::default() }
    }
}

/// Arrivals pane status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneStatus {
    /// First fetch still pending.
    Loading,
    /// First fetch failed and there is nothing to show.
    Error(String),
    /// Data is available (possibly stale).
    Ready,
}

/// One formatted arrival row.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalRow {
    /// Route number as published.
    pub route: String,
    /// Destination text.
    pub destination: String,
    /// Predicted time of day.
    pub arrival_time: String,
    /// Countdown text, e.g. `Now` or `7 min`.
    pub eta: String,
    /// Countdown color class.
    pub urgency: Urgency,
    /// Route badge background.
    pub badge: RgbColor,
    /// Route badge text.
    pub badge_text: RgbColor,
    /// Real-time vehicle rather than timetable.
    pub is_live: bool,
}

impl From<&Arrival> for ArrivalRow {
    fn from(arrival: &Arrival) -> Self {
        Self {
            route: arrival.route_short_name.clone(),
            destination: arrival.destination().to_string(),
            arrival_time: arrival.arrival_time.clone(),
            eta: format_minutes(arrival.time_left),
            urgency: Urgency::from_minutes(arrival.time_left),
            badge: arrival.badge_color(),
            badge_text: arrival.badge_text_color(),
            is_live: arrival.is_live,
        }
    }
}

/// Left pane: stop header, arrival rows and the alert banner.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalsPane {
    /// Stop being displayed.
    pub stop_id: String,
    /// Stop name, once known.
    pub stop_name: Option<String>,
    /// Local time `HH:MM`.
    pub clock: String,
    /// Rows in arrival order.
    pub rows: Vec<ArrivalRow>,
    /// Primary alert for this stop.
    pub banner: Option<AlertBanner>,
    /// Loading / error / ready.
    pub status: PaneStatus,
    /// `true` when the rows are from before a failed refresh.
    pub stale: bool,
    /// Local time of the last successful refresh, `HH:MM:SS`.
    pub last_updated: Option<String>,
}

/// Formatted text of the current slide.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideBody {
    /// An advertisement.
    Ad {
        /// Ad title.
        title: String,
        /// Sponsor line.
        advertiser: Option<String>,
        /// Target link.
        link: Option<String>,
    },
    /// A news item, in the configured language mode.
    News {
        /// Headline.
        headline: String,
        /// Body paragraphs.
        paragraphs: Vec<String>,
        /// Attribution.
        source: Option<String>,
    },
}

/// The slide currently on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideCard {
    /// Identity of the slide.
    pub key: SlideKey,
    /// Image to draw.
    pub image: ImageSource,
    /// Text to draw.
    pub body: SlideBody,
}

/// Right pane: current slide, progress and position.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidesPane {
    /// `None` when there is no content to rotate.
    pub card: Option<SlideCard>,
    /// Progress through the current slide, `0.0..=1.0`.
    pub progress: f32,
    /// One-based position of the current slide.
    pub position: usize,
    /// Number of slides.
    pub total: usize,
    /// `false` during the fade between slides.
    pub visible: bool,
}

impl SlidesPane {
    /// Position indicator text, `i/N`.
    pub fn position_label(&self) -> String {
        format!("{}/{}", self.position, self.total)
    }
}

/// Everything on screen at one moment.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Left pane.
    pub arrivals: ArrivalsPane,
    /// Right pane.
    pub slides: SlidesPane,
}

impl Frame {
    /// One-line plain text description, for log-only render mode.
    pub fn summary(&self) -> String {
        let a = &self.arrivals;
        let arrivals = match &a.status {
            PaneStatus::Loading => "loading".to_string(),
            PaneStatus::Error(message) => format!("error: {message}"),
            PaneStatus::Ready => a
                .rows
                .iter()
                .take(3)
                .map(|row| format!("{} {}", row.route, row.eta))
                .collect::<Vec<_>>()
                .join(", "),
        };
        let alert = a
            .banner
            .as_ref()
            .map(|b| format!(" | alert [{}] {}", b.severity(), b.primary.title))
            .unwrap_or_default();
        let slide = match &self.slides.card {
            None => "no content".to_string(),
            Some(card) => match &card.body {
                SlideBody::Ad { title, .. } => format!("ad \"{title}\""),
                SlideBody::News { headline, .. } => format!("news \"{headline}\""),
            },
        };
        format!(
            "{} stop {}: {}{}{} | slide {} {}",
            a.clock,
            a.stop_id,
            arrivals,
            if a.stale { " (stale)" } else { "" },
            alert,
            self.slides.position_label(),
            slide
        )
    }
}

/// Builds a frame from the latest snapshots.
pub fn compose(
    arrivals: &ArrivalState,
    content: &ContentState,
    rotation: &RotationView,
    now: DateTime<Utc>,
    options: &ComposeOptions,
) -> Frame {
    Frame {
        arrivals: compose_arrivals(arrivals, content, now, options),
        slides: compose_slides(rotation, options),
    }
}

/// Builds the arrivals pane.
pub fn compose_arrivals(
    state: &ArrivalState,
    content: &ContentState,
    now: DateTime<Utc>,
    options: &ComposeOptions,
) -> ArrivalsPane {
    let status = if state.loading {
        PaneStatus::Loading
    } else if !state.has_data() {
        PaneStatus::Error(state.error.clone().unwrap_or_else(|| "No arrival data".to_string()))
    } else {
        PaneStatus::Ready
    };

    let stop_routes = state
        .routes
        .iter()
        .map(|r| r.route_short_name.as_str())
        .chain(state.arrivals.iter().map(|a| a.route_short_name.as_str()));
    let banner = AlertBanner::for_stop(&content.alerts, &state.stop_id, stop_routes);

    ArrivalsPane {
        stop_id: state.stop_id.clone(),
        stop_name: state
            .stop_info
            .as_ref()
            .map(|info| info.stop_name.clone())
            .filter(|name| !name.is_empty()),
        clock: now.with_timezone(&options.timezone).format("%H:%M").to_string(),
        rows: state.arrivals.iter().map(ArrivalRow::from).collect(),
        banner,
        status,
        stale: state.has_data() && state.error.is_some(),
        last_updated: state
            .last_updated
            .map(|at| at.with_timezone(&options.timezone).format("%H:%M:%S").to_string()),
    }
}

/// Builds the slides pane.
pub fn compose_slides(rotation: &RotationView, options: &ComposeOptions) -> SlidesPane {
    let card = match rotation.phase {
        Phase::Idle => None,
        _ => rotation.slide.as_ref().map(|slide| slide_card(slide, options)),
    };
    SlidesPane {
        position: if card.is_some() { rotation.index + 1 } else { 0 },
        card,
        progress: rotation.progress.clamp(0.0, 1.0),
        total: rotation.total,
        visible: rotation.visible,
    }
}

fn slide_card(slide: &Slide, options: &ComposeOptions) -> SlideCard {
    let body = match slide {
        Slide::Ad(ad) => SlideBody::Ad {
            title: ad.title.clone(),
            advertiser: non_empty(ad.advertiser_name.as_deref()),
            link: non_empty(ad.link_url.as_deref()),
        },
        Slide::News(item) => {
            let (headline, paragraphs) = match options.language {
                Language::El => (item.title_el.clone(), vec![item.content_el.clone()]),
                Language::En => (item.title_secondary().to_string(), vec![item.content_secondary().to_string()]),
                Language::Both => {
                    let mut paragraphs = vec![item.content_el.clone()];
                    if item.title_secondary() != item.title_el {
                        paragraphs.push(item.title_secondary().to_string());
                    }
                    if item.content_secondary() != item.content_el {
                        paragraphs.push(item.content_secondary().to_string());
                    }
                    (item.title_el.clone(), paragraphs)
                }
            };
            SlideBody::News {
                headline,
                paragraphs: paragraphs.into_iter().filter(|p| !p.trim().is_empty()).collect(),
                source: non_empty(item.source.as_deref()),
            }
        }
    };

    SlideCard { key: slide.key(), image: options.media.resolve(slide.image_ref()), body }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ad, Alert, ContentResponse, NewsItem, StopInfo};
    use chrono::TimeZone;
    use std::sync::Arc;
    use url::Url;

    fn noon_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 9, 30, 0).unwrap()
    }

    fn ready_state() -> ArrivalState {
        let mut state = ArrivalState::loading("6300");
        state.loading = false;
        state.stop_info = Some(StopInfo { stop_id: "6300".into(), stop_name: "Makariou".into(), ..Default::default() });
        state.arrivals = Arc::from(vec![
            Arrival { route_short_name: "30".into(), time_left: 0, route_color: Some("#1E40AF".into()), ..Default::default() },
            Arrival { route_short_name: "Α1".into(), time_left: 4, trip_headsign: Some("Airport".into()), ..Default::default() },
            Arrival { route_short_name: "158".into(), time_left: 75, is_live: false, ..Default::default() },
        ]);
        state.last_updated = Some(noon_utc());
        state
    }

    fn content_with_alerts(alerts: Vec<Alert>) -> ContentState {
        ContentState::from_response(ContentResponse { alerts, ..Default::default() }, 1)
    }

    #[test]
    fn arrivals_rows_are_formatted_with_urgency_and_colors() {
        let pane = compose_arrivals(&ready_state(), &ContentState::default(), noon_utc(), &ComposeOptions::default());
        assert_eq!(pane.status, PaneStatus::Ready);
        assert_eq!(pane.stop_name.as_deref(), Some("Makariou"));
        // Nicosia is UTC+3 in summer.
        assert_eq!(pane.clock, "12:30");
        assert_eq!(pane.last_updated.as_deref(), Some("12:30:00"));

        let etas: Vec<&str> = pane.rows.iter().map(|r| r.eta.as_str()).collect();
        assert_eq!(etas, ["Now", "4 min", "1h 15m"]);
        assert_eq!(pane.rows[0].urgency, Urgency::Due);
        assert_eq!(pane.rows[0].badge, RgbColor { r: 0x1E, g: 0x40, b: 0xAF });
        assert_eq!(pane.rows[0].destination, crate::models::UNKNOWN_DESTINATION);
        assert_eq!(pane.rows[1].urgency, Urgency::Imminent);
        assert!(!pane.rows[2].is_live);
        assert!(!pane.stale);
    }

    #[test]
    fn error_state_only_without_prior_data() {
        let options = ComposeOptions::default();
        let mut first = ArrivalState::loading("6300");
        assert_eq!(compose_arrivals(&first, &ContentState::default(), noon_utc(), &options).status, PaneStatus::Loading);

        first.loading = false;
        first.error = Some("Unable to load arrivals: request timed out".into());
        let pane = compose_arrivals(&first, &ContentState::default(), noon_utc(), &options);
        assert!(matches!(pane.status, PaneStatus::Error(ref m) if m.contains("timed out")));
        assert!(pane.rows.is_empty());

        let mut later = ready_state();
        later.error = Some("Unable to load arrivals: server returned HTTP 502".into());
        let pane = compose_arrivals(&later, &ContentState::default(), noon_utc(), &options);
        assert_eq!(pane.status, PaneStatus::Ready);
        assert!(pane.stale);
        assert_eq!(pane.rows.len(), 3);
    }

    #[test]
    fn banner_shows_primary_and_flags_stop_routes() {
        let alerts = vec![
            Alert { id: 1, title: "Info".into(), severity: "info".to_string().into(), ..Default::default() },
            Alert {
                id: 2,
                title: "Diversion".into(),
                severity: "critical".to_string().into(),
                affected_stops: Some("6300,4338".into()),
                affected_routes: Some("A 1, 40".into()),
                ..Default::default()
            },
        ];
        let pane = compose_arrivals(&ready_state(), &content_with_alerts(alerts), noon_utc(), &ComposeOptions::default());
        let banner = pane.banner.expect("banner");
        assert_eq!(banner.primary.id, 2);
        assert_eq!(banner.more_label().as_deref(), Some("+1 more"));
        assert!(banner.affects_stop_routes);
    }

    #[test]
    fn idle_rotation_renders_an_empty_pane() {
        let pane = compose_slides(&RotationView::default(), &ComposeOptions::default());
        assert!(pane.card.is_none());
        assert_eq!(pane.position_label(), "0/0");
        assert!(pane.visible);
    }

    #[test]
    fn news_follows_language_mode() {
        let item = NewsItem {
            id: 9,
            title_el: "Τίτλος".into(),
            content_el: "Κείμενο".into(),
            title_en: Some("Title".into()),
            content_en: None,
            source: Some(" ".into()),
            ..Default::default()
        };
        let view = RotationView {
            phase: Phase::Showing,
            index: 1,
            total: 2,
            slide: Some(Slide::News(item)),
            progress: 0.25,
            visible: true,
        };

        let mut options = ComposeOptions { language: Language::En, ..Default::default() };
        let pane = compose_slides(&view, &options);
        assert_eq!(pane.position_label(), "2/2");
        let Some(SlideCard { body: SlideBody::News { headline, paragraphs, source }, image, .. }) = pane.card else {
            panic!("expected a news card");
        };
        assert_eq!(headline, "Title");
        assert_eq!(paragraphs, ["Κείμενο"]);
        assert_eq!(source, None);
        assert_eq!(image, ImageSource::Placeholder);

        options.language = Language::Both;
        let pane = compose_slides(&view, &options);
        let Some(SlideCard { body: SlideBody::News { headline, paragraphs, .. }, .. }) = pane.card else {
            panic!("expected a news card");
        };
        assert_eq!(headline, "Τίτλος");
        assert_eq!(paragraphs, ["Κείμενο", "Title"]);
    }

    #[test]
    fn ad_images_resolve_against_media_base() {
        let options = ComposeOptions {
            media: MediaResolver::new(Url::parse("http://cms.local/").ok()),
            ..Default::default()
        };
        let view = RotationView {
            phase: Phase::Transitioning,
            index: 0,
            total: 1,
            slide: Some(Slide::Ad(Ad { id: 3, title: "Coffee".into(), image_url: "/uploads/c.png".into(), ..Default::default() })),
            progress: 0.0,
            visible: false,
        };
        let pane = compose_slides(&view, &options);
        let card = pane.card.expect("card");
        assert_eq!(card.image, ImageSource::Remote(Url::parse("http://cms.local/uploads/c.png").unwrap()));
        assert!(!pane.visible);
    }

    #[test]
    fn summary_mentions_both_panes() {
        let frame = compose(
            &ready_state(),
            &ContentState::default(),
            &RotationView::default(),
            noon_utc(),
            &ComposeOptions::default(),
        );
        assert_eq!(frame.summary(), "12:30 stop 6300: 30 Now, Α1 4 min, 158 1h 15m | slide 0/0 no content");
    }

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!("EN".parse::<Language>(), Ok(Language::En));
        assert!("fr".parse::<Language>().is_err());
        assert_eq!(Language::Both.to_string(), "both");
    }
}
