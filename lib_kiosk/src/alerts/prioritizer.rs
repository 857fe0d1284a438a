//! # Alert Prioritizer
//!
//! Only the top-ranked alert is ever shown. When several are active the banner
//! carries a `+N more` badge instead of cycling through them.

use std::collections::HashSet;

use crate::models::{Alert, Severity};
use crate::utils::text::{normalize_route_name, split_list};

/// Keeps the alerts that apply to `stop_id`.
///
/// An alert applies when its affected-stop list is absent or empty (a global
/// alert), or when one comma separated token equals `stop_id` exactly. Tokens
/// are not trimmed: `"4338, 6300"` does not list `"6300"`.
pub fn select_stop_alerts(all: &[Alert], stop_id: &str) -> Vec<Alert> {
    all.iter()
        .filter(|alert| applies_to_stop(alert, stop_id))
        .cloned()
        .collect()
}

fn applies_to_stop(alert: &Alert, stop_id: &str) -> bool {
    match alert.affected_stops.as_deref() {
        None | Some("") => true,
        Some(stops) => stops.split(',').any(|token| token == stop_id),
    }
}

/// Returns the most severe alert; earlier alerts win ties.
pub fn pick_primary(alerts: &[Alert]) -> Option<Alert> {
    let mut ranked: Vec<&Alert> = alerts.iter().collect();
    // `sort_by_key` is stable, which gives the tie-break by list order.
    ranked.sort_by_key(|alert| alert.severity.rank());
    ranked.first().map(|alert| (*alert).clone())
}

/// # Alert Banner
///
/// What the arrivals pane overlays: the primary alert plus how many others
/// are hidden behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertBanner {
    /// The alert being shown.
    pub primary: Alert,
    /// Active alerts not shown (`total - 1`).
    pub suppressed: usize,
    /// `true` when the alert names a route that serves this stop.
    pub affects_stop_routes: bool,
}

impl AlertBanner {
    /// Builds the banner for one stop from the full inventory.
    ///
    /// `stop_routes` are the route names seen at the stop; they are only used
    /// to flag route-specific alerts.
    pub fn for_stop<'a>(
        all: &[Alert],
        stop_id: &str,
        stop_routes: impl IntoIterator<Item = &'a str>,
    ) -> Option<Self> {
        let relevant = select_stop_alerts(all, stop_id);
        let primary = pick_primary(&relevant)?;
        let routes: HashSet<String> = stop_routes.into_iter().map(normalize_route_name).collect();
        let affects_stop_routes = primary
            .affected_routes
            .as_deref()
            .map(|list| split_list(list).any(|r| routes.contains(&normalize_route_name(r))))
            .unwrap_or(false);

        Some(Self {
            primary,
            suppressed: relevant.len() - 1,
            affects_stop_routes,
        })
    }

    /// Badge text for hidden alerts, e.g. `+2 more`.
    pub fn more_label(&self) -> Option<String> {
        (self.suppressed > 0).then(|| format!("+{} more", self.suppressed))
    }

    /// Severity of the shown alert.
    pub fn severity(&self) -> &Severity {
        &self.primary.severity
    }
}
