//! # Arrival Poller
//!
//! Keeps the arrivals pane fed for one stop.
//!
//! ## Key Design Principles:
//! - **Stale beats blank**: a failed refresh records an error message but
//!   keeps the last good `arrivals` and `stop_info` on screen.
//! - **One stop at a time**: switching stops stops the old loop before the new
//!   one starts, and every result is checked against the stop id it was
//!   requested for, so a late answer for the previous stop is discarded.
//! - **Latest value**: state is published through a `watch` channel; readers
//!   only ever see whole snapshots.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::core::{spawn_poller, PollPolicy, TimerHandle};
use crate::ingestors::source::{ArrivalsSource, FetchError};
use crate::models::{Arrival, ArrivalsResponse, RouteInfo, StopInfo};

/// Snapshot of the arrivals pane data for one stop.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalState {
    /// The stop this snapshot belongs to.
    pub stop_id: String,
    /// Stop identity from the last successful fetch.
    pub stop_info: Option<StopInfo>,
    /// Arrivals from the last successful fetch, soonest first.
    pub arrivals: Arc<[Arrival]>,
    /// Routes serving the stop, from the last successful fetch.
    pub routes: Arc<[RouteInfo]>,
    /// Message of the most recent failure; cleared by the next success.
    pub error: Option<String>,
    /// `true` until the first fetch for this stop has completed.
    pub loading: bool,
    /// When the last successful fetch was applied.
    pub last_updated: Option<DateTime<Utc>>,
}

impl ArrivalState {
    /// Empty state for a stop whose first fetch is pending.
    pub fn loading(stop_id: &str) -> Self {
        Self {
            stop_id: stop_id.to_string(),
            stop_info: None,
            arrivals: Arc::from(Vec::new()),
            routes: Arc::from(Vec::new()),
            error: None,
            loading: true,
            last_updated: None,
        }
    }

    /// `true` once any fetch for this stop has succeeded.
    pub fn has_data(&self) -> bool {
        self.last_updated.is_some()
    }

    fn apply_success(&mut self, response: ArrivalsResponse) {
        let mut arrivals = response.arrivals;
        arrivals.sort_by_key(|a| a.time_left);

        if response.stop_info.is_some() {
            self.stop_info = response.stop_info;
        }
        self.arrivals = Arc::from(arrivals);
        self.routes = Arc::from(response.routes);
        self.error = None;
        self.loading = false;
        self.last_updated = Some(Utc::now());
    }

    fn apply_failure(&mut self, error: &FetchError) {
        self.error = Some(format!("Unable to load arrivals: {error}"));
        self.loading = false;
    }
}

/// # Arrival Poller
///
/// Owns the refresh loop for the current stop and the channel its snapshots
/// are published on.
pub struct ArrivalPoller<S: ArrivalsSource> {
    source: Arc<S>,
    policy: Arc<dyn PollPolicy>,
    state: Arc<watch::Sender<ArrivalState>>,
    handle: Option<TimerHandle>,
}

impl<S: ArrivalsSource> ArrivalPoller<S> {
    /// Starts polling `stop_id`: one fetch now, then on the policy's schedule.
    pub fn start(source: Arc<S>, stop_id: &str, policy: Arc<dyn PollPolicy>) -> Self {
        let (tx, _) = watch::channel(ArrivalState::loading(stop_id));
        let mut poller = Self {
            source,
            policy,
            state: Arc::new(tx),
            handle: None,
        };
        poller.handle = Some(poller.spawn_loop(stop_id));
        poller
    }

    /// A receiver for state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<ArrivalState> {
        self.state.subscribe()
    }

    /// The current snapshot.
    pub fn current(&self) -> ArrivalState {
        self.state.borrow().clone()
    }

    /// The stop currently being polled.
    pub fn stop_id(&self) -> String {
        self.state.borrow().stop_id.clone()
    }

    /// Switches to another stop. The old loop is stopped first; the pane is
    /// reset to loading because the previous stop's data does not apply.
    pub async fn switch_stop(&mut self, stop_id: &str) {
        if self.state.borrow().stop_id == stop_id {
            return;
        }
        if let Some(old) = self.handle.take() {
            old.stop().await;
        }
        log::info!("Arrival poller switching to stop {}", stop_id);
        self.state.send_replace(ArrivalState::loading(stop_id));
        self.handle = Some(self.spawn_loop(stop_id));
    }

    /// Stops polling and waits for the loop to exit.
    pub async fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop().await;
        }
    }

    fn spawn_loop(&self, stop_id: &str) -> TimerHandle {
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let fetch_stop = stop_id.to_string();
        let apply_stop = stop_id.to_string();

        spawn_poller(
            format!("arrivals[{stop_id}]"),
            Arc::clone(&self.policy),
            move || {
                let source = Arc::clone(&source);
                let stop_id = fetch_stop.clone();
                async move { source.fetch_arrivals(&stop_id).await }
            },
            move |result| {
                state.send_if_modified(|current| {
                    if current.stop_id != apply_stop {
                        log::debug!("Discarding arrivals for superseded stop {}", apply_stop);
                        return false;
                    }
                    match result {
                        Ok(response) => {
                            log::debug!("Stop {}: {} arrivals", apply_stop, response.arrivals.len());
                            current.apply_success(response);
                        }
                        Err(e) => {
                            log::warn!("Arrivals refresh failed for stop {}: {}", apply_stop, e);
                            current.apply_failure(&e);
                        }
                    }
                    true
                });
            },
        )
    }
}
