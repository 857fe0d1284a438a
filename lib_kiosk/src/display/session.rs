//! # Display Session
//!
//! Wires one kiosk together: the arrival poller for the configured stop, the
//! content poller, the slide rotation and a composer task that republishes a
//! [`Frame`] whenever any of them changes.
//!
//! ## Workflow:
//! 1.  **Start**: both pollers fetch immediately; the rotation waits for the
//!     first content snapshot.
//! 2.  **Compose**: every arrivals, content or rotation change (and a one
//!     second clock tick for the header) produces a new frame on a `watch`
//!     channel. Identical frames are not republished.
//! 3.  **Stop**: all four loops are stopped in reverse order of dependency.
//!     Dropping the session instead cancels them through their handles.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::core::{FixedInterval, PollPolicy, TimerHandle};
use crate::display::composer::{compose, ComposeOptions, Frame};
use crate::ingestors::{
    ArrivalPoller, ArrivalState, ArrivalsSource, ContentPoller, ContentSource, ContentState,
    ARRIVALS_INTERVAL, CONTENT_INTERVAL,
};
use crate::scheduler::{spawn_rotation, RotationTiming, RotationView};

/// Period of the header clock refresh.
pub const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Everything a session needs besides its data sources.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Stop to display.
    pub stop_id: String,
    /// Arrivals refresh schedule.
    pub arrivals_policy: Arc<dyn PollPolicy>,
    /// Content refresh schedule.
    pub content_policy: Arc<dyn PollPolicy>,
    /// Slide timer settings.
    pub rotation: RotationTiming,
    /// Frame formatting settings.
    pub compose: ComposeOptions,
}

impl SessionConfig {
    /// Default schedules for `stop_id`.
    pub fn new(stop_id: impl Into<String>) -> Self {
        Self {
            stop_id: stop_id.into(),
            arrivals_policy: Arc::new(FixedInterval(ARRIVALS_INTERVAL)),
            content_policy: Arc::new(FixedInterval(CONTENT_INTERVAL)),
            rotation: RotationTiming::default(),
            compose: ComposeOptions::default(),
        }
    }
}

/// # Display Session
///
/// Owns every background loop of one kiosk display.
pub struct DisplaySession<A: ArrivalsSource> {
    arrivals: ArrivalPoller<A>,
    content: ContentPoller,
    rotation: TimerHandle,
    composer: TimerHandle,
    rotation_rx: watch::Receiver<RotationView>,
    frames: watch::Receiver<Frame>,
}

impl<A: ArrivalsSource> DisplaySession<A> {
    /// Starts all loops.
    pub fn start<C: ContentSource>(arrivals_source: Arc<A>, content_source: Arc<C>, config: SessionConfig) -> Self {
        log::info!("Starting display session for stop {}", config.stop_id);
        let arrivals = ArrivalPoller::start(arrivals_source, &config.stop_id, config.arrivals_policy);
        let content = ContentPoller::start(content_source, config.content_policy);
        let (rotation, rotation_rx) = spawn_rotation(content.subscribe(), config.rotation);

        let (composer, frames) = spawn_composer(
            arrivals.subscribe(),
            content.subscribe(),
            rotation_rx.clone(),
            config.compose,
        );

        Self { arrivals, content, rotation, composer, rotation_rx, frames }
    }

    /// A receiver for composed frames.
    pub fn frames(&self) -> watch::Receiver<Frame> {
        self.frames.clone()
    }

    /// The latest frame.
    pub fn current_frame(&self) -> Frame {
        self.frames.borrow().clone()
    }

    /// A receiver for content snapshots.
    pub fn content(&self) -> watch::Receiver<ContentState> {
        self.content.subscribe()
    }

    /// A receiver for arrival snapshots.
    pub fn arrivals(&self) -> watch::Receiver<ArrivalState> {
        self.arrivals.subscribe()
    }

    /// The latest rotation snapshot.
    pub fn rotation(&self) -> RotationView {
        self.rotation_rx.borrow().clone()
    }

    /// The stop being displayed.
    pub fn stop_id(&self) -> String {
        self.arrivals.stop_id()
    }

    /// Points the arrivals pane at another stop. Content and the rotation
    /// carry on undisturbed.
    pub async fn switch_stop(&mut self, stop_id: &str) {
        self.arrivals.switch_stop(stop_id).await;
    }

    /// Stops every loop and waits for them to exit.
    pub async fn stop(self) {
        self.composer.stop().await;
        self.rotation.stop().await;
        self.content.stop().await;
        self.arrivals.stop().await;
        log::info!("Display session stopped");
    }
}

fn spawn_composer(
    mut arrivals: watch::Receiver<ArrivalState>,
    mut content: watch::Receiver<ContentState>,
    mut rotation: watch::Receiver<RotationView>,
    options: ComposeOptions,
) -> (TimerHandle, watch::Receiver<Frame>) {
    let initial = compose(&arrivals.borrow(), &content.borrow(), &rotation.borrow(), Utc::now(), &options);
    let (tx, rx) = watch::channel(initial);

    let handle = TimerHandle::spawn("composer", move |token| async move {
        let mut clock = interval(CLOCK_TICK);
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut open = [true; 3];

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                changed = arrivals.changed(), if open[0] => { open[0] = changed.is_ok() }
                changed = content.changed(), if open[1] => { open[1] = changed.is_ok() }
                changed = rotation.changed(), if open[2] => { open[2] = changed.is_ok() }
                _ = clock.tick() => {}
            }

            let frame = compose(
                &arrivals.borrow_and_update(),
                &content.borrow_and_update(),
                &rotation.borrow_and_update(),
                Utc::now(),
                &options,
            );
            tx.send_if_modified(|current| {
                if *current == frame {
                    false
                } else {
                    *current = frame;
                    true
                }
            });
        }
        log::debug!("Frame composer stopped");
    });

    (handle, rx)
}
