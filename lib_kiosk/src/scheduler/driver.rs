//! # Rotation Driver
//!
//! Runs a [`Rotation`] against real timers. The driver owns at most one
//! progress interval and one fade timeout; every [`Command`] returned by the
//! state machine cancels both before arming the next one, so a state never
//! has stray timers from a previous state.
//!
//! ## Inputs:
//! - **Content snapshots** from the content poller's `watch` channel. The
//!   slide sequence is rebuilt (ads first, then news) whenever the inventory
//!   revision changes.
//! - **Progress ticks** every [`PROGRESS_TICK`]; the elapsed time is measured,
//!   not assumed, so a late tick still accounts its real delay.
//! - **Fade completion** after [`FADE_DURATION`].

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior, Sleep};

use crate::core::TimerHandle;
use crate::ingestors::ContentState;
use crate::models::build_slides;
use crate::scheduler::rotation::{Command, Rotation, RotationView, FADE_DURATION, PROGRESS_TICK};

/// Timer settings for the rotation. Tests shrink these; the kiosk uses the
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationTiming {
    /// Progress tick period.
    pub tick: Duration,
    /// Fade window between slides.
    pub fade: Duration,
}

impl Default for RotationTiming {
    fn default() -> Self {
        Self { tick: PROGRESS_TICK, fade: FADE_DURATION }
    }
}

#[derive(Default)]
struct Timers {
    progress: Option<(u64, Interval, Instant)>,
    fade: Option<(u64, Pin<Box<Sleep>>)>,
}

impl Timers {
    fn apply(&mut self, command: Command, timing: RotationTiming) {
        self.progress = None;
        self.fade = None;
        match command {
            Command::StartShowing { epoch } => {
                let start = Instant::now();
                let mut interval = interval_at(start + timing.tick, timing.tick);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.progress = Some((epoch, interval, start));
            }
            Command::StartFade { epoch } => {
                self.fade = Some((epoch, Box::pin(sleep(timing.fade))));
            }
            Command::StopAll => {}
        }
    }
}

/// Resolves to `(epoch, dt)` on the next progress tick; pends forever when no
/// progress timer is armed.
async fn next_tick(progress: &mut Option<(u64, Interval, Instant)>) -> (u64, Duration) {
    match progress.as_mut() {
        Some((epoch, interval, last)) => {
            let now = interval.tick().await;
            let dt = now.saturating_duration_since(*last);
            *last = now;
            (*epoch, dt)
        }
        None => pending().await,
    }
}

/// Resolves to the fade's epoch when it completes; pends forever when no fade
/// is armed.
async fn fade_done(fade: &mut Option<(u64, Pin<Box<Sleep>>)>) -> u64 {
    match fade.as_mut() {
        Some((epoch, timeout)) => {
            timeout.as_mut().await;
            *epoch
        }
        None => pending().await,
    }
}

/// Spawns the rotation driven by `content`. Returns the owned handle and a
/// receiver of rotation snapshots.
pub fn spawn_rotation(
    mut content: watch::Receiver<ContentState>,
    timing: RotationTiming,
) -> (TimerHandle, watch::Receiver<RotationView>) {
    let (view_tx, view_rx) = watch::channel(RotationView::default());

    let handle = TimerHandle::spawn("rotation", move |token| async move {
        let mut rotation = Rotation::new();
        let mut timers = Timers::default();
        let mut revision = None;
        let mut content_open = true;

        loop {
            let current = content.borrow_and_update().clone();
            if revision != Some(current.revision) {
                revision = Some(current.revision);
                if let Some(command) = rotation.set_slides(build_slides(&current.ads, &current.news)) {
                    timers.apply(command, timing);
                }
            }
            view_tx.send_if_modified(|view| {
                let next = rotation.view();
                if *view == next {
                    false
                } else {
                    *view = next;
                    true
                }
            });

            tokio::select! {
                biased;

                _ = token.cancelled() => break,

                changed = content.changed(), if content_open => {
                    if changed.is_err() {
                        log::debug!("Content channel closed; rotating the last known slides");
                        content_open = false;
                    }
                }

                epoch = fade_done(&mut timers.fade) => {
                    timers.fade = None;
                    if let Some(command) = rotation.finish_fade(epoch) {
                        timers.apply(command, timing);
                    }
                }

                (epoch, dt) = next_tick(&mut timers.progress) => {
                    if let Some(command) = rotation.tick(epoch, dt) {
                        timers.apply(command, timing);
                    }
                }
            }
        }
        log::debug!("Slide rotation stopped");
    });

    (handle, view_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ad, ContentResponse, NewsItem, SlideKey};
    use crate::scheduler::rotation::Phase;

    fn inventory(ads: &[i64], news: &[i64], revision: u64) -> ContentState {
        let response = ContentResponse {
            ads: ads
                .iter()
                .enumerate()
                .map(|(i, d)| Ad { id: i as i64 + 1, duration_seconds: Some(*d), ..Default::default() })
                .collect(),
            news: news
                .iter()
                .enumerate()
                .map(|(i, d)| NewsItem { id: i as i64 + 1, duration_seconds: Some(*d), ..Default::default() })
                .collect(),
            alerts: Vec::new(),
        };
        ContentState::from_response(response, revision)
    }

    fn key(view: &RotationView) -> Option<SlideKey> {
        view.slide.as_ref().map(|s| s.key())
    }

    #[tokio::test(start_paused = true)]
    async fn rotates_with_per_slide_durations_and_fades() {
        let (tx, rx) = watch::channel(inventory(&[10, 15], &[12], 1));
        let (handle, views) = spawn_rotation(rx, RotationTiming::default());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(key(&views.borrow()), Some(SlideKey::Ad(1)));

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        let half = views.borrow().progress;
        assert!((0.45..=0.55).contains(&half), "progress {half}");

        // 10 s show, then hidden for the fade.
        tokio::time::sleep(Duration::from_millis(5_200)).await;
        assert!(!views.borrow().visible);
        assert_eq!(views.borrow().phase, Phase::Transitioning);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(key(&views.borrow()), Some(SlideKey::Ad(2)));
        assert!(views.borrow().visible);

        // Ad 2 for 15 s, then the news item.
        tokio::time::sleep(Duration::from_millis(15_600)).await;
        assert_eq!(key(&views.borrow()), Some(SlideKey::News(1)));

        tokio::time::sleep(Duration::from_millis(12_600)).await;
        assert_eq!(key(&views.borrow()), Some(SlideKey::Ad(1)));

        drop(tx);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn content_refreshes_mid_slide_do_not_speed_up_the_rotation() {
        let (tx, rx) = watch::channel(inventory(&[10], &[], 1));
        let (handle, views) = spawn_rotation(rx, RotationTiming::default());

        // Two resizing refreshes restart the slide; the last restart is at 5 s.
        tokio::time::sleep(Duration::from_secs(3)).await;
        tx.send_replace(inventory(&[10, 10], &[], 2));
        tokio::time::sleep(Duration::from_secs(2)).await;
        tx.send_replace(inventory(&[10, 10, 10], &[], 3));

        tokio::time::sleep(Duration::from_secs(1)).await;
        let progress = views.borrow().progress;
        assert!((0.09..=0.11).contains(&progress), "progress {progress}");

        // Same slides under a new revision: nothing restarts.
        tokio::time::sleep(Duration::from_secs(1)).await;
        tx.send_replace(inventory(&[10, 10, 10], &[], 4));

        tokio::time::sleep(Duration::from_millis(7_900)).await;
        let late = views.borrow().clone();
        assert_eq!((late.phase, late.index), (Phase::Showing, 0));
        assert!(late.progress >= 0.95, "progress {}", late.progress);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(views.borrow().phase, Phase::Transitioning);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn empty_inventory_goes_idle_and_resumes() {
        let (tx, rx) = watch::channel(inventory(&[10, 10], &[], 1));
        let (handle, views) = spawn_rotation(rx, RotationTiming::default());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(views.borrow().total, 2);

        tx.send_replace(inventory(&[], &[], 2));
        tokio::time::sleep(Duration::from_millis(100)).await;
        let idle = views.borrow().clone();
        assert_eq!((idle.phase, idle.total, idle.slide.is_none()), (Phase::Idle, 0, true));

        // Nothing moves while idle.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(views.borrow().phase, Phase::Idle);

        tx.send_replace(inventory(&[], &[12, 12], 3));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(key(&views.borrow()), Some(SlideKey::News(1)));
        assert_eq!(views.borrow().index, 0);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_the_rotation() {
        let (_tx, rx) = watch::channel(inventory(&[1, 1], &[], 1));
        let (handle, views) = spawn_rotation(rx, RotationTiming::default());
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.stop().await;

        let frozen = views.borrow().clone();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*views.borrow(), frozen);
    }
}
