//! # Slide Rotation State Machine
//!
//! The timer-free core of the slide pane. It owns the slide sequence and the
//! current index, and tells its driver which timers to run through
//! [`Command`]s.
//!
//! ## States:
//! - **Idle**: no slides. Leaves as soon as a non-empty sequence arrives.
//! - **Showing(i)**: slide `i` is visible; progress ticks accumulate until the
//!   slide's duration is reached.
//! - **Transitioning(i)**: slide `i` is hidden for the fade window, then the
//!   machine enters `Showing((i + 1) mod N)`.
//!
//! ## Epochs:
//! Every state entry bumps `epoch`. Tick and fade events carry the epoch of the
//! state that armed them; events from any other epoch are ignored, so a timer
//! that slipped past cancellation can never move the rotation.

use std::sync::Arc;
use std::time::Duration;

use crate::models::Slide;

/// Granularity of the progress tick.
pub const PROGRESS_TICK: Duration = Duration::from_millis(50);
/// Length of the fade window between slides.
pub const FADE_DURATION: Duration = Duration::from_millis(500);

/// Rotation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing to show.
    Idle,
    /// The current slide is visible.
    Showing,
    /// The current slide is fading out.
    Transitioning,
}

/// Timer instructions for the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Cancel all timers, then run the progress tick for `epoch`.
    StartShowing {
        /// Epoch the ticks must carry.
        epoch: u64,
    },
    /// Cancel all timers, then arm the fade timeout for `epoch`.
    StartFade {
        /// Epoch the fade completion must carry.
        epoch: u64,
    },
    /// Cancel all timers.
    StopAll,
}

/// Read-only snapshot for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationView {
    /// Current phase.
    pub phase: Phase,
    /// Index of the current slide; 0 when idle.
    pub index: usize,
    /// Number of slides in the active sequence.
    pub total: usize,
    /// The current slide, if any.
    pub slide: Option<Slide>,
    /// Progress through the current slide, `0.0..=1.0`.
    pub progress: f32,
    /// `false` while fading out.
    pub visible: bool,
}

impl Default for RotationView {
    fn default() -> Self {
        Self { phase: Phase::Idle, index: 0, total: 0, slide: None, progress: 0.0, visible: true }
    }
}

/// # Rotation
///
/// Slide sequence, index, elapsed time and pending sequence swap.
#[derive(Debug)]
pub struct Rotation {
    slides: Arc<[Slide]>,
    pending: Option<Arc<[Slide]>>,
    phase: Phase,
    index: usize,
    elapsed: Duration,
    duration: Duration,
    epoch: u64,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::new()
    }
}

impl Rotation {
    /// An idle rotation with no slides.
    pub fn new() -> Self {
        Self {
            slides: Arc::from(Vec::new()),
            pending: None,
            phase: Phase::Idle,
            index: 0,
            elapsed: Duration::ZERO,
            duration: Duration::ZERO,
            epoch: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current index, always `< len` unless idle.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Epoch of the current state.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of slides in the active sequence.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// `true` when the active sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// The slide at the current index.
    pub fn current(&self) -> Option<&Slide> {
        match self.phase {
            Phase::Idle => None,
            _ => self.slides.get(self.index),
        }
    }

    /// Progress through the current slide. Zero outside `Showing`.
    pub fn progress(&self) -> f32 {
        if self.phase != Phase::Showing || self.duration.is_zero() {
            return 0.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> RotationView {
        RotationView {
            phase: self.phase,
            index: self.index,
            total: self.slides.len(),
            slide: self.current().cloned(),
            progress: self.progress(),
            visible: self.phase != Phase::Transitioning,
        }
    }

    /// Installs a new sequence after a content refresh.
    ///
    /// During a fade the swap is deferred until the fade ends. While showing,
    /// the index is clamped to the new length; the state is re-entered when
    /// the length or the current slide changed.
    pub fn set_slides(&mut self, slides: Arc<[Slide]>) -> Option<Command> {
        match self.phase {
            Phase::Transitioning => {
                self.pending = Some(slides);
                None
            }
            Phase::Idle => {
                self.slides = slides;
                if self.slides.is_empty() {
                    None
                } else {
                    Some(self.enter_showing(0))
                }
            }
            Phase::Showing => {
                if *self.slides == *slides {
                    return None;
                }
                let before = self.slides.get(self.index).cloned();
                let resized = slides.len() != self.slides.len();
                self.slides = slides;

                if self.slides.is_empty() {
                    return Some(self.enter_idle());
                }
                let clamped = self.index.min(self.slides.len() - 1);
                let same_slide = before.as_ref() == self.slides.get(clamped);
                if resized || clamped != self.index || !same_slide {
                    Some(self.enter_showing(clamped))
                } else {
                    None
                }
            }
        }
    }

    /// Accounts one progress tick of `dt` armed for `epoch`.
    pub fn tick(&mut self, epoch: u64, dt: Duration) -> Option<Command> {
        if self.phase != Phase::Showing || epoch != self.epoch {
            return None;
        }
        self.elapsed = (self.elapsed + dt).min(self.duration);
        if self.elapsed >= self.duration {
            self.phase = Phase::Transitioning;
            self.epoch += 1;
            log::trace!("Fading out slide {}", self.index);
            Some(Command::StartFade { epoch: self.epoch })
        } else {
            None
        }
    }

    /// Completes the fade armed for `epoch` and shows the next slide.
    ///
    /// A sequence that arrived during the fade is installed first. If it is
    /// shorter than the old index the rotation wraps to the first slide.
    pub fn finish_fade(&mut self, epoch: u64) -> Option<Command> {
        if self.phase != Phase::Transitioning || epoch != self.epoch {
            return None;
        }
        if let Some(slides) = self.pending.take() {
            self.slides = slides;
        }
        if self.slides.is_empty() {
            return Some(self.enter_idle());
        }
        let next = if self.index + 1 >= self.slides.len() { 0 } else { self.index + 1 };
        Some(self.enter_showing(next))
    }

    fn enter_showing(&mut self, index: usize) -> Command {
        self.phase = Phase::Showing;
        self.index = index;
        self.elapsed = Duration::ZERO;
        self.duration = self.slides[index].duration();
        self.epoch += 1;
        log::debug!(
            "Showing slide {}/{}: {} for {}s",
            index + 1,
            self.slides.len(),
            self.slides[index].label(),
            self.duration.as_secs()
        );
        Command::StartShowing { epoch: self.epoch }
    }

    fn enter_idle(&mut self) -> Command {
        self.phase = Phase::Idle;
        self.index = 0;
        self.elapsed = Duration::ZERO;
        self.duration = Duration::ZERO;
        self.epoch += 1;
        log::debug!("Slide rotation idle: no content");
        Command::StopAll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{build_slides, Ad, NewsItem, SlideKey};

    fn ads(durations: &[i64]) -> Vec<Ad> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| Ad { id: i as i64 + 1, duration_seconds: Some(*d), ..Default::default() })
            .collect()
    }

    fn news(durations: &[i64]) -> Vec<NewsItem> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| NewsItem { id: i as i64 + 1, duration_seconds: Some(*d), ..Default::default() })
            .collect()
    }

    fn epoch_of(cmd: Option<Command>) -> u64 {
        match cmd {
            Some(Command::StartShowing { epoch }) | Some(Command::StartFade { epoch }) => epoch,
            other => panic!("expected a timer command, got {other:?}"),
        }
    }

    /// Ticks until the fade starts; returns the number of ticks taken.
    fn run_until_fade(rotation: &mut Rotation, epoch: u64) -> (u32, u64) {
        let mut ticks = 0;
        loop {
            ticks += 1;
            if let Some(cmd) = rotation.tick(epoch, PROGRESS_TICK) {
                return (ticks, epoch_of(Some(cmd)));
            }
            assert!(ticks < 10_000, "slide never finished");
        }
    }

    #[test]
    fn scenario_ads_then_news_with_per_slide_timing() {
        let mut rotation = Rotation::new();
        let mut epoch = epoch_of(rotation.set_slides(build_slides(&ads(&[10, 15]), &news(&[12]))));

        let expected = [(SlideKey::Ad(1), 200), (SlideKey::Ad(2), 300), (SlideKey::News(1), 240), (SlideKey::Ad(1), 200)];
        for (key, ticks) in expected {
            assert_eq!(rotation.current().map(Slide::key), Some(key));
            assert!(rotation.view().visible);
            let (taken, fade_epoch) = run_until_fade(&mut rotation, epoch);
            assert_eq!(taken, ticks);
            assert_eq!(rotation.phase(), Phase::Transitioning);
            assert!(!rotation.view().visible);
            epoch = epoch_of(rotation.finish_fade(fade_epoch));
        }
    }

    #[test]
    fn progress_is_monotonic_capped_and_reset_on_entry() {
        let mut rotation = Rotation::new();
        let epoch = epoch_of(rotation.set_slides(build_slides(&ads(&[1]), &[])));
        assert_eq!(rotation.progress(), 0.0);

        let mut last = 0.0;
        for _ in 0..19 {
            assert!(rotation.tick(epoch, PROGRESS_TICK).is_none());
            let p = rotation.progress();
            assert!(p >= last && p <= 1.0);
            last = p;
        }
        let fade = epoch_of(rotation.tick(epoch, Duration::from_secs(5)));
        assert_eq!(rotation.progress(), 0.0);
        epoch_of(rotation.finish_fade(fade));
        assert_eq!(rotation.progress(), 0.0);
        assert_eq!(rotation.phase(), Phase::Showing);
    }

    #[test]
    fn stale_epochs_are_ignored() {
        let mut rotation = Rotation::new();
        let first = epoch_of(rotation.set_slides(build_slides(&ads(&[10, 10]), &[])));
        let second = epoch_of(rotation.set_slides(build_slides(&ads(&[10, 10, 10]), &[])));
        assert_ne!(first, second);

        assert!(rotation.tick(first, Duration::from_secs(60)).is_none());
        assert_eq!(rotation.progress(), 0.0);
        assert!(rotation.finish_fade(second).is_none());
        assert_eq!(rotation.phase(), Phase::Showing);
    }

    #[test]
    fn index_stays_in_range_through_shrink_empty_and_grow() {
        let mut rotation = Rotation::new();
        let mut epoch = epoch_of(rotation.set_slides(build_slides(&ads(&[1, 1, 1]), &[])));
        for _ in 0..2 {
            let fade = epoch_of(rotation.tick(epoch, Duration::from_secs(1)));
            epoch = epoch_of(rotation.finish_fade(fade));
        }
        assert_eq!(rotation.index(), 2);

        assert_eq!(rotation.set_slides(build_slides(&[], &[])), Some(Command::StopAll));
        assert_eq!(rotation.phase(), Phase::Idle);
        assert!(rotation.current().is_none());

        epoch_of(rotation.set_slides(build_slides(&ads(&[1, 1]), &news(&[1, 1, 1]))));
        assert_eq!(rotation.index(), 0);
        assert_eq!(rotation.len(), 5);

        let mut epoch = rotation.epoch();
        for _ in 0..4 {
            let fade = epoch_of(rotation.tick(epoch, Duration::from_secs(1)));
            epoch = epoch_of(rotation.finish_fade(fade));
        }
        assert_eq!(rotation.index(), 4);

        epoch_of(rotation.set_slides(build_slides(&ads(&[1, 1]), &[])));
        assert_eq!(rotation.index(), 1);
        assert!(rotation.index() < rotation.len());
    }

    #[test]
    fn identical_content_does_not_restart_the_slide() {
        let mut rotation = Rotation::new();
        let epoch = epoch_of(rotation.set_slides(build_slides(&ads(&[10]), &news(&[12]))));
        rotation.tick(epoch, Duration::from_secs(3));

        assert_eq!(rotation.set_slides(build_slides(&ads(&[10]), &news(&[12]))), None);
        assert_eq!(rotation.epoch(), epoch);
        assert!((rotation.progress() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn growth_keeps_position_but_restarts_timers() {
        let mut rotation = Rotation::new();
        let epoch = epoch_of(rotation.set_slides(build_slides(&ads(&[10, 10]), &[])));
        let fade = epoch_of(rotation.tick(epoch, Duration::from_secs(10)));
        epoch_of(rotation.finish_fade(fade));
        assert_eq!(rotation.index(), 1);

        let cmd = rotation.set_slides(build_slides(&ads(&[10, 10]), &news(&[12])));
        assert!(matches!(cmd, Some(Command::StartShowing { .. })));
        assert_eq!(rotation.index(), 1);
        assert_eq!(rotation.current().map(Slide::key), Some(SlideKey::Ad(2)));
    }

    #[test]
    fn content_arriving_mid_fade_is_applied_after_it() {
        let mut rotation = Rotation::new();
        let epoch = epoch_of(rotation.set_slides(build_slides(&ads(&[10, 10, 10]), &[])));
        let fade = epoch_of(rotation.tick(epoch, Duration::from_secs(10)));

        assert_eq!(rotation.set_slides(build_slides(&[], &news(&[12]))), None);
        assert_eq!(rotation.len(), 3, "sequence unchanged while fading");

        epoch_of(rotation.finish_fade(fade));
        assert_eq!(rotation.index(), 0);
        assert_eq!(rotation.current().map(Slide::key), Some(SlideKey::News(1)));

        let fade = epoch_of(rotation.tick(rotation.epoch(), Duration::from_secs(12)));
        assert_eq!(rotation.set_slides(build_slides(&[], &[])), None);
        assert_eq!(rotation.finish_fade(fade), Some(Command::StopAll));
        assert_eq!(rotation.phase(), Phase::Idle);
    }
}
