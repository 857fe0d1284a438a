//! # Self-Scheduling Poll Loop
//!
//! The shared engine behind the arrival and content pollers.
//!
//! ## Workflow:
//! 1.  **Immediate fetch**: the first request is issued as soon as the loop
//!     starts.
//! 2.  **Wall-clock schedule**: every later request is due `policy.next_delay()`
//!     after the previous one was issued. Latency and failures of earlier
//!     requests never shift the schedule, so a slow request can overlap the
//!     next one. If the loop itself was stalled past the next slot, the
//!     schedule restarts from now instead of catching up.
//! 3.  **Ordering**: each request carries a sequence number. A result is handed
//!     to `apply` only if no newer request has already been applied; older
//!     stragglers are dropped.
//! 4.  **Cancellation**: in-flight requests live in a `JoinSet` owned by the
//!     loop. When the token is cancelled the set is dropped, which aborts them,
//!     so no result can be applied after the poller has stopped.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};

use crate::core::policy::PollPolicy;
use crate::core::timer::TimerHandle;

/// Spawns a poll loop and returns its owned handle.
///
/// `fetch` builds one request future per scheduled poll. `apply` receives the
/// results that survive ordering, on the loop task, one at a time.
pub fn spawn_poller<T, E, F, Fut, A>(
    name: impl Into<String>,
    policy: Arc<dyn PollPolicy>,
    mut fetch: F,
    mut apply: A,
) -> TimerHandle
where
    T: Send + 'static,
    E: Display + Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    A: FnMut(Result<T, E>) + Send + 'static,
{
    let name = name.into();
    let loop_name = name.clone();

    TimerHandle::spawn(name, move |token| async move {
        let mut in_flight: JoinSet<(u64, Result<T, E>)> = JoinSet::new();
        let mut next_seq: u64 = 0;
        let mut newest_applied: Option<u64> = None;
        let mut failures: u32 = 0;
        let mut due = Instant::now();

        loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => break,

                _ = sleep_until(due) => {
                    let seq = next_seq;
                    next_seq += 1;
                    let request = fetch();
                    in_flight.spawn(async move { (seq, request.await) });
                    let delay = policy.next_delay(failures);
                    let now = Instant::now();
                    due += delay;
                    if due <= now {
                        // Missed whole slots (runtime stall): one request now, not a burst.
                        due = now + delay;
                    }
                    log::trace!("{}: request #{} issued", loop_name, seq);
                }

                Some(joined) = in_flight.join_next() => {
                    let (seq, result) = match joined {
                        Ok(done) => done,
                        Err(e) => {
                            if e.is_panic() {
                                log::error!("{}: request task panicked: {}", loop_name, e);
                            }
                            continue;
                        }
                    };

                    if newest_applied.is_some_and(|newest| seq < newest) {
                        log::debug!("{}: dropping result of superseded request #{}", loop_name, seq);
                        continue;
                    }
                    newest_applied = Some(seq);

                    match &result {
                        Ok(_) => failures = 0,
                        Err(e) => {
                            failures = failures.saturating_add(1);
                            log::debug!("{}: request #{} failed ({} in a row): {}", loop_name, seq, failures, e);
                        }
                    }
                    apply(result);
                }
            }
        }

        in_flight.abort_all();
        log::debug!("{}: poll loop exited", loop_name);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::policy::{CappedBackoff, FixedInterval};
    use std::sync::Mutex;
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<(u64, Result<u32, String>)>>>;

    /// Request `n` resolves after `latency(n)` with value `n`, issued at a virtual time.
    fn start(
        policy: Arc<dyn PollPolicy>,
        latency: fn(u32) -> Duration,
        fail: fn(u32) -> bool,
        applied: Log,
    ) -> TimerHandle {
        let epoch = Instant::now();
        let mut n = 0u32;
        spawn_poller(
            "test",
            policy,
            move || {
                let this = n;
                n += 1;
                async move {
                    tokio::time::sleep(latency(this)).await;
                    if fail(this) { Err(format!("boom {this}")) } else { Ok(this) }
                }
            },
            move |result| {
                let at = (Instant::now() - epoch).as_millis() as u64;
                applied.lock().unwrap().push((at, result));
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_schedule_survives_failures() {
        let applied: Log = Arc::default();
        let handle = start(
            Arc::new(FixedInterval(Duration::from_secs(30))),
            |_| Duration::from_secs(1),
            |n| n == 0,
            applied.clone(),
        );
        tokio::time::sleep(Duration::from_millis(61_500)).await;
        handle.stop().await;

        let seen = applied.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![(1_000, Err("boom 0".to_string())), (31_000, Ok(1)), (61_000, Ok(2))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn late_results_of_older_requests_are_dropped() {
        let applied: Log = Arc::default();
        // Request 0 takes 45s, so request 1 (issued at 30s, 1s latency) finishes first.
        let handle = start(
            Arc::new(FixedInterval(Duration::from_secs(30))),
            |n| if n == 0 { Duration::from_secs(45) } else { Duration::from_secs(1) },
            |_| false,
            applied.clone(),
        );
        tokio::time::sleep(Duration::from_secs(50)).await;
        handle.stop().await;

        assert_eq!(applied.lock().unwrap().clone(), vec![(31_000, Ok(1))]);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_applied_after_stop() {
        let applied: Log = Arc::default();
        let handle = start(
            Arc::new(FixedInterval(Duration::from_secs(30))),
            |_| Duration::from_secs(5),
            |_| false,
            applied.clone(),
        );
        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.stop().await;
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert!(applied.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_runtime_issues_one_request_not_a_burst() {
        let applied: Log = Arc::default();
        let handle = start(
            Arc::new(FixedInterval(Duration::from_secs(30))),
            |_| Duration::ZERO,
            |_| false,
            applied.clone(),
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
        // Three slots (30, 60, 90) pass while nothing runs.
        tokio::time::advance(Duration::from_secs(100)).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        handle.stop().await;

        let times: Vec<u64> = applied.lock().unwrap().iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![0, 101_000, 131_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_stretches_the_schedule() {
        let applied: Log = Arc::default();
        let handle = start(
            Arc::new(CappedBackoff { base: Duration::from_secs(10), max: Duration::from_secs(40) }),
            |_| Duration::from_millis(100),
            |_| true,
            applied.clone(),
        );
        tokio::time::sleep(Duration::from_secs(75)).await;
        handle.stop().await;

        // Issued at 0, 10 (0 failures known yet at 0s), 30, 70.
        let times: Vec<u64> = applied.lock().unwrap().iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![100, 10_100, 30_100, 70_100]);
    }
}
