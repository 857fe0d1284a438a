//! # Owned Timer Handles
//!
//! Every periodic operation in the kiosk (pollers, the slide rotation) runs as a
//! spawned task that is owned through a `TimerHandle`. There is no
//! fire-and-forget spawning anywhere in the engine.
//!
//! ## Lifecycle:
//! - **Start**: `TimerHandle::spawn` hands the task a `CancellationToken` and
//!   keeps the `JoinHandle`.
//! - **Stop**: `stop().await` cancels the token and waits for the task to leave
//!   its loop, so nothing it owns can fire afterwards.
//! - **Drop**: dropping the handle cancels the token and aborts the task. A
//!   component that is torn down on an early-return path therefore still
//!   releases all of its timers.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// # Timer Handle
///
/// The owned, cancel-on-drop handle of one background loop.
#[derive(Debug)]
pub struct TimerHandle {
    name: String,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    /// Spawns `body` on the tokio runtime.
    ///
    /// `body` receives the token it must watch; it is expected to return soon
    /// after the token is cancelled.
    pub fn spawn<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let token = CancellationToken::new();
        let task = tokio::spawn(body(token.clone()));
        log::debug!("Timer '{}' started", name);
        Self { name, token, task: Some(task) }
    }

    /// Name given at spawn time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` until the loop has exited.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancels the loop and waits for it to exit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    log::error!("Timer '{}' panicked: {}", self.name, e);
                }
            }
        }
        log::debug!("Timer '{}' stopped", self.name);
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
            log::debug!("Timer '{}' dropped", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn counting_timer(counter: Arc<AtomicU32>) -> TimerHandle {
        TimerHandle::spawn("counter", move |token| async move {
            let mut every = tokio::time::interval(Duration::from_secs(1));
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = every.tick() => { counter.fetch_add(1, Ordering::SeqCst); }
                }
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_loop() {
        let counter = Arc::new(AtomicU32::new(0));
        let handle = counting_timer(counter.clone());
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(handle.is_running());
        handle.stop().await;

        let seen = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), seen);
        assert_eq!(seen, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_the_loop() {
        let counter = Arc::new(AtomicU32::new(0));
        let handle = counting_timer(counter.clone());
        tokio::time::sleep(Duration::from_millis(1500)).await;
        drop(handle);

        let seen = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), seen);
    }
}
