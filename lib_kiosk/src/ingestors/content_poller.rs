//! # Content Poller
//!
//! Refreshes the shared ad/news/alert inventory on its own, much slower
//! schedule. A failed refresh is logged and otherwise ignored: the previous
//! inventory stays in place. Successful refreshes replace all three arrays
//! wholesale, so consumers can compare snapshots without locking.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::core::{spawn_poller, PollPolicy, TimerHandle};
use crate::ingestors::source::ContentSource;
use crate::models::{Ad, Alert, ContentResponse, NewsItem};

/// Snapshot of the shared content inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentState {
    /// Active ads in display order.
    pub ads: Arc<[Ad]>,
    /// Active news in display order.
    pub news: Arc<[NewsItem]>,
    /// Active alerts, unfiltered.
    pub alerts: Arc<[Alert]>,
    /// Bumped on every applied refresh.
    pub revision: u64,
    /// When the last successful refresh was applied.
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for ContentState {
    fn default() -> Self {
        Self {
            ads: Arc::from(Vec::new()),
            news: Arc::from(Vec::new()),
            alerts: Arc::from(Vec::new()),
            revision: 0,
            last_updated: None,
        }
    }
}

impl ContentState {
    /// Builds a snapshot from a response body.
    pub fn from_response(response: ContentResponse, revision: u64) -> Self {
        Self {
            ads: Arc::from(response.ads),
            news: Arc::from(response.news),
            alerts: Arc::from(response.alerts),
            revision,
            last_updated: Some(Utc::now()),
        }
    }
}

/// # Content Poller
///
/// Owns the inventory refresh loop.
pub struct ContentPoller {
    state: Arc<watch::Sender<ContentState>>,
    handle: TimerHandle,
}

impl ContentPoller {
    /// Starts polling: one fetch now, then on the policy's schedule.
    pub fn start<S: ContentSource>(source: Arc<S>, policy: Arc<dyn PollPolicy>) -> Self {
        let (tx, _) = watch::channel(ContentState::default());
        let state = Arc::new(tx);
        let publish = Arc::clone(&state);

        let handle = spawn_poller(
            "content",
            policy,
            move || {
                let source = Arc::clone(&source);
                async move { source.fetch_content().await }
            },
            move |result| match result {
                Ok(response) => {
                    log::info!(
                        "Content refreshed: {} ads, {} news, {} alerts",
                        response.ads.len(),
                        response.news.len(),
                        response.alerts.len()
                    );
                    publish.send_modify(|current| {
                        *current = ContentState::from_response(response, current.revision + 1);
                    });
                }
                Err(e) => log::warn!("Content refresh failed, keeping previous content: {}", e),
            },
        );

        Self { state, handle }
    }

    /// A receiver for inventory snapshots.
    pub fn subscribe(&self) -> watch::Receiver<ContentState> {
        self.state.subscribe()
    }

    /// The current snapshot.
    pub fn current(&self) -> ContentState {
        self.state.borrow().clone()
    }

    /// Stops polling and waits for the loop to exit.
    pub async fn stop(self) {
        self.handle.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixedInterval;
    use crate::ingestors::source::FetchError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct Flaky {
        calls: AtomicU32,
    }

    impl ContentSource for Flaky {
        async fn fetch_content(&self) -> Result<ContentResponse, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 1 {
                return Err(FetchError::Status { status: 502, body: None });
            }
            Ok(ContentResponse {
                ads: (0..=n as i64).map(|id| Ad { id, ..Default::default() }).collect(),
                ..Default::default()
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_previous_inventory() {
        let source = Arc::new(Flaky { calls: AtomicU32::new(0) });
        let poller = ContentPoller::start(source.clone(), Arc::new(FixedInterval(Duration::from_secs(300))));

        tokio::time::sleep(Duration::from_secs(1)).await;
        let first = poller.current();
        assert_eq!((first.ads.len(), first.revision), (1, 1));

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(poller.current(), first);

        tokio::time::sleep(Duration::from_secs(300)).await;
        let third = poller.current();
        assert_eq!((third.ads.len(), third.revision), (3, 2));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        poller.stop().await;
    }
}
