//! One "result changed" event source fed by three triggers: completion
//! signals from the submitter, a watcher that notices alias keys rewritten by
//! another process, and a bounded poller. Subscribers re-read the cache on any
//! event and must tolerate duplicates.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ResultCache;
use crate::render::{ReportRenderer, Rendition};
use crate::result::ExecutionResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultEvent {
    /// A submission in this process finished.
    Completed { success: bool, status: u16 },
    /// An alias key was changed by someone else sharing the store.
    StorageChanged { key: String },
    /// The poller found a result.
    Polled,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<ResultEvent>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResultEvent> {
        self.sender.subscribe()
    }

    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }

    /// Returns how many subscribers saw the event; zero is not an error.
    pub fn publish(&self, event: ResultEvent) -> usize {
        debug!(?event, "publishing result event");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn completed(&self, success: bool, status: u16) -> usize {
        self.publish(ResultEvent::Completed { success, status })
    }
}

/// Publishes `StorageChanged` for each alias whose raw value differs from the previous tick.
pub struct StorageWatcher {
    cache: ResultCache,
    interval: Duration,
}

impl StorageWatcher {
    pub fn new(cache: ResultCache, interval: Duration) -> Self {
        Self { cache, interval }
    }

    /// Runs until the notifier has no subscribers left.
    pub fn spawn(self, notifier: Notifier) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut previous = self.cache.snapshot();
            loop {
                tokio::time::sleep(self.interval).await;
                if !notifier.has_subscribers() {
                    debug!("storage watcher stopping; no subscribers");
                    break;
                }
                let current = self.cache.snapshot();
                for ((key, before), (_, after)) in previous.iter().zip(current.iter()) {
                    if before != after {
                        notifier.publish(ResultEvent::StorageChanged { key: (*key).to_string() });
                    }
                }
                previous = current;
            }
        })
    }
}

/// Polls the cache until a result shows up or the window closes.
pub struct ResultPoller {
    cache: ResultCache,
    interval: Duration,
    window: Duration,
}

impl ResultPoller {
    pub fn new(cache: ResultCache, interval: Duration, window: Duration) -> Self {
        Self { cache, interval, window }
    }

    pub async fn run(&self, notifier: &Notifier) -> Option<ExecutionResult> {
        let polling = async {
            loop {
                if let Some(result) = self.cache.read() {
                    return result;
                }
                tokio::time::sleep(self.interval).await;
            }
        };
        match tokio::time::timeout(self.window, polling).await {
            Ok(result) => {
                notifier.publish(ResultEvent::Polled);
                Some(result)
            }
            Err(_) => {
                info!(window = ?self.window, "no result within polling window");
                None
            }
        }
    }

    pub fn spawn(self, notifier: Notifier) -> JoinHandle<Option<ExecutionResult>> {
        tokio::spawn(async move { self.run(&notifier).await })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    Changed(Rendition),
    Unchanged,
}

/// A display that re-reads and re-renders on every event, reporting only real changes.
pub struct ReportView {
    cache: ResultCache,
    renderer: ReportRenderer,
    last: Option<Option<ExecutionResult>>,
}

impl ReportView {
    pub fn new(cache: ResultCache, renderer: ReportRenderer) -> Self {
        Self { cache, renderer, last: None }
    }

    pub fn current(&self) -> Option<&ExecutionResult> {
        self.last.as_ref().and_then(Option::as_ref)
    }

    pub fn refresh(&mut self) -> Refresh {
        let cached = self.cache.read();
        if self.last.as_ref() == Some(&cached) {
            return Refresh::Unchanged;
        }
        let rendition = self.renderer.render_cached(cached.as_ref());
        self.last = Some(cached);
        Refresh::Changed(rendition)
    }

    /// Refreshes on each event until the channel closes, handing every change to `on_change`.
    pub async fn follow<F>(&mut self, mut events: broadcast::Receiver<ResultEvent>, mut on_change: F)
    where
        F: FnMut(&ResultEvent, &Rendition, Option<&ExecutionResult>),
    {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "report view lagged; refreshing");
                    ResultEvent::Polled
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if let Refresh::Changed(rendition) = self.refresh() {
                on_change(&event, &rendition, self.current());
            }
        }
    }
}
