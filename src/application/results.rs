//! Single-slot results document.
//!
//! Holds the text of the most recent report under a fixed URI. Viewers either
//! read it on demand or subscribe and get called with every new version.
//! Publishing replaces the slot; nothing older is kept.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub const RESULTS_URI: &str = "esq://results";

pub type Handler = Box<dyn Fn(&str, &str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct ResultsSink {
    content: Mutex<String>,
    subscribers: Mutex<Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
}

impl ResultsSink {
    pub fn new() -> Self {
        Self {
            content: Mutex::new(String::new()),
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Latest content for `uri`, empty before anything was published
    pub fn read(&self, uri: &str) -> Option<String> {
        if uri != RESULTS_URI {
            return None;
        }
        Some(lock(&self.content).clone())
    }

    /// Replaces the stored content and notifies subscribers with `(uri, content)`.
    ///
    /// The subscriber list stays locked from the update through the last
    /// notification, so concurrent publishes reach viewers in slot order.
    /// Handlers may `read` but must not subscribe or unsubscribe.
    pub fn publish(&self, content: impl Into<String>) {
        let content = content.into();
        let subscribers = lock(&self.subscribers);
        *lock(&self.content) = content.clone();

        debug!(subscribers = subscribers.len(), bytes = content.len(), "publishing results");
        for (_, handler) in subscribers.iter() {
            handler(RESULTS_URI, &content);
        }
    }

    pub fn subscribe(
        &self,
        handler: impl Fn(&str, &str) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.subscribers).push((id, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = lock(&self.subscribers);
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }
}

impl Default for ResultsSink {
    fn default() -> Self {
        Self::new()
    }
}

// Recovers from poisoning left by a panicking handler.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Weak};
    use std::thread;

    #[test]
    fn test_read_before_publish_is_empty() {
        let sink = ResultsSink::new();
        assert_eq!(sink.read(RESULTS_URI), Some(String::new()));
    }

    #[test]
    fn test_read_unknown_uri() {
        let sink = ResultsSink::new();
        sink.publish("report");
        assert_eq!(sink.read("esq://other"), None);
    }

    #[test]
    fn test_publish_keeps_only_latest() {
        let sink = ResultsSink::new();
        sink.publish("first");
        sink.publish("second");
        assert_eq!(sink.read(RESULTS_URI).as_deref(), Some("second"));
    }

    #[test]
    fn test_subscribers_are_notified() {
        let sink = ResultsSink::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_handler = Arc::clone(&seen);
        sink.subscribe(move |uri, content| {
            seen_by_handler
                .lock()
                .unwrap()
                .push(format!("{uri} {content}"));
        });

        sink.publish("one");
        sink.publish("two");

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["esq://results one".to_string(), "esq://results two".to_string()]
        );
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let sink = ResultsSink::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = sink.subscribe(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sink.publish("a");
        assert!(sink.unsubscribe(id));
        assert!(!sink.unsubscribe(id));
        sink.publish("b");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_reads_what_it_was_notified_with() {
        let sink = Arc::new(ResultsSink::new());
        let weak: Weak<ResultsSink> = Arc::downgrade(&sink);
        let mismatches = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&mismatches);
        sink.subscribe(move |uri, content| {
            let current = weak.upgrade().and_then(|sink| sink.read(uri));
            if current.as_deref() != Some(content) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        sink.publish("only");
        assert_eq!(mismatches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_publishes_end_on_the_stored_content() {
        let sink = Arc::new(ResultsSink::new());
        let last_seen = Arc::new(Mutex::new(String::new()));
        let seen_by_handler = Arc::clone(&last_seen);
        sink.subscribe(move |_, content| {
            *seen_by_handler.lock().unwrap() = content.to_string();
        });

        let publishers: Vec<_> = (0..8)
            .map(|worker| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for round in 0..50 {
                        sink.publish(format!("report {worker}-{round}"));
                    }
                })
            })
            .collect();
        for publisher in publishers {
            publisher.join().unwrap();
        }

        assert_eq!(sink.read(RESULTS_URI), Some(last_seen.lock().unwrap().clone()));
    }
}
