//! Callback Multiplexer - One event, many ordered subscribers.
//!
//! A [`Callback<E>`] wraps one event signature and fans every invocation out
//! to its subscribers in append order.
//!
//! - Subscribers are identified by the [`SubscriberId`] returned from `add`,
//!   or by `Arc` identity when added with `add_arc`.
//! - `invoke` snapshots the subscriber list before calling anyone, so
//!   subscribers may add or remove subscribers (including themselves) while
//!   being called. Changes apply from the next invocation on.
//! - A panicking subscriber is logged and skipped; the remaining subscribers
//!   still run.
//!
//! # Example
//!
//! ```ignore
//! use spark_gui::callback::Callback;
//!
//! let resized: Callback<(i32, i32)> = Callback::new("size");
//! let id = resized.add(|(w, h)| println!("{w}x{h}"));
//! resized.invoke(&(800, 600));
//! resized.remove(id);
//! ```

mod events;

pub use events::*;

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::error;
use parking_lot::Mutex;

// =============================================================================
// Types
// =============================================================================

/// A subscriber function.
pub type Subscriber<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Handle returned by [`Callback::add`], used to remove the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

/// Multi-subscriber dispatcher for events of type `E`.
pub struct Callback<E> {
    label: &'static str,
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriberId, Subscriber<E>)>>,
}

// =============================================================================
// Implementation
// =============================================================================

impl<E: 'static> Callback<E> {
    /// Create an empty multiplexer. `label` names it in log lines.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Append a subscriber.
    pub fn add<F>(&self, subscriber: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.add_arc(Arc::new(subscriber))
    }

    /// Append a shared subscriber. The same `Arc` can later be passed to
    /// [`remove_subscriber`](Self::remove_subscriber).
    pub fn add_arc(&self, subscriber: Subscriber<E>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push((id, subscriber));
        id
    }

    /// Append a subscriber if there is one.
    pub fn add_optional(&self, subscriber: Option<Subscriber<E>>) -> Option<SubscriberId> {
        subscriber.map(|subscriber| self.add_arc(subscriber))
    }

    /// Remove a subscriber by id. Returns false if it was not subscribed.
    pub fn remove(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(entry, _)| *entry != id);
        subscribers.len() != before
    }

    /// Remove every registration of `subscriber` (compared by identity).
    pub fn remove_subscriber(&self, subscriber: &Subscriber<E>) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(_, entry)| !Arc::ptr_eq(entry, subscriber));
        subscribers.len() != before
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.lock().iter().any(|(entry, _)| *entry == id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }

    pub fn clear(&self) {
        self.subscribers.lock().clear();
    }

    /// Call every subscriber with `event`, in append order.
    ///
    /// Returns the number of subscribers that completed without panicking.
    pub fn invoke(&self, event: &E) -> usize {
        let snapshot: Vec<(SubscriberId, Subscriber<E>)> = self.subscribers.lock().clone();

        let mut completed = 0;
        for (id, subscriber) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| subscriber(event))) {
                Ok(()) => completed += 1,
                Err(payload) => error!(
                    "Subscriber {} of `{}` panicked: {}",
                    id.0,
                    self.label,
                    panic_message(payload.as_ref())
                ),
            }
        }
        completed
    }
}

impl<E> fmt::Debug for Callback<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("label", &self.label)
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic>"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Callback<i32>, Arc<Mutex<Vec<String>>>) {
        (Callback::new("test"), Arc::new(Mutex::new(Vec::new())))
    }

    #[test]
    fn test_invoke_in_append_order() {
        let (callback, log) = setup();
        for tag in ["first", "second", "third"] {
            let log = log.clone();
            callback.add(move |value| log.lock().push(format!("{tag}:{value}")));
        }

        assert_eq!(callback.invoke(&7), 3);
        assert_eq!(*log.lock(), vec!["first:7", "second:7", "third:7"]);
    }

    #[test]
    fn test_remove_by_id_and_identity() {
        let (callback, log) = setup();

        let log_a = log.clone();
        let a = callback.add(move |_| log_a.lock().push("a".into()));
        let log_b = log.clone();
        let shared: Subscriber<i32> = Arc::new(move |_| log_b.lock().push("b".into()));
        callback.add_arc(shared.clone());

        assert!(callback.remove(a));
        assert!(!callback.remove(a));
        assert!(callback.remove_subscriber(&shared));
        assert!(callback.is_empty());

        callback.invoke(&1);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_add_optional_skips_none() {
        let (callback, _) = setup();
        assert!(callback.add_optional(None).is_none());
        assert!(callback.add_optional(Some(Arc::new(|_: &i32| {}))).is_some());
        assert_eq!(callback.len(), 1);
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let (callback, log) = setup();
        callback.add(|_| panic!("boom"));
        let log_clone = log.clone();
        callback.add(move |value| log_clone.lock().push(value.to_string()));

        assert_eq!(callback.invoke(&3), 1);
        assert_eq!(*log.lock(), vec!["3"]);
    }

    #[test]
    fn test_mutation_during_dispatch() {
        let callback: Arc<Callback<i32>> = Arc::new(Callback::new("test"));
        let calls = Arc::new(Mutex::new(0));

        // Subscriber that adds another subscriber while being called
        let inner = callback.clone();
        let calls_clone = calls.clone();
        callback.add(move |_| {
            let calls = calls_clone.clone();
            inner.add(move |_| *calls.lock() += 1);
        });

        callback.invoke(&0);
        assert_eq!(*calls.lock(), 0);
        assert_eq!(callback.len(), 2);

        callback.invoke(&0);
        assert_eq!(*calls.lock(), 1);
    }
}
