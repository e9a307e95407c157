//! Broadcast of decoded events to independent subscribers

use super::event::InputEvent;
use std::sync::{Arc, Mutex, Weak};

type Handler = Arc<dyn Fn(&InputEvent) + Send + Sync>;
type CloseHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Handlers {
    next_id: u64,
    entries: Vec<(u64, Handler)>,
    close_entries: Vec<(u64, CloseHandler)>,
    closed: bool,
}

impl Handlers {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Fan-out point between the decoder and its consumers.
///
/// Every published event reaches every subscriber registered at that moment.
/// Cloning shares the same subscriber list.
#[derive(Clone, Default)]
pub struct InputHub {
    handlers: Arc<Mutex<Handlers>>,
}

impl InputHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Dropping or calling [`Subscription::unsubscribe`]
    /// on the returned handle removes it.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&InputEvent) + Send + Sync + 'static,
    {
        let mut handlers = lock(&self.handlers);
        let id = handlers.allocate_id();
        handlers.entries.push((id, Arc::new(handler)));
        Subscription {
            id,
            handlers: Arc::downgrade(&self.handlers),
        }
    }

    /// Register a callback for the end of the input stream. Runs immediately
    /// if the hub is already closed.
    pub fn on_close<F>(&self, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut handlers = lock(&self.handlers);
        if handlers.closed {
            drop(handlers);
            handler();
            return Subscription {
                id: u64::MAX,
                handlers: Weak::new(),
            };
        }
        let id = handlers.allocate_id();
        handlers.close_entries.push((id, Arc::new(handler)));
        Subscription {
            id,
            handlers: Arc::downgrade(&self.handlers),
        }
    }

    /// Mark the input stream as finished and notify close subscribers
    pub fn close(&self) {
        let snapshot: Vec<CloseHandler> = {
            let mut handlers = lock(&self.handlers);
            if handlers.closed {
                return;
            }
            handlers.closed = true;
            handlers
                .close_entries
                .iter()
                .map(|(_, handler)| Arc::clone(handler))
                .collect()
        };
        for handler in snapshot {
            handler();
        }
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.handlers).closed
    }

    /// Deliver an event to every current subscriber
    pub fn publish(&self, event: &InputEvent) {
        // Snapshot so handlers may subscribe/unsubscribe while being called
        let snapshot: Vec<Handler> = lock(&self.handlers)
            .entries
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in snapshot {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.handlers).entries.len()
    }
}

fn lock(handlers: &Mutex<Handlers>) -> std::sync::MutexGuard<'_, Handlers> {
    handlers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle returned by [`InputHub::subscribe`]
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    handlers: Weak<Mutex<Handlers>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(handlers) = self.handlers.upgrade() {
            let mut handlers = lock(&handlers);
            handlers.entries.retain(|(id, _)| *id != self.id);
            handlers.close_entries.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::Key;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(hub: &InputHub) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let sub = hub.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, sub)
    }

    #[test]
    fn test_broadcast_to_all_subscribers() {
        let hub = InputHub::new();
        let (a, _sub_a) = counter(&hub);
        let (b, _sub_b) = counter(&hub);

        hub.publish(&InputEvent::Key(Key::Enter.into()));

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let hub = InputHub::new();
        let (a, sub_a) = counter(&hub);
        let (b, _sub_b) = counter(&hub);

        sub_a.unsubscribe();
        hub.publish(&InputEvent::Key(Key::Enter.into()));

        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 1);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn test_close_notifies_once() {
        let hub = InputHub::new();
        let closes = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&closes);
        let _sub = hub.on_close(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        hub.close();
        hub.close();

        assert!(hub.is_closed());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_on_close_after_close_runs_immediately() {
        let hub = InputHub::new();
        hub.close();
        let closes = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&closes);
        let _sub = hub.on_close(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_outliving_hub() {
        let hub = InputHub::new();
        let (_count, sub) = counter(&hub);
        drop(hub);
        drop(sub);
    }
}
