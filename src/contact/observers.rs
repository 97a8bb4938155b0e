use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Token returned by `Observers::subscribe`, consumed by `unsubscribe`
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Subscriber registry
pub struct Observers<E> {
    next_id: AtomicU64,
    handlers: RwLock<Vec<(u64, Handler<E>)>>,
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut handlers) = self.handlers.write() {
            handlers.push((id, Arc::new(handler)));
        }
        Subscription(id)
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let Ok(mut handlers) = self.handlers.write() else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(id, _)| *id != subscription.0);
        handlers.len() != before
    }

    /// Deliver to every subscriber in subscription order
    pub fn notify(&self, event: &E) {
        // Snapshot first so handlers may (un)subscribe while being called
        let snapshot: Vec<Handler<E>> = match self.handlers.read() {
            Ok(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            Err(_) => return,
        };

        for handler in snapshot {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.read().map(|h| h.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}
