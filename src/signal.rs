//! Observable value cell with synchronous change delivery
//!
//! A `Signal` holds an `Arc` snapshot of its value. Writers are serialized by
//! a dedicated lock that stays held while subscribers run, so callbacks see
//! values in commit order. Readers only take the short value lock and never
//! observe a half-written value.
//!
//! A callback may write to the signal that invoked it. Such a write is
//! committed at once and delivered after the current round of callbacks
//! finishes, so every subscriber still sees values in commit order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use tracing::trace;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner<T> {
    value: Mutex<Arc<T>>,
    writer: Mutex<()>,
    subscribers: Mutex<Vec<(u64, Callback<T>)>>,
    next_id: AtomicU64,
    delivery: Mutex<Delivery<T>>,
}

/// Thread running callbacks, and values its callbacks committed meanwhile
struct Delivery<T> {
    thread: Option<ThreadId>,
    queued: VecDeque<Arc<T>>,
}

/// Ends a delivery round even if a callback panics
struct DeliveryGuard<'a, T> {
    delivery: &'a Mutex<Delivery<T>>,
}

impl<T> Drop for DeliveryGuard<'_, T> {
    fn drop(&mut self) {
        let mut delivery = lock(self.delivery);
        delivery.thread = None;
        delivery.queued.clear();
    }
}

/// Shared observable value. Cloning yields another handle to the same cell.
pub struct Signal<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default + Send + Sync + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*lock(&self.inner.value))
            .field("subscribers", &lock(&self.inner.subscribers).len())
            .finish()
    }
}

impl<T: Send + Sync + 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(Arc::new(value)),
                writer: Mutex::new(()),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                delivery: Mutex::new(Delivery {
                    thread: None,
                    queued: VecDeque::new(),
                }),
            }),
        }
    }

    /// Current committed value
    pub fn get(&self) -> Arc<T> {
        Arc::clone(&lock(&self.inner.value))
    }

    /// Replace the value and notify subscribers
    pub fn set(&self, value: T) {
        self.with_writer(|| self.commit(Arc::new(value)));
    }

    /// Read-modify-write under the writer lock.
    ///
    /// `f` returns `None` to leave the value untouched, in which case nobody is
    /// notified. Returns whether a new value was committed.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> Option<T>,
    {
        self.with_writer(|| {
            let current = self.get();
            match f(&current) {
                Some(next) => {
                    self.commit(Arc::new(next));
                    true
                }
                None => false,
            }
        })
    }

    /// Register `callback`. It is called right away with the current value and
    /// then after every committed change until the `Subscription` is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let callback: Callback<T> = Arc::new(callback);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.with_writer(|| {
            callback(&self.get());
            lock(&self.inner.subscribers).push((id, callback));
        });
        trace!(id, "subscriber added");

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner.subscribers).retain(|(existing, _)| *existing != id);
                trace!(id, "subscriber removed");
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.subscribers).len()
    }

    fn delivering_here(&self) -> bool {
        lock(&self.inner.delivery).thread == Some(thread::current().id())
    }

    /// Run `f` holding the writer lock, unless this thread already holds it
    /// because `f` comes from one of our callbacks.
    fn with_writer<R>(&self, f: impl FnOnce() -> R) -> R {
        if self.delivering_here() {
            return f();
        }
        let _writer = lock(&self.inner.writer);
        f()
    }

    fn commit(&self, value: Arc<T>) {
        *lock(&self.inner.value) = Arc::clone(&value);
        {
            let mut delivery = lock(&self.inner.delivery);
            let current = thread::current().id();
            if delivery.thread == Some(current) {
                trace!("nested write queued");
                delivery.queued.push_back(value);
                return;
            }
            delivery.thread = Some(current);
        }

        let _guard = DeliveryGuard {
            delivery: &self.inner.delivery,
        };
        let mut next = Some(value);
        while let Some(value) = next {
            let callbacks: Vec<Callback<T>> = lock(&self.inner.subscribers)
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect();
            for callback in callbacks {
                callback(&value);
            }
            next = lock(&self.inner.delivery).queued.pop_front();
        }
    }
}

/// Handle returned by `Signal::subscribe`. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }

    /// Keep the callback registered for the lifetime of the signal
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
