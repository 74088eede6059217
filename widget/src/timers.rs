//! # Timer Registry
//!
//! At most one pending timer per key. Scheduling a key that already has a
//! timer aborts the old one; cancelling is idempotent.
//!
//! A firing timer removes its own entry before running its action, so the
//! action may schedule the same key again.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Bubbles that own a dismissal timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BubbleKey {
    Welcome,
    Response,
}

struct Entry {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Timers<K> {
    entries: HashMap<K, Entry>,
    next_generation: u64,
}

impl<K> Drop for Timers<K> {
    fn drop(&mut self) {
        for entry in self.entries.values() {
            entry.handle.abort();
        }
    }
}

/// Keyed one-shot timers on the tokio runtime
pub struct TimerRegistry<K = BubbleKey> {
    inner: Arc<Mutex<Timers<K>>>,
}

impl<K> Default for TimerRegistry<K> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Timers {
                entries: HashMap::new(),
                next_generation: 0,
            })),
        }
    }
}

impl<K> TimerRegistry<K>
where
    K: Eq + Hash + Copy + Send + std::fmt::Debug + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `delay`, replacing any timer already set for `key`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, key: K, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut timers = self.inner.lock();
        if let Some(old) = timers.entries.remove(&key) {
            old.handle.abort();
        }

        timers.next_generation += 1;
        let generation = timers.next_generation;
        let registry: Weak<Mutex<Timers<K>>> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(registry) = registry.upgrade() else {
                return;
            };
            let current = {
                let mut timers = registry.lock();
                match timers.entries.get(&key) {
                    Some(entry) if entry.generation == generation => {
                        timers.entries.remove(&key);
                        true
                    }
                    _ => false,
                }
            };

            if current {
                tracing::trace!(key = ?key, "Timer fired");
                action();
            }
        });

        timers.entries.insert(key, Entry { generation, handle });
    }

    /// Cancel the timer for `key`; returns whether one was pending.
    pub fn cancel(&self, key: K) -> bool {
        match self.inner.lock().entries.remove(&key) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, key: K) -> bool {
        self.inner.lock().entries.contains_key(&key)
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn cancel_all(&self) {
        let mut timers = self.inner.lock();
        for (_, entry) in timers.entries.drain() {
            entry.handle.abort();
        }
    }
}
