//! Narrow interface over the collaborative document's replicated structures.
//!
//! Replication and merging belong to the external document service. This module
//! only describes what the execution core needs from it (an ordered sequence and
//! a string map, both observable) plus in-memory stand-ins with no distributed
//! behaviour.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub type Observer<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Handle returned by `observe`, used to unregister the callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceChange {
    Insert { index: usize, len: usize },
    Delete { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapChange {
    pub key: String,
}

/// Ordered sequence whose replicas converge to the same contents
pub trait SharedSequence<T>: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<T>;

    /// Insert at the logical tail
    fn push(&self, items: Vec<T>);

    /// Remove up to `len` items starting at `index`
    fn delete(&self, index: usize, len: usize);

    fn observe(&self, observer: Observer<SequenceChange>) -> ObserverId;

    fn unobserve(&self, id: ObserverId) -> bool;
}

/// Last-write-wins string map
pub trait SharedMap: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);

    fn observe(&self, observer: Observer<MapChange>) -> ObserverId;

    fn unobserve(&self, id: ObserverId) -> bool;
}

struct ObserverSet<E> {
    next_id: AtomicU64,
    observers: RwLock<Vec<(ObserverId, Observer<E>)>>,
}

impl<E> ObserverSet<E> {
    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            observers: RwLock::new(Vec::new()),
        }
    }

    fn add(&self, observer: Observer<E>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        write(&self.observers).push((id, observer));
        id
    }

    fn remove(&self, id: ObserverId) -> bool {
        let mut observers = write(&self.observers);
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Callbacks run without any lock held so they may read or write the structure
    fn notify(&self, event: &E) {
        let observers: Vec<Observer<E>> = read(&self.observers)
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();

        for observer in observers {
            observer(event);
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

pub struct InMemorySequence<T> {
    items: RwLock<Vec<T>>,
    observers: ObserverSet<SequenceChange>,
}

impl<T> InMemorySequence<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            observers: ObserverSet::new(),
        }
    }
}

impl<T> Default for InMemorySequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> SharedSequence<T> for InMemorySequence<T> {
    fn len(&self) -> usize {
        read(&self.items).len()
    }

    fn snapshot(&self) -> Vec<T> {
        read(&self.items).clone()
    }

    fn push(&self, items: Vec<T>) {
        if items.is_empty() {
            return;
        }

        let change = {
            let mut current = write(&self.items);
            let index = current.len();
            let len = items.len();
            current.extend(items);
            SequenceChange::Insert { index, len }
        };

        self.observers.notify(&change);
    }

    fn delete(&self, index: usize, len: usize) {
        let change = {
            let mut current = write(&self.items);
            if index >= current.len() || len == 0 {
                return;
            }
            let end = index.saturating_add(len).min(current.len());
            current.drain(index..end);
            SequenceChange::Delete {
                index,
                len: end - index,
            }
        };

        self.observers.notify(&change);
    }

    fn observe(&self, observer: Observer<SequenceChange>) -> ObserverId {
        self.observers.add(observer)
    }

    fn unobserve(&self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }
}

pub struct InMemoryMap {
    entries: RwLock<HashMap<String, String>>,
    observers: ObserverSet<MapChange>,
}

impl InMemoryMap {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            observers: ObserverSet::new(),
        }
    }
}

impl Default for InMemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedMap for InMemoryMap {
    fn get(&self, key: &str) -> Option<String> {
        read(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        write(&self.entries).insert(key.to_string(), value);
        self.observers.notify(&MapChange {
            key: key.to_string(),
        });
    }

    fn observe(&self, observer: Observer<MapChange>) -> ObserverId {
        self.observers.add(observer)
    }

    fn unobserve(&self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }
}
