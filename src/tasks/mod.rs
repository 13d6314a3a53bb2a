//! In-flight requests keyed by purpose.
//!
//! Starting a request for a key supersedes the previous one: its task is
//! aborted and its [`Ticket`] stops being current, so a late result can be
//! recognised and dropped even if it was already produced.
//!
//! Tasks started with [`TaskRegistry::track`] run side by side under their
//! key instead. They are only aborted by [`TaskRegistry::cancel_all`] or when
//! the registry is dropped.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use log::debug;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestPurpose {
    StarFetch,
    Chat,
}

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket<K> {
    pub key: K,
    pub generation: u64,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    handle: Option<JoinHandle<()>>,
    tracked: Vec<JoinHandle<()>>,
}

impl Slot {
    fn abort_all(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        for handle in self.tracked.drain(..) {
            handle.abort();
        }
    }
}

pub struct TaskRegistry<K> {
    slots: HashMap<K, Slot>,
}

impl<K> Default for TaskRegistry<K> {
    fn default() -> Self {
        TaskRegistry {
            slots: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash + std::fmt::Debug> TaskRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersedes whatever is in flight for `key` and returns the new ticket.
    pub fn begin(&mut self, key: K) -> Ticket<K> {
        let slot = self.slots.entry(key).or_default();
        if let Some(handle) = slot.handle.take() {
            if !handle.is_finished() {
                debug!("superseding in-flight {key:?} request");
            }
            handle.abort();
        }
        slot.generation += 1;
        Ticket {
            key,
            generation: slot.generation,
        }
    }

    /// Spawns `make(ticket)` on the tokio runtime as the current task for `key`.
    pub fn spawn<F, Fut>(&mut self, key: K, make: F) -> Ticket<K>
    where
        F: FnOnce(Ticket<K>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.begin(key);
        let handle = tokio::spawn(make(ticket));
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.handle = Some(handle);
        }
        ticket
    }

    /// Spawns `task` under `key` alongside anything already running there.
    pub fn track<Fut>(&mut self, key: K, task: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let slot = self.slots.entry(key).or_default();
        slot.tracked.retain(|handle| !handle.is_finished());
        slot.tracked.push(tokio::spawn(task));
    }

    /// Tracked tasks under `key` that have not finished yet.
    pub fn running(&self, key: K) -> usize {
        self.slots.get(&key).map_or(0, |slot| {
            slot.tracked.iter().filter(|handle| !handle.is_finished()).count()
        })
    }

    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        self.slots
            .get(&ticket.key)
            .is_some_and(|slot| slot.generation == ticket.generation)
    }

    /// Marks the request for `ticket` as settled if it is still current.
    /// Returns whether the ticket was current.
    pub fn settle(&mut self, ticket: &Ticket<K>) -> bool {
        match self.slots.get_mut(&ticket.key) {
            Some(slot) if slot.generation == ticket.generation => {
                slot.handle = None;
                true
            }
            _ => false,
        }
    }

    /// Whether a request for `key` has been issued and not yet settled.
    pub fn in_flight(&self, key: K) -> bool {
        self.slots
            .get(&key)
            .is_some_and(|slot| slot.handle.is_some())
    }

    /// Aborts every task and invalidates every outstanding ticket.
    pub fn cancel_all(&mut self) {
        for (key, slot) in self.slots.iter_mut() {
            if slot.handle.is_some() || !slot.tracked.is_empty() {
                debug!("cancelling in-flight {key:?} requests");
            }
            slot.abort_all();
            slot.generation += 1;
        }
    }
}

impl<K> Drop for TaskRegistry<K> {
    fn drop(&mut self) {
        for slot in self.slots.values_mut() {
            slot.abort_all();
        }
    }
}
