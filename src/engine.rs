//! Engine Plumbing
//!
//! Pieces shared by the list and task engines: error and outcome types,
//! the generation counter guarding snapshots, and change observers.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::api::RemoteError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("remote store: {0}")]
    Remote(#[from] RemoteError),
    #[error("{0} not found")]
    NotFound(String),
}

pub type EngineResult<T = Outcome> = Result<T, EngineError>;

/// What an engine operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State changed (remote and local)
    Applied,
    /// Not an actionable request: no gesture, no-op drop
    Ignored,
    /// Local validation failed, nothing was sent
    Discarded,
    /// Snapshot arrived after a newer operation started
    Stale,
    /// Deletion waits for a cascade or promote choice
    NeedsChoice,
}

/// Monotonic counter identifying the latest tree-mutating operation
#[derive(Debug, Default)]
pub struct Generation(Cell<u64>);

impl Generation {
    /// Start a new operation and return its generation
    pub fn bump(&self) -> u64 {
        let next = self.0.get() + 1;
        self.0.set(next);
        next
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.0.get() == generation
    }
}

pub type SubscriptionId = usize;

/// Change listeners of an engine
#[derive(Default)]
pub struct Observers {
    next_id: Cell<SubscriptionId>,
    callbacks: RefCell<Vec<(SubscriptionId, Rc<dyn Fn()>)>>,
}

impl Observers {
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.callbacks.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.callbacks.borrow_mut().retain(|(sid, _)| *sid != id);
    }

    pub fn notify(&self) {
        // Callbacks may subscribe or read the engine again
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .callbacks
            .borrow()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_supersedes() {
        let generation = Generation::default();
        let first = generation.bump();
        assert!(generation.is_current(first));
        let second = generation.bump();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }

    #[test]
    fn test_observers_notify_and_unsubscribe() {
        let observers = Observers::default();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = observers.subscribe(move || h.set(h.get() + 1));
        observers.notify();
        observers.unsubscribe(id);
        observers.notify();
        assert_eq!(hits.get(), 1);
    }
}
