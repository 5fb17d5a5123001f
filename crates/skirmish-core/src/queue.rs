//! Hand-off channel between movement and combat resolution.
//!
//! The [`EncounterQueue`] is an unbounded FIFO of candidate
//! `(attacker, defender)` pairs behind its own mutex, with a condition
//! variable so idle resolvers can block instead of spinning. Entries are ids,
//! not copies of agents, so a queued pair always refers to the agent's
//! current state; a pair that has gone stale by the time it is popped is the
//! resolver's business.
//!
//! Duplicates are expected: the same pair is pushed on every tick the two
//! agents stay in range.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;

/// A candidate fight, produced when an eligible pair is in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Encounter {
    /// The agent that found the other in range.
    pub attacker: AgentId,
    /// The agent it may kill.
    pub defender: AgentId,
}

impl Encounter {
    /// Creates an encounter.
    #[must_use]
    pub const fn new(attacker: AgentId, defender: AgentId) -> Self {
        Self { attacker, defender }
    }
}

/// Thread-safe, unbounded FIFO of [`Encounter`]s.
#[derive(Debug, Default)]
pub struct EncounterQueue {
    pending: Mutex<VecDeque<Encounter>>,
    ready: Condvar,
}

impl EncounterQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Encounter>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends one encounter. Never blocks on consumers, never fails.
    pub fn push(&self, encounter: Encounter) {
        self.lock().push_back(encounter);
        self.ready.notify_one();
    }

    /// Appends a batch in order under a single lock acquisition.
    ///
    /// Returns the number of encounters pushed.
    pub fn push_batch(&self, encounters: impl IntoIterator<Item = Encounter>) -> usize {
        let pushed = {
            let mut pending = self.lock();
            let before = pending.len();
            pending.extend(encounters);
            pending.len() - before
        };
        match pushed {
            0 => {}
            1 => self.ready.notify_one(),
            _ => self.ready.notify_all(),
        }
        pushed
    }

    /// Removes the oldest encounter without waiting.
    pub fn try_pop(&self) -> Option<Encounter> {
        self.lock().pop_front()
    }

    /// Removes the oldest encounter, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `None` if the queue is still empty when the wait ends; an
    /// empty queue is the normal idle state.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Encounter> {
        let pending = self.lock();
        let (mut pending, _) = self
            .ready
            .wait_timeout_while(pending, timeout, |pending| pending.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        pending.pop_front()
    }

    /// Removes and returns every queued encounter, oldest first.
    pub fn drain_all(&self) -> Vec<Encounter> {
        self.lock().drain(..).collect()
    }

    /// Number of queued encounters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
