//! Fight notifications.
//!
//! Each agent owns an ordered [`Subscribers`] list. When a resolver kills a
//! defender it calls [`Agent::notify_kill`] on the attacker, which runs every
//! subscriber synchronously on the resolver's thread, in subscription order.
//! A slow observer therefore slows the resolver down; that is the only
//! backpressure in the system.
//!
//! The resolver drops the world guard before notifying. Observers see
//! [detached](Agent::detached) copies of both agents, with the defender
//! already dead, and may call back into the [`World`](crate::world::World).
//!
//! Observers are shared (`Arc`) and outlive any single agent. They are
//! constructed by the caller and registered explicitly, usually once per
//! agent at population time (see
//! [`PopulationBuilder::observe`](crate::population::PopulationBuilder::observe)).
//!
//! # Built-in observers
//!
//! - [`TracingReporter`]: logs each kill through `tracing`
//! - [`FightLog`]: appends one line per kill to any writer, flushing each time
//! - [`FightTally`]: counts kills

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::agent::Agent;

/// Receiver of fight outcomes.
///
/// Implementations must be cheap or accept that they throttle the resolver.
pub trait FightObserver: Send + Sync {
    /// Called after `attacker` fought `defender`.
    ///
    /// The core only reports won encounters, so `won` is `true` for every
    /// call it makes; implementations should still honour the flag.
    fn on_fight(&self, attacker: &Agent, defender: &Agent, won: bool);
}

/// Ordered, append-only list of observers attached to one agent.
#[derive(Clone, Default)]
pub struct Subscribers {
    observers: Vec<Arc<dyn FightObserver>>,
}

impl Subscribers {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observer.
    pub fn subscribe(&mut self, observer: Arc<dyn FightObserver>) {
        self.observers.push(observer);
    }

    /// Calls every observer in order.
    pub fn notify(&self, attacker: &Agent, defender: &Agent, won: bool) {
        for observer in &self.observers {
            observer.on_fight(attacker, defender, won);
        }
    }

    /// Number of observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns `true` if nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscribers[{}]", self.observers.len())
    }
}

/// Logs kills at `info` level under the `skirmish::fight` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl FightObserver for TracingReporter {
    fn on_fight(&self, attacker: &Agent, defender: &Agent, won: bool) {
        if won {
            tracing::info!(
                target: "skirmish::fight",
                attacker = attacker.name(),
                defender = defender.name(),
                "{} killed {}",
                attacker.name(),
                defender.name()
            );
        }
    }
}

/// Durable kill log: one `Murder: <attacker> killed <defender>` line per kill.
///
/// Every line is flushed immediately so the log survives an abrupt exit.
/// Write failures are logged and otherwise ignored; the simulation does not
/// stop because its log is unwritable.
pub struct FightLog<W: Write + Send> {
    sink: Mutex<W>,
}

impl<W: Write + Send> FightLog<W> {
    /// Wraps a writer.
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FightLog<File> {
    /// Creates (or truncates) a log file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        File::create(path).map(Self::new)
    }
}

impl<W: Write + Send> FightObserver for FightLog<W> {
    fn on_fight(&self, attacker: &Agent, defender: &Agent, won: bool) {
        if !won {
            return;
        }
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let written = writeln!(sink, "Murder: {} killed {}", attacker.name(), defender.name())
            .and_then(|()| sink.flush());
        if let Err(err) = written {
            tracing::warn!(error = %err, "fight log write failed");
        }
    }
}

impl<W: Write + Send> fmt::Debug for FightLog<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FightLog").finish_non_exhaustive()
    }
}

/// Counts reported kills.
#[derive(Debug, Default)]
pub struct FightTally {
    kills: AtomicU64,
}

impl FightTally {
    /// Creates a zeroed tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Kills observed so far.
    #[must_use]
    pub fn kills(&self) -> u64 {
        self.kills.load(Ordering::Relaxed)
    }
}

impl FightObserver for FightTally {
    fn on_fight(&self, _attacker: &Agent, _defender: &Agent, won: bool) {
        if won {
            self.kills.fetch_add(1, Ordering::Relaxed);
        }
    }
}
