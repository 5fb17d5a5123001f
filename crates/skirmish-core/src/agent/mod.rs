//! Agents, their identifiers and the grid they live on.
//!
//! - [`AgentId`]: stable arena slot of an agent
//! - [`Kind`]: closed set of combat roles
//! - [`Grid`]: the bounded square map
//! - [`Agent`]: mutable entity with position, liveness and subscribers
//! - [`AgentRecord`]: plain value form used by generators and persistence
//!
//! # Liveness
//!
//! `alive` is an [`AtomicBool`] that only ever goes from `true` to `false`.
//! [`Agent::kill`] reports whether the call performed that transition, which
//! is what lets concurrent resolvers agree on a single winner.
//!
//! # Example
//!
//! ```
//! use glam::IVec2;
//! use skirmish_core::agent::{Agent, AgentId, Grid, Kind};
//!
//! let grid = Grid::new(100);
//! let mut rex = Agent::new(AgentId::new(0), "Rex", Kind::Predator, IVec2::new(98, 0));
//! rex.move_by(IVec2::new(10, -3), grid);
//! assert_eq!(rex.position(), IVec2::new(99, 0));
//! ```

pub mod kind;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::observer::{FightObserver, Subscribers};
use crate::rules::CombatRules;

pub use kind::{Kind, KindStats, KindTable};

/// Stable identifier of an agent.
///
/// The id is also the agent's slot in the world arena, so workers and
/// observers pass ids around instead of references.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Creates the id of arena slot `index`.
    ///
    /// Slots past `u32::MAX` saturate, which [`World::new`](crate::world::World::new)
    /// then rejects as a slot mismatch.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the arena slot.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.0)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Square map with coordinates in `[0, size - 1]` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: i32,
}

impl Grid {
    /// Creates a grid with `size` cells per axis.
    #[must_use]
    pub const fn new(size: i32) -> Self {
        Self { size }
    }

    /// Cells per axis.
    #[must_use]
    pub const fn size(self) -> i32 {
        self.size
    }

    /// Largest valid coordinate on either axis.
    #[must_use]
    pub const fn max_coord(self) -> i32 {
        self.size - 1
    }

    /// Returns `true` if `position` is on the map.
    #[must_use]
    pub fn contains(self, position: IVec2) -> bool {
        position.cmpge(IVec2::ZERO).all() && position.cmple(IVec2::splat(self.max_coord())).all()
    }

    /// Clamps each axis of `position` independently onto the map.
    #[must_use]
    pub fn clamp(self, position: IVec2) -> IVec2 {
        position.clamp(IVec2::ZERO, IVec2::splat(self.max_coord()))
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Returns `true` if `a` and `b` are at most `radius` apart.
///
/// Compares squared distances in integers; sums that overflow saturate, which
/// is always beyond any representable radius.
#[must_use]
pub fn within_range(a: IVec2, b: IVec2, radius: u32) -> bool {
    let dx = u64::from(a.x.abs_diff(b.x));
    let dy = u64::from(a.y.abs_diff(b.y));
    let radius = u64::from(radius);
    (dx * dx).saturating_add(dy * dy) <= radius * radius
}

/// Value form of an agent: everything except liveness and subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Combat role.
    pub kind: Kind,
    /// Display name.
    pub name: String,
    /// Grid position.
    pub position: IVec2,
}

impl AgentRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(kind: Kind, name: impl Into<String>, position: IVec2) -> Self {
        Self {
            kind,
            name: name.into(),
            position,
        }
    }
}

/// A simulated actor.
///
/// Name and kind never change. Position is mutated by the movement pass
/// under the world's write guard; liveness is atomic and may be flipped by
/// any resolver holding only a read guard.
#[derive(Debug)]
pub struct Agent {
    id: AgentId,
    name: String,
    kind: Kind,
    position: IVec2,
    alive: AtomicBool,
    subscribers: Subscribers,
}

impl Agent {
    /// Creates a live agent with no subscribers.
    #[must_use]
    pub fn new(id: AgentId, name: impl Into<String>, kind: Kind, position: IVec2) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            position,
            alive: AtomicBool::new(true),
            subscribers: Subscribers::new(),
        }
    }

    /// Creates a live agent from a record.
    #[must_use]
    pub fn from_record(id: AgentId, record: AgentRecord) -> Self {
        Self::new(id, record.name, record.kind, record.position)
    }

    /// Returns the agent's identifier.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Returns the agent's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the agent's combat role.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Returns the current position.
    #[must_use]
    pub const fn position(&self) -> IVec2 {
        self.position
    }

    /// Returns `true` until the agent has been killed.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Adds `delta` to the position, then clamps each axis onto `grid`.
    pub fn move_by(&mut self, delta: IVec2, grid: Grid) {
        self.position = grid.clamp(self.position.saturating_add(delta));
    }

    /// Returns `true` if `other` is at most `radius` away. Symmetric.
    #[must_use]
    pub fn distance_within(&self, other: &Self, radius: u32) -> bool {
        within_range(self.position, other.position, radius)
    }

    /// Returns whether an attacker of `attacker` kind may kill this agent.
    ///
    /// The defender's kind and the attacker's kind jointly select a cell of
    /// the [`CombatRules`] table.
    #[must_use]
    pub fn evaluate_as_defender(&self, attacker: Kind) -> bool {
        CombatRules::is_eligible(attacker, self.kind)
    }

    /// Marks the agent dead.
    ///
    /// Returns `true` only for the call that performed the transition; every
    /// later or concurrently losing call returns `false` and changes nothing.
    pub fn kill(&self) -> bool {
        self.alive
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Appends an observer. Observers are called in subscription order.
    pub fn subscribe(&mut self, observer: Arc<dyn FightObserver>) {
        self.subscribers.subscribe(observer);
    }

    /// Returns the subscriber list.
    #[must_use]
    pub const fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }

    /// Tells every subscriber that this agent fought `defender`.
    ///
    /// Runs synchronously on the calling thread.
    pub fn notify_kill(&self, defender: &Self, won: bool) {
        self.subscribers.notify(self, defender, won);
    }

    /// Returns an owned copy that shares this agent's subscribers.
    ///
    /// The copy reflects liveness at the time of the call and is not part of
    /// any world.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            position: self.position,
            alive: AtomicBool::new(self.is_alive()),
            subscribers: self.subscribers.clone(),
        }
    }

    /// Returns the value form of this agent.
    #[must_use]
    pub fn record(&self) -> AgentRecord {
        AgentRecord::new(self.kind, self.name.clone(), self.position)
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} at ({}, {})",
            self.kind, self.name, self.position.x, self.position.y
        )
    }
}
