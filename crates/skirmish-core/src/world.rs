//! The shared agent arena.
//!
//! A [`World`] owns every agent for the lifetime of a simulation. Membership
//! is fixed at construction: agents are never added or removed, and death is
//! a flag, so an [`AgentId`] stays a valid slot forever.
//!
//! # Concurrency
//!
//! The arena sits behind a single [`RwLock`]:
//!
//! - The movement pass takes the write guard ([`World::sweep`],
//!   [`World::for_each_live`]) and mutates positions for every agent in one
//!   go, so no reader ever sees a half-moved frame.
//! - Display snapshots ([`World::snapshot_positions`]) and resolvers
//!   ([`World::agents`]) take read guards and may run together.
//! - Liveness is atomic per agent, so a resolver can kill under a read guard.
//!
//! The encounter queue has its own lock. The movement pass pushes while it
//! holds the world's write guard; resolvers pop first and only then take a
//! read guard. Neither side acquires the two locks in the opposite order.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId, AgentRecord, Grid, Kind, KindTable};
use crate::error::WorldError;

/// One live agent as seen by the display collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sighting {
    /// Which agent.
    pub id: AgentId,
    /// Where it is.
    pub position: IVec2,
    /// Map symbol of its kind.
    pub symbol: char,
}

/// Live agents per kind.
pub type Census = KindTable<usize>;

/// Fixed-membership arena of agents on a grid.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    agents: RwLock<Vec<Agent>>,
}

impl World {
    /// Takes ownership of a population.
    ///
    /// # Errors
    ///
    /// Rejects a population whose ids are not `0..len` in order, that has an
    /// agent outside `grid`, or that contains a dead agent.
    pub fn new(grid: Grid, agents: Vec<Agent>) -> Result<Self, WorldError> {
        for (slot, agent) in agents.iter().enumerate() {
            if agent.id().index() != slot {
                return Err(WorldError::SlotMismatch {
                    id: agent.id(),
                    slot,
                });
            }
            if !grid.contains(agent.position()) {
                return Err(WorldError::OutOfBounds {
                    id: agent.id(),
                    x: agent.position().x,
                    y: agent.position().y,
                });
            }
            if !agent.is_alive() {
                return Err(WorldError::AlreadyDead(agent.id()));
            }
        }
        tracing::debug!(agents = agents.len(), size = grid.size(), "world created");
        Ok(Self {
            grid,
            agents: RwLock::new(agents),
        })
    }

    /// The map.
    #[must_use]
    pub const fn grid(&self) -> Grid {
        self.grid
    }

    /// Number of agents, dead or alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents().len()
    }

    /// Returns `true` for an empty population.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents().is_empty()
    }

    /// Read access to the whole arena.
    ///
    /// Blocks while a movement pass is in progress. Index with
    /// [`AgentId::index`] or use [`lookup`].
    pub fn agents(&self) -> RwLockReadGuard<'_, Vec<Agent>> {
        self.agents.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn agents_mut(&self) -> RwLockWriteGuard<'_, Vec<Agent>> {
        self.agents.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with exclusive access to every agent.
    ///
    /// This is the movement pass's critical section.
    pub fn sweep<R>(&self, f: impl FnOnce(&mut [Agent]) -> R) -> R {
        let mut agents = self.agents_mut();
        f(&mut agents)
    }

    /// Runs `f` on every live agent, in id order, under the write guard.
    pub fn for_each_live(&self, mut f: impl FnMut(&mut Agent)) {
        self.sweep(|agents| {
            agents
                .iter_mut()
                .filter(|agent| agent.is_alive())
                .for_each(&mut f);
        });
    }

    /// Positions and symbols of every live agent, in id order, from one
    /// consistent frame.
    #[must_use]
    pub fn snapshot_positions(&self) -> Vec<Sighting> {
        self.agents()
            .iter()
            .filter(|agent| agent.is_alive())
            .map(|agent| Sighting {
                id: agent.id(),
                position: agent.position(),
                symbol: agent.kind().symbol(),
            })
            .collect()
    }

    /// Returns `true` if `id` names a live agent.
    #[must_use]
    pub fn is_alive(&self, id: AgentId) -> bool {
        lookup(&self.agents(), id).is_some_and(Agent::is_alive)
    }

    /// Number of live agents.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.agents().iter().filter(|agent| agent.is_alive()).count()
    }

    /// Live agents per kind.
    #[must_use]
    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for agent in self.agents().iter().filter(|agent| agent.is_alive()) {
            *census.get_mut(agent.kind()) += 1;
        }
        census
    }

    /// Records of live agents, in id order.
    #[must_use]
    pub fn survivors(&self) -> Vec<AgentRecord> {
        self.agents()
            .iter()
            .filter(|agent| agent.is_alive())
            .map(Agent::record)
            .collect()
    }

    /// Records of every agent, in id order.
    #[must_use]
    pub fn records(&self) -> Vec<AgentRecord> {
        self.agents().iter().map(Agent::record).collect()
    }

    /// Kind of the agent at `id`, if it exists. Kinds never change.
    #[must_use]
    pub fn kind_of(&self, id: AgentId) -> Option<Kind> {
        lookup(&self.agents(), id).map(Agent::kind)
    }
}

/// Looks an agent up by id in a borrowed arena.
#[must_use]
pub fn lookup(agents: &[Agent], id: AgentId) -> Option<&Agent> {
    agents.get(id.index())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: u32, kind: Kind, x: i32, y: i32) -> Agent {
        Agent::new(AgentId::new(id), format!("a{id}"), kind, IVec2::new(x, y))
    }

    fn small_world() -> World {
        World::new(
            Grid::new(10),
            vec![
                agent(0, Kind::Predator, 0, 0),
                agent(1, Kind::Brawler, 5, 5),
                agent(2, Kind::Prey, 9, 9),
            ],
        )
        .unwrap()
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn accepts_valid_population() {
            let world = small_world();
            assert_eq!(world.len(), 3);
            assert_eq!(world.alive_count(), 3);
            assert!(!world.is_empty());
        }

        #[test]
        fn rejects_slot_mismatch() {
            let err = World::new(Grid::new(10), vec![agent(1, Kind::Prey, 0, 0)]).unwrap_err();
            assert!(matches!(err, WorldError::SlotMismatch { slot: 0, .. }));
        }

        #[test]
        fn rejects_out_of_bounds() {
            let err = World::new(Grid::new(10), vec![agent(0, Kind::Prey, 10, 0)]).unwrap_err();
            assert!(matches!(err, WorldError::OutOfBounds { x: 10, y: 0, .. }));
        }

        #[test]
        fn rejects_dead_agent() {
            let dead = agent(0, Kind::Prey, 0, 0);
            dead.kill();
            let err = World::new(Grid::new(10), vec![dead]).unwrap_err();
            assert!(matches!(err, WorldError::AlreadyDead(_)));
        }
    }

    mod snapshot_tests {
        use super::*;

        #[test]
        fn snapshot_omits_dead() {
            let world = small_world();
            world.agents()[1].kill();
            let ids: Vec<_> = world
                .snapshot_positions()
                .iter()
                .map(|s| s.id.as_u32())
                .collect();
            assert_eq!(ids, vec![0, 2]);
        }

        #[test]
        fn snapshot_carries_symbol_and_position() {
            let world = small_world();
            let first = world.snapshot_positions()[0];
            assert_eq!(first.symbol, 'D');
            assert_eq!(first.position, IVec2::ZERO);
        }
    }

    mod mutation_tests {
        use super::*;

        #[test]
        fn for_each_live_skips_dead() {
            let world = small_world();
            world.agents()[0].kill();
            let mut visited = Vec::new();
            world.for_each_live(|agent| {
                visited.push(agent.id().as_u32());
                agent.move_by(IVec2::new(-1, 0), Grid::new(10));
            });
            assert_eq!(visited, vec![1, 2]);
            assert_eq!(world.agents()[1].position(), IVec2::new(4, 5));
            assert_eq!(world.agents()[0].position(), IVec2::ZERO);
        }

        #[test]
        fn sweep_returns_closure_value() {
            let world = small_world();
            let count = world.sweep(|agents| agents.len());
            assert_eq!(count, 3);
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn census_counts_live_per_kind() {
            let world = small_world();
            world.agents()[2].kill();
            let census = world.census();
            assert_eq!(census.predator, 1);
            assert_eq!(census.brawler, 1);
            assert_eq!(census.prey, 0);
        }

        #[test]
        fn survivors_and_records() {
            let world = small_world();
            world.agents()[0].kill();
            assert_eq!(world.survivors().len(), 2);
            assert_eq!(world.records().len(), 3);
            assert!(!world.is_alive(AgentId::new(0)));
            assert!(!world.is_alive(AgentId::new(99)));
            assert_eq!(world.kind_of(AgentId::new(2)), Some(Kind::Prey));
        }
    }
}
