//! Building the initial population.
//!
//! A world's membership is fixed once built, so everything that has to be
//! attached to agents, observers included, is collected here first.

use std::sync::Arc;

use glam::IVec2;
use rand::Rng;

use crate::agent::{Agent, AgentId, AgentRecord, Grid, Kind};
use crate::error::WorldError;
use crate::observer::FightObserver;
use crate::world::World;

/// Draws `count` agents with uniform kinds and uniform in-bounds positions.
///
/// Agents are named `NPC_0`, `NPC_1`, and so on.
pub fn generate<R: Rng + ?Sized>(count: usize, grid: Grid, rng: &mut R) -> Vec<AgentRecord> {
    (0..count)
        .map(|i| {
            let kind = Kind::ALL[rng.gen_range(0..Kind::ALL.len())];
            let position = IVec2::new(
                rng.gen_range(0..grid.size()),
                rng.gen_range(0..grid.size()),
            );
            AgentRecord::new(kind, format!("NPC_{i}"), position)
        })
        .collect()
}

/// Collects agent records and observers, then builds a [`World`].
#[derive(Default)]
pub struct PopulationBuilder {
    records: Vec<AgentRecord>,
    observers: Vec<Arc<dyn FightObserver>>,
}

impl PopulationBuilder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one agent and returns the id it will have in the world.
    pub fn spawn(&mut self, kind: Kind, name: impl Into<String>, position: IVec2) -> AgentId {
        self.push(AgentRecord::new(kind, name, position))
    }

    /// Adds one agent from a record.
    pub fn push(&mut self, record: AgentRecord) -> AgentId {
        let id = AgentId::from_index(self.records.len());
        self.records.push(record);
        id
    }

    /// Adds agents in order.
    pub fn extend(&mut self, records: impl IntoIterator<Item = AgentRecord>) -> &mut Self {
        self.records.extend(records);
        self
    }

    /// Registers `observer` on every agent. Observers are notified in
    /// registration order.
    pub fn observe(&mut self, observer: Arc<dyn FightObserver>) -> &mut Self {
        self.observers.push(observer);
        self
    }

    /// Agents collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no agent has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Builds the world, assigning ids in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if a position lies outside `grid`.
    pub fn build(self, grid: Grid) -> Result<World, WorldError> {
        let Self { records, observers } = self;
        let agents = records
            .into_iter()
            .enumerate()
            .map(|(slot, record)| {
                let mut agent = Agent::from_record(AgentId::from_index(slot), record);
                for observer in &observers {
                    agent.subscribe(Arc::clone(observer));
                }
                agent
            })
            .collect();
        World::new(grid, agents)
    }
}

impl std::fmt::Debug for PopulationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopulationBuilder")
            .field("records", &self.records.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
