//! # Skirmish Core
//!
//! A grid of agents that wander and kill each other, on real threads.
//!
//! ## Architecture
//!
//! - **World**: a fixed arena of [`Agent`]s behind one readers-writer guard.
//! - **Movement**: a [`MovementScheduler`] moves every live agent once per
//!   tick and pushes eligible pairs in range onto the [`EncounterQueue`].
//! - **Combat**: one or more [`CombatResolver`]s pop encounters, re-check
//!   them against the current world, roll dice, and kill the loser.
//! - **Observers**: every won fight is reported to the attacker's
//!   [`FightObserver`]s.
//!
//! Who may kill whom is fixed by [`CombatRules`]: predators kill brawlers,
//! brawlers kill prey, and nobody kills predators.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use skirmish_core::{population, FightTally, PopulationBuilder, SimConfig, Simulation};
//!
//! let config = SimConfig { seed: Some(1), ..SimConfig::default() };
//! let tally = Arc::new(FightTally::new());
//!
//! let mut builder = PopulationBuilder::new();
//! builder
//!     .extend(population::generate(20, config.grid(), &mut ChaCha8Rng::seed_from_u64(1)))
//!     .observe(tally.clone());
//!
//! let mut sim = Simulation::new(&config, builder.build(config.grid())?)?;
//! for _ in 0..10 {
//!     sim.step();
//! }
//! assert_eq!(sim.world().alive_count() as u64 + tally.kills(), 20);
//! # Ok::<(), skirmish_core::SimError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod agent;
pub mod config;
pub mod error;
pub mod movement;
pub mod observer;
pub mod persist;
pub mod population;
pub mod queue;
pub mod resolver;
pub mod rules;
pub mod simulation;
pub mod world;

pub use agent::{Agent, AgentId, AgentRecord, Grid, Kind, KindStats, KindTable};
pub use config::SimConfig;
pub use error::{ConfigError, PersistError, SimError, WorldError};
pub use movement::MovementScheduler;
pub use observer::{FightLog, FightObserver, FightTally, TracingReporter};
pub use population::PopulationBuilder;
pub use queue::{Encounter, EncounterQueue};
pub use resolver::{CombatResolver, Outcome};
pub use rules::CombatRules;
pub use simulation::{RunSummary, RunningSimulation, Simulation, StepReport, StopSignal};
pub use world::World;

#[cfg(test)]
mod tests;
