//! Simulation context: the world, the queue, and the workers that share them.
//!
//! A [`Simulation`] bundles one [`World`], one [`EncounterQueue`], a
//! [`MovementScheduler`] and one or more [`CombatResolver`]s. It can be
//! driven two ways:
//!
//! - [`Simulation::step`] runs a movement tick and then drains the queue on
//!   the calling thread. Given the same seed and population this is fully
//!   reproducible.
//! - [`Simulation::start`] moves every worker onto its own named thread and
//!   returns a [`RunningSimulation`] handle. The workers share nothing but
//!   the world's guard, the queue and a [`StopSignal`].
//!
//! # Randomness
//!
//! Each worker gets its own `ChaCha8Rng` seeded from the master seed on a
//! separate stream: stream 0 for movement, stream `i + 1` for resolver `i`.
//!
//! # Example
//!
//! ```
//! use glam::IVec2;
//! use skirmish_core::config::SimConfig;
//! use skirmish_core::agent::Kind;
//! use skirmish_core::population::PopulationBuilder;
//! use skirmish_core::simulation::Simulation;
//!
//! let config = SimConfig {
//!     seed: Some(42),
//!     ..SimConfig::default()
//! };
//! let mut population = PopulationBuilder::new();
//! population.spawn(Kind::Predator, "Rex", IVec2::new(10, 10));
//! population.spawn(Kind::Brawler, "Tor", IVec2::new(12, 10));
//! let world = population.build(config.grid()).unwrap();
//!
//! let mut sim = Simulation::new(&config, world).unwrap();
//! for _ in 0..5 {
//!     sim.step();
//! }
//! assert_eq!(sim.tick(), 5);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::SimError;
use crate::movement::{MovementScheduler, MovementStats, TickReport};
use crate::queue::EncounterQueue;
use crate::resolver::{CombatResolver, ResolverStats};
use crate::world::World;

const MOVEMENT_THREAD: &str = "skirmish-movement";

/// Cooperative shutdown flag shared by every worker.
///
/// Workers check it at the top of each loop iteration; nothing is
/// interrupted mid-tick or mid-sleep.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Creates a lowered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` once the signal has been raised.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Result of one synchronous [`Simulation::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// The movement half.
    pub movement: TickReport,
    /// Encounters settled while draining the queue.
    pub settled: usize,
    /// Live agents after the step.
    pub alive: usize,
}

/// Totals returned when a threaded run is stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Movement worker totals.
    pub movement: MovementStats,
    /// One entry per resolver, in spawn order.
    pub resolvers: Vec<ResolverStats>,
    /// Encounters still queued at shutdown.
    pub unresolved: usize,
}

impl RunSummary {
    /// Resolver counters summed over all resolvers.
    #[must_use]
    pub fn combat(&self) -> ResolverStats {
        ResolverStats::merged(&self.resolvers)
    }
}

/// A world and its workers, not yet running on threads.
#[derive(Debug)]
pub struct Simulation {
    world: Arc<World>,
    queue: Arc<EncounterQueue>,
    scheduler: MovementScheduler,
    resolvers: Vec<CombatResolver>,
    stop: StopSignal,
    seed: u64,
}

impl Simulation {
    /// Wires `world` to a fresh queue and workers configured by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if `config` does not validate.
    pub fn new(config: &SimConfig, world: World) -> Result<Self, SimError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);

        let world = Arc::new(world);
        let queue = Arc::new(EncounterQueue::new());
        let scheduler = MovementScheduler::new(
            Arc::clone(&world),
            Arc::clone(&queue),
            config.kinds,
            config.tick_interval(),
            worker_rng(seed, 0),
        );
        let resolvers = (1..)
            .take(config.resolver_threads)
            .map(|stream| {
                CombatResolver::new(
                    Arc::clone(&world),
                    Arc::clone(&queue),
                    config.resolver_idle(),
                    worker_rng(seed, stream),
                )
            })
            .collect();

        Ok(Self {
            world,
            queue,
            scheduler,
            resolvers,
            stop: StopSignal::new(),
            seed,
        })
    }

    /// The shared world.
    #[must_use]
    pub const fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// The shared queue.
    #[must_use]
    pub const fn queue(&self) -> &Arc<EncounterQueue> {
        &self.queue
    }

    /// Master seed, either configured or drawn at construction.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Ticks completed so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.scheduler.stats().ticks
    }

    /// Runs one movement tick, then settles every queued encounter on this
    /// thread using the first resolver.
    pub fn step(&mut self) -> StepReport {
        let movement = self.scheduler.tick();
        let settled = self
            .resolvers
            .first_mut()
            .map_or(0, CombatResolver::drain_pending);
        StepReport {
            movement,
            settled,
            alive: self.world.alive_count(),
        }
    }

    /// Spawns the movement worker and every resolver on named threads.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ThreadSpawn`] if a thread cannot be started; any
    /// worker already running is stopped and joined first.
    pub fn start(self) -> Result<RunningSimulation, SimError> {
        let Self {
            world,
            queue,
            scheduler,
            resolvers,
            stop,
            seed,
        } = self;

        let mut running = RunningSimulation {
            world,
            queue,
            stop,
            movement: None,
            resolvers: Vec::with_capacity(resolvers.len()),
        };

        let signal = running.stop.clone();
        let handle = spawn_worker(MOVEMENT_THREAD.to_owned(), move || scheduler.run(&signal))?;
        running.movement = Some(handle);

        for (index, resolver) in resolvers.into_iter().enumerate() {
            let signal = running.stop.clone();
            let handle = spawn_worker(format!("skirmish-resolver-{index}"), move || {
                resolver.run(&signal)
            })?;
            running.resolvers.push(handle);
        }

        tracing::info!(
            seed,
            agents = running.world.len(),
            resolvers = running.resolvers.len(),
            "simulation started"
        );
        Ok(running)
    }
}

fn worker_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

fn spawn_worker<T, F>(name: String, work: F) -> Result<(String, JoinHandle<T>), SimError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(work)
        .map(|handle| (name.clone(), handle))
        .map_err(|source| SimError::ThreadSpawn { name, source })
}

fn join_worker<T>((name, handle): (String, JoinHandle<T>)) -> Result<T, SimError> {
    handle.join().map_err(|_| {
        tracing::warn!(worker = %name, "worker panicked");
        SimError::WorkerPanicked { name }
    })
}

/// Handle to a simulation whose workers are running on threads.
///
/// Dropping the handle stops and joins every worker.
#[derive(Debug)]
pub struct RunningSimulation {
    world: Arc<World>,
    queue: Arc<EncounterQueue>,
    stop: StopSignal,
    movement: Option<(String, JoinHandle<MovementStats>)>,
    resolvers: Vec<(String, JoinHandle<ResolverStats>)>,
}

impl RunningSimulation {
    /// The shared world, for display snapshots.
    #[must_use]
    pub const fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// Encounters waiting for a resolver.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// A clone of the stop signal.
    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Raises the stop signal and joins every worker.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::WorkerPanicked`] for the first worker that
    /// panicked. Every worker is joined regardless.
    pub fn stop(mut self) -> Result<RunSummary, SimError> {
        self.stop.stop();

        let movement = self.movement.take().map(join_worker).transpose();
        let resolvers: Vec<_> = self.resolvers.drain(..).map(join_worker).collect();

        let summary = RunSummary {
            movement: movement?.unwrap_or_default(),
            resolvers: resolvers.into_iter().collect::<Result<_, _>>()?,
            unresolved: self.queue.len(),
        };
        tracing::info!(
            ticks = summary.movement.ticks,
            kills = summary.combat().killed,
            unresolved = summary.unresolved,
            alive = self.world.alive_count(),
            "simulation stopped"
        );
        Ok(summary)
    }
}

impl Drop for RunningSimulation {
    fn drop(&mut self) {
        if self.movement.is_none() && self.resolvers.is_empty() {
            return;
        }
        self.stop.stop();
        if let Some(worker) = self.movement.take() {
            let _ = join_worker(worker);
        }
        for worker in self.resolvers.drain(..) {
            let _ = join_worker(worker);
        }
    }
}
