//! Periodic movement and proximity pass.
//!
//! Once per tick the [`MovementScheduler`] takes the world's write guard and:
//!
//! 1. moves every live agent, in id order, by a uniform random delta in
//!    `[-move_range, move_range]` on each axis;
//! 2. scans the moved frame for live pairs within the mover's `kill_range`
//!    whose kinds are eligible, and pushes them onto the [`EncounterQueue`].
//!
//! Every proximity check in a tick therefore sees post-move positions for
//! every agent. The scan runs movers in parallel with rayon, but collects
//! results in mover order, so the enqueue order is fixed.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use glam::IVec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, KindStats, KindTable};
use crate::queue::{Encounter, EncounterQueue};
use crate::rules::CombatRules;
use crate::simulation::StopSignal;
use crate::world::World;

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// 1-based tick number.
    pub tick: u64,
    /// Live agents moved.
    pub moved: usize,
    /// Encounters pushed.
    pub encounters: usize,
}

/// Running totals of a scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementStats {
    /// Ticks completed.
    pub ticks: u64,
    /// Encounters pushed across all ticks.
    pub encounters: u64,
}

/// Moves agents and emits encounters, one synchronous tick at a time.
#[derive(Debug)]
pub struct MovementScheduler {
    world: Arc<World>,
    queue: Arc<EncounterQueue>,
    kinds: KindTable<KindStats>,
    interval: Duration,
    rng: ChaCha8Rng,
    totals: MovementStats,
}

impl MovementScheduler {
    /// Creates a scheduler over `world` that feeds `queue`.
    #[must_use]
    pub fn new(
        world: Arc<World>,
        queue: Arc<EncounterQueue>,
        kinds: KindTable<KindStats>,
        interval: Duration,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            world,
            queue,
            kinds,
            interval,
            rng,
            totals: MovementStats::default(),
        }
    }

    /// Totals so far.
    #[must_use]
    pub const fn stats(&self) -> MovementStats {
        self.totals
    }

    /// Runs one tick: move everyone, then enqueue eligible pairs in range.
    pub fn tick(&mut self) -> TickReport {
        let Self {
            world,
            queue,
            kinds,
            rng,
            ..
        } = self;
        let grid = world.grid();

        let (moved, encounters) = world.sweep(|agents| {
            let mut moved = 0;
            for agent in agents.iter_mut().filter(|agent| agent.is_alive()) {
                let range = kinds.get(agent.kind()).move_range.max(0);
                let delta = IVec2::new(rng.gen_range(-range..=range), rng.gen_range(-range..=range));
                agent.move_by(delta, grid);
                moved += 1;
            }
            let found = find_encounters(agents, kinds);
            (moved, queue.push_batch(found))
        });

        self.totals.ticks += 1;
        self.totals.encounters += u64::try_from(encounters).unwrap_or(u64::MAX);
        tracing::debug!(tick = self.totals.ticks, moved, encounters, "movement tick");

        TickReport {
            tick: self.totals.ticks,
            moved,
            encounters,
        }
    }

    /// Ticks until `stop` is raised, sleeping the tick interval in between.
    ///
    /// The signal is checked before every tick; a sleep in progress is not
    /// interrupted.
    pub fn run(mut self, stop: &StopSignal) -> MovementStats {
        tracing::info!(
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "movement scheduler started"
        );
        while !stop.is_stopped() {
            self.tick();
            thread::sleep(self.interval);
        }
        tracing::info!(
            ticks = self.totals.ticks,
            encounters = self.totals.encounters,
            "movement scheduler stopped"
        );
        self.totals
    }
}

/// Every eligible `(mover, target)` pair within the mover's kill range.
///
/// Dead agents are skipped both as movers and as targets. Output is ordered
/// by mover id, then target id.
#[must_use]
pub fn find_encounters(agents: &[Agent], kinds: &KindTable<KindStats>) -> Vec<Encounter> {
    agents
        .par_iter()
        .filter(|mover| mover.is_alive() && !CombatRules::victims_of(mover.kind()).is_empty())
        .flat_map_iter(|mover| {
            let radius = kinds.get(mover.kind()).kill_range;
            agents
                .iter()
                .filter(move |target| {
                    target.id() != mover.id()
                        && target.is_alive()
                        && mover.distance_within(target, radius)
                        && target.evaluate_as_defender(mover.kind())
                })
                .map(move |target| Encounter::new(mover.id(), target.id()))
        })
        .collect()
}
