//! Combat resolution.
//!
//! A [`CombatResolver`] drains the [`EncounterQueue`] and settles each
//! encounter against the live world:
//!
//! 1. If either participant is already dead, the encounter is stale and is
//!    dropped without a roll. Staleness is expected: movement keeps queuing
//!    while earlier pairs are being resolved.
//! 2. Otherwise both sides roll a six-sided die. The attacker wins only on a
//!    strictly higher roll; ties go to the defender.
//! 3. On a win the resolver tries to kill the defender. Only the resolver
//!    whose [`Agent::kill`](crate::agent::Agent::kill) performed the
//!    transition notifies the attacker's subscribers, so concurrent resolvers
//!    produce exactly one notification per death.
//!
//! Resolvers pop from the queue first and take the world's read guard only
//! afterwards. The guard is released before any observer runs; observers
//! receive detached copies of both agents and may read the world freely.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::queue::{Encounter, EncounterQueue};
use crate::simulation::StopSignal;
use crate::world::{lookup, World};

/// One pair of die rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contest {
    /// Attacker's roll, `1..=6`.
    pub attacker_roll: u8,
    /// Defender's roll, `1..=6`.
    pub defender_roll: u8,
}

impl Contest {
    /// Faces on the contest die.
    pub const DIE_FACES: u8 = 6;

    /// Creates a contest from fixed rolls.
    #[must_use]
    pub const fn new(attacker_roll: u8, defender_roll: u8) -> Self {
        Self {
            attacker_roll,
            defender_roll,
        }
    }

    /// Draws two independent uniform rolls.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(
            rng.gen_range(1..=Self::DIE_FACES),
            rng.gen_range(1..=Self::DIE_FACES),
        )
    }

    /// `true` if the attacker rolled strictly higher.
    #[must_use]
    pub const fn attacker_wins(self) -> bool {
        self.attacker_roll > self.defender_roll
    }
}

/// How an encounter ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// A participant was already dead, or another resolver won the kill.
    Stale,
    /// The defender survived the contest.
    Repelled,
    /// The defender died and the attacker's subscribers were notified.
    Killed,
}

/// Per-resolver counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverStats {
    /// Encounters taken off the queue.
    pub resolved: u64,
    /// Encounters ending in [`Outcome::Killed`].
    pub killed: u64,
    /// Encounters ending in [`Outcome::Repelled`].
    pub repelled: u64,
    /// Encounters ending in [`Outcome::Stale`].
    pub stale: u64,
}

impl ResolverStats {
    fn record(&mut self, outcome: Outcome) {
        self.resolved += 1;
        match outcome {
            Outcome::Stale => self.stale += 1,
            Outcome::Repelled => self.repelled += 1,
            Outcome::Killed => self.killed += 1,
        }
    }

    /// Sums counters from several resolvers.
    #[must_use]
    pub fn merged<'a>(all: impl IntoIterator<Item = &'a Self>) -> Self {
        all.into_iter().fold(Self::default(), |acc, s| Self {
            resolved: acc.resolved + s.resolved,
            killed: acc.killed + s.killed,
            repelled: acc.repelled + s.repelled,
            stale: acc.stale + s.stale,
        })
    }
}

/// Consumer side of the encounter queue.
#[derive(Debug)]
pub struct CombatResolver {
    world: Arc<World>,
    queue: Arc<EncounterQueue>,
    idle_wait: Duration,
    rng: ChaCha8Rng,
    stats: ResolverStats,
}

impl CombatResolver {
    /// Creates a resolver that waits up to `idle_wait` per empty poll.
    #[must_use]
    pub fn new(
        world: Arc<World>,
        queue: Arc<EncounterQueue>,
        idle_wait: Duration,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            world,
            queue,
            idle_wait,
            rng,
            stats: ResolverStats::default(),
        }
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// Settles `encounter`, rolling dice from this resolver's generator.
    pub fn resolve(&mut self, encounter: Encounter) -> Outcome {
        let rng = &mut self.rng;
        let outcome = settle(&self.world, encounter, || Contest::roll(rng));
        self.stats.record(outcome);
        outcome
    }

    /// Pops and settles one encounter, waiting up to the idle interval.
    ///
    /// Returns `None` if the queue stayed empty.
    pub fn resolve_next(&mut self) -> Option<Outcome> {
        let encounter = self.queue.pop_timeout(self.idle_wait)?;
        Some(self.resolve(encounter))
    }

    /// Settles everything currently queued without waiting.
    ///
    /// Returns the number of encounters settled.
    pub fn drain_pending(&mut self) -> usize {
        let mut settled = 0;
        while let Some(encounter) = self.queue.try_pop() {
            self.resolve(encounter);
            settled += 1;
        }
        settled
    }

    /// Resolves until `stop` is raised.
    pub fn run(mut self, stop: &StopSignal) -> ResolverStats {
        tracing::info!("combat resolver started");
        while !stop.is_stopped() {
            self.resolve_next();
        }
        tracing::info!(
            resolved = self.stats.resolved,
            killed = self.stats.killed,
            repelled = self.stats.repelled,
            stale = self.stats.stale,
            "combat resolver stopped"
        );
        self.stats
    }
}

/// Settles one encounter against `world`.
///
/// `roll` is only called when both participants are alive. Unknown ids are
/// treated like dead agents.
///
/// The kill is decided under the world's read guard. Subscribers are notified
/// after the guard is dropped, so they never hold up the movement pass.
pub fn settle(world: &World, encounter: Encounter, roll: impl FnOnce() -> Contest) -> Outcome {
    let (attacker, defender) = {
        let agents = world.agents();
        let (Some(attacker), Some(defender)) = (
            lookup(&agents, encounter.attacker),
            lookup(&agents, encounter.defender),
        ) else {
            return Outcome::Stale;
        };

        if !attacker.is_alive() || !defender.is_alive() {
            tracing::trace!(
                attacker = %encounter.attacker,
                defender = %encounter.defender,
                "stale encounter discarded"
            );
            return Outcome::Stale;
        }

        let contest = roll();
        if !contest.attacker_wins() {
            tracing::debug!(
                attacker = attacker.name(),
                defender = defender.name(),
                attacker_roll = contest.attacker_roll,
                defender_roll = contest.defender_roll,
                "attack repelled"
            );
            return Outcome::Repelled;
        }

        if !defender.kill() {
            return Outcome::Stale;
        }
        tracing::debug!(
            attacker = attacker.name(),
            defender = defender.name(),
            attacker_roll = contest.attacker_roll,
            defender_roll = contest.defender_roll,
            "defender killed"
        );
        (attacker.detached(), defender.detached())
    };

    attacker.notify_kill(&defender, true);
    Outcome::Killed
}
