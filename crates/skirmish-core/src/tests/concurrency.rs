//! Threaded runs: racing resolvers, concurrent readers and shutdown.

use std::collections::HashSet;
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::agent::{AgentId, Kind};
use crate::config::SimConfig;
use crate::population::{self, PopulationBuilder};
use crate::queue::Encounter;
use crate::resolver::{settle, Contest, Outcome};
use crate::simulation::Simulation;

use super::helpers::{still_config, world_with, RecordingObserver, StallingObserver};

// =============================================================================
// Kill races
// =============================================================================

#[test]
fn racing_settles_kill_exactly_once() {
    let recorder = RecordingObserver::shared();
    let world = Arc::new(world_with(
        &still_config(0),
        &[(Kind::Predator, "Rex", 0, 0), (Kind::Brawler, "Tor", 1, 0)],
        recorder.clone(),
    ));
    let encounter = Encounter::new(AgentId::new(0), AgentId::new(1));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let world = Arc::clone(&world);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                settle(&world, encounter, || Contest::new(6, 1))
            })
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let killed = outcomes.iter().filter(|o| **o == Outcome::Killed).count();
    assert_eq!(killed, 1);
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, Outcome::Killed | Outcome::Stale)));
    assert_eq!(recorder.count(), 1);
}

#[test]
fn many_resolvers_notify_once_per_death() {
    let recorder = RecordingObserver::shared();
    let config = SimConfig {
        resolver_threads: 4,
        ..still_config(11)
    };
    let mut builder = PopulationBuilder::new();
    builder.spawn(Kind::Predator, "Rex", glam::IVec2::new(50, 50));
    for i in 0..20 {
        builder.spawn(Kind::Brawler, format!("B{i}"), glam::IVec2::new(48 + i % 5, 48 + i / 5));
    }
    builder.observe(recorder.clone());
    let world = builder.build(config.grid()).unwrap();

    let running = Simulation::new(&config, world).unwrap().start().unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while running.world().alive_count() > 1 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    let world = Arc::clone(running.world());
    let summary = running.stop().unwrap();

    let records = recorder.records();
    let dead = world.len() - world.alive_count();
    assert_eq!(records.len(), dead);
    assert_eq!(summary.combat().killed as usize, dead);
    assert!(records.iter().all(|r| r.won && r.attacker == "Rex"));
    let defenders: HashSet<_> = records.iter().map(|r| r.defender.clone()).collect();
    assert_eq!(defenders.len(), records.len());
    assert!(world.is_alive(AgentId::new(0)));
}

// =============================================================================
// Observers and the world guard
// =============================================================================

fn duel(observer: Arc<StallingObserver>) -> Arc<crate::world::World> {
    Arc::new(world_with(
        &still_config(0),
        &[(Kind::Predator, "Rex", 0, 0), (Kind::Brawler, "Tor", 1, 0)],
        observer,
    ))
}

#[test]
fn observer_can_read_world_while_sweep_waits() {
    let (observer, entered) = StallingObserver::shared(Duration::from_millis(50));
    let world = duel(observer.clone());
    observer.attach(&world);

    let (done_tx, done) = mpsc::channel();
    let resolver_world = Arc::clone(&world);
    thread::spawn(move || {
        let outcome = settle(
            &resolver_world,
            Encounter::new(AgentId::new(0), AgentId::new(1)),
            || Contest::new(6, 1),
        );
        let _ = done_tx.send(outcome);
    });

    entered.recv_timeout(Duration::from_secs(3)).unwrap();
    let sweep_world = Arc::clone(&world);
    let sweeper = thread::spawn(move || sweep_world.sweep(|agents| agents.len()));

    assert_eq!(
        done.recv_timeout(Duration::from_secs(3)),
        Ok(Outcome::Killed)
    );
    assert_eq!(sweeper.join().unwrap(), 2);
    assert_eq!(observer.alive_seen(), vec![1]);
}

#[test]
fn slow_observer_does_not_hold_up_movement() {
    let (observer, entered) = StallingObserver::shared(Duration::from_millis(300));
    let world = duel(observer);

    let resolver_world = Arc::clone(&world);
    let resolver = thread::spawn(move || {
        settle(
            &resolver_world,
            Encounter::new(AgentId::new(0), AgentId::new(1)),
            || Contest::new(6, 1),
        )
    });

    entered.recv_timeout(Duration::from_secs(3)).unwrap();
    let start = Instant::now();
    world.sweep(|_| ());
    assert!(start.elapsed() < Duration::from_millis(150));
    assert_eq!(resolver.join().unwrap(), Outcome::Killed);
}

// =============================================================================
// Readers and shutdown
// =============================================================================

#[test]
fn snapshots_stay_in_bounds_while_running() {
    let config = SimConfig {
        tick_interval_ms: 1,
        resolver_idle_ms: 1,
        resolver_threads: 2,
        seed: Some(3),
        ..SimConfig::default()
    };
    let grid = config.grid();
    let mut builder = PopulationBuilder::new();
    builder.extend(population::generate(50, grid, &mut ChaCha8Rng::seed_from_u64(3)));
    let world = builder.build(grid).unwrap();

    let running = Simulation::new(&config, world).unwrap().start().unwrap();
    for _ in 0..50 {
        let frame = running.world().snapshot_positions();
        assert!(frame.iter().all(|s| grid.contains(s.position)));
        let ids: Vec<_> = frame.iter().map(|s| s.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        thread::sleep(Duration::from_millis(1));
    }
    let summary = running.stop().unwrap();
    assert!(summary.movement.ticks > 0);
    assert_eq!(summary.resolvers.len(), 2);
}

#[test]
fn stop_returns_promptly_when_idle() {
    let recorder = RecordingObserver::shared();
    let config = still_config(4);
    let world = world_with(&config, &[(Kind::Prey, "Hop", 1, 1)], recorder.clone());
    let running = Simulation::new(&config, world).unwrap().start().unwrap();
    thread::sleep(Duration::from_millis(20));

    let start = Instant::now();
    let summary = running.stop().unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(summary.combat().resolved, 0);
    assert_eq!(summary.unresolved, 0);
    assert_eq!(recorder.count(), 0);
}
