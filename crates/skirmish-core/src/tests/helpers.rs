//! Test helper functions and observers.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;
use std::time::Duration;

use glam::IVec2;

use crate::agent::{Agent, Kind, KindStats, KindTable};
use crate::config::SimConfig;
use crate::observer::FightObserver;
use crate::population::PopulationBuilder;
use crate::world::World;

// =============================================================================
// Observers
// =============================================================================

/// One observed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FightRecord {
    /// Attacker name.
    pub attacker: String,
    /// Defender name.
    pub defender: String,
    /// Whether the attacker won.
    pub won: bool,
}

/// Stores every notification it receives, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<FightRecord>>,
}

impl RecordingObserver {
    /// Creates a shared, empty recorder.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Everything received so far.
    pub fn records(&self) -> Vec<FightRecord> {
        self.seen.lock().unwrap().clone()
    }

    /// Number of notifications received.
    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl FightObserver for RecordingObserver {
    fn on_fight(&self, attacker: &Agent, defender: &Agent, won: bool) {
        self.seen.lock().unwrap().push(FightRecord {
            attacker: attacker.name().to_owned(),
            defender: defender.name().to_owned(),
            won,
        });
    }
}

/// Announces each notification, sleeps, then reads the world it is attached
/// to, if any.
#[derive(Debug)]
pub struct StallingObserver {
    pause: Duration,
    entered: Mutex<Sender<()>>,
    world: OnceLock<Weak<World>>,
    alive_seen: Mutex<Vec<usize>>,
}

impl StallingObserver {
    /// Creates an observer that sleeps for `pause` per notification, plus the
    /// receiver that hears about each notification as it starts.
    pub fn shared(pause: Duration) -> (Arc<Self>, Receiver<()>) {
        let (entered, rx) = mpsc::channel();
        let observer = Arc::new(Self {
            pause,
            entered: Mutex::new(entered),
            world: OnceLock::new(),
            alive_seen: Mutex::new(Vec::new()),
        });
        (observer, rx)
    }

    /// Makes every later notification call back into `world`.
    pub fn attach(&self, world: &Arc<World>) {
        self.world.set(Arc::downgrade(world)).unwrap();
    }

    /// Live counts read from the world during notifications.
    pub fn alive_seen(&self) -> Vec<usize> {
        self.alive_seen.lock().unwrap().clone()
    }
}

impl FightObserver for StallingObserver {
    fn on_fight(&self, _attacker: &Agent, _defender: &Agent, _won: bool) {
        let _ = self.entered.lock().unwrap().send(());
        thread::sleep(self.pause);
        if let Some(world) = self.world.get().and_then(Weak::upgrade) {
            let alive = world.alive_count();
            self.alive_seen.lock().unwrap().push(alive);
        }
    }
}

// =============================================================================
// Setup
// =============================================================================

/// Kind stats where nobody moves and everybody engages within `kill_range`.
pub fn still_kinds(kill_range: u32) -> KindTable<KindStats> {
    KindTable::from_fn(|_| KindStats::new(0, kill_range))
}

/// A fast config with no movement, suitable for threaded tests.
pub fn still_config(seed: u64) -> SimConfig {
    SimConfig {
        tick_interval_ms: 1,
        resolver_idle_ms: 1,
        seed: Some(seed),
        kinds: still_kinds(5),
        ..SimConfig::default()
    }
}

/// Builds a world from `(kind, name, x, y)` tuples, with `observer`
/// subscribed on every agent.
pub fn world_with(
    config: &SimConfig,
    agents: &[(Kind, &str, i32, i32)],
    observer: Arc<dyn FightObserver>,
) -> World {
    let mut builder = PopulationBuilder::new();
    for &(kind, name, x, y) in agents {
        builder.spawn(kind, name, IVec2::new(x, y));
    }
    builder.observe(observer);
    builder.build(config.grid()).unwrap()
}
