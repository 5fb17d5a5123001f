//! Skirmish terminal driver.
//!
//! Builds a population, runs the simulation on worker threads, prints the
//! map once per frame and lists the survivors at the end.

mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_core::{
    persist, population, FightLog, PopulationBuilder, SimConfig, Simulation, TracingReporter,
};
use tracing_subscriber::EnvFilter;

/// Grid skirmish between predators, brawlers and prey
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(about = "Run the grid skirmish simulation in the terminal")]
struct Args {
    /// JSON config file; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Master seed for population and workers
    #[arg(long)]
    seed: Option<u64>,

    /// Number of agents to generate (ignored with --load)
    #[arg(long)]
    population: Option<usize>,

    /// Number of combat resolver threads
    #[arg(long)]
    resolvers: Option<usize>,

    /// Frames to display before stopping
    #[arg(long, default_value_t = 30)]
    frames: u32,

    /// Milliseconds between frames
    #[arg(long, default_value_t = 1000)]
    frame_ms: u64,

    /// Load agents from a record file instead of generating them
    #[arg(long)]
    load: Option<PathBuf>,

    /// Save the survivors to a record file after the run
    #[arg(long)]
    save: Option<PathBuf>,

    /// Kill log, one line per fight won
    #[arg(long, default_value = "log.txt")]
    fight_log: PathBuf,

    /// Skip printing the map each frame
    #[arg(long)]
    no_map: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("skirmish=info")),
        )
        .init();

    run(Args::parse())
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(population) = args.population {
        config.population = population;
    }
    if let Some(resolvers) = args.resolvers {
        config.resolver_threads = resolvers;
    }
    config.seed = Some(config.seed.unwrap_or_else(rand::random));
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let seed = config.seed.unwrap_or_default();
    let grid = config.grid();

    let records = match &args.load {
        Some(path) => persist::load_from_path(path)
            .with_context(|| format!("loading agents from {}", path.display()))?,
        None => population::generate(
            config.population,
            grid,
            &mut ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
        ),
    };
    let fight_log = FightLog::create(&args.fight_log)
        .with_context(|| format!("creating fight log {}", args.fight_log.display()))?;

    let mut builder = PopulationBuilder::new();
    builder
        .extend(records)
        .observe(Arc::new(TracingReporter))
        .observe(Arc::new(fight_log));
    let world = builder.build(grid).context("building world")?;

    tracing::info!(seed, agents = world.len(), frames = args.frames, "starting run");
    let running = Simulation::new(&config, world)?.start()?;

    for frame in 1..=args.frames {
        println!("\n--- FRAME {frame} ---");
        if !args.no_map {
            print!("{}", render::frame(grid, &running.world().snapshot_positions()));
        }
        thread::sleep(Duration::from_millis(args.frame_ms));
    }

    let world = Arc::clone(running.world());
    let summary = running.stop()?;
    let combat = summary.combat();
    tracing::info!(
        ticks = summary.movement.ticks,
        kills = combat.killed,
        repelled = combat.repelled,
        stale = combat.stale,
        "run finished"
    );

    let survivors = world.survivors();
    println!("\n=== SURVIVORS ===");
    print!("{}", render::survivors(&survivors));

    if let Some(path) = &args.save {
        persist::save_to_path(path, &survivors)
            .with_context(|| format!("saving survivors to {}", path.display()))?;
    }
    Ok(())
}
