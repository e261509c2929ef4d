//! Chaos Office - headless driver
//!
//! Runs the simulation for a fixed number of ticks, fires scheduled
//! disturbances along the way and prints metric lines or a final JSON
//! snapshot.

use std::path::PathBuf;
use std::str::FromStr;

use chaos_office::core::error::{OfficeError, Result};
use chaos_office::world::events::LogKind;
use chaos_office::{Command, FileUnlockStore, SimEvent, SimulationConfig, World};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Headless Chaos Office simulation
#[derive(Parser, Debug)]
#[command(name = "chaos-office")]
#[command(about = "Run the office simulation without a renderer")]
struct Args {
    /// Number of ticks to run
    #[arg(long, default_value_t = 3600)]
    ticks: u64,

    /// Seconds per tick
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// TOML file overriding tuning constants
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file holding the persisted observer unlock
    #[arg(long)]
    unlock_file: Option<PathBuf>,

    /// Scheduled command, `<tick>:<command>` (repeatable), e.g. `120:pizza:400,300`
    #[arg(long = "at", value_parser = parse_scheduled)]
    at: Vec<Scheduled>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Print a metric line every N ticks (0 disables)
    #[arg(long, default_value_t = 0)]
    report_every: u64,
}

#[derive(Debug, Clone)]
struct Scheduled {
    tick: u64,
    command: Command,
}

fn parse_scheduled(s: &str) -> std::result::Result<Scheduled, String> {
    let (tick, command) = s
        .split_once(':')
        .ok_or_else(|| format!("expected <tick>:<command>, got '{s}'"))?;
    let tick = tick.trim().parse::<u64>().map_err(|e| format!("bad tick '{tick}': {e}"))?;
    let command = Command::from_str(command).map_err(|e| e.to_string())?;
    Ok(Scheduled { tick, command })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chaos_office=info")))
        .init();

    let args = Args::parse();
    if args.dt <= 0.0 {
        return Err(OfficeError::Config(format!("--dt must be positive (got {})", args.dt)));
    }

    let config = match &args.config {
        Some(path) => SimulationConfig::from_toml_file(path)?,
        None => SimulationConfig::default(),
    };

    let mut builder = World::builder().config(config);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    if let Some(path) = &args.unlock_file {
        builder = builder.unlock_store(FileUnlockStore::new(path));
    }
    let mut world = builder.build()?;

    let mut schedule = args.at.clone();
    schedule.sort_by_key(|s| s.tick);
    let mut pending = schedule.into_iter().peekable();

    tracing::info!(ticks = args.ticks, dt = args.dt, seed = ?args.seed, "simulation starting");

    for tick in 0..args.ticks {
        while let Some(scheduled) = pending.next_if(|s| s.tick <= tick) {
            tracing::info!(tick, command = %scheduled.command, "scheduled command");
            world.apply(&scheduled.command);
        }

        world.update(args.dt);

        for event in world.drain_events() {
            if !args.json {
                print_event(&event);
            }
        }

        if args.report_every > 0 && (tick + 1) % args.report_every == 0 {
            let m = world.metrics();
            println!(
                "[tick {:>6}] agents={:<3} chaos={:.3} morale={:.3} productivity={:.3} speed={:.2}",
                tick + 1,
                world.active_count(),
                m.chaos_index,
                m.morale,
                m.productivity,
                world.global_speed(),
            );
        }
    }

    if args.json {
        println!("{}", world.snapshot().to_json()?);
    } else {
        let m = world.metrics();
        println!();
        println!("=== CHAOS OFFICE after {:.1}s ===", world.sim_time());
        println!("Agents:       {}", world.active_count());
        println!("Chaos index:  {:.3}", m.chaos_index);
        println!("Morale:       {:.3}", m.morale);
        println!("Productivity: {:.3}", m.productivity);
        println!("Broken desks: {}", world.desks().broken_count());
    }

    Ok(())
}

fn print_event(event: &SimEvent) {
    match event {
        SimEvent::Log { text, kind } => {
            let tag = match kind {
                LogKind::Chaos => "CHAOS",
                LogKind::Good => "GOOD",
                LogKind::Info => "INFO",
                LogKind::Warning => "WARN",
            };
            println!("[{tag:<5}] {text}");
        }
        SimEvent::Toast { text } => println!("  >> {text}"),
        SimEvent::Chat { speaker, text, .. } => println!("  {speaker}: {text}"),
        SimEvent::ObserverUnlocked => println!("  ** observer unlocked **"),
        _ => {}
    }
}
