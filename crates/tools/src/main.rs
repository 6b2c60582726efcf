use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use town_sim_core::interfaces::{NoopCameraAdapter, NoopCombatAdapter, NoopLootAdapter, SimEnv, VecLogSink};
use town_sim_core::types::{BehaviorPhase, ClockPhase, Weather, WorldTime};
use town_sim_core::{Scheduler, TownConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Deterministic simulation seed
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 1440)]
    ticks: u32,

    /// Constant rain intensity in [0, 1) applied across the whole run
    #[arg(short, long, default_value_t = 0.0)]
    rain: f32,

    /// Optional path to write the JSON summary to; prints to stdout otherwise
    #[arg(short, long)]
    out: Option<String>,
}

#[derive(Serialize)]
struct TickSummary {
    ticks_run: u64,
    actors_moved: u32,
    path_requests_granted: u32,
    path_requests_deferred: u32,
    log_event_count: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = TownConfig::build_default();
    let mut town = town_sim_core::fixtures::small_test_town(args.seed);
    town.validate().map_err(|e| anyhow::anyhow!("town failed validation: {e:?}"))?;
    let mut scheduler = Scheduler::new(args.seed, config.path_cache_capacity);

    let mut log = VecLogSink::default();
    let mut combat = NoopCombatAdapter;
    let mut loot = NoopLootAdapter;
    let mut camera = NoopCameraAdapter;

    let weather = Weather { intensity: args.rain.clamp(0.0, 0.999) };
    let mut actors_moved = 0;
    let mut granted = 0;
    let mut deferred = 0;

    for minute in 0..args.ticks {
        let hours = (minute / 60) % 24;
        let minutes = minute % 60;
        let phase = match hours {
            5..=7 => ClockPhase::Dawn,
            8..=17 => ClockPhase::Day,
            18..=20 => ClockPhase::Dusk,
            _ => ClockPhase::Night,
        };
        let time = WorldTime { hours, minutes, phase, turn_counter: minute as u64 };
        let mut env = SimEnv { combat: &mut combat, loot: &mut loot, camera: &mut camera, log: &mut log };
        let outcome = scheduler.tick(&mut town, &config, &time, BehaviorPhase::from(phase), &weather, &mut env);
        actors_moved += outcome.actors_moved;
        granted += outcome.path_requests_granted;
        deferred = outcome.path_requests_deferred;
    }

    let summary = TickSummary {
        ticks_run: scheduler.tick_count(),
        actors_moved,
        path_requests_granted: granted,
        path_requests_deferred: deferred,
        log_event_count: log.events().len(),
    };
    let json = serde_json::to_string_pretty(&summary).context("serializing tick summary")?;

    match args.out {
        Some(path) => std::fs::write(&path, json).with_context(|| format!("writing summary to {path}"))?,
        None => println!("{json}"),
    }

    Ok(())
}
