use std::collections::HashSet;

use anyhow::Result;
use clap::Parser;
use rand_chacha::rand_core::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use town_sim_core::interfaces::{NoopCameraAdapter, NoopCombatAdapter, NoopLootAdapter, SimEnv, VecLogSink};
use town_sim_core::types::{BehaviorPhase, ClockPhase, Weather, WorldTime};
use town_sim_core::{Scheduler, TownConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 1000)]
    ticks: u32,
    #[arg(short, long, default_value_t = 20)]
    runs: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut seed_rng = ChaCha8Rng::seed_from_u64(args.seed);
    let config = TownConfig::build_default();

    for run in 0..args.runs {
        let seed = seed_rng.next_u64();
        println!("run {run}: seed {seed} for {} ticks", args.ticks);

        let mut town = town_sim_core::fixtures::small_test_town(seed);
        town.validate().map_err(|e| anyhow::anyhow!("run {run} seed {seed}: town failed validation: {e:?}"))?;
        let mut scheduler = Scheduler::new(seed, config.path_cache_capacity);
        let mut log = VecLogSink::default();
        let mut combat = NoopCombatAdapter;
        let mut loot = NoopLootAdapter;
        let mut camera = NoopCameraAdapter;
        let weather = Weather { intensity: (seed_rng.next_u64() % 100) as f32 / 100.0 };

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
            scheduler.tick(&mut town, &config, &time, BehaviorPhase::from(phase), &weather, &mut env);

            let mut occupied_ground: HashSet<(i32, i32)> = HashSet::new();
            for actor in town.actors.values() {
                if !actor.is_alive() {
                    continue;
                }
                assert!(actor.combat.hp <= actor.combat.max_hp, "invariant failed: hp above max_hp");
                assert!(town.map.in_bounds(actor.pos), "invariant failed: actor out of bounds");
                if actor.floor == town_sim_core::types::ActorFloor::Ground {
                    assert!(occupied_ground.insert((actor.pos.y, actor.pos.x)), "invariant failed: two ground actors share a tile");
                }
            }
        }
    }

    println!("Fuzzing completed successfully across {} runs.", args.runs);
    Ok(())
}
