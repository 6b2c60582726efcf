//! Per-tick orchestration (C5): rebuilds occupancy, computes the tick's path
//! budget, runs every active actor's role behavior in a deterministically
//! shuffled order, drains the path request queue, executes one movement step
//! per actor, and settles stairs crossings and corpse bookkeeping. The
//! numbered comments below are the eleven-stage tick algorithm; stages 1-2
//! (advancing the world clock and deriving the behavior phase) are the
//! caller's responsibility, since the clock outlives any one scheduler and
//! may be shared with non-town systems.

use rand_chacha::rand_core::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::content::TownConfig;
use crate::interfaces::{SimEnv, TownLogEvent};
use crate::state::TownState;
use crate::town::movement::{self, StepOutcome};
use crate::town::occupancy::{self, Occupancy};
use crate::town::path_budget::{compute_budget, PathBudget, PathCacheKey};
use crate::town::pathfinding::{self, SearchLimits};
use crate::town::roles;
use crate::types::{manhattan, ActorFloor, ActorKind, BehaviorPhase, EntityId, Weather, WorldTime};

pub struct Scheduler {
    rng: ChaCha8Rng,
    tick: u64,
    pub occupancy: Occupancy,
    pub path_budget: PathBudget,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduleOutcome {
    pub actors_acted: u32,
    pub actors_moved: u32,
    pub path_requests_granted: u32,
    pub path_requests_deferred: u32,
}

impl Scheduler {
    pub fn new(seed: u64, cache_capacity: usize) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            tick: 0,
            occupancy: Occupancy::new(),
            path_budget: PathBudget::new(cache_capacity),
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Runs one simulation tick. `time`/`phase` describe the world clock at
    /// the start of this tick, already advanced by the caller.
    pub fn tick(
        &mut self,
        town: &mut TownState,
        config: &TownConfig,
        time: &WorldTime,
        phase: BehaviorPhase,
        weather: &Weather,
        env: &mut SimEnv<'_>,
    ) -> ScheduleOutcome {
        self.tick += 1;
        let mut outcome = ScheduleOutcome::default();

        // Enforce bed uniqueness once per simulated day, rather than on
        // every tick — bed assignments only change at dawn role assignment.
        if time.turn_counter % 1440 == 0 {
            for (building, bed) in town.dedupe_bed_assignments() {
                env.log.record(TownLogEvent::BedCollisionResolved { building, bed });
            }
        }

        // 3. Rebuild occupancy from current positions.
        self.occupancy.clear();
        if let Some(player_pos) = town.player_pos {
            self.occupancy.insert(ActorFloor::Ground, player_pos);
        }
        for actor in town.actors.values() {
            if actor.is_alive() {
                self.occupancy.insert(actor.floor, actor.pos);
            }
        }

        // 4. Snap any actor bound to a building back inside it, in case it
        // was found stranded outside at the start of the tick (invariant 5).
        self.snap_stranded_bound_actors(town);

        // 5. This tick's path request budget.
        let budget = compute_budget(config, phase, time);

        // A bandit event is "active" for as long as any bandit is alive;
        // guards react to this flag rather than re-scanning for bandits.
        let had_bandit_event = town.bandit_event_active;
        town.bandit_event_active = town.actors.values().any(|a| a.kind == crate::types::ActorKind::Bandit && a.is_alive());
        if town.bandit_event_active && !had_bandit_event {
            env.log.record(TownLogEvent::BanditEventStarted);
        } else if !town.bandit_event_active && had_bandit_event {
            env.log.record(TownLogEvent::BanditEventEnded);
        }

        // 6. Deterministic shuffle of iteration order so no actor is
        // systematically favored by arena insertion order.
        let mut order: Vec<EntityId> = town.actors.keys().collect();
        fisher_yates_shuffle(&mut order, &mut self.rng);

        // Rain slows every actor's effective stride uniformly, rather than
        // re-deriving a per-actor weather penalty in each role handler.
        let weather_penalty = if weather.is_heavy_rain() {
            config.heavy_rain_slowdown_stride
        } else if weather.is_rainy() {
            config.rain_slowdown_stride
        } else {
            0
        };

        // 7. Per-tick active-actor cap, honoring the town's override.
        let active_cap = town.active_npc_cap(config);

        // 9. Throttled role-behavior pass: every actor gets a chance to
        // update its plan/goal and enqueue a path request, but actors whose
        // stride hasn't come due this tick are skipped entirely, as are
        // actors beyond this tick's active cap.
        for (index, &id) in order.iter().enumerate() {
            if outcome.actors_acted >= active_cap {
                break;
            }
            let due = {
                let Some(actor) = town.actors.get(id) else { continue };
                if !actor.is_alive() {
                    false
                } else {
                    due_to_act(town, actor, self.tick, index, weather_penalty, time, config)
                }
            };
            if !due {
                continue;
            }
            outcome.actors_acted += 1;
            roles::run_role_behavior(id, town, config, time, phase, &self.occupancy, &mut self.path_budget.queue, env);
        }

        // 8. Drain the path request queue up to this tick's budget and
        // resolve each request via cache-or-search.
        let granted = self.path_budget.queue.drain_up_to(budget);
        for request in granted {
            outcome.path_requests_granted += 1;
            let key = PathCacheKey { floor: request.floor, start: request.start, goal: request.goal };
            let path = match self.path_budget.cache.get(&key) {
                Some(cached) => Some(cached),
                None => {
                    let limits = match request.floor {
                        ActorFloor::Ground => SearchLimits {
                            visit_cap: config.path_visit_cap_ground,
                            sort_threshold: config.path_open_set_sort_threshold,
                        },
                        ActorFloor::Upstairs => SearchLimits {
                            visit_cap: config.path_visit_cap_upstairs,
                            sort_threshold: config.path_open_set_sort_threshold,
                        },
                    };
                    let is_walkable = |pos| roles::common::tile_is_walkable(town, request.floor, pos);
                    match pathfinding::astar(request.start, request.goal, limits, is_walkable).into_path() {
                        Some(path) => {
                            self.path_budget.cache.insert(key, path.clone());
                            Some(path)
                        }
                        None => {
                            env.log.record(TownLogEvent::PathNotFound { actor: request.actor, goal: request.goal });
                            None
                        }
                    }
                }
            };
            if let Some(path) = path
                && let Some(actor) = town.actors.get_mut(request.actor)
            {
                actor.plan = path;
                actor.plan_goal = Some(request.goal);
            }
        }
        outcome.path_requests_deferred = self.path_budget.queue.len() as u32;

        // 9-10. Movement execution pass in the same shuffled order, so a
        // tile freed earlier this tick can be claimed by a later actor
        // without waiting a full tick.
        for &id in &order {
            let Some(actor) = town.actors.get(id) else { continue };
            if !actor.is_alive() || actor.plan.is_empty() {
                continue;
            }
            let current = actor.pos;
            let goal = actor.plan_goal.unwrap_or(current);
            let floor = actor.floor;
            let bound = actor.bound_to_building.map(|idx| town.buildings[idx].rect);

            let mut plan = actor.plan.clone();
            let step = {
                let is_walkable =
                    |pos| roles::common::tile_is_walkable(town, floor, pos) && movement::within_bound(pos, bound);
                movement::execute_step(current, goal, &mut plan, floor, &self.occupancy, is_walkable)
            };

            let new_pos = match step {
                StepOutcome::Moved(pos) | StepOutcome::Arrived(pos) | StepOutcome::Sidestepped(pos) => Some(pos),
                StepOutcome::Waited | StepOutcome::NoPlan => None,
            };

            if let Some(pos) = new_pos {
                self.occupancy.remove(floor, current);
                let new_floor =
                    movement::toggle_floor_at_stairs(floor, pos, &town.inn_stairs_ground, town.inn_upstairs.as_ref());
                self.occupancy.insert(new_floor, pos);
                env.camera.actor_moved(id, current, pos);
                if let Some(actor) = town.actors.get_mut(id) {
                    actor.last_pos = current;
                    actor.pos = pos;
                    actor.floor = new_floor;
                    actor.plan = plan;
                    if matches!(step, StepOutcome::Arrived(_)) {
                        actor.plan_goal = None;
                        env.camera.actor_reached_goal(id, pos);
                    }
                }
                outcome.actors_moved += 1;
            } else if let Some(actor) = town.actors.get_mut(id) {
                actor.plan = plan;
            }
        }

        // 11. Corpse and bandit-event bookkeeping.
        roles::corpse_cleaner::settle_tick(town, config, env);

        outcome
    }

    /// Relocates any actor whose `bound_to_building` rectangle no longer
    /// contains its position to a free interior tile of that building
    /// (invariant 5).
    fn snap_stranded_bound_actors(&mut self, town: &mut TownState) {
        let stranded: Vec<(EntityId, ActorFloor, crate::types::Rect)> = town
            .actors
            .iter()
            .filter_map(|(id, actor)| {
                let building = actor.bound_to_building?;
                let rect = town.buildings.get(building)?.rect;
                if rect.contains(actor.pos) { None } else { Some((id, actor.floor, rect)) }
            })
            .collect();

        for (id, floor, rect) in stranded {
            let center = crate::types::Pos { y: rect.y + rect.h / 2, x: rect.x + rect.w / 2 };
            let target = {
                let is_walkable = |pos| roles::common::tile_is_walkable(town, floor, pos);
                occupancy::adjust_interior_target(rect, center, floor, &self.occupancy, is_walkable)
            };
            let Some(actor) = town.actors.get_mut(id) else { continue };
            let old_pos = actor.pos;
            actor.last_pos = old_pos;
            actor.pos = target;
            self.occupancy.remove(floor, old_pos);
            self.occupancy.insert(floor, target);
        }
    }
}

/// §4.5 "Throttling": stride parity (with an additive weather penalty),
/// stride-bypass (guards always act; shopkeepers inside their shop's
/// arrive-to-leave window always act), and a distance throttle that halves
/// the effective tick rate for actors far from the player.
fn due_to_act(
    town: &TownState,
    actor: &crate::state::Actor,
    tick: u64,
    index: usize,
    weather_penalty: u32,
    time: &WorldTime,
    config: &TownConfig,
) -> bool {
    if actor.kind == ActorKind::Guard {
        return true;
    }
    if actor.kind == ActorKind::Shopkeeper
        && let Some(shop) = actor.shop_ref.and_then(|idx| town.shops.get(idx))
        && shop.arrive_to_leave_window(time.minute_of_day())
    {
        return true;
    }

    let stride = (actor.stride.max(1) + weather_penalty) as u64;
    if (tick + actor.stride_offset as u64) % stride != 0 {
        return false;
    }

    if let Some(player_pos) = town.player_pos
        && manhattan(actor.pos, player_pos) > config.distance_throttle_radius
    {
        return (tick + index as u64) % 2 == 0;
    }
    true
}

fn fisher_yates_shuffle(items: &mut [EntityId], rng: &mut ChaCha8Rng) {
    for i in (1..items.len()).rev() {
        let j = (rng.next_u64() % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::interfaces::{NoopCameraAdapter, NoopCombatAdapter, NoopLootAdapter, VecLogSink};
    use crate::types::ClockPhase;

    #[test]
    fn tick_moves_at_least_one_actor_on_a_simple_town() {
        let mut town = fixtures::small_test_town(42);
        let config = TownConfig::build_default();
        let mut scheduler = Scheduler::new(7, config.path_cache_capacity);
        let mut log = VecLogSink::default();
        let mut combat = NoopCombatAdapter;
        let mut loot = NoopLootAdapter;
        let mut camera = NoopCameraAdapter;
        let mut env = SimEnv { combat: &mut combat, loot: &mut loot, camera: &mut camera, log: &mut log };
        let time = WorldTime { hours: 9, minutes: 0, phase: ClockPhase::Day, turn_counter: 0 };
        let weather = crate::types::Weather { intensity: 0.0 };

        let mut moved_total = 0;
        for _ in 0..30 {
            let outcome = scheduler.tick(&mut town, &config, &time, BehaviorPhase::Day, &weather, &mut env);
            moved_total += outcome.actors_moved;
        }

        assert_eq!(scheduler.tick_count(), 30);
        assert!(moved_total > 0, "at least one actor should have moved across 30 ticks");
    }

    #[test]
    fn heavy_rain_reduces_actors_acted_per_tick() {
        let config = TownConfig::build_default();
        let time = WorldTime { hours: 9, minutes: 0, phase: ClockPhase::Day, turn_counter: 0 };
        let clear = crate::types::Weather { intensity: 0.0 };
        let heavy_rain = crate::types::Weather { intensity: 0.9 };

        let run = |weather: &crate::types::Weather| {
            let mut town = fixtures::small_test_town(42);
            let mut scheduler = Scheduler::new(7, config.path_cache_capacity);
            let mut log = VecLogSink::default();
            let mut combat = NoopCombatAdapter;
            let mut loot = NoopLootAdapter;
            let mut camera = NoopCameraAdapter;
            let mut env = SimEnv { combat: &mut combat, loot: &mut loot, camera: &mut camera, log: &mut log };
            let mut acted = 0;
            for _ in 0..20 {
                acted += scheduler.tick(&mut town, &config, &time, BehaviorPhase::Day, weather, &mut env).actors_acted;
            }
            acted
        };

        assert!(run(&heavy_rain) <= run(&clear), "heavy rain should never increase the acted count");
    }

    fn env_parts() -> (VecLogSink, NoopCombatAdapter, NoopLootAdapter, NoopCameraAdapter) {
        (VecLogSink::default(), NoopCombatAdapter, NoopLootAdapter, NoopCameraAdapter)
    }

    #[test]
    fn active_npc_cap_override_limits_actors_acted_per_tick() {
        let mut town = fixtures::small_test_town(42);
        town.max_active_npcs = Some(1);
        let config = TownConfig::build_default();
        let mut scheduler = Scheduler::new(7, config.path_cache_capacity);
        let (mut log, mut combat, mut loot, mut camera) = env_parts();
        let mut env = SimEnv { combat: &mut combat, loot: &mut loot, camera: &mut camera, log: &mut log };
        let time = WorldTime { hours: 9, minutes: 0, phase: ClockPhase::Day, turn_counter: 0 };
        let weather = crate::types::Weather { intensity: 0.0 };

        let outcome = scheduler.tick(&mut town, &config, &time, BehaviorPhase::Day, &weather, &mut env);
        assert!(outcome.actors_acted <= 1);
    }

    #[test]
    fn distance_throttled_actor_acts_on_only_half_its_scheduled_ticks() {
        let mut town = fixtures::small_test_town(42);
        town.player_pos = Some(crate::types::Pos::new(0, 0));
        let far_resident =
            town.actors.iter().find(|(_, a)| a.kind == ActorKind::Resident).map(|(id, _)| id).expect("resident");
        if let Some(actor) = town.actors.get_mut(far_resident) {
            actor.pos = crate::types::Pos::new(0, 39);
            actor.stride_offset = 0;
        }
        let config = TownConfig::build_default();
        let mut scheduler = Scheduler::new(7, config.path_cache_capacity);
        let (mut log, mut combat, mut loot, mut camera) = env_parts();
        let mut env = SimEnv { combat: &mut combat, loot: &mut loot, camera: &mut camera, log: &mut log };
        let time = WorldTime { hours: 9, minutes: 0, phase: ClockPhase::Day, turn_counter: 0 };
        let weather = crate::types::Weather { intensity: 0.0 };

        assert!(manhattan(crate::types::Pos::new(0, 0), crate::types::Pos::new(0, 39)) > config.distance_throttle_radius);

        let far_due_ticks: u32 = (1..=20)
            .map(|tick| u32::from(due_to_act(&town, &town.actors[far_resident], tick, 0, 0, &time, &config)))
            .sum();
        assert!(far_due_ticks < 20, "a far actor should be throttled below its nominal stride rate");
    }

    #[test]
    fn guard_always_bypasses_stride_throttling() {
        let mut town = fixtures::small_test_town(42);
        let guard_id = town.actors.iter().find(|(_, a)| a.kind == ActorKind::Guard).map(|(id, _)| id).expect("guard");
        if let Some(actor) = town.actors.get_mut(guard_id) {
            actor.stride = 100;
        }
        let config = TownConfig::build_default();
        let time = WorldTime { hours: 9, minutes: 0, phase: ClockPhase::Day, turn_counter: 0 };
        assert!(due_to_act(&town, &town.actors[guard_id], 1, 0, 0, &time, &config));
    }

    #[test]
    fn stranded_bound_actor_is_snapped_back_inside_its_building() {
        let mut town = fixtures::small_test_town(42);
        let shopkeeper_id =
            town.actors.iter().find(|(_, a)| a.kind == ActorKind::Shopkeeper).map(|(id, _)| id).expect("shopkeeper");
        if let Some(actor) = town.actors.get_mut(shopkeeper_id) {
            actor.bound_to_building = Some(1);
            actor.pos = crate::types::Pos::new(0, 0);
        }
        let config = TownConfig::build_default();
        let mut scheduler = Scheduler::new(7, config.path_cache_capacity);
        let (mut log, mut combat, mut loot, mut camera) = env_parts();
        let mut env = SimEnv { combat: &mut combat, loot: &mut loot, camera: &mut camera, log: &mut log };
        let time = WorldTime { hours: 9, minutes: 0, phase: ClockPhase::Day, turn_counter: 0 };
        let weather = crate::types::Weather { intensity: 0.0 };

        scheduler.tick(&mut town, &config, &time, BehaviorPhase::Day, &weather, &mut env);

        let rect = town.buildings[1].rect;
        assert!(rect.contains(town.actors[shopkeeper_id].pos));
    }
}
