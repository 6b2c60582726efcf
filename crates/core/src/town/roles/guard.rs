//! Guard behavior: half the garrison (per `guard_rest_shift_ratio`) is on
//! duty patrolling between its post and a nearby waypoint while the other
//! half rests at post (sleeping through the night in barracks); a bandit
//! event pulls every on-duty guard toward the nearest bandit instead.

use slotmap::Key;

use crate::content::TownConfig;
use crate::interfaces::SimEnv;
use crate::state::{GuardState, TownState};
use crate::town::path_budget::PathRequestQueue;
use crate::town::roles::common::{deterministic_unit, request_path_if_needed, tile_is_walkable};
use crate::types::{manhattan, BehaviorPhase, EntityId, GuardRestRole, Pos, TileKind, WorldTime};

const PRIORITY: u8 = 3;
const BANDIT_RESPONSE_PRIORITY: u8 = 5;
const URGENT_RETURN_PRIORITY: u8 = 4;
const WAYPOINT_SAMPLE_ATTEMPTS: u64 = 40;

fn assign_rest_role(id: EntityId, config: &TownConfig) -> GuardRestRole {
    let seed = id.data().as_ffi();
    if deterministic_unit(seed, 0) < config.guard_rest_shift_ratio {
        GuardRestRole::Rest
    } else {
        GuardRestRole::Duty
    }
}

pub fn act(
    id: EntityId,
    town: &mut TownState,
    config: &TownConfig,
    time: &WorldTime,
    _phase: BehaviorPhase,
    queue: &mut PathRequestQueue,
    _env: &mut SimEnv<'_>,
) {
    let Some(actor) = town.actors.get(id) else { return };
    if actor.sleeping {
        if time.in_guard_night_window() {
            return;
        }
        if let Some(actor) = town.actors.get_mut(id) {
            actor.sleeping = false;
        }
    }

    let Some(actor) = town.actors.get(id) else { return };
    let Some(post) = actor.guard.map(|g| g.post) else { return };

    let rest_role = actor.guard.map(|g| g.rest_role).unwrap_or_else(|| assign_rest_role(id, config));
    if actor.guard.is_none()
        && let Some(actor) = town.actors.get_mut(id)
    {
        actor.guard = Some(GuardState { post, patrol_goal: None, patrol_wait: 0, rest_role });
    }

    if town.bandit_event_active
        && let Some(target) = nearest_bandit_pos(town, post)
    {
        let Some(actor) = town.actors.get(id) else { return };
        request_path_if_needed(queue, id, actor.floor, actor.pos, target, BANDIT_RESPONSE_PRIORITY, actor.plan_goal);
        return;
    }

    if rest_role == GuardRestRole::Rest {
        rest(id, town, time, post, queue);
        return;
    }

    patrol(id, town, config, queue);
}

/// During the barracks night window, route to a bed; otherwise hold post.
fn rest(id: EntityId, town: &mut TownState, time: &WorldTime, post: Pos, queue: &mut PathRequestQueue) {
    if time.in_guard_night_window()
        && let Some(bed) = barracks_bed_target(town, id)
    {
        let Some(actor) = town.actors.get(id) else { return };
        if actor.pos == bed {
            if let Some(actor) = town.actors.get_mut(id) {
                actor.sleeping = true;
            }
            return;
        }
        request_path_if_needed(queue, id, actor.floor, actor.pos, bed, PRIORITY, actor.plan_goal);
        return;
    }

    let Some(actor) = town.actors.get(id) else { return };
    request_path_if_needed(queue, id, actor.floor, actor.pos, post, PRIORITY, actor.plan_goal);
}

/// The guard's assigned bed when its home is a barracks, else any bed inside
/// any barracks building, else that barracks' door, per §4.6.
fn barracks_bed_target(town: &TownState, id: EntityId) -> Option<Pos> {
    let actor = town.actors.get(id)?;
    if let Some(home) = actor.home
        && town.buildings.get(home.building).map(|b| b.is_barracks()).unwrap_or(false)
        && let Some(bed) = home.bed
    {
        return Some(bed);
    }

    let (idx, barracks) = town.buildings.iter().enumerate().find(|(_, b)| b.is_barracks())?;
    town.props
        .iter()
        .find(|p| p.kind == crate::state::PropKind::Bed && barracks.interior_contains(p.pos()))
        .map(|p| p.pos())
        .or(Some(town.buildings[idx].door))
}

fn nearest_bandit_pos(town: &TownState, from: Pos) -> Option<Pos> {
    town.actors
        .values()
        .filter(|a| a.kind == crate::types::ActorKind::Bandit && a.is_alive())
        .map(|a| a.pos)
        .min_by_key(|pos| manhattan(from, *pos))
}

fn patrol(id: EntityId, town: &mut TownState, config: &TownConfig, queue: &mut PathRequestQueue) {
    let Some(actor) = town.actors.get(id) else { return };
    let Some(mut guard) = actor.guard else { return };
    let post = guard.post;
    let pos = actor.pos;
    let floor = actor.floor;
    let plan_goal = actor.plan_goal;
    let radius = config.guard_patrol_radius(town.town_size);

    if manhattan(pos, post) > (radius + 2) as u32 {
        guard.patrol_goal = Some(post);
        guard.patrol_wait = 0;
        if let Some(actor) = town.actors.get_mut(id) {
            actor.guard = Some(guard);
        }
        request_path_if_needed(queue, id, floor, pos, post, URGENT_RETURN_PRIORITY, plan_goal);
        return;
    }

    if guard.patrol_wait > 0 {
        guard.patrol_wait -= 1;
        if let Some(actor) = town.actors.get_mut(id) {
            actor.guard = Some(guard);
        }
        return;
    }

    let at_goal = guard.patrol_goal.map(|g| g == pos).unwrap_or(false);
    if guard.patrol_goal.is_none() || at_goal {
        let seed = id.data().as_ffi();
        let salt = seed ^ salt_for(pos);
        let next_goal = pick_patrol_waypoint(town, post, seed, salt, radius, config);
        let linger = 4 + (deterministic_unit(seed, salt + 1) * 7.0) as u32;
        let jitter = deterministic_unit(seed, salt + 2) < 0.08;
        guard.patrol_goal = Some(next_goal);
        guard.patrol_wait = if jitter { linger.saturating_sub(2) } else { linger };
        if let Some(actor) = town.actors.get_mut(id) {
            actor.guard = Some(guard);
        }
        return;
    }

    let goal = guard.patrol_goal.unwrap();
    if let Some(actor) = town.actors.get_mut(id) {
        actor.guard = Some(guard);
    }
    request_path_if_needed(queue, id, floor, pos, goal, PRIORITY, plan_goal);
}

fn salt_for(pos: Pos) -> u64 {
    (pos.y as u32 as u64) << 32 | (pos.x as u32 as u64)
}

/// 35% of the time, head for the gate (if within `2 * radius` of post) or
/// the plaza; otherwise sample up to 40 candidate tiles around post,
/// preferring a road tile, falling back to a floor tile, per §4.6.
fn pick_patrol_waypoint(town: &TownState, post: Pos, seed: u64, salt: u64, radius: i32, config: &TownConfig) -> Pos {
    if deterministic_unit(seed, salt) < config.guard_patrol_gate_plaza_bias {
        if manhattan(post, town.exit_gate) <= (2 * radius) as u32 {
            return town.exit_gate;
        }
        return Pos { y: town.plaza.y + town.plaza.h / 2, x: town.plaza.x + town.plaza.w / 2 };
    }

    let mut fallback_floor: Option<Pos> = None;
    for attempt in 0..WAYPOINT_SAMPLE_ATTEMPTS {
        let dx = (deterministic_unit(seed, salt + attempt * 2 + 10) * (2 * radius + 1) as f32) as i32 - radius;
        let dy = (deterministic_unit(seed, salt + attempt * 2 + 11) * (2 * radius + 1) as f32) as i32 - radius;
        let candidate = Pos { y: post.y + dy, x: post.x + dx };
        if !tile_is_walkable(town, crate::types::ActorFloor::Ground, candidate) {
            continue;
        }
        match town.map.tile_at(candidate) {
            TileKind::Road => return candidate,
            TileKind::Floor if fallback_floor.is_none() => fallback_floor = Some(candidate),
            _ => {}
        }
    }
    fallback_floor.unwrap_or(post)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActorKind, ClockPhase, TownSize};

    fn env_parts() -> (
        crate::interfaces::VecLogSink,
        crate::interfaces::NoopCombatAdapter,
        crate::interfaces::NoopLootAdapter,
        crate::interfaces::NoopCameraAdapter,
    ) {
        (
            crate::interfaces::VecLogSink::default(),
            crate::interfaces::NoopCombatAdapter,
            crate::interfaces::NoopLootAdapter,
            crate::interfaces::NoopCameraAdapter,
        )
    }

    fn guard_id(town: &TownState) -> EntityId {
        town.actors.iter().find(|(_, a)| a.kind == ActorKind::Guard).map(|(id, _)| id).unwrap()
    }

    #[test]
    fn guard_patrol_radius_follows_town_size_tier() {
        let config = TownConfig::build_default();
        assert_eq!(config.guard_patrol_radius(TownSize::Small), config.guard_patrol_radius_small);
        assert_eq!(config.guard_patrol_radius(TownSize::Big), config.guard_patrol_radius_big);
        assert_eq!(config.guard_patrol_radius(TownSize::City), config.guard_patrol_radius_city);
    }

    #[test]
    fn sleeping_guard_in_barracks_stays_asleep_through_the_night_window() {
        let mut town = crate::fixtures::small_test_town(1);
        let config = TownConfig::build_default();
        let mut queue = PathRequestQueue::new();
        let (mut log, mut combat, mut loot, mut camera) = env_parts();
        let mut env = crate::interfaces::SimEnv { combat: &mut combat, loot: &mut loot, camera: &mut camera, log: &mut log };
        let time = WorldTime { hours: 23, minutes: 0, phase: ClockPhase::Night, turn_counter: 0 };

        let id = guard_id(&town);
        if let Some(actor) = town.actors.get_mut(id) {
            actor.sleeping = true;
        }

        act(id, &mut town, &config, &time, BehaviorPhase::Evening, &mut queue, &mut env);

        assert!(town.actors[id].sleeping, "guard should keep sleeping during the barracks night window");
        assert!(queue.is_empty());
    }

    #[test]
    fn guard_assigned_to_rest_walks_to_its_barracks_bed_at_night_and_sleeps_on_arrival() {
        let mut town = crate::fixtures::small_test_town(1);
        let config = TownConfig::build_default();
        let mut queue = PathRequestQueue::new();
        let (mut log, mut combat, mut loot, mut camera) = env_parts();
        let mut env = crate::interfaces::SimEnv { combat: &mut combat, loot: &mut loot, camera: &mut camera, log: &mut log };
        let time = WorldTime { hours: 23, minutes: 0, phase: ClockPhase::Night, turn_counter: 0 };

        let id = guard_id(&town);
        let bed = barracks_bed_target(&town, id).unwrap();
        let post = town.actors[id].guard.unwrap().post;
        if let Some(actor) = town.actors.get_mut(id) {
            actor.guard = Some(GuardState { post, patrol_goal: None, patrol_wait: 0, rest_role: GuardRestRole::Rest });
        }

        act(id, &mut town, &config, &time, BehaviorPhase::Evening, &mut queue, &mut env);
        assert!(!town.actors[id].sleeping, "should head to bed before sleeping, not sleep in place");

        if let Some(actor) = town.actors.get_mut(id) {
            actor.pos = bed;
        }
        act(id, &mut town, &config, &time, BehaviorPhase::Evening, &mut queue, &mut env);
        assert!(town.actors[id].sleeping, "guard should fall asleep once it reaches its bed");
    }

    #[test]
    fn guard_far_from_post_returns_urgently_instead_of_patrolling() {
        let mut town = crate::fixtures::small_test_town(1);
        let config = TownConfig::build_default();
        let mut queue = PathRequestQueue::new();

        let id = guard_id(&town);
        let post = town.actors[id].guard.unwrap().post;
        let radius = config.guard_patrol_radius(town.town_size);
        let far = Pos { y: post.y, x: post.x + radius + 10 };
        if let Some(actor) = town.actors.get_mut(id) {
            actor.pos = far;
        }

        patrol(id, &mut town, &config, &mut queue);

        assert_eq!(town.actors[id].guard.unwrap().patrol_goal, Some(post));
        assert!(!queue.is_empty(), "an urgent path back to post should have been requested");
    }
}
