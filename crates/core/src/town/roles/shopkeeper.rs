//! Shopkeeper behavior: open the shop by walking to its interior anchor at
//! opening time, stay bound to the shop building while it's open, and head
//! home (then to sleep) once it closes.

use slotmap::Key;

use crate::content::TownConfig;
use crate::interfaces::SimEnv;
use crate::state::TownState;
use crate::town::occupancy::{adjust_interior_target, Occupancy};
use crate::town::path_budget::PathRequestQueue;
use crate::town::roles::common::{deterministic_unit, request_path_if_needed, tile_is_walkable};
use crate::types::{BehaviorPhase, EntityId, WorldTime};

const PRIORITY: u8 = 2;
const BLOCKED_TICKS_BEFORE_COOLDOWN: u32 = 3;

pub fn act(
    id: EntityId,
    town: &mut TownState,
    config: &TownConfig,
    time: &WorldTime,
    _phase: BehaviorPhase,
    occupancy: &Occupancy,
    queue: &mut PathRequestQueue,
    _env: &mut SimEnv<'_>,
) {
    let Some(actor) = town.actors.get(id) else { return };
    if actor.sleeping {
        return;
    }
    let Some(shop_idx) = actor.shop_ref else { return };
    let pos = actor.pos;
    let last_pos = actor.last_pos;
    let floor = actor.floor;
    let plan_goal = actor.plan_goal;
    let home = actor.home;
    let shop = &town.shops[shop_idx];
    let minute = time.minute_of_day();

    if shop.is_open(minute) {
        let building_rect = town.buildings[shop.building].rect;
        let is_walkable = |p| tile_is_walkable(town, floor, p);
        let inside = adjust_interior_target(building_rect, shop.inside, floor, occupancy, is_walkable);
        let building = shop.building;
        if pos == inside {
            if let Some(actor) = town.actors.get_mut(id) {
                actor.work_inside = true;
                actor.bound_to_building = Some(building);
            }
            return;
        }
        request_path_if_needed(queue, id, floor, pos, inside, PRIORITY, plan_goal);
        return;
    }

    if let Some(actor) = town.actors.get_mut(id) {
        actor.work_inside = false;
        actor.bound_to_building = None;
    }
    let Some(home) = home else { return };
    let target = home.bed.unwrap_or(home.door);
    if pos == target {
        if let Some(actor) = town.actors.get_mut(id) {
            actor.sleeping = time.in_late_window();
            actor.home_plan.blocked_ticks = 0;
            actor.home_plan.cooldown = 0;
        }
        return;
    }

    if let Some(actor) = town.actors.get_mut(id) {
        if pos == last_pos {
            actor.home_plan.blocked_ticks += 1;
        } else {
            actor.home_plan.blocked_ticks = 0;
        }
        if actor.home_plan.blocked_ticks >= BLOCKED_TICKS_BEFORE_COOLDOWN && actor.home_plan.cooldown == 0 {
            let span = config.home_plan_cooldown_max - config.home_plan_cooldown_min;
            let seed = id.data().as_ffi();
            let roll = deterministic_unit(seed, time.turn_counter);
            actor.home_plan.cooldown = config.home_plan_cooldown_min + (roll * span as f32) as u32;
            actor.home_plan.blocked_ticks = 0;
            actor.plan.clear();
            actor.plan_goal = None;
        }
    }

    let on_cooldown = town.actors.get(id).map(|a| a.home_plan.cooldown > 0).unwrap_or(false);
    if on_cooldown {
        if let Some(actor) = town.actors.get_mut(id) {
            actor.home_plan.cooldown = actor.home_plan.cooldown.saturating_sub(1);
        }
        return;
    }

    request_path_if_needed(queue, id, floor, pos, target, PRIORITY, plan_goal);
}
