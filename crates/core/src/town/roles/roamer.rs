//! Shared "pick a nearby walkable tile and go there" wander behavior, used
//! by wandering residents, idle pets, and guards off patrol duty.

use slotmap::Key;

use crate::state::TownState;
use crate::town::path_budget::PathRequestQueue;
use crate::town::roles::common::{deterministic_unit, request_path_if_needed, tile_is_walkable};
use crate::types::{EntityId, Pos};

const WANDER_RADIUS: i32 = 5;

pub fn wander(id: EntityId, town: &mut TownState, priority: u8, queue: &mut PathRequestQueue) {
    let Some(actor) = town.actors.get(id) else { return };
    if actor.plan_goal.is_some() {
        return;
    }
    let seed = id.data().as_ffi();
    let origin = actor.pos;
    let floor = actor.floor;

    for attempt in 0..8u64 {
        let dx = (deterministic_unit(seed, attempt * 2) * (2 * WANDER_RADIUS + 1) as f32) as i32 - WANDER_RADIUS;
        let dy = (deterministic_unit(seed, attempt * 2 + 1) * (2 * WANDER_RADIUS + 1) as f32) as i32 - WANDER_RADIUS;
        let candidate = Pos { y: origin.y + dy, x: origin.x + dx };
        if candidate == origin {
            continue;
        }
        if tile_is_walkable(town, floor, candidate) {
            request_path_if_needed(queue, id, floor, origin, candidate, priority, actor.plan_goal);
            return;
        }
    }
}
