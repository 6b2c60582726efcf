//! Pet behavior: stay within `pet_follow_radius` of its owner (the nearest
//! living resident) when one exists, otherwise wander.

use crate::content::TownConfig;
use crate::interfaces::SimEnv;
use crate::state::TownState;
use crate::town::path_budget::PathRequestQueue;
use crate::town::roles::common::request_path_if_needed;
use crate::town::roles::roamer;
use crate::types::{manhattan, ActorKind, BehaviorPhase, EntityId, WorldTime};

const PRIORITY: u8 = 1;

pub fn act(
    id: EntityId,
    town: &mut TownState,
    config: &TownConfig,
    _time: &WorldTime,
    _phase: BehaviorPhase,
    queue: &mut PathRequestQueue,
    _env: &mut SimEnv<'_>,
) {
    let Some(actor) = town.actors.get(id) else { return };
    let origin = actor.pos;
    let floor = actor.floor;

    let owner = town
        .actors
        .iter()
        .filter(|(other, a)| *other != id && a.is_alive() && a.kind == ActorKind::Resident)
        .min_by_key(|(_, a)| manhattan(origin, a.pos))
        .map(|(_, a)| a.pos);

    match owner {
        Some(owner_pos) if manhattan(origin, owner_pos) > config.pet_follow_radius => {
            let Some(actor) = town.actors.get(id) else { return };
            request_path_if_needed(queue, id, floor, origin, owner_pos, PRIORITY, actor.plan_goal);
        }
        Some(_) => {}
        None => roamer::wander(id, town, PRIORITY, queue),
    }
}
