//! Bandit behavior: head for the nearest resident or guard and attack on
//! contact via the host's `CombatAdapter`; a killed target becomes a corpse
//! with loot rolled through the `LootAdapter`.

use crate::interfaces::{SimEnv, TownLogEvent};
use crate::state::{Corpse, TownState};
use crate::town::path_budget::PathRequestQueue;
use crate::town::roles::common::request_path_if_needed;
use crate::types::{axial_neighbors, manhattan, ActorKind, BehaviorPhase, EntityId, WorldTime};

const PRIORITY: u8 = 4;

pub fn act(
    id: EntityId,
    town: &mut TownState,
    _config: &crate::content::TownConfig,
    _time: &WorldTime,
    _phase: BehaviorPhase,
    queue: &mut PathRequestQueue,
    env: &mut SimEnv<'_>,
) {
    let Some(actor) = town.actors.get(id) else { return };
    if !actor.is_alive() {
        return;
    }
    let origin = actor.pos;
    let floor = actor.floor;

    let Some((target_id, target_pos)) = nearest_victim(town, id, origin) else {
        return;
    };

    if axial_neighbors(origin).contains(&target_pos) || origin == target_pos {
        let defender_died = env.combat.resolve_attack(id, target_id);
        if defender_died {
            let kind = town.actors.get(target_id).map(|a| a.kind).unwrap_or(ActorKind::Resident);
            let loot = env.loot.roll_loot(kind);
            town.corpses.push(Corpse { pos: target_pos, kind, loot, looted: false, ticks_since_looted: 0 });
            env.camera.actor_spawned_corpse(town.corpses.last().expect("corpse just pushed"));
            env.log.record(TownLogEvent::ActorDied { actor: target_id, kind, at: target_pos });
            if let Some(defender) = town.actors.get_mut(target_id) {
                defender.dead = true;
                defender.combat.hp = 0;
            }
        }
        return;
    }

    let Some(actor) = town.actors.get(id) else { return };
    request_path_if_needed(queue, id, floor, origin, target_pos, PRIORITY, actor.plan_goal);
}

fn nearest_victim(
    town: &TownState,
    attacker: EntityId,
    from: crate::types::Pos,
) -> Option<(EntityId, crate::types::Pos)> {
    town.actors
        .iter()
        .filter(|(id, a)| *id != attacker && a.is_alive() && matches!(a.kind, ActorKind::Resident | ActorKind::Guard))
        .min_by_key(|(_, a)| manhattan(from, a.pos))
        .map(|(id, a)| (id, a.pos))
}
