//! Corpse cleaner behavior: walk to the nearest un-looted corpse and loot
//! it, then wander. `settle_tick` ages looted corpses and removes them once
//! `corpse_loot_reveal_ticks` have elapsed, giving players/hosts a window to
//! notice the loot before it disappears.

use crate::content::TownConfig;
use crate::interfaces::{SimEnv, TownLogEvent};
use crate::state::TownState;
use crate::town::path_budget::PathRequestQueue;
use crate::town::roles::common::request_path_if_needed;
use crate::town::roles::roamer;
use crate::types::{manhattan, BehaviorPhase, EntityId, WorldTime};

const PRIORITY: u8 = 2;

pub fn act(
    id: EntityId,
    town: &mut TownState,
    _config: &TownConfig,
    _time: &WorldTime,
    _phase: BehaviorPhase,
    queue: &mut PathRequestQueue,
    env: &mut SimEnv<'_>,
) {
    let Some(actor) = town.actors.get(id) else { return };
    let origin = actor.pos;
    let floor = actor.floor;

    let target = town
        .corpses
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.looted)
        .min_by_key(|(_, c)| manhattan(origin, c.pos))
        .map(|(idx, c)| (idx, c.pos));

    let Some((idx, pos)) = target else {
        return roamer::wander(id, town, PRIORITY, queue);
    };

    if pos == origin {
        town.corpses[idx].looted = true;
        env.log.record(TownLogEvent::CorpseLooted { at: pos });
        return;
    }

    let Some(actor) = town.actors.get(id) else { return };
    request_path_if_needed(queue, id, floor, origin, pos, PRIORITY, actor.plan_goal);
}

/// Ages looted corpses and drops them once their reveal window has elapsed.
pub fn settle_tick(town: &mut TownState, config: &TownConfig, _env: &mut SimEnv<'_>) {
    for corpse in town.corpses.iter_mut().filter(|c| c.looted) {
        corpse.ticks_since_looted += 1;
    }
    town.corpses.retain(|c| !c.looted || c.ticks_since_looted <= config.corpse_loot_reveal_ticks);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Corpse, CorpseLootItem};
    use crate::types::{ActorKind, Pos};

    #[test]
    fn looted_corpse_is_removed_once_reveal_window_elapses() {
        let mut town = crate::fixtures::empty_town(5, 5);
        town.corpses.push(Corpse {
            pos: Pos::new(0, 0),
            kind: ActorKind::Bandit,
            loot: vec![CorpseLootItem { item_id: "coin", quantity: 1 }],
            looted: true,
            ticks_since_looted: 0,
        });
        let mut config = TownConfig::build_default();
        config.corpse_loot_reveal_ticks = 1;
        let mut log = crate::interfaces::VecLogSink::default();
        let mut combat = crate::interfaces::NoopCombatAdapter;
        let mut loot = crate::interfaces::NoopLootAdapter;
        let mut camera = crate::interfaces::NoopCameraAdapter;
        let mut env = crate::interfaces::SimEnv { combat: &mut combat, loot: &mut loot, camera: &mut camera, log: &mut log };

        settle_tick(&mut town, &config, &mut env);
        assert_eq!(town.corpses.len(), 1);
        settle_tick(&mut town, &config, &mut env);
        assert!(town.corpses.is_empty());
    }
}
