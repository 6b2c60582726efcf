//! Per-`ActorKind` behavior handlers (C6): each module owns one role's
//! decision logic and enqueues path requests through the shared queue
//! rather than moving actors directly.

pub mod bandit;
pub mod common;
pub mod corpse_cleaner;
pub mod guard;
pub mod pet;
pub mod resident;
pub mod roamer;
pub mod shopkeeper;

use crate::content::TownConfig;
use crate::interfaces::SimEnv;
use crate::state::TownState;
use crate::town::occupancy::Occupancy;
use crate::town::path_budget::PathRequestQueue;
use crate::types::{ActorKind, BehaviorPhase, EntityId, WorldTime};

#[allow(clippy::too_many_arguments)]
pub fn run_role_behavior(
    id: EntityId,
    town: &mut TownState,
    config: &TownConfig,
    time: &WorldTime,
    phase: BehaviorPhase,
    occupancy: &Occupancy,
    queue: &mut PathRequestQueue,
    env: &mut SimEnv<'_>,
) {
    let Some(kind) = town.actors.get(id).map(|a| a.kind) else { return };
    match kind {
        ActorKind::Resident => resident::act(id, town, config, time, phase, occupancy, queue, env),
        ActorKind::Shopkeeper => shopkeeper::act(id, town, config, time, phase, occupancy, queue, env),
        ActorKind::Guard => guard::act(id, town, config, time, phase, queue, env),
        ActorKind::Bandit => bandit::act(id, town, config, time, phase, queue, env),
        ActorKind::Pet => pet::act(id, town, config, time, phase, queue, env),
        ActorKind::CorpseCleaner => corpse_cleaner::act(id, town, config, time, phase, queue, env),
    }
}
