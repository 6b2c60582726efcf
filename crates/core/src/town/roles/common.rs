//! Shared helpers used by every role handler: walkability queries, path
//! request submission, and deterministic per-actor decision hashing.

use xxhash_rust::xxh3::Xxh3;

use crate::state::TownState;
use crate::town::path_budget::{PathRequest, PathRequestQueue};
use crate::types::{ActorFloor, EntityId, Pos, TileKind};
use std::hash::Hasher;

pub fn ground_tile_walkable(tile: TileKind) -> bool {
    matches!(tile, TileKind::Floor | TileKind::Door | TileKind::Road | TileKind::Stairs | TileKind::Pier | TileKind::ShipDeck)
}

/// True when `pos` can be stepped onto on the given floor: map/overlay tile
/// is walkable and no blocking prop (table, shelf, counter) sits on it.
pub fn tile_is_walkable(town: &TownState, floor: ActorFloor, pos: Pos) -> bool {
    match floor {
        ActorFloor::Ground => {
            if !ground_tile_walkable(town.map.tile_at(pos)) {
                return false;
            }
            !town.props.iter().any(|prop| prop.pos() == pos && prop.kind.blocks())
        }
        ActorFloor::Upstairs => match &town.inn_upstairs {
            Some(overlay) => overlay.is_walkable(pos) && !overlay.prop_blocks_at(pos),
            None => false,
        },
    }
}

/// Enqueues a path request if the actor doesn't already have a plan heading
/// to `goal`; returns `true` when a new request was submitted.
pub fn request_path_if_needed(
    queue: &mut PathRequestQueue,
    id: EntityId,
    floor: ActorFloor,
    from: Pos,
    goal: Pos,
    priority: u8,
    current_goal: Option<Pos>,
) -> bool {
    if current_goal == Some(goal) {
        return false;
    }
    if from == goal {
        return false;
    }
    queue.enqueue(PathRequest { actor: id, floor, start: from, goal, priority });
    true
}

/// Maps `(salt_a, salt_b)` to a stable pseudo-random value in `[0, 1)`.
/// Used for daily-role assignment and similar decisions that must be
/// reproducible from a seed without threading a `&mut Rng` through every
/// role handler.
pub fn deterministic_unit(salt_a: u64, salt_b: u64) -> f32 {
    let mut hasher = Xxh3::new();
    hasher.write_u64(salt_a);
    hasher.write_u64(salt_b);
    let bits = hasher.finish();
    (bits >> 11) as f32 / (1u64 << 53) as f32
}

/// Picks an index into `weights` proportional to their magnitude, using
/// `unit` (expected to be in `[0, 1)`) to select the bucket.
pub fn weighted_pick(weights: &[f32], unit: f32) -> usize {
    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        return 0;
    }
    let target = unit * total;
    let mut running = 0.0;
    for (idx, weight) in weights.iter().enumerate() {
        running += weight;
        if target < running {
            return idx;
        }
    }
    weights.len().saturating_sub(1)
}
