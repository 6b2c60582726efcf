//! Single-step movement execution (C4): consumes the next planned step,
//! sidesteps via a greedy fallback when that tile is momentarily occupied,
//! respects building-bound actors, and flips floors at a stairs tile.

use crate::state::InnUpstairs;
use crate::town::occupancy::Occupancy;
use crate::types::{axial_neighbors, manhattan, ActorFloor, Pos, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved one tile along the plan; the plan still has steps left.
    Moved(Pos),
    /// Moved one tile and the plan is now exhausted.
    Arrived(Pos),
    /// The planned tile was occupied; sidestepped onto a different tile that
    /// still makes progress toward the goal.
    Sidestepped(Pos),
    /// Planned tile occupied and no productive sidestep exists; stayed put.
    Waited,
    /// There is no plan to execute.
    NoPlan,
}

/// Advances `plan` by one step from `current`, given `is_walkable` (which
/// should already account for building/prop blocking for the target floor)
/// and the current tick's `occupancy` snapshot.
pub fn execute_step(
    current: Pos,
    goal: Pos,
    plan: &mut Vec<Pos>,
    floor: ActorFloor,
    occupancy: &Occupancy,
    is_walkable: impl Fn(Pos) -> bool,
) -> StepOutcome {
    let Some(&next) = plan.first() else {
        return StepOutcome::NoPlan;
    };

    if !occupancy.is_occupied(floor, next) {
        plan.remove(0);
        return if plan.is_empty() { StepOutcome::Arrived(next) } else { StepOutcome::Moved(next) };
    }

    let current_distance = manhattan(current, goal);
    let mut best: Option<(u32, Pos)> = None;
    for candidate in axial_neighbors(current) {
        if candidate == next || occupancy.is_occupied(floor, candidate) || !is_walkable(candidate) {
            continue;
        }
        let distance = manhattan(candidate, goal);
        if distance >= current_distance {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_distance, best_pos)) => {
                distance < best_distance || (distance == best_distance && (candidate.y, candidate.x) < (best_pos.y, best_pos.x))
            }
        };
        if better {
            best = Some((distance, candidate));
        }
    }

    match best {
        Some((_, pos)) => StepOutcome::Sidestepped(pos),
        None => StepOutcome::Waited,
    }
}

/// Building-bound actors (e.g. a shopkeeper tied to their own shop) may never
/// path or sidestep outside their bound rectangle.
pub fn within_bound(pos: Pos, bound: Option<Rect>) -> bool {
    match bound {
        Some(rect) => rect.contains(pos),
        None => true,
    }
}

/// A ground actor stepping onto a registered stairs tile moves to the
/// upstairs overlay (and vice versa); the overlay shares the ground map's
/// absolute coordinate space, so only the floor tag changes.
pub fn toggle_floor_at_stairs(
    floor: ActorFloor,
    pos: Pos,
    inn_stairs_ground: &[Pos],
    inn_upstairs: Option<&InnUpstairs>,
) -> ActorFloor {
    match floor {
        ActorFloor::Ground if inn_stairs_ground.contains(&pos) => ActorFloor::Upstairs,
        ActorFloor::Upstairs => match inn_upstairs {
            Some(overlay) if overlay.tile_at(pos) == crate::types::TileKind::Stairs => ActorFloor::Ground,
            _ => floor,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(_: Pos) -> bool {
        true
    }

    #[test]
    fn executes_plan_step_when_target_tile_is_free() {
        let occ = Occupancy::new();
        let mut plan = vec![Pos::new(0, 1), Pos::new(0, 2)];
        let outcome = execute_step(Pos::new(0, 0), Pos::new(0, 2), &mut plan, ActorFloor::Ground, &occ, open);
        assert_eq!(outcome, StepOutcome::Moved(Pos::new(0, 1)));
        assert_eq!(plan, vec![Pos::new(0, 2)]);
    }

    #[test]
    fn last_plan_step_reports_arrived() {
        let occ = Occupancy::new();
        let mut plan = vec![Pos::new(0, 1)];
        let outcome = execute_step(Pos::new(0, 0), Pos::new(0, 1), &mut plan, ActorFloor::Ground, &occ, open);
        assert_eq!(outcome, StepOutcome::Arrived(Pos::new(0, 1)));
        assert!(plan.is_empty());
    }

    #[test]
    fn sidesteps_when_planned_tile_is_occupied() {
        let mut occ = Occupancy::new();
        occ.insert(ActorFloor::Ground, Pos::new(0, 1));
        let mut plan = vec![Pos::new(0, 1), Pos::new(0, 2)];
        let outcome = execute_step(Pos::new(0, 0), Pos::new(0, 3), &mut plan, ActorFloor::Ground, &occ, open);
        assert!(matches!(outcome, StepOutcome::Sidestepped(_)));
        assert_eq!(plan, vec![Pos::new(0, 1), Pos::new(0, 2)], "plan is preserved across a sidestep");
    }

    #[test]
    fn waits_when_surrounded_by_occupied_or_unwalkable_tiles() {
        let mut occ = Occupancy::new();
        for p in axial_neighbors(Pos::new(0, 0)) {
            occ.insert(ActorFloor::Ground, p);
        }
        let mut plan = vec![Pos::new(0, 1)];
        let outcome = execute_step(Pos::new(0, 0), Pos::new(0, 5), &mut plan, ActorFloor::Ground, &occ, open);
        assert_eq!(outcome, StepOutcome::Waited);
    }

    #[test]
    fn bound_rect_rejects_positions_outside_it() {
        let bound = Rect { x: 0, y: 0, w: 3, h: 3 };
        assert!(within_bound(Pos::new(1, 1), Some(bound)));
        assert!(!within_bound(Pos::new(5, 5), Some(bound)));
        assert!(within_bound(Pos::new(5, 5), None));
    }

    #[test]
    fn stairs_tile_flips_floor_in_both_directions() {
        let stairs_pos = Pos::new(2, 2);
        let ground_stairs = vec![stairs_pos];
        let overlay = InnUpstairs {
            offset: Pos::new(2, 2),
            w: 1,
            h: 1,
            tiles: vec![crate::types::TileKind::Stairs],
            props: vec![],
        };
        assert_eq!(
            toggle_floor_at_stairs(ActorFloor::Ground, stairs_pos, &ground_stairs, Some(&overlay)),
            ActorFloor::Upstairs
        );
        assert_eq!(
            toggle_floor_at_stairs(ActorFloor::Upstairs, stairs_pos, &ground_stairs, Some(&overlay)),
            ActorFloor::Ground
        );
    }
}
