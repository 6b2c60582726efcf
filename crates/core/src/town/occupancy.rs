//! Tile occupancy tracking (C1). Positions are packed into a single `u64` key
//! rather than hashed as `(i32, i32)` tuples or formatted into `String` keys,
//! per the data-model guidance to prefer packed-integer keys over string keys
//! for hot per-tick lookups.

use std::collections::HashSet;

use crate::types::{ActorFloor, Pos, Rect};

#[inline]
fn pack(floor: ActorFloor, pos: Pos) -> u64 {
    let floor_bit = match floor {
        ActorFloor::Ground => 0u64,
        ActorFloor::Upstairs => 1u64,
    };
    let x = (pos.x as u32) as u64;
    let y = (pos.y as u32) as u64;
    (floor_bit << 63) | (y << 32) | x
}

/// Tracks which tiles are currently occupied by actors, separately per floor.
/// Rebuilt once per tick from live actor positions; never mutated outside the
/// scheduler's per-tick refresh.
#[derive(Default, Clone)]
pub struct Occupancy {
    occupied: HashSet<u64>,
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.occupied.clear();
    }

    pub fn insert(&mut self, floor: ActorFloor, pos: Pos) {
        self.occupied.insert(pack(floor, pos));
    }

    pub fn remove(&mut self, floor: ActorFloor, pos: Pos) {
        self.occupied.remove(&pack(floor, pos));
    }

    pub fn is_occupied(&self, floor: ActorFloor, pos: Pos) -> bool {
        self.occupied.contains(&pack(floor, pos))
    }

    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }
}

/// Combines walkability and occupancy, the building block every
/// building-aware target search (seat finding, bed fallback) is written on
/// top of.
pub fn is_free_tile(pos: Pos, floor: ActorFloor, occupancy: &Occupancy, is_walkable: impl Fn(Pos) -> bool) -> bool {
    is_walkable(pos) && !occupancy.is_occupied(floor, pos)
}

/// Scans the 3x3 around `center` in a fixed order (center, 4-axial, then
/// 4-diagonal) and returns the first free cell, optionally requiring the
/// candidate to sit strictly inside `interior` (for seat/bed targets that
/// must stay indoors).
pub fn nearest_free_adjacent(
    center: Pos,
    floor: ActorFloor,
    occupancy: &Occupancy,
    interior: Option<Rect>,
    is_walkable: impl Fn(Pos) -> bool,
) -> Option<Pos> {
    const OFFSETS: [(i32, i32); 9] = [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (-1, 1), (1, -1), (1, 1)];
    for (dy, dx) in OFFSETS {
        let candidate = Pos { y: center.y + dy, x: center.x + dx };
        if let Some(rect) = interior {
            if !rect.strict_interior_contains(candidate) {
                continue;
            }
        }
        if is_free_tile(candidate, floor, occupancy, &is_walkable) {
            return Some(candidate);
        }
    }
    None
}

/// Replaces an unreachable interior target (a bed tile blocked by a prop or
/// another actor) with the nearest free interior neighbor, falling back to
/// the original target when no neighbor is free.
pub fn adjust_interior_target(
    building: Rect,
    target: Pos,
    floor: ActorFloor,
    occupancy: &Occupancy,
    is_walkable: impl Fn(Pos) -> bool,
) -> Pos {
    if is_free_tile(target, floor, occupancy, &is_walkable) {
        return target;
    }
    nearest_free_adjacent(target, floor, occupancy, Some(building), is_walkable).unwrap_or(target)
}
