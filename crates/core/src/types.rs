//! Shared value types used across the town simulation: positions, tile codes,
//! and the small enums that describe time-of-day, weather, and actor roles.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct EntityId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub const fn new(y: i32, x: i32) -> Self {
        Self { y, x }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn contains(&self, pos: Pos) -> bool {
        pos.x >= self.x && pos.x < self.x + self.w && pos.y >= self.y && pos.y < self.y + self.h
    }

    /// Strictly inside the perimeter, per the Building invariant in the data model.
    pub fn strict_interior_contains(&self, pos: Pos) -> bool {
        pos.x > self.x && pos.x < self.x + self.w - 1 && pos.y > self.y && pos.y < self.y + self.h - 1
    }

    /// True on the outer wall ring, where a building's door must sit.
    pub fn on_perimeter(&self, pos: Pos) -> bool {
        if !self.contains(pos) {
            return false;
        }
        pos.x == self.x || pos.x == self.x + self.w - 1 || pos.y == self.y || pos.y == self.y + self.h - 1
    }
}

/// Fatal failures, raised only while loading a town's map/building table —
/// never during a tick. Everything recoverable resolves to `Option`/`bool`
/// instead (see `TownLogEvent` for the observable-but-non-fatal cases).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TownError {
    InvalidBuildingRect { building_index: usize },
    DoorNotOnPerimeter { building_index: usize },
    MapOutOfBounds { pos: Pos },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Wall,
    Floor,
    Door,
    Window,
    Road,
    Stairs,
    Pier,
    ShipDeck,
    ShipEdge,
    Water,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Resident,
    Shopkeeper,
    Guard,
    Bandit,
    Pet,
    CorpseCleaner,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActorFloor {
    Ground,
    Upstairs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TownSize {
    Small,
    Big,
    City,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClockPhase {
    Dawn,
    Day,
    Dusk,
    Night,
}

/// The three coarse behavioral phases that role handlers branch on (§4.5/§4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BehaviorPhase {
    Morning,
    Day,
    Evening,
}

impl From<ClockPhase> for BehaviorPhase {
    fn from(phase: ClockPhase) -> Self {
        match phase {
            ClockPhase::Dawn => BehaviorPhase::Morning,
            ClockPhase::Dusk | ClockPhase::Night => BehaviorPhase::Evening,
            ClockPhase::Day => BehaviorPhase::Day,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldTime {
    pub hours: u32,
    pub minutes: u32,
    pub phase: ClockPhase,
    pub turn_counter: u64,
}

impl WorldTime {
    /// Minutes since local midnight, in `[0, 1440)`.
    pub fn minute_of_day(&self) -> u32 {
        self.hours * 60 + self.minutes
    }

    pub fn in_late_window(&self) -> bool {
        let m = self.minute_of_day();
        (120..300).contains(&m)
    }

    pub fn in_evening_return_window(&self) -> bool {
        let m = self.minute_of_day();
        (1080..1260).contains(&m)
    }

    /// `[22:00, 06:00)`, wrapping past midnight, per §4.6's guard barracks rest window.
    pub fn in_guard_night_window(&self) -> bool {
        let m = self.minute_of_day();
        m >= 1320 || m < 360
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub intensity: f32,
}

impl Weather {
    pub fn is_rainy(&self) -> bool {
        self.intensity >= 0.35
    }

    pub fn is_heavy_rain(&self) -> bool {
        self.intensity >= 0.75
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DailyRole {
    Homebody,
    PlazaShop,
    InnGoer,
    Wanderer,
}

/// The shared state-machine vocabulary every role handler transitions through (§4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActorState {
    Roaming,
    RoutingToTarget,
    SittingAtSeat,
    Sleeping,
    Patrolling,
    Resting,
    AtWork,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GuardRestRole {
    Rest,
    Duty,
}

pub fn manhattan(a: Pos, b: Pos) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

pub fn axial_neighbors(p: Pos) -> [Pos; 4] {
    [
        Pos { y: p.y - 1, x: p.x },
        Pos { y: p.y, x: p.x + 1 },
        Pos { y: p.y + 1, x: p.x },
        Pos { y: p.y, x: p.x - 1 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behavior_phase_maps_clock_phase_per_glossary() {
        assert_eq!(BehaviorPhase::from(ClockPhase::Dawn), BehaviorPhase::Morning);
        assert_eq!(BehaviorPhase::from(ClockPhase::Dusk), BehaviorPhase::Evening);
        assert_eq!(BehaviorPhase::from(ClockPhase::Night), BehaviorPhase::Evening);
        assert_eq!(BehaviorPhase::from(ClockPhase::Day), BehaviorPhase::Day);
    }

    #[test]
    fn late_window_is_0200_to_0500() {
        let mk = |h, m| WorldTime { hours: h, minutes: m, phase: ClockPhase::Night, turn_counter: 0 };
        assert!(!mk(1, 59).in_late_window());
        assert!(mk(2, 0).in_late_window());
        assert!(mk(4, 59).in_late_window());
        assert!(!mk(5, 0).in_late_window());
    }

    #[test]
    fn evening_return_window_is_1800_to_2100() {
        let mk = |h, m| WorldTime { hours: h, minutes: m, phase: ClockPhase::Dusk, turn_counter: 0 };
        assert!(!mk(17, 59).in_evening_return_window());
        assert!(mk(18, 0).in_evening_return_window());
        assert!(mk(20, 59).in_evening_return_window());
        assert!(!mk(21, 0).in_evening_return_window());
    }

    #[test]
    fn guard_night_window_wraps_past_midnight() {
        let mk = |h, m| WorldTime { hours: h, minutes: m, phase: ClockPhase::Night, turn_counter: 0 };
        assert!(!mk(21, 59).in_guard_night_window());
        assert!(mk(22, 0).in_guard_night_window());
        assert!(mk(23, 59).in_guard_night_window());
        assert!(mk(0, 0).in_guard_night_window());
        assert!(mk(5, 59).in_guard_night_window());
        assert!(!mk(6, 0).in_guard_night_window());
    }

    #[test]
    fn weather_thresholds_match_spec() {
        assert!(!Weather { intensity: 0.34 }.is_rainy());
        assert!(Weather { intensity: 0.35 }.is_rainy());
        assert!(!Weather { intensity: 0.74 }.is_heavy_rain());
        assert!(Weather { intensity: 0.75 }.is_heavy_rain());
    }
}
