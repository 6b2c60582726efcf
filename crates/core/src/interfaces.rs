//! Pluggable adapters at the simulation's boundary: combat resolution, loot
//! drop, camera/visualization hooks, and log sinks. The scheduler calls these
//! through `&mut dyn Trait` and degrades to a no-op default when the host
//! doesn't care, instead of branching on an `Option<Box<dyn Trait>>` at every
//! call site.

use crate::state::{Corpse, CorpseLootItem};
use crate::types::{ActorKind, EntityId, Pos};

/// Resolves melee contact between a bandit (or guard) and its target.
/// Implementors decide damage, counter-attacks, and death bookkeeping; the
/// scheduler only needs to know whether the defender died.
pub trait CombatAdapter {
    /// `attacker` strikes `defender`. Returns `true` if `defender` died.
    fn resolve_attack(&mut self, attacker: EntityId, defender: EntityId) -> bool;
}

/// Default combat resolution: nobody ever dies. Used when a host embeds the
/// town simulation purely for population/traffic modeling.
pub struct NoopCombatAdapter;

impl CombatAdapter for NoopCombatAdapter {
    fn resolve_attack(&mut self, _attacker: EntityId, _defender: EntityId) -> bool {
        false
    }
}

/// Decides what a dead actor drops. Called once, at the moment a `Corpse` is
/// created, so the adapter never needs to track looted state itself.
pub trait LootAdapter {
    fn roll_loot(&mut self, kind: ActorKind) -> Vec<CorpseLootItem>;
}

/// Default loot table: nothing drops.
pub struct NoopLootAdapter;

impl LootAdapter for NoopLootAdapter {
    fn roll_loot(&mut self, _kind: ActorKind) -> Vec<CorpseLootItem> {
        Vec::new()
    }
}

/// Intent-based visualization callbacks, mirroring the screeps movement
/// visualizer pattern: the scheduler reports *what* happened and the
/// implementor decides *how*, or whether, to render it.
pub trait CameraAdapter {
    fn actor_moved(&mut self, id: EntityId, from: Pos, to: Pos);
    fn actor_spawned_corpse(&mut self, corpse: &Corpse);
    fn actor_reached_goal(&mut self, id: EntityId, goal: Pos);
}

/// Default camera adapter: every hook is a no-op.
pub struct NoopCameraAdapter;

impl CameraAdapter for NoopCameraAdapter {
    fn actor_moved(&mut self, _id: EntityId, _from: Pos, _to: Pos) {}
    fn actor_spawned_corpse(&mut self, _corpse: &Corpse) {}
    fn actor_reached_goal(&mut self, _id: EntityId, _goal: Pos) {}
}

/// Structured events a tick can emit, for hosts that want an audit trail
/// without wiring in a logging crate. Mirrors the teacher's in-memory
/// `LogEvent` vector rather than reaching for `log`/`tracing`, since nothing
/// in this crate needs a subscriber.
#[derive(Clone, Debug, PartialEq)]
pub enum TownLogEvent {
    PathRequestGranted { actor: EntityId },
    PathRequestDeferred { actor: EntityId },
    PathNotFound { actor: EntityId, goal: Pos },
    ActorDied { actor: EntityId, kind: ActorKind, at: Pos },
    CorpseLooted { at: Pos },
    BanditEventStarted,
    BanditEventEnded,
    BedCollisionResolved { building: usize, bed: Pos },
}

/// Receives `TownLogEvent`s as the scheduler ticks. The default sink simply
/// accumulates them in memory, matching the teacher's `Vec<LogEvent>` style.
pub trait LogSink {
    fn record(&mut self, event: TownLogEvent);
}

#[derive(Default)]
pub struct VecLogSink {
    events: Vec<TownLogEvent>,
}

impl VecLogSink {
    pub fn events(&self) -> &[TownLogEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<TownLogEvent> {
        std::mem::take(&mut self.events)
    }
}

impl LogSink for VecLogSink {
    fn record(&mut self, event: TownLogEvent) {
        self.events.push(event);
    }
}

/// Bundles every adapter the scheduler needs so callers can construct one
/// value instead of threading four separate trait objects through every tick
/// call. Each field defaults to its no-op implementation.
pub struct SimEnv<'a> {
    pub combat: &'a mut dyn CombatAdapter,
    pub loot: &'a mut dyn LootAdapter,
    pub camera: &'a mut dyn CameraAdapter,
    pub log: &'a mut dyn LogSink,
}
