//! Public crate surface for the town simulation core: data model, tunable
//! content, pluggable adapters, and the tick engine.

pub mod content;
pub mod fixtures;
pub mod interfaces;
pub mod state;
pub mod town;
pub mod types;

pub use content::TownConfig;
pub use interfaces::{CameraAdapter, CombatAdapter, LogSink, LootAdapter, SimEnv, TownLogEvent};
pub use state::{Actor, Building, Corpse, Map, Prop, Shop, TownState};
pub use town::{Occupancy, PathBudget, ScheduleOutcome, Scheduler};
pub use types::*;
