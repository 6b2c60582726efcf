//! Town simulation core: occupancy tracking, pathfinding, path budgeting,
//! movement execution, the per-tick scheduler, and per-role behaviors.
//! Numbered comments below reference the component split in the data model.

pub mod movement; // C4
pub mod occupancy; // C1
pub mod path_budget; // C3
pub mod pathfinding; // C2
pub mod roles; // C6
pub mod scheduler; // C5

pub use occupancy::Occupancy;
pub use path_budget::PathBudget;
pub use scheduler::{ScheduleOutcome, Scheduler};
