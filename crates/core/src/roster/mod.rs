//! Caller-owned roster: the units chosen for one army list.

pub mod migrate;
pub mod models;

pub use migrate::migrate_to_sub_factions;
pub use models::{ArmyList, Unit, BOARDING_ACTIONS_MAX_POINTS, DEFAULT_MAX_POINTS};
