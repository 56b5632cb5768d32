#![warn(clippy::all, missing_docs)]

//! Core logic for the Munitorum Field Manual list builder.
//!
//! This crate parses field manual text into versioned catalogs, answers
//! eligibility questions for a roster in both the standard and the boarding
//! actions regimes, tracks point changes between manual versions and
//! persists army lists. Presentation layers sit on top of it.

pub mod boarding;
pub mod config;
pub mod diff;
pub mod eligibility;
pub mod error;
pub mod lookup;
pub mod manual;
pub mod models;
pub mod names;
pub mod roster;
pub mod save;

pub use boarding::{BoardingActionsConfig, ExceptionRule, Slot};
pub use config::{ensure_default_config, CatalogConfig};
pub use diff::{auto_upgrade, changes, diff, is_outdated, points_of, upgrade_list, PointsChange};
pub use eligibility::EligibilityEngine;
pub use error::{ConfigError, ParseError, ValidationError};
pub use lookup::DatasheetIndex;
pub use manual::{parse_manual, ManualLibrary, ManualParser};
pub use models::{Catalog, Datasheet, Detachment, Faction, ManualVersion, UnitOption};
pub use names::{name_equals, normalize, AliasTable};
pub use roster::{ArmyList, Unit};
pub use save::ListStore;
