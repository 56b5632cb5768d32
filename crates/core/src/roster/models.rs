//! Roster entries and the army list they belong to.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    boarding::{is_enhancement_group, BoardingActionsConfig},
    models::{Catalog, Datasheet, ManualVersion, UnitOption},
};

/// Points limit of a new list.
pub const DEFAULT_MAX_POINTS: u32 = 2000;
/// Points limit of every boarding actions list.
pub const BOARDING_ACTIONS_MAX_POINTS: u32 = 500;

fn default_max_points() -> u32 {
    DEFAULT_MAX_POINTS
}

/// Current time at the millisecond precision lists are stored with.
fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// One chosen unit on a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// Unique within a list.
    pub id: String,
    /// Datasheet name.
    pub name: String,
    /// Model count of the chosen size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<u32>,
    /// Option label when it differs from the datasheet name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_name: Option<String>,
    /// Cost in the list's manual version.
    pub points: u32,
    /// Add-on bought for another entry.
    #[serde(default)]
    pub bonus: bool,
    /// Set when the unit could not be priced in the list's manual version.
    #[serde(default)]
    pub error: bool,
}

impl Unit {
    /// Unit with a fresh id.
    pub fn new(name: impl Into<String>, points: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            models: None,
            option_name: None,
            points,
            bonus: false,
            error: false,
        }
    }

    /// Unit bought from `option` of `sheet`.
    pub fn from_option(sheet: &Datasheet, option: &UnitOption) -> Self {
        let option_name = (option.enhancement || option.name != sheet.name)
            .then(|| option.name.clone());
        Self {
            models: option.models,
            option_name,
            bonus: option.bonus,
            ..Self::new(sheet.name.clone(), option.points)
        }
    }

    /// True for enhancement entries, which are not units.
    pub fn is_enhancement(&self) -> bool {
        is_enhancement_group(&self.name)
    }
}

/// A saved army list. Field names follow the stored JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ArmyList {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub faction: String,
    #[serde(default)]
    pub detachment: String,
    #[serde(default)]
    pub sub_faction: Option<String>,
    #[serde(default = "default_max_points")]
    pub max_points: u32,
    /// Manual version the list is priced against.
    #[serde(rename = "mfm_version", default)]
    pub mfm_version: String,
    /// Application version that last wrote the list.
    #[serde(default)]
    pub version: String,
    #[serde(default = "now_millis", with = "chrono::serde::ts_milliseconds")]
    pub modified_date: DateTime<Utc>,
    #[serde(default)]
    pub sort_order: String,
    /// Newest first.
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl Default for ArmyList {
    fn default() -> Self {
        Self {
            name: String::new(),
            faction: String::new(),
            detachment: String::new(),
            sub_faction: None,
            max_points: DEFAULT_MAX_POINTS,
            mfm_version: String::new(),
            version: String::new(),
            modified_date: now_millis(),
            sort_order: String::new(),
            units: Vec::new(),
        }
    }
}

impl ArmyList {
    /// Empty list priced against `catalog`, defaulting to its first faction
    /// and that faction's first detachment.
    pub fn new_for(catalog: &Catalog, faction: Option<&str>, detachment: Option<&str>) -> Self {
        let faction = faction
            .and_then(|name| catalog.faction(name))
            .or_else(|| catalog.factions().first());
        let detachment = detachment.map(str::to_string).or_else(|| {
            faction
                .and_then(|faction| faction.detachments.first())
                .map(|detachment| detachment.name.clone())
        });
        Self {
            faction: faction.map(|faction| faction.name.clone()).unwrap_or_default(),
            detachment: detachment.unwrap_or_default(),
            mfm_version: catalog.version().as_str().to_string(),
            ..Self::default()
        }
    }

    /// Version token the list is priced against.
    pub fn manual_version(&self) -> ManualVersion {
        ManualVersion::new(self.mfm_version.as_str())
    }

    /// Record a modification.
    pub fn touch(&mut self) {
        self.modified_date = now_millis();
    }

    /// Add a unit at the top of the list.
    pub fn add_unit(&mut self, unit: Unit) {
        self.units.insert(0, unit);
        self.touch();
    }

    /// Remove the unit with `id`, returning it.
    pub fn remove_unit(&mut self, id: &str) -> Option<Unit> {
        let index = self.units.iter().position(|unit| unit.id == id)?;
        let removed = self.units.remove(index);
        self.touch();
        Some(removed)
    }

    /// Copies of each datasheet, bonus entries excluded.
    pub fn unit_counts(&self) -> HashMap<String, u32> {
        let mut counts = HashMap::new();
        for unit in self.units.iter().filter(|unit| !unit.bonus) {
            *counts.entry(unit.name.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Models fielded per datasheet.
    pub fn models_taken(&self) -> HashMap<String, u32> {
        let mut taken = HashMap::new();
        for unit in &self.units {
            *taken.entry(unit.name.clone()).or_insert(0) += unit.models.unwrap_or(0);
        }
        taken
    }

    /// Names of the enhancements already on the list.
    pub fn enhancements_taken(&self) -> BTreeSet<String> {
        self.units
            .iter()
            .filter(|unit| unit.is_enhancement())
            .filter_map(|unit| unit.option_name.clone())
            .collect()
    }

    /// Sum of every entry's points.
    pub fn total_points(&self) -> u32 {
        self.units.iter().map(|unit| unit.points).sum()
    }

    /// True when the detachment uses the boarding actions slots.
    pub fn is_boarding_actions(&self, boarding: &BoardingActionsConfig) -> bool {
        boarding.is_boarding_actions(&self.detachment)
    }

    /// Points limit in force for this list.
    pub fn effective_max_points(&self, boarding: &BoardingActionsConfig) -> u32 {
        if self.is_boarding_actions(boarding) {
            BOARDING_ACTIONS_MAX_POINTS
        } else {
            self.max_points
        }
    }
}
