//! Unit costs across manual versions, and migrating lists between them.

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    manual::ManualLibrary,
    models::Catalog,
    roster::{ArmyList, Unit},
};

/// Cost of a roster entry in `catalog`.
///
/// The datasheet must match by exact name. The option is picked by
/// `option_name` when the entry has one, otherwise by model count. `None`
/// means the entry cannot be priced in that version.
pub fn points_of(unit: &Unit, catalog: &Catalog) -> Option<u32> {
    let sheet = catalog.datasheet_exact(&unit.name)?;
    let option = match (&unit.option_name, unit.models) {
        (Some(option_name), _) => {
            let wanted = option_name.trim();
            sheet.sizes.iter().find(|size| size.name == wanted)
        }
        (None, Some(models)) => sheet.sizes.iter().find(|size| size.models == Some(models)),
        (None, None) => None,
    }?;
    Some(option.points)
}

/// `current - previous`, or 0 when either side cannot be priced.
pub fn points_difference(unit: &Unit, current: &Catalog, previous: &Catalog) -> i64 {
    match (points_of(unit, current), points_of(unit, previous)) {
        (Some(new), Some(old)) => i64::from(new) - i64::from(old),
        _ => 0,
    }
}

/// Cost movement of one roster entry between two versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct PointsChange {
    pub id: String,
    pub name: String,
    pub old: Option<u32>,
    pub new: Option<u32>,
    /// `new - old`; 0 when either side is unknown.
    pub delta: i64,
    pub models: Option<u32>,
    pub option_name: Option<String>,
}

impl PointsChange {
    fn between(unit: &Unit, from: &Catalog, to: &Catalog) -> Self {
        Self {
            id: unit.id.clone(),
            name: unit.name.clone(),
            old: points_of(unit, from),
            new: points_of(unit, to),
            delta: points_difference(unit, to, from),
            models: unit.models,
            option_name: unit.option_name.clone(),
        }
    }

    /// One side of the comparison could not be priced.
    pub fn is_unresolved(&self) -> bool {
        self.old.is_none() || self.new.is_none()
    }
}

/// Entries priced in both versions whose cost moved.
pub fn diff(units: &[Unit], from: &Catalog, to: &Catalog) -> Vec<PointsChange> {
    units
        .iter()
        .map(|unit| PointsChange::between(unit, from, to))
        .filter(|change| !change.is_unresolved() && change.delta != 0)
        .collect()
}

/// True when the list's version is missing or not loaded.
pub fn has_invalid_version(list: &ArmyList, library: &ManualLibrary) -> bool {
    list.mfm_version.is_empty() || !library.contains(&list.manual_version())
}

/// Entries whose cost in the list's version differs from the current
/// version, unresolved entries included.
pub fn changes(list: &ArmyList, library: &ManualLibrary) -> Vec<PointsChange> {
    let Some(current) = library.current() else {
        return Vec::new();
    };
    let listed = library
        .get(&list.manual_version())
        .unwrap_or_else(|| current.clone());
    list.units
        .iter()
        .map(|unit| PointsChange::between(unit, &listed, &current))
        .filter(|change| change.old != change.new)
        .collect()
}

/// The list should be reviewed against the current version.
pub fn is_outdated(list: &ArmyList, library: &ManualLibrary) -> bool {
    has_invalid_version(list, library) || !changes(list, library).is_empty()
}

/// Move the list to the current version when no cost changed. Returns `true`
/// when the recorded version was bumped.
pub fn auto_upgrade(list: &mut ArmyList, library: &ManualLibrary) -> bool {
    if has_invalid_version(list, library) || !changes(list, library).is_empty() {
        return false;
    }
    let Some(current) = library.current() else {
        return false;
    };
    let target = current.version().as_str();
    if list.mfm_version == target {
        return false;
    }
    debug!(from = %list.mfm_version, to = %target, "Auto-upgrading list");
    list.mfm_version = target.to_string();
    true
}

/// Re-price every entry against `catalog` and record its version.
///
/// Entries that cannot be priced are flagged with `error` and keep their old
/// cost. Returns how many entries were flagged; a list already on `catalog`'s
/// version is left untouched.
pub fn upgrade_list(list: &mut ArmyList, catalog: &Catalog) -> usize {
    let target = catalog.version().as_str();
    if list.mfm_version == target {
        return 0;
    }

    let mut flagged = 0;
    for unit in &mut list.units {
        match points_of(unit, catalog) {
            Some(points) => unit.points = points,
            None => {
                unit.error = true;
                flagged += 1;
            }
        }
    }
    info!(from = %list.mfm_version, to = %target, flagged, "Upgraded list");
    list.mfm_version = target.to_string();
    list.touch();
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Datasheet, ManualVersion, UnitOption};

    fn catalog(version: &str, guard: u32, vexilla: Option<u32>) -> Catalog {
        let mut sheet = Datasheet::new("Custodian Guard", "ADEPTUS CUSTODES");
        sheet.sizes.push(UnitOption::new("Custodian Guard", guard).with_models(4));
        if let Some(points) = vexilla {
            let mut bonus = UnitOption::new("Vexilla", points);
            bonus.bonus = true;
            sheet.sizes.push(bonus);
        }
        let mut captain = Datasheet::new("Shield-Captain", "ADEPTUS CUSTODES");
        captain.sizes.push(UnitOption::new("Shield-Captain", 130).with_models(1));
        Catalog::new(ManualVersion::new(version), Vec::new(), vec![sheet, captain])
    }

    fn guard() -> Unit {
        let mut unit = Unit::new("Custodian Guard", 170);
        unit.models = Some(4);
        unit
    }

    fn vexilla() -> Unit {
        let mut unit = Unit::new("Custodian Guard", 10);
        unit.option_name = Some(" Vexilla ".to_string());
        unit.bonus = true;
        unit
    }

    fn captain() -> Unit {
        let mut unit = Unit::new("Shield-Captain", 130);
        unit.models = Some(1);
        unit
    }

    fn library() -> ManualLibrary {
        let library = ManualLibrary::new();
        library.insert(catalog("VERSION 3.4", 170, Some(10)));
        library.insert(catalog("VERSION 3.5", 180, None));
        library
    }

    #[test]
    fn prices_by_option_name_then_models() {
        let old = catalog("VERSION 3.4", 170, Some(10));
        assert_eq!(points_of(&guard(), &old), Some(170));
        assert_eq!(points_of(&vexilla(), &old), Some(10));

        let mut bare = Unit::new("Custodian Guard", 170);
        assert_eq!(points_of(&bare, &old), None);
        bare.models = Some(5);
        assert_eq!(points_of(&bare, &old), None);
        assert_eq!(points_of(&Unit::new("Land Raider", 240), &old), None);
    }

    #[test]
    fn diff_reports_resolved_cost_changes_only() {
        let old = catalog("VERSION 3.4", 170, Some(10));
        let new = catalog("VERSION 3.5", 180, None);
        let units = vec![guard(), vexilla(), captain()];

        let changed = diff(&units, &old, &new);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].name, "Custodian Guard");
        assert_eq!(changed[0].delta, 10);
        assert_eq!(changed[0].new.zip(changed[0].old).map(|(n, o)| i64::from(n) - i64::from(o)), Some(10));

        assert_eq!(points_difference(&vexilla(), &new, &old), 0);
    }

    #[test]
    fn changes_include_entries_that_vanished() {
        let library = library();
        let list = ArmyList {
            mfm_version: "VERSION 3.4".to_string(),
            units: vec![guard(), vexilla(), captain()],
            ..ArmyList::default()
        };
        let found = changes(&list, &library);
        assert_eq!(found.len(), 2);
        let vanished = found
            .iter()
            .find(|change| change.option_name.is_some())
            .expect("vexilla change");
        assert_eq!(vanished.old, Some(10));
        assert_eq!(vanished.new, None);
        assert_eq!(vanished.delta, 0);
        assert!(is_outdated(&list, &library));
    }

    #[test]
    fn unknown_versions_are_outdated() {
        let library = library();
        let list = ArmyList {
            mfm_version: "VERSION 1.0".to_string(),
            ..ArmyList::default()
        };
        assert!(has_invalid_version(&list, &library));
        assert!(is_outdated(&list, &library));
        assert!(has_invalid_version(&ArmyList::default(), &library));
    }

    #[test]
    fn auto_upgrade_only_when_costs_match() {
        let library = library();
        let mut unchanged = ArmyList {
            mfm_version: "VERSION 3.4".to_string(),
            units: vec![captain()],
            ..ArmyList::default()
        };
        assert!(auto_upgrade(&mut unchanged, &library));
        assert_eq!(unchanged.mfm_version, "VERSION 3.5");
        assert!(!auto_upgrade(&mut unchanged, &library));

        let mut changed = ArmyList {
            mfm_version: "VERSION 3.4".to_string(),
            units: vec![guard()],
            ..ArmyList::default()
        };
        assert!(!auto_upgrade(&mut changed, &library));
        assert_eq!(changed.mfm_version, "VERSION 3.4");
    }

    #[test]
    fn upgrade_reprices_and_flags() {
        let current = catalog("VERSION 3.5", 180, None);
        let mut list = ArmyList {
            mfm_version: "VERSION 3.4".to_string(),
            units: vec![guard(), vexilla()],
            ..ArmyList::default()
        };
        assert_eq!(upgrade_list(&mut list, &current), 1);
        assert_eq!(list.mfm_version, "VERSION 3.5");
        assert_eq!(list.units[0].points, 180);
        assert!(!list.units[0].error);
        assert!(list.units[1].error);
        assert_eq!(list.units[1].points, 10);

        assert_eq!(upgrade_list(&mut list, &current), 0);
    }
}
