//! How many of a unit a list may still take, and why an entry is illegal.
//!
//! Two regimes apply. Standard detachments cap each datasheet from its flags
//! (six battle-line or dedicated transports, one epic hero, three of anything
//! else). Boarding actions detachments instead place every unit in a
//! configured slot whose capacity may be cut by an exception rule.
//!
//! Nothing is cached between calls. Exception rules look across the whole
//! roster, so adding one unit can invalidate another, and every answer is
//! recomputed from the roster passed in.

use tracing::warn;

use crate::{
    boarding::{is_enhancement_group, ExceptionRule, RuleContext, Slot},
    config::{listed, CatalogConfig},
    error::ValidationError,
    lookup::DatasheetIndex,
    models::{Catalog, Datasheet, UnitOption},
    roster::{ArmyList, Unit},
};

/// Standard-regime cap for battle-line and dedicated transport datasheets.
pub const BATTLE_LINE_MAX: u32 = 6;
/// Standard-regime cap for epic heroes.
pub const EPIC_HERO_MAX: u32 = 1;
/// Standard-regime cap for every other datasheet.
pub const DEFAULT_MAX: u32 = 3;
/// Most enhancements a boarding actions list may take.
pub const BOARDING_ENHANCEMENT_MAX: u32 = 2;

/// Eligibility rules for one catalog, faction and detachment.
pub struct EligibilityEngine<'c> {
    config: &'c CatalogConfig,
    index: DatasheetIndex<'c>,
    detachment: String,
}

impl<'c> EligibilityEngine<'c> {
    /// Engine for an explicit faction and detachment.
    pub fn new(
        catalog: &'c Catalog,
        config: &'c CatalogConfig,
        faction: &str,
        sub_faction: Option<&str>,
        detachment: &str,
    ) -> Self {
        Self {
            config,
            index: DatasheetIndex::new(catalog, faction, sub_faction, config.alias_table()),
            detachment: detachment.to_string(),
        }
    }

    /// Engine for the faction and detachment recorded on `list`.
    pub fn for_list(catalog: &'c Catalog, config: &'c CatalogConfig, list: &ArmyList) -> Self {
        Self::new(
            catalog,
            config,
            &list.faction,
            list.sub_faction.as_deref(),
            &list.detachment,
        )
    }

    /// Name lookup used by every check.
    pub fn index(&self) -> &DatasheetIndex<'c> {
        &self.index
    }

    /// Datasheet for a roster name.
    pub fn lookup(&self, name: &str) -> Option<&'c Datasheet> {
        self.index.get(name)
    }

    /// True when the detachment uses boarding actions slots.
    pub fn is_boarding_actions(&self) -> bool {
        self.config.boarding_actions.is_boarding_actions(&self.detachment)
    }

    /// Configured slot holding `name` in the active detachment.
    pub fn slot_for(&self, name: &str) -> Option<&'c Slot> {
        self.config
            .boarding_actions
            .find_slot(&self.detachment, name, self.index.aliases())
    }

    /// Non-bonus roster entries named `name`.
    pub fn current_count(&self, name: &str, units: &[Unit]) -> u32 {
        let aliases = self.index.aliases();
        units
            .iter()
            .filter(|unit| !unit.bonus && aliases.equals(&unit.name, name))
            .count() as u32
    }

    /// Roster characters that can carry an enhancement: characters that are
    /// not epic heroes. Enhancement and bonus entries are ignored.
    pub fn non_epic_character_count(&self, units: &[Unit]) -> u32 {
        units
            .iter()
            .filter(|unit| !unit.bonus && !unit.is_enhancement())
            .filter_map(|unit| self.lookup(&unit.name))
            .filter(|sheet| sheet.character && !sheet.epic_hero)
            .count() as u32
    }

    /// Most copies of `sheet` the list may hold.
    pub fn max_allowed(&self, sheet: &Datasheet, units: &[Unit]) -> u32 {
        if self.is_boarding_actions() {
            self.boarding_max(sheet, units)
        } else {
            self.standard_max(sheet)
        }
    }

    fn standard_max(&self, sheet: &Datasheet) -> u32 {
        let conditional = self.config.conditional_for(&self.detachment);
        let battle_line = sheet.battle_line
            || conditional
                .map(|tables| listed(&tables.battle_line, &sheet.name))
                .unwrap_or(false);
        let transport = sheet.dedicated_transport
            || conditional
                .map(|tables| listed(&tables.dedicated_transport, &sheet.name))
                .unwrap_or(false);

        if battle_line || transport {
            BATTLE_LINE_MAX
        } else if sheet.epic_hero {
            EPIC_HERO_MAX
        } else {
            DEFAULT_MAX
        }
    }

    fn boarding_max(&self, sheet: &Datasheet, units: &[Unit]) -> u32 {
        if sheet.is_enhancements() || is_enhancement_group(&sheet.name) {
            return self.enhancement_max(units);
        }
        let Some(slot) = self.slot_for(&sheet.name) else {
            return 0;
        };
        let capacity = self.slot_capacity(slot, &sheet.name, units);
        if slot.duplicates {
            capacity
        } else {
            capacity.min(1)
        }
    }

    fn enhancement_max(&self, units: &[Unit]) -> u32 {
        BOARDING_ENHANCEMENT_MAX.min(self.non_epic_character_count(units))
    }

    /// Slot capacity after its exception rule, before the duplicates limit.
    fn slot_capacity(&self, slot: &Slot, target: &str, units: &[Unit]) -> u32 {
        let base = slot.base_max();
        let Some(id) = slot.exception.as_deref() else {
            return base;
        };
        match ExceptionRule::from_id(id) {
            Some(rule) => {
                let ctx = RuleContext {
                    slot,
                    detachment: &self.detachment,
                    units,
                    target,
                    lookup: &self.index,
                };
                rule.cap(&ctx).min(base)
            }
            None => {
                warn!(exception = %id, detachment = %self.detachment, "Unknown exception rule");
                base
            }
        }
    }

    /// True when the slot holding `name` has no room left in `units`.
    pub fn is_slot_full(&self, name: &str, units: &[Unit]) -> bool {
        let Some(slot) = self.slot_for(name) else {
            return false;
        };
        slot.count_in(units, self.index.aliases()) >= self.slot_capacity(slot, name, units)
    }

    /// True when one more copy of `sheet` may be added.
    pub fn is_eligible(&self, sheet: &Datasheet, units: &[Unit]) -> bool {
        if self.current_count(&sheet.name, units) >= self.max_allowed(sheet, units) {
            return false;
        }
        !(self.is_boarding_actions() && !sheet.is_enhancements() && self.is_slot_full(&sheet.name, units))
    }

    /// Player-facing description of a slot and its exception rule.
    pub fn slot_message(&self, slot: &Slot) -> String {
        slot.exception
            .as_deref()
            .and_then(ExceptionRule::from_id)
            .map(|rule| rule.message(slot))
            .unwrap_or_else(|| slot.describe())
    }

    /// Why `unit` is not a legal entry of `units`, if it is not.
    pub fn validation_error(&self, unit: &Unit, units: &[Unit]) -> Option<ValidationError> {
        if unit.error {
            return Some(ValidationError::InvalidUnit);
        }
        if unit.is_enhancement() {
            return self.enhancement_error(unit, units);
        }

        let Some(sheet) = self.lookup(&unit.name) else {
            return Some(ValidationError::Unresolved {
                version: self.index.catalog().version().to_string(),
            });
        };
        let count = self.current_count(&unit.name, units);

        if !self.is_boarding_actions() {
            if unit.bonus {
                return None;
            }
            let max = self.standard_max(sheet);
            return (count > max).then_some(ValidationError::CapExceeded { max });
        }

        let Some(slot) = self.slot_for(&unit.name) else {
            return Some(ValidationError::SlotNotFound);
        };
        // Add-ons ride on their unit and take no room of their own.
        if unit.bonus {
            return None;
        }
        let max = self.boarding_max(sheet, units);
        let others: Vec<Unit> = units
            .iter()
            .filter(|other| other.id != unit.id)
            .cloned()
            .collect();
        if max == 0 || count > max || self.is_slot_full(&unit.name, &others) {
            return Some(ValidationError::SlotExceeded {
                message: self.slot_message(slot),
            });
        }
        None
    }

    fn enhancement_error(&self, unit: &Unit, units: &[Unit]) -> Option<ValidationError> {
        let catalog = self.index.catalog();
        let offered = unit
            .option_name
            .as_deref()
            .map(|chosen| {
                catalog
                    .enhancements_for(&self.detachment)
                    .iter()
                    .any(|option| option.name == chosen)
            })
            .unwrap_or(false);
        if !offered {
            return Some(ValidationError::EnhancementNotOffered);
        }

        if self.is_boarding_actions() {
            let max = self.enhancement_max(units);
            let taken = units
                .iter()
                .filter(|entry| entry.is_enhancement() && !entry.bonus)
                .count() as u32;
            if taken > max {
                return Some(ValidationError::EnhancementLimit { max });
            }
        }
        None
    }

    /// Every invalid entry of `units` with its reason, in roster order.
    pub fn validate(&self, units: &[Unit]) -> Vec<(String, ValidationError)> {
        units
            .iter()
            .filter_map(|unit| {
                self.validation_error(unit, units)
                    .map(|error| (unit.id.clone(), error))
            })
            .collect()
    }

    /// Sizes of `sheet` offered to this list.
    ///
    /// The enhancements sentinel offers the detachment's enhancements. In a
    /// boarding actions detachment, sizes are narrowed to the slot's allowed
    /// model counts; when none match, every size is offered.
    pub fn available_sizes<'s>(&self, sheet: &'s Datasheet) -> Vec<&'s UnitOption>
    where
        'c: 's,
    {
        if sheet.is_enhancements() {
            return self.index.catalog().enhancements_for(&self.detachment);
        }
        let all: Vec<&UnitOption> = sheet.sizes.iter().collect();
        if !self.is_boarding_actions() {
            return all;
        }
        let allowed = self
            .slot_for(&sheet.name)
            .and_then(|slot| slot.option_for(&sheet.name, self.index.aliases()))
            .and_then(|option| option.models.as_ref());
        let Some(allowed) = allowed else {
            return all;
        };
        let filtered: Vec<&UnitOption> = all
            .iter()
            .copied()
            .filter(|size| size.models.map(|models| allowed.contains(&models)).unwrap_or(false))
            .collect();
        if filtered.is_empty() {
            all
        } else {
            filtered
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{
        boarding::{DetachmentSlots, SlotOption},
        config::ConditionalTables,
        models::{ManualVersion, ENHANCEMENTS},
    };

    const FACTION: &str = "ADEPTUS CUSTODES";
    const BOARDING: &str = "Shield Host Boarding Party";

    fn sheet(name: &str, sizes: &[(u32, u32)]) -> Datasheet {
        let mut sheet = Datasheet::new(name, FACTION);
        for (models, points) in sizes {
            sheet.sizes.push(UnitOption::new(name, *points).with_models(*models));
        }
        sheet
    }

    fn catalog() -> Catalog {
        let mut guard = sheet("Custodian Guard", &[(4, 170), (5, 215)]);
        guard.battle_line = true;
        let mut trajann = sheet("Trajann Valoris", &[(1, 140)]);
        trajann.epic_hero = true;
        trajann.character = true;
        let mut captain = sheet("Shield-Captain", &[(1, 130)]);
        captain.character = true;
        let mut archon = sheet("Archon", &[(1, 75)]);
        archon.character = true;
        let mut enhancements = Datasheet::enhancements_sentinel();
        enhancements
            .sizes
            .push(UnitOption::enhancement("Auric Mantle", 15, "Shield Host", None));
        enhancements
            .sizes
            .push(UnitOption::enhancement("Veteran Commander", 0, BOARDING, None));
        Catalog::new(
            ManualVersion::new("VERSION 3.2"),
            Vec::new(),
            vec![
                guard,
                trajann,
                captain,
                sheet("Allarus Custodians", &[(2, 110), (3, 165)]),
                sheet("Venatari Custodians", &[(3, 165)]),
                sheet("Kabalite Warriors", &[(10, 110)]),
                archon,
                enhancements,
            ],
        )
    }

    fn slot(names: &[(&str, Option<Vec<u32>>)], max: u32, duplicates: bool, exception: Option<&str>) -> Slot {
        Slot {
            options: names
                .iter()
                .map(|(name, models)| SlotOption {
                    name: name.to_string(),
                    models: models.clone(),
                })
                .collect(),
            max: Some(max),
            duplicates,
            exception: exception.map(str::to_string),
        }
    }

    fn config() -> CatalogConfig {
        let mut config = CatalogConfig::default();
        let mut detachments = BTreeMap::new();
        detachments.insert(
            BOARDING.to_string(),
            DetachmentSlots {
                display_name: None,
                units: vec![
                    slot(&[("Custodian Guard", Some(vec![5]))], 2, true, None),
                    slot(&[("Shield-Captain", None)], 3, true, None),
                    slot(&[("Allarus Custodians", Some(vec![10]))], 1, false, None),
                    slot(&[("Kabalite Warriors", None)], 2, true, None),
                    slot(&[("Archon", None)], 1, true, Some("requiresKabaliteWarriors")),
                ],
                enhancements: Vec::new(),
            },
        );
        config
            .boarding_actions
            .factions
            .insert(FACTION.to_string(), detachments);
        config.conditional.insert(
            "Auric Champions".to_string(),
            ConditionalTables {
                battle_line: vec!["Allarus Custodians".to_string()],
                dedicated_transport: Vec::new(),
            },
        );
        config
    }

    fn units(names: &[&str]) -> Vec<Unit> {
        names.iter().map(|name| Unit::new(*name, 100)).collect()
    }

    fn enhancement(name: &str) -> Unit {
        let mut unit = Unit::new(ENHANCEMENTS, 15);
        unit.option_name = Some(name.to_string());
        unit
    }

    #[test]
    fn epic_heroes_are_unique() {
        let catalog = catalog();
        let config = config();
        let engine = EligibilityEngine::new(&catalog, &config, FACTION, None, "Shield Host");
        let trajann = engine.lookup("Trajann Valoris").expect("datasheet");

        let mut roster = units(&["Trajann Valoris"]);
        assert_eq!(engine.max_allowed(trajann, &roster), 1);
        assert!(!engine.is_eligible(trajann, &roster));
        assert_eq!(engine.validation_error(&roster[0], &roster), None);

        roster.extend(units(&["Trajann Valoris"]));
        assert_eq!(
            engine.validation_error(&roster[1], &roster),
            Some(ValidationError::CapExceeded { max: 1 })
        );
    }

    #[test]
    fn battle_line_allows_six() {
        let catalog = catalog();
        let config = config();
        let engine = EligibilityEngine::new(&catalog, &config, FACTION, None, "Shield Host");
        let guard = engine.lookup("Custodian Guard").expect("datasheet");

        let mut roster = units(&["Custodian Guard"; 5]);
        assert!(engine.is_eligible(guard, &roster));
        roster.extend(units(&["Custodian Guard"]));
        assert!(!engine.is_eligible(guard, &roster));
        assert!(engine.validate(&roster).is_empty());

        roster.extend(units(&["Custodian Guard"]));
        let errors = engine.validate(&roster);
        assert_eq!(errors.len(), 7);
        assert!(errors
            .iter()
            .all(|(_, error)| *error == ValidationError::CapExceeded { max: 6 }));
    }

    #[test]
    fn bonus_entries_do_not_count() {
        let catalog = catalog();
        let config = config();
        let engine = EligibilityEngine::new(&catalog, &config, FACTION, None, "Shield Host");
        let mut roster = units(&["Trajann Valoris", "Trajann Valoris"]);
        roster[1].bonus = true;
        assert_eq!(engine.current_count("Trajann Valoris", &roster), 1);
        assert!(engine.validate(&roster).is_empty());
    }

    #[test]
    fn detachment_overrides_promote_battle_line() {
        let catalog = catalog();
        let config = config();
        let allarus = catalog.datasheet_exact("Allarus Custodians").expect("datasheet");
        let standard = EligibilityEngine::new(&catalog, &config, FACTION, None, "Shield Host");
        let champions = EligibilityEngine::new(&catalog, &config, FACTION, None, "AURIC CHAMPIONS");
        assert_eq!(standard.max_allowed(allarus, &[]), DEFAULT_MAX);
        assert_eq!(champions.max_allowed(allarus, &[]), BATTLE_LINE_MAX);
    }

    #[test]
    fn flagged_entries_are_always_invalid() {
        let catalog = catalog();
        let config = config();
        let engine = EligibilityEngine::new(&catalog, &config, FACTION, None, "Shield Host");
        let mut roster = units(&["Custodian Guard"]);
        roster[0].error = true;
        assert_eq!(
            engine.validation_error(&roster[0], &roster),
            Some(ValidationError::InvalidUnit)
        );
    }

    #[test]
    fn unknown_units_are_unresolved() {
        let catalog = catalog();
        let config = config();
        let engine = EligibilityEngine::new(&catalog, &config, FACTION, None, "Shield Host");
        let roster = units(&["Land Raider"]);
        assert_eq!(
            engine.validation_error(&roster[0], &roster),
            Some(ValidationError::Unresolved {
                version: "VERSION 3.2".to_string()
            })
        );
    }

    #[test]
    fn enhancements_must_be_offered_by_detachment() {
        let catalog = catalog();
        let config = config();
        let engine = EligibilityEngine::new(&catalog, &config, FACTION, None, "Shield Host");
        let roster = vec![enhancement("Auric Mantle"), enhancement("Veteran Commander")];
        assert_eq!(engine.validation_error(&roster[0], &roster), None);
        assert_eq!(
            engine.validation_error(&roster[1], &roster),
            Some(ValidationError::EnhancementNotOffered)
        );
    }

    #[test]
    fn boarding_enhancements_follow_character_count() {
        let catalog = catalog();
        let config = config();
        let engine = EligibilityEngine::new(&catalog, &config, FACTION, None, BOARDING);
        let sentinel = catalog.enhancements().expect("sentinel");

        assert_eq!(engine.max_allowed(sentinel, &[]), 0);
        let with_epic = units(&["Trajann Valoris"]);
        assert_eq!(engine.max_allowed(sentinel, &with_epic), 0);

        let mut roster = units(&["Shield-Captain", "Shield-Captain", "Shield-Captain"]);
        assert_eq!(engine.non_epic_character_count(&roster), 3);
        assert_eq!(engine.max_allowed(sentinel, &roster), 2);

        roster.extend(vec![
            enhancement("Veteran Commander"),
            enhancement("Veteran Commander"),
        ]);
        assert_eq!(engine.non_epic_character_count(&roster), 3);
        assert!(engine.validate(&roster).is_empty());

        roster.push(enhancement("Veteran Commander"));
        let errors = engine.validate(&roster);
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .all(|(_, error)| *error == ValidationError::EnhancementLimit { max: 2 }));
    }

    #[test]
    fn units_without_slot_are_unavailable() {
        let catalog = catalog();
        let config = config();
        let engine = EligibilityEngine::new(&catalog, &config, FACTION, None, BOARDING);
        let venatari = engine.lookup("Venatari Custodians").expect("datasheet");
        let roster = units(&["Venatari Custodians"]);
        assert_eq!(engine.max_allowed(venatari, &roster), 0);
        assert!(!engine.is_eligible(venatari, &[]));
        assert_eq!(
            engine.validation_error(&roster[0], &roster),
            Some(ValidationError::SlotNotFound)
        );
    }

    #[test]
    fn slot_capacity_is_shared_and_reported() {
        let catalog = catalog();
        let config = config();
        let engine = EligibilityEngine::new(&catalog, &config, FACTION, None, BOARDING);
        let allarus = engine.lookup("Allarus Custodians").expect("datasheet");
        assert_eq!(engine.max_allowed(allarus, &[]), 1);

        let roster = units(&["Allarus Custodians", "Allarus Custodians"]);
        let errors = engine.validate(&roster);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].1.to_string(),
            "You can include up to 1 of the unit (duplicates are not allowed):\n• Allarus Custodians (10 models)"
        );
    }

    #[test]
    fn boarding_add_ons_take_no_slot_room() {
        let catalog = catalog();
        let config = config();
        let engine = EligibilityEngine::new(&catalog, &config, FACTION, None, BOARDING);
        let mut roster = units(&["Allarus Custodians", "Allarus Custodians"]);
        roster[1].bonus = true;
        roster[1].option_name = Some("Vexilla".to_string());
        assert!(engine.validate(&roster).is_empty());

        let mut stray = units(&["Venatari Custodians"]);
        stray[0].bonus = true;
        assert_eq!(
            engine.validation_error(&stray[0], &stray),
            Some(ValidationError::SlotNotFound)
        );
    }

    #[test]
    fn bonus_characters_do_not_raise_enhancement_budget() {
        let catalog = catalog();
        let config = config();
        let engine = EligibilityEngine::new(&catalog, &config, FACTION, None, BOARDING);
        let mut roster = units(&["Shield-Captain", "Shield-Captain"]);
        roster[1].bonus = true;
        assert_eq!(engine.non_epic_character_count(&roster), 1);
        let sentinel = catalog.enhancements().expect("sentinel");
        assert_eq!(engine.max_allowed(sentinel, &roster), 1);
    }

    #[test]
    fn companion_rules_reflag_existing_entries() {
        let catalog = catalog();
        let config = config();
        let engine = EligibilityEngine::new(&catalog, &config, FACTION, None, BOARDING);
        let archon = engine.lookup("Archon").expect("datasheet");

        let mut roster = units(&["Archon"]);
        assert!(engine.is_slot_full("Archon", &roster));
        let error = engine
            .validation_error(&roster[0], &roster)
            .expect("archon needs warriors");
        assert!(error.to_string().contains("KABALITE WARRIORS"));

        roster.extend(units(&["Kabalite Warriors"]));
        assert_eq!(engine.validation_error(&roster[0], &roster), None);
        assert!(!engine.is_eligible(archon, &roster));

        let warriors_id = roster[1].id.clone();
        roster.retain(|unit| unit.id != warriors_id);
        assert!(engine.validation_error(&roster[0], &roster).is_some());
    }

    #[test]
    fn sizes_follow_slot_models_with_fallback() {
        let catalog = catalog();
        let config = config();
        let engine = EligibilityEngine::new(&catalog, &config, FACTION, None, BOARDING);

        let guard = engine.lookup("Custodian Guard").expect("datasheet");
        let sizes: Vec<_> = engine.available_sizes(guard).iter().map(|size| size.points).collect();
        assert_eq!(sizes, [215]);

        let allarus = engine.lookup("Allarus Custodians").expect("datasheet");
        assert_eq!(engine.available_sizes(allarus).len(), 2);

        let sentinel = catalog.enhancements().expect("sentinel");
        let offered: Vec<_> = engine.available_sizes(sentinel).iter().map(|size| size.name.as_str()).collect();
        assert_eq!(offered, ["Veteran Commander"]);

        let standard = EligibilityEngine::new(&catalog, &config, FACTION, None, "Shield Host");
        assert_eq!(standard.available_sizes(guard).len(), 2);
    }
}
