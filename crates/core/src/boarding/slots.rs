//! Slot layouts that restrict which units a boarding actions detachment may field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    names::{normalize, AliasTable},
    roster::Unit,
};

/// Names that identify enhancement entries in the constrained regime.
pub const ENHANCEMENT_GROUPS: &[&str] = &[
    "Enhancements",
    "Detachment Enhancements",
    "Generic Enhancements",
    "Breaching Operation Enhancements",
];

/// Category attached to enhancements every boarding detachment may take.
pub const GENERIC_CATEGORY: &str = "Generic Enhancements";
/// Category attached to enhancements configured for one detachment.
pub const DETACHMENT_CATEGORY: &str = "Detachment Enhancements";

/// One unit choice inside a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOption {
    /// Unit name as configured.
    pub name: String,
    /// Allowed model counts; any size when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<u32>>,
}

/// A group of interchangeable unit choices sharing one capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Interchangeable unit choices.
    pub options: Vec<SlotOption>,
    /// Nominal capacity; one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    /// When false, each choice may be taken once.
    #[serde(default = "default_duplicates")]
    pub duplicates: bool,
    /// Identifier of an entry in the exception rule table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

fn default_duplicates() -> bool {
    true
}

impl Slot {
    /// Nominal capacity before exception rules.
    pub fn base_max(&self) -> u32 {
        self.max.unwrap_or(1)
    }

    /// Option entry matching `name`.
    pub fn option_for(&self, name: &str, aliases: &AliasTable) -> Option<&SlotOption> {
        self.options
            .iter()
            .find(|option| aliases.equals(&option.name, name))
    }

    /// True when `name` is one of this slot's choices.
    pub fn contains(&self, name: &str, aliases: &AliasTable) -> bool {
        self.option_for(name, aliases).is_some()
    }

    /// Roster entries that occupy this slot. Bonus add-ons take no space.
    pub fn count_in(&self, units: &[Unit], aliases: &AliasTable) -> u32 {
        units
            .iter()
            .filter(|unit| !unit.bonus && self.contains(&unit.name, aliases))
            .count() as u32
    }

    /// Bullet list of the slot's choices with their allowed sizes.
    pub fn options_text(&self) -> String {
        self.options
            .iter()
            .map(|option| {
                let sizes = option
                    .models
                    .as_ref()
                    .map(|models| {
                        let counts: Vec<String> = models.iter().map(u32::to_string).collect();
                        format!(" ({} models)", counts.join(" or "))
                    })
                    .unwrap_or_default();
                format!("• {}{}", option.name, sizes)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Message shown when the slot has no exception rule.
    pub fn describe(&self) -> String {
        let duplicates = if self.duplicates {
            ""
        } else {
            " (duplicates are not allowed)"
        };
        let units = if self.options.len() == 1 {
            "unit"
        } else {
            "following units"
        };
        format!(
            "You can include up to {} of the {}{}:\n{}",
            self.base_max(),
            units,
            duplicates,
            self.options_text()
        )
    }
}

/// Boarding actions layout of one detachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetachmentSlots {
    /// Name shown instead of the detachment name.
    #[serde(alias = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Slots in display order.
    pub units: Vec<Slot>,
    /// Enhancements only this detachment may take.
    pub enhancements: Vec<String>,
}

/// Boarding actions configuration for every faction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardingActionsConfig {
    /// Enhancements available to every boarding actions detachment.
    pub generic_enhancements: Vec<String>,
    /// Faction -> detachment -> slot layout.
    pub factions: BTreeMap<String, BTreeMap<String, DetachmentSlots>>,
}

impl BoardingActionsConfig {
    /// Slot layout for a detachment, searching every faction.
    pub fn detachment(&self, detachment: &str) -> Option<&DetachmentSlots> {
        let wanted = normalize(detachment);
        if wanted.is_empty() {
            return None;
        }
        self.factions
            .values()
            .flat_map(|detachments| detachments.iter())
            .find(|(name, _)| normalize(name) == wanted)
            .map(|(_, slots)| slots)
    }

    /// True when `detachment` uses the constrained slot regime.
    pub fn is_boarding_actions(&self, detachment: &str) -> bool {
        self.detachment(detachment).is_some()
    }

    /// Configured display name, or the detachment name itself.
    pub fn display_name<'a>(&'a self, detachment: &'a str) -> &'a str {
        self.detachment(detachment)
            .and_then(|slots| slots.display_name.as_deref())
            .unwrap_or(detachment)
    }

    /// Slot holding `unit_name` in `detachment`.
    pub fn find_slot(
        &self,
        detachment: &str,
        unit_name: &str,
        aliases: &AliasTable,
    ) -> Option<&Slot> {
        self.detachment(detachment)?
            .units
            .iter()
            .find(|slot| slot.contains(unit_name, aliases))
    }

    /// Every `(faction, detachment, layout)` triple.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &DetachmentSlots)> {
        self.factions.iter().flat_map(|(faction, detachments)| {
            detachments
                .iter()
                .map(move |(name, slots)| (faction.as_str(), name.as_str(), slots))
        })
    }
}

/// True for names that stand for an enhancement entry.
pub fn is_enhancement_group(name: &str) -> bool {
    ENHANCEMENT_GROUPS
        .iter()
        .any(|group| crate::names::name_equals(group, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(names: &[&str], max: Option<u32>, duplicates: bool) -> Slot {
        Slot {
            options: names
                .iter()
                .map(|name| SlotOption {
                    name: name.to_string(),
                    models: None,
                })
                .collect(),
            max,
            duplicates,
            exception: None,
        }
    }

    #[test]
    fn describes_slot_with_sizes() {
        let mut slot = slot(&["Prosecutors", "Vigilators"], Some(2), false);
        slot.options[0].models = Some(vec![5, 10]);
        assert_eq!(
            slot.describe(),
            "You can include up to 2 of the following units (duplicates are not allowed):\n• Prosecutors (5 or 10 models)\n• Vigilators"
        );
        let single = self::slot(&["Solitaire"], None, true);
        assert_eq!(single.describe(), "You can include up to 1 of the unit:\n• Solitaire");
    }

    #[test]
    fn finds_detachment_and_slot_case_insensitively() {
        let mut detachments = BTreeMap::new();
        detachments.insert(
            "Shield Host Boarding Party".to_string(),
            DetachmentSlots {
                display_name: Some("Shield Host".to_string()),
                units: vec![slot(&["Custodian Guard"], Some(3), true)],
                enhancements: Vec::new(),
            },
        );
        let mut config = BoardingActionsConfig::default();
        config
            .factions
            .insert("ADEPTUS CUSTODES".to_string(), detachments);

        let aliases = AliasTable::default();
        assert!(config.is_boarding_actions("SHIELD HOST BOARDING PARTY"));
        assert!(!config.is_boarding_actions("Gladius Task Force"));
        assert_eq!(config.display_name("shield host boarding party"), "Shield Host");
        assert_eq!(config.display_name("Gladius Task Force"), "Gladius Task Force");
        let found = config
            .find_slot("Shield Host Boarding Party", "custodian guard", &aliases)
            .expect("slot present");
        assert_eq!(found.base_max(), 3);
        assert!(config
            .find_slot("Shield Host Boarding Party", "Allarus Custodians", &aliases)
            .is_none());
    }

    #[test]
    fn recognises_enhancement_groups() {
        assert!(is_enhancement_group("Generic Enhancements"));
        assert!(is_enhancement_group("ENHANCEMENTS"));
        assert!(!is_enhancement_group("Enhanced Custodian"));
    }
}
