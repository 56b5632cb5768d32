//! Shared domain models.

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

/// Name of the sentinel datasheet that carries every enhancement option.
pub const ENHANCEMENTS: &str = "Enhancements";

/// Version token read from a manual header (e.g. `VERSION 3.5`).
///
/// Ordered by the numeric components first so that `3.10` sorts after `3.9`,
/// falling back to plain string order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManualVersion(String);

impl ManualVersion {
    /// Wrap a raw version token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    /// The token as it appeared in the manual.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn components(&self) -> Vec<u64> {
        self.0
            .split(|ch: char| !ch.is_ascii_digit())
            .filter(|part| !part.is_empty())
            .filter_map(|part| part.parse().ok())
            .collect()
    }
}

impl Ord for ManualVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components()
            .cmp(&other.components())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for ManualVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ManualVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named detachment within a faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detachment {
    /// Detachment name as printed.
    pub name: String,
}

/// A faction heading and the detachments listed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    /// Upper-cased faction name with codex prefixes removed.
    pub name: String,
    /// Detachments in document order.
    pub detachments: Vec<Detachment>,
}

/// A purchasable size or variant of a datasheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitOption {
    /// Option label; the datasheet name when the cost line only gave a model count.
    pub name: String,
    /// Model count for the size, if printed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<u32>,
    /// Point cost.
    pub points: u32,
    /// Additive add-on without an independent count cap.
    #[serde(default)]
    pub bonus: bool,
    /// Detachment an enhancement belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detachment: Option<String>,
    /// True for enhancement options.
    #[serde(default)]
    pub enhancement: bool,
    /// Grouping label for enhancements (e.g. `Generic Enhancements`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhancement_category: Option<String>,
    /// Signed change printed next to the cost, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i32>,
}

impl UnitOption {
    /// Plain option with a name and cost.
    pub fn new(name: impl Into<String>, points: u32) -> Self {
        Self {
            name: name.into(),
            models: None,
            points,
            bonus: false,
            detachment: None,
            enhancement: false,
            enhancement_category: None,
            delta: None,
        }
    }

    /// Zero-point style enhancement option tagged to a detachment.
    pub fn enhancement(
        name: impl Into<String>,
        points: u32,
        detachment: impl Into<String>,
        category: Option<String>,
    ) -> Self {
        Self {
            detachment: Some(detachment.into()),
            enhancement: true,
            enhancement_category: category,
            ..Self::new(name, points)
        }
    }

    /// Builder helper setting the model count.
    pub fn with_models(mut self, models: u32) -> Self {
        self.models = Some(models);
        self
    }
}

/// A unit type with its flags and costed options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datasheet {
    /// Datasheet title.
    pub name: String,
    /// Owning faction name (empty for the enhancements sentinel).
    pub faction: String,
    /// Purchasable sizes in document order.
    pub sizes: Vec<UnitOption>,
    /// Unique named character; one per army.
    #[serde(default)]
    pub epic_hero: bool,
    /// Core troops; up to six per army.
    #[serde(default)]
    pub battle_line: bool,
    /// Transport bought alongside other units; up to six per army.
    #[serde(default)]
    pub dedicated_transport: bool,
    /// Character unit, counted for enhancement budgets.
    #[serde(default)]
    pub character: bool,
    /// Fortification terrain piece.
    #[serde(default)]
    pub fortification: bool,
    /// Listed in the Forge World section.
    #[serde(default)]
    pub forge_world: bool,
    /// Listed in the Legends section.
    #[serde(default)]
    pub legends: bool,
    /// Allegiance tag for allied units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allies: Option<String>,
    /// Parent faction when the owning faction is a sub-faction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_faction: Option<String>,
}

impl Datasheet {
    /// Empty datasheet with every flag cleared.
    pub fn new(name: impl Into<String>, faction: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            faction: faction.into(),
            sizes: Vec::new(),
            epic_hero: false,
            battle_line: false,
            dedicated_transport: false,
            character: false,
            fortification: false,
            forge_world: false,
            legends: false,
            allies: None,
            sub_faction: None,
        }
    }

    /// The sentinel holding every enhancement option.
    pub fn enhancements_sentinel() -> Self {
        Self::new(ENHANCEMENTS, "")
    }

    /// True for the enhancements sentinel, which is not a real unit.
    pub fn is_enhancements(&self) -> bool {
        crate::names::name_equals(&self.name, ENHANCEMENTS)
    }
}

/// Immutable parse result for one manual version.
///
/// Fields are private so a catalog shared behind an `Arc` cannot be altered
/// after the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    version: ManualVersion,
    factions: Vec<Faction>,
    datasheets: Vec<Datasheet>,
}

impl Catalog {
    /// Assemble a catalog from parsed parts.
    pub fn new(version: ManualVersion, factions: Vec<Faction>, datasheets: Vec<Datasheet>) -> Self {
        Self {
            version,
            factions,
            datasheets,
        }
    }

    /// Version token of the manual.
    pub fn version(&self) -> &ManualVersion {
        &self.version
    }

    /// Factions in document order.
    pub fn factions(&self) -> &[Faction] {
        &self.factions
    }

    /// Every datasheet, the enhancements sentinel included.
    pub fn datasheets(&self) -> &[Datasheet] {
        &self.datasheets
    }

    /// Exact-name datasheet match used for pricing across versions.
    pub fn datasheet_exact(&self, name: &str) -> Option<&Datasheet> {
        self.datasheets.iter().find(|sheet| sheet.name == name)
    }

    /// Faction by normalised name.
    pub fn faction(&self, name: &str) -> Option<&Faction> {
        self.factions
            .iter()
            .find(|faction| crate::names::name_equals(&faction.name, name))
    }

    /// Datasheets belonging to a faction or its selected sub-faction.
    pub fn faction_datasheets(&self, faction: &str, sub_faction: Option<&str>) -> Vec<&Datasheet> {
        self.datasheets
            .iter()
            .filter(|sheet| {
                sheet.faction == faction
                    || sub_faction.map(|sub| sheet.faction == sub).unwrap_or(false)
            })
            .collect()
    }

    /// The enhancements sentinel, if the manual had any enhancements.
    pub fn enhancements(&self) -> Option<&Datasheet> {
        self.datasheets.iter().find(|sheet| sheet.is_enhancements())
    }

    /// Enhancement options offered to `detachment` (case-insensitive match).
    pub fn enhancements_for(&self, detachment: &str) -> Vec<&UnitOption> {
        let wanted = detachment.to_lowercase();
        self.enhancements()
            .map(|sheet| {
                sheet
                    .sizes
                    .iter()
                    .filter(|size| {
                        size.detachment
                            .as_deref()
                            .map(|value| value.to_lowercase() == wanted)
                            .unwrap_or(false)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_order_numerically() {
        let mut versions = vec![
            ManualVersion::new("VERSION 3.10"),
            ManualVersion::new("VERSION 2.9"),
            ManualVersion::new("VERSION 3.9"),
        ];
        versions.sort();
        let ordered: Vec<_> = versions.iter().map(ManualVersion::as_str).collect();
        assert_eq!(ordered, ["VERSION 2.9", "VERSION 3.9", "VERSION 3.10"]);
    }

    #[test]
    fn enhancements_filter_by_detachment_ignoring_case() {
        let mut sentinel = Datasheet::enhancements_sentinel();
        sentinel.sizes.push(UnitOption::enhancement("Artificer Armour", 10, "Gladius Task Force", None));
        sentinel.sizes.push(UnitOption::enhancement("Architect of War", 25, "Anvil Siege Force", None));
        let catalog = Catalog::new(ManualVersion::new("VERSION 1.0"), Vec::new(), vec![sentinel]);

        let offered = catalog.enhancements_for("GLADIUS TASK FORCE");
        assert_eq!(offered.len(), 1);
        assert_eq!(offered[0].name, "Artificer Armour");
        assert!(catalog.enhancements_for("Firestorm Assault Force").is_empty());
    }
}
