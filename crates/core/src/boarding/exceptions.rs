//! Named cross-unit counting rules that override a slot's nominal capacity.
//!
//! Each rule is a pure function of the slot, the roster and the datasheet
//! lookup returning the number of units the slot may hold. Units that belong
//! to the slot itself are never counted against it.

use serde::{Deserialize, Serialize};

use super::slots::Slot;
use crate::{lookup::DatasheetIndex, names::AliasTable, roster::Unit};

const CUSTODIAN_UNITS: &[&str] = &["Allarus Custodians", "Custodian Guard", "Custodian Wardens"];
const ANATHEMA_PSYKANA_UNITS: &[&str] = &["Prosecutors", "Vigilators", "Witchseekers"];
const LEGIONARIES_UNITS: &[&str] = &["Legionaries"];
const CULTIST_UNITS: &[&str] = &[
    "Accursed Cultists",
    "Cultist Mob",
    "Fellgor Beastmen",
    "Traitor Guardsmen Squad",
];
const KHORNE_BERZERKERS_UNITS: &[&str] = &["Khorne Berzerkers"];
const JAKHALS_UNITS: &[&str] = &["Jakhals"];
const KROOT_CARNIVORES_UNITS: &[&str] = &["Kroot Carnivores"];

const PHOENIX_LORDS: &[(&str, &[&str])] = &[
    ("Asurmen", &["Dire Avengers"]),
    ("Baharroth", &["Swooping Hawks"]),
    ("Fuegan", &["Fire Dragons"]),
    ("Jain Zar", &["Howling Banshees"]),
    ("Karandras", &["Striking Scorpions"]),
    ("Maugan Ra", &["Dark Reapers"]),
];
const ARCHON: &[(&str, &[&str])] = &[("Archon", &["Kabalite Warriors"])];
const HAEMONCULI: &[(&str, &[&str])] = &[
    ("Haemonculus", &["Wracks"]),
    ("Urien Rakarth", &["Wracks"]),
];
const SUCCUBI: &[(&str, &[&str])] = &[
    ("Lelith Hesperax", &["Wyches"]),
    ("Succubus", &["Wyches"]),
];

const KHORNE: &[&str] = &[
    "Bloodletters",
    "Flesh Hounds",
    "Bloodcrushers",
    "Skull Cannon",
    "Skullmaster",
    "Karanak",
    "Bloodmaster",
    "Skulltaker",
];
const SLAANESH: &[&str] = &[
    "Daemonettes",
    "Fiends",
    "Seekers",
    "Seeker Chariots",
    "Exalted Seeker Chariot",
    "The Masque of Slaanesh",
    "Contorted Epitome",
    "Infernal Enrapturess",
    "Tranceweaver",
];
const NURGLE: &[&str] = &[
    "Plaguebearers",
    "Beasts of Nurgle",
    "Nurglings",
    "Plague Drones",
    "Poxbringer",
    "Sloppity Bilepiper",
    "Spoilpox Scrivener",
    "Epidemius",
];
const TZEENTCH: &[&str] = &[
    "Pink Horrors",
    "Blue Horrors",
    "Brimstone Horrors",
    "Flamers",
    "Screamers",
    "Burning Chariot",
    "Changecaster",
    "Fluxmaster",
    "Fateskimmer",
    "Changeling",
    "The Changeling",
    "Blue Scribes",
    "Kairos Fateweaver",
    "Exalted Flamer",
];
const OPPOSED_GODS: &[(&[&str], &[&str])] = &[(KHORNE, SLAANESH), (NURGLE, TZEENTCH)];

/// Inputs shared by every rule evaluation.
pub struct RuleContext<'r, 'c> {
    /// Slot being evaluated.
    pub slot: &'r Slot,
    /// Active detachment.
    pub detachment: &'r str,
    /// Roster snapshot to count against.
    pub units: &'r [Unit],
    /// Unit whose capacity is being asked for.
    pub target: &'r str,
    /// Datasheet lookup for flag checks.
    pub lookup: &'r DatasheetIndex<'c>,
}

impl RuleContext<'_, '_> {
    fn aliases(&self) -> &AliasTable {
        self.lookup.aliases()
    }

    fn in_slot(&self, unit: &Unit) -> bool {
        self.slot.contains(&unit.name, self.aliases())
    }

    fn matches(&self, name: &str, set: &[&str]) -> bool {
        set.iter().any(|candidate| self.aliases().equals(candidate, name))
    }

    /// Roster units outside this slot whose name is in `set`.
    fn count_outside(&self, set: &[&str]) -> u32 {
        self.units
            .iter()
            .filter(|unit| !self.in_slot(unit) && self.matches(&unit.name, set))
            .count() as u32
    }

    fn count_all(&self, set: &[&str]) -> u32 {
        self.units
            .iter()
            .filter(|unit| self.matches(&unit.name, set))
            .count() as u32
    }

    fn characters_outside(&self) -> u32 {
        self.units
            .iter()
            .filter(|unit| !unit.bonus && !self.in_slot(unit))
            .filter(|unit| {
                self.lookup
                    .get(&unit.name)
                    .map(|sheet| sheet.character)
                    .unwrap_or(false)
            })
            .count() as u32
    }
}

/// Registry of every known exception rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExceptionRule {
    /// At most one other character on the roster.
    RequiresMaxOneOtherCharacter,
    /// No other characters on the roster.
    RequiresNoOtherCharacters,
    /// Anathema Psykana units may not outnumber Custodian squads.
    RequiresCustodianUnits,
    /// Cultist units may not outnumber Legionaries.
    RequiresLegionariesUnits,
    /// Jakhals may not outnumber Khorne Berzerkers.
    RequiresKhorneBerzerkersUnits,
    /// Each Phoenix Lord needs its aspect warriors.
    RequiresPhoenixLordAttachment,
    /// Khorne and Slaanesh, or Nurgle and Tzeentch, never mix.
    GodExclusionRules,
    /// An Archon needs Kabalite Warriors.
    RequiresKabaliteWarriors,
    /// Haemonculi need Wracks.
    RequiresWracks,
    /// Succubi need Wyches.
    RequiresWyches,
    /// One Kroot auxiliary per Kroot Carnivores unit.
    RequiresKrootCarnivores,
}

/// The counting shape a rule reduces to.
enum Shape {
    /// Slot is open while at most `max_others` characters sit outside it.
    OtherCharacters { max_others: u32 },
    /// Units from `limited` outside the slot may not outnumber `required`.
    Ratio {
        limited: &'static [&'static str],
        required: &'static [&'static str],
    },
    /// Each gated unit needs one of its companions on the roster.
    Companion {
        gated: &'static [(&'static str, &'static [&'static str])],
    },
    /// Units of one set may not share a roster with the opposing set.
    Opposed {
        pairs: &'static [(&'static [&'static str], &'static [&'static str])],
    },
    /// One slot entry per companion unit on the roster.
    PerCompanion { companion: &'static [&'static str] },
}

impl ExceptionRule {
    /// Every rule in the registry.
    pub const ALL: [ExceptionRule; 11] = [
        Self::RequiresMaxOneOtherCharacter,
        Self::RequiresNoOtherCharacters,
        Self::RequiresCustodianUnits,
        Self::RequiresLegionariesUnits,
        Self::RequiresKhorneBerzerkersUnits,
        Self::RequiresPhoenixLordAttachment,
        Self::GodExclusionRules,
        Self::RequiresKabaliteWarriors,
        Self::RequiresWracks,
        Self::RequiresWyches,
        Self::RequiresKrootCarnivores,
    ];

    /// Identifier used in slot configuration.
    pub fn id(self) -> &'static str {
        match self {
            Self::RequiresMaxOneOtherCharacter => "requiresMaxOneOtherCharacter",
            Self::RequiresNoOtherCharacters => "requiresNoOtherCharacters",
            Self::RequiresCustodianUnits => "requiresCustodianUnits",
            Self::RequiresLegionariesUnits => "requiresLegionariesUnits",
            Self::RequiresKhorneBerzerkersUnits => "requiresKhorneBerzerkersUnits",
            Self::RequiresPhoenixLordAttachment => "requiresPhoenixLordAttachment",
            Self::GodExclusionRules => "godExclusionRules",
            Self::RequiresKabaliteWarriors => "requiresKabaliteWarriors",
            Self::RequiresWracks => "requiresWracks",
            Self::RequiresWyches => "requiresWyches",
            Self::RequiresKrootCarnivores => "requiresKrootCarnivores",
        }
    }

    /// Resolve a configured identifier; unknown identifiers have no rule.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rule| rule.id() == id)
    }

    fn shape(self) -> Shape {
        match self {
            Self::RequiresMaxOneOtherCharacter => Shape::OtherCharacters { max_others: 1 },
            Self::RequiresNoOtherCharacters => Shape::OtherCharacters { max_others: 0 },
            Self::RequiresCustodianUnits => Shape::Ratio {
                limited: ANATHEMA_PSYKANA_UNITS,
                required: CUSTODIAN_UNITS,
            },
            Self::RequiresLegionariesUnits => Shape::Ratio {
                limited: CULTIST_UNITS,
                required: LEGIONARIES_UNITS,
            },
            Self::RequiresKhorneBerzerkersUnits => Shape::Ratio {
                limited: JAKHALS_UNITS,
                required: KHORNE_BERZERKERS_UNITS,
            },
            Self::RequiresPhoenixLordAttachment => Shape::Companion {
                gated: PHOENIX_LORDS,
            },
            Self::GodExclusionRules => Shape::Opposed {
                pairs: OPPOSED_GODS,
            },
            Self::RequiresKabaliteWarriors => Shape::Companion { gated: ARCHON },
            Self::RequiresWracks => Shape::Companion { gated: HAEMONCULI },
            Self::RequiresWyches => Shape::Companion { gated: SUCCUBI },
            Self::RequiresKrootCarnivores => Shape::PerCompanion {
                companion: KROOT_CARNIVORES_UNITS,
            },
        }
    }

    /// Capacity of the slot under this rule.
    pub fn cap(self, ctx: &RuleContext<'_, '_>) -> u32 {
        let nominal = ctx.slot.base_max();
        match self.shape() {
            Shape::OtherCharacters { max_others } => {
                if ctx.characters_outside() <= max_others {
                    nominal
                } else {
                    0
                }
            }
            Shape::Ratio { limited, required } => ctx
                .count_all(required)
                .saturating_sub(ctx.count_outside(limited)),
            Shape::Companion { gated } => {
                let companions = gated
                    .iter()
                    .find(|(name, _)| ctx.aliases().equals(name, ctx.target))
                    .map(|(_, companions)| *companions);
                match companions {
                    Some(companions) if ctx.count_all(companions) == 0 => 0,
                    _ => nominal,
                }
            }
            Shape::Opposed { pairs } => {
                // Allegiance comes from the target; the slot's options only
                // decide when the target belongs to no god.
                let aligned = pairs.iter().any(|(left, right)| {
                    ctx.matches(ctx.target, left) || ctx.matches(ctx.target, right)
                });
                let side_of = |set: &[&str]| {
                    if aligned {
                        ctx.matches(ctx.target, set)
                    } else {
                        ctx.slot
                            .options
                            .iter()
                            .any(|option| ctx.matches(&option.name, set))
                    }
                };
                let blocked = pairs.iter().any(|(left, right)| {
                    (side_of(left) && ctx.count_outside(right) > 0)
                        || (side_of(right) && ctx.count_outside(left) > 0)
                });
                if blocked {
                    0
                } else {
                    nominal
                }
            }
            Shape::PerCompanion { companion } => ctx.count_outside(companion),
        }
    }

    /// Player-facing description of the rule for `slot`.
    pub fn message(self, slot: &Slot) -> String {
        match self {
            Self::RequiresMaxOneOtherCharacter => format!(
                "If you include only one other CHARACTER unit, you can include up to {} of the following units:\n{}",
                slot.base_max(),
                names_text(slot)
            ),
            Self::RequiresNoOtherCharacters => format!(
                "If you do not include any other CHARACTER models, you can include up to {} of the following unit:\n{}",
                slot.base_max(),
                names_text(slot)
            ),
            Self::RequiresCustodianUnits => format!(
                "The total number of all of these units cannot be more than the total number of ALLARUS CUSTODIANS, CUSTODIAN GUARD and CUSTODIAN WARDEN units:\n{}",
                slot.options_text()
            ),
            Self::RequiresLegionariesUnits => format!(
                "The combined total number of all of these units cannot be more than the total number of LEGIONARIES units:\n{}",
                slot.options_text()
            ),
            Self::RequiresKhorneBerzerkersUnits => format!(
                "The combined total number of [Jakhals] units cannot be more than the number of KHORNE BERZERKERS units:\n{}",
                slot.options_text()
            ),
            Self::RequiresPhoenixLordAttachment => {
                let lords: Vec<String> = PHOENIX_LORDS
                    .iter()
                    .map(|(lord, companions)| format!("• {} (requires {})", lord, companions.join(", ")))
                    .collect();
                format!(
                    "You can only include a PHOENIX LORD model if you also include one of the units it can normally be attached to:\n{}",
                    lords.join("\n")
                )
            }
            Self::GodExclusionRules => "Chaos Daemons cannot mix units from opposed gods:\n• Cannot mix Khorne + Slaanesh units\n• Cannot mix Nurgle + Tzeentch units".to_string(),
            Self::RequiresKabaliteWarriors => "You can include up to one of the following unit if you include one or more KABALITE WARRIORS units:\n• Archon".to_string(),
            Self::RequiresWracks => "You can include up to one of the following units if you include one or more WRACKS units:\n• Haemonculus (excluding Urien Rakarth)\n• Urien Rakarth".to_string(),
            Self::RequiresWyches => "You can include up to one of the following units if you include one or more WYCHES units:\n• Lelith Hesperax\n• Succubus (excluding Lelith Hesperax)".to_string(),
            Self::RequiresKrootCarnivores => "For each KROOT CARNIVORES unit you include, you can include up to one of the following units:\n• Kroot Farstalkers\n• Kroot Hounds\n• Krootox Riders".to_string(),
        }
    }
}

fn names_text(slot: &Slot) -> String {
    slot.options
        .iter()
        .map(|option| format!("• {}", option.name))
        .collect::<Vec<_>>()
        .join("\n")
}
