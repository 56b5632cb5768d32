//! Exact-text corrections for known formatting defects in the manuals.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One literal replacement applied to the raw manual text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixup {
    /// Text to find, possibly spanning several lines.
    pub from: String,
    /// Replacement text.
    pub to: String,
}

impl Fixup {
    /// Build a replacement pair.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Corrections every manual needs before parsing.
pub fn default_fixups() -> Vec<Fixup> {
    vec![
        Fixup::new(
            "Shield-Captain in\nAllarus Terminator Armour",
            "Shield-Captain in Allarus Terminator Armour",
        ),
        Fixup::new(
            "1 Sword Brother, 4 Initiates\nand 5 Neophytes",
            "1 Sword Brother, 4 Initiates and 5 Neophytes",
        ),
        Fixup::new(
            "1 Sword Brother, 9 Initiates\nand 10 Neophytes",
            "1 Sword Brother, 9 Initiates and 10 Neophytes",
        ),
        Fixup::new(
            "1 Sword Brother, 5 Initiates\nand 4 Neophytes",
            "1 Sword Brother, 5 Initiates and 4 Neophytes",
        ),
        Fixup::new(
            "1 Sword Brother, 11 Initiates\nand 8 Neophytes",
            "1 Sword Brother, 11 Initiates and 8 Neophytes",
        ),
        Fixup::new(
            "CODEX: IMPERIAL AGENTS\n\
             If your Army Faction is not Agents of the Imperium, but every model in your army has the Imperium keyword, you can\n\
             include Agents of the Imperium units in your army even if they do not have the Faction keyword you selected in the Select\n\
             Army Faction step. When doing so, use the points values shown on the following page.\n\
             ARMY FACTION:\n\
             AGENTS OF THE IMPERIUM",
            "CODEX: AGENTS OF THE IMPERIUM",
        ),
        Fixup::new(
            "EVERY MODEL HAS\nIMPERIUM KEYWORD",
            "AGENTS OF THE IMPERIUM (ALLIES)",
        ),
        Fixup::new(
            "CODEX: SPACE WOLVES\n\
             The points below allow players to enjoy Codex: Space Wolves in non-tournament settings. Until the full release of this\n\
             Codex, players should continue using the Index: Space Wolves points and rules for tournaments and other similar events.",
            "CODEX: SPACE WOLVES (CODEX)",
        ),
    ]
}

/// Normalise line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Apply every replacement in order. Each pair replaces all of its occurrences.
pub fn apply_fixups<'a>(text: &str, fixups: impl IntoIterator<Item = &'a Fixup>) -> String {
    let mut fixed = normalize_line_endings(text);
    for fixup in fixups {
        if fixup.from.is_empty() || !fixed.contains(&fixup.from) {
            continue;
        }
        debug!(from = %fixup.from.lines().next().unwrap_or_default(), "Applying manual fixup");
        fixed = fixed.replace(&fixup.from, &fixup.to);
    }
    fixed
}
