//! Name canonicalisation shared by every lookup and rule.
//!
//! Unit names in the field manual, in configuration tables and in saved
//! lists differ in case, punctuation and spacing. Every comparison in the
//! crate goes through [`normalize`] so that `"Shield-Captain"` and
//! `"SHIELD CAPTAIN"` are the same unit.

use std::collections::{BTreeMap, HashMap, HashSet};

/// Uppercase `input` and drop everything outside `[A-Z0-9]`.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .flat_map(char::to_uppercase)
        .filter(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit())
        .collect()
}

/// Compare two names after normalisation. Empty names never match.
pub fn name_equals(a: &str, b: &str) -> bool {
    let a = normalize(a);
    !a.is_empty() && a == normalize(b)
}

/// Many-to-many table of alternative names keyed by canonical name.
///
/// Both sides are stored normalised, so lookups are independent of how the
/// configuration spelled them.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    by_canonical: HashMap<String, HashSet<String>>,
    by_alias: HashMap<String, HashSet<String>>,
}

impl AliasTable {
    /// Build a table straight from the configuration map.
    pub fn from_config(aliases: &BTreeMap<String, Vec<String>>) -> Self {
        let mut table = Self::default();
        for (canonical, list) in aliases {
            for alias in list {
                table.insert(canonical, alias);
            }
        }
        table
    }

    /// Register `alias` as another spelling of `canonical`.
    pub fn insert(&mut self, canonical: &str, alias: &str) {
        let canonical = normalize(canonical);
        let alias = normalize(alias);
        if canonical.is_empty() || alias.is_empty() || canonical == alias {
            return;
        }
        self.by_canonical
            .entry(canonical.clone())
            .or_default()
            .insert(alias.clone());
        self.by_alias.entry(alias).or_default().insert(canonical);
    }

    /// True when no aliases are registered.
    pub fn is_empty(&self) -> bool {
        self.by_canonical.is_empty()
    }

    /// Alias-aware equality: direct match, or either name registered as an
    /// alias of the other.
    pub fn equals(&self, a: &str, b: &str) -> bool {
        let a = normalize(a);
        let b = normalize(b);
        if a.is_empty() || b.is_empty() {
            return false;
        }
        if a == b {
            return true;
        }
        let linked = |from: &String, to: &String| {
            self.by_canonical
                .get(from)
                .map(|aliases| aliases.contains(to))
                .unwrap_or(false)
        };
        linked(&a, &b) || linked(&b, &a)
    }

    /// Every normalised key that should be tried when looking `name` up:
    /// the name itself first, then its aliases, then the canonical names it
    /// is an alias of.
    pub fn candidates(&self, name: &str) -> Vec<String> {
        let key = normalize(name);
        if key.is_empty() {
            return Vec::new();
        }
        let mut keys = vec![key.clone()];
        let mut extend = |set: Option<&HashSet<String>>| {
            if let Some(set) = set {
                let mut sorted: Vec<_> = set.iter().cloned().collect();
                sorted.sort();
                for value in sorted {
                    if !keys.contains(&value) {
                        keys.push(value);
                    }
                }
            }
        };
        extend(self.by_canonical.get(&key));
        extend(self.by_alias.get(&key));
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_everything_but_letters_and_digits() {
        assert_eq!(normalize("Shield-Captain in Allarus Terminator Armour"), "SHIELDCAPTAININALLARUSTERMINATORARMOUR");
        assert_eq!(normalize("  t'au  "), "TAU");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("-- --"), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["Kroot Carnivores", "Jain Zar", "Ætherstrike 2", "", "c'tan shard of the deceiver"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn empty_names_never_match() {
        assert!(!name_equals("", ""));
        assert!(!name_equals("...", "---"));
        assert!(name_equals("Custodian Guard", "CUSTODIAN-GUARD"));
    }

    #[test]
    fn aliases_match_in_both_directions() {
        let mut table = AliasTable::default();
        table.insert("The Changeling", "Changeling");
        assert!(table.equals("Changeling", "the changeling"));
        assert!(table.equals("THE CHANGELING", "changeling"));
        assert!(!table.equals("Changeling", "Changecaster"));
    }

    #[test]
    fn candidates_list_the_name_first() {
        let mut table = AliasTable::default();
        table.insert("Haemonculus", "Haemonculi");
        assert_eq!(table.candidates("haemonculi"), vec!["HAEMONCULI", "HAEMONCULUS"]);
        assert_eq!(table.candidates("Haemonculus"), vec!["HAEMONCULUS", "HAEMONCULI"]);
        assert!(table.candidates("").is_empty());
    }
}
