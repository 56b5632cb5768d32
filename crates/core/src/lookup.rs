//! Name-to-datasheet lookup that prefers the list's own faction.

use std::collections::HashMap;

use crate::{
    models::{Catalog, Datasheet},
    names::{normalize, AliasTable},
};

/// Two name maps built once per catalog and faction: one over the faction's
/// own datasheets, one over the whole catalog.
pub struct DatasheetIndex<'c> {
    catalog: &'c Catalog,
    aliases: AliasTable,
    faction: HashMap<String, &'c Datasheet>,
    all: HashMap<String, &'c Datasheet>,
}

impl<'c> DatasheetIndex<'c> {
    /// Index `catalog` for a list of `faction` (and optional sub-faction).
    pub fn new(
        catalog: &'c Catalog,
        faction: &str,
        sub_faction: Option<&str>,
        aliases: AliasTable,
    ) -> Self {
        Self {
            catalog,
            aliases,
            faction: index(catalog.faction_datasheets(faction, sub_faction)),
            all: index(catalog.datasheets().iter()),
        }
    }

    /// The indexed catalog.
    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Alias table used for every comparison.
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Datasheet for `name`, trying the faction map before the whole catalog.
    pub fn get(&self, name: &str) -> Option<&'c Datasheet> {
        let keys = self.aliases.candidates(name);
        keys.iter()
            .find_map(|key| self.faction.get(key))
            .or_else(|| keys.iter().find_map(|key| self.all.get(key)))
            .copied()
    }
}

/// First datasheet wins for each normalised name.
fn index<'c>(sheets: impl IntoIterator<Item = &'c Datasheet>) -> HashMap<String, &'c Datasheet> {
    let mut map = HashMap::new();
    for sheet in sheets {
        let key = normalize(&sheet.name);
        if !key.is_empty() {
            map.entry(key).or_insert(sheet);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ManualVersion, UnitOption};

    fn sheet(name: &str, faction: &str, points: u32) -> Datasheet {
        let mut sheet = Datasheet::new(name, faction);
        sheet.sizes.push(UnitOption::new(name, points));
        sheet
    }

    fn catalog() -> Catalog {
        Catalog::new(
            ManualVersion::new("VERSION 1.0"),
            Vec::new(),
            vec![
                sheet("Rhino", "SPACE MARINES", 75),
                sheet("Rhino", "ADEPTA SORORITAS", 80),
                sheet("Sanguinary Guard", "BLOOD ANGELS", 125),
                sheet("The Changeling", "CHAOS DAEMONS", 85),
            ],
        )
    }

    #[test]
    fn prefers_current_faction() {
        let catalog = catalog();
        let sisters = DatasheetIndex::new(&catalog, "ADEPTA SORORITAS", None, AliasTable::default());
        assert_eq!(sisters.get("rhino").map(|sheet| sheet.sizes[0].points), Some(80));

        let marines = DatasheetIndex::new(&catalog, "SPACE MARINES", None, AliasTable::default());
        assert_eq!(marines.get("RHINO").map(|sheet| sheet.sizes[0].points), Some(75));
    }

    #[test]
    fn falls_back_to_whole_catalog() {
        let catalog = catalog();
        let marines = DatasheetIndex::new(&catalog, "SPACE MARINES", None, AliasTable::default());
        assert_eq!(
            marines.get("Sanguinary Guard").map(|sheet| sheet.faction.as_str()),
            Some("BLOOD ANGELS")
        );
        assert!(marines.get("Trajann Valoris").is_none());
        assert!(marines.get("").is_none());
    }

    #[test]
    fn resolves_aliases() {
        let catalog = catalog();
        let mut aliases = AliasTable::default();
        aliases.insert("The Changeling", "Changeling");
        let daemons = DatasheetIndex::new(&catalog, "CHAOS DAEMONS", None, aliases);
        assert_eq!(
            daemons.get("Changeling").map(|sheet| sheet.name.as_str()),
            Some("The Changeling")
        );
    }
}
