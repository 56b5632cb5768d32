//! Upgrades for lists saved by older releases.

use tracing::info;

use super::models::ArmyList;
use crate::config::CatalogConfig;

/// Move lists that stored a sub-faction as their faction onto the parent.
///
/// Faction and detachment are upper-cased first, matching how headings are
/// stored in the catalog. Returns `true` when the faction was re-homed.
pub fn migrate_to_sub_factions(list: &mut ArmyList, config: &CatalogConfig) -> bool {
    list.detachment = list.detachment.to_uppercase();
    list.faction = list.faction.to_uppercase();

    let Some(parent) = config.parent_faction(&list.faction) else {
        return false;
    };
    let parent = parent.to_uppercase();
    info!(from = %list.faction, to = %parent, "Migrating list to sub-faction layout");
    list.sub_faction = Some(std::mem::replace(&mut list.faction, parent));
    true
}
