//! Static configuration tables consumed by the parser and the eligibility engine.
//!
//! The tables are plain data: unit-name lists per faction, the sub-faction
//! map, per-detachment overrides, the boarding actions slot layout and the
//! alias table. Names are compared through [`normalize`], so the casing used
//! in the file does not matter.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    boarding::BoardingActionsConfig,
    error::ConfigError,
    manual::fixes::Fixup,
    names::{normalize, AliasTable},
};

/// Directory name used under the platform config directory.
pub const CONFIG_DIR: &str = "fieldmanual";
/// Default configuration file name.
pub const CONFIG_FILE: &str = "catalog.json";

/// Line-shape settings for the document parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Boilerplate that separates the header from the body.
    pub copyright_marker: String,
    /// Index of the version token among the header's non-empty lines.
    pub version_line: usize,
    /// Suffix that marks a cost line.
    pub points_marker: String,
    /// Prefixes stripped from faction headings, matched case-insensitively.
    pub faction_prefixes: Vec<String>,
    /// Label opening the Forge World section.
    pub forge_world_label: String,
    /// Label opening the Legends section.
    pub legends_label: String,
    /// Label opening a detachment enhancements block.
    pub enhancements_label: String,
    /// Section label -> allegiance tag for allied units.
    pub ally_sections: BTreeMap<String, String>,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            copyright_marker: "© Copyright Games Workshop Limited".to_string(),
            version_line: 1,
            points_marker: "pts".to_string(),
            faction_prefixes: vec![
                "CODEX SUPPLEMENT:".to_string(),
                "CODEX:".to_string(),
                "INDEX:".to_string(),
            ],
            forge_world_label: "FORGE WORLD POINTS VALUES".to_string(),
            legends_label: "LEGENDS FIELD MANUAL".to_string(),
            enhancements_label: "DETACHMENT ENHANCEMENTS".to_string(),
            ally_sections: BTreeMap::new(),
        }
    }
}

impl ParserSettings {
    /// Allegiance tag for an ally section label.
    pub fn ally_tag(&self, line: &str) -> Option<&str> {
        let key = normalize(line);
        self.ally_sections
            .iter()
            .find(|(label, _)| normalize(label) == key)
            .map(|(_, tag)| tag.as_str())
    }
}

/// Unit-name lists that set datasheet flags for one faction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct FactionTables {
    pub battle_line: Vec<String>,
    pub epic_hero: Vec<String>,
    pub dedicated_transport: Vec<String>,
    pub character: Vec<String>,
    pub fortification: Vec<String>,
}

/// Detachment-specific promotions to battle-line or dedicated transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ConditionalTables {
    pub battle_line: Vec<String>,
    pub dedicated_transport: Vec<String>,
}

/// True when `name` appears in `list` after normalisation.
pub fn listed(list: &[String], name: &str) -> bool {
    let key = normalize(name);
    !key.is_empty() && list.iter().any(|entry| normalize(entry) == key)
}

fn find_keyed<'a, V>(map: &'a BTreeMap<String, V>, key: &str) -> Option<&'a V> {
    let wanted = normalize(key);
    if wanted.is_empty() {
        return None;
    }
    map.iter()
        .find(|(candidate, _)| normalize(candidate) == wanted)
        .map(|(_, value)| value)
}

/// Every static table the catalog build and validation rely on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Line-shape settings.
    pub parser: ParserSettings,
    /// Faction name -> flag tables.
    pub factions: BTreeMap<String, FactionTables>,
    /// Sub-faction -> parent faction.
    pub sub_factions: BTreeMap<String, String>,
    /// Detachment name -> conditional overrides.
    pub conditional: BTreeMap<String, ConditionalTables>,
    /// Slot layouts for boarding actions detachments.
    pub boarding_actions: BoardingActionsConfig,
    /// Canonical name -> alternative spellings.
    pub aliases: BTreeMap<String, Vec<String>>,
    /// Replacements applied after the built-in fixups.
    pub extra_fixups: Vec<Fixup>,
}

impl CatalogConfig {
    /// Default location under the user's config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    }

    /// Load from the default location, using built-in defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if !path.is_file() {
            info!(path = %path.display(), "No catalog configuration found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load from a JSON, TOML or YAML file; the format follows the extension.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parse a JSON document held in memory.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(json, FileFormat::Json))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Flag tables for a faction.
    pub fn faction_tables(&self, faction: &str) -> Option<&FactionTables> {
        find_keyed(&self.factions, faction)
    }

    /// Parent faction of a configured sub-faction.
    pub fn parent_faction(&self, faction: &str) -> Option<&str> {
        find_keyed(&self.sub_factions, faction).map(String::as_str)
    }

    /// Conditional overrides for a detachment.
    pub fn conditional_for(&self, detachment: &str) -> Option<&ConditionalTables> {
        find_keyed(&self.conditional, detachment)
    }

    /// Alias table built from the `aliases` map.
    pub fn alias_table(&self) -> AliasTable {
        AliasTable::from_config(&self.aliases)
    }
}

/// Write a default configuration file when none exists yet.
pub fn ensure_default_config() -> anyhow::Result<PathBuf> {
    let path = CatalogConfig::default_path();
    if path.exists() {
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(&CatalogConfig::default())
        .context("failed to serialize default catalog configuration")?;
    fs::write(&path, serialized).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Default catalog configuration written");
    Ok(path)
}
