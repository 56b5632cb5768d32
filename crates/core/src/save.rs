//! Key-value persistence for army lists.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::{
    config::{CatalogConfig, CONFIG_DIR},
    roster::{migrate_to_sub_factions, ArmyList},
};

/// Directory under the config root used for stored values.
pub const DEFAULT_STORE_DIR: &str = "lists";
/// Key of the list being edited.
pub const CURRENT_LIST_KEY: &str = "currentList";
/// Key of the saved list collection.
pub const LISTS_KEY: &str = "lists";

/// JSON file per key beneath a root directory.
pub struct ListStore {
    root: PathBuf,
}

impl ListStore {
    /// Create a store rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's config directory.
    pub fn default_root() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(DEFAULT_STORE_DIR)
    }

    /// Directory holding the stored values.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_component(key)))
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        let path = self.path_for(key);
        let serialised = serde_json::to_vec_pretty(value)
            .with_context(|| format!("failed to serialise {key}"))?;
        fs::write(&path, serialised).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Value stored under `key`. Missing and unreadable values both yield
    /// `None`; the latter is logged.
    pub fn restore<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        if !path.is_file() {
            return None;
        }
        let loaded = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))
            .and_then(|content| {
                serde_json::from_str(&content)
                    .with_context(|| format!("failed to parse {}", path.display()))
            });
        match loaded {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Failed to load {key}: {err:#}");
                None
            }
        }
    }

    /// Delete the value under `key`. Returns `false` when nothing was stored.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("failed to remove {}", path.display()))?;
        Ok(true)
    }

    /// Persist the list being edited.
    pub fn save_current(&self, list: &ArmyList) -> Result<()> {
        self.save(CURRENT_LIST_KEY, list)
    }

    /// The list being edited, migrated to the sub-faction layout.
    pub fn restore_current(&self, config: &CatalogConfig) -> Option<ArmyList> {
        let mut list: ArmyList = self.restore(CURRENT_LIST_KEY)?;
        migrate_to_sub_factions(&mut list, config);
        Some(list)
    }

    /// Persist the saved list collection.
    pub fn save_lists(&self, lists: &[ArmyList]) -> Result<()> {
        self.save(LISTS_KEY, lists)
    }

    /// Saved lists, most recently modified first.
    pub fn restore_lists(&self, config: &CatalogConfig) -> Vec<ArmyList> {
        let mut lists: Vec<ArmyList> = self.restore(LISTS_KEY).unwrap_or_default();
        for list in &mut lists {
            migrate_to_sub_factions(list, config);
        }
        lists.sort_by(|a, b| b.modified_date.cmp(&a.modified_date));
        lists
    }
}

fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "value".to_string()
    } else {
        result
    }
}
