//! Parsed catalogs of every known manual version, shared across readers.

use std::{collections::BTreeMap, fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::parser::ManualParser;
use crate::{
    config::CatalogConfig,
    models::{Catalog, ManualVersion},
};

/// Thread-safe set of parsed manual versions.
///
/// Catalogs are handed out as `Arc<Catalog>` and are never mutated once
/// stored; replacing a version swaps the `Arc`.
#[derive(Clone, Default)]
pub struct ManualLibrary {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    catalogs: BTreeMap<ManualVersion, Arc<Catalog>>,
}

impl ManualLibrary {
    /// Empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a parsed catalog, replacing any catalog of the same version.
    pub fn insert(&self, catalog: Catalog) -> Arc<Catalog> {
        let catalog = Arc::new(catalog);
        self.inner
            .write()
            .catalogs
            .insert(catalog.version().clone(), Arc::clone(&catalog));
        catalog
    }

    /// Parse `text` and store the result.
    pub fn add_manual(&self, text: &str, config: &CatalogConfig) -> Result<Arc<Catalog>> {
        let parser = ManualParser::new(config)?;
        Ok(self.insert(parser.parse(text)))
    }

    /// Parse every `*.txt` manual beneath `root`; unreadable files are skipped.
    pub fn load_dir(root: impl AsRef<Path>, config: &CatalogConfig) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            anyhow::bail!("manual directory {} does not exist", root.display());
        }
        let parser = ManualParser::new(config)?;
        let library = Self::new();

        let mut paths: Vec<_> = WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("txt"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        for path in paths {
            match fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))
            {
                Ok(text) => {
                    let catalog = library.insert(parser.parse(&text));
                    info!(path = %path.display(), version = %catalog.version(), "Loaded field manual");
                }
                Err(err) => warn!("Skipping {}: {:#}", path.display(), err),
            }
        }
        Ok(library)
    }

    /// Every stored version, oldest first.
    pub fn versions(&self) -> Vec<ManualVersion> {
        self.inner.read().catalogs.keys().cloned().collect()
    }

    /// True when no manual has been loaded.
    pub fn is_empty(&self) -> bool {
        self.inner.read().catalogs.is_empty()
    }

    /// Catalog for an exact version token.
    pub fn get(&self, version: &ManualVersion) -> Option<Arc<Catalog>> {
        self.inner.read().catalogs.get(version).cloned()
    }

    /// True when `version` has been loaded.
    pub fn contains(&self, version: &ManualVersion) -> bool {
        self.inner.read().catalogs.contains_key(version)
    }

    /// The newest version.
    pub fn current(&self) -> Option<Arc<Catalog>> {
        self.inner
            .read()
            .catalogs
            .values()
            .next_back()
            .cloned()
    }

    /// The newest version older than the current one; the current one when
    /// only a single version is loaded.
    pub fn previous(&self) -> Option<Arc<Catalog>> {
        let inner = self.inner.read();
        let mut newest_first = inner.catalogs.values().rev();
        let current = newest_first.next()?;
        Some(Arc::clone(newest_first.next().unwrap_or(current)))
    }

    /// The newest version strictly older than `version`.
    pub fn previous_of(&self, version: &ManualVersion) -> Option<Arc<Catalog>> {
        self.inner
            .read()
            .catalogs
            .range(..version.clone())
            .next_back()
            .map(|(_, catalog)| Arc::clone(catalog))
    }
}
