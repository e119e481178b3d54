//! File → service associations
//!
//! Stored associations live in `<root>/.file_containers.json`. Associations
//! from configuration act as a read-only fallback layer beneath them.

use std::collections::BTreeMap;
use tracing::info;

use super::document::JsonDocument;
use super::error::{StoreError, StoreResult};
use super::mover::rekey_map;
use super::path::{strip_leading_slashes, PathResolver};

/// Reserved association document name at the workspace root
pub const ASSOCIATION_FILE_NAME: &str = ".file_containers.json";

/// `{relativePath: serviceRef}`
pub type AssociationMap = BTreeMap<String, String>;

pub struct AssociationIndex {
    resolver: PathResolver,
    store: JsonDocument<AssociationMap>,
    fixed: AssociationMap,
}

impl AssociationIndex {
    pub fn open(resolver: PathResolver, fixed: AssociationMap) -> Self {
        let store = JsonDocument::new(resolver.root().join(ASSOCIATION_FILE_NAME));
        Self {
            resolver,
            store,
            fixed,
        }
    }

    /// Stored reference for `path`, falling back to configured ones
    pub fn get(&self, path: &str) -> Option<String> {
        let key = self.key_for(path);
        self.store
            .load()
            .get(&key)
            .or_else(|| self.fixed.get(&key))
            .cloned()
    }

    /// Associate an existing file with a trimmed, non-empty reference
    pub fn set(&self, path: &str, reference: &str) -> StoreResult<()> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(StoreError::InvalidReference);
        }
        let file = self.resolver.resolve(path)?;
        if !file.is_file() {
            return Err(StoreError::FileNotFound);
        }
        let key = self.resolver.relative_key(&file)?;

        self.store.update(|map| {
            map.insert(key.clone(), reference.to_string());
        })?;
        info!("Associated {} with {}", key, reference);
        Ok(())
    }

    /// Remove a stored association; returns whether one existed
    pub fn delete(&self, path: &str) -> StoreResult<bool> {
        let key = self.key_for(path);
        let removed = self.store.update(|map| map.remove(&key))?;
        Ok(removed.is_some())
    }

    /// Stored associations only
    pub fn all(&self) -> AssociationMap {
        self.store.load()
    }

    /// Configured associations overlaid with stored ones
    pub fn effective(&self) -> AssociationMap {
        let mut merged = self.fixed.clone();
        merged.extend(self.store.load());
        merged
    }

    /// Configured associations only
    pub fn fixed(&self) -> &AssociationMap {
        &self.fixed
    }

    /// Effective associations grouped as service → sorted file paths
    pub fn by_service(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        // BTreeMap iteration keeps each file list sorted
        for (path, service) in self.effective() {
            grouped.entry(service).or_default().push(path);
        }
        grouped
    }

    pub fn rekey(&self, src: &str, dst: &str, is_dir: bool) -> StoreResult<usize> {
        self.store.update(|map| rekey_map(map, src, dst, is_dir))
    }

    /// Normalized key; paths that do not resolve are looked up verbatim
    fn key_for(&self, path: &str) -> String {
        self.resolver
            .resolve(path)
            .and_then(|abs| self.resolver.relative_key(&abs))
            .unwrap_or_else(|_| strip_leading_slashes(path).to_string())
    }
}
