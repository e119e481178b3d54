//! Draft overlay
//!
//! Unsaved edits live in a shadow tree under `<temp_root>/files`, mirroring
//! the workspace-relative path. The dirty-flag document sits beside that
//! tree, never inside it, so no draft key can collide with it. A missing key
//! means "not dirty".

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::document::JsonDocument;
use super::error::{StoreError, StoreResult};
use super::mover::{relocate, rekey_map};
use super::path::PathResolver;

/// Name of the dirty-flag document inside the temp root
pub const DIRTY_FILE_NAME: &str = ".dirty.json";

/// Directory under the temp root holding the shadow tree
pub const SHADOW_DIR_NAME: &str = "files";

/// `{relativePath: true, ...}`
pub type DirtyMap = BTreeMap<String, bool>;

pub struct DraftStore {
    temp_root: PathBuf,
    resolver: PathResolver,
    dirty: JsonDocument<DirtyMap>,
}

impl DraftStore {
    /// Open (and create if needed) the draft area rooted at `temp_root`
    pub fn open(temp_root: &Path) -> io::Result<Self> {
        let shadow_root = temp_root.join(SHADOW_DIR_NAME);
        fs::create_dir_all(&shadow_root)?;
        let temp_root = temp_root.canonicalize()?;
        let resolver = PathResolver::new(&shadow_root)?;
        let dirty = JsonDocument::new(temp_root.join(DIRTY_FILE_NAME));
        Ok(Self {
            temp_root,
            resolver,
            dirty,
        })
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Write `content` as the draft for `key` and mark it dirty
    pub fn save_draft(&self, key: &str, content: &str) -> StoreResult<()> {
        let shadow = self.shadow_path(key)?;
        if shadow.is_dir() {
            return Err(StoreError::PathIsDirectory);
        }
        if let Some(parent) = shadow.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&shadow, content)?;
        self.set_dirty(key, true)?;

        debug!("Saved draft for {}", key);
        Ok(())
    }

    /// Draft content for `key`; never falls back to the workspace file
    pub fn get_draft(&self, key: &str) -> StoreResult<Option<String>> {
        let shadow = self.shadow_path(key)?;
        if !shadow.is_file() {
            return Ok(None);
        }
        let bytes = fs::read(&shadow)?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| StoreError::NotText)
    }

    /// Drop the draft (if any) and clear the dirty flag regardless
    pub fn discard_draft(&self, key: &str) -> StoreResult<()> {
        let shadow = self.shadow_path(key)?;
        if shadow.is_file() {
            fs::remove_file(&shadow)?;
        }
        self.clear_dirty(key)
    }

    pub fn set_dirty(&self, key: &str, is_dirty: bool) -> StoreResult<()> {
        self.dirty.update(|map| {
            if is_dirty {
                map.insert(key.to_string(), true);
            } else {
                map.remove(key);
            }
        })
    }

    pub fn clear_dirty(&self, key: &str) -> StoreResult<()> {
        self.set_dirty(key, false)
    }

    pub fn is_dirty(&self, key: &str) -> bool {
        self.dirty.load().get(key).copied().unwrap_or(false)
    }

    pub fn dirty_map(&self) -> DirtyMap {
        self.dirty.load()
    }

    /// Carry flags and shadow content from `src` to `dst`.
    ///
    /// Files move their single flag; directories move every flag at or below
    /// `src`. A shadow file/directory at `src` is relocated alongside.
    pub fn rekey(&self, src: &str, dst: &str, is_dir: bool) -> StoreResult<()> {
        let moved = self.dirty.update(|map| rekey_map(map, src, dst, is_dir))?;

        let old_shadow = self.shadow_path(src)?;
        let new_shadow = self.shadow_path(dst)?;
        let has_shadow = if is_dir {
            old_shadow.is_dir()
        } else {
            old_shadow.is_file()
        };
        if has_shadow {
            relocate(&old_shadow, &new_shadow)?;
        }

        if moved > 0 || has_shadow {
            info!(
                "Re-keyed drafts {} -> {} ({} flags, shadow moved: {})",
                src, dst, moved, has_shadow
            );
        }
        Ok(())
    }

    fn shadow_path(&self, key: &str) -> StoreResult<PathBuf> {
        self.resolver.resolve(key)
    }
}
