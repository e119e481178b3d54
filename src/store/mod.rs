//! Workspace File Store
//!
//! This module provides:
//! - Path sandboxing against the workspace root
//! - Tree operations (list/read/create/write/delete/mkdir/search)
//! - The draft overlay with its dirty-flag document
//! - Backup versioning with an ordered per-file index
//! - File → service associations
//! - Move/rename that keeps all three indices in step with the tree

pub mod association;
pub mod backup;
pub mod document;
pub mod draft;
pub mod error;
pub mod mover;
pub mod path;
pub mod tree;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use association::{AssociationIndex, AssociationMap, ASSOCIATION_FILE_NAME};
pub use backup::{BackupIndex, BackupItem, BackupMap, BACKUP_DIR_NAME};
pub use document::JsonDocument;
pub use draft::{DirtyMap, DraftStore, DIRTY_FILE_NAME, SHADOW_DIR_NAME};
pub use error::{StoreError, StoreResult};
pub use mover::{rebase_key, MoveOutcome};
pub use path::{resolve_safe_path, PathResolver};
pub use tree::{FileContent, FileEntry};

/// Default name of the draft root when it lives inside the workspace
pub const TEMP_DIR_NAME: &str = ".tmp";

/// Names hidden from listings and search at any depth
pub const RESERVED_NAMES: &[&str] = &[BACKUP_DIR_NAME, TEMP_DIR_NAME, ASSOCIATION_FILE_NAME];

pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// True if any segment of a workspace key is reserved
pub fn is_reserved_key(key: &str) -> bool {
    key.split('/').any(is_reserved_name)
}

/// The workspace plus its three side-indices
pub struct WorkspaceStore {
    resolver: PathResolver,
    drafts: DraftStore,
    backups: BackupIndex,
    associations: AssociationIndex,
}

impl WorkspaceStore {
    /// Open the store, creating the workspace and draft roots if missing
    pub fn open(
        workspace_root: &Path,
        temp_root: &Path,
        fixed_associations: AssociationMap,
    ) -> io::Result<Self> {
        fs::create_dir_all(workspace_root)?;
        let resolver = PathResolver::new(workspace_root)?;
        let drafts = DraftStore::open(temp_root)?;
        let backups = BackupIndex::open(resolver.clone());
        let associations = AssociationIndex::open(resolver.clone(), fixed_associations);

        Ok(Self {
            resolver,
            drafts,
            backups,
            associations,
        })
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    pub fn temp_root(&self) -> &Path {
        self.drafts.temp_root()
    }

    pub fn backups(&self) -> &BackupIndex {
        &self.backups
    }

    pub fn associations(&self) -> &AssociationIndex {
        &self.associations
    }

    /// Canonical index key for a caller-supplied path
    pub fn key(&self, path: &str) -> StoreResult<String> {
        let abs = self.resolver.resolve(path)?;
        self.resolver.relative_key(&abs)
    }

    pub fn save_draft(&self, path: &str, content: &str) -> StoreResult<String> {
        let key = self.key(path)?;
        self.drafts.save_draft(&key, content)?;
        Ok(key)
    }

    pub fn get_draft(&self, path: &str) -> StoreResult<Option<String>> {
        self.drafts.get_draft(&self.key(path)?)
    }

    pub fn discard_draft(&self, path: &str) -> StoreResult<String> {
        let key = self.key(path)?;
        self.drafts.discard_draft(&key)?;
        Ok(key)
    }

    pub fn clear_dirty(&self, path: &str) -> StoreResult<String> {
        let key = self.key(path)?;
        self.drafts.clear_dirty(&key)?;
        Ok(key)
    }

    pub fn dirty_map(&self) -> DirtyMap {
        self.drafts.dirty_map()
    }

    /// Resolve a path that names an entry below the root (never the root itself)
    fn resolve_entry(&self, path: &str) -> StoreResult<PathBuf> {
        let abs = self.resolver.resolve(path)?;
        if abs == self.resolver.root() {
            return Err(StoreError::OutsideWorkspace);
        }
        Ok(abs)
    }

    /// Resolve a path a mutating tree operation may touch.
    ///
    /// Store-owned data (backups, the association document, the draft area)
    /// is only ever written through its own index.
    fn resolve_mutable(&self, path: &str) -> StoreResult<(PathBuf, String)> {
        let abs = self.resolver.resolve(path)?;
        self.ensure_mutable(abs)
    }

    /// Like [`Self::resolve_mutable`], but never the root itself
    fn resolve_mutable_entry(&self, path: &str) -> StoreResult<(PathBuf, String)> {
        let abs = self.resolve_entry(path)?;
        self.ensure_mutable(abs)
    }

    fn ensure_mutable(&self, abs: PathBuf) -> StoreResult<(PathBuf, String)> {
        let key = self.resolver.relative_key(&abs)?;
        let temp_root = self.drafts.temp_root();
        let root = self.resolver.root();
        let in_draft_area =
            temp_root != root && temp_root.starts_with(root) && abs.starts_with(temp_root);
        if is_reserved_key(&key) || in_draft_area {
            return Err(StoreError::ReservedPath);
        }
        Ok((abs, key))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// Store over a fresh temp dir with drafts under `<root>/.tmp`
    pub fn open_store() -> (TempDir, WorkspaceStore) {
        let temp = TempDir::new().unwrap();
        let store = WorkspaceStore::open(
            temp.path(),
            &temp.path().join(TEMP_DIR_NAME),
            AssociationMap::new(),
        )
        .unwrap();
        (temp, store)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::open_store;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_yaml_backup_restore_scenario() {
        let (_temp, store) = open_store();
        store.create("config.yaml", "x: 1").unwrap();
        let backup = store.backups().backup("config.yaml").unwrap();
        assert_eq!(store.backups().entries()["config.yaml"].len(), 1);

        store.write("config.yaml", "x: 2").unwrap();
        store.backups().restore("config.yaml", &backup).unwrap();
        assert_eq!(store.read("config.yaml").unwrap().content, "x: 1");
    }

    #[test]
    fn test_keys_are_normalized() {
        let (_temp, store) = open_store();
        assert_eq!(store.key("/a/./b/../c.txt").unwrap(), "a/c.txt");
        assert_eq!(store.save_draft("//x.txt", "d").unwrap(), "x.txt");
        assert!(store.dirty_map().contains_key("x.txt"));
        assert_eq!(store.clear_dirty("x.txt").unwrap(), "x.txt");
        assert!(store.dirty_map().is_empty());
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved_name(".backups"));
        assert!(is_reserved_name(".tmp"));
        assert!(is_reserved_name(".file_containers.json"));
        assert!(!is_reserved_name("backups"));
        assert!(is_reserved_key(".backups/index.json"));
        assert!(is_reserved_key("a/.tmp/x"));
        assert!(!is_reserved_key("a/backups.txt"));
        assert!(!is_reserved_key(""));
    }

    #[test]
    fn test_store_data_cannot_be_modified_through_the_tree() {
        let (_temp, store) = open_store();
        store.create("f.txt", "v1").unwrap();
        store.create("app.env", "X=1").unwrap();
        store.backups().backup("f.txt").unwrap();
        store.associations().set("app.env", "web").unwrap();
        store.save_draft("f.txt", "draft").unwrap();

        let rejected = [
            store.write(".backups/index.json", "{}"),
            store.write(".file_containers.json", "{}"),
            store.write(".tmp/.dirty.json", "{}"),
            store.create(".backups/new.txt", "").map(|_| ()),
            store.mkdir(".tmp/sub"),
            store.delete(".backups/index.json"),
            store.delete(".file_containers.json"),
            store.move_path(".backups", "old-backups").map(|_| ()),
            store.move_path("f.txt", ".backups/f.txt").map(|_| ()),
        ];
        for result in rejected {
            assert!(matches!(result, Err(StoreError::ReservedPath)));
        }

        assert_eq!(store.backups().entries()["f.txt"].len(), 1);
        assert_eq!(store.associations().get("app.env").as_deref(), Some("web"));
        assert!(store.dirty_map().contains_key("f.txt"));
        assert!(store
            .backups()
            .restore(".file_containers.json", ".backups/index.json")
            .is_err());
    }

    #[test]
    fn test_external_temp_root_is_protected() {
        let temp = TempDir::new().unwrap();
        let ws = temp.path().join("ws");
        let store = WorkspaceStore::open(&ws, &ws.join("drafts"), AssociationMap::new()).unwrap();
        store.save_draft("a.txt", "d").unwrap();

        assert!(matches!(
            store.write("drafts/.dirty.json", "{}"),
            Err(StoreError::ReservedPath)
        ));
        assert!(store.dirty_map().contains_key("a.txt"));
    }
}
