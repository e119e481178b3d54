//! Workspace tree operations: list, read, create, write, delete, mkdir, search

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::{debug, error, info};
use walkdir::WalkDir;

use super::error::{StoreError, StoreResult};
use super::{is_reserved_name, WorkspaceStore};

/// One listed or matched entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub is_dir: bool,
    pub path: String,
    pub dirty: bool,
}

/// Text content of a file plus its stat data
#[derive(Debug, Clone)]
pub struct FileContent {
    pub content: String,
    /// Seconds since the Unix epoch
    pub mtime: i64,
    pub size: u64,
}

impl WorkspaceStore {
    /// Entries of `dir`, directories first, then case-insensitive by name
    pub fn list(&self, dir: &str) -> StoreResult<Vec<FileEntry>> {
        let dir_path = self.resolver.resolve(dir)?;
        if !dir_path.exists() {
            return Err(StoreError::NotFound);
        }
        if !dir_path.is_dir() {
            return Err(StoreError::NotADirectory);
        }

        debug!("Listing files in: {:?}", dir_path);
        let dirty = self.drafts.dirty_map();

        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir_path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_reserved_name(&name) {
                continue;
            }
            let path = self.resolver.relative_key(&entry.path())?;
            entries.push(FileEntry {
                is_dir: entry.path().is_dir(),
                dirty: dirty.get(&path).copied().unwrap_or(false),
                name,
                path,
            });
        }

        entries.sort_by(|a, b| match (a.is_dir, b.is_dir) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        });
        Ok(entries)
    }

    /// Read a UTF-8 text file
    pub fn read(&self, path: &str) -> StoreResult<FileContent> {
        let file_path = self.resolver.resolve(path)?;
        if !file_path.is_file() {
            return Err(StoreError::FileNotFound);
        }

        debug!("Reading file: {:?}", file_path);
        let metadata = fs::metadata(&file_path)?;
        let bytes = fs::read(&file_path)?;
        let content = String::from_utf8(bytes).map_err(|_| StoreError::NotText)?;

        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        Ok(FileContent {
            content,
            mtime,
            size: metadata.len(),
        })
    }

    /// Create a new file; the parent directory must already exist
    pub fn create(&self, path: &str, content: &str) -> StoreResult<String> {
        let (file_path, key) = self.resolve_mutable(path)?;
        ensure_vacant(&file_path)?;
        ensure_parent(&file_path)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => StoreError::AlreadyExistsFile,
                _ => StoreError::Io(e),
            })?;
        file.write_all(content.as_bytes())?;

        info!("Created file {}", key);
        Ok(key)
    }

    /// Overwrite (or create) a file and clear its dirty flag
    pub fn write(&self, path: &str, content: &str) -> StoreResult<()> {
        let (file_path, key) = self.resolve_mutable(path)?;
        ensure_parent(&file_path)?;
        if file_path.is_dir() {
            return Err(StoreError::PathIsDirectory);
        }

        debug!("Writing file: {:?}", file_path);
        // In place, so bind-mounted single files keep their inode
        fs::write(&file_path, content)?;

        self.drafts.clear_dirty(&key)?;
        Ok(())
    }

    /// Delete a file or an empty directory.
    ///
    /// Deleting a file also drops its draft, its backup history entry and its
    /// association. Backup files themselves are kept on disk.
    pub fn delete(&self, path: &str) -> StoreResult<()> {
        let (target, key) = self.resolve_mutable_entry(path)?;
        let metadata = fs::symlink_metadata(&target).map_err(|_| StoreError::NotFound)?;

        if metadata.is_dir() {
            if let Err(e) = fs::remove_dir(&target) {
                let non_empty = fs::read_dir(&target)
                    .map(|mut entries| entries.next().is_some())
                    .unwrap_or(false);
                return Err(if non_empty {
                    StoreError::DirNotEmpty
                } else {
                    StoreError::Io(e)
                });
            }
            info!("Deleted directory {}", key);
            return Ok(());
        }

        fs::remove_file(&target)?;
        info!("Deleted file {}", key);

        if let Err(e) = self.drafts.discard_draft(&key) {
            error!("Delete {}: draft cleanup failed: {}", key, e);
        }
        if let Err(e) = self.backups.remove_key(&key) {
            error!("Delete {}: backup index cleanup failed: {}", key, e);
        }
        if let Err(e) = self.associations.delete(&key) {
            error!("Delete {}: association cleanup failed: {}", key, e);
        }
        Ok(())
    }

    /// Create one directory; missing parents are not created
    pub fn mkdir(&self, path: &str) -> StoreResult<()> {
        let (dir_path, _) = self.resolve_mutable(path)?;
        ensure_vacant(&dir_path)?;
        ensure_parent(&dir_path)?;
        fs::create_dir(&dir_path)?;

        info!("Created directory {:?}", path);
        Ok(())
    }

    /// Case-insensitive substring search over base names below `root`
    pub fn search(&self, root: &str, query: &str) -> StoreResult<Vec<FileEntry>> {
        let base = self.resolver.resolve(root)?;
        if !base.is_dir() {
            return Err(StoreError::NotFound);
        }
        let base_key = self.resolver.relative_key(&base)?;
        if base_key.split('/').any(is_reserved_name) {
            return Ok(Vec::new());
        }

        let needle = query.to_lowercase();
        let dirty = self.drafts.dirty_map();
        let mut matches = Vec::new();

        let walker = WalkDir::new(&base)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_reserved_name(&e.file_name().to_string_lossy()));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable entry during search: {}", e);
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.to_lowercase().contains(&needle) {
                continue;
            }
            let path = self.resolver.relative_key(entry.path())?;
            matches.push(FileEntry {
                is_dir: entry.file_type().is_dir(),
                dirty: dirty.get(&path).copied().unwrap_or(false),
                name,
                path,
            });
        }

        debug!("Search {:?} under {:?}: {} matches", query, root, matches.len());
        Ok(matches)
    }
}

fn ensure_vacant(path: &Path) -> StoreResult<()> {
    if path.is_dir() {
        return Err(StoreError::AlreadyExistsDir);
    }
    if fs::symlink_metadata(path).is_ok() {
        return Err(StoreError::AlreadyExistsFile);
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> StoreResult<()> {
    match path.parent() {
        Some(parent) if parent.is_dir() => Ok(()),
        _ => Err(StoreError::ParentMissing),
    }
}
