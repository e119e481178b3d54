//! Backup versioning
//!
//! Snapshots are plain copies stored under `<root>/.backups`, mirroring the
//! original's parent directory and stem:
//!
//! `.backups/<parent>/<stem>/backup---<stem>---<YYYY-MM-DD>---<HH-MM-SS><ext>`
//!
//! The index document maps each original's relative path to its backups in
//! the order they were taken.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::document::JsonDocument;
use super::error::{StoreError, StoreResult};
use super::is_reserved_key;
use super::mover::rekey_map;
use super::path::PathResolver;

/// Reserved directory holding every snapshot
pub const BACKUP_DIR_NAME: &str = ".backups";

pub const INDEX_FILE_NAME: &str = "index.json";

/// `{original: [backup, ...]}`, oldest first
pub type BackupMap = BTreeMap<String, Vec<String>>;

/// One listed snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupItem {
    pub name: String,
    pub path: String,
}

pub struct BackupIndex {
    resolver: PathResolver,
    backup_root: PathBuf,
    index: JsonDocument<BackupMap>,
}

impl BackupIndex {
    pub fn open(resolver: PathResolver) -> Self {
        let backup_root = resolver.root().join(BACKUP_DIR_NAME);
        let index = JsonDocument::new(backup_root.join(INDEX_FILE_NAME));
        Self {
            resolver,
            backup_root,
            index,
        }
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// Snapshot `path` now; returns the backup's relative path
    pub fn backup(&self, path: &str) -> StoreResult<String> {
        self.backup_at(path, Local::now())
    }

    /// Snapshot `path` using `now` for the file name
    pub fn backup_at(&self, path: &str, now: DateTime<Local>) -> StoreResult<String> {
        let original = self.resolver.resolve(path)?;
        if !original.is_file() {
            return Err(StoreError::FileNotFound);
        }
        let key = self.resolver.relative_key(&original)?;

        let stem = original
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = original
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut dir = self.backup_root.clone();
        if let Some(parent) = Path::new(&key).parent() {
            dir.push(parent);
        }
        dir.push(&stem);
        fs::create_dir_all(&dir)?;

        let base = format!(
            "backup---{}---{}---{}",
            stem,
            now.format("%Y-%m-%d"),
            now.format("%H-%M-%S")
        );
        let backup_file = unique_backup_path(&dir, &base, &ext);
        fs::copy(&original, &backup_file)?;

        let backup_key = self.resolver.relative_key(&backup_file)?;
        self.index.update(|map| {
            map.entry(key.clone()).or_default().push(backup_key.clone());
        })?;

        info!("Backed up {} -> {}", key, backup_key);
        Ok(backup_key)
    }

    /// Backups of `path` whose files still exist, oldest first
    pub fn list(&self, path: &str) -> StoreResult<Vec<BackupItem>> {
        let key = self.key_for(path)?;
        let index = self.index.load();
        let items = index
            .get(&key)
            .map(|backups| {
                backups
                    .iter()
                    .filter(|p| self.exists(p))
                    .map(|p| BackupItem {
                        name: p.rsplit('/').next().unwrap_or(p).to_string(),
                        path: p.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(items)
    }

    /// Overwrite `file` with the bytes of `backup`; the index is untouched
    pub fn restore(&self, file: &str, backup: &str) -> StoreResult<()> {
        let target = self.resolver.resolve(file)?;
        if is_reserved_key(&self.resolver.relative_key(&target)?) {
            return Err(StoreError::ReservedPath);
        }
        let source = self.resolver.resolve(backup)?;
        if !target.is_file() || !source.is_file() {
            return Err(StoreError::FileNotFound);
        }
        fs::copy(&source, &target)?;

        info!("Restored {} from {}", file, backup);
        Ok(())
    }

    /// Delete a backup file and drop it from every index entry
    pub fn delete_backup(&self, backup: &str) -> StoreResult<()> {
        let target = self.resolver.resolve(backup)?;
        if !target.is_file() {
            return Err(StoreError::FileNotFound);
        }
        fs::remove_file(&target)?;

        let backup_key = self.resolver.relative_key(&target)?;
        self.index.update(|map| {
            map.retain(|_, backups| {
                backups.retain(|p| p != &backup_key);
                !backups.is_empty()
            });
        })?;

        info!("Deleted backup {}", backup_key);
        Ok(())
    }

    /// Forget the history of `key`; the backup files stay on disk
    pub fn remove_key(&self, key: &str) -> StoreResult<Option<Vec<String>>> {
        let removed = self.index.update(|map| map.remove(key))?;
        if let Some(backups) = &removed {
            debug!("Dropped {} backup entries for {}", backups.len(), key);
        }
        Ok(removed)
    }

    pub fn rekey(&self, src: &str, dst: &str, is_dir: bool) -> StoreResult<usize> {
        self.index.update(|map| rekey_map(map, src, dst, is_dir))
    }

    /// Raw index contents
    pub fn entries(&self) -> BackupMap {
        self.index.load()
    }

    fn key_for(&self, path: &str) -> StoreResult<String> {
        let abs = self.resolver.resolve(path)?;
        self.resolver.relative_key(&abs)
    }

    fn exists(&self, relative: &str) -> bool {
        self.resolver
            .resolve(relative)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }
}

/// Same-second snapshots get a `-N` suffix instead of overwriting
fn unique_backup_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
    let candidate = dir.join(format!("{base}{ext}"));
    if !candidate.exists() {
        return candidate;
    }
    let mut seq = 1u32;
    loop {
        let candidate = dir.join(format!("{base}-{seq}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        seq += 1;
    }
}
