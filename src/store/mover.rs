//! Move / rename coordination
//!
//! A move relocates the filesystem object first. Only when that succeeds are
//! the draft, backup and association indices re-keyed, each independently:
//! a failing index is logged, left stale and named in the outcome; the move
//! itself stands.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use super::error::{StoreError, StoreResult};
use super::WorkspaceStore;

/// Final relative paths of a completed move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub src: String,
    pub dst: String,
    /// Indices that could not be re-keyed and still name `src`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stale: Vec<&'static str>,
}

impl WorkspaceStore {
    /// Rename or move `src` to `dst`, carrying every index entry along
    pub fn move_path(&self, src: &str, dst: &str) -> StoreResult<MoveOutcome> {
        let (src_abs, src_key) = self.resolve_mutable_entry(src)?;
        let (dst_abs, dst_key) = self.resolve_mutable_entry(dst)?;

        if fs::symlink_metadata(&src_abs).is_err() {
            return Err(StoreError::NotFound);
        }
        if fs::symlink_metadata(&dst_abs).is_ok() {
            return Err(StoreError::AlreadyExists);
        }
        let is_dir = src_abs.is_dir();
        if is_dir && dst_abs.starts_with(&src_abs) {
            return Err(StoreError::MoveIntoSelf);
        }

        relocate(&src_abs, &dst_abs)?;
        info!("Moved {} -> {}", src_key, dst_key);

        let mut stale = Vec::new();
        if let Err(e) = self.drafts.rekey(&src_key, &dst_key, is_dir) {
            error!("Move {} -> {}: draft index left stale: {}", src_key, dst_key, e);
            stale.push("drafts");
        }
        match self.backups.rekey(&src_key, &dst_key, is_dir) {
            Ok(n) => debug!("Re-keyed {} backup entries", n),
            Err(e) => {
                error!("Move {} -> {}: backup index left stale: {}", src_key, dst_key, e);
                stale.push("backups");
            }
        }
        match self.associations.rekey(&src_key, &dst_key, is_dir) {
            Ok(n) => debug!("Re-keyed {} associations", n),
            Err(e) => {
                error!(
                    "Move {} -> {}: association index left stale: {}",
                    src_key, dst_key, e
                );
                stale.push("associations");
            }
        }

        Ok(MoveOutcome {
            src: src_key,
            dst: dst_key,
            stale,
        })
    }
}

/// Rewrite `key` if it is `src` or lies below it, comparing whole segments.
///
/// `rebase_key("a/adata/x", "a", "a2")` gives `a2/adata/x`;
/// `rebase_key("ab/x", "a", "a2")` gives `None`.
pub fn rebase_key(key: &str, src: &str, dst: &str) -> Option<String> {
    let mut key_parts = key.split('/');
    for src_part in src.split('/') {
        if key_parts.next()? != src_part {
            return None;
        }
    }
    let rest: Vec<&str> = key_parts.collect();
    if rest.is_empty() {
        Some(dst.to_string())
    } else {
        Some(format!("{}/{}", dst, rest.join("/")))
    }
}

/// Move map entries from `src` to `dst`; returns how many keys changed.
///
/// Files re-key only their exact entry; directories re-key the whole subtree.
pub fn rekey_map<V>(map: &mut BTreeMap<String, V>, src: &str, dst: &str, is_dir: bool) -> usize {
    if !is_dir {
        return match map.remove(src) {
            Some(value) => {
                map.insert(dst.to_string(), value);
                1
            }
            None => 0,
        };
    }

    let renames: Vec<(String, String)> = map
        .keys()
        .filter_map(|k| rebase_key(k, src, dst).map(|new_key| (k.clone(), new_key)))
        .collect();
    let moved: Vec<(String, V)> = renames
        .into_iter()
        .filter_map(|(old, new)| map.remove(&old).map(|v| (new, v)))
        .collect();
    let count = moved.len();
    map.extend(moved);
    count
}

/// Move a file or directory, creating `dst`'s parents.
///
/// Only a cross-filesystem rename falls back to copy + remove. Any other
/// rename failure is returned with `src` and `dst` untouched.
pub fn relocate(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!("rename {:?} -> {:?} crosses devices, copying instead", src, dst);
            copy_then_remove(src, dst)
        }
        Err(e) => Err(e),
    }
}

/// Copy `src` to `dst`, then drop `src`. A failed copy leaves no partial `dst`.
fn copy_then_remove(src: &Path, dst: &Path) -> io::Result<()> {
    if let Err(e) = copy_tree(src, dst) {
        let cleanup = if dst.is_dir() {
            fs::remove_dir_all(dst)
        } else {
            fs::remove_file(dst)
        };
        if let Err(cleanup_err) = cleanup {
            if cleanup_err.kind() != io::ErrorKind::NotFound {
                error!("Partial copy left at {:?}: {}", dst, cleanup_err);
            }
        }
        return Err(e);
    }

    // dst is complete; a leftover src is reported but the move stands
    let removed = if src.is_dir() {
        fs::remove_dir_all(src)
    } else {
        fs::remove_file(src)
    };
    if let Err(e) = removed {
        warn!("Copied {:?} -> {:?} but could not remove the source: {}", src, dst, e);
    }
    Ok(())
}

fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    if !src.is_dir() {
        fs::copy(src, dst)?;
        return Ok(());
    }
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
