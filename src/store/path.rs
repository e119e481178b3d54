//! Path sandboxing
//!
//! Every path accepted from a caller is resolved against a canonical root.
//! `.`/`..` segments are folded first, then the longest existing prefix is
//! canonicalized so symlinks are followed before the containment check.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

use super::error::{StoreError, StoreResult};

/// Sandboxes relative paths against one canonical root directory
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Root must exist; it is canonicalized once here
    pub fn new(root: &Path) -> io::Result<Self> {
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative_path` to an absolute path inside the root
    pub fn resolve(&self, relative_path: &str) -> StoreResult<PathBuf> {
        let trimmed = strip_leading_slashes(relative_path);

        let mut full_path = self.root.clone();
        for component in Path::new(trimmed).components() {
            match component {
                Component::Normal(part) => full_path.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if full_path == self.root {
                        warn!("Path escape attempt via '..': {:?}", relative_path);
                        return Err(StoreError::OutsideWorkspace);
                    }
                    full_path.pop();
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(StoreError::OutsideWorkspace);
                }
            }
        }

        let canonical = canonicalize_existing_prefix(&full_path)?;
        if !is_within(&self.root, &canonical) {
            warn!(
                "Path escape attempt: {:?} resolves outside {:?}",
                relative_path, self.root
            );
            return Err(StoreError::OutsideWorkspace);
        }
        Ok(canonical)
    }

    /// Forward-slash key of an absolute path under the root ("" for the root)
    pub fn relative_key(&self, absolute: &Path) -> StoreResult<String> {
        let rel = absolute
            .strip_prefix(&self.root)
            .map_err(|_| StoreError::OutsideWorkspace)?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Ok(parts.join("/"))
    }
}

/// One-shot form of [`PathResolver::resolve`]
pub fn resolve_safe_path(root: &Path, relative_path: &str) -> StoreResult<PathBuf> {
    PathResolver::new(root)?.resolve(relative_path)
}

/// Keys are never stored with a leading slash
pub fn strip_leading_slashes(path: &str) -> &str {
    path.trim_start_matches('/')
}

fn is_within(root: &Path, candidate: &Path) -> bool {
    candidate == root || candidate.starts_with(root)
}

/// Canonicalize the deepest existing ancestor and re-append the missing tail.
fn canonicalize_existing_prefix(path: &Path) -> StoreResult<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut tail: Vec<OsString> = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(mut canonical) => {
                for part in tail.iter().rev() {
                    canonical.push(part);
                }
                return Ok(canonical);
            }
            Err(_) => {
                // A dangling symlink would be followed on write
                if fs::symlink_metadata(&existing).is_ok() {
                    return Err(StoreError::OutsideWorkspace);
                }
                match (existing.file_name(), existing.parent()) {
                    (Some(name), Some(parent)) => {
                        tail.push(name.to_os_string());
                        existing = parent.to_path_buf();
                    }
                    _ => return Err(StoreError::OutsideWorkspace),
                }
            }
        }
    }
}
