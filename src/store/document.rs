//! Side-car JSON documents
//!
//! Each index lives in one pretty-printed JSON document. Access goes through
//! [`JsonDocument`], which serializes read-modify-write cycles per document and
//! replaces the file atomically (temp file in the same directory + rename).

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use super::error::StoreResult;

/// A JSON document on disk holding a value of type `T`
pub struct JsonDocument<T> {
    path: PathBuf,
    writer: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + PartialEq,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents; absent or unparseable documents read as empty
    pub fn load(&self) -> T {
        let _guard = self.lock();
        self.read()
    }

    /// Load, mutate and save under the document lock.
    ///
    /// The file is rewritten only when `f` actually changed the value, so a
    /// no-op update never creates the document.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> StoreResult<R> {
        let _guard = self.lock();
        let before = self.read();
        let mut doc = before.clone();
        let result = f(&mut doc);
        if doc != before {
            self.write(&doc)?;
        }
        Ok(result)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> T {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return T::default(),
            Err(e) => {
                warn!("Failed to read {:?}, treating as empty: {}", self.path, e);
                return T::default();
            }
        };
        if content.trim().is_empty() {
            return T::default();
        }
        match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Corrupt document {:?}, treating as empty: {}", self.path, e);
                T::default()
            }
        }
    }

    fn write(&self, doc: &T) -> StoreResult<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(&mut temp_file, doc).map_err(io::Error::from)?;
        temp_file.write_all(b"\n")?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(&self.path).map_err(|e| e.error)?;

        debug!("Saved document {:?}", self.path);
        Ok(())
    }
}
