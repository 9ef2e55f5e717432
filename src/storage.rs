//! Filesystem abstraction.
//!
//! Record loading, logo reading and report writing all go through the
//! [`Storage`] trait, so the pipeline can run against the local disk or an
//! in-memory store without any change to the worker code.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Byte-level storage used by the report pipeline.
pub trait Storage: Send + Sync {
    /// Read the full contents of a file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create a directory and all of its parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Write a file, replacing any previous contents.
    ///
    /// Implementations must not leave a partially written file at `path`
    /// when the write fails.
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;
}

/// [`Storage`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    /// Create a new local storage handle.
    pub fn new() -> Self {
        Self
    }
}

impl Storage for LocalStorage {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        // Stage next to the target so the rename stays on one filesystem.
        let mut staged = tempfile::Builder::new()
            .prefix(".rosterpdf-")
            .suffix(".part")
            .tempfile_in(dir)?;
        staged.write_all(data)?;
        staged.as_file().sync_all()?;
        staged.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// In-memory [`Storage`], useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: Mutex<Vec<PathBuf>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file.
    pub fn insert(&self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) {
        lock(&self.files).insert(path.into(), data.into());
    }

    /// Get a copy of a file's contents.
    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        lock(&self.files).get(path).cloned()
    }

    /// Check if a file exists.
    pub fn contains(&self, path: &Path) -> bool {
        lock(&self.files).contains_key(path)
    }

    /// All stored file paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        lock(&self.files).keys().cloned().collect()
    }

    /// Directories created so far, in creation order.
    pub fn created_dirs(&self) -> Vec<PathBuf> {
        lock(&self.dirs).clone()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut dirs = lock(&self.dirs);
        if !dirs.iter().any(|d| d == path) {
            dirs.push(path.to_path_buf());
        }
        Ok(())
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.insert(path, data);
        Ok(())
    }
}

// A poisoned lock only means another writer panicked mid-insert; the map
// itself is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
