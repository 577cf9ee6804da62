//! In-memory gateway implementations for tests.
//!
//! These fakes let tests (and embedders writing their own) drive the full
//! store/workspace path without touching a real filesystem, while counting
//! gateway calls and injecting failures or read latency.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use quill_api::{DocumentId, DocumentMeta};

use crate::error::{FsError, IndexError};
use crate::gateway::{FilesystemGateway, MetadataIndex};

fn injected(op: &'static str, path: &Path) -> FsError {
    FsError::Io {
        op,
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::Other, "injected failure"),
    }
}

/// Filesystem gateway backed by a map of path → contents.
#[derive(Default)]
pub struct MemoryFilesystem {
    files: RwLock<HashMap<PathBuf, String>>,
    calls: AtomicUsize,
    fail_writes: AtomicBool,
    fail_renames: AtomicBool,
    fail_deletes: AtomicBool,
    read_delay: RwLock<Option<Duration>>,
}

impl MemoryFilesystem {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed a file, bypassing call counting.
    pub async fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.write().await.insert(path.into(), text.into());
    }

    pub async fn contents(&self, path: &Path) -> Option<String> {
        self.files.read().await.get(path).cloned()
    }

    /// Total gateway calls made (reads, writes, renames, deletes).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn fail_renames(&self, on: bool) {
        self.fail_renames.store(on, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, on: bool) {
        self.fail_deletes.store(on, Ordering::SeqCst);
    }

    /// Delay every read, so tests can interleave intents with in-flight I/O.
    pub async fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.write().await = Some(delay);
    }
}

#[async_trait]
impl FilesystemGateway for MemoryFilesystem {
    async fn read(&self, path: &Path) -> Result<String, FsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.read_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound {
                path: path.to_path_buf(),
            })
    }

    async fn write(&self, path: &Path, text: &str) -> Result<(), FsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected("write", path));
        }
        self.files
            .write()
            .await
            .insert(path.to_path_buf(), text.to_string());
        Ok(())
    }

    async fn rename(&self, old: &Path, new: &Path) -> Result<(), FsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_renames.load(Ordering::SeqCst) {
            return Err(injected("rename", old));
        }
        let mut files = self.files.write().await;
        let body = files.remove(old).ok_or_else(|| FsError::NotFound {
            path: old.to_path_buf(),
        })?;
        files.insert(new.to_path_buf(), body);
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<(), FsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(injected("delete", path));
        }
        self.files
            .write()
            .await
            .remove(path)
            .ok_or_else(|| FsError::NotFound {
                path: path.to_path_buf(),
            })?;
        Ok(())
    }
}

/// Metadata index backed by a map, with a save counter.
#[derive(Default)]
pub struct MemoryIndex {
    entries: RwLock<HashMap<DocumentId, DocumentMeta>>,
    saves: AtomicUsize,
}

impl MemoryIndex {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed entries, as if a previous session had persisted them.
    pub async fn seed(&self, metas: impl IntoIterator<Item = DocumentMeta>) {
        let mut entries = self.entries.write().await;
        for meta in metas {
            entries.insert(meta.id.clone(), meta);
        }
    }

    pub async fn snapshot(&self) -> HashMap<DocumentId, DocumentMeta> {
        self.entries.read().await.clone()
    }

    /// Number of `save_all` calls observed.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataIndex for MemoryIndex {
    async fn load_all(&self) -> Result<HashMap<DocumentId, DocumentMeta>, IndexError> {
        Ok(self.entries.read().await.clone())
    }

    async fn save_all(
        &self,
        entries: &HashMap<DocumentId, DocumentMeta>,
    ) -> Result<(), IndexError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.entries.write().await = entries.clone();
        Ok(())
    }
}
