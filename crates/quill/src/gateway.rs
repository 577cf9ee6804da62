//! Collaborator traits for the two external stores.
//!
//! The core never touches the filesystem or the index file directly; it goes
//! through these traits so tests can swap in in-memory fakes and so the
//! serialization rules (which operation persists what, and when) live in one
//! place — the store — rather than being smeared across I/O code.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use quill_api::{DocumentId, DocumentMeta};

use crate::error::{FsError, IndexError};

/// Reads and writes document bodies as text blobs at paths. Pure I/O, no
/// policy: each call is independent, there is no transaction spanning calls.
#[async_trait]
pub trait FilesystemGateway: Send + Sync {
    async fn read(&self, path: &Path) -> Result<String, FsError>;

    async fn write(&self, path: &Path, text: &str) -> Result<(), FsError>;

    async fn rename(&self, old: &Path, new: &Path) -> Result<(), FsError>;

    async fn delete(&self, path: &Path) -> Result<(), FsError>;
}

/// Persisted mapping from document id to metadata, surviving restarts.
///
/// `save_all` is an idempotent full overwrite: the store always rewrites the
/// entire mapping, never a delta, so the on-disk index and the in-memory
/// documents cannot diverge after a successful operation.
#[async_trait]
pub trait MetadataIndex: Send + Sync {
    /// Called once at startup.
    async fn load_all(&self) -> Result<HashMap<DocumentId, DocumentMeta>, IndexError>;

    async fn save_all(
        &self,
        entries: &HashMap<DocumentId, DocumentMeta>,
    ) -> Result<(), IndexError>;
}
