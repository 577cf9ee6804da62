//! Single source of truth for document existence and content.
//!
//! The store owns the in-memory `Document` map and arbitrates every mutation
//! against the two external stores. Ordering rules, per operation:
//!
//! - `create` and `edit` are synchronous and touch no external store.
//! - `rename`, `delete`, and `save` perform their filesystem call first and
//!   apply the in-memory mutation only after it succeeds; a failed call
//!   leaves the prior state untouched.
//! - Any operation that changes id, path, title, or creation time of any
//!   document rewrites the entire metadata mapping before it completes.
//!
//! All mutating methods take `&mut self`: a second operation cannot start
//! while one is suspended at an await point, which is the single-writer
//! discipline the rest of the design leans on. The one deliberately
//! concurrent piece of I/O — the body read behind `open` — is split into
//! [`DocumentStore::begin_open`] and [`DocumentStore::finish_open`] so the
//! caller can run the read elsewhere and feed the completion back in. Each
//! read carries the document's generation; completions that no longer match
//! are dropped instead of resurrecting stale state.

use std::collections::HashMap;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use quill_api::{document_path, Document, DocumentId, DocumentMeta};

use crate::config::WorkspaceConfig;
use crate::error::{FsError, IndexError, StoreError};
use crate::gateway::{FilesystemGateway, MetadataIndex};

/// What `begin_open` asks the caller to do.
#[derive(Debug)]
pub enum OpenRequest {
    /// The body is already in memory; no I/O.
    AlreadyLoaded,
    /// Read `path` and feed the result to `finish_open` together with
    /// `generation`.
    Read { path: PathBuf, generation: u64 },
}

/// Outcome of applying a completed read.
#[derive(Debug, PartialEq)]
pub enum ReadCompletion {
    /// The body was merged into the document.
    Applied,
    /// The completion no longer matched the document (deleted, renamed, or
    /// loaded in the meantime) and was dropped.
    Stale,
    /// The backing file was unreadable; the dangling entry was purged from
    /// the store and the index. The caller must close any tab for it.
    Purged { title: String },
}

pub struct DocumentStore {
    documents: HashMap<DocumentId, Document>,
    documents_root: PathBuf,
    fs: Arc<dyn FilesystemGateway>,
    index: Arc<dyn MetadataIndex>,
}

impl DocumentStore {
    /// Load the persisted index (once, at startup) and materialize every
    /// known document as unloaded.
    pub async fn load(
        config: &WorkspaceConfig,
        fs: Arc<dyn FilesystemGateway>,
        index: Arc<dyn MetadataIndex>,
    ) -> Result<Self, IndexError> {
        let entries = index.load_all().await?;
        info!(
            count = entries.len(),
            root = %config.documents_root.display(),
            "loaded document index"
        );
        let documents = entries
            .into_values()
            .map(|meta| (meta.id.clone(), Document::from_meta(meta)))
            .collect();
        Ok(Self {
            documents,
            documents_root: config.documents_root.clone(),
            fs,
            index,
        })
    }

    /// Create a fresh document in memory: empty title, placeholder body,
    /// no path, absent from the index. Returns the new id so the caller can
    /// open it as a tab.
    pub fn create(&mut self) -> DocumentId {
        let id = Uuid::new_v4().to_string();
        self.documents.insert(id.clone(), Document::new(id.clone()));
        debug!(%id, "created document");
        id
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents_root(&self) -> &Path {
        &self.documents_root
    }

    /// Handle to the filesystem gateway, for callers that run reads outside
    /// the store (see `begin_open`).
    pub fn filesystem(&self) -> Arc<dyn FilesystemGateway> {
        Arc::clone(&self.fs)
    }

    /// First half of `open`: decide whether a read is needed.
    pub fn begin_open(&self, id: &DocumentId) -> Result<OpenRequest, StoreError> {
        let doc = self
            .documents
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if doc.is_loaded() {
            return Ok(OpenRequest::AlreadyLoaded);
        }
        let path = doc
            .path
            .clone()
            .ok_or_else(|| StoreError::Untitled(id.clone()))?;
        Ok(OpenRequest::Read {
            path,
            generation: doc.generation,
        })
    }

    /// Second half of `open`: apply a completed read.
    ///
    /// The completion is dropped unless the id still exists, its generation
    /// matches, and the body is still unloaded (an edit that landed while the
    /// read was in flight must not be clobbered by disk content).
    ///
    /// A failed read triggers the self-healing purge: the entry disappears
    /// from the store and the whole index is rewritten. If that rewrite
    /// itself fails, the dangling index entry survives until the next open
    /// purges it again.
    pub async fn finish_open(
        &mut self,
        id: &DocumentId,
        generation: u64,
        outcome: Result<String, FsError>,
    ) -> ReadCompletion {
        let Some(doc) = self.documents.get_mut(id) else {
            debug!(%id, "read completion for a deleted document; dropped");
            return ReadCompletion::Stale;
        };
        if doc.generation != generation {
            debug!(%id, "read completion with stale generation; dropped");
            return ReadCompletion::Stale;
        }
        if doc.is_loaded() {
            debug!(%id, "read completion for an already-loaded document; dropped");
            return ReadCompletion::Stale;
        }

        match outcome {
            Ok(body) => {
                doc.body = Some(body);
                ReadCompletion::Applied
            }
            Err(err) => {
                warn!(%id, title = %doc.title, %err, "backing file unreadable; purging document");
                let title = doc.title.clone();
                self.documents.remove(id);
                if let Err(index_err) = self.persist_index().await {
                    warn!(%index_err, "index rewrite after purge failed");
                }
                ReadCompletion::Purged { title }
            }
        }
    }

    /// Replace the body synchronously. No I/O; the caller is responsible for
    /// marking the document dirty in the session.
    pub fn edit(
        &mut self,
        id: &DocumentId,
        new_body: impl Into<String>,
    ) -> Result<(), StoreError> {
        let doc = self
            .documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        doc.body = Some(new_body.into());
        Ok(())
    }

    /// Rename a document, which for a never-saved document is its first save.
    ///
    /// Aborts before any I/O if the target title is invalid or already taken
    /// by another live document. In-memory state changes only after the
    /// write (new document) or file rename (existing document) succeeds, and
    /// the full index is rewritten afterwards.
    pub async fn rename(&mut self, id: &DocumentId, new_title: &str) -> Result<(), StoreError> {
        validate_title(new_title)?;

        let doc = self
            .documents
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let new_path = document_path(&self.documents_root, new_title);

        if doc.title != new_title
            && self
                .documents
                .values()
                .any(|other| other.id != *id && other.title == new_title)
        {
            return Err(StoreError::NameTaken(new_title.to_string()));
        }

        if doc.is_new {
            let body = doc
                .body
                .clone()
                .ok_or_else(|| StoreError::NotLoaded(id.clone()))?;
            self.fs.write(&new_path, &body).await?;
        } else {
            let old_path = doc
                .path
                .clone()
                .ok_or_else(|| StoreError::Untitled(id.clone()))?;
            self.fs.rename(&old_path, &new_path).await?;
        }

        let doc = self
            .documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if doc.path.as_ref() != Some(&new_path) {
            // In-flight reads against the old path must not apply.
            doc.generation += 1;
        }
        doc.title = new_title.to_string();
        doc.path = Some(new_path);
        doc.is_new = false;
        debug!(%id, title = %doc.title, "renamed document");

        self.persist_index().await?;
        Ok(())
    }

    /// Delete a document irreversibly.
    ///
    /// A never-persisted document is dropped from memory with no I/O at all.
    /// Otherwise the file is deleted first; a failed delete leaves the
    /// document fully intact. The caller must close any tab for the id once
    /// this returns Ok.
    pub async fn delete(&mut self, id: &DocumentId) -> Result<(), StoreError> {
        let doc = self
            .documents
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if doc.is_new {
            self.documents.remove(id);
            debug!(%id, "dropped never-saved document");
            return Ok(());
        }

        let path = doc
            .path
            .clone()
            .ok_or_else(|| StoreError::Untitled(id.clone()))?;
        self.fs.delete(&path).await?;
        self.documents.remove(id);
        debug!(%id, path = %path.display(), "deleted document");

        self.persist_index().await?;
        Ok(())
    }

    /// Write the in-memory body to the document's current path.
    ///
    /// Only meaningful for a document that has been named; a brand-new
    /// document routes through `rename` first. Metadata is untouched, so the
    /// index is not rewritten. The caller clears the dirty flag on success.
    pub async fn save(&mut self, id: &DocumentId) -> Result<(), StoreError> {
        let doc = self
            .documents
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let path = doc
            .path
            .clone()
            .ok_or_else(|| StoreError::Untitled(id.clone()))?;
        let body = doc
            .body
            .clone()
            .ok_or_else(|| StoreError::NotLoaded(id.clone()))?;

        self.fs.write(&path, &body).await?;
        debug!(%id, path = %path.display(), "saved document");
        Ok(())
    }

    /// Re-derive the whole id → metadata mapping and overwrite the index.
    async fn persist_index(&self) -> Result<(), IndexError> {
        let entries: HashMap<DocumentId, DocumentMeta> = self
            .documents
            .values()
            .filter_map(Document::meta)
            .map(|meta| (meta.id.clone(), meta))
            .collect();
        self.index.save_all(&entries).await
    }
}

fn validate_title(title: &str) -> Result<(), StoreError> {
    if title.is_empty() || title.contains(MAIN_SEPARATOR) || title.contains('/') {
        return Err(StoreError::InvalidTitle(title.to_string()));
    }
    Ok(())
}
