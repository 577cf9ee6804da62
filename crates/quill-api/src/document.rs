//! Document entity for the note workspace data model.
//!
//! A document is one Markdown note. Each named document maps to a file on
//! disk (`{documents_root}/{title}.md`) and to one entry in the persisted
//! metadata index. A freshly created document lives in memory only until it
//! is named for the first time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Unique identifier for a document (UUID, generated client-side, never reused).
pub type DocumentId = String;

/// Body given to a document at creation time, before the user has typed anything.
pub const PLACEHOLDER_BODY: &str = "## Write some Markdown\n";

/// One Markdown note held by the document store.
///
/// # States
/// - **New**: `is_new = true`, `path = None`, absent from the metadata index.
///   Always loaded (the placeholder body is its content).
/// - **Known, unloaded**: materialized from the index at startup; `body = None`
///   until the backing file is read.
/// - **Loaded**: `body = Some(..)`. "Loaded" is not a separate flag; it is
///   defined as the presence of a body, so the two can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,

    /// Display name and filename stem. Empty only before the first rename.
    pub title: String,

    /// Absolute file location. `None` until the first successful save.
    pub path: Option<PathBuf>,

    /// Full text content. `Some` iff the document is loaded.
    pub body: Option<String>,

    /// Creation timestamp (Unix milliseconds). Immutable once set.
    pub created_at: i64,

    /// True from creation until the first successful write to disk.
    pub is_new: bool,

    /// Bumped whenever the document's path changes or the entry is purged.
    /// In-flight reads carry the value they started with; a completion whose
    /// generation no longer matches must be discarded.
    pub generation: u64,
}

impl Document {
    /// Create a brand-new, never-persisted document with the given id.
    pub fn new(id: DocumentId) -> Self {
        Self {
            id,
            title: String::new(),
            path: None,
            body: Some(PLACEHOLDER_BODY.to_string()),
            created_at: chrono::Utc::now().timestamp_millis(),
            is_new: true,
            generation: 0,
        }
    }

    /// Materialize a known document from its persisted metadata.
    ///
    /// The body stays unloaded until the backing file is read.
    pub fn from_meta(meta: DocumentMeta) -> Self {
        Self {
            id: meta.id,
            title: meta.title,
            path: Some(meta.path),
            body: None,
            created_at: meta.created_at,
            is_new: false,
            generation: 0,
        }
    }

    /// Whether the body has been populated (from disk or from creation).
    pub fn is_loaded(&self) -> bool {
        self.body.is_some()
    }

    /// The persisted projection of this document, or `None` while it has
    /// never been saved and therefore must not appear in the index.
    pub fn meta(&self) -> Option<DocumentMeta> {
        self.path.as_ref().map(|path| DocumentMeta {
            id: self.id.clone(),
            path: path.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
        })
    }
}

/// The slice of a document that survives process restarts.
///
/// Bodies and flags are deliberately absent: content lives in the per-document
/// file, and `is_new` documents are never persisted at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: DocumentId,
    pub path: PathBuf,
    pub title: String,
    pub created_at: i64,
}

/// Derive the on-disk location for a titled document.
///
/// The convention is fixed: `{documents_root}/{title}.md`.
pub fn document_path(documents_root: &Path, title: &str) -> PathBuf {
    documents_root.join(format!("{title}.md"))
}
