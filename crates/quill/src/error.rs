//! Error taxonomy for core operations.
//!
//! Failures are never retried automatically and never fatal: every operation
//! that fails leaves the store and session in their prior stable state (or,
//! for the self-healing purge, in the documented post-purge state) and the
//! error is surfaced exactly once to the caller.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use quill_api::DocumentId;

/// Failure of a single filesystem gateway call.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such file: {path}")]
    NotFound { path: PathBuf },

    #[error("{op} failed for {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure of the metadata index collaborator.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("metadata index I/O failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("metadata index at {path} is malformed: {message}")]
    Malformed { path: PathBuf, message: String },
}

/// Failure of a document store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unknown id, or the backing file was missing on open (in which case the
    /// dangling entry has already been purged from store, index, and tabs).
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// Rename target title already belongs to another live document. Rejected
    /// before any I/O; no state changed.
    #[error("a document titled \"{0}\" already exists")]
    NameTaken(String),

    /// Titles become filename stems, so they must be non-empty and must not
    /// contain path separators.
    #[error("\"{0}\" is not a usable document title")]
    InvalidTitle(String),

    /// The document has never been named, so it has no path to save to.
    #[error("document {0} has no name yet; rename it before saving")]
    Untitled(DocumentId),

    /// The document's body is not in memory, so there is nothing to write.
    #[error("document {0} is not loaded")]
    NotLoaded(DocumentId),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Index(#[from] IndexError),

    /// The workspace actor has shut down and can no longer accept intents.
    #[error("workspace is closed")]
    Closed,
}
