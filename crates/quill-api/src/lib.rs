//! Entity types shared between the quill core and its storage collaborators.

pub mod document;

pub use document::{document_path, Document, DocumentId, DocumentMeta, PLACEHOLDER_BODY};
