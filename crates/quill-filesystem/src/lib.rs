//! Production collaborators for the quill core: the local filesystem and a
//! JSON-file metadata index.

pub mod index;
pub mod local;

pub use index::JsonMetadataIndex;
pub use local::LocalFilesystem;
