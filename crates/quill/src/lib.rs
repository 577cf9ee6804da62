//! Document and session state core for a desktop Markdown note tool.
//!
//! The crate owns the canonical in-memory representation of every known
//! document and mediates all transitions between "known but not loaded",
//! "loaded", "dirty", "open in a tab", and "deleted", serializing them
//! against two asynchronous external stores: a filesystem (one file per
//! document) and a persisted metadata index.
//!
//! Rendering is someone else's job: a presentation layer drives the
//! [`workspace::WorkspaceHandle`] intents and renders the [`view::ViewModel`]
//! published after every state change.

pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod store;
pub mod testing;
pub mod view;
pub mod workspace;

pub use config::WorkspaceConfig;
pub use error::{FsError, IndexError, StoreError};
pub use gateway::{FilesystemGateway, MetadataIndex};
pub use session::SessionState;
pub use store::{DocumentStore, OpenRequest, ReadCompletion};
pub use view::{ActiveDocument, DocumentListItem, ViewModel};
pub use workspace::{Notice, WorkspaceHandle};

pub use quill_api::{Document, DocumentId, DocumentMeta, PLACEHOLDER_BODY};
