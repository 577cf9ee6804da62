//! Workspace configuration supplied once at startup by the host environment.

use std::path::PathBuf;

/// Where titled documents live on disk.
///
/// Every saved document sits directly under `documents_root` as
/// `{title}.md`.
#[derive(Clone, Debug)]
pub struct WorkspaceConfig {
    pub documents_root: PathBuf,
}

impl WorkspaceConfig {
    pub fn new(documents_root: impl Into<PathBuf>) -> Self {
        Self {
            documents_root: documents_root.into(),
        }
    }
}
