//! Filesystem gateway over tokio::fs.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use quill::error::FsError;
use quill::gateway::FilesystemGateway;

/// Document bodies as plain UTF-8 files. Parent directories are created on
/// write so a fresh documents root works without setup.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

fn map_err(op: &'static str, path: &Path, source: io::Error) -> FsError {
    if source.kind() == io::ErrorKind::NotFound {
        FsError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        FsError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl FilesystemGateway for LocalFilesystem {
    async fn read(&self, path: &Path) -> Result<String, FsError> {
        fs::read_to_string(path)
            .await
            .map_err(|e| map_err("read", path, e))
    }

    async fn write(&self, path: &Path, text: &str) -> Result<(), FsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| map_err("create dir", parent, e))?;
        }
        fs::write(path, text)
            .await
            .map_err(|e| map_err("write", path, e))?;
        debug!(path = %path.display(), bytes = text.len(), "wrote document");
        Ok(())
    }

    async fn rename(&self, old: &Path, new: &Path) -> Result<(), FsError> {
        fs::rename(old, new)
            .await
            .map_err(|e| map_err("rename", old, e))?;
        debug!(from = %old.display(), to = %new.display(), "renamed document file");
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_file(path)
            .await
            .map_err(|e| map_err("delete", path, e))?;
        debug!(path = %path.display(), "deleted document file");
        Ok(())
    }
}
