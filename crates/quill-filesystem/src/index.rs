//! Metadata index persisted as one JSON file.
//!
//! The whole id → metadata mapping is rewritten on every save (the core's
//! full-overwrite policy), so the file never needs merging. The write goes
//! through a sibling temp file followed by a rename: a crash mid-write can
//! leave a stray temp file but never a truncated index.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use quill::error::IndexError;
use quill::gateway::MetadataIndex;
use quill_api::{DocumentId, DocumentMeta};

pub struct JsonMetadataIndex {
    path: PathBuf,
}

impl JsonMetadataIndex {
    /// `path` is the index file itself, e.g. `{app_data}/documents.json`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_err(&self, source: io::Error) -> IndexError {
        IndexError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl MetadataIndex for JsonMetadataIndex {
    async fn load_all(&self) -> Result<HashMap<DocumentId, DocumentMeta>, IndexError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            // First launch: no index yet.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        serde_json::from_str(&raw).map_err(|e| IndexError::Malformed {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    async fn save_all(
        &self,
        entries: &HashMap<DocumentId, DocumentMeta>,
    ) -> Result<(), IndexError> {
        let json = serde_json::to_string_pretty(entries).map_err(|e| IndexError::Malformed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| self.io_err(e))?;
        }
        let temp = self.temp_path();
        fs::write(&temp, json).await.map_err(|e| self.io_err(e))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_err(e))?;
        debug!(path = %self.path.display(), count = entries.len(), "index rewritten");
        Ok(())
    }
}
