//! JSON file task store.
//!
//! # File naming
//!
//! `<state_dir>/<percent-encoded key>.json`, e.g. `fsb.tasks%3A%2Fdata.json`.
//!
//! # Atomicity
//!
//! 1. Write to `<name>.json.tmp`
//! 2. Rename to `<name>.json` (atomic on Unix/macOS)

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use fsb_core::{PersistedQueue, RepositoryError, TaskStateRepositoryPort};

/// One JSON file per storage key.
#[derive(Debug, Clone)]
pub struct JsonFileTaskStore {
    dir: PathBuf,
}

impl JsonFileTaskStore {
    /// Store files below `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// State directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the snapshot for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

#[async_trait]
impl TaskStateRepositoryPort for JsonFileTaskStore {
    async fn load(&self, key: &str) -> Result<Option<PersistedQueue>, RepositoryError> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let queue = PersistedQueue::decode(&raw)?;
        tracing::debug!(path = %path.display(), tasks = queue.tasks.len(), "Loaded task snapshot");
        Ok(Some(queue))
    }

    async fn save(&self, key: &str, queue: &PersistedQueue) -> Result<(), RepositoryError> {
        fs::create_dir_all(&self.dir).await?;

        let final_path = self.path_for(key);
        let temp_path = final_path.with_extension("json.tmp");

        fs::write(&temp_path, queue.encode()?).await?;
        fs::rename(&temp_path, &final_path).await?;
        Ok(())
    }
}
