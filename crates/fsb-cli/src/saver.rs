//! Saves finished downloads into a local directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use fsb_core::{FileSaverPort, SaveError, TaskItem};

use crate::error::CliError;

/// Name used when the item path has no usable file name.
const FALLBACK_NAME: &str = "download";

/// Streams a prepared download into `dir`, named after the remote file.
///
/// The body is written to `<name>.part` and renamed once complete.
#[derive(Debug, Clone)]
pub struct DiskFileSaver {
    client: reqwest::Client,
    dir: PathBuf,
}

impl DiskFileSaver {
    /// Save into `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CliError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fsb/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(Self {
            client,
            dir: dir.into(),
        })
    }

    /// Download directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the file for `item` ends up.
    pub fn target_for(&self, item: &TaskItem) -> PathBuf {
        let name = item
            .path
            .rsplit('/')
            .find(|s| !s.is_empty())
            .filter(|s| *s != "." && *s != "..")
            .unwrap_or(FALLBACK_NAME);
        self.dir.join(name)
    }

    async fn write_body(
        &self,
        url: &str,
        response: reqwest::Response,
        part: &Path,
    ) -> Result<(), SaveError> {
        let mut file = fs::File::create(part).await?;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| fetch_error(url, &e))?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

fn fetch_error(url: &str, err: &reqwest::Error) -> SaveError {
    SaveError::Fetch {
        url: url.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl FileSaverPort for DiskFileSaver {
    async fn save(&self, url: &str, item: &TaskItem) -> Result<(), SaveError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| fetch_error(url, &e))?;

        fs::create_dir_all(&self.dir).await?;
        let target = self.target_for(item);
        let mut part = target.clone().into_os_string();
        part.push(".part");
        let part = PathBuf::from(part);

        if let Err(e) = self.write_body(url, response, &part).await {
            if let Err(cleanup) = fs::remove_file(&part).await {
                warn!(path = %part.display(), error = %cleanup, "Failed to remove partial file");
            }
            return Err(e);
        }
        fs::rename(&part, &target).await?;

        info!(path = %target.display(), "Saved download");
        Ok(())
    }
}
