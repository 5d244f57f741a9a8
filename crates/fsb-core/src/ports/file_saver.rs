//! File saver port.
//!
//! The "save this file" action fired when a download prepared in the current
//! session finishes. Front-ends trigger a browser save; the CLI streams the
//! URL into its download directory.

use async_trait::async_trait;
use thiserror::Error;

use crate::task::TaskItem;

/// Error saving a prepared download.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Fetching the prepared file failed.
    #[error("Failed to fetch {url}: {message}")]
    Fetch {
        /// URL that was fetched.
        url: String,
        /// Failure description.
        message: String,
    },

    /// Writing the file locally failed.
    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for saving a finished download.
#[async_trait]
pub trait FileSaverPort: Send + Sync {
    /// Save the file behind `url`, which was prepared for `item`.
    async fn save(&self, url: &str, item: &TaskItem) -> Result<(), SaveError>;
}
