//! Subcommands of `fsb`.

use std::path::PathBuf;

use clap::Subcommand;

/// Available commands.
///
/// `download` and `upload` wait for their job unless `--detach` is given;
/// the other commands act on the persisted queue and return.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Prepare a remote file for download and save it when ready
    Download {
        /// Remote path, e.g. "/data/report.csv"
        path: String,
        /// Queue the job and exit without waiting
        #[arg(long)]
        detach: bool,
    },

    /// Upload a local file into the file browser
    Upload {
        /// Remote destination path, e.g. "/data/new.txt"
        path: String,
        /// Remote directory that lists the new file
        root: String,
        /// Local file to send
        file: PathBuf,
        /// Exit once the bytes are sent, without waiting for registration
        #[arg(long)]
        detach: bool,
    },

    /// Show the queue
    List,

    /// Follow the queue until no task is running
    Watch,

    /// Cancel a job on the server and remove it from the queue
    Cancel {
        /// Job id
        id: String,
    },

    /// Remove a job from the queue without contacting the server
    Dismiss {
        /// Job id
        id: String,
    },

    /// Save the file of a finished download, e.g. one restored from an
    /// earlier run, and remove it from the queue
    Save {
        /// Job id
        id: String,
    },
}
