use std::{io, path::PathBuf, time::Duration};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The leader's one-time setup returned an error.
    #[error("leader preparation failed: {0:#}")]
    PreparationFailed(anyhow::Error),
    /// A follower observed the failure flag written by the leader.
    #[error("leader reported failure: {0}")]
    LeaderFailed(String),
    #[error("gave up waiting for the leader after {0:?}")]
    Timeout(Duration),
    #[error("waiting for the leader was cancelled")]
    Cancelled,
    #[error("no flag directory is set, it must be shared by every node")]
    MissingFlagDir,
    #[error("unrecognized content {:?} in flag file '{}'", content, path.display())]
    CorruptFlag { path: PathBuf, content: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}
