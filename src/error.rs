//! Error taxonomy for a mirror run.
//!
//! Configuration errors are fatal before any mutation. Metadata errors
//! (`CreateFailed`/`UpdateFailed`) are recovered by the driver with a
//! warning. Git-layer errors abort the run. `EmptyRemoteRepository` is a
//! distinguished non-error outcome: nothing to mirror.

use std::time::Duration;

use thiserror::Error;

pub type Result<T, E = MirrorError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{resource} {name} not found")]
    NotFound { resource: &'static str, name: String },

    #[error("create repository {name} failed: {detail}")]
    CreateFailed { name: String, detail: String },

    #[error("update repository {owner}/{name} failed: {detail}")]
    UpdateFailed {
        owner: String,
        name: String,
        detail: String,
    },

    #[error("git clone {url} failed: {detail}")]
    CloneFailed { url: String, detail: String },

    #[error("git fetch {remote} failed: {detail}")]
    FetchFailed { remote: String, detail: String },

    #[error("git push {remote} failed: {detail}")]
    PushFailed { remote: String, detail: String },

    #[error("git remote {remote} setup failed: {detail}")]
    RemoteFailed { remote: String, detail: String },

    #[error("remote repository is empty")]
    EmptyRemoteRepository,

    #[error("git {operation} timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    #[error("{provider} api error: {detail}")]
    Api { provider: &'static str, detail: String },

    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),
}

impl MirrorError {
    pub fn config(msg: impl Into<String>) -> Self {
        MirrorError::Config(msg.into())
    }

    pub fn not_found(resource: &'static str, name: impl Into<String>) -> Self {
        MirrorError::NotFound {
            resource,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MirrorError::NotFound { .. })
    }
}
