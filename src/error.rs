//! Error types for git2wp

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not a git repository: {path}")]
    NotGitRepository { path: PathBuf },

    #[error("Commit '{rev}' not found")]
    CommitNotFound { rev: String },

    /// Liveness check failed; the endpoint is left out of selection.
    #[error("{endpoint} is unreachable: {reason}")]
    ProbeUnreachable { endpoint: String, reason: String },

    /// The chosen endpoint could not produce a summary; the template is used instead.
    #[error("Generation on {endpoint} failed: {reason}")]
    GenerationFailed { endpoint: String, reason: String },

    #[error("WordPress setting '{key}' is not configured")]
    MissingWordPressSetting { key: &'static str },

    #[error("WordPress rejected the request (HTTP {status}): {body}")]
    WordPressApi { status: u16, body: String },

    #[error("WordPress user lacks permission to publish posts (needs 'edit_posts')")]
    WordPressForbidden,
}
