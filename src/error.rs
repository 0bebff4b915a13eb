//! Failure taxonomy for the data sources feeding the status bar.
//!
//! Everything except [`StatuslineError::InvalidInput`] is recovered below the
//! renderer by falling back to a stale value, a placeholder, or by omitting
//! the affected segment.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatuslineError {
    /// Every configured credential source failed or was empty
    #[error("no OAuth credential found")]
    NoCredentialFound,

    /// Network error, non-success status, or malformed usage body
    #[error("usage fetch failed: {0}")]
    RemoteFetchFailed(String),

    #[error("not inside a git work tree")]
    NotARepo,

    /// git exited non-zero, timed out, or printed something unparseable
    #[error("git command failed: {0}")]
    GitCommandFailed(String),

    /// The session payload cannot render line 1 (missing model, bad JSON)
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type StatusResult<T> = std::result::Result<T, StatuslineError>;
