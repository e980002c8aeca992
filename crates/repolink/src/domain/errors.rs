//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

/// Every reason a link could not be produced.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("no file is open")]
    NoActiveFile,
    #[error("failed to read {}", path.display())]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not inside a git repository: {detail}", directory.display())]
    NotAGitRepository { directory: PathBuf, detail: String },
    #[error("the current branch has no upstream configured: {detail}")]
    NoUpstreamConfigured { detail: String },
    #[error("remote `{remote}` has no url configured")]
    MissingRemoteUrl { remote: String },
    #[error("remote url `{url}` is not a supported GitHub or Azure DevOps host")]
    UnsupportedHost { url: String },
    #[error("`{command}` failed: {detail}")]
    ProcessExecutionFailure { command: String, detail: String },
    #[error("failed to copy link to clipboard: {0}")]
    Clipboard(String),
}

pub type LinkResult<T> = Result<T, LinkError>;
