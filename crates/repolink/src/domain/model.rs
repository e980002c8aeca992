//! Domain models for repositories, selections, and generated links.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Remote-hosting provider a repository URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Provider {
    #[serde(rename = "github")]
    GitHubLike,
    #[serde(rename = "azure_devops")]
    AzureDevOpsLike,
    #[serde(rename = "unsupported")]
    Unsupported,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::GitHubLike => "github",
            Provider::AzureDevOpsLike => "azure-devops",
            Provider::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Git state gathered for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    /// Output of `git rev-parse --git-dir`.
    pub git_dir: String,
    pub remote_name: String,
    pub branch_name: String,
    pub remote_url: String,
    /// Slash-terminated prefix of the inspected directory, empty at the root.
    pub path_prefix: String,
    /// Only resolved for GitHub remotes.
    pub head_commit: Option<String>,
    pub provider: Provider,
}

impl RepositoryContext {
    /// Repository-relative location of `file_name` inside the inspected directory.
    pub fn locate(&self, file_name: &str) -> FileLocation {
        FileLocation {
            repo_relative_path: format!("{}{}", self.path_prefix, file_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    pub repo_relative_path: String,
}

/// Normalized 1-based line/column range.
///
/// `caret_only` marks ranges produced without an active selection. Those always report
/// `end_line = start_line + 1` and columns of 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionRange {
    pub start_line: usize,
    pub end_line: usize,
    pub start_column: usize,
    pub end_column: usize,
    pub caret_only: bool,
}

/// 0-based caret position as reported by an editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Caret {
    pub line: usize,
    pub column: usize,
}

/// Selected span as character offsets into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSpan {
    pub start: usize,
    pub end: usize,
}

impl SelectionSpan {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The file an editor currently has focused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
    pub path: PathBuf,
    pub caret: Caret,
    pub selection: Option<SelectionSpan>,
    /// Document contents, required to map a selection span to lines.
    pub text: Option<String>,
}

/// A generated link and the inputs it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedLink {
    pub url: String,
    pub provider: Provider,
    pub path: String,
    pub revision: String,
    pub selection: SelectionRange,
}
