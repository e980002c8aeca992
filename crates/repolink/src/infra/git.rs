//! Git integration utilities.

use std::path::{Path, PathBuf};

use crate::app::link::ProviderDetector;
use crate::domain::errors::{LinkError, LinkResult};
use crate::domain::model::{Provider, RepositoryContext};
use crate::infra::process::{ProcessOutput, ProcessRunner, SystemProcessRunner};

pub const DEFAULT_GIT_BINARY: &str = "git";

const GIT_DIR_ARGS: &[&str] = &["rev-parse", "--git-dir"];
const UPSTREAM_ARGS: &[&str] = &[
    "rev-parse",
    "--abbrev-ref",
    "--symbolic-full-name",
    "@{upstream}",
];
const PREFIX_ARGS: &[&str] = &["rev-parse", "--show-prefix"];
const HEAD_ARGS: &[&str] = &["rev-parse", "HEAD"];

/// Queries the `git` CLI for the metadata needed to build a link.
pub struct RepoInspector<R: ProcessRunner = SystemProcessRunner> {
    runner: R,
    binary: String,
    detector: ProviderDetector,
}

impl<R: ProcessRunner> RepoInspector<R> {
    pub fn new(runner: R, binary: impl Into<String>, detector: ProviderDetector) -> Self {
        Self {
            runner,
            binary: binary.into(),
            detector,
        }
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    /// Gather repository state for `directory`, stopping at the first missing piece.
    pub fn inspect(&self, directory: &Path) -> LinkResult<RepositoryContext> {
        let git_dir = self.git(directory, GIT_DIR_ARGS)?;
        let git_dir = git_dir.text().map(str::to_owned).ok_or_else(|| {
            LinkError::NotAGitRepository {
                directory: PathBuf::from(directory),
                detail: git_dir.failure_detail(),
            }
        })?;

        let upstream = self.git(directory, UPSTREAM_ARGS)?;
        let (remote_name, branch_name) = match upstream.text().and_then(split_upstream) {
            Some(parts) => parts,
            None => {
                return Err(LinkError::NoUpstreamConfigured {
                    detail: upstream_detail(&upstream),
                });
            }
        };

        let url_key = format!("remote.{remote_name}.url");
        let remote_url = self
            .git(directory, &["config", "--get", url_key.as_str()])?
            .text()
            .map(str::to_owned)
            .ok_or_else(|| LinkError::MissingRemoteUrl {
                remote: remote_name.clone(),
            })?;

        // An empty prefix is valid at the repository root.
        let prefix = self.git(directory, PREFIX_ARGS)?;
        if !prefix.success() {
            return Err(self.failure(PREFIX_ARGS, &prefix));
        }
        let path_prefix = prefix.stdout.trim().to_owned();

        let provider = self.detector.detect(&remote_url);
        let head_commit = match provider {
            Provider::GitHubLike => {
                let head = self.git(directory, HEAD_ARGS)?;
                let commit = head
                    .text()
                    .map(|text| text.trim().to_owned())
                    .ok_or_else(|| self.failure(HEAD_ARGS, &head))?;
                Some(commit)
            }
            Provider::AzureDevOpsLike | Provider::Unsupported => None,
        };

        tracing::debug!(
            remote = %remote_name,
            branch = %branch_name,
            url = %remote_url,
            prefix = %path_prefix,
            %provider,
            "inspected repository"
        );

        Ok(RepositoryContext {
            git_dir,
            remote_name,
            branch_name,
            remote_url,
            path_prefix,
            head_commit,
            provider,
        })
    }

    fn git(&self, directory: &Path, args: &[&str]) -> LinkResult<ProcessOutput> {
        tracing::debug!(dir = %directory.display(), args = ?args, "running git");
        let output = self
            .runner
            .run(&self.binary, args, directory)
            .map_err(|err| LinkError::ProcessExecutionFailure {
                command: self.command_line(args),
                detail: err.to_string(),
            })?;
        if !output.success() {
            tracing::debug!(status = ?output.status, stderr = %output.stderr, "git query failed");
        }
        Ok(output)
    }

    fn failure(&self, args: &[&str], output: &ProcessOutput) -> LinkError {
        LinkError::ProcessExecutionFailure {
            command: self.command_line(args),
            detail: output.failure_detail(),
        }
    }

    fn command_line(&self, args: &[&str]) -> String {
        let mut parts = vec![self.binary.as_str()];
        parts.extend_from_slice(args);
        parts.join(" ")
    }
}

/// Split `remote/branch` on the first `/`; branch names may contain further slashes.
pub fn split_upstream(upstream: &str) -> Option<(String, String)> {
    let (remote, branch) = upstream.trim().split_once('/')?;
    if remote.is_empty() || branch.is_empty() {
        return None;
    }
    Some((remote.to_owned(), branch.to_owned()))
}

fn upstream_detail(output: &ProcessOutput) -> String {
    match output.text() {
        Some(text) => format!("unexpected upstream `{text}`"),
        None => output.failure_detail(),
    }
}
