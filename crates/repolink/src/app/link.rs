//! Provider detection and URL formatting.

use std::borrow::Cow;

use crate::domain::errors::{LinkError, LinkResult};
use crate::domain::model::{Provider, SelectionRange};
use crate::infra::config::Config;

/// Azure DevOps addresses branches as `GB<name>` in its `version` query parameter.
const DEVOPS_BRANCH_MARKER: &str = "GB";
const GIT_SUFFIX: &str = ".git";

/// Maps remote URLs onto a [`Provider`] by case-insensitive host substring.
///
/// Azure DevOps hosts are checked before GitHub hosts; the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDetector {
    azure_devops: Vec<String>,
    github: Vec<String>,
}

impl ProviderDetector {
    pub fn new<I, J, S, T>(azure_devops: I, github: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            azure_devops: lowercase_hosts(azure_devops),
            github: lowercase_hosts(github),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.providers.azure_devops, &config.providers.github)
    }

    pub fn detect(&self, remote_url: &str) -> Provider {
        let url = remote_url.to_ascii_lowercase();
        if self.azure_devops.iter().any(|host| url.contains(host.as_str())) {
            Provider::AzureDevOpsLike
        } else if self.github.iter().any(|host| url.contains(host.as_str())) {
            Provider::GitHubLike
        } else {
            Provider::Unsupported
        }
    }
}

impl Default for ProviderDetector {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

fn lowercase_hosts<I, S>(hosts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    hosts
        .into_iter()
        .map(|host| host.as_ref().trim().to_ascii_lowercase())
        .filter(|host| !host.is_empty())
        .collect()
}

/// Formatting switches for [`LinkBuilder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkOptions {
    /// Emit `#L<start>-L<end>` for multi-line GitHub selections instead of the start line only.
    pub github_line_ranges: bool,
}

impl LinkOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            github_line_ranges: config.links.github_line_ranges(),
        }
    }
}

/// Pure URL construction for the supported providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkBuilder {
    options: LinkOptions,
}

impl LinkBuilder {
    pub fn new(options: LinkOptions) -> Self {
        Self { options }
    }

    /// Build the URL for `path` at the given revision. `commit` is only read for GitHub and
    /// `branch` only for Azure DevOps.
    pub fn build(
        &self,
        provider: Provider,
        remote_url: &str,
        branch: &str,
        commit: &str,
        path: &str,
        selection: &SelectionRange,
    ) -> LinkResult<String> {
        let path = path.replace('\\', "/");
        match provider {
            Provider::AzureDevOpsLike => Ok(devops_link(remote_url, branch, &path, selection)),
            Provider::GitHubLike => Ok(self.github_link(remote_url, commit, &path, selection)),
            Provider::Unsupported => Err(LinkError::UnsupportedHost {
                url: remote_url.to_owned(),
            }),
        }
    }

    fn github_link(
        &self,
        remote_url: &str,
        commit: &str,
        path: &str,
        selection: &SelectionRange,
    ) -> String {
        let repo = browse_base(strip_git_suffix(remote_url));
        let multi_line = !selection.caret_only && selection.end_line > selection.start_line;
        if self.options.github_line_ranges && multi_line {
            format!(
                "{repo}/blob/{commit}/{path}#L{}-L{}",
                selection.start_line, selection.end_line
            )
        } else {
            format!("{repo}/blob/{commit}/{path}#L{}", selection.start_line)
        }
    }
}

fn devops_link(remote_url: &str, branch: &str, path: &str, selection: &SelectionRange) -> String {
    format!(
        "{remote_url}?path=/{path}&version={}&line={}&lineEnd={}&lineStartColumn={}&lineEndColumn={}",
        devops_version(branch),
        selection.start_line,
        selection.end_line,
        selection.start_column,
        selection.end_column,
    )
}

fn devops_version(branch: &str) -> String {
    format!("{DEVOPS_BRANCH_MARKER}{branch}")
}

/// The value identifying which version of the file a link points at.
pub fn revision_token(provider: Provider, branch: &str, commit: &str) -> Option<String> {
    match provider {
        Provider::AzureDevOpsLike => Some(devops_version(branch)),
        Provider::GitHubLike => Some(commit.to_owned()),
        Provider::Unsupported => None,
    }
}

/// Rewrite SSH remotes (`git@host:owner/repo`, `ssh://git@host/owner/repo`) to https.
fn browse_base(url: &str) -> Cow<'_, str> {
    if let Some(rest) = url.strip_prefix("ssh://") {
        let host_path = rest.split_once('@').map_or(rest, |(_, host_path)| host_path);
        let (authority, path) = host_path.split_once('/').unwrap_or((host_path, ""));
        // SSH ports mean nothing to the web front end.
        let host = authority.split_once(':').map_or(authority, |(host, _)| host);
        return Cow::Owned(format!("https://{host}/{path}"));
    }
    if !url.contains("://")
        && let Some((user_host, path)) = url.split_once(':')
    {
        let host = user_host.rsplit_once('@').map_or(user_host, |(_, host)| host);
        return Cow::Owned(format!("https://{host}/{path}"));
    }
    Cow::Borrowed(url)
}

/// Remove a single trailing `.git`, ignoring case.
fn strip_git_suffix(url: &str) -> &str {
    let Some(split) = url.len().checked_sub(GIT_SUFFIX.len()) else {
        return url;
    };
    match url.get(split..) {
        Some(tail) if tail.eq_ignore_ascii_case(GIT_SUFFIX) => &url[..split],
        _ => url,
    }
}
