//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::infra::git::DEFAULT_GIT_BINARY;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".repolink/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub git: Git,
    #[serde(default)]
    pub providers: Providers,
    #[serde(default)]
    pub links: Links,
    #[serde(default)]
    pub output: Output,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Git {
    #[serde(default = "Git::default_binary")]
    pub binary: String,
}

impl Git {
    fn default_binary() -> String {
        DEFAULT_GIT_BINARY.to_owned()
    }
}

impl Default for Git {
    fn default() -> Self {
        Self {
            binary: Self::default_binary(),
        }
    }
}

/// Host substrings recognised for each provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Providers {
    #[serde(default)]
    pub azure_devops: Vec<String>,
    #[serde(default)]
    pub github: Vec<String>,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            azure_devops: vec!["visualstudio.com".into(), "dev.azure.com".into()],
            github: vec!["github.com".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Links {
    #[serde(default)]
    github_line_ranges: Option<bool>,
}

impl Links {
    pub fn github_line_ranges(&self) -> bool {
        self.github_line_ranges.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Output {
    #[serde(default)]
    copy_to_clipboard: Option<bool>,
}

impl Output {
    fn default_copy_to_clipboard() -> bool {
        true
    }

    pub fn copy_to_clipboard(&self) -> bool {
        self.copy_to_clipboard
            .unwrap_or_else(Self::default_copy_to_clipboard)
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    git_binary: Option<String>,
    copy_to_clipboard: Option<bool>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            git_binary: env::var("REPOLINK_GIT_BIN")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            copy_to_clipboard: env::var("REPOLINK_COPY")
                .ok()
                .and_then(|value| parse_flag(&value)),
        }
    }

    #[cfg(test)]
    fn for_tests(git_binary: &str, copy_to_clipboard: bool) -> Self {
        Self {
            git_binary: Some(git_binary.to_owned()),
            copy_to_clipboard: Some(copy_to_clipboard),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let cwd = env::current_dir().context("failed to resolve working directory")?;
        Self::load_for(&cwd)
    }

    /// Like [`Config::load`], with the workspace layer taken from the repository enclosing
    /// `directory` rather than the working directory.
    pub fn load_for(directory: &Path) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path(directory);
        Self::load_with_layers(global, Some(workspace), env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        let mut effective = self.clone();
        effective.links.github_line_ranges = Some(self.links.github_line_ranges());
        effective.output.copy_to_clipboard = Some(self.output.copy_to_clipboard());
        toml::to_string_pretty(&effective).context("failed to serialize config")
    }

    fn merge(self, other: Self) -> Self {
        Self {
            git: merge_git(self.git, other.git),
            providers: merge_providers(self.providers, other.providers),
            links: merge_links(self.links, other.links),
            output: merge_output(self.output, other.output),
        }
    }
}

fn merge_git(base: Git, overlay: Git) -> Git {
    Git {
        binary: if overlay.binary != Git::default_binary() {
            overlay.binary
        } else {
            base.binary
        },
    }
}

fn merge_providers(base: Providers, overlay: Providers) -> Providers {
    let mut azure_devops: BTreeSet<String> = base.azure_devops.into_iter().collect();
    azure_devops.extend(overlay.azure_devops);

    let mut github: BTreeSet<String> = base.github.into_iter().collect();
    github.extend(overlay.github);

    Providers {
        azure_devops: azure_devops.into_iter().collect(),
        github: github.into_iter().collect(),
    }
}

fn merge_links(mut base: Links, overlay: Links) -> Links {
    if let Some(value) = overlay.github_line_ranges {
        base.github_line_ranges = Some(value);
    }
    base
}

fn merge_output(mut base: Output, overlay: Output) -> Output {
    if let Some(value) = overlay.copy_to_clipboard {
        base.copy_to_clipboard = Some(value);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("repolink/config.toml"))
}

fn workspace_config_path(start: &Path) -> PathBuf {
    find_repo_root(start)
        .unwrap_or_else(|| start.to_path_buf())
        .join(DEFAULT_WORKSPACE_CONFIG_PATH)
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(binary) = env.git_binary {
        config.git.binary = binary;
    }
    if let Some(copy) = env.copy_to_clipboard {
        config.output.copy_to_clipboard = Some(copy);
    }
    config
}
