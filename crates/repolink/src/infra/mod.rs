//! Infrastructure adapters for processes, git, config, and host integrations.

pub mod clipboard;
pub mod config;
pub mod git;
pub mod logging;
pub mod notify;
pub mod process;
