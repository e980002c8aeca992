//! System clipboard sink.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow, bail};

use crate::app::command::ClipboardSink;

const PREFER_PIPES: bool = cfg!(all(unix, not(target_os = "macos")));

/// Shell utility that reads clipboard contents from stdin.
#[derive(Debug, Clone, Copy)]
struct PipeCommand {
    program: &'static str,
    args: &'static [&'static str],
}

/// Writes links to the OS clipboard through arboard or the platform's clipboard utilities.
///
/// X11 and Wayland selections die with the owning process, so on those platforms the
/// forking utilities (`wl-copy`, `xclip`, `xsel`) are tried before arboard.
pub struct SystemClipboard {
    arboard: Option<arboard::Clipboard>,
    attempted: bool,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self {
            arboard: None,
            attempted: false,
        }
    }

    fn arboard(&mut self) -> Option<&mut arboard::Clipboard> {
        if !self.attempted {
            self.attempted = true;
            self.arboard = match arboard::Clipboard::new() {
                Ok(clipboard) => Some(clipboard),
                Err(err) => {
                    tracing::debug!(error = %err, "system clipboard unavailable");
                    None
                }
            };
        }
        self.arboard.as_mut()
    }

    fn copy_with_arboard(&mut self, text: &str) -> Result<()> {
        let clipboard = self
            .arboard()
            .ok_or_else(|| anyhow!("system clipboard unavailable"))?;
        clipboard
            .set_text(text.to_owned())
            .context("arboard rejected the link")
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardSink for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        if PREFER_PIPES {
            return copy_with_pipes(text)
                .or_else(|err| self.copy_with_arboard(text).map_err(|_| err));
        }
        self.copy_with_arboard(text).or_else(|err| {
            tracing::debug!(error = %err, "falling back to clipboard utilities");
            copy_with_pipes(text)
        })
    }
}

fn copy_with_pipes(text: &str) -> Result<()> {
    for command in pipe_commands() {
        match pipe_into(command, text) {
            Ok(()) => return Ok(()),
            Err(err) => {
                tracing::debug!(program = command.program, error = %err, "clipboard utility failed")
            }
        }
    }
    Err(anyhow!("no clipboard backend accepted the link"))
}

fn pipe_into(command: &PipeCommand, text: &str) -> Result<()> {
    let mut child = Command::new(command.program)
        .args(command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn {}", command.program))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .context("failed to write clipboard contents")?;
    }

    let status = child
        .wait()
        .with_context(|| format!("{} did not exit cleanly", command.program))?;
    if !status.success() {
        bail!("{} exited with status {status}", command.program);
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn pipe_commands() -> &'static [PipeCommand] {
    &[PipeCommand {
        program: "pbcopy",
        args: &[],
    }]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn pipe_commands() -> &'static [PipeCommand] {
    &[
        PipeCommand {
            program: "wl-copy",
            args: &[],
        },
        PipeCommand {
            program: "xclip",
            args: &["-selection", "clipboard"],
        },
        PipeCommand {
            program: "xsel",
            args: &["--clipboard", "--input"],
        },
    ]
}

#[cfg(target_os = "windows")]
fn pipe_commands() -> &'static [PipeCommand] {
    &[PipeCommand {
        program: "clip.exe",
        args: &[],
    }]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn pipe_commands() -> &'static [PipeCommand] {
    &[]
}
