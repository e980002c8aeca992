//! Child process execution.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Captured result of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    /// Standard output with trailing newlines removed.
    pub stdout: String,
    /// Trimmed standard error.
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Returns stdout when the process succeeded and printed something meaningful.
    pub fn text(&self) -> Option<&str> {
        if self.success() && !self.stdout.trim().is_empty() {
            Some(&self.stdout)
        } else {
            None
        }
    }

    /// Human readable reason for a failed or silent run.
    pub fn failure_detail(&self) -> String {
        if !self.stderr.is_empty() {
            return self.stderr.clone();
        }
        match self.status {
            Some(0) => "no output".to_owned(),
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_owned(),
        }
    }
}

/// Runs external programs. Implementations must not involve a shell.
pub trait ProcessRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> io::Result<ProcessOutput>;
}

/// Spawns real child processes and waits for them to exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> io::Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()?;

        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout)
                .trim_end_matches(['\r', '\n'])
                .to_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}
