//! Terminal status messages.

use std::io::{self, Write};

use crate::app::command::NotificationSink;

/// Writes one status line per notification, prefixed with the program name.
pub struct TerminalNotifier<W: Write = io::Stderr> {
    out: W,
}

impl TerminalNotifier<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> NotificationSink for TerminalNotifier<W> {
    fn notify(&mut self, message: &str) {
        if let Err(err) = writeln!(self.out, "repolink: {message}") {
            tracing::warn!(error = %err, "failed to write notification");
        }
    }
}
