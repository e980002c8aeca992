//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "REPOLINK_LOG";

/// Install the global subscriber. Logs go to stderr so stdout only carries the link.
///
/// `-v` flags win over `REPOLINK_LOG`; without either only warnings are shown.
pub fn init(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        level => EnvFilter::new(directive(level)),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
