//! Tracing setup shared by the noisedose binaries.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter for interactive use: only problems reach the terminal.
pub const CLI_DEFAULT_LEVEL: &str = "warn";

/// Default filter when `--verbose` is passed.
pub const CLI_VERBOSE_LEVEL: &str = "debug";

/// Initialize logging for the command-line front end.
///
/// Log lines go to stderr so that tables written to stdout can be piped
/// into other tools untouched.
pub fn init_for_cli(verbose: bool) {
    let level = if verbose {
        CLI_VERBOSE_LEVEL
    } else {
        CLI_DEFAULT_LEVEL
    };
    init_with_level(level)
}

/// Initialize logging with a specific default level
///
/// `RUST_LOG` still wins when it is set.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Route logs through the test harness so they show up on failure only
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
