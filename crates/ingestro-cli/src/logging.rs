//! Logging setup for the CLI
//!
//! Logs go to stderr so table output on stdout stays clean. `RUST_LOG`
//! overrides the level picked from the `-v` count.

use tracing_subscriber::EnvFilter;

/// Map the number of `-v` flags to a level name
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber; call once at startup
pub fn init_logging(verbosity: u8) {
    let level = level_for_verbosity(verbosity);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Other crates stay at warn
        EnvFilter::new(format!(
            "warn,ingestro_core={level},ingestro_cli={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
