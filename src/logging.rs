// src/logging.rs
// =============================================================================
// Diagnostics go through `tracing` and are written to stderr, so stdout only
// ever carries the summary (which may be piped as JSON).
//
// RUST_LOG wins when set; otherwise -v flags pick the level.
// =============================================================================

use tracing_subscriber::EnvFilter;

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("resource_sentinel={}", level_for(verbosity))));

    // try_init: a second initialization (tests) is not an error worth dying for
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
