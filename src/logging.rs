//! Tracing setup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "STORYCOMIC_LOG";

/// Initialize the global tracing subscriber.
///
/// Respects `STORYCOMIC_LOG` (e.g. `debug`, `storycomic=trace,tower_http=info`);
/// falls back to `default_filter`. Safe to call more than once.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
