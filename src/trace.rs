use std::io;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable that overrides the level directives derived from
/// the command line.
pub const LOG_ENV: &str = "HDFS_STREAM_LOG";

/// Installs the global subscriber. Logs always go to stderr so a source can
/// stream samples on stdout.
pub fn init(color: bool, json: bool, levels: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(levels));

    // Ignore errors when setting, since tests can initialize this
    // multiple times.
    let _ = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(color).with_writer(io::stderr))
            .try_init()
    };
}
