use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, util::TryInitError};

/// Install the stderr subscriber. `-v` repetitions raise the level from WARN.
pub fn setup_logging(verbosity: u8, quiet: bool) -> Result<(), TryInitError> {
    let level_filter = if quiet {
        LevelFilter::OFF
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .compact();

    tracing_subscriber::registry()
        .with(level_filter)
        .with(stderr_layer)
        .try_init()
}
