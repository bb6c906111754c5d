//! Trace output setup
//!
//! Maps the numeric trace level of `undolog.toml` onto a `tracing` level
//! filter and installs a formatting subscriber. Installation is attempted
//! once per process; later calls, or a subscriber installed by the host
//! application, win silently.

use tracing::level_filters::LevelFilter;

/// Level filter for a numeric trace level.
///
/// | level | filter |
/// |-------|--------|
/// | 0     | off    |
/// | 1     | warn   |
/// | 2     | info   |
/// | 3     | debug  |
/// | 4+    | trace  |
pub fn level_filter(trace_level: u8) -> LevelFilter {
    match trace_level {
        0 => LevelFilter::OFF,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        3 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install a fmt subscriber at `trace_level`.
///
/// Returns whether this call installed the global subscriber.
pub fn init(trace_level: u8) -> bool {
    if trace_level == 0 {
        return false;
    }
    tracing_subscriber::fmt()
        .with_max_level(level_filter(trace_level))
        .with_target(true)
        .try_init()
        .is_ok()
}
