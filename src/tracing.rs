//! Tracing setup for the bundled server.
//!
//! Configures structured logging with file names, line numbers, log levels, and span
//! events. The level comes from `ServerConfig::level_filter`.

use tracing_subscriber::{
    Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

pub use tracing::level_filters::LevelFilter;

/// Initializes the global tracing subscriber with formatted output.
///
/// Panics if a global subscriber is already installed.
pub fn init_tracing(level: LevelFilter) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_file(true)
                .with_line_number(true)
                .with_level(true)
                .with_filter(level),
        )
        .init();
}
