//! Structured logging configuration.

use tracing::Level;

/// Tracing subscriber configuration
pub struct TracingConfig {
    /// Log level (default: INFO)
    pub level: Level,
    /// Enable JSON output format
    pub json_format: bool,
    /// Include file and line numbers in logs
    pub include_location: bool,
    /// Include thread IDs in logs
    pub include_thread_ids: bool,
    /// Include target module in logs
    pub include_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            include_location: true,
            include_thread_ids: true,
            include_target: false,
        }
    }
}

impl TracingConfig {
    /// Initialize the global tracing subscriber with this configuration
    pub fn init(self) {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;
        use tracing_subscriber::prelude::*;

        // Allow RUST_LOG to override the default level
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.to_string()));

        if self.json_format {
            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .json()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_thread_ids(self.include_thread_ids)
                    .with_target(self.include_target),
            );
            subscriber.init();
        } else {
            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_thread_ids(self.include_thread_ids)
                    .with_target(self.include_target),
            );
            subscriber.init();
        }
    }
}
