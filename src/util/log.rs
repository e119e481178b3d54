use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::file_logger::{FileLogLayer, FileLogger};
use crate::config::LogSection;

/// Initialize structured logging with tracing.
///
/// Log level can be controlled via RUST_LOG env var.
/// Default level is "info". When `log.dir` is set, events are also written
/// as daily JSON files there.
pub fn init_logging(log: &LogSection) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = log.dir.as_ref().map(|dir| {
        let logger = FileLogger::new(dir.clone());
        logger.cleanup_old_logs();
        FileLogLayer::new(logger)
    });

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if log.json {
        registry
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}
