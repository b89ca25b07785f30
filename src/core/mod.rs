//! Core logger types and traits

pub mod appender;
pub mod async_logger;
pub mod config;
pub mod error;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod rotation;
pub mod style;
pub mod sync_logger;
pub mod timestamp;

pub use appender::Appender;
pub use async_logger::{AsyncLogger, LoggerState};
pub use config::{FileConfig, LoggerConfig, DEFAULT_QUEUE_CAPACITY};
pub use error::{default_error_handler, ErrorHandler, LoggerError, Result};
pub use log_entry::{format_tag, LogEntry};
pub use log_level::LogLevel;
pub use logger::Log;
pub use metrics::LoggerMetrics;
pub use rotation::{RotationSchedule, RotationTimer, SharedFileSink};
pub use style::{apply_style, Style, StyleSet};
pub use sync_logger::SyncLogger;
