//! # Styled Logger
//!
//! Leveled, styled logging to the console and to date-stamped files.
//!
//! ## Features
//!
//! - **Two loggers**: [`SyncLogger`] writes on the calling thread,
//!   [`AsyncLogger`] hands lines to one consumer thread per sink
//! - **ANSI styling**: per-level SGR attribute lists, console only
//! - **Daily files**: `<dir>/<YYYY-MM-DD>:<name>.txt`, reopened by a rotation timer
//! - **Terminal levels**: `panic` and `fatal` deliver their line before unwinding or exiting
//!
//! ## Example
//!
//! ```
//! use styled_logger::prelude::*;
//!
//! let logger = SyncLogger::new(LoggerConfig::new("GPIO")).unwrap();
//! logger.info("GPIO handler started").unwrap();
//! styled_logger::warn!(logger, "pin {} floating", 7).unwrap();
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, FileSink};
    pub use crate::core::{
        AsyncLogger, FileConfig, Log, LogLevel, LoggerConfig, LoggerError, LoggerMetrics,
        LoggerState, Result, RotationSchedule, Style, StyleSet, SyncLogger,
    };
}

pub use appenders::{ConsoleAppender, FileSink};
pub use core::{
    apply_style, default_error_handler, format_tag, Appender, AsyncLogger, ErrorHandler,
    FileConfig, Log, LogEntry, LogLevel, LoggerConfig, LoggerError, LoggerMetrics, LoggerState,
    Result, RotationSchedule, RotationTimer, SharedFileSink, Style, StyleSet, SyncLogger,
    DEFAULT_QUEUE_CAPACITY,
};
