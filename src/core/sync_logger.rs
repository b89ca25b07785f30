//! Logger that writes on the calling thread

use super::{
    config::LoggerConfig,
    error::Result,
    log_level::LogLevel,
    logger::{deliver, flush_reporting, logger_settings, ConsoleWriter, FileWriter, Log, LoggerCore},
};
use crate::appenders::ConsoleAppender;
use parking_lot::Mutex;
use std::sync::Arc;

struct Sinks {
    file: FileWriter,
    console: ConsoleWriter,
}

/// Formats and writes each line before the emit call returns
///
/// The file line (if file output is on) is written first, then the styled
/// line is printed. Both sinks are written under one lock, so concurrent
/// callers see the same order in the file and on the console.
///
/// # Example
///
/// ```
/// use styled_logger::prelude::*;
///
/// let logger = SyncLogger::new(LoggerConfig::new("GPIO").debug(true)).unwrap();
/// logger.info("GPIO handler started").unwrap();
/// logger.debug_fmt(format_args!("pin {} high", 4)).unwrap();
/// ```
pub struct SyncLogger {
    core: LoggerCore,
    sinks: Mutex<Sinks>,
}

impl SyncLogger {
    /// Build a logger printing to stdout
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or its file cannot be opened
    pub fn new(config: LoggerConfig) -> Result<Self> {
        Self::with_console(config, ConsoleAppender::new())
    }

    /// Build a logger printing to `console`
    pub fn with_console(config: LoggerConfig, console: ConsoleAppender) -> Result<Self> {
        let core = LoggerCore::from_config(config)?;
        let sinks = Sinks {
            file: FileWriter::new(Arc::clone(&core.file), Arc::clone(&core.metrics)),
            console: ConsoleWriter::new(console, Arc::clone(&core.metrics)),
        };

        Ok(Self {
            core,
            sinks: Mutex::new(sinks),
        })
    }
}

logger_settings!(SyncLogger);

impl Log for SyncLogger {
    fn log(&self, level: LogLevel, message: String) -> Result<()> {
        let Some((raw, styled)) = self.core.prepare(level, &message) else {
            return Ok(());
        };

        let mut sinks = self.sinks.lock();
        deliver(&mut sinks.file, &raw, &self.core.metrics, &self.core.on_error);
        deliver(&mut sinks.console, &styled, &self.core.metrics, &self.core.on_error);
        self.core.metrics.record_logged();
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        let mut sinks = self.sinks.lock();
        flush_reporting(&mut sinks.file, &self.core.on_error);
        flush_reporting(&mut sinks.console, &self.core.on_error);
        Ok(())
    }
}

impl Drop for SyncLogger {
    fn drop(&mut self) {
        self.core.stop_rotation();
        let _ = self.sync();
    }
}
