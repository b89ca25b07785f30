//! Emit API and the state both logger variants share

use super::{
    appender::Appender,
    config::{FileConfig, LoggerConfig},
    error::{default_error_handler, ErrorHandler, LoggerError, Result},
    log_entry::{format_tag, LogEntry},
    log_level::LogLevel,
    metrics::LoggerMetrics,
    rotation::{rotate_shared, RotationSchedule, RotationTimer, SharedFileSink},
    style::{apply_style, Style, StyleSet},
};
use crate::appenders::{ConsoleAppender, FileSink};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Leveled emit operations
///
/// Implementors provide [`Log::log`] and [`Log::sync`]; every per-level
/// method is built on those two.
///
/// `Debug` lines are dropped entirely unless the logger was built with
/// debug output enabled. `panic` and `fatal` make their line visible on
/// every sink before unwinding or exiting.
pub trait Log {
    /// Format `message` at `level` and hand it to the sinks
    fn log(&self, level: LogLevel, message: String) -> Result<()>;

    /// Block until every line logged so far has been written and flushed
    fn sync(&self) -> Result<()>;

    fn log_fmt(&self, level: LogLevel, args: fmt::Arguments<'_>) -> Result<()> {
        self.log(level, fmt::format(args))
    }

    #[inline]
    fn info(&self, message: impl Into<String>) -> Result<()>
    where
        Self: Sized,
    {
        self.log(LogLevel::Info, message.into())
    }

    #[inline]
    fn info_fmt(&self, args: fmt::Arguments<'_>) -> Result<()> {
        self.log_fmt(LogLevel::Info, args)
    }

    #[inline]
    fn warn(&self, message: impl Into<String>) -> Result<()>
    where
        Self: Sized,
    {
        self.log(LogLevel::Warn, message.into())
    }

    #[inline]
    fn warn_fmt(&self, args: fmt::Arguments<'_>) -> Result<()> {
        self.log_fmt(LogLevel::Warn, args)
    }

    #[inline]
    fn error(&self, message: impl Into<String>) -> Result<()>
    where
        Self: Sized,
    {
        self.log(LogLevel::Error, message.into())
    }

    #[inline]
    fn error_fmt(&self, args: fmt::Arguments<'_>) -> Result<()> {
        self.log_fmt(LogLevel::Error, args)
    }

    #[inline]
    fn debug(&self, message: impl Into<String>) -> Result<()>
    where
        Self: Sized,
    {
        self.log(LogLevel::Debug, message.into())
    }

    #[inline]
    fn debug_fmt(&self, args: fmt::Arguments<'_>) -> Result<()> {
        self.log_fmt(LogLevel::Debug, args)
    }

    /// Log at `Panic`, wait for delivery, then panic with `message`
    fn panic(&self, message: impl Into<String>) -> !
    where
        Self: Sized,
    {
        let message = message.into();
        deliver_terminal(self, LogLevel::Panic, &message);
        panic!("{}", message);
    }

    fn panic_fmt(&self, args: fmt::Arguments<'_>) -> !
    where
        Self: Sized,
    {
        self.panic(fmt::format(args))
    }

    /// Log at `Fatal`, wait for delivery, then exit the process with status 1
    fn fatal(&self, message: impl Into<String>) -> !
    where
        Self: Sized,
    {
        let message = message.into();
        deliver_terminal(self, LogLevel::Fatal, &message);
        std::process::exit(1);
    }

    fn fatal_fmt(&self, args: fmt::Arguments<'_>) -> !
    where
        Self: Sized,
    {
        self.fatal(fmt::format(args))
    }
}

/// Last-resort path for panic/fatal: stderr gets the message if the logger can't deliver it
fn deliver_terminal<L: Log + ?Sized>(logger: &L, level: LogLevel, message: &str) {
    if let Err(e) = logger
        .log(level, message.to_string())
        .and_then(|_| logger.sync())
    {
        eprintln!("[LOGGER ERROR] {} line not delivered ({}): {}", level, e, message);
    }
}

/// Hand `line` to `appender`; failures are counted and reported, never propagated
pub(crate) fn deliver(
    appender: &mut dyn Appender,
    line: &str,
    metrics: &LoggerMetrics,
    on_error: &ErrorHandler,
) {
    if let Err(e) = appender.append(line) {
        metrics.record_write_failure();
        on_error(&e);
    }
}

pub(crate) fn flush_reporting(appender: &mut dyn Appender, on_error: &ErrorHandler) {
    if let Err(e) = appender.flush() {
        on_error(&e);
    }
}

/// Console sink that counts what it writes
pub(crate) struct ConsoleWriter {
    console: ConsoleAppender,
    metrics: Arc<LoggerMetrics>,
}

impl ConsoleWriter {
    pub(crate) fn new(console: ConsoleAppender, metrics: Arc<LoggerMetrics>) -> Self {
        Self { console, metrics }
    }
}

impl Appender for ConsoleWriter {
    fn append(&mut self, line: &str) -> Result<()> {
        self.console.append(line)?;
        self.metrics.record_console_line();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.console.flush()
    }

    fn name(&self) -> &str {
        self.console.name()
    }
}

/// Writer side of the shared file sink
///
/// Lines are dropped silently while no file is configured or writing is disabled.
pub(crate) struct FileWriter {
    sink: SharedFileSink,
    metrics: Arc<LoggerMetrics>,
}

impl FileWriter {
    pub(crate) fn new(sink: SharedFileSink, metrics: Arc<LoggerMetrics>) -> Self {
        Self { sink, metrics }
    }
}

impl Appender for FileWriter {
    fn append(&mut self, line: &str) -> Result<()> {
        let mut guard = self.sink.lock();
        match guard.as_mut() {
            Some(sink) if sink.is_write_enabled() => {
                sink.write(line)?;
                self.metrics.record_file_line();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self.sink.lock().as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Formatting state, styles, file sink and rotation shared by both loggers
pub(crate) struct LoggerCore {
    tag: String,
    display_tag: String,
    debug: AtomicBool,
    styles: RwLock<StyleSet>,
    pub(crate) metrics: Arc<LoggerMetrics>,
    pub(crate) on_error: ErrorHandler,
    pub(crate) file: SharedFileSink,
    rotation: Mutex<Option<RotationTimer>>,
}

impl LoggerCore {
    /// Validate `config`, open its file sink and start its rotation timer
    pub(crate) fn from_config(config: LoggerConfig) -> Result<Self> {
        config.validate()?;

        let core = Self {
            display_tag: format_tag(&config.tag),
            tag: config.tag,
            debug: AtomicBool::new(config.debug),
            styles: RwLock::new(config.styles),
            metrics: Arc::new(LoggerMetrics::new()),
            on_error: config.on_error.unwrap_or_else(default_error_handler),
            file: Arc::new(Mutex::new(None)),
            rotation: Mutex::new(None),
        };

        if let Some(file) = config.file {
            core.set_file_output(file)?;
        }
        if let Some(schedule) = config.rotation {
            core.start_rotation(schedule)?;
        }

        Ok(core)
    }

    /// Unstyled and styled renderings of one line, or `None` when suppressed
    ///
    /// Callers count the line with `record_logged` once a sink has accepted it.
    pub(crate) fn prepare(&self, level: LogLevel, message: &str) -> Option<(String, String)> {
        if level == LogLevel::Debug && !self.debug_enabled() {
            self.metrics.record_suppressed_debug();
            return None;
        }

        let raw = LogEntry::new(level, message).render(&self.display_tag);
        let styled = apply_style(&raw, self.styles.read().get(level));
        Some((raw, styled))
    }

    pub(crate) fn tag(&self) -> &str {
        &self.tag
    }

    pub(crate) fn display_tag(&self) -> &str {
        &self.display_tag
    }

    pub(crate) fn debug_enabled(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub(crate) fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn set_style(&self, level: LogLevel, styles: &[Style]) {
        self.styles.write().set(level, styles);
    }

    pub(crate) fn set_styles(&self, styles: StyleSet) {
        *self.styles.write() = styles;
    }

    pub(crate) fn styles(&self) -> StyleSet {
        self.styles.read().clone()
    }

    /// Replace the file sink
    ///
    /// The previous file is closed before the new one is opened. If opening
    /// fails, file output stays off until a later call succeeds.
    pub(crate) fn set_file_output(&self, file: FileConfig) -> Result<()> {
        let mut guard = self.file.lock();
        drop(guard.take());

        let mut sink = FileSink::open(file.logical_name, &file.directory)?
            .with_compression(file.compress_rotated);
        sink.set_write_enabled(file.enabled);
        *guard = Some(sink);
        Ok(())
    }

    pub(crate) fn set_file_write_enabled(&self, enabled: bool) -> Result<()> {
        match self.file.lock().as_mut() {
            Some(sink) => {
                sink.set_write_enabled(enabled);
                Ok(())
            }
            None if !enabled => Ok(()),
            None => Err(LoggerError::config(
                "FileSink",
                "no file output configured; call set_file_output first",
            )),
        }
    }

    pub(crate) fn file_path(&self) -> Option<std::path::PathBuf> {
        self.file.lock().as_ref().map(|s| s.path().to_path_buf())
    }

    pub(crate) fn start_rotation(&self, schedule: RotationSchedule) -> Result<()> {
        let file_ready = self
            .file
            .lock()
            .as_ref()
            .is_some_and(|s| s.is_write_enabled());
        if !file_ready {
            return Err(LoggerError::RotationWithoutFile);
        }

        let mut slot = self.rotation.lock();
        if let Some(mut previous) = slot.take() {
            previous.cancel();
        }
        *slot = Some(RotationTimer::start(
            schedule,
            Arc::clone(&self.file),
            Arc::clone(&self.metrics),
            Arc::clone(&self.on_error),
        )?);
        Ok(())
    }

    pub(crate) fn stop_rotation(&self) {
        if let Some(mut timer) = self.rotation.lock().take() {
            timer.cancel();
        }
    }

    pub(crate) fn rotation_schedule(&self) -> Option<RotationSchedule> {
        self.rotation.lock().as_ref().map(|t| t.schedule())
    }

    pub(crate) fn rotate_now(&self) -> Result<()> {
        rotate_shared(&self.file, &self.metrics)
    }
}

/// Configuration methods shared by both logger types, delegating to their `core`
macro_rules! logger_settings {
    ($logger:ty) => {
        impl $logger {
            /// Tag as given in the configuration
            pub fn tag(&self) -> &str {
                self.core.tag()
            }

            /// Bracketed, padded tag as it appears in each line
            pub fn display_tag(&self) -> &str {
                self.core.display_tag()
            }

            pub fn debug_enabled(&self) -> bool {
                self.core.debug_enabled()
            }

            pub fn set_debug(&self, enabled: bool) {
                self.core.set_debug(enabled);
            }

            /// Replace the style list used for `level`
            pub fn set_style(&self, level: $crate::core::LogLevel, styles: &[$crate::core::Style]) {
                self.core.set_style(level, styles);
            }

            pub fn set_info_style(&self, styles: &[$crate::core::Style]) {
                self.set_style($crate::core::LogLevel::Info, styles);
            }

            pub fn set_warn_style(&self, styles: &[$crate::core::Style]) {
                self.set_style($crate::core::LogLevel::Warn, styles);
            }

            pub fn set_error_style(&self, styles: &[$crate::core::Style]) {
                self.set_style($crate::core::LogLevel::Error, styles);
            }

            pub fn set_debug_style(&self, styles: &[$crate::core::Style]) {
                self.set_style($crate::core::LogLevel::Debug, styles);
            }

            pub fn set_panic_style(&self, styles: &[$crate::core::Style]) {
                self.set_style($crate::core::LogLevel::Panic, styles);
            }

            pub fn set_fatal_style(&self, styles: &[$crate::core::Style]) {
                self.set_style($crate::core::LogLevel::Fatal, styles);
            }

            /// Restore the default style of every level
            pub fn set_default_style(&self) {
                self.core.set_styles($crate::core::StyleSet::default_styles());
            }

            pub fn styles(&self) -> $crate::core::StyleSet {
                self.core.styles()
            }

            /// Point file output at a new directory and logical name
            ///
            /// # Errors
            ///
            /// Returns error if the directory or file cannot be created
            pub fn set_file_output(&self, file: $crate::core::FileConfig) -> $crate::core::Result<()> {
                self.core.set_file_output(file)
            }

            /// Pause or resume file writes without closing the file
            pub fn set_file_write_enabled(&self, enabled: bool) -> $crate::core::Result<()> {
                self.core.set_file_write_enabled(enabled)
            }

            /// Path of the file currently written, if any
            pub fn file_path(&self) -> Option<std::path::PathBuf> {
                self.core.file_path()
            }

            /// Start (or replace) the rotation timer
            ///
            /// # Errors
            ///
            /// `LoggerError::RotationWithoutFile` unless file writing is enabled
            pub fn start_rotation(&self, schedule: $crate::core::RotationSchedule) -> $crate::core::Result<()> {
                self.core.start_rotation(schedule)
            }

            pub fn stop_rotation(&self) {
                self.core.stop_rotation();
            }

            pub fn rotation_schedule(&self) -> Option<$crate::core::RotationSchedule> {
                self.core.rotation_schedule()
            }

            /// Rotate the file sink now, outside the schedule
            pub fn rotate_now(&self) -> $crate::core::Result<()> {
                self.core.rotate_now()
            }

            pub fn metrics(&self) -> &$crate::core::LoggerMetrics {
                &self.core.metrics
            }
        }
    };
}

pub(crate) use logger_settings;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_prepare_formats_and_styles() {
        let core = LoggerCore::from_config(
            LoggerConfig::new("GPIO").styles(StyleSet::plain().with(LogLevel::Info, &[Style::FgGreen])),
        )
        .unwrap();

        let (raw, styled) = core.prepare(LogLevel::Info, "started").unwrap();
        assert!(raw.ends_with("] [INFO ] [GPIO   ]: started"));
        assert_eq!(styled, format!("\x1b[32m{}\x1b[0m", raw));

        let (raw, styled) = core.prepare(LogLevel::Warn, "unstyled").unwrap();
        assert_eq!(raw, styled);
        assert_eq!(core.metrics.total_logged(), 0);
    }

    #[test]
    fn test_prepare_gates_debug() {
        let core = LoggerCore::from_config(LoggerConfig::new("T")).unwrap();
        assert!(core.prepare(LogLevel::Debug, "hidden").is_none());
        assert_eq!(core.metrics.suppressed_debug(), 1);
        assert_eq!(core.metrics.total_logged(), 0);

        core.set_debug(true);
        assert!(core.prepare(LogLevel::Debug, "shown").is_some());
    }

    #[test]
    fn test_rotation_requires_file() {
        let core = LoggerCore::from_config(LoggerConfig::new("T")).unwrap();
        assert!(matches!(
            core.start_rotation(RotationSchedule::daily(0, 0)),
            Err(LoggerError::RotationWithoutFile)
        ));
    }

    #[test]
    fn test_file_writer_respects_enable_flag() {
        let dir = tempdir().unwrap();
        let core = LoggerCore::from_config(
            LoggerConfig::new("T").file(FileConfig::new(dir.path(), "CORE")),
        )
        .unwrap();
        let mut writer = FileWriter::new(Arc::clone(&core.file), Arc::clone(&core.metrics));

        writer.append("kept").unwrap();
        core.set_file_write_enabled(false).unwrap();
        writer.append("skipped").unwrap();

        let content = std::fs::read_to_string(core.file_path().unwrap()).unwrap();
        assert_eq!(content, "kept\n");
        assert_eq!(core.metrics.file_lines(), 1);
    }

    #[test]
    fn test_enable_without_file_is_error() {
        let core = LoggerCore::from_config(LoggerConfig::new("T")).unwrap();
        assert!(core.set_file_write_enabled(true).is_err());
        assert!(core.set_file_write_enabled(false).is_ok());
    }

    #[test]
    fn test_deliver_reports_failures() {
        struct Broken;
        impl Appender for Broken {
            fn append(&mut self, _line: &str) -> Result<()> {
                Err(LoggerError::other("disk gone"))
            }
            fn flush(&mut self) -> Result<()> {
                Ok(())
            }
            fn name(&self) -> &str {
                "broken"
            }
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let handler: ErrorHandler = Arc::new(move |e| seen_clone.lock().push(e.to_string()));
        let metrics = LoggerMetrics::new();

        deliver(&mut Broken, "a", &metrics, &handler);
        deliver(&mut Broken, "b", &metrics, &handler);

        assert_eq!(metrics.write_failures(), 2);
        assert_eq!(seen.lock().as_slice(), ["disk gone", "disk gone"]);
    }
}
