//! Formatting macros for any [`Log`](crate::Log) implementor.
//!
//! Each macro formats its arguments like `format!` and evaluates to the
//! `Result` of the emit, so a stopped logger can still be detected.
//!
//! # Examples
//!
//! ```
//! use styled_logger::prelude::*;
//! use styled_logger::info;
//!
//! let logger = SyncLogger::new(LoggerConfig::new("GPIO")).unwrap();
//!
//! info!(logger, "GPIO handler started").unwrap();
//!
//! let pin = 4;
//! info!(logger, "pin {} configured as {}", pin, "input").unwrap();
//! ```

/// Log at an explicit level.
///
/// # Examples
///
/// ```
/// # use styled_logger::prelude::*;
/// # let logger = SyncLogger::new(LoggerConfig::new("APP")).unwrap();
/// use styled_logger::log;
/// log!(logger, LogLevel::Info, "Simple message").unwrap();
/// log!(logger, LogLevel::Error, "Error code: {}", 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        use $crate::Log as _;
        $logger.log_fmt($level, format_args!($($arg)+))
    }};
}

/// Log a debug-level message; dropped unless debug output is enabled.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::Log as _;
        $logger.debug_fmt(format_args!($($arg)+))
    }};
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use styled_logger::prelude::*;
/// # let logger = SyncLogger::new(LoggerConfig::new("APP")).unwrap();
/// use styled_logger::info;
/// info!(logger, "Processing {} items", 100).unwrap();
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::Log as _;
        $logger.info_fmt(format_args!($($arg)+))
    }};
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::Log as _;
        $logger.warn_fmt(format_args!($($arg)+))
    }};
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::Log as _;
        $logger.error_fmt(format_args!($($arg)+))
    }};
}

/// Log a panic-level message, wait for delivery, then panic.
///
/// # Examples
///
/// ```should_panic
/// # use styled_logger::prelude::*;
/// # let logger = SyncLogger::new(LoggerConfig::new("APP")).unwrap();
/// use styled_logger::panic_log;
/// panic_log!(logger, "invariant broken: {}", "queue empty");
/// ```
#[macro_export]
macro_rules! panic_log {
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::Log as _;
        $logger.panic_fmt(format_args!($($arg)+))
    }};
}

/// Log a fatal-level message, wait for delivery, then exit with status 1.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::Log as _;
        $logger.fatal_fmt(format_args!($($arg)+))
    }};
}
