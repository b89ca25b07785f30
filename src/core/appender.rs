//! Appender trait for log output destinations

use super::error::Result;

/// A destination for fully formatted log lines
///
/// `line` never carries a trailing newline; appenders add their own line ending.
pub trait Appender: Send {
    fn append(&mut self, line: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
