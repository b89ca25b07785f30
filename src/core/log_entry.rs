//! Log entry structure

use super::log_level::LogLevel;
use super::timestamp::format_line_timestamp;
use chrono::{DateTime, Local};

/// Minimum width of the tag inside its brackets
pub const TAG_WIDTH: usize = 7;

/// Bracket a tag after padding it with spaces to [`TAG_WIDTH`]
///
/// Longer tags are kept whole.
pub fn format_tag(tag: &str) -> String {
    format!("[{:<width$}]", tag, width = TAG_WIDTH)
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so one entry always occupies exactly one line of the log file.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl AsRef<str>) -> Self {
        Self::at(level, message, Local::now())
    }

    pub fn at(level: LogLevel, message: impl AsRef<str>, timestamp: DateTime<Local>) -> Self {
        Self {
            level,
            message: Self::sanitize_message(message.as_ref()),
            timestamp,
        }
    }

    /// `[YYYY-MM-DD HH:MM:SS.mmm] [LEVEL] <display_tag>: message`
    ///
    /// `display_tag` is the already bracketed output of [`format_tag`].
    pub fn render(&self, display_tag: &str) -> String {
        format!(
            "[{}] [{}] {}: {}",
            format_line_timestamp(&self.timestamp),
            self.level.key(),
            display_tag,
            self.message
        )
    }
}
