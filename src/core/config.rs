//! Logger configuration
//!
//! Every logger is built from its own [`LoggerConfig`]; there is no
//! process-wide logging state shared between instances.

use super::error::{ErrorHandler, LoggerError, Result};
use super::rotation::RotationSchedule;
use super::style::StyleSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Where and whether lines are persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub directory: PathBuf,
    pub logical_name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub compress_rotated: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl FileConfig {
    pub fn new(directory: impl Into<PathBuf>, logical_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            logical_name: logical_name.into(),
            enabled: true,
            compress_rotated: false,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn compress_rotated(mut self, compress: bool) -> Self {
        self.compress_rotated = compress;
        self
    }
}

/// Configuration shared by [`SyncLogger`](crate::SyncLogger) and [`AsyncLogger`](crate::AsyncLogger)
///
/// # Example
///
/// ```
/// use styled_logger::{FileConfig, LoggerConfig, RotationSchedule, StyleSet};
///
/// let config = LoggerConfig::new("GPIO")
///     .debug(true)
///     .queue_capacity(100)
///     .styles(StyleSet::default_styles())
///     .file(FileConfig::new("/tmp/logs", "GATE01"))
///     .rotation(RotationSchedule::daily(0, 0));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub tag: String,
    pub debug: bool,
    /// Depth of each async queue; ignored by the synchronous logger
    pub queue_capacity: usize,
    pub styles: StyleSet,
    pub file: Option<FileConfig>,
    pub rotation: Option<RotationSchedule>,
    #[serde(skip)]
    pub on_error: Option<ErrorHandler>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            tag: "APP".to_string(),
            debug: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            styles: StyleSet::default_styles(),
            file: None,
            rotation: None,
            on_error: None,
        }
    }
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("tag", &self.tag)
            .field("debug", &self.debug)
            .field("queue_capacity", &self.queue_capacity)
            .field("styles", &self.styles)
            .field("file", &self.file)
            .field("rotation", &self.rotation)
            .field("on_error", &self.on_error.as_ref().map(|_| "<handler>"))
            .finish()
    }
}

impl LoggerConfig {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn styles(mut self, styles: StyleSet) -> Self {
        self.styles = styles;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn file(mut self, file: FileConfig) -> Self {
        self.file = Some(file);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn rotation(mut self, schedule: RotationSchedule) -> Self {
        self.rotation = Some(schedule);
        self
    }

    /// Receive write and rotation failures instead of the stderr default
    #[must_use = "builder methods return a new value"]
    pub fn on_error(mut self, handler: ErrorHandler) -> Self {
        self.on_error = Some(handler);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LoggerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "read logger config",
                format!("Failed to read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(LoggerError::config("LoggerConfig", "queue_capacity must be at least 1"));
        }

        if let Some(file) = &self.file {
            if file.logical_name.trim().is_empty() {
                return Err(LoggerError::config("FileConfig", "logical_name must not be empty"));
            }
            if file.logical_name.contains(['/', '\\']) {
                return Err(LoggerError::config(
                    "FileConfig",
                    "logical_name must not contain path separators",
                ));
            }
        }

        if let Some(schedule) = &self.rotation {
            schedule.validate()?;
            if !self.file.as_ref().is_some_and(|f| f.enabled) {
                return Err(LoggerError::RotationWithoutFile);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::style::Style;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.tag, "APP");
        assert!(!config.debug);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.styles, StyleSet::default_styles());
        assert!(config.file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = LoggerConfig::new("X").queue_capacity(0).validate().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_rotation_requires_enabled_file() {
        let config = LoggerConfig::new("X").rotation(RotationSchedule::daily(0, 0));
        assert!(matches!(config.validate(), Err(LoggerError::RotationWithoutFile)));

        let config = config.file(FileConfig::new("/tmp", "X").enabled(false));
        assert!(matches!(config.validate(), Err(LoggerError::RotationWithoutFile)));
    }

    #[test]
    fn test_logical_name_checked() {
        let config = LoggerConfig::new("X").file(FileConfig::new("/tmp", "a/b"));
        assert!(config.validate().is_err());
        let config = LoggerConfig::new("X").file(FileConfig::new("/tmp", "  "));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "tag": "GPIO",
            "debug": true,
            "queue_capacity": 10,
            "styles": { "info": ["FgGreen"], "error": ["FontBold", "FgRed"] },
            "file": { "directory": "/var/log/gates", "logical_name": "ABA11" },
            "rotation": { "kind": "minutely", "second": 0 }
        }"#;

        let config = LoggerConfig::from_json_str(json).unwrap();
        assert_eq!(config.tag, "GPIO");
        assert!(config.debug);
        assert_eq!(config.queue_capacity, 10);
        assert_eq!(config.styles.info, vec![Style::FgGreen]);
        assert_eq!(config.styles.error, vec![Style::FontBold, Style::FgRed]);
        assert!(config.styles.warn.is_empty());
        let file = config.file.unwrap();
        assert!(file.enabled);
        assert!(!file.compress_rotated);
        assert_eq!(config.rotation, Some(RotationSchedule::minutely(0)));
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(matches!(
            LoggerConfig::from_json_str("{ not json"),
            Err(LoggerError::JsonError(_))
        ));
        assert!(matches!(
            LoggerConfig::from_json_str(r#"{"queue_capacity": 0}"#),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_debug_hides_handler() {
        let config = LoggerConfig::new("X").on_error(crate::core::error::default_error_handler());
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("<handler>"));
    }
}
