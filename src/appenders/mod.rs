//! Output sinks

pub mod console;
pub mod file;

pub use console::ConsoleAppender;
pub use file::{compress_file, FileSink};

pub use crate::core::Appender;
