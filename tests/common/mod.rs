//! Helpers shared by the integration test binaries

#![allow(dead_code)]

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;
use styled_logger::ConsoleAppender;

/// In-memory stand-in for stdout
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn appender(&self) -> ConsoleAppender {
        ConsoleAppender::with_writer(self.clone())
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().clone()).expect("console output is UTF-8")
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_string).collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Strip the `[YYYY-MM-DD HH:MM:SS.mmm] ` prefix from a log line
pub fn without_timestamp(line: &str) -> &str {
    line.split_once("] ").map_or(line, |(_, rest)| rest)
}
