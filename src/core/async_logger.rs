//! Logger that hands lines to background consumer threads
//!
//! Each emitted line is formatted once on the caller's thread, then queued
//! twice: the unstyled rendering on the file queue and the styled rendering
//! on the console queue. A dedicated consumer drains each queue, so a slow
//! terminal never holds back the file and vice versa.
//!
//! Both queues are bounded. A producer that finds a queue full blocks until
//! the consumer makes room; lines are never dropped.

use super::{
    config::LoggerConfig,
    error::{ErrorHandler, LoggerError, Result},
    log_level::LogLevel,
    logger::{deliver, flush_reporting, logger_settings, ConsoleWriter, FileWriter, Log, LoggerCore},
    metrics::LoggerMetrics,
};
use crate::appenders::ConsoleAppender;
use crate::core::Appender;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const FILE_THREAD: &str = "styled-logger-file";
const CONSOLE_THREAD: &str = "styled-logger-console";

const ACTIVE: u8 = 0;
const FLUSHING: u8 = 1;
const STOPPED: u8 = 2;

/// Lifecycle of an [`AsyncLogger`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    /// Accepting lines
    Active,
    /// `flush` is draining the queues
    Flushing,
    /// Flushed; every further emit fails with `LoggerError::LoggerStopped`
    Stopped,
}

impl LoggerState {
    fn from_u8(value: u8) -> Self {
        match value {
            ACTIVE => LoggerState::Active,
            FLUSHING => LoggerState::Flushing,
            _ => LoggerState::Stopped,
        }
    }
}

impl fmt::Display for LoggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoggerState::Active => "active",
            LoggerState::Flushing => "flushing",
            LoggerState::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

enum Job {
    Line(String),
    /// Flush the sink, then acknowledge
    Sync(Sender<()>),
}

struct Queues {
    file: Sender<Job>,
    console: Sender<Job>,
}

/// Formats on the calling thread and writes on two consumer threads
///
/// Lines keep their emit order within each sink. Call [`AsyncLogger::flush`]
/// (or drop the logger) to wait for every queued line to be written.
///
/// # Example
///
/// ```
/// use styled_logger::prelude::*;
///
/// let logger = AsyncLogger::new(LoggerConfig::new("GPIO").queue_capacity(100)).unwrap();
/// logger.info("GPIO handler started").unwrap();
/// logger.warn_fmt(format_args!("pin {} floating", 7)).unwrap();
/// logger.flush().unwrap();
///
/// assert!(logger.info("too late").is_err());
/// ```
pub struct AsyncLogger {
    core: LoggerCore,
    queues: Mutex<Option<Queues>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    state: AtomicU8,
}

impl AsyncLogger {
    /// Build a logger printing to stdout and start its consumers
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid, its file cannot be
    /// opened, or a consumer thread cannot be spawned
    pub fn new(config: LoggerConfig) -> Result<Self> {
        Self::with_console(config, ConsoleAppender::new())
    }

    /// Build a logger printing to `console`
    pub fn with_console(config: LoggerConfig, console: ConsoleAppender) -> Result<Self> {
        let capacity = config.queue_capacity;
        let core = LoggerCore::from_config(config)?;

        let (file_tx, file_rx) = bounded(capacity);
        let (console_tx, console_rx) = bounded(capacity);

        let file_writer = FileWriter::new(Arc::clone(&core.file), Arc::clone(&core.metrics));
        let console_writer = ConsoleWriter::new(console, Arc::clone(&core.metrics));

        let file_worker = spawn_consumer(
            FILE_THREAD,
            file_rx,
            file_writer,
            Arc::clone(&core.metrics),
            Arc::clone(&core.on_error),
        )?;
        let console_worker = match spawn_consumer(
            CONSOLE_THREAD,
            console_rx,
            console_writer,
            Arc::clone(&core.metrics),
            Arc::clone(&core.on_error),
        ) {
            Ok(handle) => handle,
            Err(e) => {
                drop(file_tx);
                let _ = file_worker.join();
                return Err(e);
            }
        };

        Ok(Self {
            core,
            queues: Mutex::new(Some(Queues {
                file: file_tx,
                console: console_tx,
            })),
            workers: Mutex::new(vec![file_worker, console_worker]),
            state: AtomicU8::new(ACTIVE),
        })
    }

    pub fn state(&self) -> LoggerState {
        LoggerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Drain both queues, stop rotation and close out the sinks
    ///
    /// Blocks until every line emitted before the call has been written.
    /// Afterwards the logger is [`LoggerState::Stopped`] and emits fail.
    /// Calling `flush` again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if a consumer thread panicked or the file cannot be flushed
    pub fn flush(&self) -> Result<()> {
        let mut workers = self.workers.lock();
        if self.state.load(Ordering::Acquire) != ACTIVE {
            return Ok(());
        }
        self.state.store(FLUSHING, Ordering::Release);

        // consumers exit once their queue is closed and empty
        drop(self.queues.lock().take());

        let mut panicked = Vec::new();
        for handle in workers.drain(..) {
            let name = handle.thread().name().unwrap_or("consumer").to_string();
            if handle.join().is_err() {
                panicked.push(name);
            }
        }

        self.core.stop_rotation();
        let flushed = match self.core.file.lock().as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        };

        self.state.store(STOPPED, Ordering::Release);

        if !panicked.is_empty() {
            return Err(LoggerError::other(format!(
                "consumer thread(s) panicked: {}",
                panicked.join(", ")
            )));
        }
        flushed
    }

    fn enqueue(&self, tx: &Sender<Job>, job: Job, queue: &'static str) -> Result<()> {
        match tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => {
                self.core.metrics.record_block();
                tx.send(job).map_err(|_| LoggerError::channel_send(queue))
            }
            Err(TrySendError::Disconnected(_)) => Err(LoggerError::channel_send(queue)),
        }
    }
}

logger_settings!(AsyncLogger);

impl Log for AsyncLogger {
    fn log(&self, level: LogLevel, message: String) -> Result<()> {
        if self.state.load(Ordering::Acquire) != ACTIVE {
            return Err(LoggerError::LoggerStopped);
        }

        let Some((raw, styled)) = self.core.prepare(level, &message) else {
            return Ok(());
        };

        // one producer at a time keeps both queues in the same order
        let queues = self.queues.lock();
        let queues = queues.as_ref().ok_or(LoggerError::LoggerStopped)?;
        self.enqueue(&queues.file, Job::Line(raw), "file")?;
        self.enqueue(&queues.console, Job::Line(styled), "console")?;
        self.core.metrics.record_logged();
        Ok(())
    }

    /// Wait until both consumers have written and flushed everything queued so far
    ///
    /// Returns immediately once the logger has been flushed.
    fn sync(&self) -> Result<()> {
        let (ack_tx, ack_rx) = bounded(2);
        {
            let queues = self.queues.lock();
            let Some(queues) = queues.as_ref() else {
                return Ok(());
            };
            self.enqueue(&queues.file, Job::Sync(ack_tx.clone()), "file")?;
            self.enqueue(&queues.console, Job::Sync(ack_tx), "console")?;
        }

        for _ in 0..2 {
            ack_rx
                .recv()
                .map_err(|_| LoggerError::other("consumer exited before acknowledging sync"))?;
        }
        Ok(())
    }
}

impl Drop for AsyncLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            (self.core.on_error)(&e);
        }
    }
}

fn spawn_consumer<A: Appender + 'static>(
    name: &str,
    rx: Receiver<Job>,
    sink: A,
    metrics: Arc<LoggerMetrics>,
    on_error: ErrorHandler,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || consume(rx, sink, &metrics, &on_error))
        .map_err(|e| LoggerError::io_operation("spawn consumer thread", name.to_string(), e))
}

/// Write every job until the queue is closed and drained
///
/// The sink is flushed whenever the queue runs empty, so output keeps up
/// with a quiet producer without a flush per line under load.
fn consume<A: Appender>(rx: Receiver<Job>, mut sink: A, metrics: &LoggerMetrics, on_error: &ErrorHandler) {
    for job in rx.iter() {
        match job {
            Job::Line(line) => {
                deliver(&mut sink, &line, metrics, on_error);
                if rx.is_empty() {
                    flush_reporting(&mut sink, on_error);
                }
            }
            Job::Sync(ack) => {
                flush_reporting(&mut sink, on_error);
                let _ = ack.send(());
            }
        }
    }
    flush_reporting(&mut sink, on_error);
}
