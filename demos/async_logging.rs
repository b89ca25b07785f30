//! Asynchronous logging example
//!
//! Demonstrates several producer threads sharing one `AsyncLogger`, and the
//! error returned once the logger has been flushed.
//!
//! Run with: cargo run --example async_logging

use std::sync::Arc;
use std::thread;
use styled_logger::prelude::*;

fn main() -> Result<()> {
    println!("=== Styled Logger - Async Logging Example ===\n");

    let logger = Arc::new(AsyncLogger::new(
        LoggerConfig::new("WORKER").debug(true).queue_capacity(64),
    )?);

    let handles: Vec<_> = (0..4)
        .map(|id| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || -> Result<()> {
                for step in 1..=3 {
                    logger.info_fmt(format_args!("worker {} step {}/3", id, step))?;
                }
                logger.debug_fmt(format_args!("worker {} done", id))
            })
        })
        .collect();

    for handle in handles {
        if let Ok(Err(e)) = handle.join() {
            eprintln!("worker failed: {}", e);
        }
    }

    logger.flush()?;
    println!("\nstate after flush: {}", logger.state());

    match logger.info("one more line") {
        Err(LoggerError::LoggerStopped) => println!("emit after flush rejected, as expected"),
        other => println!("unexpected result: {:?}", other),
    }

    let metrics = logger.metrics();
    println!(
        "logged: {}, console lines: {}, queue waits: {}",
        metrics.total_logged(),
        metrics.console_lines(),
        metrics.block_events()
    );

    Ok(())
}
