//! File logging example
//!
//! Demonstrates the date-stamped log file, pausing file output and a
//! rotation timer.
//!
//! Run with: cargo run --example file_logging

use std::time::Duration;
use styled_logger::prelude::*;

fn main() -> Result<()> {
    println!("=== Styled Logger - File Logging Example ===\n");

    let dir = std::env::temp_dir().join("styled_logger_demo");
    let logger = AsyncLogger::new(
        LoggerConfig::new("GATE")
            .file(FileConfig::new(&dir, "ABA11"))
            .rotation(RotationSchedule::daily(0, 0)),
    )?;

    if let Some(path) = logger.file_path() {
        println!("writing to {}\n", path.display());
    }

    logger.info("Application started")?;
    for i in 1..=5 {
        logger.info_fmt(format_args!("Processing item {}/5", i))?;
        if i == 3 {
            logger.warn("Item 3 took longer than expected")?;
        }
    }

    logger.set_file_write_enabled(false)?;
    logger.info("console only while file output is paused")?;
    logger.set_file_write_enabled(true)?;

    logger.start_rotation(RotationSchedule::interval(Duration::from_millis(200)))?;
    logger.info("rotation now checks every 200 ms")?;
    std::thread::sleep(Duration::from_millis(500));
    logger.error("Failed to load optional plugin")?;

    let path = logger.file_path();
    logger.flush()?;

    if let Some(path) = path {
        println!("\n--- {} ---", path.display());
        let content = std::fs::read_to_string(&path)
            .map_err(|e| LoggerError::io_operation("read demo log", path.display().to_string(), e))?;
        print!("{}", content);
    }
    println!("rotations: {}", logger.metrics().rotations());

    Ok(())
}
