//! Synchronous logging example
//!
//! Demonstrates every level, custom styles and debug gating.
//!
//! Run with: cargo run --example sync_logging

use styled_logger::prelude::*;
use styled_logger::{info, warn};

fn main() -> Result<()> {
    println!("=== Styled Logger - Sync Logging Example ===\n");

    let logger = SyncLogger::new(LoggerConfig::new("GPIO"))?;

    println!("1. Default styles:");
    logger.info("GPIO handler started")?;
    logger.warn("pin 7 floating")?;
    logger.error("pin 9 short to ground")?;
    logger.debug("not shown: debug output is off")?;

    println!("\n2. Debug output enabled:");
    logger.set_debug(true);
    logger.debug_fmt(format_args!("pin {} -> {}", 4, "high"))?;

    println!("\n3. Custom styles:");
    logger.set_info_style(&[Style::FontBold, Style::FgGreen]);
    logger.set_warn_style(&[Style::FontUnderline, Style::FgYellow, Style::BgBlue]);
    info!(logger, "gate {} open", "ABA11")?;
    warn!(logger, "gate {} slow to close ({} ms)", "ABA11", 870)?;

    println!("\n4. Back to defaults:");
    logger.set_default_style();
    logger.info("styles restored")?;

    let metrics = logger.metrics();
    println!(
        "\nlogged: {}, suppressed debug: {}",
        metrics.total_logged(),
        metrics.suppressed_debug()
    );

    Ok(())
}
