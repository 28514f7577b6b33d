//! Opening the serial link to the reader.

use std::io::BufReader;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use cartreader_core::config::LinkConfig;
use cartreader_core::transport::{LineReader, LinkWriter};
use serialport::SerialPort;

/// Per-read timeout. Timeouts only wake the reader; partial lines survive.
const READ_TIMEOUT: Duration = Duration::from_secs(1);

pub type SerialReader = LineReader<BufReader<Box<dyn SerialPort>>>;
pub type SerialWriter = LinkWriter<Box<dyn SerialPort>>;

/// Open the port and split it into a reader and a writer half.
///
/// Opening the port resets the microcontroller, so this waits the configured
/// delay before returning.
pub fn open(config: &LinkConfig) -> Result<(SerialReader, SerialWriter)> {
    let port = serialport::new(&config.device, config.baud_rate)
        .timeout(READ_TIMEOUT)
        .open()
        .with_context(|| format!("Failed to open serial port {}", config.device))?;
    let write_half = port
        .try_clone()
        .context("Failed to clone serial port handle")?;

    tracing::info!(device = %config.device, baud = config.baud_rate, "Serial link open");
    if config.open_delay_ms > 0 {
        thread::sleep(Duration::from_millis(config.open_delay_ms));
    }

    Ok((
        LineReader::new(BufReader::new(port)),
        LinkWriter::new(write_half),
    ))
}
