//! Serial port abstraction.
//!
//! The ISP engine talks to the target through the [`Port`] trait so that the
//! protocol layer stays I/O-agnostic and testable against in-memory mocks.
//! The LPC bootloader always speaks 8 data bits, no parity, one stop bit, no
//! flow control, so the configuration surface is just port name, baud rate
//! and timeout.

pub mod native;

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// Serial port configuration.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Port name/path (e.g., "/dev/ttyUSB0", "COM3").
    pub port_name: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Read timeout.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: 115200,
            timeout: Duration::from_millis(100),
        }
    }
}

impl SerialConfig {
    /// Create a new configuration with port name and baud rate.
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            ..Default::default()
        }
    }

    /// Set the read timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Serial port information, as reported by the host OS.
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name/path.
    pub name: String,
    /// USB vendor ID (if available).
    pub vid: Option<u16>,
    /// USB product ID (if available).
    pub pid: Option<u16>,
    /// Manufacturer string (if available).
    pub manufacturer: Option<String>,
    /// Product string (if available).
    pub product: Option<String>,
    /// Serial number (if available).
    pub serial_number: Option<String>,
}

/// Unified trait for the serial link to the target.
///
/// [`Read`] is expected to block no longer than the configured timeout and
/// return an error of kind [`std::io::ErrorKind::TimedOut`] (or `Ok(0)`)
/// when nothing arrived; the framing layer relies on this for its local
/// timeout bookkeeping. The DTR/RTS setters back the hardware reset
/// sequencing used to push the target into its bootloader.
pub trait Port: Read + Write + Send {
    /// Set the read timeout.
    fn set_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Get the current read timeout.
    fn timeout(&self) -> Duration;

    /// Get the configured baud rate.
    fn baud_rate(&self) -> u32;

    /// Discard any pending input and output.
    fn clear_buffers(&mut self) -> Result<()>;

    /// Get the port name/path.
    fn name(&self) -> &str;

    /// Set the DTR (Data Terminal Ready) line.
    fn set_dtr(&mut self, level: bool) -> Result<()>;

    /// Set the RTS (Request To Send) line.
    fn set_rts(&mut self, level: bool) -> Result<()>;
}

/// List all serial ports known to the host.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(crate::error::Error::Serial)?;

    Ok(ports
        .into_iter()
        .map(|p| {
            let (vid, pid, manufacturer, product, serial_number) = match &p.port_type {
                serialport::SerialPortType::UsbPort(info) => (
                    Some(info.vid),
                    Some(info.pid),
                    info.manufacturer.clone(),
                    info.product.clone(),
                    info.serial_number.clone(),
                ),
                _ => (None, None, None, None, None),
            };

            PortInfo {
                name: p.port_name,
                vid,
                pid,
                manufacturer,
                product,
                serial_number,
            }
        })
        .collect())
}

pub use native::NativePort;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_config_default() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_serial_config_builder() {
        let config = SerialConfig::new("/dev/ttyUSB0", 38400).with_timeout(Duration::from_secs(5));

        assert_eq!(config.port_name, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 38400);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_available_ports_does_not_panic() {
        let _ = available_ports();
    }
}
