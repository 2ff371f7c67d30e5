//! Serial port selection for the CLI.
//!
//! Picks the port named on the command line when given, otherwise lists
//! what the system offers and asks, via dialoguer, which one to use.

use anyhow::{Result, bail};
use console::style;
use dialoguer::{Select, theme::ColorfulTheme};
use lpcflash::{PortInfo, available_ports};

/// How the port should be chosen.
#[derive(Debug, Clone, Default)]
pub struct SerialOptions {
    /// Port named explicitly (CLI flag or environment).
    pub port: Option<String>,
    /// Fail instead of prompting when the choice is ambiguous.
    pub non_interactive: bool,
}

/// Resolve the serial port name to use.
pub fn select_serial_port(options: &SerialOptions) -> Result<String> {
    if let Some(name) = &options.port {
        return Ok(name.clone());
    }

    let ports = available_ports()?;
    if ports.is_empty() {
        bail!("no serial ports found; specify one with --port");
    }
    if ports.len() == 1 {
        let name = ports[0].name.clone();
        eprintln!(
            "{} Using the only available port: {}",
            style("ℹ").blue(),
            style(&name).cyan()
        );
        return Ok(name);
    }
    if options.non_interactive {
        bail!(
            "{} serial ports available; specify one with --port",
            ports.len()
        );
    }
    select_port_interactive(ports)
}

fn port_label(port: &PortInfo) -> String {
    let vid_pid = if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
        format!(" ({vid:04X}:{pid:04X})")
    } else {
        String::new()
    };
    let product = port
        .product
        .as_deref()
        .map(|p| format!(" - {p}"))
        .unwrap_or_default();
    format!("{}{vid_pid}{product}", port.name)
}

fn select_port_interactive(ports: Vec<PortInfo>) -> Result<String> {
    let labels: Vec<String> = ports.iter().map(port_label).collect();

    // Truncate labels to fit terminal width to prevent wrapping in narrow
    // terminals.
    let term_width = console::Term::stderr().size().1 as usize;
    let max_item_width = term_width.saturating_sub(4);
    let labels: Vec<String> = labels
        .into_iter()
        .map(|label| console::truncate_str(&label, max_item_width, "\u{2026}").into_owned())
        .collect();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a serial port")
        .items(&labels)
        .default(0)
        .interact_opt()?;

    match selection {
        Some(index) => Ok(ports
            .into_iter()
            .nth(index)
            .map(|port| port.name)
            .unwrap_or_default()),
        None => bail!("port selection cancelled"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_port_wins_without_enumeration() {
        let options = SerialOptions {
            port: Some("/dev/ttyUSB7".to_string()),
            non_interactive: true,
        };
        assert_eq!(select_serial_port(&options).unwrap(), "/dev/ttyUSB7");
    }

    #[test]
    fn test_serial_options_default() {
        let options = SerialOptions::default();
        assert!(options.port.is_none());
        assert!(!options.non_interactive);
    }

    #[test]
    fn test_port_label_includes_usb_identity() {
        let port = PortInfo {
            name: "/dev/ttyACM0".to_string(),
            vid: Some(0x1FC9),
            pid: Some(0x0083),
            manufacturer: Some("NXP".to_string()),
            product: Some("LPC-Link2".to_string()),
            serial_number: None,
        };
        let label = port_label(&port);
        assert!(label.contains("/dev/ttyACM0"));
        assert!(label.contains("1FC9:0083"));
        assert!(label.contains("LPC-Link2"));
    }

    #[test]
    fn test_port_label_plain_device() {
        let port = PortInfo {
            name: "/dev/ttyS0".to_string(),
            vid: None,
            pid: None,
            manufacturer: None,
            product: None,
            serial_number: None,
        };
        assert_eq!(port_label(&port), "/dev/ttyS0");
    }
}
