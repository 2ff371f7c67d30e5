//! Target reset via the serial control lines.
//!
//! On boards wired the common way, DTR drives the reset pin and RTS
//! drives the ISP-enable pin (both active low through an inverter).
//! Holding ISP low across a reset drops the chip into the bootloader.

use std::thread::sleep;
use std::time::Duration;

use crate::error::Result;
use crate::port::Port;

/// How the adapter's control lines are wired to the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlLines {
    /// Drive DTR/RTS at all. When false the reset helpers are no-ops
    /// and the target must be put into ISP mode by hand.
    pub enabled: bool,
    /// DTR and RTS are crossed on the board.
    pub swapped: bool,
    /// The lines pass through inverting drivers.
    pub inverted: bool,
    /// Keep the ISP-enable line asserted after reset. Required by some
    /// reset controllers, but it prevents the final go command from
    /// starting the application.
    pub boot_hold: bool,
}

fn drive(port: &mut dyn Port, lines: ControlLines, dtr: bool, rts: bool) -> Result<()> {
    let (mut dtr, mut rts) = (dtr != lines.inverted, rts != lines.inverted);
    if lines.swapped {
        std::mem::swap(&mut dtr, &mut rts);
    }
    port.set_dtr(dtr)?;
    port.set_rts(rts)?;
    Ok(())
}

/// Reset the target with ISP-enable asserted so it lands in the bootloader.
pub fn enter_isp(port: &mut dyn Port, lines: ControlLines) -> Result<()> {
    if !lines.enabled {
        return Ok(());
    }
    drive(port, lines, true, true)?;
    sleep(Duration::from_millis(100));
    port.clear_buffers()?;
    sleep(Duration::from_millis(100));
    drive(port, lines, false, true)?;
    // Longer settle in case reset goes through an external supervisor.
    sleep(Duration::from_millis(500));
    if !lines.boot_hold {
        // Release ISP-enable so a later go command can start the program.
        drive(port, lines, false, false)?;
    }
    Ok(())
}

/// Reset the target with ISP-enable released so the application runs.
pub fn reset_to_run(port: &mut dyn Port, lines: ControlLines) -> Result<()> {
    if !lines.enabled {
        return Ok(());
    }
    drive(port, lines, true, false)?;
    sleep(Duration::from_millis(100));
    port.clear_buffers()?;
    sleep(Duration::from_millis(100));
    drive(port, lines, false, false)?;
    sleep(Duration::from_millis(100));
    Ok(())
}
