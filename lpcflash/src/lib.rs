//! # lpcflash
//!
//! In-system programming for NXP LPC microcontrollers over the serial
//! bootloader (ISP) built into the chips.
//!
//! The crate covers the whole download pipeline:
//!
//! - Intel HEX and raw binary image loading, with the vector table
//!   checksum patch the boot ROM demands
//! - autobaud synchronization and part identification against a catalog
//!   of LPC2000/1100/1300/1700/1800/4300 descriptors
//! - sector-wise flash programming through the uuencoded RAM staging
//!   protocol, writing the checksum sector last so an interrupted
//!   download never leaves a half-valid image
//! - downloading straight into RAM and starting the code there
//!
//! ## Example
//!
//! ```rust,no_run
//! use lpcflash::{FlashOptions, Flasher, Image, NativePort, SerialConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let image = Image::from_hex(&std::fs::read("firmware.hex")?)?;
//!
//!     let port = NativePort::open(&SerialConfig::new("/dev/ttyUSB0", 115200))?;
//!     let mut flasher = Flasher::new(port, FlashOptions {
//!         osc_khz: "14746".to_string(),
//!         ..FlashOptions::default()
//!     });
//!
//!     let detected = flasher.connect()?;
//!     println!("found LPC{}", detected.device.name);
//!
//!     let mut image = image;
//!     flasher.program(&mut image, &mut |done, total| {
//!         println!("{done}/{total} bytes");
//!     })?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::{Arc, OnceLock};

pub mod device;
pub mod error;
pub mod flasher;
pub mod framing;
pub mod image;
pub mod port;
pub mod protocol;
pub mod reset;

static INTERRUPT_CHECKER: OnceLock<Arc<dyn Fn() -> bool + Send + Sync>> = OnceLock::new();

/// Register a global interruption checker used by long-running library loops.
///
/// The checker should return `true` when the current operation should stop
/// (for example after receiving Ctrl-C in CLI applications). Cancellation is
/// polled only between synchronization attempts; once sector programming has
/// started the session runs to completion so flash is never left in a state
/// the checksum-last ordering cannot recover from.
pub fn set_interrupt_checker<F>(checker: F)
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    let _ = INTERRUPT_CHECKER.set(Arc::new(checker));
}

/// Returns whether interruption was requested by the embedding application.
#[must_use]
pub fn is_interrupted_requested() -> bool {
    INTERRUPT_CHECKER
        .get()
        .is_some_and(|checker| checker())
}

pub use {
    device::{ChipFamily, DeviceDescriptor, EffectiveDescriptor, lookup},
    error::{Error, Result},
    flasher::{DetectedDevice, FlashOptions, Flasher},
    image::Image,
    port::{NativePort, Port, PortInfo, SerialConfig, available_ports},
    protocol::{BootStatus, Command},
    reset::ControlLines,
};

#[cfg(test)]
mod tests {
    /// No checker registered means no interruption. Tests never register
    /// one: the checker is global and would leak into every session test.
    #[test]
    fn test_no_checker_means_not_interrupted() {
        assert!(!crate::is_interrupted_requested());
    }
}
