//! Error types for lpcflash.

use std::io;
use thiserror::Error;

use crate::protocol::BootStatus;

/// Result type for lpcflash operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for lpcflash operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (serial port, file operations).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// A framed answer did not complete before the deadline.
    #[error("Incomplete answer from target ({} bytes received)", received.len())]
    Incomplete {
        /// Bytes collected before the deadline expired.
        received: Vec<u8>,
    },

    /// No answer to the synchronization character.
    #[error("No answer on '?'")]
    SyncNoAnswer,

    /// The synchronization acknowledge exchange failed.
    #[error("No answer on 'Synchronized'")]
    SyncHandshake,

    /// The oscillator frequency was not accepted.
    #[error("No answer on oscillator command")]
    Oscillator,

    /// Reading the boot code version failed.
    #[error("No answer on read boot code version")]
    BootVersion,

    /// Reading the part identification word failed.
    #[error("No answer on read part id")]
    PartId,

    /// A uuencoded data line was not accepted by the target.
    #[error("Write to RAM not successful")]
    DataEcho,

    /// A 20-line checksum group was rejected three times.
    #[error("Write checksum rejected after 3 attempts")]
    GroupChecksum,

    /// The final (partial) checksum group was rejected three times.
    #[error("Write checksum of final group rejected after 3 attempts")]
    FinalGroupChecksum,

    /// The image does not fit into the device's flash sectors.
    #[error("Program too large; running out of flash sectors")]
    ProgramTooLarge,

    /// The user cancelled during synchronization.
    #[error("Cancelled by user")]
    UserAbort,

    /// A download was requested before the ISP handshake completed.
    #[error("Not connected to a target")]
    NotConnected,

    /// The detected part identification matched no known device.
    #[error("Unknown device id {id:#010x}")]
    UnknownDevice {
        /// The identification word read from the target.
        id: u32,
    },

    /// The unlock command was rejected.
    #[error("Unlock failed: {0}")]
    Unlock(BootStatus),

    /// A prepare-sectors-for-write command was rejected.
    #[error("Wrong answer on prepare: {0}")]
    Prepare(BootStatus),

    /// An erase command was rejected.
    #[error("Wrong answer on erase: {0}")]
    Erase(BootStatus),

    /// A write-to-RAM announce command was rejected.
    #[error("Wrong answer on write: {0}")]
    WriteAnnounce(BootStatus),

    /// The prepare issued immediately before a copy was rejected.
    #[error("Wrong answer on prepare (before copy): {0}")]
    PrepareBeforeCopy(BootStatus),

    /// A copy-RAM-to-flash command was rejected.
    #[error("Wrong answer on copy: {0}")]
    Copy(BootStatus),

    /// The go/run command was rejected.
    #[error("Failed to run the new code: {0}")]
    Run(BootStatus),

    /// Selecting the active boot bank was rejected.
    #[error("Wrong answer on boot bank select: {0}")]
    SelectBank(BootStatus),

    /// Malformed Intel HEX input.
    #[error("Invalid hex file: {0}")]
    InvalidHexFile(String),

    /// An Intel HEX record of an unsupported type.
    #[error("Unsupported hex record type {0:#04x}")]
    UnsupportedRecord(u8),

    /// Extended linear address records disagree about the image's load offset.
    #[error("Hex image spans multiple address blocks: offset {established:#010x}, found {found:#010x}")]
    AddressRange {
        /// Load offset established by the first type-04 record.
        established: u32,
        /// Conflicting masked offset from a later type-04 record.
        found: u32,
    },
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Protocol-phase failures map into a reserved range so the bootloader
    /// error number (0-255) stays recoverable from the combined value.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::SyncNoAnswer => 0x1001,
            Error::SyncHandshake => 0x1002,
            Error::Oscillator => 0x1003,
            Error::BootVersion => 0x1004,
            Error::PartId => 0x1005,
            Error::DataEcho => 0x1006,
            Error::GroupChecksum => 0x1007,
            Error::FinalGroupChecksum => 0x1008,
            Error::ProgramTooLarge => 0x1009,
            Error::UserAbort => 0x100A,
            Error::Unlock(status) => 0x1100 + i32::from(status.code()),
            Error::Prepare(status) => 0x1200 + i32::from(status.code()),
            Error::Erase(status) => 0x1300 + i32::from(status.code()),
            Error::WriteAnnounce(status) => 0x1400 + i32::from(status.code()),
            Error::PrepareBeforeCopy(status) => 0x1500 + i32::from(status.code()),
            Error::Copy(status) => 0x1600 + i32::from(status.code()),
            Error::Run(status) => 0x1700 + i32::from(status.code()),
            Error::SelectBank(status) => 0x1800 + i32::from(status.code()),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_exit_codes() {
        assert_eq!(Error::SyncNoAnswer.exit_code(), 0x1001);
        assert_eq!(Error::UserAbort.exit_code(), 0x100A);
    }

    #[test]
    fn test_combined_exit_code_keeps_boot_status() {
        let err = Error::Erase(BootStatus::from_code(13));
        assert_eq!(err.exit_code(), 0x1300 + 13);
        assert_eq!(err.exit_code() & 0xFF, 13);
    }

    #[test]
    fn test_data_errors_exit_one() {
        assert_eq!(Error::UnsupportedRecord(0x42).exit_code(), 1);
        assert_eq!(
            Error::InvalidHexFile("bad digit".into()).exit_code(),
            1
        );
    }
}
