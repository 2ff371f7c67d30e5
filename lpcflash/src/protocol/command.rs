//! ISP command rendering and bootloader status codes.
//!
//! Every exchange with the boot ROM is a short ASCII command. The engine
//! appends the line terminator at send time, so [`Command::text`] renders
//! the bare command. Numeric arguments are decimal, as the boot ROM
//! expects.

use std::fmt;

/// One ISP command, rendered to its wire form by [`Command::text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Acknowledge the synchronization echo.
    Confirm,
    /// Tell the bootloader the crystal frequency in kHz (ASCII decimal).
    Oscillator(String),
    /// Unlock flash write/erase/go commands.
    Unlock,
    /// Read the boot code version.
    ReadBootVersion,
    /// Read the part identification word.
    ReadPartId,
    /// Prepare a sector range for write operation.
    Prepare {
        /// First sector.
        start: u32,
        /// Last sector (inclusive).
        end: u32,
        /// Flash bank, on dual-bank parts.
        bank: Option<u32>,
    },
    /// Erase a sector range.
    Erase {
        /// First sector.
        start: u32,
        /// Last sector (inclusive).
        end: u32,
        /// Flash bank, on dual-bank parts.
        bank: Option<u32>,
    },
    /// Announce a write of `len` bytes to RAM at `addr`.
    WriteToRam {
        /// Destination RAM address.
        addr: u32,
        /// Number of bytes that will follow uuencoded.
        len: u32,
    },
    /// Copy staged RAM contents into flash.
    Copy {
        /// Destination flash address.
        flash: u32,
        /// Source RAM address.
        ram: u32,
        /// Copy length in bytes.
        len: u32,
    },
    /// Compare a flash range against staged RAM contents.
    Compare {
        /// Flash address.
        addr: u32,
        /// RAM address.
        ram: u32,
        /// Length in bytes.
        len: u32,
    },
    /// Select the active boot bank on dual-bank parts.
    SelectBank(u32),
    /// Start execution at `addr`; `thumb` selects Thumb state.
    Go {
        /// Entry address.
        addr: u32,
        /// Thumb (`T`) instead of ARM (`A`) state.
        thumb: bool,
    },
}

impl Command {
    /// Render the command without its line terminator.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Command::Confirm => "Synchronized".to_string(),
            Command::Oscillator(freq) => freq.clone(),
            Command::Unlock => "U 23130".to_string(),
            Command::ReadBootVersion => "K".to_string(),
            Command::ReadPartId => "J".to_string(),
            Command::Prepare { start, end, bank } => match bank {
                Some(bank) => format!("P {start} {end} {bank}"),
                None => format!("P {start} {end}"),
            },
            Command::Erase { start, end, bank } => match bank {
                Some(bank) => format!("E {start} {end} {bank}"),
                None => format!("E {start} {end}"),
            },
            Command::WriteToRam { addr, len } => format!("W {addr} {len}"),
            Command::Copy { flash, ram, len } => format!("C {flash} {ram} {len}"),
            Command::Compare { addr, ram, len } => format!("M {addr} {ram} {len}"),
            Command::SelectBank(bank) => format!("S {bank}"),
            Command::Go { addr, thumb } => {
                format!("G {addr} {}", if *thumb { 'T' } else { 'A' })
            },
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Status code reported by the boot ROM after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStatus {
    /// Command executed successfully.
    Success,
    /// Invalid command.
    InvalidCommand,
    /// Source address not on a word boundary.
    SrcAddrError,
    /// Destination address not on a correct boundary.
    DstAddrError,
    /// Source address not mapped in the memory map.
    SrcAddrNotMapped,
    /// Destination address not mapped in the memory map.
    DstAddrNotMapped,
    /// Byte count not a multiple of 4 or not permitted.
    CountError,
    /// Sector number does not exist.
    InvalidSector,
    /// Sector is not blank.
    SectorNotBlank,
    /// Sector was not prepared for write operation.
    SectorNotPrepared,
    /// Source and destination data not equal.
    CompareError,
    /// Flash programming hardware interface is busy.
    Busy,
    /// Insufficient or invalid parameters.
    ParamError,
    /// Address not on a word boundary.
    AddrError,
    /// Address not mapped in the memory map.
    AddrNotMapped,
    /// Command is locked.
    CmdLocked,
    /// Unlock code is invalid.
    InvalidCode,
    /// Invalid baud rate setting.
    InvalidBaudRate,
    /// Invalid stop bit setting.
    InvalidStopBit,
    /// Code read protection is enabled.
    CodeReadProtection,
    /// Any other code, including 255 when no code was found in the answer.
    Unknown(u8),
}

impl BootStatus {
    /// Map a numeric boot ROM code to its status.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => BootStatus::Success,
            1 => BootStatus::InvalidCommand,
            2 => BootStatus::SrcAddrError,
            3 => BootStatus::DstAddrError,
            4 => BootStatus::SrcAddrNotMapped,
            5 => BootStatus::DstAddrNotMapped,
            6 => BootStatus::CountError,
            7 => BootStatus::InvalidSector,
            8 => BootStatus::SectorNotBlank,
            9 => BootStatus::SectorNotPrepared,
            10 => BootStatus::CompareError,
            11 => BootStatus::Busy,
            12 => BootStatus::ParamError,
            13 => BootStatus::AddrError,
            14 => BootStatus::AddrNotMapped,
            15 => BootStatus::CmdLocked,
            16 => BootStatus::InvalidCode,
            17 => BootStatus::InvalidBaudRate,
            18 => BootStatus::InvalidStopBit,
            19 => BootStatus::CodeReadProtection,
            other => BootStatus::Unknown(other),
        }
    }

    /// The numeric code this status was reported with.
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            BootStatus::Success => 0,
            BootStatus::InvalidCommand => 1,
            BootStatus::SrcAddrError => 2,
            BootStatus::DstAddrError => 3,
            BootStatus::SrcAddrNotMapped => 4,
            BootStatus::DstAddrNotMapped => 5,
            BootStatus::CountError => 6,
            BootStatus::InvalidSector => 7,
            BootStatus::SectorNotBlank => 8,
            BootStatus::SectorNotPrepared => 9,
            BootStatus::CompareError => 10,
            BootStatus::Busy => 11,
            BootStatus::ParamError => 12,
            BootStatus::AddrError => 13,
            BootStatus::AddrNotMapped => 14,
            BootStatus::CmdLocked => 15,
            BootStatus::InvalidCode => 16,
            BootStatus::InvalidBaudRate => 17,
            BootStatus::InvalidStopBit => 18,
            BootStatus::CodeReadProtection => 19,
            BootStatus::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for BootStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BootStatus::Success => "CMD_SUCCESS",
            BootStatus::InvalidCommand => "INVALID_COMMAND",
            BootStatus::SrcAddrError => "SRC_ADDR_ERROR: Source address is not on word boundary",
            BootStatus::DstAddrError => {
                "DST_ADDR_ERROR: Destination address is not on a correct boundary"
            },
            BootStatus::SrcAddrNotMapped => {
                "SRC_ADDR_NOT_MAPPED: Source address is not mapped in the memory map"
            },
            BootStatus::DstAddrNotMapped => {
                "DST_ADDR_NOT_MAPPED: Destination address is not mapped in the memory map"
            },
            BootStatus::CountError => {
                "COUNT_ERROR: Byte count is not multiple of 4 or is not a permitted value"
            },
            BootStatus::InvalidSector => {
                "INVALID_SECTOR: Sector number is invalid or end sector number is greater than start sector number"
            },
            BootStatus::SectorNotBlank => "SECTOR_NOT_BLANK",
            BootStatus::SectorNotPrepared => {
                "SECTOR_NOT_PREPARED_FOR_WRITE_OPERATION: Command to prepare sector for write operation was not executed"
            },
            BootStatus::CompareError => {
                "COMPARE_ERROR: Source and destination data not equal"
            },
            BootStatus::Busy => "BUSY: Flash programming hardware interface is busy",
            BootStatus::ParamError => {
                "PARAM_ERROR: Insufficient number of parameters or invalid parameter"
            },
            BootStatus::AddrError => "ADDR_ERROR: Address is not on word boundary",
            BootStatus::AddrNotMapped => {
                "ADDR_NOT_MAPPED: Address is not mapped in the memory map"
            },
            BootStatus::CmdLocked => "CMD_LOCKED: Command is locked",
            BootStatus::InvalidCode => "INVALID_CODE: Unlock code is invalid",
            BootStatus::InvalidBaudRate => "INVALID_BAUD_RATE: Invalid baud rate setting",
            BootStatus::InvalidStopBit => "INVALID_STOP_BIT: Invalid stop bit setting",
            BootStatus::CodeReadProtection => {
                "CODE_READ_PROTECTION_ENABLED: Code read protection enabled"
            },
            BootStatus::Unknown(code) => return write!(f, "unknown error code {code}"),
        };
        f.write_str(text)
    }
}

/// Extract the numeric status code from an answer.
///
/// The code follows the first line break after the echoed command; 255 is
/// returned when no decimal number is found there.
#[must_use]
pub fn return_code(answer: &[u8]) -> u8 {
    let mut it = answer.iter().copied();
    for b in it.by_ref() {
        if b == 0x0a {
            break;
        }
    }
    let digits: Vec<u8> = it.take_while(u8::is_ascii_digit).collect();
    if digits.is_empty() {
        return 255;
    }
    let mut value: u32 = 0;
    for d in digits {
        value = value.wrapping_mul(10).wrapping_add(u32::from(d - b'0'));
    }
    #[allow(clippy::cast_possible_truncation)]
    {
        value as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_rendering() {
        assert_eq!(Command::Unlock.text(), "U 23130");
        assert_eq!(Command::ReadPartId.text(), "J");
        assert_eq!(
            Command::Prepare {
                start: 1,
                end: 26,
                bank: None
            }
            .text(),
            "P 1 26"
        );
        assert_eq!(
            Command::Erase {
                start: 0,
                end: 0,
                bank: Some(0)
            }
            .text(),
            "E 0 0 0"
        );
        assert_eq!(
            Command::WriteToRam {
                addr: 0x40000200,
                len: 1080
            }
            .text(),
            "W 1073742336 1080"
        );
        assert_eq!(
            Command::Copy {
                flash: 4096,
                ram: 0x40000200,
                len: 4096
            }
            .text(),
            "C 4096 1073742336 4096"
        );
        assert_eq!(Command::Go { addr: 0, thumb: false }.text(), "G 0 A");
        assert_eq!(
            Command::Go {
                addr: 0x10000000,
                thumb: true
            }
            .text(),
            "G 268435456 T"
        );
        assert_eq!(Command::SelectBank(0).text(), "S 0");
    }

    #[test]
    fn test_return_code_after_echo() {
        assert_eq!(return_code(b"P 0 0\r\n9\r\n"), 9);
        assert_eq!(return_code(b"E 0 26\r\n13\r\n"), 13);
    }

    #[test]
    fn test_return_code_missing_is_255() {
        assert_eq!(return_code(b"garbage"), 255);
        assert_eq!(return_code(b"P 0 0\r\nOK\r\n"), 255);
        assert_eq!(return_code(b""), 255);
    }

    #[test]
    fn test_boot_status_roundtrip() {
        for code in 0..=20u8 {
            assert_eq!(BootStatus::from_code(code).code(), code);
        }
        assert_eq!(BootStatus::from_code(255), BootStatus::Unknown(255));
    }
}
