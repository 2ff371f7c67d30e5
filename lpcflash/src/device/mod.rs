//! Device identification: chip families, descriptors and the part catalog.

mod table;

pub use table::DEVICE_TABLE;

/// Chip family, selecting family-specific ISP behavior.
///
/// The family decides where the vector-table checksum lives, where the
/// bootloader's usable RAM begins, whether code starts in ARM or Thumb
/// state and whether the part has dual flash banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipFamily {
    /// ARM7TDMI parts (LPC2000 series).
    Lpc2xxx,
    /// Cortex-M3 parts (LPC1700 series).
    Lpc17xx,
    /// Cortex-M3 parts (LPC1300 series).
    Lpc13xx,
    /// Cortex-M0 parts (LPC1100/1200 series).
    Lpc11xx,
    /// Cortex-M3 parts with dual flash banks (LPC1800 series).
    Lpc18xx,
    /// Cortex-M4 parts with dual flash banks (LPC4300 series).
    Lpc43xx,
}

impl ChipFamily {
    /// Byte offset of the checksum word inside the vector table.
    #[must_use]
    pub fn vector_table_offset(self) -> usize {
        match self {
            ChipFamily::Lpc2xxx => 0x14,
            _ => 0x1C,
        }
    }

    /// First RAM address of the part.
    #[must_use]
    pub fn ram_start(self) -> u32 {
        match self {
            ChipFamily::Lpc2xxx => 0x4000_0000,
            _ => 0x1000_0000,
        }
    }

    /// First RAM address usable for staging; the bootloader owns the bytes
    /// below it.
    #[must_use]
    pub fn ram_base(self) -> u32 {
        match self {
            ChipFamily::Lpc2xxx => 0x4000_0200,
            ChipFamily::Lpc13xx | ChipFamily::Lpc11xx => 0x1000_0300,
            _ => 0x1000_0200,
        }
    }

    /// Whether code starts in Thumb state (`G ... T`) instead of ARM.
    #[must_use]
    pub fn thumb_mode(self) -> bool {
        !matches!(self, ChipFamily::Lpc2xxx)
    }

    /// Whether the part has two flash banks and needs an explicit boot bank
    /// selection after programming.
    #[must_use]
    pub fn has_flash_banks(self) -> bool {
        matches!(self, ChipFamily::Lpc18xx | ChipFamily::Lpc43xx)
    }
}

/// One catalog entry describing a part's flash geometry and ISP limits.
#[derive(Debug)]
pub struct DeviceDescriptor {
    /// Primary part identification word.
    pub id: u32,
    /// Secondary identification word, matched on its low byte.
    pub id2: u32,
    /// Whether the secondary word must be read and evaluated.
    pub eval_id2: bool,
    /// Product name (without the "LPC" prefix).
    pub name: &'static str,
    /// Nominal flash size in KiB (informational).
    pub flash_kib: u32,
    /// Nominal RAM size in KiB.
    pub ram_kib: u32,
    /// Number of usable flash sectors.
    pub sector_count: u32,
    /// Largest single RAM-to-flash copy the boot ROM accepts, in bytes.
    pub max_copy_size: u32,
    /// Sector sizes in order, one entry per flash sector.
    pub sectors: &'static [u32],
    /// Chip family.
    pub family: ChipFamily,
}

/// Find the descriptor for an identification word pair.
///
/// Scans from the end of the catalog so later, more specific entries win
/// ties. Entries demanding a secondary word only match when one was read
/// and its low byte agrees.
#[must_use]
pub fn lookup(id: u32, id2: Option<u32>) -> Option<&'static DeviceDescriptor> {
    lookup_in(DEVICE_TABLE, id, id2)
}

fn lookup_in(table: &[DeviceDescriptor], id: u32, id2: Option<u32>) -> Option<&DeviceDescriptor> {
    table.iter().rev().find(|d| {
        d.id == id && (!d.eval_id2 || id2.is_some_and(|word| (word & 0xFF) == (d.id2 & 0xFF)))
    })
}

/// Whether any catalog entry for `id` requires the secondary word.
#[must_use]
pub fn wants_second_word(id: u32) -> bool {
    DEVICE_TABLE.iter().any(|d| d.id == id && d.eval_id2)
}

/// Flash or RAM target geometry derived from a descriptor and the image
/// placement.
///
/// RAM targets are programmed as one giant "sector" spanning the RAM left
/// above the bootloader reservation; flash targets take the descriptor's
/// geometry unchanged. Derived once after identification, never mutated.
#[derive(Debug)]
pub struct EffectiveDescriptor {
    /// The catalog entry this view was derived from.
    pub device: &'static DeviceDescriptor,
    /// Sector count, 1 for RAM targets.
    pub sector_count: usize,
    /// Max copy size, reduced by the RAM reservation for RAM targets.
    pub max_copy_size: u32,
    /// Sector sizes.
    pub sectors: Vec<u32>,
    /// True when the image loads into RAM instead of flash.
    pub ram_target: bool,
}

impl EffectiveDescriptor {
    /// Derive the geometry for an image of `length` bytes at `offset`.
    #[must_use]
    pub fn derive(device: &'static DeviceDescriptor, offset: u32, length: usize) -> Self {
        let family = device.family;
        let ram_size = device.ram_kib * 1024;
        let ram_end = u64::from(family.ram_start()) + u64::from(ram_size);
        let in_ram =
            offset >= family.ram_start() && u64::from(offset) + length as u64 <= ram_end;

        if in_ram {
            let usable = ram_size - (family.ram_base() - family.ram_start());
            Self {
                device,
                sector_count: 1,
                max_copy_size: usable,
                sectors: vec![usable],
                ram_target: true,
            }
        } else {
            Self {
                device,
                sector_count: device.sector_count as usize,
                max_copy_size: device.max_copy_size,
                sectors: device.sectors.to_vec(),
                ram_target: false,
            }
        }
    }
}
