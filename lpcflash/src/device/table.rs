//! Static catalog of known LPC parts.
//!
//! One entry per part identification word, ordered so that later entries are
//! the more specific ones; [`lookup`](super::lookup) scans from the end.
//! Sizes are KiB, max copy size is bytes. Data collected from the NXP user
//! manuals (UM10120, UM10211 and friends).

use super::{ChipFamily, DeviceDescriptor};

/// LPC210x parts: fifteen uniform 8 KiB sectors.
pub(super) const SECTORS_210X: &[u32] = &[
    8192, 8192, 8192, 8192, 8192, 8192, 8192, 8192,
    8192, 8192, 8192, 8192, 8192, 8192, 8192,
];

/// LPC2103: eight uniform 4 KiB sectors.
pub(super) const SECTORS_2103: &[u32] = &[4096, 4096, 4096, 4096, 4096, 4096, 4096, 4096];

/// LPC2109: eight uniform 8 KiB sectors.
pub(super) const SECTORS_2109: &[u32] = &[8192, 8192, 8192, 8192, 8192, 8192, 8192, 8192];

/// LPC211x parts.
pub(super) const SECTORS_211X: &[u32] = &[
    8192, 8192, 8192, 8192, 8192, 8192, 8192, 8192,
    8192, 8192, 8192, 8192, 8192, 8192, 8192,
];

/// LPC212x parts: two 64 KiB sectors in the middle.
pub(super) const SECTORS_212X: &[u32] = &[
    8192, 8192, 8192, 8192, 8192, 8192, 8192, 8192,
    65536, 65536, 8192, 8192, 8192, 8192, 8192, 8192, 8192,
];

/// 500 KiB layout (LPC2138/2148) plus one extra 4 KiB block at the end for
/// the 504 KiB parts.
pub(super) const SECTORS_213X: &[u32] = &[
    4096, 4096, 4096, 4096, 4096, 4096, 4096, 4096,
    32768, 32768, 32768, 32768, 32768, 32768, 32768, 32768,
    32768, 32768, 32768, 32768, 32768, 32768, 4096, 4096,
    4096, 4096, 4096, 4096,
];

/// LPC17xx (and Cortex-M0/M3 relatives): 16 x 4 KiB then 14 x 32 KiB.
pub(super) const SECTORS_17XX: &[u32] = &[
    4096, 4096, 4096, 4096, 4096, 4096, 4096, 4096,
    4096, 4096, 4096, 4096, 4096, 4096, 4096, 4096,
    32768, 32768, 32768, 32768, 32768, 32768, 32768, 32768,
    32768, 32768, 32768, 32768, 32768, 32768,
];

const fn d(
    id: u32,
    name: &'static str,
    flash_kib: u32,
    ram_kib: u32,
    sector_count: u32,
    max_copy_size: u32,
    sectors: &'static [u32],
    family: ChipFamily,
) -> DeviceDescriptor {
    DeviceDescriptor {
        id,
        id2: 0,
        eval_id2: false,
        name,
        flash_kib,
        ram_kib,
        sector_count,
        max_copy_size,
        sectors,
        family,
    }
}

/// All known parts.
pub static DEVICE_TABLE: &[DeviceDescriptor] = &[
    d(0x2500102B, "1102", 32, 8, 8, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0A07102B, "1110.../002", 4, 1, 1, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x1A07102B, "1110.../002", 4, 1, 1, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0A16D02B, "1111.../002", 8, 2, 2, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x1A16D02B, "1111.../002", 8, 2, 2, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x041E502B, "1111.../101", 8, 2, 2, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x2516D02B, "1111.../102", 8, 2, 2, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0416502B, "1111.../201", 8, 4, 2, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x2516902B, "1111.../202", 8, 4, 2, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x042D502B, "1112.../101", 16, 2, 4, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x2524D02B, "1112.../102", 16, 2, 4, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0A24902B, "1112.../102", 16, 4, 4, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x1A24902B, "1112.../102", 16, 4, 4, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0425502B, "1112.../201", 16, 4, 4, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x2524902B, "1112.../202", 16, 4, 4, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0434502B, "1113.../201", 24, 4, 6, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x2532902B, "1113.../202", 24, 4, 6, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0434102B, "1113.../301", 24, 8, 6, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x2532102B, "1113.../302", 24, 8, 6, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0A40902B, "1114.../102", 32, 4, 8, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x1A40902B, "1114.../102", 32, 4, 8, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0444502B, "1114.../201", 32, 4, 8, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x2540902B, "1114.../202", 32, 4, 8, 1024, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0444102B, "1114.../301", 32, 8, 8, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x2540102B, "1114.../302", 32, 8, 8, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x1421102B, "11C12.../301", 16, 8, 4, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x1440102B, "11C14.../301", 32, 8, 8, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x1431102B, "11C22.../301", 16, 8, 4, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x1430102B, "11C24.../301", 32, 8, 8, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0364002B, "1224.../101", 32, 8, 4, 2048, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0364202B, "1224.../121", 48, 12, 32, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0365002B, "1225.../301", 64, 16, 32, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0365202B, "1225.../321", 80, 20, 32, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0366002B, "1226", 96, 24, 32, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x0367002B, "1227", 128, 32, 32, 4096, SECTORS_17XX, ChipFamily::Lpc11xx),
    d(0x2C42502B, "1311", 8, 4, 2, 1024, SECTORS_17XX, ChipFamily::Lpc13xx),
    d(0x1816902B, "1311/01", 8, 4, 2, 1024, SECTORS_17XX, ChipFamily::Lpc13xx),
    d(0x2C40102B, "1313", 32, 8, 8, 4096, SECTORS_17XX, ChipFamily::Lpc13xx),
    d(0x1830102B, "1313/01", 32, 8, 8, 4096, SECTORS_17XX, ChipFamily::Lpc13xx),
    d(0x3D01402B, "1342", 16, 4, 4, 1024, SECTORS_17XX, ChipFamily::Lpc13xx),
    d(0x3D00002B, "1343", 32, 8, 8, 4096, SECTORS_17XX, ChipFamily::Lpc13xx),
    d(0x25001118, "1751", 32, 8, 8, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x25001121, "1752", 64, 16, 16, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x25011722, "1754", 128, 32, 18, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x25011723, "1756", 256, 32, 22, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x25013F37, "1758", 512, 64, 30, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x25113737, "1759", 512, 64, 30, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x26011922, "1764", 128, 32, 18, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x26013733, "1765", 256, 64, 22, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x26013F33, "1766", 256, 64, 22, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x26012837, "1767", 512, 64, 30, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x26013F37, "1768", 512, 64, 30, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x26113F37, "1769", 512, 64, 30, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x27011132, "1774", 128, 40, 18, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x27191F43, "1776", 256, 80, 22, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x27193747, "1777", 512, 96, 30, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x27193F47, "1778", 512, 96, 30, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x281D1743, "1785", 256, 80, 22, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x281D1F43, "1786", 256, 80, 22, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x281D3747, "1787", 512, 96, 30, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x281D3F47, "1788", 512, 96, 30, 4096, SECTORS_17XX, ChipFamily::Lpc17xx),
    d(0x0004FF11, "2103", 32, 8, 8, 4096, SECTORS_2103, ChipFamily::Lpc2xxx),
    d(0xFFF0FF12, "2104", 128, 16, 15, 8192, SECTORS_210X, ChipFamily::Lpc2xxx),
    d(0xFFF0FF22, "2105", 128, 32, 15, 8192, SECTORS_210X, ChipFamily::Lpc2xxx),
    d(0xFFF0FF32, "2106", 128, 64, 15, 8192, SECTORS_210X, ChipFamily::Lpc2xxx),
    d(0x0201FF01, "2109", 64, 8, 8, 4096, SECTORS_2109, ChipFamily::Lpc2xxx),
    d(0x0101FF12, "2114", 128, 16, 15, 8192, SECTORS_211X, ChipFamily::Lpc2xxx),
    d(0x0201FF12, "2119", 128, 16, 15, 8192, SECTORS_211X, ChipFamily::Lpc2xxx),
    d(0x0101FF13, "2124", 256, 16, 17, 8192, SECTORS_212X, ChipFamily::Lpc2xxx),
    d(0x0201FF13, "2129", 256, 16, 17, 8192, SECTORS_212X, ChipFamily::Lpc2xxx),
    d(0x0002FF01, "2131", 32, 8, 8, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0002FF11, "2132", 64, 16, 9, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0002FF12, "2134", 128, 16, 11, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0002FF23, "2136", 256, 32, 15, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0002FF25, "2138", 512, 32, 27, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0402FF01, "2141", 32, 8, 8, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0402FF11, "2142", 64, 16, 9, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0402FF12, "2144", 128, 16, 11, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0402FF23, "2146", 256, 40, 15, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0402FF25, "2148", 512, 40, 27, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0301FF13, "2194", 256, 16, 17, 8192, SECTORS_212X, ChipFamily::Lpc2xxx),
    d(0x0301FF12, "2210", 0, 16, 0, 8192, SECTORS_211X, ChipFamily::Lpc2xxx),
    d(0x0401FF12, "2212", 128, 16, 15, 8192, SECTORS_211X, ChipFamily::Lpc2xxx),
    d(0x0601FF13, "2214", 256, 16, 17, 8192, SECTORS_212X, ChipFamily::Lpc2xxx),
    d(0x0401FF13, "2292", 256, 16, 17, 8192, SECTORS_212X, ChipFamily::Lpc2xxx),
    d(0x0501FF13, "2294", 256, 16, 17, 8192, SECTORS_212X, ChipFamily::Lpc2xxx),
    d(0x00000000, "2361", 128, 34, 11, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x00000000, "2362", 128, 34, 11, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0603FB02, "2364", 128, 34, 11, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1600F902, "2364", 128, 34, 11, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1600E823, "2365", 256, 58, 15, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0603FB23, "2366", 256, 58, 15, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1600F923, "2366", 256, 58, 15, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1600E825, "2367", 512, 58, 15, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0603FB25, "2368", 512, 58, 28, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1600F925, "2368", 512, 58, 28, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1700E825, "2377", 512, 58, 28, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x0703FF25, "2378", 512, 58, 28, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1600FD25, "2378", 512, 58, 28, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1700FD25, "2378", 512, 58, 28, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1700FF35, "2387", 512, 98, 28, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1800F935, "2387", 512, 98, 28, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1800FF35, "2388", 512, 98, 28, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1500FF35, "2458", 512, 98, 28, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1600FF30, "2460", 0, 98, 0, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1600FF35, "2468", 512, 98, 28, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1701FF30, "2470", 0, 98, 0, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
    d(0x1701FF35, "2478", 512, 98, 28, 4096, SECTORS_213X, ChipFamily::Lpc2xxx),
];
