//! Intel HEX parser.
//!
//! Produces a flat [`Image`] from the textual record stream. The per-record
//! checksum byte is not verified; only length and type consistency are
//! enforced, which matches how real toolchain output is consumed in
//! practice.

use log::debug;

use super::Image;
use crate::error::{Error, Result};

/// Maximum addressable span of one image: the load offset keeps only these
/// bits, 22 low bits = 4 MB per block.
const FLASH_MASK: u32 = 0xFFC0_0000;

struct Cursor<'a> {
    text: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn hex_digit(&mut self) -> Result<u32> {
        let b = *self
            .text
            .get(self.pos)
            .ok_or_else(|| Error::InvalidHexFile("unexpected end of file".into()))?;
        self.pos += 1;
        match b {
            b'0'..=b'9' => Ok(u32::from(b - b'0')),
            b'A'..=b'F' => Ok(u32::from(b - b'A' + 10)),
            b'a'..=b'f' => Ok(u32::from(b - b'a' + 10)),
            _ => Err(Error::InvalidHexFile(format!(
                "non-hex digit {:?} at offset {}",
                char::from(b),
                self.pos - 1
            ))),
        }
    }

    fn byte(&mut self) -> Result<u32> {
        Ok(self.hex_digit()? << 4 | self.hex_digit()?)
    }

    fn word(&mut self) -> Result<u32> {
        Ok(self.byte()? << 8 | self.byte()?)
    }
}

/// Parse an Intel HEX stream into an image.
pub(super) fn parse(text: &[u8]) -> Result<Image> {
    let mut cur = Cursor { text, pos: 0 };
    let mut data: Vec<u8> = Vec::new();
    // Load offset, once a type-04 record establishes one.
    let mut load_offset: Option<u32> = None;
    let mut start_address = 0u32;
    // Base contributed by the last type 02/04 record; data record
    // addresses add to it. A segment base keeps its low bits, so this
    // cannot be folded into the record address by masking.
    let mut upper_base = 0u32;

    loop {
        // Records begin at a colon; anything between records (line
        // terminators, junk, the checksum byte we skipped) is ignored.
        match cur.text[cur.pos..].iter().position(|&b| b == b':') {
            Some(skip) => cur.pos += skip + 1,
            None => break,
        }

        let length = cur.byte()? as usize;
        let record_address = cur.word()?;
        let record_type = cur.byte()?;

        match record_type {
            // Data.
            0x00 => {
                let linear = upper_base + record_address;
                let offset = load_offset.unwrap_or(0);
                let dest = linear.checked_sub(offset).ok_or_else(|| {
                    Error::InvalidHexFile(format!(
                        "data record at {linear:#010x} below load offset {offset:#010x}"
                    ))
                })? as usize;
                if dest + length > data.len() {
                    data.resize(dest + length, 0xFF);
                }
                for slot in &mut data[dest..dest + length] {
                    #[allow(clippy::cast_possible_truncation)]
                    {
                        *slot = cur.byte()? as u8;
                    }
                }
            },
            // End of file.
            0x01 => break,
            // Extended segment address.
            0x02 => {
                if length != 2 {
                    return Err(Error::InvalidHexFile(
                        "type 02 record with bad length".into(),
                    ));
                }
                upper_base = cur.word()? << 4;
            },
            // Start segment address (CS:IP).
            0x03 => {
                if length != 4 {
                    return Err(Error::InvalidHexFile(
                        "type 03 record with bad length".into(),
                    ));
                }
                let cs = cur.word()?;
                let ip = cur.word()?;
                start_address = cs * 16 + ip;
            },
            // Extended linear address.
            0x04 => {
                if length != 2 {
                    return Err(Error::InvalidHexFile(
                        "type 04 record with bad length".into(),
                    ));
                }
                upper_base = cur.word()? << 16;
                let masked = upper_base & FLASH_MASK;
                match load_offset {
                    None => {
                        debug!("hex image load offset {masked:#010x}");
                        load_offset = Some(masked);
                    },
                    Some(established) if established != masked => {
                        return Err(Error::AddressRange {
                            established,
                            found: masked,
                        });
                    },
                    Some(_) => {},
                }
            },
            // Start linear address.
            0x05 => {
                if length != 4 {
                    return Err(Error::InvalidHexFile(
                        "type 05 record with bad length".into(),
                    ));
                }
                start_address = cur.word()? << 16 | cur.word()?;
            },
            #[allow(clippy::cast_possible_truncation)]
            other => return Err(Error::UnsupportedRecord(other as u8)),
        }
        // The checksum byte is left for the colon scan to skip.
    }

    Ok(Image {
        data,
        offset: load_offset.unwrap_or(0),
        start_address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal Intel HEX writer used to exercise the round-trip property.
    fn encode_as_hex(data: &[u8], upper: Option<u16>) -> Vec<u8> {
        let mut out = String::new();
        if let Some(upper) = upper {
            let sum = 2u32 + 4 + u32::from(upper >> 8) + u32::from(upper & 0xFF);
            out.push_str(&format!(
                ":02000004{upper:04X}{:02X}\n",
                (sum.wrapping_neg()) & 0xFF
            ));
        }
        for (i, chunk) in data.chunks(16).enumerate() {
            let addr = i * 16;
            let mut sum = chunk.len() as u32 + (addr as u32 >> 8) + (addr as u32 & 0xFF);
            out.push_str(&format!(":{:02X}{addr:04X}00", chunk.len()));
            for &b in chunk {
                sum += u32::from(b);
                out.push_str(&format!("{b:02X}"));
            }
            out.push_str(&format!("{:02X}\n", sum.wrapping_neg() & 0xFF));
        }
        out.push_str(":00000001FF\n");
        out.into_bytes()
    }

    #[test]
    fn test_roundtrip() {
        let data: Vec<u8> = (0..100u32).map(|i| (i * 7) as u8).collect();
        let image = Image::from_hex(&encode_as_hex(&data, None)).unwrap();
        assert_eq!(image.data, data);
        assert_eq!(image.offset, 0);
    }

    #[test]
    fn test_type_04_establishes_load_offset() {
        let data = vec![0x11u8; 16];
        let image = Image::from_hex(&encode_as_hex(&data, Some(0x4000))).unwrap();
        assert_eq!(image.offset, 0x4000_0000);
        assert_eq!(image.data, data);
    }

    #[test]
    fn test_conflicting_type_04_is_range_error() {
        let hex = b":020000040000FA\n:0200000480007A\n:00000001FF\n";
        match Image::from_hex(hex) {
            Err(Error::AddressRange { established, found }) => {
                assert_eq!(established, 0);
                assert_eq!(found, 0x8000_0000);
            },
            other => panic!("expected range error, got {other:?}"),
        }
    }

    #[test]
    fn test_type_02_segment_addressing() {
        // Segment 0x100 places the record at linear 0x1000.
        let hex = b":020000020100FB\n:0400000001020304F2\n:00000001FF\n";
        let image = Image::from_hex(hex).unwrap();
        assert_eq!(image.len(), 0x1004);
        assert_eq!(&image.data[0x1000..0x1004], &[1, 2, 3, 4]);
        // The gap reads as erased flash.
        assert_eq!(image.data[0], 0xFF);
    }

    #[test]
    fn test_type_02_base_adds_to_record_address() {
        // Segment 0xFFF gives base 0xFFF0; a record at 0x0018 must land at
        // 0x10008, carrying into bits the base does not cover.
        let hex = b":020000020FFFEE\n:0400180001020304DA\n:00000001FF\n";
        let image = Image::from_hex(hex).unwrap();
        assert_eq!(image.len(), 0x1000C);
        assert_eq!(&image.data[0x10008..0x1000C], &[1, 2, 3, 4]);
        assert_eq!(image.data[0xFFF8], 0xFF);
    }

    #[test]
    fn test_type_03_start_segment_address() {
        let hex = b":0400000312345678E5\n:00000001FF\n";
        let image = Image::from_hex(hex).unwrap();
        assert_eq!(image.start_address, 0x1234 * 16 + 0x5678);
    }

    #[test]
    fn test_type_05_start_linear_address() {
        let hex = b":04000005000002C134\n:00000001FF\n";
        let image = Image::from_hex(hex).unwrap();
        assert_eq!(image.start_address, 0x2C1);
    }

    #[test]
    fn test_unsupported_record_type() {
        let hex = b":020000060000F8\n";
        assert!(matches!(
            Image::from_hex(hex),
            Err(Error::UnsupportedRecord(0x06))
        ));
    }

    #[test]
    fn test_bad_digit_is_invalid_hex() {
        let hex = b":02zz00000000FC\n";
        assert!(matches!(
            Image::from_hex(hex),
            Err(Error::InvalidHexFile(_))
        ));
    }

    #[test]
    fn test_checksum_byte_not_verified() {
        // Deliberately wrong checksum still parses.
        let hex = b":0100000042AA\n:00000001FF\n";
        let image = Image::from_hex(hex).unwrap();
        assert_eq!(image.data[0], 0x42);
    }

    #[test]
    fn test_length_padded_to_word() {
        let data = vec![0xAA; 5];
        let image = Image::from_hex(&encode_as_hex(&data, None)).unwrap();
        assert_eq!(image.len(), 8);
        assert_eq!(image.data[5], 0xFF);
    }

    #[test]
    fn test_stops_at_end_of_file_record() {
        // A data record after EOF is ignored.
        let hex = b":00000001FF\n:01000000AA55\n";
        let image = Image::from_hex(hex).unwrap();
        assert!(image.is_empty());
    }
}
