//! Target memory images and their loaders.

mod hex;

use byteorder::{ByteOrder, LittleEndian};
use log::warn;

use crate::error::Result;

/// Number of vector table bytes participating in the boot checksum.
const VECTOR_TABLE_LEN: usize = 32;

/// A flat, offset-addressable image of target memory.
///
/// Produced by one of the loaders and owned by the programming session;
/// after loading it is only touched by the vector-checksum patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Image bytes. Gaps between hex records are filled with `0xFF`, the
    /// flash erased value.
    pub data: Vec<u8>,
    /// Load offset: where `data[0]` lives in the target address space.
    pub offset: u32,
    /// Entry address from a type 03/05 record, or 0.
    pub start_address: u32,
}

impl Image {
    /// Load an Intel HEX image.
    pub fn from_hex(text: &[u8]) -> Result<Self> {
        let mut image = hex::parse(text)?;
        image.pad_to_word();
        Ok(image)
    }

    /// Wrap a raw binary image placed at `offset`.
    #[must_use]
    pub fn from_binary(data: Vec<u8>, offset: u32) -> Self {
        let mut image = Self {
            data,
            offset,
            start_address: offset,
        };
        image.pad_to_word();
        image
    }

    /// Image length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte at `index`, reading `0xFF` (erased flash) past the end.
    ///
    /// Transfer chunks are rounded up to multiples the boot ROM accepts, so
    /// staging may read a little past the image.
    #[must_use]
    pub fn staged_byte(&self, index: usize) -> u8 {
        self.data.get(index).copied().unwrap_or(0xFF)
    }

    /// Round the length up to a multiple of 4, padding with `0xFF`.
    fn pad_to_word(&mut self) {
        let rem = self.data.len() % 4;
        if rem != 0 {
            let padded = self.data.len() + 4 - rem;
            warn!(
                "image length {} is not a multiple of 4, padding to {padded}",
                self.data.len()
            );
            self.data.resize(padded, 0xFF);
        }
    }

    /// Patch the vector-table checksum so the first 32 bytes sum to zero.
    ///
    /// Zeroes the 4-byte field at `vector_offset`, sums the first 8
    /// little-endian words and stores the negated sum in the field. The
    /// boot ROM refuses to start user code unless this holds, which is also
    /// what makes an interrupted flash recoverable: sector 0 is invalidated
    /// first and rewritten last.
    pub fn patch_vector_checksum(&mut self, vector_offset: usize) {
        if self.data.len() < VECTOR_TABLE_LEN {
            self.data.resize(VECTOR_TABLE_LEN, 0xFF);
        }
        for b in &mut self.data[vector_offset..vector_offset + 4] {
            *b = 0;
        }
        let mut sum = 0u32;
        for word in self.data[..VECTOR_TABLE_LEN].chunks_exact(4) {
            sum = sum.wrapping_add(LittleEndian::read_u32(word));
        }
        LittleEndian::write_u32(
            &mut self.data[vector_offset..vector_offset + 4],
            sum.wrapping_neg(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector_word_sum(data: &[u8]) -> u32 {
        data[..VECTOR_TABLE_LEN]
            .chunks_exact(4)
            .fold(0u32, |acc, w| acc.wrapping_add(LittleEndian::read_u32(w)))
    }

    #[test]
    fn test_checksum_patch_sums_to_zero() {
        let seeds: [Vec<u8>; 3] = [
            vec![0u8; 64],
            (0..64u8).collect(),
            vec![0xFF; 64],
        ];
        for (offset, seed) in [(0x14, &seeds[0]), (0x1C, &seeds[1]), (0x14, &seeds[2])] {
            let mut image = Image::from_binary(seed.clone(), 0);
            image.patch_vector_checksum(offset);
            assert_eq!(vector_word_sum(&image.data), 0, "offset {offset:#x}");
            // Bytes outside the patched field are untouched.
            assert_eq!(image.data[..offset], seed[..offset]);
            assert_eq!(image.data[offset + 4..64], seed[offset + 4..]);
        }
    }

    #[test]
    fn test_checksum_patch_grows_short_image() {
        let mut image = Image::from_binary(vec![0x12; 8], 0);
        image.patch_vector_checksum(0x14);
        assert_eq!(image.len(), VECTOR_TABLE_LEN);
        assert_eq!(vector_word_sum(&image.data), 0);
    }

    #[test]
    fn test_binary_image_padded_to_word() {
        let image = Image::from_binary(vec![1, 2, 3, 4, 5], 0);
        assert_eq!(image.len(), 8);
        assert_eq!(&image.data[..5], &[1, 2, 3, 4, 5]);
        assert_eq!(&image.data[5..], &[0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_staged_byte_past_end_is_erased_value() {
        let image = Image::from_binary(vec![0xAB; 4], 0);
        assert_eq!(image.staged_byte(3), 0xAB);
        assert_eq!(image.staged_byte(4), 0xFF);
        assert_eq!(image.staged_byte(4096), 0xFF);
    }
}
