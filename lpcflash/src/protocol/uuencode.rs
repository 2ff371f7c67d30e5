//! UUencode line codec used for staging data into bootloader RAM.
//!
//! The boot ROM accepts write payloads as printable uuencoded lines: a
//! length prefix character followed by 4 characters per 3 input bytes, each
//! character carrying 6 bits offset into the printable range. The all-zero
//! group is mapped to backtick (0x60) instead of space, which some ROM
//! revisions swallow.

/// Raw bytes carried by one full uuencoded line.
pub const LINE_BYTES: usize = 45;

/// Lines per checksum group (900 raw bytes).
pub const LINES_PER_GROUP: usize = 20;

/// Map a 6-bit value to its printable character.
const fn encode6(v: u8) -> u8 {
    if v == 0 { 0x60 } else { 0x20 + v }
}

/// Inverse of [`encode6`]; `None` for bytes outside the printable range.
const fn decode6(c: u8) -> Option<u8> {
    match c {
        0x60 => Some(0),
        0x20..=0x5f => Some(c - 0x20),
        _ => None,
    }
}

/// Encode up to [`LINE_BYTES`] raw bytes as one uuencoded line, without the
/// line terminator.
#[must_use]
pub fn encode_line(data: &[u8]) -> Vec<u8> {
    debug_assert!(!data.is_empty() && data.len() <= LINE_BYTES);

    #[allow(clippy::cast_possible_truncation)]
    let mut line = vec![0x20 + data.len() as u8];
    for chunk in data.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);
        line.push(encode6(b0 >> 2));
        line.push(encode6(((b0 & 0x03) << 4) | (b1 >> 4)));
        line.push(encode6(((b1 & 0x0f) << 2) | (b2 >> 6)));
        line.push(encode6(b2 & 0x3f));
    }
    line
}

/// Decode one uuencoded line (without terminator) back to raw bytes.
///
/// Returns `None` when the length prefix and character count disagree, or
/// when a character falls outside the uuencode range.
#[must_use]
pub fn decode_line(line: &[u8]) -> Option<Vec<u8>> {
    let (&prefix, rest) = line.split_first()?;
    let len = prefix.checked_sub(0x20)? as usize;
    if len == 0 || len > LINE_BYTES || rest.len() != len.div_ceil(3) * 4 {
        return None;
    }

    let mut data = Vec::with_capacity(len);
    for quad in rest.chunks(4) {
        let v: Vec<u8> = quad.iter().map(|&c| decode6(c)).collect::<Option<_>>()?;
        data.push((v[0] << 2) | (v[1] >> 4));
        data.push((v[1] << 4) | (v[2] >> 2));
        data.push((v[2] << 6) | v[3]);
    }
    data.truncate(len);
    Some(data)
}

/// Running checksum over raw bytes, modulo 2^32.
#[must_use]
pub fn byte_sum(data: &[u8]) -> u32 {
    data.iter()
        .fold(0u32, |sum, &b| sum.wrapping_add(u32::from(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_line_prefix_is_m() {
        let line = encode_line(&[0xAA; LINE_BYTES]);
        assert_eq!(line[0], b'M');
        assert_eq!(line.len(), 1 + LINE_BYTES.div_ceil(3) * 4);
    }

    #[test]
    fn test_zero_group_maps_to_backtick() {
        let line = encode_line(&[0u8; 3]);
        assert_eq!(line, [0x23, 0x60, 0x60, 0x60, 0x60]);
    }

    #[test]
    fn test_known_encoding() {
        // "Cat" encodes to "#0V%T" in classic uuencode; the zero-substitute
        // table only differs for the all-zero group.
        let line = encode_line(b"Cat");
        assert_eq!(line, b"#0V%T");
    }

    #[test]
    fn test_roundtrip_all_lengths() {
        for len in 1..=LINE_BYTES {
            let data: Vec<u8> = (0..len)
                .map(|i| (i * 37 + len) as u8)
                .collect();
            let decoded = decode_line(&encode_line(&data)).unwrap();
            assert_eq!(decoded, data);
        }
    }

    #[test]
    fn test_roundtrip_full_group() {
        let data: Vec<u8> = (0..LINE_BYTES * LINES_PER_GROUP)
            .map(|i| (i % 251) as u8)
            .collect();
        let mut decoded = Vec::new();
        for chunk in data.chunks(LINE_BYTES) {
            decoded.extend(decode_line(&encode_line(chunk)).unwrap());
        }
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_byte_sum_matches_arithmetic_sum() {
        let data: Vec<u8> = (0..=255u8).collect();
        assert_eq!(byte_sum(&data), (0..=255u32).sum::<u32>());
        assert_eq!(byte_sum(&[]), 0);
    }

    #[test]
    fn test_byte_sum_wraps() {
        // 2^32 / 255 rounded up keeps the fold in wrapping territory.
        let data = vec![0xFFu8; 20_000_000];
        let expected = (20_000_000u64 * 255 % (1 << 32)) as u32;
        assert_eq!(byte_sum(&data), expected);
    }

    #[test]
    fn test_decode_rejects_bad_length() {
        assert!(decode_line(b"").is_none());
        // Prefix claims 3 bytes but carries two quads.
        assert!(decode_line(b"#0V%T0V%T").is_none());
    }

    #[test]
    fn test_decode_rejects_unprintable_bytes() {
        let mut line = encode_line(&[0x11; 3]);
        line[2] = 0x1F;
        assert!(decode_line(&line).is_none());
        let mut line = encode_line(&[0x11; 3]);
        line[4] = 0x7F;
        assert!(decode_line(&line).is_none());
    }
}
