//! Variable-length integer coding.
//!
//! EBML VINTs use the count of leading zero bits in the first byte to
//! announce their length:
//! - `1xxx xxxx`: 1 byte, 7 data bits
//! - `01xx xxxx xxxx xxxx`: 2 bytes, 14 data bits
//! - and so on up to 8 bytes.
//!
//! Element IDs keep the marker bit as part of the value. Data sizes strip
//! it, and a size with every data bit set means "unknown".

use crate::stream::Stream;
use crate::{Error, Result};

/// Maximum length of an element ID in bytes.
pub const MAX_ID_LENGTH: u8 = 4;

/// Maximum length of a data size in bytes.
pub const MAX_SIZE_LENGTH: u8 = 8;

/// Length of a VINT from its first byte, or `None` for a zero byte.
fn length_from_first(first: u8) -> Option<u8> {
    if first == 0 {
        None
    } else {
        Some(first.leading_zeros() as u8 + 1)
    }
}

/// Largest value a size field of `len` bytes can carry (the all-ones
/// pattern is reserved for unknown sizes).
pub fn max_size_for_length(len: u8) -> u64 {
    (1u64 << (7 * u32::from(len))) - 2
}

/// Read an element ID at `offset`. Returns the ID and its byte length.
pub fn read_id<S: Stream + ?Sized>(stream: &mut S, offset: u64) -> Result<(u32, u8)> {
    let mut first = [0u8; 1];
    stream.read_at(offset, &mut first)?;
    let len = length_from_first(first[0]).ok_or(Error::InvalidElementId { offset })?;
    if len > MAX_ID_LENGTH {
        return Err(Error::InvalidElementId { offset });
    }

    let mut id = u32::from(first[0]);
    if len > 1 {
        let mut rest = [0u8; 3];
        stream.read_at(offset + 1, &mut rest[..len as usize - 1])?;
        for byte in &rest[..len as usize - 1] {
            id = (id << 8) | u32::from(*byte);
        }
    }
    Ok((id, len))
}

/// Read a data size at `offset`. `None` means the unknown-size marker.
pub fn read_size<S: Stream + ?Sized>(stream: &mut S, offset: u64) -> Result<(Option<u64>, u8)> {
    let mut first = [0u8; 1];
    stream.read_at(offset, &mut first)?;
    let len = length_from_first(first[0]).ok_or(Error::InvalidVint { offset })?;

    let mut value = u64::from(first[0] & 0xFFu8.checked_shr(u32::from(len)).unwrap_or(0));
    if len > 1 {
        let mut rest = [0u8; 7];
        stream.read_at(offset + 1, &mut rest[..len as usize - 1])?;
        for byte in &rest[..len as usize - 1] {
            value = (value << 8) | u64::from(*byte);
        }
    }

    let unknown = (1u64 << (7 * u32::from(len))) - 1;
    if value == unknown {
        Ok((None, len))
    } else {
        Ok((Some(value), len))
    }
}

/// Number of bytes an element ID occupies.
pub fn id_length(id: u32) -> u8 {
    match id {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    }
}

/// Encode an element ID.
pub fn encode_id(id: u32) -> Vec<u8> {
    let bytes = id.to_be_bytes();
    let len = id_length(id) as usize;
    bytes[4 - len..].to_vec()
}

/// Minimal number of bytes needed to encode `value` as a data size.
pub fn size_length(value: u64) -> u8 {
    (1..=MAX_SIZE_LENGTH)
        .find(|&len| value <= max_size_for_length(len))
        .unwrap_or(MAX_SIZE_LENGTH + 1)
}

/// Encode `value` as a data size using exactly `len` bytes.
pub fn encode_size_with_length(value: u64, len: u8) -> Result<Vec<u8>> {
    if len == 0 || len > MAX_SIZE_LENGTH || value > max_size_for_length(len) {
        return Err(Error::SizeTooLarge(value));
    }
    let marker = 1u64 << (7 * u32::from(len));
    let bytes = (value | marker).to_be_bytes();
    Ok(bytes[8 - len as usize..].to_vec())
}

/// Encode `value` as a data size in the fewest bytes.
pub fn encode_size(value: u64) -> Result<Vec<u8>> {
    encode_size_with_length(value, size_length(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryStream;

    #[test]
    fn test_read_id_lengths() {
        let mut s = MemoryStream::from(vec![0xEC, 0x1A, 0x45, 0xDF, 0xA3, 0x42, 0x82]);
        assert_eq!(read_id(&mut s, 0).unwrap(), (0xEC, 1));
        assert_eq!(read_id(&mut s, 1).unwrap(), (0x1A45DFA3, 4));
        assert_eq!(read_id(&mut s, 5).unwrap(), (0x4282, 2));
    }

    #[test]
    fn test_read_id_zero_byte() {
        let mut s = MemoryStream::from(vec![0x00]);
        assert!(matches!(
            read_id(&mut s, 0),
            Err(Error::InvalidElementId { offset: 0 })
        ));
    }

    #[test]
    fn test_read_id_too_long() {
        // 0x08 announces a five byte ID
        let mut s = MemoryStream::from(vec![0x08, 0, 0, 0, 0]);
        assert!(read_id(&mut s, 0).is_err());
    }

    #[test]
    fn test_read_size() {
        let mut s = MemoryStream::from(vec![
            0x81, 0x40, 0x81, 0xFF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        ]);
        assert_eq!(read_size(&mut s, 0).unwrap(), (Some(1), 1));
        assert_eq!(read_size(&mut s, 1).unwrap(), (Some(129), 2));
        assert_eq!(read_size(&mut s, 3).unwrap(), (None, 1));
        assert_eq!(read_size(&mut s, 4).unwrap(), (None, 8));
    }

    #[test]
    fn test_size_length_boundaries() {
        assert_eq!(size_length(0), 1);
        assert_eq!(size_length(126), 1);
        // 127 would be the unknown marker in one byte
        assert_eq!(size_length(127), 2);
        assert_eq!(size_length(16382), 2);
        assert_eq!(size_length(16383), 3);
        assert_eq!(size_length((1u64 << 56) - 2), 8);
        assert_eq!(size_length(u64::MAX), 9);
    }

    #[test]
    fn test_encode_size() {
        assert_eq!(encode_size(1).unwrap(), vec![0x81]);
        assert_eq!(encode_size(129).unwrap(), vec![0x40, 0x81]);
        assert_eq!(encode_size_with_length(1, 4).unwrap(), vec![0x10, 0, 0, 1]);
        assert!(matches!(
            encode_size_with_length(200, 1),
            Err(Error::SizeTooLarge(200))
        ));
        assert!(encode_size(u64::MAX).is_err());
    }

    #[test]
    fn test_encode_id() {
        assert_eq!(encode_id(0xEC), vec![0xEC]);
        assert_eq!(encode_id(0x4282), vec![0x42, 0x82]);
        assert_eq!(encode_id(0x2AD7B1), vec![0x2A, 0xD7, 0xB1]);
        assert_eq!(encode_id(0x18538067), vec![0x18, 0x53, 0x80, 0x67]);
    }

    #[test]
    fn test_forced_length_reads_back() {
        let encoded = encode_size_with_length(300, 8).unwrap();
        let mut s = MemoryStream::from(encoded);
        assert_eq!(read_size(&mut s, 0).unwrap(), (Some(300), 8));
    }
}
