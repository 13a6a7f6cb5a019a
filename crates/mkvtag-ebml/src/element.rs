//! Handles to EBML elements inside a stream.

use crate::stream::Stream;
use crate::vint;
use crate::{Error, Result};

/// Addressable EBML element.
///
/// The handle only stores the header layout; payloads are read from and
/// written to the stream on demand. `size() == header_size() + data_size()`
/// always holds, and every writer keeps it true after shifting the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    id: u32,
    offset: u64,
    id_len: u8,
    size_len: u8,
    data_size: u64,
    unknown_size: bool,
}

impl Element {
    /// Read the element header at `offset`.
    ///
    /// Returns `None` when `offset` is at or past `limit`. An element whose
    /// size field carries the unknown marker extends to `limit`.
    pub fn read<S: Stream + ?Sized>(stream: &mut S, offset: u64, limit: u64) -> Result<Option<Self>> {
        if offset >= limit {
            return Ok(None);
        }

        let (id, id_len) = vint::read_id(stream, offset)?;
        let size_offset = offset + u64::from(id_len);
        if size_offset >= limit {
            return Err(Error::ElementOverflow { id, offset });
        }
        let (size, size_len) = vint::read_size(stream, size_offset)?;
        let data_offset = size_offset + u64::from(size_len);
        if data_offset > limit {
            return Err(Error::ElementOverflow { id, offset });
        }

        let (data_size, unknown_size) = match size {
            Some(size) => (size, false),
            None => (limit - data_offset, true),
        };
        if data_size > limit - data_offset {
            return Err(Error::ElementOverflow { id, offset });
        }

        Ok(Some(Self {
            id,
            offset,
            id_len,
            size_len,
            data_size,
            unknown_size,
        }))
    }

    /// Element ID.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Absolute offset of the first header byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Length of ID plus size field.
    pub fn header_size(&self) -> u64 {
        u64::from(self.id_len) + u64::from(self.size_len)
    }

    /// Absolute offset of the first payload byte.
    pub fn data_offset(&self) -> u64 {
        self.offset + self.header_size()
    }

    /// Payload length.
    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    /// Total length including the header.
    pub fn size(&self) -> u64 {
        self.header_size() + self.data_size
    }

    /// Offset just past the element.
    pub fn end(&self) -> u64 {
        self.offset + self.size()
    }

    /// Whether the size field carries the unknown-size marker.
    pub fn is_unknown_size(&self) -> bool {
        self.unknown_size
    }

    /// Bound an unknown-size element at its last child.
    ///
    /// The element ends before the first child header whose ID is in
    /// `parent_level`, or before the first malformed header. Known-size
    /// elements are left alone.
    pub fn close_unknown_size<S: Stream + ?Sized>(
        &mut self,
        stream: &mut S,
        parent_level: &[u32],
    ) -> Result<()> {
        if !self.unknown_size {
            return Ok(());
        }
        let limit = self.end();
        let mut pos = self.data_offset();
        loop {
            match Element::read(stream, pos, limit) {
                Ok(Some(child)) if !parent_level.contains(&child.id()) => pos = child.end(),
                Ok(_) => break,
                Err(e) if e.is_malformed() => break,
                Err(e) => return Err(e),
            }
        }
        self.data_size = pos - self.data_offset();
        Ok(())
    }

    /// Move the handle after bytes before it were inserted or removed.
    pub fn shift(&mut self, delta: i64) {
        self.offset = self.offset.saturating_add_signed(delta);
    }

    /// Read all direct children.
    ///
    /// A malformed child header ends the list; everything readable before it
    /// is returned.
    pub fn children<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<Vec<Element>> {
        let mut children = Vec::new();
        let end = self.end();
        let mut pos = self.data_offset();

        loop {
            match Element::read(stream, pos, end) {
                Ok(Some(child)) => {
                    pos = child.end();
                    children.push(child);
                }
                Ok(None) => break,
                Err(e) if e.is_malformed() => {
                    tracing::warn!(
                        "Skipping rest of element 0x{:X} at {}: {}",
                        self.id,
                        self.offset,
                        e
                    );
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(children)
    }

    /// Read the raw payload.
    pub fn read_bytes<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<Vec<u8>> {
        stream.read_vec(self.data_offset(), self.data_size)
    }

    /// Read the payload as a UTF-8 string, stopping at the first NUL.
    pub fn read_string<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<String> {
        let data = self.read_bytes(stream)?;
        let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        Ok(String::from_utf8_lossy(&data[..end]).into_owned())
    }

    /// Read the payload as a big-endian unsigned integer.
    pub fn read_uint<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<u64> {
        if self.data_size > 8 {
            return Err(self.invalid_payload("uint"));
        }
        let data = self.read_bytes(stream)?;
        Ok(data.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    /// Read the payload as a big-endian two's complement integer.
    pub fn read_int<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<i64> {
        if self.data_size > 8 {
            return Err(self.invalid_payload("int"));
        }
        let data = self.read_bytes(stream)?;
        let Some(&first) = data.first() else {
            return Ok(0);
        };
        let init = if first & 0x80 != 0 { -1i64 } else { 0 };
        Ok(data.iter().fold(init, |acc, &b| (acc << 8) | i64::from(b)))
    }

    /// Read the payload as a 4 or 8 byte float. An empty payload is 0.0.
    pub fn read_float<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<f64> {
        let data = self.read_bytes(stream)?;
        match data.len() {
            0 => Ok(0.0),
            4 => Ok(f64::from(f32::from_be_bytes([
                data[0], data[1], data[2], data[3],
            ]))),
            8 => Ok(f64::from_be_bytes([
                data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
            ])),
            _ => Err(self.invalid_payload("float")),
        }
    }

    /// Replace the payload, shifting the rest of the stream.
    ///
    /// Returns the total number of bytes the element grew (or shrank) by,
    /// including any growth of the size field.
    pub fn write_bytes<S: Stream + ?Sized>(&mut self, stream: &mut S, data: &[u8]) -> Result<i64> {
        let data_delta = stream.replace(self.data_offset(), self.data_size, data)?;
        let header_delta = self.resize(stream, data_delta)?;
        Ok(data_delta + header_delta)
    }

    /// Replace the payload with a UTF-8 string.
    pub fn write_string<S: Stream + ?Sized>(&mut self, stream: &mut S, value: &str) -> Result<i64> {
        self.write_bytes(stream, value.as_bytes())
    }

    /// Replace the payload with an unsigned integer in the fewest bytes.
    pub fn write_uint<S: Stream + ?Sized>(&mut self, stream: &mut S, value: u64) -> Result<i64> {
        self.write_bytes(stream, &encode_uint(value))
    }

    /// Replace the payload with an 8 byte float.
    pub fn write_float<S: Stream + ?Sized>(&mut self, stream: &mut S, value: f64) -> Result<i64> {
        self.write_bytes(stream, &value.to_be_bytes())
    }

    /// Change the declared payload size by `delta`.
    ///
    /// The payload bytes themselves must already have been inserted or
    /// removed by the caller. The size field is rewritten in place when the
    /// new size still fits; otherwise it grows and the stream shifts. The
    /// returned value is the number of bytes the header grew by. Elements of
    /// unknown size keep their marker and always report 0.
    pub fn resize<S: Stream + ?Sized>(&mut self, stream: &mut S, delta: i64) -> Result<i64> {
        let new_size = self
            .data_size
            .checked_add_signed(delta)
            .ok_or(Error::ShiftOverflow)?;
        if self.unknown_size {
            self.data_size = new_size;
            return Ok(0);
        }

        let size_offset = self.offset + u64::from(self.id_len);
        let new_len = if new_size <= vint::max_size_for_length(self.size_len) {
            self.size_len
        } else {
            vint::size_length(new_size)
        };
        let encoded = vint::encode_size_with_length(new_size, new_len)?;
        let header_delta = stream.replace(size_offset, u64::from(self.size_len), &encoded)?;

        tracing::trace!(
            "Resized element 0x{:X} at {}: {} -> {} bytes",
            self.id,
            self.offset,
            self.data_size,
            new_size
        );
        self.size_len = new_len;
        self.data_size = new_size;
        Ok(header_delta)
    }

    /// Delete the element from the stream. Returns the (negative) delta.
    pub fn remove<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<i64> {
        tracing::trace!(
            "Removing element 0x{:X} at {} ({} bytes)",
            self.id,
            self.offset,
            self.size()
        );
        stream.remove(self.offset, self.size())
    }

    fn invalid_payload(&self, kind: &'static str) -> Error {
        Error::InvalidPayload {
            id: self.id,
            kind,
            size: self.data_size,
        }
    }
}

/// Encode an unsigned integer in the fewest bytes (at least one).
pub fn encode_uint(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[start..].to_vec()
}
