//! Construction of brand-new elements.
//!
//! Elements are rendered into memory first: children are finished before
//! their parent so the parent's size is known when its header is encoded.

use bytes::{BufMut, BytesMut};

use crate::element::{encode_uint, Element};
use crate::stream::Stream;
use crate::vint;
use crate::{ids, Error, Result};

/// In-memory builder for a master or leaf element.
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    id: u32,
    body: BytesMut,
}

impl ElementBuilder {
    /// Start an element with an empty payload.
    pub fn new(id: u32) -> Self {
        Self {
            id,
            body: BytesMut::new(),
        }
    }

    /// Element ID.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Current payload length.
    pub fn body_len(&self) -> u64 {
        self.body.len() as u64
    }

    /// Whether no child has been added yet.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Length of the finished element with a minimal size field.
    pub fn encoded_len(&self) -> u64 {
        let size = self.body_len();
        u64::from(vint::id_length(self.id)) + u64::from(vint::size_length(size)) + size
    }

    /// Append a leaf element with a raw payload.
    pub fn binary(&mut self, id: u32, data: &[u8]) -> Result<&mut Self> {
        put_header(&mut self.body, id, data.len() as u64, None)?;
        self.body.put_slice(data);
        Ok(self)
    }

    /// Append a UTF-8 string element.
    pub fn string(&mut self, id: u32, value: &str) -> Result<&mut Self> {
        self.binary(id, value.as_bytes())
    }

    /// Append an unsigned integer element.
    pub fn uint(&mut self, id: u32, value: u64) -> Result<&mut Self> {
        self.binary(id, &encode_uint(value))
    }

    /// Append an 8 byte float element.
    pub fn float(&mut self, id: u32, value: f64) -> Result<&mut Self> {
        put_header(&mut self.body, id, 8, None)?;
        self.body.put_f64(value);
        Ok(self)
    }

    /// Append a finished child element.
    pub fn child(&mut self, child: ElementBuilder) -> Result<&mut Self> {
        put_header(&mut self.body, child.id, child.body_len(), None)?;
        self.body.put_slice(&child.body);
        Ok(self)
    }

    /// Append already encoded bytes, such as Void padding.
    pub fn raw(&mut self, data: &[u8]) -> &mut Self {
        self.body.put_slice(data);
        self
    }

    /// Render the element with a minimal size field.
    pub fn build(self) -> Result<BytesMut> {
        self.render(None)
    }

    /// Render the element with a size field of exactly `size_len` bytes.
    pub fn build_with_size_length(self, size_len: u8) -> Result<BytesMut> {
        self.render(Some(size_len))
    }

    /// Render the element and insert it into `stream` at `offset`.
    pub fn insert_at<S: Stream + ?Sized>(self, stream: &mut S, offset: u64) -> Result<Element> {
        let bytes = self.build()?;
        let len = bytes.len() as u64;
        stream.insert(offset, &bytes)?;
        Element::read(stream, offset, offset + len)?.ok_or(Error::ShiftOverflow)
    }

    fn render(self, size_len: Option<u8>) -> Result<BytesMut> {
        let mut out = BytesMut::with_capacity(self.body.len() + 12);
        put_header(&mut out, self.id, self.body_len(), size_len)?;
        out.put_slice(&self.body);
        Ok(out)
    }
}

fn put_header(buf: &mut BytesMut, id: u32, size: u64, size_len: Option<u8>) -> Result<()> {
    buf.put_slice(&vint::encode_id(id));
    let encoded = match size_len {
        Some(len) => vint::encode_size_with_length(size, len)?,
        None => vint::encode_size(size)?,
    };
    buf.put_slice(&encoded);
    Ok(())
}

/// Render a single Void element occupying exactly `total` bytes.
pub fn void_padding(total: u64) -> Result<Vec<u8>> {
    if total < 2 {
        return Err(Error::VoidTooSmall(total));
    }
    for size_len in 1..=vint::MAX_SIZE_LENGTH {
        let Some(data_len) = total.checked_sub(1 + u64::from(size_len)) else {
            break;
        };
        if data_len <= vint::max_size_for_length(size_len) {
            let mut out = Vec::with_capacity(total as usize);
            out.push(ids::VOID as u8);
            out.extend(vint::encode_size_with_length(data_len, size_len)?);
            out.resize(total as usize, 0);
            return Ok(out);
        }
    }
    Err(Error::VoidTooSmall(total))
}
