//! Random-access byte streams with insert/remove support.
//!
//! Every size change of an EBML element is a physical shift of all trailing
//! bytes. [`Stream::replace`] is the single primitive that performs it; the
//! backends only need positional reads, positional writes and truncation.

use crate::{Error, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

/// Chunk size used when shifting trailing data.
const SHIFT_CHUNK: u64 = 1024 * 1024;

/// A seekable byte stream that can grow and shrink in place.
pub trait Stream {
    /// Current length in bytes.
    fn len(&mut self) -> Result<u64>;

    /// Fill `buf` with the bytes starting at `offset`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Overwrite bytes starting at `offset`, extending the stream if needed.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()>;

    /// Truncate or extend the stream to `len` bytes.
    fn set_len(&mut self, len: u64) -> Result<()>;

    /// Whether the stream holds no bytes.
    fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read `len` bytes at `offset` into a new buffer.
    fn read_vec(&mut self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let len = usize::try_from(len).map_err(|_| Error::ShiftOverflow)?;
        let mut buf = vec![0u8; len];
        self.read_at(offset, &mut buf)?;
        Ok(buf)
    }

    /// Replace the `old_len` bytes at `offset` with `data`.
    ///
    /// Everything after the replaced range moves by the difference in length.
    /// Returns that difference.
    fn replace(&mut self, offset: u64, old_len: u64, data: &[u8]) -> Result<i64> {
        let total = self.len()?;
        let tail_start = offset.checked_add(old_len).ok_or(Error::ShiftOverflow)?;
        if tail_start > total {
            return Err(Error::ShiftOverflow);
        }
        let new_len = data.len() as u64;

        if new_len > old_len {
            let grow = new_len - old_len;
            // Back to front so no byte is overwritten before it is moved.
            let mut end = total;
            while end > tail_start {
                let chunk = SHIFT_CHUNK.min(end - tail_start);
                let start = end - chunk;
                let buf = self.read_vec(start, chunk)?;
                self.write_at(start + grow, &buf)?;
                end = start;
            }
        } else if new_len < old_len {
            let shrink = old_len - new_len;
            let mut pos = tail_start;
            while pos < total {
                let chunk = SHIFT_CHUNK.min(total - pos);
                let buf = self.read_vec(pos, chunk)?;
                self.write_at(pos - shrink, &buf)?;
                pos += chunk;
            }
            self.set_len(total - shrink)?;
        }

        self.write_at(offset, data)?;
        Ok(new_len as i64 - old_len as i64)
    }

    /// Insert `data` at `offset`, shifting the rest of the stream forward.
    fn insert(&mut self, offset: u64, data: &[u8]) -> Result<i64> {
        self.replace(offset, 0, data)
    }

    /// Remove `len` bytes at `offset`, shifting the rest of the stream back.
    fn remove(&mut self, offset: u64, len: u64) -> Result<i64> {
        self.replace(offset, len, &[])
    }
}

impl Stream for File {
    fn len(&mut self) -> Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)?;
        Ok(())
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(data)?;
        Ok(())
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        File::set_len(self, len)?;
        Ok(())
    }
}

/// An in-memory stream, used for buffers and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStream {
    data: Vec<u8>,
}

impl MemoryStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the current contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the stream and return its contents.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for MemoryStream {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl Stream for MemoryStream {
    fn len(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let start = usize::try_from(offset).map_err(|_| Error::ShiftOverflow)?;
        let end = start + buf.len();
        if end > self.data.len() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("read of {} bytes at {} past end", buf.len(), offset),
            )));
        }
        buf.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let start = usize::try_from(offset).map_err(|_| Error::ShiftOverflow)?;
        let end = start + data.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(data);
        Ok(())
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        let len = usize::try_from(len).map_err(|_| Error::ShiftOverflow)?;
        self.data.resize(len, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_grow() {
        let mut s = MemoryStream::from(b"abcdef".to_vec());
        let delta = s.replace(2, 1, b"XYZ").unwrap();
        assert_eq!(delta, 2);
        assert_eq!(s.as_slice(), b"abXYZdef");
    }

    #[test]
    fn test_replace_shrink() {
        let mut s = MemoryStream::from(b"abcdef".to_vec());
        let delta = s.replace(1, 3, b"Q").unwrap();
        assert_eq!(delta, -2);
        assert_eq!(s.as_slice(), b"aQef");
    }

    #[test]
    fn test_insert_and_remove() {
        let mut s = MemoryStream::from(b"hello".to_vec());
        s.insert(5, b" world").unwrap();
        assert_eq!(s.as_slice(), b"hello world");
        assert_eq!(s.remove(0, 6).unwrap(), -6);
        assert_eq!(s.as_slice(), b"world");
    }

    #[test]
    fn test_replace_past_end_fails() {
        let mut s = MemoryStream::from(b"abc".to_vec());
        assert!(matches!(s.replace(2, 5, b""), Err(Error::ShiftOverflow)));
    }

    #[test]
    fn test_read_past_end_fails() {
        let mut s = MemoryStream::from(b"abc".to_vec());
        let mut buf = [0u8; 4];
        assert!(matches!(s.read_at(0, &mut buf), Err(Error::Io(_))));
    }

    #[test]
    fn test_file_stream_shift() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_at(0, b"0123456789").unwrap();
        file.insert(3, b"---").unwrap();
        assert_eq!(file.read_vec(0, 13).unwrap(), b"012---3456789");
        file.remove(0, 6).unwrap();
        assert_eq!(Stream::len(&mut file).unwrap(), 7);
        assert_eq!(file.read_vec(0, 7).unwrap(), b"3456789");
    }
}
