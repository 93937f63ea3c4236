//! Bounds-checked little-endian readers over an immutable byte slice.
//!
//! Every read validates `offset + size <= len` first and reports a short
//! buffer as [`DecodeError::TruncatedInput`] tagged with the format being read.

use crate::error::DecodeError;
use crate::pixel::ImageFormat;

/// Random-access field reader for fixed-layout headers.
#[derive(Clone, Copy)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    format: ImageFormat,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8], format: ImageFormat) -> Self {
        Self { data, format }
    }

    /// Fail unless at least `len` bytes are present.
    pub(crate) fn require(&self, len: usize) -> Result<(), DecodeError> {
        if self.data.len() < len {
            return Err(DecodeError::truncated(self.format, len, self.data.len()));
        }
        Ok(())
    }

    pub(crate) fn bytes_at(&self, offset: usize, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = offset
            .checked_add(len)
            .ok_or(DecodeError::truncated(self.format, usize::MAX, self.data.len()))?;
        self.data
            .get(offset..end)
            .ok_or(DecodeError::truncated(self.format, end, self.data.len()))
    }

    fn array_at<const N: usize>(&self, offset: usize) -> Result<[u8; N], DecodeError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.bytes_at(offset, N)?);
        Ok(buf)
    }

    pub(crate) fn u8_at(&self, offset: usize) -> Result<u8, DecodeError> {
        Ok(self.array_at::<1>(offset)?[0])
    }

    pub(crate) fn u16_at(&self, offset: usize) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.array_at(offset)?))
    }

    pub(crate) fn u32_at(&self, offset: usize) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array_at(offset)?))
    }

    pub(crate) fn i32_at(&self, offset: usize) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.array_at(offset)?))
    }

    /// Sequential cursor starting at `offset`.
    pub(crate) fn cursor_at(&self, offset: usize) -> Cursor<'a> {
        Cursor {
            data: self.data,
            pos: offset,
            format: self.format,
        }
    }
}

/// Sequential reader used by the run-length decoders.
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    format: ImageFormat,
}

impl<'a> Cursor<'a> {
    #[cfg(test)]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, DecodeError> {
        match self.data.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(b)
            }
            None => Err(DecodeError::truncated(
                self.format,
                self.pos + 1,
                self.data.len(),
            )),
        }
    }

    pub(crate) fn read_slice(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.saturating_add(n);
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(DecodeError::truncated(self.format, end, self.data.len()))?;
        self.pos = end;
        Ok(slice)
    }
}
