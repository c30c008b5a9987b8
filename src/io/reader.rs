use bytes::Bytes;

use crate::error::FormatError;

// =============================================================================
// Endian Helpers
// =============================================================================
//
// DICOM streams are little-endian except for the explicit VR big-endian
// transfer syntax, which switches byte order after the meta group. Callers
// slice exactly the value width; a shorter slice panics.

macro_rules! endian_fns {
    ($($ty:ty => $le:ident, $be:ident;)*) => {
        $(
            #[inline]
            pub fn $le(bytes: &[u8]) -> $ty {
                const N: usize = std::mem::size_of::<$ty>();
                let mut buf = [0u8; N];
                buf.copy_from_slice(&bytes[..N]);
                <$ty>::from_le_bytes(buf)
            }

            #[inline]
            pub fn $be(bytes: &[u8]) -> $ty {
                const N: usize = std::mem::size_of::<$ty>();
                let mut buf = [0u8; N];
                buf.copy_from_slice(&bytes[..N]);
                <$ty>::from_be_bytes(buf)
            }
        )*
    };
}

endian_fns! {
    u16 => read_u16_le, read_u16_be;
    u32 => read_u32_le, read_u32_be;
    u64 => read_u64_le, read_u64_be;
}

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order of multi-byte values in a DICOM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    pub fn is_big_endian(self) -> bool {
        self == ByteOrder::BigEndian
    }

    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        if self.is_big_endian() { read_u16_be(bytes) } else { read_u16_le(bytes) }
    }

    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        if self.is_big_endian() { read_u32_be(bytes) } else { read_u32_le(bytes) }
    }

    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        if self.is_big_endian() { read_u64_be(bytes) } else { read_u64_le(bytes) }
    }
}

// =============================================================================
// ByteReader
// =============================================================================

/// Bounds-checked cursor over an in-memory buffer.
///
/// Every read that would run past the end of the buffer returns
/// [`FormatError::Truncated`] instead of panicking. Slices returned by
/// [`ByteReader::take`] share the underlying allocation.
#[derive(Debug, Clone)]
pub struct ByteReader {
    data: Bytes,
    pos: usize,
    order: ByteOrder,
}

impl ByteReader {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: Bytes, order: ByteOrder) -> Self {
        Self { data, pos: 0, order }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    #[inline]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// Move the cursor to an absolute offset.
    pub fn seek(&mut self, pos: usize) -> Result<(), FormatError> {
        if pos > self.data.len() {
            return Err(FormatError::Truncated {
                offset: self.pos,
                needed: pos.saturating_sub(self.pos),
                available: self.remaining(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    fn check(&self, len: usize) -> Result<(), FormatError> {
        if len > self.remaining() {
            return Err(FormatError::Truncated {
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Borrow the next `len` bytes without advancing.
    pub fn peek(&self, len: usize) -> Result<&[u8], FormatError> {
        self.check(len)?;
        Ok(&self.data[self.pos..self.pos + len])
    }

    /// Take the next `len` bytes as a shared slice and advance.
    pub fn take(&mut self, len: usize) -> Result<Bytes, FormatError> {
        self.check(len)?;
        let slice = self.data.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), FormatError> {
        self.check(len)?;
        self.pos += len;
        Ok(())
    }

    pub fn read_u16(&mut self) -> Result<u16, FormatError> {
        let value = self.order.read_u16(self.peek(2)?);
        self.pos += 2;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32, FormatError> {
        let value = self.order.read_u32(self.peek(4)?);
        self.pos += 4;
        Ok(value)
    }

    /// Read a u16 in little-endian order regardless of the reader's byte order.
    pub fn read_u16_le(&mut self) -> Result<u16, FormatError> {
        let value = read_u16_le(self.peek(2)?);
        self.pos += 2;
        Ok(value)
    }

    /// Read a u32 in little-endian order regardless of the reader's byte order.
    pub fn read_u32_le(&mut self) -> Result<u32, FormatError> {
        let value = read_u32_le(self.peek(4)?);
        self.pos += 4;
        Ok(value)
    }
}
