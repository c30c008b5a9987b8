//! Uncompressed pixel data unpacking.
//!
//! # Bit Layouts
//!
//! ```text
//! 1-bit:  8 pixels per byte, least significant bit first
//! 8-bit:  1 byte per sample
//! 12-bit: 3 bytes per 2 samples, LSB-first bit stream
//!         p0 = b0 | (b1 & 0x0F) << 8
//!         p1 = (b1 >> 4) | b2 << 4
//! 16/32:  read in the transfer syntax byte order
//! ```

use crate::error::{CodecError, FormatError};
use crate::io::ByteOrder;

use super::frame::{FrameInfo, NativeFrame};
use super::pixels::PixelData;

/// Unpack one native frame to typed samples.
///
/// `swap_ow_bytes` is set for 8-bit data stored as OW in a big endian stream,
/// where each byte pair was written swapped.
pub fn decode_native(
    frame: &NativeFrame,
    info: &FrameInfo,
    order: ByteOrder,
    swap_ow_bytes: bool,
) -> Result<PixelData, CodecError> {
    let count = info.stored_sample_count();
    let data = &frame.data[..];

    let needed = (frame.bit_offset + count * info.bits_allocated as usize).div_ceil(8);
    if data.len() < needed {
        return Err(FormatError::Truncated {
            offset: 0,
            needed,
            available: data.len(),
        }
        .into());
    }

    let pixels = match info.bits_allocated {
        1 => PixelData::U8(unpack_1bit(data, frame.bit_offset, count)),
        8 => {
            let bytes = if swap_ow_bytes {
                swap_pairs(&data[..count.next_multiple_of(2).min(data.len())])
            } else {
                data[..count].to_vec()
            };
            if info.signed {
                PixelData::I8(bytes[..count].iter().map(|&b| b as i8).collect())
            } else {
                PixelData::U8(bytes[..count].to_vec())
            }
        }
        12 => {
            let values = unpack_12bit(data, frame.bit_offset, count);
            if info.signed {
                PixelData::I16(values.into_iter().map(sign_extend_12).collect())
            } else {
                PixelData::U16(values)
            }
        }
        16 => {
            let values = data.chunks_exact(2).take(count).map(|c| order.read_u16(c));
            if info.signed {
                PixelData::I16(values.map(|v| v as i16).collect())
            } else {
                PixelData::U16(values.collect())
            }
        }
        32 => {
            let values = data.chunks_exact(4).take(count).map(|c| order.read_u32(c));
            if info.signed {
                PixelData::I32(values.map(|v| v as i32).collect())
            } else {
                PixelData::U32(values.collect())
            }
        }
        other => {
            return Err(CodecError::InvalidAttribute {
                tag: "BitsAllocated",
                message: format!("cannot unpack {}-bit samples", other),
            });
        }
    };

    Ok(pixels)
}

/// One byte (0 or 1) per pixel, least significant bit first.
pub fn unpack_1bit(data: &[u8], bit_offset: usize, count: usize) -> Vec<u8> {
    (0..count)
        .map(|i| {
            let bit = bit_offset + i;
            (data[bit / 8] >> (bit % 8)) & 1
        })
        .collect()
}

/// 12-bit samples from an LSB-first bit stream starting `bit_offset` bits
/// into `data[0]`.
///
/// Frames of an odd sample count end mid-byte, so every other frame of a
/// multi-frame image starts at bit offset 4.
pub fn unpack_12bit(data: &[u8], bit_offset: usize, count: usize) -> Vec<u16> {
    (0..count)
        .map(|i| {
            let bit = bit_offset + i * 12;
            let byte = bit / 8;
            let lo = data.get(byte).copied().unwrap_or(0) as u32;
            let hi = data.get(byte + 1).copied().unwrap_or(0) as u32;
            (((lo | hi << 8) >> (bit % 8)) & 0x0FFF) as u16
        })
        .collect()
}

#[inline]
fn sign_extend_12(value: u16) -> i16 {
    ((value << 4) as i16) >> 4
}

fn swap_pairs(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    for pair in out.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
    out
}
