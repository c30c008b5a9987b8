//! RLE Lossless decoding.
//!
//! # Frame Layout
//!
//! ```text
//! Bytes 0-3:   number of segments (1..=15)
//! Bytes 4-63:  15 segment offsets (u32 LE, from the start of the frame)
//! Bytes 64-:   PackBits segments
//! ```
//!
//! Each segment holds one byte plane of one sample: for 16-bit RGB the order
//! is R-high, R-low, G-high, G-low, B-high, B-low.

use crate::error::CodecError;
use crate::io::read_u32_le;

use super::frame::FrameInfo;
use super::pixels::{PixelData, SampleType};
use super::FrameDecoder;

/// Size of the RLE header
const HEADER_LEN: usize = 64;

/// Maximum number of segments the header can describe
const MAX_SEGMENTS: usize = 15;

/// Decoder for RLE Lossless (1.2.840.10008.1.2.5) frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct RleDecoder;

impl RleDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for RleDecoder {
    fn name(&self) -> &'static str {
        "RLE Lossless"
    }

    fn decode(&self, encoded: &[u8], info: &FrameInfo) -> Result<PixelData, CodecError> {
        decode_rle(encoded, info)
    }
}

/// Decode one RLE frame into pixel-interleaved samples.
pub fn decode_rle(encoded: &[u8], info: &FrameInfo) -> Result<PixelData, CodecError> {
    if encoded.len() < HEADER_LEN {
        return Err(CodecError::Decode {
            message: format!("RLE frame of {} bytes has no header", encoded.len()),
        });
    }

    let segment_count = read_u32_le(&encoded[0..4]) as usize;
    if segment_count == 0 || segment_count > MAX_SEGMENTS {
        return Err(CodecError::Decode {
            message: format!("invalid RLE segment count {}", segment_count),
        });
    }

    let bytes_per_sample = match info.bits_allocated {
        8 => 1,
        16 => 2,
        32 => 4,
        other => {
            return Err(CodecError::InvalidAttribute {
                tag: "BitsAllocated",
                message: format!("RLE does not support {}-bit samples", other),
            });
        }
    };
    let spp = info.samples_per_pixel;
    let expected = spp * bytes_per_sample;
    if segment_count != expected {
        return Err(CodecError::Decode {
            message: format!(
                "RLE frame has {} segments, expected {} for {} sample(s) of {} bits",
                segment_count, expected, spp, info.bits_allocated
            ),
        });
    }

    let offsets: Vec<usize> = (0..segment_count)
        .map(|i| read_u32_le(&encoded[4 + i * 4..8 + i * 4]) as usize)
        .collect();

    let pixels = info.pixel_count();
    let mut values = vec![0u32; pixels * spp];

    for (segment, &start) in offsets.iter().enumerate() {
        let end = offsets
            .get(segment + 1)
            .copied()
            .unwrap_or(encoded.len())
            .min(encoded.len());
        if start < HEADER_LEN || start > end {
            return Err(CodecError::Decode {
                message: format!("RLE segment {} has invalid range {}..{}", segment, start, end),
            });
        }

        let plane = unpack_bits(&encoded[start..end], pixels);
        if plane.len() < pixels {
            return Err(CodecError::Decode {
                message: format!(
                    "RLE segment {} decoded to {} bytes, expected {}",
                    segment,
                    plane.len(),
                    pixels
                ),
            });
        }

        // Segments are most significant byte first within each sample
        let sample = segment / bytes_per_sample;
        let shift = 8 * (bytes_per_sample - 1 - segment % bytes_per_sample);
        for (pixel, &byte) in plane.iter().enumerate() {
            values[pixel * spp + sample] |= (byte as u32) << shift;
        }
    }

    Ok(to_pixel_data(values, info))
}

/// PackBits decode, stopping once `limit` bytes were produced.
///
/// A header byte `n` in `0..=127` copies the next `n + 1` bytes, `-127..=-1`
/// repeats the next byte `1 - n` times, and `-128` is a no-op.
pub fn unpack_bits(data: &[u8], limit: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(limit);
    let mut pos = 0;

    while pos < data.len() && out.len() < limit {
        let n = data[pos] as i8;
        pos += 1;
        match n {
            0..=127 => {
                let len = (n as usize + 1).min(data.len() - pos);
                out.extend_from_slice(&data[pos..pos + len]);
                pos += len;
            }
            -127..=-1 => {
                let Some(&byte) = data.get(pos) else {
                    break;
                };
                pos += 1;
                let run = (1 - n as isize) as usize;
                out.extend(std::iter::repeat(byte).take(run));
            }
            -128 => {}
        }
    }

    out.truncate(limit);
    out
}

fn to_pixel_data(values: Vec<u32>, info: &FrameInfo) -> PixelData {
    let values = values.into_iter();
    match info.sample_type() {
        SampleType::U8 => PixelData::U8(values.map(|v| v as u8).collect()),
        SampleType::I8 => PixelData::I8(values.map(|v| v as u8 as i8).collect()),
        SampleType::U16 => PixelData::U16(values.map(|v| v as u16).collect()),
        SampleType::I16 => PixelData::I16(values.map(|v| v as u16 as i16).collect()),
        SampleType::U32 => PixelData::U32(values.collect()),
        SampleType::I32 => PixelData::I32(values.map(|v| v as i32).collect()),
    }
}
