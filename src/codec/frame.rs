//! Frame attributes and per-frame byte range extraction.

use bytes::{Bytes, BytesMut};

use crate::error::{CodecError, FormatError};
use crate::format::dicom::Fragments;
use crate::format::dicom::Dataset;

use super::color::Photometric;
use super::jpeg::SOI;
use super::jpeg2000::{JP2_SIGNATURE, SOC};
use super::pixels::SampleType;

// =============================================================================
// FrameInfo
// =============================================================================

/// Image pixel attributes shared by every frame of an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    pub rows: usize,
    pub columns: usize,
    pub samples_per_pixel: usize,
    pub bits_allocated: u16,
    pub bits_stored: u16,
    /// Pixel representation 1
    pub signed: bool,
    pub planar_configuration: u16,
    pub photometric: Photometric,
    /// Number of frames in the instance
    pub frames: usize,
}

impl FrameInfo {
    /// Read and validate the image pixel attributes of a dataset.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self, CodecError> {
        let rows = dataset.rows(0);
        if rows == 0 {
            return Err(CodecError::MissingTag("Rows"));
        }
        let columns = dataset.columns(0);
        if columns == 0 {
            return Err(CodecError::MissingTag("Columns"));
        }
        let bits_allocated = dataset.bits_allocated(0);
        if !matches!(bits_allocated, 1 | 8 | 12 | 16 | 32) {
            return Err(if bits_allocated == 0 {
                CodecError::MissingTag("BitsAllocated")
            } else {
                CodecError::InvalidAttribute {
                    tag: "BitsAllocated",
                    message: format!("{} is not one of 1, 8, 12, 16, 32", bits_allocated),
                }
            });
        }

        let samples_per_pixel = dataset.samples_per_pixel(1) as usize;
        if samples_per_pixel != 1 && samples_per_pixel != 3 {
            return Err(CodecError::InvalidAttribute {
                tag: "SamplesPerPixel",
                message: format!("{} is not 1 or 3", samples_per_pixel),
            });
        }

        let photometric = match dataset.photometric_interpretation() {
            Some(term) => Photometric::parse(term),
            None if samples_per_pixel == 3 => Photometric::Rgb,
            None => Photometric::Monochrome2,
        };

        let bits_stored = match dataset.bits_stored(bits_allocated) {
            0 => bits_allocated,
            stored => stored.min(bits_allocated),
        };

        Ok(Self {
            rows: rows as usize,
            columns: columns as usize,
            samples_per_pixel,
            bits_allocated,
            bits_stored,
            signed: dataset.pixel_representation(0) == 1,
            planar_configuration: dataset.planar_configuration(0),
            photometric,
            frames: dataset.number_of_frames(1),
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.rows * self.columns
    }

    /// Samples in one decoded frame.
    pub fn sample_count(&self) -> usize {
        self.pixel_count() * self.samples_per_pixel
    }

    /// Whether native frames store chroma at half horizontal resolution.
    pub fn is_chroma_subsampled(&self) -> bool {
        self.samples_per_pixel == 3 && self.photometric == Photometric::YbrFull422
    }

    /// Samples stored per native frame (two per pixel for YBR_FULL_422).
    pub fn stored_sample_count(&self) -> usize {
        if self.is_chroma_subsampled() {
            self.pixel_count() * 2
        } else {
            self.sample_count()
        }
    }

    /// Bits occupied by one native frame.
    pub fn frame_bits(&self) -> usize {
        self.stored_sample_count() * self.bits_allocated as usize
    }

    /// Sample type the native and lossless paths produce.
    pub fn sample_type(&self) -> SampleType {
        match (self.bits_allocated, self.signed) {
            (1, _) => SampleType::U8,
            (8, false) => SampleType::U8,
            (8, true) => SampleType::I8,
            (32, false) => SampleType::U32,
            (32, true) => SampleType::I32,
            (_, false) => SampleType::U16,
            (_, true) => SampleType::I16,
        }
    }

    /// Attributes as seen by a decoder of an encapsulated syntax: decoded
    /// samples are always pixel-interleaved and full resolution.
    pub fn for_decoded_stream(&self) -> Self {
        let mut info = self.clone();
        info.planar_configuration = 0;
        if info.photometric == Photometric::YbrFull422 {
            info.photometric = Photometric::YbrFull;
        }
        info
    }

    pub(crate) fn check_frame(&self, frame: usize) -> Result<(), CodecError> {
        if frame >= self.frames {
            return Err(CodecError::FrameOutOfBounds {
                index: frame,
                count: self.frames,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Native Frames
// =============================================================================

/// Encoded bytes of one native frame.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeFrame {
    pub data: Bytes,
    /// Bit offset of the first sample inside `data[0]` (1- and 12-bit images)
    pub bit_offset: usize,
}

/// Slice frame `frame` out of native pixel data.
///
/// Frames are contiguous, so frame `i` starts at bit `i * frame_bits`. 1-bit
/// frames and 12-bit frames of an odd sample count can start mid-byte.
pub fn native_frame(
    data: &Bytes,
    info: &FrameInfo,
    frame: usize,
) -> Result<NativeFrame, CodecError> {
    let frame_bits = info.frame_bits();
    let start_bit = frame * frame_bits;
    let start = start_bit / 8;
    let bit_offset = start_bit % 8;
    let len = (bit_offset + frame_bits).div_ceil(8);

    if start + len > data.len() {
        return Err(FormatError::Truncated {
            offset: start,
            needed: len,
            available: data.len().saturating_sub(start),
        }
        .into());
    }

    Ok(NativeFrame {
        data: data.slice(start..start + len),
        bit_offset,
    })
}

// =============================================================================
// Encapsulated Frames
// =============================================================================

/// Collect the encoded codestream of frame `frame` from encapsulated data.
///
/// # Frame Mapping
///
/// 1. One fragment per frame when the counts agree
/// 2. All fragments for single-frame images
/// 3. Basic offset table ranges when the table has one entry per frame
/// 4. Otherwise fragments are grouped by codestream start markers (JPEG SOI,
///    JPEG 2000 SOC, JP2 signature)
pub fn encapsulated_frame(
    fragments: &Fragments,
    frame: usize,
    frame_count: usize,
) -> Result<Bytes, CodecError> {
    if fragments.is_empty() {
        return Err(CodecError::Decode {
            message: "encapsulated pixel data has no fragments".to_string(),
        });
    }
    if frame >= frame_count {
        return Err(CodecError::FrameOutOfBounds {
            index: frame,
            count: frame_count,
        });
    }

    if fragments.len() == frame_count {
        return Ok(fragments.fragments[frame].clone());
    }

    if frame_count == 1 {
        return Ok(concat(&fragments.fragments));
    }

    if fragments.offset_table.len() == frame_count {
        let start = fragments.offset_table[frame] as u64;
        let end = fragments
            .offset_table
            .get(frame + 1)
            .map(|&o| o as u64)
            .unwrap_or(u64::MAX);
        let selected: Vec<Bytes> = fragments
            .item_offsets()
            .into_iter()
            .zip(&fragments.fragments)
            .filter(|(offset, _)| *offset >= start && *offset < end)
            .map(|(_, fragment)| fragment.clone())
            .collect();
        if selected.is_empty() {
            return Err(CodecError::Decode {
                message: format!(
                    "basic offset table entry {} for frame {} matches no fragment",
                    start, frame
                ),
            });
        }
        return Ok(concat(&selected));
    }

    let groups = group_by_start_marker(&fragments.fragments);
    let group = groups.get(frame).ok_or(CodecError::FrameOutOfBounds {
        index: frame,
        count: groups.len(),
    })?;
    Ok(concat(group))
}

fn is_codestream_start(fragment: &[u8]) -> bool {
    fragment.starts_with(&SOI) || fragment.starts_with(&SOC) || fragment.starts_with(&JP2_SIGNATURE)
}

fn group_by_start_marker(fragments: &[Bytes]) -> Vec<Vec<Bytes>> {
    let mut groups: Vec<Vec<Bytes>> = Vec::new();
    for fragment in fragments {
        match groups.last_mut() {
            Some(group) if !is_codestream_start(fragment) => group.push(fragment.clone()),
            _ => groups.push(vec![fragment.clone()]),
        }
    }
    groups
}

fn concat(parts: &[Bytes]) -> Bytes {
    if let [single] = parts {
        return single.clone();
    }
    let mut out = BytesMut::with_capacity(parts.iter().map(Bytes::len).sum());
    for part in parts {
        out.extend_from_slice(part);
    }
    out.freeze()
}
