//! JPEG 2000 decoding for encapsulated pixel data.
//!
//! Only single-component, single-tile codestreams are decoded. The SIZ
//! marker segment is read before handing the stream to OpenJPEG so that
//! anything else is rejected up front instead of being decoded partially.
//!
//! # SIZ Segment
//!
//! ```text
//! FF4F            SOC
//! FF51 Lsiz       SIZ marker and segment length
//! Rsiz            capabilities (u16)
//! Xsiz Ysiz       reference grid size (u32 each)
//! XOsiz YOsiz     image offset (u32 each)
//! XTsiz YTsiz     tile size (u32 each)
//! XTOsiz YTOsiz   tile offset (u32 each)
//! Csiz            component count (u16)
//! ```

use crate::error::CodecError;
use crate::io::{read_u16_be, read_u32_be};

use super::frame::FrameInfo;
use super::pixels::PixelData;
use super::FrameDecoder;

/// Start of codestream marker
pub const SOC: [u8; 2] = [0xFF, 0x4F];

/// Image and tile size marker
pub const SIZ: [u8; 2] = [0xFF, 0x51];

/// JP2 file format signature box
pub const JP2_SIGNATURE: [u8; 12] = [
    0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20, 0x0D, 0x0A, 0x87, 0x0A,
];

/// Bytes from SOC to the end of Csiz
const SIZ_MIN_LEN: usize = 2 + 2 + 2 + 2 + 8 * 4 + 2;

// =============================================================================
// SIZ Parsing
// =============================================================================

/// Image and tiling layout of a codestream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jpeg2000Layout {
    pub width: u32,
    pub height: u32,
    pub components: u16,
    pub tiles: u32,
}

/// Locate the codestream inside a JP2 file, or return the input when it is
/// already a raw codestream.
fn codestream(data: &[u8]) -> Option<&[u8]> {
    if data.starts_with(&SOC) {
        return Some(data);
    }
    if !data.starts_with(&JP2_SIGNATURE) {
        return None;
    }

    let mut pos = 0;
    while pos + 8 <= data.len() {
        let mut length = read_u32_be(&data[pos..pos + 4]) as usize;
        let box_type = &data[pos + 4..pos + 8];
        let mut header = 8;
        if length == 1 {
            if pos + 16 > data.len() {
                return None;
            }
            length = u64::from_be_bytes(data[pos + 8..pos + 16].try_into().ok()?) as usize;
            header = 16;
        } else if length == 0 {
            length = data.len() - pos;
        }
        if box_type == b"jp2c" {
            return data.get(pos + header..);
        }
        if length < header {
            return None;
        }
        pos += length;
    }
    None
}

/// Read the SIZ segment of a codestream or JP2 file.
pub fn read_layout(data: &[u8]) -> Result<Jpeg2000Layout, CodecError> {
    let stream = codestream(data).ok_or_else(|| CodecError::Decode {
        message: "data is neither a JPEG 2000 codestream nor a JP2 file".to_string(),
    })?;
    if stream.len() < SIZ_MIN_LEN || stream[2..4] != SIZ {
        return Err(CodecError::Decode {
            message: "JPEG 2000 codestream does not start with SOC, SIZ".to_string(),
        });
    }

    let field = |index: usize| read_u32_be(&stream[8 + index * 4..12 + index * 4]);
    let (width, height) = (field(0), field(1));
    let (x_offset, y_offset) = (field(2), field(3));
    let (tile_width, tile_height) = (field(4), field(5));
    let (tile_x_offset, tile_y_offset) = (field(6), field(7));
    let components = read_u16_be(&stream[40..42]);

    if tile_width == 0 || tile_height == 0 || width <= x_offset || height <= y_offset {
        return Err(CodecError::Decode {
            message: "JPEG 2000 SIZ segment describes an empty image".to_string(),
        });
    }

    let tiles_x = (width - tile_x_offset.min(width)).div_ceil(tile_width);
    let tiles_y = (height - tile_y_offset.min(height)).div_ceil(tile_height);

    Ok(Jpeg2000Layout {
        width: width - x_offset,
        height: height - y_offset,
        components,
        tiles: tiles_x.saturating_mul(tiles_y),
    })
}

// =============================================================================
// Decoder
// =============================================================================

/// Decoder for JPEG 2000 (`.4.90`, `.4.91`) frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jpeg2000Decoder;

impl Jpeg2000Decoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for Jpeg2000Decoder {
    fn name(&self) -> &'static str {
        "JPEG 2000"
    }

    fn decode(&self, encoded: &[u8], info: &FrameInfo) -> Result<PixelData, CodecError> {
        let layout = read_layout(encoded)?;
        if layout.components != 1 || layout.tiles != 1 {
            return Err(CodecError::UnsupportedJpeg2000 {
                components: layout.components,
                tiles: layout.tiles,
            });
        }
        if layout.width as usize != info.columns || layout.height as usize != info.rows {
            return Err(CodecError::Decode {
                message: format!(
                    "JPEG 2000 image is {}x{}, dataset declares {}x{}",
                    layout.width, layout.height, info.columns, info.rows
                ),
            });
        }

        let image = jpeg2k::Image::from_bytes(encoded).map_err(|e| CodecError::Decode {
            message: e.to_string(),
        })?;
        let component = image.components().first().ok_or_else(|| CodecError::Decode {
            message: "JPEG 2000 image has no components".to_string(),
        })?;

        component_samples(component.data(), info)
    }
}

/// Map decoded component samples onto the dataset's sample type.
///
/// OpenJPEG already sign-extends signed components, so values pass through
/// unchanged and only the storage width follows bits allocated.
pub fn component_samples(data: &[i32], info: &FrameInfo) -> Result<PixelData, CodecError> {
    let pixels = info.pixel_count();
    if data.len() < pixels {
        return Err(CodecError::Decode {
            message: format!(
                "JPEG 2000 produced {} samples, expected {}",
                data.len(),
                pixels
            ),
        });
    }

    let values = data[..pixels].iter().map(|&v| v as i64);
    Ok(PixelData::from_i64(info.sample_type(), values))
}
