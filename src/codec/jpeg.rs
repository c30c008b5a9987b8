//! JPEG decoding for encapsulated pixel data.
//!
//! Two decoders cover the JPEG transfer syntaxes:
//!
//! - [`BaselineJpegDecoder`]: baseline and extended (8-bit DCT) via the
//!   `image` crate; three-component output is already RGB
//! - [`LosslessJpegDecoder`]: process 14 lossless via `jpeg-decoder`, 8 or
//!   16 bits per sample
//!
//! The frame header (SOFn) is scanned before decoding so that the sample
//! precision and component count can be checked against the dataset.

use std::io::Cursor;

use image::{DynamicImage, ImageReader};

use crate::error::CodecError;

use super::frame::FrameInfo;
use super::pixels::PixelData;
use super::FrameDecoder;

// =============================================================================
// JPEG Markers
// =============================================================================

/// Start Of Image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image marker
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// Start Of Scan marker
pub const SOS: [u8; 2] = [0xFF, 0xDA];

// =============================================================================
// Frame Header
// =============================================================================

/// Contents of the SOFn segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegFrameHeader {
    /// Second byte of the SOF marker (0xC0..=0xCF)
    pub process: u8,
    pub precision: u8,
    pub height: u16,
    pub width: u16,
    pub components: u8,
}

impl JpegFrameHeader {
    pub fn is_lossless(&self) -> bool {
        matches!(self.process, 0xC3 | 0xC7 | 0xCB | 0xCF)
    }
}

/// Scan marker segments up to the first SOFn and parse it.
///
/// Returns `None` when the data does not start with SOI or no frame header
/// appears before the first scan.
pub fn read_frame_header(data: &[u8]) -> Option<JpegFrameHeader> {
    if data.len() < 4 || data[0..2] != SOI {
        return None;
    }

    let mut pos = 2;
    while pos + 3 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];

        // Fill bytes and standalone markers carry no length
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if marker == 0x01 || (0xD0..=0xD8).contains(&marker) {
            pos += 2;
            continue;
        }
        if [0xFF, marker] == SOS || [0xFF, marker] == EOI {
            return None;
        }

        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let is_sof = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let segment = data.get(pos + 4..pos + 2 + length)?;
            if segment.len() < 6 {
                return None;
            }
            return Some(JpegFrameHeader {
                process: marker,
                precision: segment[0],
                height: u16::from_be_bytes([segment[1], segment[2]]),
                width: u16::from_be_bytes([segment[3], segment[4]]),
                components: segment[5],
            });
        }
        pos += 2 + length;
    }

    None
}

fn check_dimensions(width: usize, height: usize, info: &FrameInfo) -> Result<(), CodecError> {
    if width != info.columns || height != info.rows {
        return Err(CodecError::Decode {
            message: format!(
                "JPEG is {}x{}, dataset declares {}x{}",
                width, height, info.columns, info.rows
            ),
        });
    }
    Ok(())
}

// =============================================================================
// Baseline
// =============================================================================

/// Decoder for JPEG baseline (`.4.50`) and extended (`.4.51`) frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineJpegDecoder;

impl BaselineJpegDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for BaselineJpegDecoder {
    fn name(&self) -> &'static str {
        "JPEG Baseline"
    }

    fn decode(&self, encoded: &[u8], info: &FrameInfo) -> Result<PixelData, CodecError> {
        if let Some(header) = read_frame_header(encoded) {
            if header.precision > 8 {
                return Err(CodecError::Decode {
                    message: format!(
                        "{}-bit DCT JPEG is not supported by the baseline decoder",
                        header.precision
                    ),
                });
            }
        }

        let reader = ImageReader::with_format(Cursor::new(encoded), image::ImageFormat::Jpeg);
        let img = reader.decode().map_err(|e| CodecError::Decode {
            message: e.to_string(),
        })?;
        check_dimensions(img.width() as usize, img.height() as usize, info)?;

        let samples = match (info.samples_per_pixel, img) {
            (1, DynamicImage::ImageLuma8(grey)) => grey.into_raw(),
            (1, other) => other.into_luma8().into_raw(),
            (_, other) => other.into_rgb8().into_raw(),
        };
        Ok(PixelData::U8(samples))
    }
}

// =============================================================================
// Lossless
// =============================================================================

/// Decoder for JPEG lossless (`.4.57`, `.4.70`) frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct LosslessJpegDecoder;

impl LosslessJpegDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for LosslessJpegDecoder {
    fn name(&self) -> &'static str {
        "JPEG Lossless"
    }

    fn decode(&self, encoded: &[u8], info: &FrameInfo) -> Result<PixelData, CodecError> {
        let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(encoded));
        let raw = decoder.decode().map_err(|e| CodecError::Decode {
            message: e.to_string(),
        })?;
        let metadata = decoder.info().ok_or_else(|| CodecError::Decode {
            message: "JPEG decoder returned no image info".to_string(),
        })?;
        check_dimensions(metadata.width as usize, metadata.height as usize, info)?;

        let components = match metadata.pixel_format {
            jpeg_decoder::PixelFormat::L8 | jpeg_decoder::PixelFormat::L16 => 1,
            jpeg_decoder::PixelFormat::RGB24 => 3,
            other => {
                return Err(CodecError::Decode {
                    message: format!("unsupported JPEG pixel format {:?}", other),
                });
            }
        };

        // Precisions other than 8 come out as native-endian u16 regardless
        // of the reported pixel format
        let samples = metadata.width as usize * metadata.height as usize * components;
        let wide: Vec<u16> = if samples > 0 && raw.len() == samples * 2 {
            raw.chunks_exact(2)
                .map(|c| u16::from_ne_bytes([c[0], c[1]]))
                .collect()
        } else {
            raw.iter().map(|&b| b as u16).collect()
        };

        if wide.len() < info.sample_count() {
            return Err(CodecError::Decode {
                message: format!(
                    "JPEG produced {} samples, expected {}",
                    wide.len(),
                    info.sample_count()
                ),
            });
        }

        let values = wide.into_iter().take(info.sample_count()).map(|v| {
            if info.signed {
                sign_extend(v, info.bits_stored) as i64
            } else {
                v as i64
            }
        });
        Ok(PixelData::from_i64(info.sample_type(), values))
    }
}

/// Interpret the low `bits` bits of `value` as two's complement.
fn sign_extend(value: u16, bits: u16) -> i16 {
    let bits = bits.clamp(1, 16);
    let shift = 16 - bits;
    ((value << shift) as i16) >> shift
}
