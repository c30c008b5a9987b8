//! Photometric interpretation handling.
//!
//! Every decode path funnels through [`normalize`], which turns the decoder's
//! raw samples into either a single grey channel or pixel-interleaved RGB:
//!
//! - MONOCHROME1/2 pass through
//! - RGB passes through, de-interleaving planar data first
//! - YBR_FULL is converted with the fixed full-range YCbCr matrix
//! - YBR_FULL_422 (native only) is upsampled, then converted
//! - PALETTE COLOR is mapped through the RGB lookup tables

use std::fmt;

use crate::error::CodecError;
use crate::format::dicom::tags::{tags, Tag};
use crate::format::dicom::{Dataset, Element};
use crate::io::ByteOrder;

use super::frame::FrameInfo;
use super::pixels::{PixelData, SampleType};

// =============================================================================
// Photometric
// =============================================================================

/// Photometric Interpretation (0028,0004).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Photometric {
    /// Grey, minimum sample is white
    Monochrome1,
    /// Grey, minimum sample is black
    #[default]
    Monochrome2,
    Rgb,
    YbrFull,
    /// Chroma subsampled horizontally by two
    YbrFull422,
    YbrPartial422,
    YbrIct,
    YbrRct,
    PaletteColor,
    /// Anything else, kept verbatim
    Other(String),
}

impl Photometric {
    pub fn parse(term: &str) -> Self {
        match term.trim_matches(|c: char| c == ' ' || c == '\0') {
            "MONOCHROME1" => Photometric::Monochrome1,
            "MONOCHROME2" => Photometric::Monochrome2,
            "RGB" => Photometric::Rgb,
            "YBR_FULL" => Photometric::YbrFull,
            "YBR_FULL_422" => Photometric::YbrFull422,
            "YBR_PARTIAL_422" => Photometric::YbrPartial422,
            "YBR_ICT" => Photometric::YbrIct,
            "YBR_RCT" => Photometric::YbrRct,
            "PALETTE COLOR" => Photometric::PaletteColor,
            other => Photometric::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Photometric::Monochrome1 => "MONOCHROME1",
            Photometric::Monochrome2 => "MONOCHROME2",
            Photometric::Rgb => "RGB",
            Photometric::YbrFull => "YBR_FULL",
            Photometric::YbrFull422 => "YBR_FULL_422",
            Photometric::YbrPartial422 => "YBR_PARTIAL_422",
            Photometric::YbrIct => "YBR_ICT",
            Photometric::YbrRct => "YBR_RCT",
            Photometric::PaletteColor => "PALETTE COLOR",
            Photometric::Other(term) => term,
        }
    }

    pub fn is_monochrome(&self) -> bool {
        matches!(self, Photometric::Monochrome1 | Photometric::Monochrome2)
    }

    /// YCbCr family members.
    pub fn is_ybr(&self) -> bool {
        matches!(
            self,
            Photometric::YbrFull
                | Photometric::YbrFull422
                | Photometric::YbrPartial422
                | Photometric::YbrIct
                | Photometric::YbrRct
        )
    }
}

impl fmt::Display for Photometric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Palette
// =============================================================================

/// RGB lookup tables of a PALETTE COLOR image.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    first_mapped: i64,
    /// Bits per table entry (8 or 16)
    bits: u16,
    red: Vec<u16>,
    green: Vec<u16>,
    blue: Vec<u16>,
}

/// First mapped value and bits per entry of one channel.
struct Descriptor {
    first_mapped: i64,
    bits: u16,
}

impl Palette {
    /// Load the three tables from a dataset.
    ///
    /// `order` is the byte order of the dataset's transfer syntax, used for
    /// tables stored as 16-bit words. `signed` follows pixel representation
    /// and decides how the first-mapped value is read.
    pub fn from_dataset(
        dataset: &Dataset,
        order: ByteOrder,
        signed: bool,
    ) -> Result<Self, CodecError> {
        let (red, descriptor) = read_channel(
            dataset,
            tags::RED_PALETTE_DESCRIPTOR,
            tags::RED_PALETTE_DATA,
            ("RedPaletteColorLookupTableDescriptor", "RedPaletteColorLookupTableData"),
            order,
            signed,
        )?;
        let (green, _) = read_channel(
            dataset,
            tags::GREEN_PALETTE_DESCRIPTOR,
            tags::GREEN_PALETTE_DATA,
            ("GreenPaletteColorLookupTableDescriptor", "GreenPaletteColorLookupTableData"),
            order,
            signed,
        )?;
        let (blue, _) = read_channel(
            dataset,
            tags::BLUE_PALETTE_DESCRIPTOR,
            tags::BLUE_PALETTE_DATA,
            ("BluePaletteColorLookupTableDescriptor", "BluePaletteColorLookupTableData"),
            order,
            signed,
        )?;

        Ok(Self::new(descriptor.first_mapped, descriptor.bits, red, green, blue))
    }

    /// Build a palette from explicit tables.
    ///
    /// Tables of 8-bit palettes that were stored as 16-bit words with the
    /// value in the high byte are shifted down.
    pub fn new(first_mapped: i64, bits: u16, red: Vec<u16>, green: Vec<u16>, blue: Vec<u16>) -> Self {
        let bits = if bits <= 8 { 8 } else { 16 };
        let fix = |table: Vec<u16>| {
            if bits == 8 && table.iter().any(|&v| v > 0xFF) {
                table.into_iter().map(|v| v >> 8).collect()
            } else {
                table
            }
        };
        Self {
            first_mapped,
            bits,
            red: fix(red),
            green: fix(green),
            blue: fix(blue),
        }
    }

    pub fn bits(&self) -> u16 {
        self.bits
    }

    /// Entries in the shortest table.
    pub fn len(&self) -> usize {
        self.red.len().min(self.green.len()).min(self.blue.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// RGB for one stored sample; out-of-range indices clamp to the first or
    /// last entry.
    pub fn lookup(&self, sample: i64) -> [u16; 3] {
        let last = self.len().saturating_sub(1) as i64;
        let index = (sample - self.first_mapped).clamp(0, last) as usize;
        [self.red[index], self.green[index], self.blue[index]]
    }

    /// Map every index sample to interleaved RGB.
    pub fn apply(&self, indices: &PixelData) -> PixelData {
        let samples = (0..indices.len()).flat_map(|i| self.lookup(indices.get_i64(i)));
        if self.bits == 8 {
            PixelData::U8(samples.map(|v| v as u8).collect())
        } else {
            PixelData::U16(samples.collect())
        }
    }
}

fn read_channel(
    dataset: &Dataset,
    descriptor_tag: Tag,
    data_tag: Tag,
    names: (&'static str, &'static str),
    order: ByteOrder,
    signed: bool,
) -> Result<(Vec<u16>, Descriptor), CodecError> {
    let (descriptor_name, data_name) = names;

    let values = dataset
        .get(descriptor_tag)
        .and_then(Element::to_u16_vec)
        .ok_or(CodecError::MissingTag(descriptor_name))?;
    if values.len() < 3 {
        return Err(CodecError::InvalidAttribute {
            tag: descriptor_name,
            message: format!("expected 3 values, found {}", values.len()),
        });
    }

    // An entry count of 0 stands for 2^16 entries
    let entries = if values[0] == 0 { 65536 } else { values[0] as usize };
    let first_mapped = if signed {
        values[1] as i16 as i64
    } else {
        values[1] as i64
    };
    let descriptor = Descriptor {
        first_mapped,
        bits: values[2],
    };

    let element = dataset
        .get(data_tag)
        .ok_or(CodecError::MissingTag(data_name))?;
    let mut table: Vec<u16> = match element.bytes() {
        Some(bytes) if bytes.len() == entries => bytes.iter().map(|&b| b as u16).collect(),
        Some(bytes) => bytes.chunks_exact(2).map(|c| order.read_u16(c)).collect(),
        None => element.to_u16_vec().unwrap_or_default(),
    };
    // Entries past the declared count are padding
    table.truncate(entries);
    if table.is_empty() {
        return Err(CodecError::InvalidAttribute {
            tag: data_name,
            message: "lookup table is empty".to_string(),
        });
    }

    Ok((table, descriptor))
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalize decoder output to grey or interleaved RGB.
///
/// `photometric` is the interpretation of `samples` as they come out of the
/// decoder, which differs from the dataset's for JPEG (already RGB).
/// Returns the normalized buffer, its channel count and its photometric
/// interpretation.
pub fn normalize(
    samples: PixelData,
    info: &FrameInfo,
    photometric: &Photometric,
    palette: Option<&Palette>,
) -> Result<(PixelData, usize, Photometric), CodecError> {
    let pixels = info.pixel_count();

    if *photometric == Photometric::PaletteColor {
        let palette = palette.ok_or(CodecError::MissingTag(
            "RedPaletteColorLookupTableDescriptor",
        ))?;
        return Ok((palette.apply(&samples), 3, Photometric::Rgb));
    }

    if info.samples_per_pixel == 1 {
        return Ok((samples, 1, photometric.clone()));
    }

    if *photometric == Photometric::YbrFull422 && info.is_chroma_subsampled() {
        let upsampled = upsample_422(&samples, pixels);
        return Ok((ybr_full_to_rgb(&upsampled, info.bits_stored), 3, Photometric::Rgb));
    }

    let interleaved = if info.planar_configuration == 1 {
        planar_to_interleaved(samples, pixels)
    } else {
        samples
    };

    match photometric {
        Photometric::YbrFull | Photometric::YbrFull422 => Ok((
            ybr_full_to_rgb(&interleaved, info.bits_stored),
            3,
            Photometric::Rgb,
        )),
        Photometric::Rgb | Photometric::YbrIct | Photometric::YbrRct => {
            Ok((interleaved, 3, Photometric::Rgb))
        }
        other => Ok((interleaved, info.samples_per_pixel, other.clone())),
    }
}

/// Reorder channel-major samples (`RRR..GGG..BBB..`) to pixel-major
/// (`RGBRGB..`).
pub fn planar_to_interleaved(samples: PixelData, pixels: usize) -> PixelData {
    fn interleave<T: Copy>(planar: Vec<T>, pixels: usize) -> Vec<T> {
        if planar.len() < pixels * 3 {
            return planar;
        }
        let mut out = Vec::with_capacity(pixels * 3);
        for i in 0..pixels {
            out.push(planar[i]);
            out.push(planar[pixels + i]);
            out.push(planar[2 * pixels + i]);
        }
        out
    }

    match samples {
        PixelData::U8(v) => PixelData::U8(interleave(v, pixels)),
        PixelData::I8(v) => PixelData::I8(interleave(v, pixels)),
        PixelData::U16(v) => PixelData::U16(interleave(v, pixels)),
        PixelData::I16(v) => PixelData::I16(interleave(v, pixels)),
        PixelData::U32(v) => PixelData::U32(interleave(v, pixels)),
        PixelData::I32(v) => PixelData::I32(interleave(v, pixels)),
    }
}

/// Expand `Y0 Y1 Cb Cr` pixel pairs to `Y0 Cb Cr Y1 Cb Cr`.
fn upsample_422(samples: &PixelData, pixels: usize) -> PixelData {
    let mut out = Vec::with_capacity(pixels * 3);
    let mut i = 0;
    while out.len() < pixels * 3 && i + 3 < samples.len() {
        let (y0, y1) = (samples.get_i64(i), samples.get_i64(i + 1));
        let (cb, cr) = (samples.get_i64(i + 2), samples.get_i64(i + 3));
        out.extend_from_slice(&[y0, cb, cr]);
        if out.len() < pixels * 3 {
            out.extend_from_slice(&[y1, cb, cr]);
        }
        i += 4;
    }
    PixelData::from_i64(samples.sample_type(), out)
}

/// Full-range YCbCr to RGB, clamped to the sample range.
///
/// ```text
/// R = Y + 1.402    (Cr - c)
/// G = Y - 0.344136 (Cb - c) - 0.714136 (Cr - c)
/// B = Y + 1.772    (Cb - c)
/// ```
///
/// where `c` is the chroma midpoint `2^(bits - 1)`.
pub fn ybr_full_to_rgb(samples: &PixelData, bits_stored: u16) -> PixelData {
    let sample_type = samples.sample_type();
    let bits = match sample_type {
        SampleType::U8 | SampleType::I8 => bits_stored.clamp(1, 8),
        _ => bits_stored.clamp(1, 16),
    };
    let max = ((1i64 << bits) - 1) as f64;
    let center = (1i64 << (bits - 1)) as f64;

    let mut out = Vec::with_capacity(samples.len());
    for p in 0..samples.len() / 3 {
        let y = samples.get_i64(p * 3) as f64;
        let cb = samples.get_i64(p * 3 + 1) as f64 - center;
        let cr = samples.get_i64(p * 3 + 2) as f64 - center;

        let r = y + 1.402 * cr;
        let g = y - 0.344136 * cb - 0.714136 * cr;
        let b = y + 1.772 * cb;

        for v in [r, g, b] {
            out.push(v.round().clamp(0.0, max) as i64);
        }
    }
    PixelData::from_i64(sample_type, out)
}
