//! Decoded pixel buffers.

use super::color::Photometric;

// =============================================================================
// PixelData
// =============================================================================

/// Typed sample buffer produced by the codec.
///
/// The element width follows bits allocated (1 and 8 → 8-bit, 12 and 16 →
/// 16-bit, 32 → 32-bit) and signedness follows pixel representation.
/// Color samples are always pixel-interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelData {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
}

/// Sample type of a [`PixelData`] buffer, without the samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
}

impl SampleType {
    pub const fn name(self) -> &'static str {
        match self {
            SampleType::U8 => "u8",
            SampleType::I8 => "i8",
            SampleType::U16 => "u16",
            SampleType::I16 => "i16",
            SampleType::U32 => "u32",
            SampleType::I32 => "i32",
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, SampleType::I8 | SampleType::I16 | SampleType::I32)
    }

    pub const fn bytes_per_sample(self) -> usize {
        match self {
            SampleType::U8 | SampleType::I8 => 1,
            SampleType::U16 | SampleType::I16 => 2,
            SampleType::U32 | SampleType::I32 => 4,
        }
    }
}

impl PixelData {
    pub fn len(&self) -> usize {
        match self {
            PixelData::U8(v) => v.len(),
            PixelData::I8(v) => v.len(),
            PixelData::U16(v) => v.len(),
            PixelData::I16(v) => v.len(),
            PixelData::U32(v) => v.len(),
            PixelData::I32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_type(&self) -> SampleType {
        match self {
            PixelData::U8(_) => SampleType::U8,
            PixelData::I8(_) => SampleType::I8,
            PixelData::U16(_) => SampleType::U16,
            PixelData::I16(_) => SampleType::I16,
            PixelData::U32(_) => SampleType::U32,
            PixelData::I32(_) => SampleType::I32,
        }
    }

    /// Sample `index` widened to `i64`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range, like slice indexing.
    #[inline]
    pub fn get_i64(&self, index: usize) -> i64 {
        match self {
            PixelData::U8(v) => v[index] as i64,
            PixelData::I8(v) => v[index] as i64,
            PixelData::U16(v) => v[index] as i64,
            PixelData::I16(v) => v[index] as i64,
            PixelData::U32(v) => v[index] as i64,
            PixelData::I32(v) => v[index] as i64,
        }
    }

    /// All samples widened to `i64`.
    pub fn to_i64_vec(&self) -> Vec<i64> {
        (0..self.len()).map(|i| self.get_i64(i)).collect()
    }

    /// Build a buffer of `sample_type` from `i64` values, saturating at the
    /// type's range.
    pub fn from_i64(sample_type: SampleType, values: impl IntoIterator<Item = i64>) -> Self {
        let values = values.into_iter();
        match sample_type {
            SampleType::U8 => PixelData::U8(values.map(|v| v.clamp(0, u8::MAX as i64) as u8).collect()),
            SampleType::I8 => PixelData::I8(
                values
                    .map(|v| v.clamp(i8::MIN as i64, i8::MAX as i64) as i8)
                    .collect(),
            ),
            SampleType::U16 => {
                PixelData::U16(values.map(|v| v.clamp(0, u16::MAX as i64) as u16).collect())
            }
            SampleType::I16 => PixelData::I16(
                values
                    .map(|v| v.clamp(i16::MIN as i64, i16::MAX as i64) as i16)
                    .collect(),
            ),
            SampleType::U32 => {
                PixelData::U32(values.map(|v| v.clamp(0, u32::MAX as i64) as u32).collect())
            }
            SampleType::I32 => PixelData::I32(
                values
                    .map(|v| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
                    .collect(),
            ),
        }
    }

    /// Minimum and maximum sample, `None` when empty.
    pub fn min_max(&self) -> Option<(i64, i64)> {
        (0..self.len()).map(|i| self.get_i64(i)).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

// =============================================================================
// DecodedFrame
// =============================================================================

/// One decoded, color-normalized frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub columns: usize,
    pub rows: usize,
    /// 1 for grey, 3 for RGB
    pub channels: usize,
    /// Photometric interpretation of `pixels` after normalization
    pub photometric: Photometric,
    pub pixels: PixelData,
}

impl DecodedFrame {
    /// Number of pixels (not samples).
    pub fn pixel_count(&self) -> usize {
        self.columns * self.rows
    }

    /// Sample at (`x`, `y`) for `channel`, widened to `i64`.
    pub fn sample(&self, x: usize, y: usize, channel: usize) -> Option<i64> {
        if x >= self.columns || y >= self.rows || channel >= self.channels {
            return None;
        }
        let index = (y * self.columns + x) * self.channels + channel;
        (index < self.pixels.len()).then(|| self.pixels.get_i64(index))
    }

    /// Whether two frames share dimensions, channel count and sample type.
    pub fn same_shape(&self, other: &DecodedFrame) -> bool {
        self.columns == other.columns
            && self.rows == other.rows
            && self.channels == other.channels
            && self.pixels.sample_type() == other.pixels.sample_type()
    }
}
