//! Transfer-syntax pixel codec.
//!
//! Turns one frame of a parsed [`Dataset`] into a decoded, color-normalized
//! [`DecodedFrame`].
//!
//! # Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │      Dataset + frame index              │
//! └────────────────────┬────────────────────┘
//!                      │  FrameInfo, TransferSyntax
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │  Frame extraction                       │
//! │  (native bit range / fragment mapping)  │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┼───────────┬─────────────┐
//!          ▼           ▼           ▼             ▼
//!      ┌───────┐   ┌───────┐   ┌────────┐   ┌──────────┐
//!      │Native │   │  RLE  │   │  JPEG  │   │ JPEG2000 │
//!      └───┬───┘   └───┬───┘   └───┬────┘   └────┬─────┘
//!          └───────────┴─────┬─────┴─────────────┘
//!                            ▼
//! ┌─────────────────────────────────────────┐
//! │  Color normalization (photometric)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`PixelDecoder`]: entry point, dispatches on [`TransferSyntax`]
//! - [`FrameDecoder`]: trait implemented by each compressed-syntax decoder;
//!   instances are injected into [`PixelDecoder`]
//! - [`FrameInfo`]: image pixel attributes read from the dataset
//! - [`PixelData`] / [`DecodedFrame`]: typed output buffers
//! - [`DisplayParams`]: rescale and windowing to 8-bit for display

mod color;
mod display;
mod frame;
mod jpeg;
mod jpeg2000;
mod native;
mod pixels;
mod rle;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::CodecError;
use crate::format::dicom::tags::tags;
use crate::format::dicom::{Dataset, TransferSyntax, Value, Vr};

pub use color::{normalize, planar_to_interleaved, ybr_full_to_rgb, Palette, Photometric};
pub use display::{apply_window, to_display_u8, DisplayParams, Window};
pub use frame::{encapsulated_frame, native_frame, FrameInfo, NativeFrame};
pub use jpeg::{read_frame_header, BaselineJpegDecoder, JpegFrameHeader, LosslessJpegDecoder};
pub use jpeg2000::{read_layout, Jpeg2000Decoder, Jpeg2000Layout};
pub use native::{decode_native, unpack_12bit, unpack_1bit};
pub use pixels::{DecodedFrame, PixelData, SampleType};
pub use rle::{unpack_bits, RleDecoder};

// =============================================================================
// FrameDecoder
// =============================================================================

/// Decoder for one compressed frame.
///
/// Implementations receive the frame's complete encoded codestream and
/// return samples in pixel-interleaved order. Color conversion happens
/// afterwards in [`normalize`].
pub trait FrameDecoder: Send + Sync + fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    fn decode(&self, encoded: &[u8], info: &FrameInfo) -> Result<PixelData, CodecError>;
}

// =============================================================================
// PixelDecoder
// =============================================================================

/// Transfer-syntax dispatching frame decoder.
///
/// Holds one decoder per compressed scheme. Cloning is cheap; decoders are
/// shared behind `Arc`.
#[derive(Debug, Clone)]
pub struct PixelDecoder {
    rle: Arc<dyn FrameDecoder>,
    jpeg_baseline: Arc<dyn FrameDecoder>,
    jpeg_lossless: Arc<dyn FrameDecoder>,
    jpeg2000: Arc<dyn FrameDecoder>,
}

impl Default for PixelDecoder {
    fn default() -> Self {
        Self::new(
            Arc::new(RleDecoder::new()),
            Arc::new(BaselineJpegDecoder::new()),
            Arc::new(LosslessJpegDecoder::new()),
            Arc::new(Jpeg2000Decoder::new()),
        )
    }
}

impl PixelDecoder {
    /// Create a decoder from explicit per-scheme decoders.
    pub fn new(
        rle: Arc<dyn FrameDecoder>,
        jpeg_baseline: Arc<dyn FrameDecoder>,
        jpeg_lossless: Arc<dyn FrameDecoder>,
        jpeg2000: Arc<dyn FrameDecoder>,
    ) -> Self {
        Self {
            rle,
            jpeg_baseline,
            jpeg_lossless,
            jpeg2000,
        }
    }

    /// Decode frame `frame` of `dataset`.
    ///
    /// # Errors
    ///
    /// - [`CodecError::NoDecoder`] for transfer syntaxes outside the
    ///   supported set
    /// - [`CodecError::FrameOutOfBounds`] for `frame >= NumberOfFrames`
    /// - [`CodecError::UnsupportedJpeg2000`] for multi-component or
    ///   multi-tile JPEG 2000
    /// - [`CodecError::MissingTag`] / [`CodecError::InvalidAttribute`] for
    ///   unusable image pixel attributes
    pub fn decode_frame(&self, dataset: &Dataset, frame: usize) -> Result<DecodedFrame, CodecError> {
        let uid = dataset
            .transfer_syntax_uid()
            .ok_or(CodecError::MissingTag("TransferSyntaxUID"))?;
        let syntax =
            TransferSyntax::from_uid(uid).ok_or_else(|| CodecError::NoDecoder(uid.to_string()))?;

        let info = FrameInfo::from_dataset(dataset)?;
        info.check_frame(frame)?;

        let pixel_data = dataset
            .get(tags::PIXEL_DATA)
            .ok_or(CodecError::MissingTag("PixelData"))?;

        debug!(
            transfer_syntax = syntax.name(),
            frame = frame,
            rows = info.rows,
            columns = info.columns,
            bits_allocated = info.bits_allocated,
            photometric = info.photometric.as_str(),
            "Decoding frame"
        );

        let (samples, decoded_info, photometric) = match syntax {
            TransferSyntax::ImplicitVrLittleEndian
            | TransferSyntax::ExplicitVrLittleEndian
            | TransferSyntax::ExplicitVrBigEndian => {
                let data = match &pixel_data.value {
                    Value::Bytes(bytes) => bytes,
                    _ => {
                        return Err(CodecError::InvalidAttribute {
                            tag: "PixelData",
                            message: "native pixel data is not a byte buffer".to_string(),
                        });
                    }
                };
                let native = native_frame(data, &info, frame)?;
                let swap = syntax == TransferSyntax::ExplicitVrBigEndian
                    && info.bits_allocated == 8
                    && pixel_data.vr == Vr::OW;
                let samples = decode_native(&native, &info, syntax.byte_order(), swap)?;
                let photometric = info.photometric.clone();
                (samples, info, photometric)
            }
            TransferSyntax::RleLossless => {
                self.decode_encapsulated(self.rle.as_ref(), pixel_data, &info, frame)?
            }
            TransferSyntax::JpegBaseline | TransferSyntax::JpegExtended => {
                let (samples, decoded_info, photometric) = self.decode_encapsulated(
                    self.jpeg_baseline.as_ref(),
                    pixel_data,
                    &info,
                    frame,
                )?;
                // The JPEG decoder already converts YCbCr to RGB
                let photometric = if photometric.is_ybr() {
                    Photometric::Rgb
                } else {
                    photometric
                };
                (samples, decoded_info, photometric)
            }
            TransferSyntax::JpegLossless | TransferSyntax::JpegLosslessSv1 => {
                self.decode_encapsulated(self.jpeg_lossless.as_ref(), pixel_data, &info, frame)?
            }
            TransferSyntax::Jpeg2000Lossless | TransferSyntax::Jpeg2000 => {
                self.decode_encapsulated(self.jpeg2000.as_ref(), pixel_data, &info, frame)?
            }
        };

        let palette = if photometric == Photometric::PaletteColor {
            Some(Palette::from_dataset(
                dataset,
                syntax.byte_order(),
                decoded_info.signed,
            )?)
        } else {
            None
        };

        let (pixels, channels, photometric) =
            normalize(samples, &decoded_info, &photometric, palette.as_ref())?;

        Ok(DecodedFrame {
            columns: decoded_info.columns,
            rows: decoded_info.rows,
            channels,
            photometric,
            pixels,
        })
    }

    fn decode_encapsulated(
        &self,
        decoder: &dyn FrameDecoder,
        pixel_data: &crate::format::dicom::Element,
        info: &FrameInfo,
        frame: usize,
    ) -> Result<(PixelData, FrameInfo, Photometric), CodecError> {
        let fragments = pixel_data
            .fragments()
            .ok_or_else(|| CodecError::InvalidAttribute {
                tag: "PixelData",
                message: "compressed transfer syntax without encapsulated pixel data".to_string(),
            })?;
        let encoded = encapsulated_frame(fragments, frame, info.frames)?;

        let decoded_info = info.for_decoded_stream();
        debug!(
            decoder = decoder.name(),
            bytes = encoded.len(),
            "Decoding compressed frame"
        );
        let samples = decoder.decode(&encoded, &decoded_info)?;

        let expected = match decoded_info.photometric {
            Photometric::PaletteColor => decoded_info.pixel_count(),
            _ => decoded_info.sample_count(),
        };
        if samples.len() != expected {
            return Err(CodecError::Decode {
                message: format!(
                    "{} produced {} samples, expected {}",
                    decoder.name(),
                    samples.len(),
                    expected
                ),
            });
        }

        let photometric = decoded_info.photometric.clone();
        Ok((samples, decoded_info, photometric))
    }
}
