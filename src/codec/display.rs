//! Display mapping: modality rescale and VOI windowing to 8-bit.

use crate::format::dicom::Dataset;

use super::color::Photometric;
use super::pixels::{DecodedFrame, PixelData};

/// Window center and width (0028,1050 / 0028,1051).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub center: f64,
    pub width: f64,
}

/// Modality LUT and VOI parameters for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayParams {
    pub slope: f64,
    pub intercept: f64,
    /// `None` maps the frame's min..max range
    pub window: Option<Window>,
}

impl Default for DisplayParams {
    fn default() -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
            window: None,
        }
    }
}

impl DisplayParams {
    /// Read rescale and window values for `frame`, falling back through the
    /// functional groups.
    pub fn from_dataset(dataset: &Dataset, frame: usize) -> Self {
        let width = dataset.window_width(frame, 0.0);
        let window = (width >= 1.0).then(|| Window {
            center: dataset.window_center(frame, 0.0),
            width,
        });
        Self {
            slope: dataset.rescale_slope(frame, 1.0),
            intercept: dataset.rescale_intercept(frame, 0.0),
            window,
        }
    }
}

/// Linear VOI function, `x` already rescaled.
#[inline]
pub fn apply_window(x: f64, window: Window) -> u8 {
    let center = window.center - 0.5;
    let width = (window.width - 1.0).max(1.0);
    if x <= center - width / 2.0 {
        0
    } else if x > center + width / 2.0 {
        255
    } else {
        (((x - center) / width + 0.5) * 255.0).round().clamp(0.0, 255.0) as u8
    }
}

/// Render a decoded frame to 8-bit samples.
///
/// Grey frames are rescaled then windowed (MONOCHROME1 inverted); RGB frames
/// are passed through, 16-bit RGB reduced to its high byte. Returns the
/// samples and their channel count.
pub fn to_display_u8(frame: &DecodedFrame, params: &DisplayParams) -> (Vec<u8>, usize) {
    if frame.channels == 3 {
        let out = match &frame.pixels {
            PixelData::U8(v) => v.clone(),
            PixelData::U16(v) => v.iter().map(|&s| (s >> 8) as u8).collect(),
            other => {
                let values = other.to_i64_vec();
                values.iter().map(|&s| s.clamp(0, 255) as u8).collect()
            }
        };
        return (out, 3);
    }

    let rescaled: Vec<f64> = (0..frame.pixels.len())
        .map(|i| frame.pixels.get_i64(i) as f64 * params.slope + params.intercept)
        .collect();

    let window = params.window.unwrap_or_else(|| {
        let (lo, hi) = rescaled
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if rescaled.is_empty() {
            return Window {
                center: 0.0,
                width: 1.0,
            };
        }
        Window {
            center: (lo + hi) / 2.0 + 0.5,
            width: (hi - lo).max(0.0) + 1.0,
        }
    });

    let invert = frame.photometric == Photometric::Monochrome1;
    let out = rescaled
        .into_iter()
        .map(|x| {
            let v = apply_window(x, window);
            if invert {
                255 - v
            } else {
                v
            }
        })
        .collect();
    (out, 1)
}
