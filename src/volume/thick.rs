//! Thick-slice layer source.
//!
//! Averages every `m` consecutive layers of an existing cache:
//!
//! ```text
//!  base:   0 1 2 3 | 4 5 6 7 | 8 9 10 11 | 12 13
//!  thick:     0    |    1    |     2     |  (dropped, fewer than m)
//! ```
//!
//! Samples are averaged per element with floor rounding in the base layer's
//! sample type. Base layers are fetched through the base cache, so nothing
//! is decoded twice.

use async_trait::async_trait;
use futures::future::join_all;

use crate::codec::{DecodedFrame, PixelData};
use crate::error::VolumeError;
use crate::format::dicom::Dataset;

use super::cache::{Layer, LayerCache, LayerSource};
use super::scheduler::Priority;

/// Layer source averaging groups of `multiplier` base layers.
pub struct ThickSource<S: LayerSource> {
    base: LayerCache<S>,
    multiplier: usize,
}

impl<S: LayerSource> ThickSource<S> {
    /// # Errors
    ///
    /// [`VolumeError::InvalidMultiplier`] unless `multiplier > 1`.
    pub fn new(base: LayerCache<S>, multiplier: usize) -> Result<Self, VolumeError> {
        if multiplier <= 1 {
            return Err(VolumeError::InvalidMultiplier(multiplier));
        }
        Ok(Self { base, multiplier })
    }

    pub fn multiplier(&self) -> usize {
        self.multiplier
    }

    pub fn base(&self) -> &LayerCache<S> {
        &self.base
    }

    /// Base layer indices backing thick layer `index`.
    pub fn base_range(&self, index: usize) -> std::ops::Range<usize> {
        let start = index * self.multiplier;
        start..start + self.multiplier
    }
}

#[async_trait]
impl<S: LayerSource> LayerSource for ThickSource<S> {
    fn layer_count(&self) -> usize {
        self.base.layer_count() / self.multiplier
    }

    async fn load_layer(&self, index: usize, priority: Priority) -> Result<Layer, VolumeError> {
        let layers = join_all(
            self.base_range(index)
                .map(|i| self.base.get_async(i, priority)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;
        average(&layers).map(Layer::new)
    }

    fn load_layer_sync(&self, index: usize) -> Option<Result<Layer, VolumeError>> {
        let layers = self
            .base_range(index)
            .map(|i| self.base.try_get(i))
            .collect::<Option<Vec<_>>>()?;
        Some(average(&layers).map(Layer::new))
    }

    fn metadata(&self, index: usize) -> Option<&Dataset> {
        self.base.metadata(index * self.multiplier)
    }
}

/// Per-element floor average of same-shaped layers.
pub fn average(layers: &[Layer]) -> Result<DecodedFrame, VolumeError> {
    let (first, rest) = layers
        .split_first()
        .ok_or_else(|| VolumeError::LayerMismatch("no layers to average".to_string()))?;
    if let Some(other) = rest.iter().find(|l| !l.same_shape(first)) {
        return Err(VolumeError::LayerMismatch(format!(
            "cannot average {}x{}x{} {} with {}x{}x{} {}",
            first.columns,
            first.rows,
            first.channels,
            first.pixels.sample_type().name(),
            other.columns,
            other.rows,
            other.channels,
            other.pixels.sample_type().name(),
        )));
    }

    let n = layers.len() as i64;
    let values = (0..first.pixels.len()).map(|i| {
        let sum: i64 = layers.iter().map(|l| l.pixels.get_i64(i)).sum();
        sum.div_euclid(n)
    });

    Ok(DecodedFrame {
        columns: first.columns,
        rows: first.rows,
        channels: first.channels,
        photometric: first.photometric.clone(),
        pixels: PixelData::from_i64(first.pixels.sample_type(), values),
    })
}
