//! Multi-planar access over a layer cache.
//!
//! Axial slices are cache layers. Sagittal and coronal slices are resliced
//! from the full stack, so the cache is forced before either is built.

use std::sync::Arc;

use tracing::debug;

use crate::codec::{DecodedFrame, PixelData};
use crate::error::VolumeError;

use super::cache::{Layer, LayerCache, LayerSource};
use super::geometry::{Plane, PlaneView, VolumeGeometry};
use super::scheduler::Priority;
use super::thick::ThickSource;

/// One 2D slice plus its placement in its plane.
#[derive(Debug, Clone)]
pub struct Slice2D {
    pub plane: Plane,
    pub index: usize,
    pub image: Layer,
    pub size: [usize; 2],
    pub spacing: [f64; 2],
    pub origin: [f64; 2],
}

/// Geometry plus axial layer cache.
#[derive(Debug, Clone)]
pub struct MultiPlanarVolume<S: LayerSource> {
    geometry: VolumeGeometry,
    cache: LayerCache<S>,
}

impl<S: LayerSource> MultiPlanarVolume<S> {
    /// # Errors
    ///
    /// [`VolumeError::InvalidGeometry`] when the cache layer count differs
    /// from the geometry's slice count.
    pub fn new(geometry: VolumeGeometry, cache: LayerCache<S>) -> Result<Self, VolumeError> {
        if cache.layer_count() != geometry.size()[2] {
            return Err(VolumeError::InvalidGeometry(format!(
                "cache has {} layers, geometry has {} slices",
                cache.layer_count(),
                geometry.size()[2]
            )));
        }
        Ok(Self { geometry, cache })
    }

    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    pub fn cache(&self) -> &LayerCache<S> {
        &self.cache
    }

    pub fn axial(&self) -> &PlaneView {
        self.geometry.axial()
    }

    pub fn sagittal(&self) -> &PlaneView {
        self.geometry.sagittal()
    }

    pub fn coronal(&self) -> &PlaneView {
        self.geometry.coronal()
    }

    /// Axial slice `index`, decoding it if needed.
    pub async fn get_axial(&self, index: usize) -> Result<Slice2D, VolumeError> {
        let image = self.cache.get_async(index, Priority::High).await?;
        self.check_layer(&image)?;
        Ok(self.slice(Plane::Axial, index, image))
    }

    /// Sagittal slice `index` (constant index axis 0).
    pub async fn get_sagittal(&self, index: usize) -> Result<Slice2D, VolumeError> {
        self.get_resliced(Plane::Sagittal, index).await
    }

    /// Coronal slice `index` (constant index axis 1).
    pub async fn get_coronal(&self, index: usize) -> Result<Slice2D, VolumeError> {
        self.get_resliced(Plane::Coronal, index).await
    }

    /// Slice `index` of any plane.
    pub async fn get_slice(&self, plane: Plane, index: usize) -> Result<Slice2D, VolumeError> {
        match plane {
            Plane::Axial => self.get_axial(index).await,
            Plane::Sagittal | Plane::Coronal => self.get_resliced(plane, index).await,
        }
    }

    async fn get_resliced(&self, plane: Plane, index: usize) -> Result<Slice2D, VolumeError> {
        let view = self.geometry.plane(plane);
        if index >= view.count {
            return Err(VolumeError::LayerOutOfBounds {
                index,
                count: view.count,
            });
        }

        self.cache.force(Priority::Normal).await?;
        let layers = (0..self.cache.layer_count())
            .map(|k| self.cache.get_sync(k))
            .collect::<Result<Vec<_>, _>>()?;
        for layer in &layers {
            self.check_layer(layer)?;
        }
        check_stack(&layers)?;

        debug!(plane = plane.as_str(), index = index, "Reslicing volume");
        let image = reslice(view, index, &layers);
        Ok(self.slice(plane, index, Arc::new(image)))
    }

    fn slice(&self, plane: Plane, index: usize, image: Layer) -> Slice2D {
        let view = self.geometry.plane(plane);
        Slice2D {
            plane,
            index,
            image,
            size: view.size,
            spacing: view.spacing,
            origin: view.origin,
        }
    }

    fn check_layer(&self, layer: &DecodedFrame) -> Result<(), VolumeError> {
        let [columns, rows, _] = self.geometry.size();
        if layer.columns != columns || layer.rows != rows {
            return Err(VolumeError::LayerMismatch(format!(
                "layer is {}x{}, volume expects {}x{}",
                layer.columns, layer.rows, columns, rows
            )));
        }
        Ok(())
    }

    /// Thick-slab volume averaging `multiplier` axial layers.
    ///
    /// Slice spacing grows by `multiplier`; the origin stays at the first
    /// base layer.
    pub fn thick(&self, multiplier: usize) -> Result<MultiPlanarVolume<ThickSource<S>>, VolumeError> {
        let cache = self.cache.thick(multiplier)?;
        let [columns, rows, _] = self.geometry.size();
        let mut spacing = self.geometry.spacing();
        spacing[2] *= multiplier as f64;
        let geometry = VolumeGeometry::new(
            [columns, rows, cache.layer_count()],
            spacing,
            self.geometry.origin(),
        )?;
        MultiPlanarVolume::new(geometry, cache)
    }
}

/// Every layer must share the first layer's channel count and sample type.
fn check_stack(layers: &[Layer]) -> Result<(), VolumeError> {
    let Some(first) = layers.first() else {
        return Ok(());
    };
    for (k, layer) in layers.iter().enumerate().skip(1) {
        if layer.channels != first.channels {
            return Err(VolumeError::LayerMismatch(format!(
                "layer {} has {} channels, layer 0 has {}",
                k, layer.channels, first.channels
            )));
        }
        if layer.pixels.sample_type() != first.pixels.sample_type() {
            return Err(VolumeError::LayerMismatch(format!(
                "layer {} holds {:?} samples, layer 0 holds {:?}",
                k,
                layer.pixels.sample_type(),
                first.pixels.sample_type()
            )));
        }
    }
    Ok(())
}

/// Build a sagittal or coronal image from the full axial stack.
fn reslice(view: &PlaneView, slice: usize, layers: &[Layer]) -> DecodedFrame {
    let [width, height] = view.size;
    let first = &layers[0];
    let channels = first.channels;

    let mut values = Vec::with_capacity(width * height * channels);
    for y in 0..height {
        for x in 0..width {
            let [i, j, k] = view.to_index3([x as f64, y as f64], slice as f64);
            let layer = &layers[k as usize];
            for c in 0..channels {
                values.push(layer.sample(i as usize, j as usize, c).unwrap_or(0));
            }
        }
    }

    DecodedFrame {
        columns: width,
        rows: height,
        channels,
        photometric: first.photometric.clone(),
        pixels: PixelData::from_i64(first.pixels.sample_type(), values),
    }
}
