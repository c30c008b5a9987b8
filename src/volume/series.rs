//! Series assembly: order image frames into a volume and derive its geometry.
//!
//! Frames come either from many single-frame instances or from the frames of
//! multi-frame instances. They are ordered along the slice normal (the cross
//! product of the image orientation row and column vectors) when every frame
//! has a position, otherwise by instance number then frame number.
//!
//! Image position is given in LPS patient coordinates; the volume origin is
//! expressed in RAS to match [`VolumeGeometry`].

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::codec::PixelDecoder;
use crate::error::VolumeError;
use crate::format::dicom::tags::tags;
use crate::format::dicom::Dataset;

use super::cache::{FrameSource, LayerCache};
use super::geometry::VolumeGeometry;
use super::planes::MultiPlanarVolume;
use super::scheduler::DecodeScheduler;

const DEFAULT_ORIENTATION: [f64; 6] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

/// Position below which two slices are treated as coincident (mm).
const POSITION_EPSILON: f64 = 1e-4;

/// Ordered frames of one volume plus its geometry.
#[derive(Debug, Clone)]
pub struct Series {
    frames: Vec<(Arc<Dataset>, usize)>,
    geometry: VolumeGeometry,
}

struct Entry {
    dataset: Arc<Dataset>,
    frame: usize,
    instance: i64,
    position: Option<[f64; 3]>,
}

impl Series {
    /// Order the image frames of `datasets` and derive the volume geometry.
    ///
    /// Datasets without pixel data are skipped.
    ///
    /// # Errors
    ///
    /// - [`VolumeError::EmptySeries`] when no dataset carries pixel data
    /// - [`VolumeError::LayerMismatch`] when frames differ in rows/columns
    pub fn assemble(datasets: Vec<Dataset>) -> Result<Self, VolumeError> {
        let mut entries = Vec::new();
        for dataset in datasets {
            if !dataset.contains(tags::PIXEL_DATA) {
                warn!(
                    sop_instance_uid = dataset.sop_instance_uid().unwrap_or("<none>"),
                    "Skipping dataset without pixel data"
                );
                continue;
            }
            let dataset = Arc::new(dataset);
            let instance = dataset.instance_number(0);
            for frame in 0..dataset.number_of_frames(1) {
                let position = dataset
                    .find_for_frame(tags::IMAGE_POSITION_PATIENT, frame)
                    .and_then(|e| e.to_f64_vec())
                    .and_then(|v| <[f64; 3]>::try_from(v.as_slice()).ok());
                entries.push(Entry {
                    dataset: dataset.clone(),
                    frame,
                    instance,
                    position,
                });
            }
        }

        let first = entries.first().ok_or(VolumeError::EmptySeries)?;
        let rows = first.dataset.rows(0) as usize;
        let columns = first.dataset.columns(0) as usize;
        if let Some(other) = entries
            .iter()
            .find(|e| e.dataset.rows(0) as usize != rows || e.dataset.columns(0) as usize != columns)
        {
            return Err(VolumeError::LayerMismatch(format!(
                "frame {} of instance {} is {}x{}, series is {}x{}",
                other.frame,
                other.instance,
                other.dataset.columns(0),
                other.dataset.rows(0),
                columns,
                rows
            )));
        }

        let orientation = first
            .dataset
            .image_orientation(first.frame, DEFAULT_ORIENTATION);
        let normal = slice_normal(orientation);
        let positioned = entries.iter().all(|e| e.position.is_some());

        if positioned {
            let distance = |e: &Entry| e.position.map(|p| dot(p, normal)).unwrap_or(0.0);
            entries.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
        } else {
            entries.sort_by(|a, b| match a.instance.cmp(&b.instance) {
                Ordering::Equal => a.frame.cmp(&b.frame),
                other => other,
            });
        }

        let slice_spacing = derive_slice_spacing(&entries, normal);
        let base = &entries[0];
        let [row_spacing, column_spacing] = base.dataset.pixel_spacing(base.frame, [1.0, 1.0]);
        let lps = base.position.unwrap_or([0.0; 3]);

        let geometry = VolumeGeometry::new(
            [columns, rows, entries.len()],
            [column_spacing, row_spacing, slice_spacing],
            [-lps[0], -lps[1], lps[2]],
        )?;

        debug!(
            slices = entries.len(),
            columns = columns,
            rows = rows,
            positioned = positioned,
            slice_spacing = slice_spacing,
            "Assembled series"
        );

        Ok(Self {
            frames: entries
                .into_iter()
                .map(|e| (e.dataset, e.frame))
                .collect(),
            geometry,
        })
    }

    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// (dataset, frame) pairs in slice order.
    pub fn frames(&self) -> &[(Arc<Dataset>, usize)] {
        &self.frames
    }

    /// Cache-backed volume decoding frames on demand.
    pub fn into_volume(
        self,
        decoder: PixelDecoder,
        scheduler: DecodeScheduler,
    ) -> Result<MultiPlanarVolume<FrameSource>, VolumeError> {
        let source = FrameSource::new(self.frames, decoder, scheduler);
        MultiPlanarVolume::new(self.geometry, LayerCache::new(source))
    }
}

fn slice_normal(orientation: [f64; 6]) -> [f64; 3] {
    let row = [orientation[0], orientation[1], orientation[2]];
    let col = [orientation[3], orientation[4], orientation[5]];
    let normal = [
        row[1] * col[2] - row[2] * col[1],
        row[2] * col[0] - row[0] * col[2],
        row[0] * col[1] - row[1] * col[0],
    ];
    let norm = dot(normal, normal).sqrt();
    if norm < f64::EPSILON {
        return [0.0, 0.0, 1.0];
    }
    normal.map(|v| v / norm)
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Mean distance between consecutive positions, else the first frame's
/// slice thickness, else 1 mm.
fn derive_slice_spacing(entries: &[Entry], normal: [f64; 3]) -> f64 {
    let positions: Vec<f64> = entries
        .iter()
        .filter_map(|e| e.position.map(|p| dot(p, normal)))
        .collect();
    if positions.len() == entries.len() && positions.len() > 1 {
        let span = positions[positions.len() - 1] - positions[0];
        let spacing = span / (positions.len() - 1) as f64;
        if spacing > POSITION_EPSILON {
            return spacing;
        }
    }

    let first = &entries[0];
    let thickness = first.dataset.slice_thickness(first.frame, 0.0);
    if thickness > 0.0 && thickness.is_finite() {
        thickness
    } else {
        1.0
    }
}
