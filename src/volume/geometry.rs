//! Volume coordinate system.
//!
//! Maps between three spaces:
//!
//! ```text
//!  index space (i, j, k)          physical space (RAS, mm)
//!  ┌──────────────────┐           x = origin.x - i * spacing.x
//!  │ axis 0: columns  │  ───────► y = origin.y - j * spacing.y
//!  │ axis 1: rows     │  ◄─────── z = origin.z + k * spacing.z
//!  │ axis 2: slices   │
//!  └────────┬─────────┘
//!           │ per-plane projection
//!           ▼
//!  2D plane space (x, y) + slice
//!    axial     (i, j)            slice k
//!    sagittal  (j, depth-k-1)    slice i
//!    coronal   (i, depth-k-1)    slice j
//! ```
//!
//! Sagittal and coronal views flip their vertical axis so that superior is
//! drawn at the top.

use std::fmt;
use std::str::FromStr;

use crate::error::VolumeError;

/// Per-axis sign from index to physical space.
pub const SCALE: [f64; 3] = [-1.0, -1.0, 1.0];

// =============================================================================
// Planes and Directions
// =============================================================================

/// The three canonical reformatted planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    Axial,
    Sagittal,
    Coronal,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Axial, Plane::Sagittal, Plane::Coronal];

    /// Index axes spanning the plane (horizontal, vertical).
    pub const fn axes(self) -> (usize, usize) {
        match self {
            Plane::Axial => (0, 1),
            Plane::Sagittal => (1, 2),
            Plane::Coronal => (0, 2),
        }
    }

    /// Index axis that selects the slice.
    pub const fn slice_axis(self) -> usize {
        match self {
            Plane::Axial => 2,
            Plane::Sagittal => 0,
            Plane::Coronal => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Plane::Axial => "axial",
            Plane::Sagittal => "sagittal",
            Plane::Coronal => "coronal",
        }
    }

    /// Anatomical labels for (top, right, bottom, left).
    pub const fn labels(self) -> [Direction; 4] {
        use Direction::*;
        match self {
            Plane::Axial => [Anterior, Left, Posterior, Right],
            Plane::Sagittal => [Superior, Posterior, Inferior, Anterior],
            Plane::Coronal => [Superior, Left, Inferior, Right],
        }
    }

    /// Whether the vertical axis is flipped relative to index space.
    const fn flips_vertical(self) -> bool {
        !matches!(self, Plane::Axial)
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "axial" => Ok(Plane::Axial),
            "sagittal" => Ok(Plane::Sagittal),
            "coronal" => Ok(Plane::Coronal),
            other => Err(format!(
                "unknown plane '{}': expected axial, sagittal or coronal",
                other
            )),
        }
    }
}

/// Anatomical direction used for display labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Anterior,
    Posterior,
    Left,
    Right,
    Superior,
    Inferior,
}

impl Direction {
    /// Single-letter label.
    pub const fn letter(self) -> char {
        match self {
            Direction::Anterior => 'A',
            Direction::Posterior => 'P',
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::Superior => 'S',
            Direction::Inferior => 'I',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

// =============================================================================
// PlaneView
// =============================================================================

/// One reformatted view of a volume.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneView {
    pub plane: Plane,
    /// Width and height in pixels
    pub size: [usize; 2],
    pub spacing: [f64; 2],
    /// Physical position of pixel (0, 0) at slice 0, projected on the
    /// plane's axes
    pub origin: [f64; 2],
    /// Number of slices along the slice axis
    pub count: usize,
    /// (top, right, bottom, left)
    pub labels: [Direction; 4],
    /// Volume extent along index axis 2
    depth: usize,
}

impl PlaneView {
    fn new(plane: Plane, size: [usize; 3], spacing: [f64; 3], origin: [f64; 3]) -> Self {
        let (h, v) = plane.axes();
        let depth = size[2];

        // Index of the plane's top-left pixel on slice 0
        let mut corner = [0.0; 3];
        if plane.flips_vertical() {
            corner[2] = (depth - 1) as f64;
        }
        let physical = to_physical(corner, spacing, origin);

        Self {
            plane,
            size: [size[h], size[v]],
            spacing: [spacing[h], spacing[v]],
            origin: [physical[h], physical[v]],
            count: size[plane.slice_axis()],
            labels: plane.labels(),
            depth,
        }
    }

    /// 2D pixel plus slice number to a volume index.
    pub fn to_index3(&self, xy: [f64; 2], slice: f64) -> [f64; 3] {
        let [x, y] = xy;
        match self.plane {
            Plane::Axial => [x, y, slice],
            Plane::Sagittal => [slice, x, self.flip(y)],
            Plane::Coronal => [x, slice, self.flip(y)],
        }
    }

    /// Volume index to 2D pixel plus slice number.
    pub fn from_index3(&self, index: [f64; 3]) -> ([f64; 2], f64) {
        let [i, j, k] = index;
        match self.plane {
            Plane::Axial => ([i, j], k),
            Plane::Sagittal => ([j, self.flip(k)], i),
            Plane::Coronal => ([i, self.flip(k)], j),
        }
    }

    /// Whether a 2D pixel lies inside the view.
    pub fn contains(&self, xy: [f64; 2]) -> bool {
        (0..2).all(|a| xy[a] >= 0.0 && xy[a] < self.size[a] as f64)
    }

    /// Label string, e.g. `"A L P R"`.
    pub fn label_string(&self) -> String {
        self.labels
            .iter()
            .map(|d| d.letter().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn flip(&self, v: f64) -> f64 {
        self.depth as f64 - v - 1.0
    }
}

// =============================================================================
// VolumeGeometry
// =============================================================================

/// Size, spacing and origin of a volume plus its three plane views.
///
/// Fixed at construction; all methods are pure.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeGeometry {
    size: [usize; 3],
    spacing: [f64; 3],
    origin: [f64; 3],
    axial: PlaneView,
    sagittal: PlaneView,
    coronal: PlaneView,
}

impl VolumeGeometry {
    /// Create a geometry.
    ///
    /// # Errors
    ///
    /// [`VolumeError::InvalidGeometry`] when a size is zero, a spacing is not
    /// a positive finite number, or the origin is not finite.
    pub fn new(size: [usize; 3], spacing: [f64; 3], origin: [f64; 3]) -> Result<Self, VolumeError> {
        if size.contains(&0) {
            return Err(VolumeError::InvalidGeometry(format!(
                "size {:?} has an empty axis",
                size
            )));
        }
        if spacing.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(VolumeError::InvalidGeometry(format!(
                "spacing {:?} must be positive and finite",
                spacing
            )));
        }
        if origin.iter().any(|o| !o.is_finite()) {
            return Err(VolumeError::InvalidGeometry(format!(
                "origin {:?} must be finite",
                origin
            )));
        }

        Ok(Self {
            size,
            spacing,
            origin,
            axial: PlaneView::new(Plane::Axial, size, spacing, origin),
            sagittal: PlaneView::new(Plane::Sagittal, size, spacing, origin),
            coronal: PlaneView::new(Plane::Coronal, size, spacing, origin),
        })
    }

    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    pub fn axial(&self) -> &PlaneView {
        &self.axial
    }

    pub fn sagittal(&self) -> &PlaneView {
        &self.sagittal
    }

    pub fn coronal(&self) -> &PlaneView {
        &self.coronal
    }

    pub fn plane(&self, plane: Plane) -> &PlaneView {
        match plane {
            Plane::Axial => &self.axial,
            Plane::Sagittal => &self.sagittal,
            Plane::Coronal => &self.coronal,
        }
    }

    /// `origin + SCALE * index * spacing`
    pub fn index_to_physical(&self, index: [f64; 3]) -> [f64; 3] {
        to_physical(index, self.spacing, self.origin)
    }

    /// Inverse of [`index_to_physical`](Self::index_to_physical).
    pub fn physical_to_index(&self, physical: [f64; 3]) -> [f64; 3] {
        std::array::from_fn(|a| (physical[a] - self.origin[a]) / (SCALE[a] * self.spacing[a]))
    }

    /// Whether `index` lies in `[0, size)` on every axis.
    pub fn is_inside(&self, index: [f64; 3]) -> bool {
        (0..3).all(|a| index[a] >= 0.0 && index[a] < self.size[a] as f64)
    }

    /// Physical position of a plane pixel on a given slice.
    pub fn plane_to_physical(&self, plane: Plane, xy: [f64; 2], slice: f64) -> [f64; 3] {
        self.index_to_physical(self.plane(plane).to_index3(xy, slice))
    }

    /// Plane pixel and slice for a physical position.
    pub fn physical_to_plane(&self, plane: Plane, physical: [f64; 3]) -> ([f64; 2], f64) {
        self.plane(plane).from_index3(self.physical_to_index(physical))
    }

    /// Total voxel count.
    pub fn voxel_count(&self) -> usize {
        self.size.iter().product()
    }
}

fn to_physical(index: [f64; 3], spacing: [f64; 3], origin: [f64; 3]) -> [f64; 3] {
    std::array::from_fn(|a| origin[a] + SCALE[a] * index[a] * spacing[a])
}
