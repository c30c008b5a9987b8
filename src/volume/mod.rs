//! Volume geometry and layered slice cache.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              MultiPlanarVolume               │
//! │   axial / sagittal / coronal Slice2D         │
//! └──────────────┬───────────────────┬───────────┘
//!                │                   │
//!                ▼                   ▼
//! ┌──────────────────────┐  ┌────────────────────┐
//! │   VolumeGeometry     │  │  LayerCache<S>     │
//! │ index <-> physical   │  │  memoized layers,  │
//! │ 3D  <-> 2D planes    │  │  shared pending    │
//! └──────────────────────┘  └─────────┬──────────┘
//!                                     │ LayerSource
//!                        ┌────────────┴────────────┐
//!                        ▼                         ▼
//!               ┌─────────────────┐      ┌──────────────────┐
//!               │  FrameSource    │      │  ThickSource     │
//!               │ decode frame on │      │ average m layers │
//!               │ DecodeScheduler │      │ of a LayerCache  │
//!               └─────────────────┘      └──────────────────┘
//! ```
//!
//! [`Series`] orders parsed datasets into (dataset, frame) layers and
//! derives the [`VolumeGeometry`] they occupy.

mod cache;
mod geometry;
mod planes;
mod scheduler;
mod series;
mod thick;

pub use cache::{FrameSource, Layer, LayerCache, LayerSource};
pub use geometry::{Direction, Plane, PlaneView, VolumeGeometry, SCALE};
pub use planes::{MultiPlanarVolume, Slice2D};
pub use scheduler::{DecodeScheduler, Priority, DEFAULT_WORKERS};
pub use series::Series;
pub use thick::{average, ThickSource};
