//! # dicom-mpr
//!
//! DICOM ingestion and multi-planar access engine.
//!
//! This library turns raw DICOM byte streams into decoded pixel frames and
//! serves axial, sagittal and coronal slices of the resulting volume from a
//! memoizing, priority-scheduled cache.
//!
//! ## Features
//!
//! - **Stream parsing**: Part 10 files and bare datasets, implicit/explicit
//!   VR, little/big endian, nested sequences, encapsulated pixel data
//! - **Pixel codec**: native 1/8/12/16/32-bit, RLE Lossless, JPEG baseline,
//!   extended and lossless, single-tile JPEG 2000, with color normalization
//! - **Coordinate system**: index/physical conversions and three plane views
//!   with anatomical labels
//! - **Layered cache**: deduplicated async decode, sync access to ready
//!   layers, thick-slab averaging without re-decoding
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`io`] - Byte order helpers and the bounds-checked [`ByteReader`]
//! - [`mod@format`] - Stream detection and the DICOM dataset parser
//! - [`codec`] - Transfer-syntax dispatching pixel decoder
//! - [`volume`] - Geometry, layer cache, thick slabs and series assembly
//! - [`config`] - CLI types
//!
//! ## Example
//!
//! ```rust,no_run
//! use dicom_mpr::{parse, PixelDecoder, Priority, Series, DecodeScheduler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("slice.dcm")?;
//!     let dataset = parse(bytes)?;
//!
//!     // One frame, decoded directly
//!     let frame = PixelDecoder::default().decode_frame(&dataset, 0)?;
//!     println!("{}x{} {}", frame.columns, frame.rows, frame.photometric);
//!
//!     // A cached volume
//!     let series = Series::assemble(vec![dataset])?;
//!     let volume = series.into_volume(PixelDecoder::default(), DecodeScheduler::new(4)?)?;
//!     let axial = volume.get_axial(0).await?;
//!     volume.cache().force(Priority::Low).await?;
//!     println!("{:?}", axial.size);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod volume;

// Re-export commonly used types
pub use codec::{
    DecodedFrame, DisplayParams, FrameDecoder, FrameInfo, Palette, Photometric, PixelData,
    PixelDecoder, SampleType,
};
pub use config::{Cli, Command};
pub use error::{CodecError, FormatError, VolumeError};
pub use format::{detect_layout, is_dicom, parse, Dataset, Element, StreamLayout, Tag, TransferSyntax, Value, Vr};
pub use io::{ByteOrder, ByteReader};
pub use volume::{
    DecodeScheduler, Direction, FrameSource, Layer, LayerCache, LayerSource, MultiPlanarVolume,
    Plane, PlaneView, Priority, Series, Slice2D, ThickSource, VolumeGeometry,
};
