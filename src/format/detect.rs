//! Stream layout detection for DICOM byte streams.
//!
//! DICOM instances come in three shapes:
//!
//! - **Part 10 files**: a 128-byte preamble, the `DICM` magic, then the file
//!   meta information group (0002)
//! - **Bare meta streams**: no preamble, but the stream opens with the meta
//!   group (some PACS exports strip the preamble only)
//! - **Bare datasets**: no preamble and no meta group; the encoding has to be
//!   guessed from the first element
//!
//! Anything else is rejected with [`FormatError::NotDicom`].

use crate::error::FormatError;
use crate::io::read_u16_le;

use super::dicom::dictionary;
use super::dicom::tags::{Tag, Vr};

// =============================================================================
// Constants
// =============================================================================

/// Length of the Part 10 preamble
pub const PREAMBLE_LEN: usize = 128;

/// Magic bytes following the preamble
pub const DICM_MAGIC: &[u8; 4] = b"DICM";

/// Offset of the first meta element in a Part 10 file
const PART10_DATASET_START: usize = PREAMBLE_LEN + DICM_MAGIC.len();

/// Group of the file meta information elements
const META_GROUP: u16 = 0x0002;

// =============================================================================
// StreamLayout
// =============================================================================

/// Detected layout of a DICOM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamLayout {
    /// Preamble + "DICM", meta group at offset 132
    Part10,

    /// Meta group at offset 0, no preamble
    BareMeta,

    /// Dataset at offset 0 without meta information
    BareDataset {
        /// Whether the first element carries an explicit VR code
        explicit_vr: bool,
    },
}

impl StreamLayout {
    /// Offset where element parsing starts.
    pub const fn dataset_start(self) -> usize {
        match self {
            StreamLayout::Part10 => PART10_DATASET_START,
            StreamLayout::BareMeta | StreamLayout::BareDataset { .. } => 0,
        }
    }

    /// Whether a file meta information group is expected at the start.
    pub const fn has_meta(self) -> bool {
        matches!(self, StreamLayout::Part10 | StreamLayout::BareMeta)
    }

    /// Get a human-readable name for the layout.
    pub const fn name(self) -> &'static str {
        match self {
            StreamLayout::Part10 => "Part 10 file",
            StreamLayout::BareMeta => "Bare stream with meta information",
            StreamLayout::BareDataset { .. } => "Bare dataset",
        }
    }
}

// =============================================================================
// Detection
// =============================================================================

/// Detect the layout of a DICOM stream.
///
/// # Detection Logic
///
/// 1. `DICM` at offset 128 → Part 10
/// 2. Otherwise read the first tag (little endian) and resolve it against the
///    dictionary; an unknown tag means the buffer is not DICOM
/// 3. A first tag in group 0002 → bare meta stream
/// 4. Otherwise a bare dataset, explicit VR when the two bytes after the tag
///    form a valid VR code
pub fn detect_layout(data: &[u8]) -> Result<StreamLayout, FormatError> {
    if data.len() >= PART10_DATASET_START && &data[PREAMBLE_LEN..PART10_DATASET_START] == DICM_MAGIC
    {
        return Ok(StreamLayout::Part10);
    }

    if data.len() < 4 {
        return Err(FormatError::NotDicom {
            group: 0,
            element: 0,
        });
    }

    let tag = Tag::new(read_u16_le(&data[0..2]), read_u16_le(&data[2..4]));
    if !dictionary::is_known(tag) {
        return Err(FormatError::NotDicom {
            group: tag.group,
            element: tag.element,
        });
    }

    if tag.group == META_GROUP {
        return Ok(StreamLayout::BareMeta);
    }

    let explicit_vr = data.len() >= 6 && Vr::from_bytes([data[4], data[5]]).is_some();
    Ok(StreamLayout::BareDataset { explicit_vr })
}

/// Quick check whether a buffer looks like DICOM.
///
/// This only inspects the first bytes; a `true` result does not guarantee
/// the rest of the stream parses.
pub fn is_dicom(data: &[u8]) -> bool {
    detect_layout(data).is_ok()
}
