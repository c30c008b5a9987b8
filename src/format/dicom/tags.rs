//! DICOM tag and value representation definitions.
//!
//! This module defines the vocabulary for DICOM parsing:
//! - Value representations (VRs) that determine how element bytes are encoded
//! - Tags that identify elements, with named constants for the ones the
//!   engine reads

use std::fmt;

// =============================================================================
// Value Representations
// =============================================================================

/// DICOM value representation.
///
/// The VR decides both how an element's value bytes are typed and, in
/// explicit VR syntaxes, whether the length field is 2 or 4 bytes wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vr {
    AE,
    AS,
    AT,
    CS,
    DA,
    DS,
    DT,
    FD,
    FL,
    IS,
    LO,
    LT,
    OB,
    OD,
    OF,
    OL,
    OV,
    OW,
    PN,
    SH,
    SL,
    SQ,
    SS,
    ST,
    SV,
    TM,
    UC,
    UI,
    UL,
    UN,
    UR,
    US,
    UT,
    UV,
}

impl Vr {
    /// Parse a VR from its two-character code.
    ///
    /// Returns `None` for anything that is not a defined VR.
    pub fn from_bytes(code: [u8; 2]) -> Option<Self> {
        let vr = match &code {
            b"AE" => Vr::AE,
            b"AS" => Vr::AS,
            b"AT" => Vr::AT,
            b"CS" => Vr::CS,
            b"DA" => Vr::DA,
            b"DS" => Vr::DS,
            b"DT" => Vr::DT,
            b"FD" => Vr::FD,
            b"FL" => Vr::FL,
            b"IS" => Vr::IS,
            b"LO" => Vr::LO,
            b"LT" => Vr::LT,
            b"OB" => Vr::OB,
            b"OD" => Vr::OD,
            b"OF" => Vr::OF,
            b"OL" => Vr::OL,
            b"OV" => Vr::OV,
            b"OW" => Vr::OW,
            b"PN" => Vr::PN,
            b"SH" => Vr::SH,
            b"SL" => Vr::SL,
            b"SQ" => Vr::SQ,
            b"SS" => Vr::SS,
            b"ST" => Vr::ST,
            b"SV" => Vr::SV,
            b"TM" => Vr::TM,
            b"UC" => Vr::UC,
            b"UI" => Vr::UI,
            b"UL" => Vr::UL,
            b"UN" => Vr::UN,
            b"UR" => Vr::UR,
            b"US" => Vr::US,
            b"UT" => Vr::UT,
            b"UV" => Vr::UV,
            _ => return None,
        };
        Some(vr)
    }

    /// Two-character code of this VR.
    pub const fn as_str(self) -> &'static str {
        match self {
            Vr::AE => "AE",
            Vr::AS => "AS",
            Vr::AT => "AT",
            Vr::CS => "CS",
            Vr::DA => "DA",
            Vr::DS => "DS",
            Vr::DT => "DT",
            Vr::FD => "FD",
            Vr::FL => "FL",
            Vr::IS => "IS",
            Vr::LO => "LO",
            Vr::LT => "LT",
            Vr::OB => "OB",
            Vr::OD => "OD",
            Vr::OF => "OF",
            Vr::OL => "OL",
            Vr::OV => "OV",
            Vr::OW => "OW",
            Vr::PN => "PN",
            Vr::SH => "SH",
            Vr::SL => "SL",
            Vr::SQ => "SQ",
            Vr::SS => "SS",
            Vr::ST => "ST",
            Vr::SV => "SV",
            Vr::TM => "TM",
            Vr::UC => "UC",
            Vr::UI => "UI",
            Vr::UL => "UL",
            Vr::UN => "UN",
            Vr::UR => "UR",
            Vr::US => "US",
            Vr::UT => "UT",
            Vr::UV => "UV",
        }
    }

    /// Whether explicit VR encoding uses 2 reserved bytes and a 4-byte length.
    ///
    /// All other VRs use a 2-byte length directly after the VR code.
    #[inline]
    pub const fn has_long_length(self) -> bool {
        matches!(
            self,
            Vr::OB
                | Vr::OD
                | Vr::OF
                | Vr::OL
                | Vr::OV
                | Vr::OW
                | Vr::SQ
                | Vr::SV
                | Vr::UC
                | Vr::UN
                | Vr::UR
                | Vr::UT
                | Vr::UV
        )
    }

    /// Whether values of this VR are character strings.
    #[inline]
    pub const fn is_text(self) -> bool {
        matches!(
            self,
            Vr::AE
                | Vr::AS
                | Vr::CS
                | Vr::DA
                | Vr::DS
                | Vr::DT
                | Vr::IS
                | Vr::LO
                | Vr::LT
                | Vr::PN
                | Vr::SH
                | Vr::ST
                | Vr::TM
                | Vr::UC
                | Vr::UI
                | Vr::UR
                | Vr::UT
        )
    }

    /// Width in bytes of one binary numeric value, `None` for non-numeric VRs.
    #[inline]
    pub const fn numeric_width(self) -> Option<usize> {
        match self {
            Vr::US | Vr::SS => Some(2),
            Vr::UL | Vr::SL | Vr::FL | Vr::AT => Some(4),
            Vr::UV | Vr::SV | Vr::FD => Some(8),
            _ => None,
        }
    }
}

impl fmt::Display for Vr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tags
// =============================================================================

/// A (group, element) pair identifying a DICOM element.
///
/// Ordering follows the on-disk order of elements: by group, then element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    pub group: u16,
    pub element: u16,
}

impl Tag {
    pub const fn new(group: u16, element: u16) -> Self {
        Self { group, element }
    }

    /// Combined 32-bit value `gggg_eeee`.
    #[inline]
    pub const fn value(self) -> u32 {
        ((self.group as u32) << 16) | self.element as u32
    }

    /// Group length tags `(gggg,0000)`.
    #[inline]
    pub const fn is_group_length(self) -> bool {
        self.element == 0x0000
    }

    /// Private tags live in odd groups.
    #[inline]
    pub const fn is_private(self) -> bool {
        self.group % 2 == 1
    }

    /// Item and delimitation tags, which never carry a VR.
    #[inline]
    pub const fn is_item_or_delimiter(self) -> bool {
        self.group == 0xFFFE
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.group, self.element)
    }
}

/// Named constants for the tags the engine reads.
pub mod tags {
    use super::Tag;

    // -------------------------------------------------------------------------
    // File Meta Information
    // -------------------------------------------------------------------------
    pub const FILE_META_INFORMATION_GROUP_LENGTH: Tag = Tag::new(0x0002, 0x0000);
    pub const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag::new(0x0002, 0x0002);
    pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Tag = Tag::new(0x0002, 0x0003);
    pub const TRANSFER_SYNTAX_UID: Tag = Tag::new(0x0002, 0x0010);

    // -------------------------------------------------------------------------
    // Identification
    // -------------------------------------------------------------------------
    pub const SPECIFIC_CHARACTER_SET: Tag = Tag::new(0x0008, 0x0005);
    pub const SOP_CLASS_UID: Tag = Tag::new(0x0008, 0x0016);
    pub const SOP_INSTANCE_UID: Tag = Tag::new(0x0008, 0x0018);
    pub const MODALITY: Tag = Tag::new(0x0008, 0x0060);
    pub const PATIENT_NAME: Tag = Tag::new(0x0010, 0x0010);
    pub const PATIENT_ID: Tag = Tag::new(0x0010, 0x0020);
    pub const SERIES_INSTANCE_UID: Tag = Tag::new(0x0020, 0x000E);

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------
    pub const SLICE_THICKNESS: Tag = Tag::new(0x0018, 0x0050);
    pub const SPACING_BETWEEN_SLICES: Tag = Tag::new(0x0018, 0x0088);
    pub const INSTANCE_NUMBER: Tag = Tag::new(0x0020, 0x0013);
    pub const IMAGE_POSITION_PATIENT: Tag = Tag::new(0x0020, 0x0032);
    pub const IMAGE_ORIENTATION_PATIENT: Tag = Tag::new(0x0020, 0x0037);
    pub const PLANE_POSITION_SEQUENCE: Tag = Tag::new(0x0020, 0x9113);
    pub const PLANE_ORIENTATION_SEQUENCE: Tag = Tag::new(0x0020, 0x9116);
    pub const PIXEL_SPACING: Tag = Tag::new(0x0028, 0x0030);
    pub const PIXEL_MEASURES_SEQUENCE: Tag = Tag::new(0x0028, 0x9110);

    // -------------------------------------------------------------------------
    // Image Pixel Module
    // -------------------------------------------------------------------------
    pub const SAMPLES_PER_PIXEL: Tag = Tag::new(0x0028, 0x0002);
    pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag::new(0x0028, 0x0004);
    pub const PLANAR_CONFIGURATION: Tag = Tag::new(0x0028, 0x0006);
    pub const NUMBER_OF_FRAMES: Tag = Tag::new(0x0028, 0x0008);
    pub const ROWS: Tag = Tag::new(0x0028, 0x0010);
    pub const COLUMNS: Tag = Tag::new(0x0028, 0x0011);
    pub const BITS_ALLOCATED: Tag = Tag::new(0x0028, 0x0100);
    pub const BITS_STORED: Tag = Tag::new(0x0028, 0x0101);
    pub const HIGH_BIT: Tag = Tag::new(0x0028, 0x0102);
    pub const PIXEL_REPRESENTATION: Tag = Tag::new(0x0028, 0x0103);

    // -------------------------------------------------------------------------
    // Display
    // -------------------------------------------------------------------------
    pub const WINDOW_CENTER: Tag = Tag::new(0x0028, 0x1050);
    pub const WINDOW_WIDTH: Tag = Tag::new(0x0028, 0x1051);
    pub const RESCALE_INTERCEPT: Tag = Tag::new(0x0028, 0x1052);
    pub const RESCALE_SLOPE: Tag = Tag::new(0x0028, 0x1053);
    pub const FRAME_VOI_LUT_SEQUENCE: Tag = Tag::new(0x0028, 0x9132);
    pub const PIXEL_VALUE_TRANSFORMATION_SEQUENCE: Tag = Tag::new(0x0028, 0x9145);

    // -------------------------------------------------------------------------
    // Palette Color
    // -------------------------------------------------------------------------
    pub const RED_PALETTE_DESCRIPTOR: Tag = Tag::new(0x0028, 0x1101);
    pub const GREEN_PALETTE_DESCRIPTOR: Tag = Tag::new(0x0028, 0x1102);
    pub const BLUE_PALETTE_DESCRIPTOR: Tag = Tag::new(0x0028, 0x1103);
    pub const RED_PALETTE_DATA: Tag = Tag::new(0x0028, 0x1201);
    pub const GREEN_PALETTE_DATA: Tag = Tag::new(0x0028, 0x1202);
    pub const BLUE_PALETTE_DATA: Tag = Tag::new(0x0028, 0x1203);

    // -------------------------------------------------------------------------
    // Functional Groups
    // -------------------------------------------------------------------------
    pub const SHARED_FUNCTIONAL_GROUPS_SEQUENCE: Tag = Tag::new(0x5200, 0x9229);
    pub const PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE: Tag = Tag::new(0x5200, 0x9230);

    // -------------------------------------------------------------------------
    // Pixel Data
    // -------------------------------------------------------------------------
    pub const FLOAT_PIXEL_DATA: Tag = Tag::new(0x7FE0, 0x0008);
    pub const DOUBLE_FLOAT_PIXEL_DATA: Tag = Tag::new(0x7FE0, 0x0009);
    pub const PIXEL_DATA: Tag = Tag::new(0x7FE0, 0x0010);

    // -------------------------------------------------------------------------
    // Items and Delimiters
    // -------------------------------------------------------------------------
    pub const ITEM: Tag = Tag::new(0xFFFE, 0xE000);
    pub const ITEM_DELIMITATION_ITEM: Tag = Tag::new(0xFFFE, 0xE00D);
    pub const SEQUENCE_DELIMITATION_ITEM: Tag = Tag::new(0xFFFE, 0xE0DD);
}
