//! Transfer syntaxes recognized by the parser and the pixel codec.

use crate::io::ByteOrder;

/// Implicit VR little endian.
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
/// Explicit VR little endian.
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
/// Explicit VR big endian (retired, still found in archives).
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";
/// RLE lossless.
pub const RLE_LOSSLESS: &str = "1.2.840.10008.1.2.5";
/// JPEG baseline (process 1).
pub const JPEG_BASELINE: &str = "1.2.840.10008.1.2.4.50";
/// JPEG extended (processes 2 and 4).
pub const JPEG_EXTENDED: &str = "1.2.840.10008.1.2.4.51";
/// JPEG lossless, non-hierarchical (process 14).
pub const JPEG_LOSSLESS: &str = "1.2.840.10008.1.2.4.57";
/// JPEG lossless, first-order prediction (process 14, selection value 1).
pub const JPEG_LOSSLESS_SV1: &str = "1.2.840.10008.1.2.4.70";
/// JPEG 2000 lossless only.
pub const JPEG_2000_LOSSLESS: &str = "1.2.840.10008.1.2.4.90";
/// JPEG 2000.
pub const JPEG_2000: &str = "1.2.840.10008.1.2.4.91";

/// Every transfer syntax this crate can decode.
///
/// Matching on this enum is exhaustive so that adding or removing a syntax is
/// a compile-time-checked change in the codec dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferSyntax {
    ImplicitVrLittleEndian,
    ExplicitVrLittleEndian,
    ExplicitVrBigEndian,
    RleLossless,
    JpegBaseline,
    JpegExtended,
    JpegLossless,
    JpegLosslessSv1,
    Jpeg2000Lossless,
    Jpeg2000,
}

impl TransferSyntax {
    /// Resolve a UID, ignoring trailing NUL/space padding.
    ///
    /// Returns `None` for anything not enumerated above.
    pub fn from_uid(uid: &str) -> Option<Self> {
        let syntax = match trim_uid(uid) {
            IMPLICIT_VR_LITTLE_ENDIAN => TransferSyntax::ImplicitVrLittleEndian,
            EXPLICIT_VR_LITTLE_ENDIAN => TransferSyntax::ExplicitVrLittleEndian,
            EXPLICIT_VR_BIG_ENDIAN => TransferSyntax::ExplicitVrBigEndian,
            RLE_LOSSLESS => TransferSyntax::RleLossless,
            JPEG_BASELINE => TransferSyntax::JpegBaseline,
            JPEG_EXTENDED => TransferSyntax::JpegExtended,
            JPEG_LOSSLESS => TransferSyntax::JpegLossless,
            JPEG_LOSSLESS_SV1 => TransferSyntax::JpegLosslessSv1,
            JPEG_2000_LOSSLESS => TransferSyntax::Jpeg2000Lossless,
            JPEG_2000 => TransferSyntax::Jpeg2000,
            _ => return None,
        };
        Some(syntax)
    }

    pub const fn uid(self) -> &'static str {
        match self {
            TransferSyntax::ImplicitVrLittleEndian => IMPLICIT_VR_LITTLE_ENDIAN,
            TransferSyntax::ExplicitVrLittleEndian => EXPLICIT_VR_LITTLE_ENDIAN,
            TransferSyntax::ExplicitVrBigEndian => EXPLICIT_VR_BIG_ENDIAN,
            TransferSyntax::RleLossless => RLE_LOSSLESS,
            TransferSyntax::JpegBaseline => JPEG_BASELINE,
            TransferSyntax::JpegExtended => JPEG_EXTENDED,
            TransferSyntax::JpegLossless => JPEG_LOSSLESS,
            TransferSyntax::JpegLosslessSv1 => JPEG_LOSSLESS_SV1,
            TransferSyntax::Jpeg2000Lossless => JPEG_2000_LOSSLESS,
            TransferSyntax::Jpeg2000 => JPEG_2000,
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            TransferSyntax::ImplicitVrLittleEndian => "Implicit VR Little Endian",
            TransferSyntax::ExplicitVrLittleEndian => "Explicit VR Little Endian",
            TransferSyntax::ExplicitVrBigEndian => "Explicit VR Big Endian",
            TransferSyntax::RleLossless => "RLE Lossless",
            TransferSyntax::JpegBaseline => "JPEG Baseline",
            TransferSyntax::JpegExtended => "JPEG Extended",
            TransferSyntax::JpegLossless => "JPEG Lossless",
            TransferSyntax::JpegLosslessSv1 => "JPEG Lossless SV1",
            TransferSyntax::Jpeg2000Lossless => "JPEG 2000 Lossless",
            TransferSyntax::Jpeg2000 => "JPEG 2000",
        }
    }

    /// Byte order of the dataset after the meta group.
    pub const fn byte_order(self) -> ByteOrder {
        match self {
            TransferSyntax::ExplicitVrBigEndian => ByteOrder::BigEndian,
            _ => ByteOrder::LittleEndian,
        }
    }

    pub const fn is_explicit_vr(self) -> bool {
        !matches!(self, TransferSyntax::ImplicitVrLittleEndian)
    }

    /// Whether pixel data is encapsulated (fragment-based).
    pub const fn is_encapsulated(self) -> bool {
        !matches!(
            self,
            TransferSyntax::ImplicitVrLittleEndian
                | TransferSyntax::ExplicitVrLittleEndian
                | TransferSyntax::ExplicitVrBigEndian
        )
    }
}

/// Strip the NUL/space padding UIDs carry to reach an even length.
pub fn trim_uid(uid: &str) -> &str {
    uid.trim_end_matches(|c: char| c == '\0' || c == ' ')
}
