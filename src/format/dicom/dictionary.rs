//! Static tag dictionary.
//!
//! Resolves a tag to its keyword and default VR. Used for implicit VR
//! parsing, for naming elements, and for recognizing bare streams that carry
//! no preamble.

use super::tags::{Tag, Vr};

/// One dictionary row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictEntry {
    pub tag: Tag,
    pub vr: Vr,
    pub name: &'static str,
}

const fn entry(group: u16, element: u16, vr: Vr, name: &'static str) -> DictEntry {
    DictEntry {
        tag: Tag::new(group, element),
        vr,
        name,
    }
}

/// Sorted by tag value for binary search.
static ENTRIES: &[DictEntry] = &[
    entry(0x0002, 0x0000, Vr::UL, "FileMetaInformationGroupLength"),
    entry(0x0002, 0x0001, Vr::OB, "FileMetaInformationVersion"),
    entry(0x0002, 0x0002, Vr::UI, "MediaStorageSOPClassUID"),
    entry(0x0002, 0x0003, Vr::UI, "MediaStorageSOPInstanceUID"),
    entry(0x0002, 0x0010, Vr::UI, "TransferSyntaxUID"),
    entry(0x0002, 0x0012, Vr::UI, "ImplementationClassUID"),
    entry(0x0002, 0x0013, Vr::SH, "ImplementationVersionName"),
    entry(0x0002, 0x0016, Vr::AE, "SourceApplicationEntityTitle"),
    entry(0x0008, 0x0005, Vr::CS, "SpecificCharacterSet"),
    entry(0x0008, 0x0008, Vr::CS, "ImageType"),
    entry(0x0008, 0x0012, Vr::DA, "InstanceCreationDate"),
    entry(0x0008, 0x0013, Vr::TM, "InstanceCreationTime"),
    entry(0x0008, 0x0016, Vr::UI, "SOPClassUID"),
    entry(0x0008, 0x0018, Vr::UI, "SOPInstanceUID"),
    entry(0x0008, 0x0020, Vr::DA, "StudyDate"),
    entry(0x0008, 0x0021, Vr::DA, "SeriesDate"),
    entry(0x0008, 0x0030, Vr::TM, "StudyTime"),
    entry(0x0008, 0x0050, Vr::SH, "AccessionNumber"),
    entry(0x0008, 0x0060, Vr::CS, "Modality"),
    entry(0x0008, 0x0070, Vr::LO, "Manufacturer"),
    entry(0x0008, 0x0080, Vr::LO, "InstitutionName"),
    entry(0x0008, 0x1030, Vr::LO, "StudyDescription"),
    entry(0x0008, 0x103E, Vr::LO, "SeriesDescription"),
    entry(0x0010, 0x0010, Vr::PN, "PatientName"),
    entry(0x0010, 0x0020, Vr::LO, "PatientID"),
    entry(0x0010, 0x0030, Vr::DA, "PatientBirthDate"),
    entry(0x0010, 0x0040, Vr::CS, "PatientSex"),
    entry(0x0018, 0x0015, Vr::CS, "BodyPartExamined"),
    entry(0x0018, 0x0050, Vr::DS, "SliceThickness"),
    entry(0x0018, 0x0088, Vr::DS, "SpacingBetweenSlices"),
    entry(0x0020, 0x000D, Vr::UI, "StudyInstanceUID"),
    entry(0x0020, 0x000E, Vr::UI, "SeriesInstanceUID"),
    entry(0x0020, 0x0011, Vr::IS, "SeriesNumber"),
    entry(0x0020, 0x0013, Vr::IS, "InstanceNumber"),
    entry(0x0020, 0x0032, Vr::DS, "ImagePositionPatient"),
    entry(0x0020, 0x0037, Vr::DS, "ImageOrientationPatient"),
    entry(0x0020, 0x0052, Vr::UI, "FrameOfReferenceUID"),
    entry(0x0020, 0x1041, Vr::DS, "SliceLocation"),
    entry(0x0020, 0x9113, Vr::SQ, "PlanePositionSequence"),
    entry(0x0020, 0x9116, Vr::SQ, "PlaneOrientationSequence"),
    entry(0x0028, 0x0002, Vr::US, "SamplesPerPixel"),
    entry(0x0028, 0x0004, Vr::CS, "PhotometricInterpretation"),
    entry(0x0028, 0x0006, Vr::US, "PlanarConfiguration"),
    entry(0x0028, 0x0008, Vr::IS, "NumberOfFrames"),
    entry(0x0028, 0x0010, Vr::US, "Rows"),
    entry(0x0028, 0x0011, Vr::US, "Columns"),
    entry(0x0028, 0x0030, Vr::DS, "PixelSpacing"),
    entry(0x0028, 0x0100, Vr::US, "BitsAllocated"),
    entry(0x0028, 0x0101, Vr::US, "BitsStored"),
    entry(0x0028, 0x0102, Vr::US, "HighBit"),
    entry(0x0028, 0x0103, Vr::US, "PixelRepresentation"),
    entry(0x0028, 0x1050, Vr::DS, "WindowCenter"),
    entry(0x0028, 0x1051, Vr::DS, "WindowWidth"),
    entry(0x0028, 0x1052, Vr::DS, "RescaleIntercept"),
    entry(0x0028, 0x1053, Vr::DS, "RescaleSlope"),
    entry(0x0028, 0x1054, Vr::LO, "RescaleType"),
    entry(0x0028, 0x1101, Vr::US, "RedPaletteColorLookupTableDescriptor"),
    entry(0x0028, 0x1102, Vr::US, "GreenPaletteColorLookupTableDescriptor"),
    entry(0x0028, 0x1103, Vr::US, "BluePaletteColorLookupTableDescriptor"),
    entry(0x0028, 0x1201, Vr::OW, "RedPaletteColorLookupTableData"),
    entry(0x0028, 0x1202, Vr::OW, "GreenPaletteColorLookupTableData"),
    entry(0x0028, 0x1203, Vr::OW, "BluePaletteColorLookupTableData"),
    entry(0x0028, 0x9110, Vr::SQ, "PixelMeasuresSequence"),
    entry(0x0028, 0x9132, Vr::SQ, "FrameVOILUTSequence"),
    entry(0x0028, 0x9145, Vr::SQ, "PixelValueTransformationSequence"),
    entry(0x5200, 0x9229, Vr::SQ, "SharedFunctionalGroupsSequence"),
    entry(0x5200, 0x9230, Vr::SQ, "PerFrameFunctionalGroupsSequence"),
    entry(0x7FE0, 0x0008, Vr::OF, "FloatPixelData"),
    entry(0x7FE0, 0x0009, Vr::OD, "DoubleFloatPixelData"),
    entry(0x7FE0, 0x0010, Vr::OW, "PixelData"),
    entry(0xFFFE, 0xE000, Vr::UN, "Item"),
    entry(0xFFFE, 0xE00D, Vr::UN, "ItemDelimitationItem"),
    entry(0xFFFE, 0xE0DD, Vr::UN, "SequenceDelimitationItem"),
];

/// Look up a tag in the dictionary.
pub fn lookup(tag: Tag) -> Option<&'static DictEntry> {
    ENTRIES
        .binary_search_by_key(&tag.value(), |e| e.tag.value())
        .ok()
        .map(|i| &ENTRIES[i])
}

/// Whether the tag is known, counting group length tags of standard groups.
pub fn is_known(tag: Tag) -> bool {
    lookup(tag).is_some() || (tag.is_group_length() && !tag.is_private() && tag.group != 0)
}

/// Keyword of a tag, if known.
pub fn name_of(tag: Tag) -> Option<&'static str> {
    lookup(tag).map(|e| e.name)
}

/// VR to use when the stream itself does not say (implicit VR).
///
/// Group length tags are UL; everything unknown is UN.
pub fn vr_of(tag: Tag) -> Vr {
    match lookup(tag) {
        Some(e) => e.vr,
        None if tag.is_group_length() => Vr::UL,
        None => Vr::UN,
    }
}
