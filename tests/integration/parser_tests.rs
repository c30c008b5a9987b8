//! Parser integration tests.
//!
//! Tests verify:
//! - Part 10 files and bare streams in every supported encoding
//! - Nested sequences with defined and undefined lengths
//! - Rejection of non-DICOM, truncated and malformed streams

use dicom_mpr::format::dicom::tag;
use dicom_mpr::{detect_layout, is_dicom, parse, FormatError, StreamLayout, Tag, Value, Vr};

use super::test_utils::{
    u16_le, DicomWriter, Encoding, EXPLICIT_BE, EXPLICIT_LE, IMPLICIT_LE,
};

// =============================================================================
// Layouts and Encodings
// =============================================================================

#[test]
fn test_part10_explicit_le() {
    let data = DicomWriter::new(EXPLICIT_LE)
        .text((0x0008, 0x0060), "CS", "CT")
        .text((0x0010, 0x0010), "PN", "Doe^Jane")
        .image(4, 4, 16, 12, false, 1, "MONOCHROME2")
        .pixel_data("OW", &u16_le(&[0; 16]))
        .build();

    assert_eq!(detect_layout(&data).unwrap(), StreamLayout::Part10);
    let ds = parse(data).unwrap();
    assert_eq!(ds.transfer_syntax_uid(), Some(EXPLICIT_LE));
    assert_eq!(ds.string(tag::MODALITY), Some("CT"));
    assert_eq!(ds.string(tag::PATIENT_NAME), Some("Doe^Jane"));
    assert_eq!(ds.rows(0), 4);
    assert_eq!(ds.columns(0), 4);
    assert_eq!(ds.bits_stored(0), 12);
    assert_eq!(ds.photometric_interpretation(), Some("MONOCHROME2"));
    assert_eq!(ds.get(tag::PIXEL_DATA).unwrap().bytes().unwrap().len(), 32);
}

#[test]
fn test_part10_implicit_le() {
    let data = DicomWriter::new(IMPLICIT_LE)
        .text((0x0020, 0x0013), "IS", "7")
        .us((0x0028, 0x0010), 512)
        .build();
    let ds = parse(data).unwrap();
    assert_eq!(ds.instance_number(0), 7);
    assert_eq!(ds.rows(0), 512);
    // VR comes from the dictionary
    assert_eq!(ds.get(tag::ROWS).unwrap().vr, Vr::US);
}

#[test]
fn test_part10_explicit_be() {
    let data = DicomWriter::new(EXPLICIT_BE)
        .us((0x0028, 0x0010), 0x0102)
        .us((0x0028, 0x0011), 0x0304)
        .build();
    let ds = parse(data).unwrap();
    assert_eq!(ds.rows(0), 0x0102);
    assert_eq!(ds.columns(0), 0x0304);
}

#[test]
fn test_bare_implicit_dataset() {
    let data = DicomWriter::bare(IMPLICIT_LE)
        .text((0x0008, 0x0016), "UI", "1.2.840.10008.5.1.4.1.1.2")
        .us((0x0028, 0x0010), 3)
        .build();
    assert_eq!(
        detect_layout(&data).unwrap(),
        StreamLayout::BareDataset { explicit_vr: false }
    );
    let ds = parse(data).unwrap();
    assert_eq!(ds.rows(0), 3);
    // No meta group; implicit little endian is assumed
    assert_eq!(ds.transfer_syntax_uid(), Some(IMPLICIT_LE));
}

#[test]
fn test_bare_explicit_dataset() {
    let data = DicomWriter::bare(EXPLICIT_LE)
        .text((0x0008, 0x0016), "UI", "1.2.3")
        .us((0x0028, 0x0011), 9)
        .build();
    assert_eq!(
        detect_layout(&data).unwrap(),
        StreamLayout::BareDataset { explicit_vr: true }
    );
    assert_eq!(parse(data).unwrap().columns(0), 9);
}

#[test]
fn test_uid_padding_is_trimmed() {
    // Odd-length UID gets a trailing NUL
    let ds = parse(DicomWriter::new("1.2.840.10008.1.2.1").build()).unwrap();
    assert_eq!(ds.transfer_syntax_uid(), Some("1.2.840.10008.1.2.1"));
}

// =============================================================================
// Sequences
// =============================================================================

fn sequence_item(enc: Encoding, defined: bool, inner: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    if defined {
        out.extend(enc.item(0xE000, inner.len() as u32));
        out.extend_from_slice(inner);
    } else {
        out.extend(enc.item(0xE000, 0xFFFF_FFFF));
        out.extend_from_slice(inner);
        out.extend(enc.item(0xE00D, 0));
    }
    out
}

#[test]
fn test_nested_sequences_mixed_lengths() {
    let enc = Encoding::EXPLICIT_LE;

    // PlanePositionSequence item holding an ImagePositionPatient
    let position = enc.element((0x0020, 0x0032), "DS", b"1\\2\\3 ");
    let mut inner_seq = enc.header((0x0020, 0x9113), "SQ", 0xFFFF_FFFF);
    inner_seq.extend(sequence_item(enc, true, &position));
    inner_seq.extend(enc.item(0xE0DD, 0));

    // Per-frame functional groups: one undefined-length item
    let frame_item = sequence_item(enc, false, &inner_seq);
    let mut per_frame = enc.header((0x5200, 0x9230), "SQ", frame_item.len() as u32);
    per_frame.extend(frame_item);

    let data = DicomWriter::new(EXPLICIT_LE)
        .raw((0x5200, 0x9230), per_frame)
        .build();
    let ds = parse(data).unwrap();

    let items = ds.get(tag::PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE).unwrap().items().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(ds.image_position(0, [0.0; 3]), [1.0, 2.0, 3.0]);
    // Frame without a functional group falls back to the default
    assert_eq!(ds.image_position(1, [9.0; 3]), [9.0; 3]);
}

#[test]
fn test_empty_sequence() {
    let enc = Encoding::EXPLICIT_LE;
    let mut seq = enc.header((0x0028, 0x9110), "SQ", 0xFFFF_FFFF);
    seq.extend(enc.item(0xE0DD, 0));
    let ds = parse(DicomWriter::new(EXPLICIT_LE).raw((0x0028, 0x9110), seq).build()).unwrap();
    let element = ds.get(Tag::new(0x0028, 0x9110)).unwrap();
    assert_eq!(element.vr, Vr::SQ);
    assert!(matches!(&element.value, Value::Sequence(items) if items.is_empty()));
}

// =============================================================================
// Encapsulated Pixel Data
// =============================================================================

#[test]
fn test_encapsulated_fragments() {
    let data = DicomWriter::new("1.2.840.10008.1.2.5")
        .encapsulated(&[0, 12], &[vec![1, 2, 3, 4], vec![5, 6], vec![7, 8, 9, 10]])
        .build();
    let ds = parse(data).unwrap();
    let fragments = ds.get(tag::PIXEL_DATA).unwrap().fragments().unwrap();
    assert_eq!(fragments.offset_table, vec![0, 12]);
    assert_eq!(fragments.len(), 3);
    assert_eq!(&fragments.fragments[1][..], &[5u8, 6]);
}

#[test]
fn test_clear_pixel_data_keeps_metadata() {
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(2, 2, 8, 8, false, 1, "MONOCHROME2")
        .pixel_data("OB", &[1, 2, 3, 4])
        .build();
    let mut ds = parse(data).unwrap();
    assert_eq!(ds.clear_pixel_data(), 4);
    assert!(!ds.contains(tag::PIXEL_DATA));
    assert_eq!(ds.rows(0), 2);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_not_dicom() {
    let data = vec![0x34, 0x12, 0x78, 0x56, 0x00, 0x00, 0x00, 0x00];
    assert!(!is_dicom(&data));
    assert_eq!(
        parse(data).unwrap_err(),
        FormatError::NotDicom {
            group: 0x1234,
            element: 0x5678
        }
    );
}

#[test]
fn test_truncated_value() {
    let enc = Encoding::EXPLICIT_LE;
    // Declares 100 bytes, provides 4
    let mut element = enc.header((0x0010, 0x0010), "PN", 100);
    element.extend_from_slice(b"Doe ");
    let data = DicomWriter::new(EXPLICIT_LE).raw((0x0010, 0x0010), element).build();
    assert!(matches!(parse(data), Err(FormatError::Truncated { .. })));
}

#[test]
fn test_invalid_vr_is_malformed() {
    let mut element = vec![0x10, 0x00, 0x10, 0x00];
    element.extend_from_slice(b"ZZ");
    element.extend_from_slice(&[2, 0, b'A', b'B']);
    let data = DicomWriter::new(EXPLICIT_LE).raw((0x0010, 0x0010), element).build();
    assert!(matches!(parse(data), Err(FormatError::Malformed { .. })));
}

#[test]
fn test_stray_delimiter_is_malformed() {
    let enc = Encoding::EXPLICIT_LE;
    let data = DicomWriter::new(EXPLICIT_LE)
        .raw((0x0010, 0x0010), enc.item(0xE00D, 0))
        .build();
    assert!(matches!(parse(data), Err(FormatError::Malformed { .. })));
}
