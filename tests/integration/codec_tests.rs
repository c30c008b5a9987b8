//! Pixel codec integration tests.
//!
//! Tests verify:
//! - Native decoding at every supported bit depth and byte order
//! - Color normalization (planar RGB, palette color)
//! - RLE and JPEG baseline through encapsulated pixel data
//! - Rejection of unsupported transfer syntaxes and out-of-range frames

use dicom_mpr::{parse, CodecError, Dataset, Photometric, PixelData, PixelDecoder};

use super::test_utils::{
    gradient_jpeg, i16_le, i32_le, pack_12bit, pack_1bit, rle_frame, u16_be, u16_le, u32_le,
    DicomWriter, Encoding, EXPLICIT_BE, EXPLICIT_LE, IMPLICIT_LE, JPEG_BASELINE,
    JPEG_LS_LOSSLESS, RLE_LOSSLESS,
};

fn decode(data: Vec<u8>, frame: usize) -> Result<dicom_mpr::DecodedFrame, CodecError> {
    let dataset: Dataset = parse(data).unwrap();
    PixelDecoder::default().decode_frame(&dataset, frame)
}

// =============================================================================
// Native
// =============================================================================

#[test]
fn test_16bit_monochrome_4x4() {
    let samples: Vec<u16> = (0..16).map(|i| i * 1000 + 7).collect();
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(4, 4, 16, 16, false, 1, "MONOCHROME2")
        .text((0x0028, 0x1052), "DS", "0")
        .text((0x0028, 0x1053), "DS", "1")
        .pixel_data("OW", &u16_le(&samples))
        .build();

    let frame = decode(data, 0).unwrap();
    assert_eq!(frame.columns, 4);
    assert_eq!(frame.rows, 4);
    assert_eq!(frame.channels, 1);
    assert_eq!(frame.photometric, Photometric::Monochrome2);
    assert_eq!(frame.pixels, PixelData::U16(samples));
}

#[test]
fn test_planar_rgb_deinterleaves() {
    // R0..R3 G0..G3 B0..B3
    let planar: Vec<u8> = vec![10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33];
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(2, 2, 8, 8, false, 3, "RGB")
        .us((0x0028, 0x0006), 1)
        .pixel_data("OB", &planar)
        .build();

    let frame = decode(data, 0).unwrap();
    assert_eq!(frame.channels, 3);
    assert_eq!(frame.photometric, Photometric::Rgb);
    assert_eq!(
        frame.pixels,
        PixelData::U8(vec![10, 20, 30, 11, 21, 31, 12, 22, 32, 13, 23, 33])
    );
}

#[test]
fn test_interleaved_rgb_passes_through() {
    let interleaved: Vec<u8> = (0..12).collect();
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(2, 2, 8, 8, false, 3, "RGB")
        .us((0x0028, 0x0006), 0)
        .pixel_data("OB", &interleaved)
        .build();
    assert_eq!(decode(data, 0).unwrap().pixels, PixelData::U8(interleaved));
}

#[test]
fn test_1bit_bitmap() {
    let bits = [1, 0, 0, 1, 1, 1, 0, 0, 0, 1, 0, 1];
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(3, 4, 1, 1, false, 1, "MONOCHROME2")
        .pixel_data("OB", &pack_1bit(&bits))
        .build();
    assert_eq!(decode(data, 0).unwrap().pixels, PixelData::U8(bits.to_vec()));
}

#[test]
fn test_8bit_signed_and_unsigned() {
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(1, 4, 8, 8, false, 1, "MONOCHROME2")
        .pixel_data("OB", &[0, 127, 128, 255])
        .build();
    assert_eq!(decode(data, 0).unwrap().pixels, PixelData::U8(vec![0, 127, 128, 255]));

    let data = DicomWriter::new(EXPLICIT_LE)
        .image(1, 4, 8, 8, true, 1, "MONOCHROME2")
        .pixel_data("OB", &[0, 127, 128, 255])
        .build();
    assert_eq!(decode(data, 0).unwrap().pixels, PixelData::I8(vec![0, 127, -128, -1]));
}

#[test]
fn test_12bit_packed() {
    let values = [0x0ABC, 0x0123, 0x0FFF, 0x0000];
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(2, 2, 12, 12, false, 1, "MONOCHROME2")
        .pixel_data("OB", &pack_12bit(&values))
        .build();
    assert_eq!(decode(data, 0).unwrap().pixels, PixelData::U16(values.to_vec()));
}

#[test]
fn test_12bit_packed_signed() {
    // 0xFFF is -1 and 0x800 is -2048 in 12-bit two's complement
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(1, 4, 12, 12, true, 1, "MONOCHROME2")
        .pixel_data("OB", &pack_12bit(&[0x0FFF, 0x0800, 0x07FF, 0x0001]))
        .build();
    assert_eq!(
        decode(data, 0).unwrap().pixels,
        PixelData::I16(vec![-1, -2048, 2047, 1])
    );
}

#[test]
fn test_12bit_multi_frame_odd_sample_count() {
    // Three samples per frame: frame 1 starts half way through a byte
    let values = [0x111, 0x222, 0x333, 0x444, 0x555, 0x666];
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(1, 3, 12, 12, false, 1, "MONOCHROME2")
        .frames(2)
        .pixel_data("OB", &pack_12bit(&values))
        .build();

    assert_eq!(
        decode(data.clone(), 0).unwrap().pixels,
        PixelData::U16(vec![0x111, 0x222, 0x333])
    );
    assert_eq!(
        decode(data, 1).unwrap().pixels,
        PixelData::U16(vec![0x444, 0x555, 0x666])
    );
}

#[test]
fn test_16bit_signed() {
    let values = [-1024i16, -1, 0, 3071];
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(2, 2, 16, 16, true, 1, "MONOCHROME2")
        .pixel_data("OW", &i16_le(&values))
        .build();
    assert_eq!(decode(data, 0).unwrap().pixels, PixelData::I16(values.to_vec()));
}

#[test]
fn test_32bit_signed_and_unsigned() {
    let unsigned = [0u32, 1, 70_000, u32::MAX];
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(2, 2, 32, 32, false, 1, "MONOCHROME2")
        .pixel_data("OB", &u32_le(&unsigned))
        .build();
    assert_eq!(decode(data, 0).unwrap().pixels, PixelData::U32(unsigned.to_vec()));

    let signed = [i32::MIN, -70_000, 0, 5];
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(2, 2, 32, 32, true, 1, "MONOCHROME2")
        .pixel_data("OB", &i32_le(&signed))
        .build();
    assert_eq!(decode(data, 0).unwrap().pixels, PixelData::I32(signed.to_vec()));
}

#[test]
fn test_16bit_big_endian() {
    let values = [0x0102u16, 0x0304, 0xA0B0, 0x00FF];
    let data = DicomWriter::new(EXPLICIT_BE)
        .image(2, 2, 16, 16, false, 1, "MONOCHROME2")
        .pixel_data("OW", &u16_be(&values))
        .build();
    assert_eq!(decode(data, 0).unwrap().pixels, PixelData::U16(values.to_vec()));
}

#[test]
fn test_implicit_vr_native() {
    let values = [1u16, 2, 3, 4];
    let data = DicomWriter::new(IMPLICIT_LE)
        .image(2, 2, 16, 16, false, 1, "MONOCHROME1")
        .pixel_data("OW", &u16_le(&values))
        .build();
    let frame = decode(data, 0).unwrap();
    assert_eq!(frame.photometric, Photometric::Monochrome1);
    assert_eq!(frame.pixels, PixelData::U16(values.to_vec()));
}

#[test]
fn test_multi_frame_native() {
    let frames: Vec<u16> = (0..12).collect();
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(2, 2, 16, 16, false, 1, "MONOCHROME2")
        .frames(3)
        .pixel_data("OW", &u16_le(&frames))
        .build();

    assert_eq!(decode(data.clone(), 0).unwrap().pixels, PixelData::U16(vec![0, 1, 2, 3]));
    assert_eq!(decode(data.clone(), 2).unwrap().pixels, PixelData::U16(vec![8, 9, 10, 11]));
    assert_eq!(
        decode(data, 3).unwrap_err(),
        CodecError::FrameOutOfBounds { index: 3, count: 3 }
    );
}

#[test]
fn test_truncated_native_frame() {
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(4, 4, 16, 16, false, 1, "MONOCHROME2")
        .pixel_data("OW", &u16_le(&[0; 4]))
        .build();
    assert!(matches!(decode(data, 0), Err(CodecError::Format(_))));
}

// =============================================================================
// Palette Color
// =============================================================================

#[test]
fn test_palette_color_clamps_indices() {
    let enc = Encoding::EXPLICIT_LE;
    // 4 entries, first mapped value 10, 16 bits per entry
    let descriptor = u16_le(&[4, 10, 16]);
    let red = u16_le(&[100, 200, 300, 400]);
    let green = u16_le(&[1, 2, 3, 4]);
    let blue = u16_le(&[0, 0, 0, 65535]);

    let data = DicomWriter::new(EXPLICIT_LE)
        .image(1, 3, 8, 8, false, 1, "PALETTE COLOR")
        .raw((0x0028, 0x1101), enc.element((0x0028, 0x1101), "US", &descriptor))
        .raw((0x0028, 0x1102), enc.element((0x0028, 0x1102), "US", &descriptor))
        .raw((0x0028, 0x1103), enc.element((0x0028, 0x1103), "US", &descriptor))
        .raw((0x0028, 0x1201), enc.element((0x0028, 0x1201), "OW", &red))
        .raw((0x0028, 0x1202), enc.element((0x0028, 0x1202), "OW", &green))
        .raw((0x0028, 0x1203), enc.element((0x0028, 0x1203), "OW", &blue))
        // Below range, in range, above range
        .pixel_data("OB", &[0, 11, 200])
        .build();

    let frame = decode(data, 0).unwrap();
    assert_eq!(frame.channels, 3);
    assert_eq!(frame.photometric, Photometric::Rgb);
    assert_eq!(
        frame.pixels,
        PixelData::U16(vec![100, 1, 0, 200, 2, 0, 400, 4, 65535])
    );
}

/// 16-bit index image over three palette channels sharing one descriptor.
fn palette_image(descriptor: &[u16], vr: &str, tables: [&[u8]; 3], indices: &[u16]) -> Vec<u8> {
    let enc = Encoding::EXPLICIT_LE;
    let descriptor = u16_le(descriptor);
    let mut writer = DicomWriter::new(EXPLICIT_LE)
        .image(1, indices.len() as u16, 16, 16, false, 1, "PALETTE COLOR")
        .pixel_data("OW", &u16_le(indices));
    for (i, table) in tables.iter().enumerate() {
        let element = 0x1101 + i as u16;
        writer = writer.raw(
            (0x0028, element),
            enc.element((0x0028, element), "US", &descriptor),
        );
        let element = 0x1201 + i as u16;
        writer = writer.raw((0x0028, element), enc.element((0x0028, element), vr, table));
    }
    writer.build()
}

#[test]
fn test_palette_zero_length_means_65536_entries_8bit() {
    let mut red = vec![1u8; 65536];
    red[65535] = 200;
    let green = vec![2u8; 65536];
    let mut blue = vec![3u8; 65536];
    blue[65534] = 77;

    let data = palette_image(&[0, 0, 8], "OB", [&red, &green, &blue], &[0, 65534, 65535]);
    let frame = decode(data, 0).unwrap();
    assert_eq!(frame.channels, 3);
    assert_eq!(
        frame.pixels,
        PixelData::U8(vec![1, 2, 3, 1, 2, 77, 200, 2, 3])
    );
}

#[test]
fn test_palette_zero_length_means_65536_entries_16bit() {
    let mut red: Vec<u16> = vec![100; 65536];
    red[65535] = 65000;
    let green: Vec<u16> = (0..=65535u16).collect();
    let blue: Vec<u16> = vec![7; 65536];

    let data = palette_image(
        &[0, 0, 16],
        "OW",
        [&u16_le(&red), &u16_le(&green), &u16_le(&blue)],
        &[0, 65535],
    );
    let frame = decode(data, 0).unwrap();
    assert_eq!(
        frame.pixels,
        PixelData::U16(vec![100, 0, 7, 65000, 65535, 7])
    );
}

#[test]
fn test_palette_ignores_entries_past_declared_count() {
    // Two declared entries; the trailing words are padding
    let red = u16_le(&[10, 20, 999, 999]);
    let green = u16_le(&[1, 2, 999, 999]);
    let blue = u16_le(&[5, 6, 999, 999]);

    let data = palette_image(&[2, 0, 16], "OW", [&red, &green, &blue], &[0, 1, 3]);
    let frame = decode(data, 0).unwrap();
    assert_eq!(
        frame.pixels,
        PixelData::U16(vec![10, 1, 5, 20, 2, 6, 20, 2, 6])
    );
}

#[test]
fn test_palette_without_tables_is_rejected() {
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(1, 2, 8, 8, false, 1, "PALETTE COLOR")
        .pixel_data("OB", &[0, 1])
        .build();
    assert!(matches!(decode(data, 0), Err(CodecError::MissingTag(_))));
}

// =============================================================================
// Encapsulated
// =============================================================================

#[test]
fn test_rle_16bit() {
    let values = [0x0102u16, 0x0A0B, 0xFF00, 0x0080];
    let high: Vec<u8> = values.iter().map(|v| (v >> 8) as u8).collect();
    let low: Vec<u8> = values.iter().map(|v| (v & 0xFF) as u8).collect();

    let data = DicomWriter::new(RLE_LOSSLESS)
        .image(2, 2, 16, 16, false, 1, "MONOCHROME2")
        .encapsulated(&[], &[rle_frame(&[high, low])])
        .build();
    assert_eq!(decode(data, 0).unwrap().pixels, PixelData::U16(values.to_vec()));
}

#[test]
fn test_rle_rgb_planes() {
    let red = vec![1, 2, 3, 4];
    let green = vec![5, 6, 7, 8];
    let blue = vec![9, 10, 11, 12];
    let data = DicomWriter::new(RLE_LOSSLESS)
        .image(2, 2, 8, 8, false, 3, "RGB")
        .us((0x0028, 0x0006), 1)
        .encapsulated(&[], &[rle_frame(&[red, green, blue])])
        .build();

    let frame = decode(data, 0).unwrap();
    assert_eq!(frame.channels, 3);
    assert_eq!(
        frame.pixels,
        PixelData::U8(vec![1, 5, 9, 2, 6, 10, 3, 7, 11, 4, 8, 12])
    );
}

#[test]
fn test_rle_multi_frame_selects_fragment() {
    let first = rle_frame(&[vec![1, 2, 3, 4]]);
    let second = rle_frame(&[vec![5, 6, 7, 8]]);
    let data = DicomWriter::new(RLE_LOSSLESS)
        .image(2, 2, 8, 8, false, 1, "MONOCHROME2")
        .frames(2)
        .encapsulated(&[], &[first, second])
        .build();
    assert_eq!(decode(data, 1).unwrap().pixels, PixelData::U8(vec![5, 6, 7, 8]));
}

#[test]
fn test_jpeg_baseline_grey() {
    let data = DicomWriter::new(JPEG_BASELINE)
        .image(8, 8, 8, 8, false, 1, "MONOCHROME2")
        .encapsulated(&[], &[gradient_jpeg(8, 8)])
        .build();

    let frame = decode(data, 0).unwrap();
    assert_eq!((frame.columns, frame.rows, frame.channels), (8, 8, 1));
    let PixelData::U8(samples) = &frame.pixels else {
        panic!("expected 8-bit samples, got {:?}", frame.pixels.sample_type());
    };
    for (i, &v) in samples.iter().enumerate() {
        let expected = ((i % 8) * 32).min(255) as i32;
        assert!(
            (v as i32 - expected).abs() <= 8,
            "sample {} is {}, expected about {}",
            i,
            v,
            expected
        );
    }
}

#[test]
fn test_jpeg_dimension_mismatch() {
    let data = DicomWriter::new(JPEG_BASELINE)
        .image(16, 16, 8, 8, false, 1, "MONOCHROME2")
        .encapsulated(&[], &[gradient_jpeg(8, 8)])
        .build();
    assert!(decode(data, 0).is_err());
}

// =============================================================================
// Unsupported
// =============================================================================

#[test]
fn test_unsupported_syntax_names_uid() {
    let data = DicomWriter::new(JPEG_LS_LOSSLESS)
        .image(2, 2, 8, 8, false, 1, "MONOCHROME2")
        .encapsulated(&[], &[vec![0xFF, 0xD8, 0xFF, 0xD9]])
        .build();

    let err = decode(data, 0).unwrap_err();
    assert_eq!(err, CodecError::NoDecoder(JPEG_LS_LOSSLESS.to_string()));
    assert!(err.to_string().contains(JPEG_LS_LOSSLESS));
}

#[test]
fn test_missing_pixel_data() {
    let data = DicomWriter::new(EXPLICIT_LE)
        .image(2, 2, 8, 8, false, 1, "MONOCHROME2")
        .build();
    assert_eq!(decode(data, 0).unwrap_err(), CodecError::MissingTag("PixelData"));
}
