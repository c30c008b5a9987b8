//! Test utilities for integration tests.
//!
//! This module provides a small DICOM writer for building synthetic Part 10
//! files and bare datasets in any of the supported encodings, plus helpers
//! for packing native pixel data.

#![allow(dead_code)]

use std::collections::BTreeMap;

use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, Luma};

pub const IMPLICIT_LE: &str = "1.2.840.10008.1.2";
pub const EXPLICIT_LE: &str = "1.2.840.10008.1.2.1";
pub const EXPLICIT_BE: &str = "1.2.840.10008.1.2.2";
pub const RLE_LOSSLESS: &str = "1.2.840.10008.1.2.5";
pub const JPEG_BASELINE: &str = "1.2.840.10008.1.2.4.50";
pub const JPEG_LS_LOSSLESS: &str = "1.2.840.10008.1.2.4.80";

const LONG_VRS: [&str; 13] = [
    "OB", "OD", "OF", "OL", "OV", "OW", "SQ", "SV", "UC", "UN", "UR", "UT", "UV",
];

const UNDEFINED: u32 = 0xFFFF_FFFF;

// =============================================================================
// Element encoding
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Encoding {
    pub explicit_vr: bool,
    pub big_endian: bool,
}

impl Encoding {
    pub const EXPLICIT_LE: Encoding = Encoding {
        explicit_vr: true,
        big_endian: false,
    };

    pub fn for_syntax(uid: &str) -> Self {
        match uid {
            IMPLICIT_LE => Encoding {
                explicit_vr: false,
                big_endian: false,
            },
            EXPLICIT_BE => Encoding {
                explicit_vr: true,
                big_endian: true,
            },
            _ => Self::EXPLICIT_LE,
        }
    }

    fn u16(&self, v: u16) -> [u8; 2] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    fn u32(&self, v: u32) -> [u8; 4] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    /// Element header with the given value length.
    pub fn header(&self, tag: (u16, u16), vr: &str, length: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.u16(tag.0));
        out.extend_from_slice(&self.u16(tag.1));
        if self.explicit_vr {
            out.extend_from_slice(vr.as_bytes());
            if LONG_VRS.contains(&vr) {
                out.extend_from_slice(&[0, 0]);
                out.extend_from_slice(&self.u32(length));
            } else {
                out.extend_from_slice(&self.u16(length as u16));
            }
        } else {
            out.extend_from_slice(&self.u32(length));
        }
        out
    }

    /// Item or delimiter tag (never has a VR).
    pub fn item(&self, element: u16, length: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.u16(0xFFFE));
        out.extend_from_slice(&self.u16(element));
        out.extend_from_slice(&self.u32(length));
        out
    }

    pub fn element(&self, tag: (u16, u16), vr: &str, value: &[u8]) -> Vec<u8> {
        let mut out = self.header(tag, vr, value.len() as u32);
        out.extend_from_slice(value);
        out
    }
}

fn pad_text(vr: &str, value: &str) -> Vec<u8> {
    let mut bytes = value.as_bytes().to_vec();
    if bytes.len() % 2 == 1 {
        bytes.push(if vr == "UI" { 0 } else { b' ' });
    }
    bytes
}

// =============================================================================
// DicomWriter
// =============================================================================

/// Builder for synthetic DICOM streams.
#[derive(Debug, Clone)]
pub struct DicomWriter {
    syntax: &'static str,
    encoding: Encoding,
    part10: bool,
    elements: BTreeMap<(u16, u16), Vec<u8>>,
}

impl DicomWriter {
    /// Part 10 file (preamble, DICM, meta group) with the given syntax.
    pub fn new(syntax: &'static str) -> Self {
        Self {
            syntax,
            encoding: Encoding::for_syntax(syntax),
            part10: true,
            elements: BTreeMap::new(),
        }
    }

    /// Bare dataset without preamble or meta group.
    pub fn bare(syntax: &'static str) -> Self {
        Self {
            part10: false,
            ..Self::new(syntax)
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Pre-encoded element bytes.
    pub fn raw(mut self, tag: (u16, u16), bytes: Vec<u8>) -> Self {
        self.elements.insert(tag, bytes);
        self
    }

    pub fn text(self, tag: (u16, u16), vr: &str, value: &str) -> Self {
        let bytes = self.encoding.element(tag, vr, &pad_text(vr, value));
        self.raw(tag, bytes)
    }

    pub fn us(self, tag: (u16, u16), value: u16) -> Self {
        let bytes = self.encoding.element(tag, "US", &self.encoding.u16(value));
        self.raw(tag, bytes)
    }

    /// Image pixel module attributes.
    pub fn image(
        self,
        rows: u16,
        columns: u16,
        bits_allocated: u16,
        bits_stored: u16,
        signed: bool,
        samples_per_pixel: u16,
        photometric: &str,
    ) -> Self {
        self.us((0x0028, 0x0002), samples_per_pixel)
            .text((0x0028, 0x0004), "CS", photometric)
            .us((0x0028, 0x0010), rows)
            .us((0x0028, 0x0011), columns)
            .us((0x0028, 0x0100), bits_allocated)
            .us((0x0028, 0x0101), bits_stored)
            .us((0x0028, 0x0102), bits_stored.saturating_sub(1))
            .us((0x0028, 0x0103), signed as u16)
    }

    pub fn frames(self, count: usize) -> Self {
        self.text((0x0028, 0x0008), "IS", &count.to_string())
    }

    /// Native pixel data, padded to even length.
    pub fn pixel_data(self, vr: &str, data: &[u8]) -> Self {
        let mut data = data.to_vec();
        if data.len() % 2 == 1 {
            data.push(0);
        }
        let bytes = self.encoding.element((0x7FE0, 0x0010), vr, &data);
        self.raw((0x7FE0, 0x0010), bytes)
    }

    /// Encapsulated pixel data with a basic offset table and fragments.
    pub fn encapsulated(self, offset_table: &[u32], fragments: &[Vec<u8>]) -> Self {
        let enc = self.encoding;
        let mut bytes = enc.header((0x7FE0, 0x0010), "OB", UNDEFINED);

        let table: Vec<u8> = offset_table.iter().flat_map(|o| o.to_le_bytes()).collect();
        bytes.extend_from_slice(&enc.item(0xE000, table.len() as u32));
        bytes.extend_from_slice(&table);

        for fragment in fragments {
            let mut fragment = fragment.clone();
            if fragment.len() % 2 == 1 {
                fragment.push(0);
            }
            bytes.extend_from_slice(&enc.item(0xE000, fragment.len() as u32));
            bytes.extend_from_slice(&fragment);
        }
        bytes.extend_from_slice(&enc.item(0xE0DD, 0));
        self.raw((0x7FE0, 0x0010), bytes)
    }

    /// Image position (LPS) and instance number for series tests.
    pub fn position(self, instance: i64, position: [f64; 3]) -> Self {
        self.text((0x0020, 0x0013), "IS", &instance.to_string()).text(
            (0x0020, 0x0032),
            "DS",
            &format!("{}\\{}\\{}", position[0], position[1], position[2]),
        )
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        if self.part10 {
            out.extend_from_slice(&[0u8; 128]);
            out.extend_from_slice(b"DICM");
            out.extend_from_slice(&meta_group(self.syntax));
        }
        for bytes in self.elements.values() {
            out.extend_from_slice(bytes);
        }
        out
    }
}

/// File meta information group, always explicit VR little endian.
pub fn meta_group(syntax: &str) -> Vec<u8> {
    let enc = Encoding::EXPLICIT_LE;
    let mut body = Vec::new();
    body.extend(enc.element((0x0002, 0x0001), "OB", &[0, 1]));
    body.extend(enc.element(
        (0x0002, 0x0002),
        "UI",
        &pad_text("UI", "1.2.840.10008.5.1.4.1.1.2"),
    ));
    body.extend(enc.element((0x0002, 0x0010), "UI", &pad_text("UI", syntax)));

    let mut out = enc.element((0x0002, 0x0000), "UL", &(body.len() as u32).to_le_bytes());
    out.extend(body);
    out
}

// =============================================================================
// Pixel packing
// =============================================================================

pub fn u16_le(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn u16_be(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

pub fn i16_le(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn u32_le(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn i32_le(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Pack 0/1 values, least significant bit first.
pub fn pack_1bit(values: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; values.len().div_ceil(8)];
    for (i, &v) in values.iter().enumerate() {
        if v != 0 {
            out[i / 8] |= 1 << (i % 8);
        }
    }
    out
}

/// Pack 12-bit values, two per three bytes, as an LSB-first bit stream.
pub fn pack_12bit(values: &[u16]) -> Vec<u8> {
    let mut out = Vec::new();
    for pair in values.chunks(2) {
        let p0 = pair[0] & 0x0FFF;
        let p1 = pair.get(1).copied().unwrap_or(0) & 0x0FFF;
        out.push((p0 & 0xFF) as u8);
        out.push(((p0 >> 8) as u8) | (((p1 & 0x0F) as u8) << 4));
        out.push((p1 >> 4) as u8);
    }
    out
}

/// RLE frame with one literal-run segment per byte plane.
pub fn rle_frame(planes: &[Vec<u8>]) -> Vec<u8> {
    let mut header = vec![0u8; 64];
    header[0..4].copy_from_slice(&(planes.len() as u32).to_le_bytes());
    let mut body = Vec::new();
    for (i, plane) in planes.iter().enumerate() {
        let offset = (64 + body.len()) as u32;
        header[4 + i * 4..8 + i * 4].copy_from_slice(&offset.to_le_bytes());
        for chunk in plane.chunks(128) {
            body.push((chunk.len() - 1) as u8);
            body.extend_from_slice(chunk);
        }
        if body.len() % 2 == 1 {
            body.push(0x80);
        }
    }
    header.extend_from_slice(&body);
    header
}

/// Baseline JPEG of a horizontal grey gradient.
pub fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, _| Luma([(x * 32).min(255) as u8]));
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, 100);
    encoder.encode_image(&img).unwrap();
    buf
}

/// Single-frame 2x2 MONOCHROME2 16-bit slice for volume tests.
pub fn volume_slice(instance: i64, z: f64, values: [u16; 4]) -> Vec<u8> {
    DicomWriter::new(EXPLICIT_LE)
        .text((0x0008, 0x0018), "UI", &format!("1.2.3.{}", instance))
        .image(2, 2, 16, 16, false, 1, "MONOCHROME2")
        .text((0x0028, 0x0030), "DS", "0.5\\0.5")
        .position(instance, [-10.0, -10.0, z])
        .pixel_data("OW", &u16_le(&values))
        .build()
}
