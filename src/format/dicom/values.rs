//! Element value decoding.
//!
//! Binary numeric VRs decode to typed vectors in the stream's byte order.
//! String VRs decode through the dataset's character set. Everything else
//! (OB, OW, UN, ...) stays as a shared byte slice.

use bytes::Bytes;

use crate::io::ByteOrder;

use super::dataset::{Dataset, Fragments};
use super::tags::{Tag, Vr};

// =============================================================================
// Value
// =============================================================================

/// Decoded value of one element.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Zero-length value
    Empty,
    /// String VRs, and numeric VRs whose length did not match their width
    Text(String),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    U64(Vec<u64>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    /// Attribute tag values (AT)
    Tags(Vec<Tag>),
    /// Other-type and unknown values, left undecoded
    Bytes(Bytes),
    /// Sequence items
    Sequence(Vec<Dataset>),
    /// Encapsulated (compressed) pixel data
    Encapsulated(Fragments),
}

impl Value {
    /// Number of values held (items for sequences, fragments for pixel data).
    pub fn multiplicity(&self) -> usize {
        match self {
            Value::Empty => 0,
            Value::Text(s) => split_text(s).count(),
            Value::U16(v) => v.len(),
            Value::I16(v) => v.len(),
            Value::U32(v) => v.len(),
            Value::I32(v) => v.len(),
            Value::U64(v) => v.len(),
            Value::I64(v) => v.len(),
            Value::F32(v) => v.len(),
            Value::F64(v) => v.len(),
            Value::Tags(v) => v.len(),
            Value::Bytes(_) => 1,
            Value::Sequence(items) => items.len(),
            Value::Encapsulated(f) => f.fragments.len(),
        }
    }

    /// All values as `f64`, parsing text when needed.
    ///
    /// Returns `None` for non-numeric values or when any text component fails
    /// to parse.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            Value::Text(s) => split_text(s)
                .map(|part| part.parse::<f64>().ok())
                .collect(),
            Value::U16(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Value::I16(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Value::U32(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Value::I32(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Value::U64(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Value::I64(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Value::F32(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Value::F64(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// All values as `i64`. Text is parsed as integers, falling back to
    /// truncating decimals ("512.0" is a common IS deviation).
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        match self {
            Value::Text(s) => split_text(s)
                .map(|part| {
                    part.parse::<i64>()
                        .ok()
                        .or_else(|| part.parse::<f64>().ok().map(|f| f as i64))
                })
                .collect(),
            Value::U16(v) => Some(v.iter().map(|&x| x as i64).collect()),
            Value::I16(v) => Some(v.iter().map(|&x| x as i64).collect()),
            Value::U32(v) => Some(v.iter().map(|&x| x as i64).collect()),
            Value::I32(v) => Some(v.iter().map(|&x| x as i64).collect()),
            Value::U64(v) => Some(v.iter().map(|&x| x as i64).collect()),
            Value::I64(v) => Some(v.clone()),
            Value::F32(v) => Some(v.iter().map(|&x| x as i64).collect()),
            Value::F64(v) => Some(v.iter().map(|&x| x as i64).collect()),
            _ => None,
        }
    }
}

/// Split a multi-valued string on the backslash delimiter, trimming padding.
pub fn split_text(text: &str) -> impl Iterator<Item = &str> {
    text.split('\\')
        .map(|part| part.trim_matches(|c: char| c == ' ' || c == '\0'))
        .filter(|part| !part.is_empty())
}

// =============================================================================
// Character Sets
// =============================================================================

/// Text encodings declared by Specific Character Set (0008,0005).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// Default repertoire (ASCII); decoded leniently as UTF-8
    #[default]
    Default,
    /// ISO_IR 100
    Latin1,
    /// ISO_IR 192
    Utf8,
}

impl Charset {
    /// Resolve a Specific Character Set value.
    ///
    /// Only the first value is considered; code extension sets are decoded
    /// with the default repertoire.
    pub fn from_term(term: &str) -> Self {
        match split_text(term).next().unwrap_or("") {
            "ISO_IR 100" | "ISO 2022 IR 100" => Charset::Latin1,
            "ISO_IR 192" => Charset::Utf8,
            _ => Charset::Default,
        }
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Charset::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Charset::Default | Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a primitive (non-sequence, non-encapsulated) value.
pub fn decode_value(vr: Vr, bytes: Bytes, order: ByteOrder, charset: Charset) -> Value {
    if bytes.is_empty() {
        return Value::Empty;
    }

    if vr.is_text() {
        let text = charset.decode(&bytes);
        return Value::Text(trim_padding(text));
    }

    if let Some(width) = vr.numeric_width() {
        if bytes.len() % width != 0 {
            // Length does not match the VR: treat as delimiter-separated text
            let text = Charset::Default.decode(&bytes);
            return Value::Text(trim_padding(text));
        }
        let chunks = bytes.chunks_exact(width);
        return match vr {
            Vr::US => Value::U16(chunks.map(|c| order.read_u16(c)).collect()),
            Vr::SS => Value::I16(chunks.map(|c| order.read_u16(c) as i16).collect()),
            Vr::UL => Value::U32(chunks.map(|c| order.read_u32(c)).collect()),
            Vr::SL => Value::I32(chunks.map(|c| order.read_u32(c) as i32).collect()),
            Vr::FL => Value::F32(chunks.map(|c| f32::from_bits(order.read_u32(c))).collect()),
            Vr::UV => Value::U64(chunks.map(|c| order.read_u64(c)).collect()),
            Vr::SV => Value::I64(chunks.map(|c| order.read_u64(c) as i64).collect()),
            Vr::FD => Value::F64(chunks.map(|c| f64::from_bits(order.read_u64(c))).collect()),
            Vr::AT => Value::Tags(
                chunks
                    .map(|c| Tag::new(order.read_u16(&c[0..2]), order.read_u16(&c[2..4])))
                    .collect(),
            ),
            _ => Value::Bytes(bytes),
        };
    }

    Value::Bytes(bytes)
}

fn trim_padding(mut text: String) -> String {
    let trimmed_len = text.trim_end_matches(|c: char| c == ' ' || c == '\0').len();
    text.truncate(trimmed_len);
    text
}
