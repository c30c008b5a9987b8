//! Dataset and element model.
//!
//! A [`Dataset`] is an ordered map from [`Tag`] to [`Element`]. Sequence
//! elements own their item datasets, so the structure is a plain tree.

use std::collections::BTreeMap;

use bytes::Bytes;

use super::dictionary;
use super::tags::{tags, Tag, Vr};
use super::values::{split_text, Value};

/// Length value marking undefined-length sequences, items and pixel data.
pub const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

// =============================================================================
// Element
// =============================================================================

/// One parsed data element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Tag,
    pub vr: Vr,
    /// Length as declared in the stream (may be [`UNDEFINED_LENGTH`])
    pub length: u32,
    pub value: Value,
}

impl Element {
    pub fn new(tag: Tag, vr: Vr, length: u32, value: Value) -> Self {
        Self {
            tag,
            vr,
            length,
            value,
        }
    }

    /// Dictionary keyword, if the tag is known.
    pub fn name(&self) -> Option<&'static str> {
        dictionary::name_of(self.tag)
    }

    pub fn is_undefined_length(&self) -> bool {
        self.length == UNDEFINED_LENGTH
    }

    /// Raw text of a string element.
    pub fn to_str(&self) -> Option<&str> {
        match &self.value {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Individual values of a multi-valued string element.
    pub fn strings(&self) -> Vec<&str> {
        match &self.value {
            Value::Text(s) => split_text(s).collect(),
            _ => Vec::new(),
        }
    }

    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        self.value.to_f64_vec()
    }

    /// First value as `f64`.
    pub fn to_f64(&self) -> Option<f64> {
        self.value.to_f64_vec()?.first().copied()
    }

    /// First value as `i64`.
    pub fn to_i64(&self) -> Option<i64> {
        self.value.to_i64_vec()?.first().copied()
    }

    /// All values as `u16`, for US descriptors and similar.
    pub fn to_u16_vec(&self) -> Option<Vec<u16>> {
        match &self.value {
            Value::U16(v) => Some(v.clone()),
            // Descriptors may be declared SS; reinterpret the bits
            Value::I16(v) => Some(v.iter().map(|&x| x as u16).collect()),
            other => other
                .to_i64_vec()?
                .into_iter()
                .map(|x| u16::try_from(x).ok())
                .collect(),
        }
    }

    /// Sequence items.
    pub fn items(&self) -> Option<&[Dataset]> {
        match &self.value {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Undecoded bytes of an OB/OW/UN-style element.
    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.value {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Encapsulated pixel data fragments.
    pub fn fragments(&self) -> Option<&Fragments> {
        match &self.value {
            Value::Encapsulated(f) => Some(f),
            _ => None,
        }
    }
}

// =============================================================================
// Fragments
// =============================================================================

/// Encapsulated pixel data: basic offset table plus one entry per fragment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragments {
    /// Byte offsets of each frame's first fragment item, relative to the first
    /// fragment item. Often empty.
    pub offset_table: Vec<u32>,
    pub fragments: Vec<Bytes>,
}

impl Fragments {
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Offset of each fragment item relative to the first fragment item, in
    /// the same frame of reference as the basic offset table.
    ///
    /// Every item carries an 8-byte tag + length header.
    pub fn item_offsets(&self) -> Vec<u64> {
        let mut offsets = Vec::with_capacity(self.fragments.len());
        let mut position = 0u64;
        for fragment in &self.fragments {
            offsets.push(position);
            position += 8 + fragment.len() as u64;
        }
        offsets
    }

    /// Total encoded size without item headers.
    pub fn total_size(&self) -> usize {
        self.fragments.iter().map(Bytes::len).sum()
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Tag-ordered collection of elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    elements: BTreeMap<Tag, Element>,
    /// Transfer syntax assumed for bare streams that carry no meta group
    inferred_syntax: Option<&'static str>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_inferred_syntax(&mut self, uid: &'static str) {
        self.inferred_syntax = Some(uid);
    }

    pub fn insert(&mut self, element: Element) -> Option<Element> {
        self.elements.insert(element.tag, element)
    }

    pub fn remove(&mut self, tag: Tag) -> Option<Element> {
        self.elements.remove(&tag)
    }

    pub fn get(&self, tag: Tag) -> Option<&Element> {
        self.elements.get(&tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.elements.contains_key(&tag)
    }

    /// Elements in tag order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Drop pixel data elements, keeping every other attribute.
    ///
    /// Returns the number of encoded bytes released.
    pub fn clear_pixel_data(&mut self) -> usize {
        let mut released = 0;
        for tag in [
            tags::PIXEL_DATA,
            tags::FLOAT_PIXEL_DATA,
            tags::DOUBLE_FLOAT_PIXEL_DATA,
        ] {
            if let Some(element) = self.elements.remove(&tag) {
                released += match &element.value {
                    Value::Bytes(b) => b.len(),
                    Value::Encapsulated(f) => f.total_size(),
                    _ => 0,
                };
            }
        }
        released
    }

    // -------------------------------------------------------------------------
    // Frame-aware lookup
    // -------------------------------------------------------------------------

    /// Find an element for a frame of an enhanced multi-frame image.
    ///
    /// Looks in the frame's item of the per-frame functional groups sequence,
    /// then in the shared functional groups, then in the flat dataset. Inside a
    /// functional group item the tag is searched directly and inside the first
    /// item of each nested macro sequence.
    pub fn find_for_frame(&self, tag: Tag, frame: usize) -> Option<&Element> {
        let per_frame = self
            .get(tags::PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE)
            .and_then(Element::items)
            .and_then(|items| items.get(frame));
        if let Some(element) = per_frame.and_then(|item| find_in_group_item(item, tag)) {
            return Some(element);
        }

        let shared = self
            .get(tags::SHARED_FUNCTIONAL_GROUPS_SEQUENCE)
            .and_then(Element::items)
            .and_then(|items| items.first());
        if let Some(element) = shared.and_then(|item| find_in_group_item(item, tag)) {
            return Some(element);
        }

        self.get(tag)
    }

    fn numbers_for_frame(&self, tag: Tag, frame: usize) -> Option<Vec<f64>> {
        self.find_for_frame(tag, frame)?.to_f64_vec()
    }

    fn number_for_frame(&self, tag: Tag, frame: usize) -> Option<f64> {
        self.find_for_frame(tag, frame)?.to_f64()
    }

    fn fixed_for_frame<const N: usize>(&self, tag: Tag, frame: usize) -> Option<[f64; N]> {
        let values = self.numbers_for_frame(tag, frame)?;
        if values.len() < N {
            return None;
        }
        let mut out = [0.0; N];
        out.copy_from_slice(&values[..N]);
        Some(out)
    }

    /// Image-level attributes do not vary by frame; frame 0's groups stand
    /// in for the whole image.
    fn u16_attribute(&self, tag: Tag, default: u16) -> u16 {
        self.find_for_frame(tag, 0)
            .and_then(Element::to_i64)
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(default)
    }

    // -------------------------------------------------------------------------
    // Typed accessors
    // -------------------------------------------------------------------------

    /// Text of a string element, if present.
    pub fn string(&self, tag: Tag) -> Option<&str> {
        self.get(tag)?.to_str()
    }

    /// Transfer syntax from the meta group, or the one inferred for a bare
    /// stream.
    pub fn transfer_syntax_uid(&self) -> Option<&str> {
        self.string(tags::TRANSFER_SYNTAX_UID)
            .or(self.inferred_syntax)
    }

    pub fn sop_instance_uid(&self) -> Option<&str> {
        self.string(tags::SOP_INSTANCE_UID)
            .or_else(|| self.string(tags::MEDIA_STORAGE_SOP_INSTANCE_UID))
    }

    pub fn photometric_interpretation(&self) -> Option<&str> {
        self.string(tags::PHOTOMETRIC_INTERPRETATION)
    }

    pub fn number_of_frames(&self, default: usize) -> usize {
        self.get(tags::NUMBER_OF_FRAMES)
            .and_then(Element::to_i64)
            .and_then(|v| usize::try_from(v).ok())
            .filter(|&v| v > 0)
            .unwrap_or(default)
    }

    pub fn rows(&self, default: u16) -> u16 {
        self.u16_attribute(tags::ROWS, default)
    }

    pub fn columns(&self, default: u16) -> u16 {
        self.u16_attribute(tags::COLUMNS, default)
    }

    pub fn bits_allocated(&self, default: u16) -> u16 {
        self.u16_attribute(tags::BITS_ALLOCATED, default)
    }

    pub fn bits_stored(&self, default: u16) -> u16 {
        self.u16_attribute(tags::BITS_STORED, default)
    }

    pub fn pixel_representation(&self, default: u16) -> u16 {
        self.u16_attribute(tags::PIXEL_REPRESENTATION, default)
    }

    pub fn samples_per_pixel(&self, default: u16) -> u16 {
        self.u16_attribute(tags::SAMPLES_PER_PIXEL, default)
    }

    pub fn planar_configuration(&self, default: u16) -> u16 {
        self.u16_attribute(tags::PLANAR_CONFIGURATION, default)
    }

    /// First window center for a frame.
    pub fn window_center(&self, frame: usize, default: f64) -> f64 {
        self.number_for_frame(tags::WINDOW_CENTER, frame)
            .unwrap_or(default)
    }

    /// First window width for a frame.
    pub fn window_width(&self, frame: usize, default: f64) -> f64 {
        self.number_for_frame(tags::WINDOW_WIDTH, frame)
            .unwrap_or(default)
    }

    pub fn rescale_slope(&self, frame: usize, default: f64) -> f64 {
        self.number_for_frame(tags::RESCALE_SLOPE, frame)
            .unwrap_or(default)
    }

    pub fn rescale_intercept(&self, frame: usize, default: f64) -> f64 {
        self.number_for_frame(tags::RESCALE_INTERCEPT, frame)
            .unwrap_or(default)
    }

    /// Pixel spacing as `[row spacing, column spacing]` in mm.
    pub fn pixel_spacing(&self, frame: usize, default: [f64; 2]) -> [f64; 2] {
        self.fixed_for_frame(tags::PIXEL_SPACING, frame)
            .unwrap_or(default)
    }

    /// Image Position (Patient) of the frame's first pixel, in mm (LPS).
    pub fn image_position(&self, frame: usize, default: [f64; 3]) -> [f64; 3] {
        self.fixed_for_frame(tags::IMAGE_POSITION_PATIENT, frame)
            .unwrap_or(default)
    }

    /// Image Orientation (Patient) row and column direction cosines.
    pub fn image_orientation(&self, frame: usize, default: [f64; 6]) -> [f64; 6] {
        self.fixed_for_frame(tags::IMAGE_ORIENTATION_PATIENT, frame)
            .unwrap_or(default)
    }

    pub fn slice_thickness(&self, frame: usize, default: f64) -> f64 {
        self.number_for_frame(tags::SLICE_THICKNESS, frame)
            .unwrap_or(default)
    }

    pub fn instance_number(&self, default: i64) -> i64 {
        self.find_for_frame(tags::INSTANCE_NUMBER, 0)
            .and_then(Element::to_i64)
            .unwrap_or(default)
    }
}

fn find_in_group_item(item: &Dataset, tag: Tag) -> Option<&Element> {
    if let Some(element) = item.get(tag) {
        return Some(element);
    }
    item.iter()
        .filter_map(Element::items)
        .filter_map(|macro_items| macro_items.first())
        .find_map(|macro_item| macro_item.get(tag))
}
