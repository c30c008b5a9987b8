//! Element walker turning a byte stream into a [`Dataset`].
//!
//! # Element Encoding
//!
//! ## Explicit VR
//! ```text
//! Bytes 0-3: Tag (group, element)
//! Bytes 4-5: VR code
//! Short VRs:  Bytes 6-7   value length (u16)
//! Long VRs:   Bytes 6-7   reserved, Bytes 8-11 value length (u32)
//! ```
//!
//! ## Implicit VR
//! ```text
//! Bytes 0-3: Tag (group, element)
//! Bytes 4-7: value length (u32), VR comes from the dictionary
//! ```
//!
//! Item and delimitation tags (FFFE,xxxx) never carry a VR in either
//! encoding. The file meta group is always explicit VR little endian.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::FormatError;
use crate::format::detect::{detect_layout, StreamLayout};
use crate::io::{ByteOrder, ByteReader};

use super::dataset::{Dataset, Element, Fragments, UNDEFINED_LENGTH};
use super::dictionary;
use super::syntax::{
    TransferSyntax, EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN,
};
use super::tags::{tags, Tag, Vr};
use super::values::{decode_value, Charset, Value};

// =============================================================================
// Encoding
// =============================================================================

/// How element headers and values are laid out in a stretch of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Encoding {
    explicit_vr: bool,
    order: ByteOrder,
}

impl Encoding {
    const EXPLICIT_LE: Encoding = Encoding {
        explicit_vr: true,
        order: ByteOrder::LittleEndian,
    };

    const IMPLICIT_LE: Encoding = Encoding {
        explicit_vr: false,
        order: ByteOrder::LittleEndian,
    };

    fn from_syntax(syntax: TransferSyntax) -> Self {
        Encoding {
            explicit_vr: syntax.is_explicit_vr(),
            order: syntax.byte_order(),
        }
    }
}

/// Decoded element header.
#[derive(Debug, Clone, Copy)]
struct Header {
    tag: Tag,
    vr: Vr,
    length: u32,
    offset: usize,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Parse a complete DICOM stream.
///
/// Accepts Part 10 files, bare streams starting with the meta group and bare
/// datasets. Fails with [`FormatError::NotDicom`] when the buffer is neither,
/// and never returns a partially populated dataset.
pub fn parse(data: impl Into<Bytes>) -> Result<Dataset, FormatError> {
    let data: Bytes = data.into();
    let layout = detect_layout(&data)?;

    let mut reader = ByteReader::new(data, ByteOrder::LittleEndian);
    reader.seek(layout.dataset_start())?;

    let mut parser = Parser {
        reader,
        charset: Charset::Default,
    };
    let mut dataset = Dataset::new();

    let encoding = match layout {
        StreamLayout::Part10 | StreamLayout::BareMeta => {
            parser.read_meta(&mut dataset)?;
            resolve_encoding(&mut dataset)
        }
        StreamLayout::BareDataset { explicit_vr } => {
            let uid = if explicit_vr {
                EXPLICIT_VR_LITTLE_ENDIAN
            } else {
                IMPLICIT_VR_LITTLE_ENDIAN
            };
            dataset.set_inferred_syntax(uid);
            Encoding {
                explicit_vr,
                order: ByteOrder::LittleEndian,
            }
        }
    };

    while parser.reader.remaining() > 0 {
        let element = parser.read_element(encoding)?;
        dataset.insert(element);
    }

    debug!(
        layout = layout.name(),
        elements = dataset.len(),
        transfer_syntax = dataset.transfer_syntax_uid().unwrap_or("?"),
        "Parsed DICOM stream"
    );

    Ok(dataset)
}

/// Pick the encoding of the dataset that follows the meta group.
fn resolve_encoding(dataset: &mut Dataset) -> Encoding {
    let Some(uid) = dataset.transfer_syntax_uid().map(str::to_string) else {
        warn!("No transfer syntax in meta information, assuming implicit VR little endian");
        dataset.set_inferred_syntax(IMPLICIT_VR_LITTLE_ENDIAN);
        return Encoding::IMPLICIT_LE;
    };

    match TransferSyntax::from_uid(&uid) {
        Some(syntax) => Encoding::from_syntax(syntax),
        None => {
            warn!(
                transfer_syntax = uid.as_str(),
                "Unrecognized transfer syntax, parsing as explicit VR little endian"
            );
            Encoding::EXPLICIT_LE
        }
    }
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    reader: ByteReader,
    /// Updated whenever a Specific Character Set element is read
    charset: Charset,
}

impl Parser {
    fn malformed(&self, offset: usize, message: impl Into<String>) -> FormatError {
        FormatError::Malformed {
            offset,
            message: message.into(),
        }
    }

    /// Absolute end offset of a defined-length value starting at the cursor.
    fn value_end(&self, length: u32) -> Result<usize, FormatError> {
        let length = length as usize;
        if length > self.reader.remaining() {
            return Err(FormatError::Truncated {
                offset: self.reader.position(),
                needed: length,
                available: self.reader.remaining(),
            });
        }
        Ok(self.reader.position() + length)
    }

    fn peek_tag(&self, encoding: Encoding) -> Result<Tag, FormatError> {
        let bytes = self.reader.peek(4)?;
        Ok(Tag::new(
            encoding.order.read_u16(&bytes[0..2]),
            encoding.order.read_u16(&bytes[2..4]),
        ))
    }

    // -------------------------------------------------------------------------
    // Meta Information
    // -------------------------------------------------------------------------

    /// Read the group 0002 elements into `dataset`.
    ///
    /// The group ends at the offset given by (0002,0000) when present, and in
    /// any case at the first element of another group.
    fn read_meta(&mut self, dataset: &mut Dataset) -> Result<(), FormatError> {
        let mut meta_end: Option<usize> = None;

        loop {
            if meta_end.is_some_and(|end| self.reader.position() >= end) {
                break;
            }
            if self.reader.remaining() < 4 {
                break;
            }
            if self.peek_tag(Encoding::EXPLICIT_LE)?.group != 0x0002 {
                break;
            }

            let element = self.read_element(Encoding::EXPLICIT_LE)?;
            if element.tag == tags::FILE_META_INFORMATION_GROUP_LENGTH {
                if let Some(length) = element.to_i64() {
                    meta_end = Some(self.reader.position() + length as usize);
                }
            }
            dataset.insert(element);
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Elements
    // -------------------------------------------------------------------------

    fn read_header(&mut self, encoding: Encoding) -> Result<Header, FormatError> {
        self.reader.set_order(encoding.order);
        let offset = self.reader.position();
        let tag = Tag::new(self.reader.read_u16()?, self.reader.read_u16()?);

        if tag.is_item_or_delimiter() {
            let length = self.reader.read_u32()?;
            return Ok(Header {
                tag,
                vr: Vr::UN,
                length,
                offset,
            });
        }

        if !encoding.explicit_vr {
            let length = self.reader.read_u32()?;
            return Ok(Header {
                tag,
                vr: dictionary::vr_of(tag),
                length,
                offset,
            });
        }

        let code = self.reader.peek(2)?;
        let code = [code[0], code[1]];
        let vr = Vr::from_bytes(code).ok_or_else(|| {
            self.malformed(
                offset,
                format!(
                    "invalid VR code {:?} for {}",
                    String::from_utf8_lossy(&code),
                    tag
                ),
            )
        })?;
        self.reader.skip(2)?;

        let length = if vr.has_long_length() {
            self.reader.skip(2)?;
            self.reader.read_u32()?
        } else {
            self.reader.read_u16()? as u32
        };

        Ok(Header {
            tag,
            vr,
            length,
            offset,
        })
    }

    fn read_element(&mut self, encoding: Encoding) -> Result<Element, FormatError> {
        let header = self.read_header(encoding)?;

        if header.tag.is_item_or_delimiter() {
            return Err(self.malformed(
                header.offset,
                format!("unexpected {} outside a sequence", header.tag),
            ));
        }

        let undefined = header.length == UNDEFINED_LENGTH;

        let (vr, value) = match header.vr {
            Vr::SQ => (Vr::SQ, Value::Sequence(self.read_sequence(header, encoding)?)),
            // Undefined-length UN holds an implicit VR little endian sequence
            Vr::UN if undefined => (
                Vr::SQ,
                Value::Sequence(self.read_sequence(header, Encoding::IMPLICIT_LE)?),
            ),
            vr if undefined && header.tag == tags::PIXEL_DATA => {
                (vr, Value::Encapsulated(self.read_fragments(encoding)?))
            }
            vr if undefined => {
                return Err(self.malformed(
                    header.offset,
                    format!("undefined length on {} element {}", vr, header.tag),
                ));
            }
            vr => {
                let bytes = self.reader.take(header.length as usize)?;
                (vr, decode_value(vr, bytes, encoding.order, self.charset))
            }
        };

        if header.tag == tags::SPECIFIC_CHARACTER_SET {
            if let Value::Text(term) = &value {
                self.charset = Charset::from_term(term);
            }
        }

        Ok(Element::new(header.tag, vr, header.length, value))
    }

    // -------------------------------------------------------------------------
    // Sequences
    // -------------------------------------------------------------------------

    fn read_sequence(
        &mut self,
        header: Header,
        encoding: Encoding,
    ) -> Result<Vec<Dataset>, FormatError> {
        let end = if header.length == UNDEFINED_LENGTH {
            None
        } else {
            Some(self.value_end(header.length)?)
        };

        let mut items = Vec::new();
        loop {
            if let Some(end) = end {
                if self.reader.position() >= end {
                    break;
                }
            }

            let item = self.read_header(encoding)?;
            match item.tag {
                tags::ITEM => items.push(self.read_item(item, encoding)?),
                tags::SEQUENCE_DELIMITATION_ITEM => break,
                other => {
                    return Err(self.malformed(
                        item.offset,
                        format!("expected item in sequence {}, found {}", header.tag, other),
                    ));
                }
            }
        }

        if let Some(end) = end {
            if self.reader.position() != end {
                return Err(self.malformed(
                    header.offset,
                    format!("sequence {} overran its declared length", header.tag),
                ));
            }
        }

        Ok(items)
    }

    fn read_item(&mut self, header: Header, encoding: Encoding) -> Result<Dataset, FormatError> {
        let mut item = Dataset::new();

        if header.length == UNDEFINED_LENGTH {
            loop {
                match self.peek_tag(encoding)? {
                    tags::ITEM_DELIMITATION_ITEM => {
                        self.read_header(encoding)?;
                        break;
                    }
                    tags::SEQUENCE_DELIMITATION_ITEM => {
                        return Err(self.malformed(
                            self.reader.position(),
                            "sequence delimiter inside an undefined-length item",
                        ));
                    }
                    _ => {
                        let element = self.read_element(encoding)?;
                        item.insert(element);
                    }
                }
            }
            return Ok(item);
        }

        let end = self.value_end(header.length)?;
        while self.reader.position() < end {
            let element = self.read_element(encoding)?;
            item.insert(element);
        }
        if self.reader.position() != end {
            return Err(self.malformed(header.offset, "item overran its declared length"));
        }

        Ok(item)
    }

    // -------------------------------------------------------------------------
    // Encapsulated Pixel Data
    // -------------------------------------------------------------------------

    /// Read the basic offset table and fragments up to the sequence delimiter.
    fn read_fragments(&mut self, encoding: Encoding) -> Result<Fragments, FormatError> {
        let mut offset_table: Option<Vec<u32>> = None;
        let mut fragments = Vec::new();

        loop {
            let item = self.read_header(encoding)?;
            match item.tag {
                tags::ITEM => {
                    let bytes = self.reader.take(item.length as usize)?;
                    if offset_table.is_none() {
                        if bytes.len() % 4 != 0 {
                            return Err(self.malformed(
                                item.offset,
                                format!("basic offset table length {} is not a multiple of 4", bytes.len()),
                            ));
                        }
                        offset_table = Some(
                            bytes
                                .chunks_exact(4)
                                .map(|c| encoding.order.read_u32(c))
                                .collect(),
                        );
                    } else {
                        fragments.push(bytes);
                    }
                }
                tags::SEQUENCE_DELIMITATION_ITEM => break,
                other => {
                    return Err(self.malformed(
                        item.offset,
                        format!("expected fragment item in pixel data, found {}", other),
                    ));
                }
            }
        }

        Ok(Fragments {
            offset_table: offset_table.unwrap_or_default(),
            fragments,
        })
    }
}
