//! DICOM dataset model and element parser.
//!
//! This module turns one raw DICOM buffer into a [`Dataset`]:
//!
//! - [`tags`] - Value representations, tags and named tag constants
//! - [`dictionary`] - Static tag dictionary (keyword + default VR)
//! - [`syntax`] - Recognized transfer syntaxes
//! - [`values`] - Element value decoding and character sets
//! - [`dataset`] - Dataset and element model with typed accessors
//! - [`parser`] - The element walker
//!
//! Parsing is synchronous and pure: no shared state, safe to run on many
//! buffers concurrently.

pub mod dataset;
pub mod dictionary;
pub mod parser;
pub mod syntax;
pub mod tags;
pub mod values;

pub use dataset::{Dataset, Element, Fragments, UNDEFINED_LENGTH};
pub use parser::parse;
pub use syntax::{trim_uid, TransferSyntax};
pub use tags::{tags as tag, Tag, Vr};
pub use values::{Charset, Value};
