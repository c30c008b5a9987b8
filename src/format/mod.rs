//! Format parsers for DICOM byte streams.
//!
//! # Format Detection
//!
//! Use [`detect::detect_layout`] to classify a buffer before parsing, or
//! [`detect::is_dicom`] as a cheap check. Supported layouts:
//!
//! - **Part 10 files**: 128-byte preamble followed by "DICM"
//! - **Bare streams**: first tag resolvable against the tag dictionary

pub mod detect;
pub mod dicom;

pub use detect::{detect_layout, is_dicom, StreamLayout};
pub use dicom::{parse, Dataset, Element, Tag, TransferSyntax, Value, Vr};
