use thiserror::Error;

/// Errors raised while turning a byte stream into a dataset
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// No "DICM" magic after the preamble and the first tag is not in the dictionary
    #[error("Not a DICOM stream: no DICM magic and first tag ({group:04X},{element:04X}) is unknown")]
    NotDicom { group: u16, element: u16 },

    /// A length field or a fixed-size read runs past the end of the buffer
    #[error("Truncated stream: need {needed} bytes at offset {offset}, only {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Structurally invalid content (bad VR code, stray delimiter, broken sequence)
    #[error("Malformed element at offset {offset}: {message}")]
    Malformed { offset: usize, message: String },
}

/// Errors that can occur when decoding a frame's pixel data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The dataset itself could not be read
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Transfer syntax is recognized by the parser but has no decoder here
    #[error("No decoder for transfer syntax {0}")]
    NoDecoder(String),

    /// JPEG 2000 codestream shape outside what the decoder accepts
    #[error("Unsupported JPEG 2000 codestream: {components} component(s), {tiles} tile(s) (only single-component single-tile is supported)")]
    UnsupportedJpeg2000 { components: u16, tiles: u32 },

    /// Requested frame is outside [0, NumberOfFrames)
    #[error("Frame {index} out of bounds: image has {count} frame(s)")]
    FrameOutOfBounds { index: usize, count: usize },

    /// Required tag is missing from the dataset
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag is present but carries a value the codec cannot work with
    #[error("Invalid value for {tag}: {message}")]
    InvalidAttribute { tag: &'static str, message: String },

    /// The compressed bitstream could not be decoded
    #[error("Decode error: {message}")]
    Decode { message: String },
}

/// Errors raised by volume geometry, caches and plane access
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VolumeError {
    /// Decoding the backing frame failed
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Layer index outside [0, count)
    #[error("Layer {index} out of bounds: cache has {count} layer(s)")]
    LayerOutOfBounds { index: usize, count: usize },

    /// Synchronous access to a layer that has not been decoded
    #[error("Layer {0} is not ready")]
    NotReady(usize),

    /// Thick cache multiplier must be an integer greater than 1
    #[error("Invalid thick-slice multiplier {0}: must be greater than 1")]
    InvalidMultiplier(usize),

    /// Size, spacing or origin cannot describe a volume
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Layers disagree on shape or sample type
    #[error("Layer mismatch: {0}")]
    LayerMismatch(String),

    /// Loading was cancelled before this layer was requested
    #[error("Loading cancelled before layer {0} was requested")]
    Cancelled(usize),

    /// The decode scheduler went away or a worker panicked
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Series assembly was given nothing to assemble
    #[error("No image frames to build a volume from")]
    EmptySeries,
}
