use alloc::boxed::Box;
use alloc::string::String;
use enough::StopReason;

use crate::pixel::{ChannelLayout, ImageFormat, TextureSourceFormat};

/// Errors from format detection, codec decoding and normalization.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("unrecognized format magic bytes")]
    UnrecognizedFormat,

    #[error("invalid decode request: {0}")]
    InvalidRequest(&'static str),

    #[error("no decoder available for {0:?}")]
    UnsupportedFormat(ImageFormat),

    #[error("{format:?} bit depth {depth} is not supported")]
    UnsupportedBitDepth { format: ImageFormat, depth: u16 },

    #[error("{format:?} compression mode {mode} is not supported")]
    UnsupportedCompression { format: ImageFormat, mode: u32 },

    #[error("{format:?} with {planes} plane(s) of {bits} bits is not supported")]
    UnsupportedPlaneLayout {
        format: ImageFormat,
        planes: u16,
        bits: u16,
    },

    #[error("truncated {format:?} input: need {required} bytes, got {actual}")]
    TruncatedInput {
        format: ImageFormat,
        required: usize,
        actual: usize,
    },

    #[error("malformed {format:?} header: {reason}")]
    MalformedHeader { format: ImageFormat, reason: String },

    #[error("no canonical texture format for {layout:?} at {depth} bits per channel")]
    UnmappedTextureFormat { layout: ChannelLayout, depth: u8 },

    #[error("{container:?} sub-image failed to decode: {source}")]
    SubDecoderFailed {
        container: ImageFormat,
        source: Box<DecodeError>,
    },

    #[error("{container:?} contains no 32-bit sub-image")]
    NoMatchingSubImage { container: ImageFormat },

    #[error("{format:?} decoder failed: {reason}")]
    External { format: ImageFormat, reason: String },

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("pixel type expects {expected:?}, image is {actual:?}")]
    LayoutMismatch {
        expected: TextureSourceFormat,
        actual: TextureSourceFormat,
    },

    #[error("decoder produced {actual} bytes, expected {expected}")]
    OutputSizeMismatch { expected: usize, actual: usize },

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for DecodeError {
    fn from(r: StopReason) -> Self {
        DecodeError::Cancelled(r)
    }
}

impl DecodeError {
    pub(crate) fn malformed(format: ImageFormat, reason: impl Into<String>) -> Self {
        DecodeError::MalformedHeader {
            format,
            reason: reason.into(),
        }
    }

    pub(crate) fn truncated(format: ImageFormat, required: usize, actual: usize) -> Self {
        DecodeError::TruncatedInput {
            format,
            required,
            actual,
        }
    }
}

/// Non-fatal conditions noticed while decoding.
///
/// Attached to [`crate::DecodedImage`] and also emitted through the `log` facade.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeWarning {
    /// A V4/V5 BMP declares a color space other than sRGB; pixels are
    /// passed through as if they were sRGB.
    NonSrgbColorSpace { cs_type: u32 },
    /// A 32-bit ICO directory entry could be parsed neither as PNG nor as BMP
    /// and was passed over during sub-image selection.
    IcoEntryRejected { index: u16 },
}
