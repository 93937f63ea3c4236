//! # zentexture
//!
//! Texture source decoding: BMP, TGA, PCX and ICO decoders plus a dispatcher
//! that normalizes every format into one canonical texture layout.
//!
//! ## Supported Formats
//!
//! - **BMP**: 8-bit palette, 24-bit, 32-bit plain and bitfields; info
//!   headers V1 through V5. RLE BMP is rejected.
//! - **TGA**: raw and RLE true color at 16/24/32 bpp, 8-bit grayscale, and
//!   the 8-bit paletted-alpha variant. Header flip bits are honored.
//! - **PCX**: 8-bit single plane with VGA palette, 24-bit as three planes.
//! - **ICO**: the widest 32-bit entry, stored as PNG or as a DIB.
//! - **PNG, JPEG, EXR**: through an [`ExternalDecoder`]; the built-in
//!   [`ImageCrateDecoder`] uses the `image` crate (`png`, `jpeg`, `exr`
//!   features).
//!
//! ## Canonical output
//!
//! | Source                            | [`TextureSourceFormat`] |
//! |-----------------------------------|-------------------------|
//! | BMP, PCX, TGA true color, ICO DIB | `Bgra8`                 |
//! | TGA gray / paletted alpha         | `G8`                    |
//! | PNG/JPEG, 8 bits or fewer         | `Rgba8`                 |
//! | PNG/JPEG, 16 bits                 | `Rgba16`                |
//! | EXR                               | `Rgba16F`               |
//!
//! TGA and PCX carry no magic number; [`detect_format`] never reports them,
//! so they must be requested explicitly.
//!
//! ## Usage
//!
//! ```no_run
//! use zentexture::{DecodeRequest, ImageFormat, Limits, Unstoppable};
//!
//! let data: &[u8] = &[]; // your TGA bytes
//!
//! // Probe without decoding
//! let info = zentexture::probe(ImageFormat::Tga, data)?;
//! println!("{}x{} -> {:?}", info.width, info.height, info.texture_format);
//!
//! // Decode with limits
//! let limits = Limits {
//!     max_pixels: Some(64 * 1024 * 1024),
//!     ..Limits::default()
//! };
//! let image = DecodeRequest::new(data)
//!     .with_format(ImageFormat::Tga)
//!     .with_limits(&limits)
//!     .decode(Unstoppable)?;
//! assert_eq!(image.pixels().len(), image.stride() * image.height as usize);
//! # Ok::<(), zentexture::DecodeError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod bits;
mod bmp;
mod decode;
mod detect;
mod error;
pub mod external;
mod ico;
mod limits;
mod normalize;
mod pcx;
mod pixel;
mod reader;
mod tga;

pub use decode::{DecodeRequest, DecodedImage, ImageInfo, SourceDescriptor};
pub use detect::detect_format;
pub use enough::{Stop, Unstoppable};
pub use error::{DecodeError, DecodeWarning};
#[cfg(feature = "external")]
pub use external::ImageCrateDecoder;
#[cfg(feature = "std")]
pub use external::LibraryGuard;
pub use external::{ExternalDecoder, ExternalInfo};
pub use limits::Limits;
#[cfg(feature = "rgb")]
pub use pixel::TexturePixel;
pub use pixel::{ChannelLayout, ImageFormat, TextureSourceFormat, bytes_per_pixel};

/// Decode `data` as `format`.
pub fn decode(format: ImageFormat, data: &[u8]) -> Result<DecodedImage, DecodeError> {
    DecodeRequest::new(data)
        .with_format(format)
        .decode(Unstoppable)
}

/// Detect the format from magic bytes, then decode.
///
/// Fails with [`DecodeError::UnrecognizedFormat`] for TGA and PCX.
pub fn decode_auto(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    DecodeRequest::new(data).decode(Unstoppable)
}

/// Read dimensions and formats without decoding pixels.
pub fn probe(format: ImageFormat, data: &[u8]) -> Result<ImageInfo, DecodeError> {
    DecodeRequest::new(data).with_format(format).probe()
}
