//! Truevision TGA decoder (internal).
//!
//! Raw and run-length true color at 16, 24 and 32 bpp decode to BGRA8.
//! Grayscale and the 8-bit paletted-alpha variant decode to one byte per
//! pixel; the palette of the latter is skipped and indices pass through.

mod decode;

pub(crate) use decode::{TgaHeader, TgaKind, decode_pixels, parse_header};
