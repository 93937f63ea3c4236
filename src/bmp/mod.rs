//! Windows BMP decoder (internal).
//!
//! Also parses the header-less, half-height DIBs embedded in ICO files.

mod decode;
mod utils;

pub(crate) use decode::{BmpHeader, BmpOptions, decode_pixels, parse_header};
