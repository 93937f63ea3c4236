//! ZSoft PCX decoder (internal).
//!
//! Supports 8-bit single-plane files with a trailing VGA palette and
//! 24-bit files stored as three 8-bit planes. Both decode to BGRA8.

mod decode;

pub(crate) use decode::{PcxHeader, decode_pixels, parse_header};
