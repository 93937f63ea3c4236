//! Magic-number format detection.

use crate::pixel::ImageFormat;

const MAGIC_PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const MAGIC_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
const MAGIC_BMP: &[u8] = b"BM";
const MAGIC_ICO: &[u8] = &[0x00, 0x00, 0x01, 0x00];
const MAGIC_EXR: &[u8] = &[0x76, 0x2F, 0x31, 0x01];

/// Checked in order; first match wins.
const MAGIC_TABLE: &[(&[u8], ImageFormat)] = &[
    (MAGIC_PNG, ImageFormat::Png),
    (MAGIC_JPEG, ImageFormat::Jpeg),
    (MAGIC_BMP, ImageFormat::Bmp),
    (MAGIC_ICO, ImageFormat::Ico),
    (MAGIC_EXR, ImageFormat::Exr),
];

/// Detect the format of `data` from its leading bytes.
///
/// Needs at most 8 bytes. TGA and PCX carry no reliable magic and are never
/// detected; they report [`ImageFormat::Invalid`] and must be requested
/// explicitly.
pub fn detect_format(data: &[u8]) -> ImageFormat {
    MAGIC_TABLE
        .iter()
        .find(|(magic, _)| data.starts_with(magic))
        .map_or(ImageFormat::Invalid, |&(_, format)| format)
}
