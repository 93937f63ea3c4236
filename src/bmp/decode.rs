//! BMP header parsing and pixel decoding.
//!
//! Handles BITMAPINFOHEADER through BITMAPV5HEADER with 8-bit palette,
//! 24-bit BGR and 32-bit BGRX or bitfield pixels. RLE and embedded
//! JPEG/PNG compression are rejected at header time.

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use super::utils::{BitfieldMasks, build_palette};
use crate::bits::align_up;
use crate::error::{DecodeError, DecodeWarning};
use crate::pixel::ImageFormat;
use crate::reader::ByteReader;

const FORMAT: ImageFormat = ImageFormat::Bmp;

pub(crate) const FILE_HEADER_SIZE: usize = 14;
pub(crate) const INFO_HEADER_SIZE: usize = 40;

const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;

const LCS_SRGB: u32 = 0x7352_4742;
const LCS_WINDOWS_COLOR_SPACE: u32 = 0x5769_6E20;

/// Info header version, derived from the declared header size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum HeaderVersion {
    /// BITMAPINFOHEADER (40 bytes).
    V1,
    /// BITMAPV2INFOHEADER (52 bytes): RGB masks in the header.
    V2,
    /// BITMAPV3INFOHEADER (56 bytes): alpha mask in the header.
    V3,
    /// BITMAPV4HEADER (108 bytes): color space.
    V4,
    /// BITMAPV5HEADER (124 bytes): ICC profile.
    V5,
}

impl HeaderVersion {
    fn from_info_size(size: u32) -> Option<Self> {
        match size {
            0..=39 => None,
            40..=51 => Some(Self::V1),
            52..=55 => Some(Self::V2),
            56..=107 => Some(Self::V3),
            108..=123 => Some(Self::V4),
            _ => Some(Self::V5),
        }
    }
}

/// How one scanline's bytes map to BGRA pixels.
#[derive(Clone, Debug)]
pub(crate) enum PixelEncoding {
    Indexed { palette: [[u8; 4]; 256] },
    Bgr24,
    Bgrx32,
    Bitfields32 { masks: BitfieldMasks },
}

/// Where the info header lives and whether the height is doubled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct BmpOptions {
    /// No 14-byte file header; the info header starts at offset 0.
    pub headerless: bool,
    /// Declared height covers the XOR and AND masks of an icon.
    pub half_height: bool,
}

impl BmpOptions {
    pub(crate) const ICON: BmpOptions = BmpOptions {
        headerless: true,
        half_height: true,
    };
}

/// Parsed BMP header.
#[derive(Clone, Debug)]
pub(crate) struct BmpHeader {
    pub width: u32,
    pub height: u32,
    pub version: HeaderVersion,
    pub top_down: bool,
    pub encoding: PixelEncoding,
    pub warnings: Vec<DecodeWarning>,
    pixel_offset: usize,
    stride: usize,
    row_bytes: usize,
}

/// Parse and validate the file and info headers.
///
/// Checks that the pixel array for the declared dimensions lies entirely
/// inside `data`, so [`decode_pixels`] never meets a short buffer.
pub(crate) fn parse_header(data: &[u8], options: BmpOptions) -> Result<BmpHeader, DecodeError> {
    let r = ByteReader::new(data, FORMAT);

    let info = if options.headerless {
        r.require(INFO_HEADER_SIZE)?;
        0
    } else {
        r.require(FILE_HEADER_SIZE + INFO_HEADER_SIZE)?;
        if r.bytes_at(0, 2)? != b"BM" {
            return Err(DecodeError::malformed(FORMAT, "missing BM signature"));
        }
        FILE_HEADER_SIZE
    };

    let info_size = r.u32_at(info)?;
    let version = HeaderVersion::from_info_size(info_size).ok_or_else(|| {
        DecodeError::malformed(FORMAT, alloc::format!("unsupported info header size {info_size}"))
    })?;
    r.require(info + info_size as usize)?;

    let raw_width = r.i32_at(info + 4)?;
    let raw_height = r.i32_at(info + 8)?;
    let planes = r.u16_at(info + 12)?;
    let bit_count = r.u16_at(info + 14)?;
    let compression = r.u32_at(info + 16)?;
    let colors_used = r.u32_at(info + 32)?;

    if compression != BI_RGB && compression != BI_BITFIELDS {
        return Err(DecodeError::UnsupportedCompression {
            format: FORMAT,
            mode: compression,
        });
    }
    if planes != 1 {
        return Err(DecodeError::UnsupportedPlaneLayout {
            format: FORMAT,
            planes,
            bits: bit_count,
        });
    }
    if !matches!(bit_count, 8 | 24 | 32) {
        return Err(DecodeError::UnsupportedBitDepth {
            format: FORMAT,
            depth: bit_count,
        });
    }
    if raw_width <= 0 {
        return Err(DecodeError::malformed(
            FORMAT,
            alloc::format!("width {raw_width} is not positive"),
        ));
    }

    let width = raw_width as u32;
    let top_down = raw_height < 0;
    let mut height = raw_height.unsigned_abs();
    if options.half_height {
        height /= 2;
    }
    if height == 0 {
        return Err(DecodeError::malformed(FORMAT, "height is zero"));
    }

    let mut warnings = Vec::new();
    if version >= HeaderVersion::V4 {
        let cs_type = r.u32_at(info + 56)?;
        if cs_type != LCS_SRGB && cs_type != LCS_WINDOWS_COLOR_SPACE {
            log::warn!(
                "BMP declares color space {cs_type:#010x}; decoding as sRGB without conversion"
            );
            warnings.push(DecodeWarning::NonSrgbColorSpace { cs_type });
        }
    }

    let palette_offset = info + info_size as usize;
    let mut trailing_tables = 0usize;

    let encoding = match bit_count {
        8 => {
            let count = if colors_used == 0 { 256 } else { colors_used };
            if count > 256 {
                return Err(DecodeError::malformed(
                    FORMAT,
                    alloc::format!("palette of {count} entries exceeds 256"),
                ));
            }
            let quads = r.bytes_at(palette_offset, count as usize * 4)?;
            trailing_tables = quads.len();
            PixelEncoding::Indexed {
                palette: build_palette(quads),
            }
        }
        24 => PixelEncoding::Bgr24,
        _ if compression == BI_RGB => PixelEncoding::Bgrx32,
        _ => {
            // RGB masks follow the 40-byte header: inside it for V2+,
            // as a separate table for V1.
            let rgb = [
                r.u32_at(info + 40)?,
                r.u32_at(info + 44)?,
                r.u32_at(info + 48)?,
            ];
            if version == HeaderVersion::V1 {
                trailing_tables = 12;
            }
            let alpha = if version >= HeaderVersion::V3 {
                r.u32_at(info + 52)?
            } else {
                0
            };
            let masks = BitfieldMasks::new(
                [rgb[0], rgb[1], rgb[2], alpha],
                version >= HeaderVersion::V4,
            );
            if masks.is_plain_bgrx() && version < HeaderVersion::V4 {
                PixelEncoding::Bgrx32
            } else {
                PixelEncoding::Bitfields32 { masks }
            }
        }
    };

    let pixel_offset = if options.headerless {
        palette_offset + trailing_tables
    } else {
        r.u32_at(10)? as usize
    };

    let too_large = || DecodeError::DimensionsTooLarge { width, height };
    let row_bytes = (width as usize)
        .checked_mul(usize::from(bit_count / 8))
        .ok_or_else(too_large)?;
    let stride = if bit_count == 32 {
        row_bytes
    } else {
        align_up(row_bytes, 4)
    };
    let end = stride
        .checked_mul(height as usize - 1)
        .and_then(|b| b.checked_add(row_bytes))
        .and_then(|b| b.checked_add(pixel_offset))
        .ok_or_else(too_large)?;
    r.require(end)?;

    Ok(BmpHeader {
        width,
        height,
        version,
        top_down,
        encoding,
        warnings,
        pixel_offset,
        stride,
        row_bytes,
    })
}

/// Decode the pixel array into top-down BGRA8.
pub(crate) fn decode_pixels(
    data: &[u8],
    header: &BmpHeader,
    stop: &dyn Stop,
) -> Result<Vec<u8>, DecodeError> {
    let w = header.width as usize;
    let h = header.height as usize;
    let out_len = w
        .checked_mul(h)
        .and_then(|p| p.checked_mul(4))
        .ok_or(DecodeError::DimensionsTooLarge {
            width: header.width,
            height: header.height,
        })?;

    log::debug!(
        "BMP {:?} {}x{} {}",
        header.version,
        header.width,
        header.height,
        if header.top_down { "top-down" } else { "bottom-up" }
    );
    let r = ByteReader::new(data, FORMAT);
    let mut out = vec![0u8; out_len];

    for (y, out_row) in out.chunks_exact_mut(w * 4).enumerate() {
        if y % 16 == 0 {
            stop.check()?;
        }
        let src_y = if header.top_down { y } else { h - 1 - y };
        let row = r.bytes_at(header.pixel_offset + src_y * header.stride, header.row_bytes)?;

        match &header.encoding {
            PixelEncoding::Indexed { palette } => {
                for (px, &idx) in out_row.chunks_exact_mut(4).zip(row) {
                    px.copy_from_slice(&palette[usize::from(idx)]);
                }
            }
            PixelEncoding::Bgr24 => {
                for (px, src) in out_row.chunks_exact_mut(4).zip(row.chunks_exact(3)) {
                    px[..3].copy_from_slice(src);
                    px[3] = 255;
                }
            }
            PixelEncoding::Bgrx32 => {
                // The fourth byte is unused in plain 32-bit images.
                for (px, src) in out_row.chunks_exact_mut(4).zip(row.chunks_exact(4)) {
                    px[..3].copy_from_slice(&src[..3]);
                    px[3] = 255;
                }
            }
            PixelEncoding::Bitfields32 { masks } => {
                for (px, src) in out_row.chunks_exact_mut(4).zip(row.chunks_exact(4)) {
                    let word = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
                    masks.write_bgra(word, px);
                }
            }
        }
    }

    Ok(out)
}
