//! Windows ICO container (internal).
//!
//! Picks the widest 32-bit directory entry that parses as PNG or as a
//! header-less half-height DIB. Only the entry's header is read here; pixels
//! are decoded by [`decode_pixels`] through the owning sub-codec.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ops::Range;

use enough::Stop;

use crate::bmp::{self, BmpHeader, BmpOptions};
use crate::detect::detect_format;
use crate::error::{DecodeError, DecodeWarning};
use crate::external::{ExternalDecoder, ExternalInfo};
use crate::pixel::{ChannelLayout, ImageFormat};
use crate::reader::ByteReader;

const FORMAT: ImageFormat = ImageFormat::Ico;

const DIR_HEADER_SIZE: usize = 6;
const DIR_ENTRY_SIZE: usize = 16;
const ICON_TYPE: u16 = 1;

/// Codec owning the selected entry's bytes.
#[derive(Clone, Debug)]
pub(crate) enum SubImage {
    Png(ExternalInfo),
    Bmp(BmpHeader),
}

#[derive(Clone, Debug)]
pub(crate) struct IcoImage {
    /// Directory index of the selected entry.
    pub index: u16,
    pub sub: SubImage,
    pub warnings: Vec<DecodeWarning>,
    range: Range<usize>,
}

impl IcoImage {
    pub(crate) fn dimensions(&self) -> (u32, u32) {
        match &self.sub {
            SubImage::Png(info) => (info.width, info.height),
            SubImage::Bmp(h) => (h.width, h.height),
        }
    }

    /// Format of the embedded image.
    pub(crate) fn sub_format(&self) -> ImageFormat {
        match self.sub {
            SubImage::Png(_) => ImageFormat::Png,
            SubImage::Bmp(_) => ImageFormat::Bmp,
        }
    }

    /// Native layout of the embedded image.
    pub(crate) fn native_layout(&self) -> (ChannelLayout, u8) {
        match &self.sub {
            SubImage::Png(info) => (info.layout, info.bit_depth),
            SubImage::Bmp(_) => (ChannelLayout::Bgra, 8),
        }
    }
}

struct Candidate {
    index: u16,
    width: u32,
    offset: usize,
    size: usize,
}

pub(crate) fn parse(
    data: &[u8],
    external: Option<&dyn ExternalDecoder>,
) -> Result<IcoImage, DecodeError> {
    let r = ByteReader::new(data, FORMAT);
    r.require(DIR_HEADER_SIZE)?;
    let reserved = r.u16_at(0)?;
    let kind = r.u16_at(2)?;
    if reserved != 0 || kind != ICON_TYPE {
        return Err(DecodeError::malformed(
            FORMAT,
            alloc::format!("directory reserved={reserved} type={kind}"),
        ));
    }
    let count = r.u16_at(4)?;
    r.require(DIR_HEADER_SIZE + usize::from(count) * DIR_ENTRY_SIZE)?;

    let mut candidates = Vec::new();
    for index in 0..count {
        let at = DIR_HEADER_SIZE + usize::from(index) * DIR_ENTRY_SIZE;
        if r.u16_at(at + 6)? != 32 {
            continue;
        }
        let width = match r.u8_at(at)? {
            0 => 256,
            w => u32::from(w),
        };
        candidates.push(Candidate {
            index,
            width,
            size: r.u32_at(at + 8)? as usize,
            offset: r.u32_at(at + 12)? as usize,
        });
    }
    if candidates.is_empty() {
        return Err(DecodeError::NoMatchingSubImage { container: FORMAT });
    }
    // Stable: equal widths keep directory order.
    candidates.sort_by(|a, b| b.width.cmp(&a.width));

    let mut warnings = Vec::new();
    let mut last_error = None;
    for c in &candidates {
        let parsed = r
            .bytes_at(c.offset, c.size)
            .and_then(|bytes| parse_entry(bytes, external));
        match parsed {
            Ok(sub) => {
                if let SubImage::Bmp(h) = &sub {
                    warnings.extend(h.warnings.iter().cloned());
                }
                return Ok(IcoImage {
                    index: c.index,
                    sub,
                    warnings,
                    range: c.offset..c.offset + c.size,
                });
            }
            Err(e) => {
                log::warn!("ICO entry {} ({}px) rejected: {e}", c.index, c.width);
                warnings.push(DecodeWarning::IcoEntryRejected { index: c.index });
                last_error = Some(e);
            }
        }
    }

    let source = last_error.unwrap_or(DecodeError::NoMatchingSubImage { container: FORMAT });
    Err(DecodeError::SubDecoderFailed {
        container: FORMAT,
        source: Box::new(source),
    })
}

/// PNG first, then a header-less half-height DIB.
fn parse_entry(
    bytes: &[u8],
    external: Option<&dyn ExternalDecoder>,
) -> Result<SubImage, DecodeError> {
    let png_error = match external {
        Some(ext) if ext.supports(ImageFormat::Png) => match ext.probe(ImageFormat::Png, bytes) {
            Ok(info) => return Ok(SubImage::Png(info)),
            Err(e) => Some(e),
        },
        _ => None,
    };
    match bmp::parse_header(bytes, BmpOptions::ICON) {
        Ok(header) => Ok(SubImage::Bmp(header)),
        // A PNG payload says more about the failure than the DIB attempt.
        Err(_) if detect_format(bytes) == ImageFormat::Png => {
            Err(png_error.unwrap_or(DecodeError::UnsupportedFormat(ImageFormat::Png)))
        }
        Err(bmp_error) => Err(bmp_error),
    }
}

/// Decode the selected entry. Failures are wrapped in `SubDecoderFailed`.
pub(crate) fn decode_pixels(
    data: &[u8],
    image: &IcoImage,
    external: Option<&dyn ExternalDecoder>,
    target: (ChannelLayout, u8),
    stop: &dyn Stop,
) -> Result<Vec<u8>, DecodeError> {
    let bytes = ByteReader::new(data, FORMAT).bytes_at(image.range.start, image.range.len())?;
    log::debug!("ICO entry {} as {:?}", image.index, image.sub_format());
    let result = match &image.sub {
        SubImage::Bmp(header) => bmp::decode_pixels(bytes, header, stop),
        SubImage::Png(_) => match external {
            Some(ext) => ext.decode(ImageFormat::Png, bytes, target.0, target.1),
            None => Err(DecodeError::UnsupportedFormat(ImageFormat::Png)),
        },
    };
    result.map_err(|e| match e {
        DecodeError::Cancelled(reason) => DecodeError::Cancelled(reason),
        other => DecodeError::SubDecoderFailed {
            container: FORMAT,
            source: Box::new(other),
        },
    })
}
