//! TGA header parsing and raw/RLE pixel decoding.

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::error::DecodeError;
use crate::pixel::ImageFormat;
use crate::reader::{ByteReader, Cursor};

const FORMAT: ImageFormat = ImageFormat::Tga;

pub(crate) const HEADER_SIZE: usize = 18;

const FLIP_X: u8 = 0x10;
const FLIP_Y: u8 = 0x20;
const MAX_PACKET: usize = 128;

/// Pixel storage selected by `(color_map_type, image_type, bits_per_pixel)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TgaKind {
    /// Grayscale (type 3) or paletted indices used as alpha (type 1).
    /// Stored one byte per pixel, palette ignored.
    Gray8 { paletted: bool },
    /// Uncompressed true color (type 2) at 16, 24 or 32 bpp.
    Raw { bpp: u8 },
    /// Run-length true color (type 10) at 16, 24 or 32 bpp.
    Rle { bpp: u8 },
}

impl TgaKind {
    /// Bytes per pixel in the decoded buffer.
    pub(crate) fn output_bpp(self) -> usize {
        match self {
            TgaKind::Gray8 { .. } => 1,
            _ => 4,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct TgaHeader {
    pub width: u32,
    pub height: u32,
    pub kind: TgaKind,
    pub flip_x: bool,
    pub flip_y: bool,
    pixel_offset: usize,
}

pub(crate) fn parse_header(data: &[u8]) -> Result<TgaHeader, DecodeError> {
    let r = ByteReader::new(data, FORMAT);
    r.require(HEADER_SIZE)?;

    let id_length = r.u8_at(0)?;
    let color_map_type = r.u8_at(1)?;
    let image_type = r.u8_at(2)?;
    let color_map_length = r.u16_at(5)?;
    let color_map_entry_size = r.u8_at(7)?;
    let width = r.u16_at(12)?;
    let height = r.u16_at(14)?;
    let bpp = r.u8_at(16)?;
    let descriptor = r.u8_at(17)?;

    let kind = match (color_map_type, image_type) {
        (0, 2) => TgaKind::Raw { bpp },
        (0, 10) => TgaKind::Rle { bpp },
        (0, 3) => TgaKind::Gray8 { paletted: false },
        (1, 1) => TgaKind::Gray8 { paletted: true },
        _ => {
            return Err(DecodeError::UnsupportedCompression {
                format: FORMAT,
                mode: u32::from(image_type),
            });
        }
    };
    let depth_ok = match kind {
        TgaKind::Gray8 { .. } => bpp == 8,
        TgaKind::Raw { .. } | TgaKind::Rle { .. } => matches!(bpp, 16 | 24 | 32),
    };
    if !depth_ok {
        return Err(DecodeError::UnsupportedBitDepth {
            format: FORMAT,
            depth: u16::from(bpp),
        });
    }
    if width == 0 || height == 0 {
        return Err(DecodeError::malformed(
            FORMAT,
            alloc::format!("zero dimension {width}x{height}"),
        ));
    }

    let color_map_bytes =
        (usize::from(color_map_entry_size) + 4) / 8 * usize::from(color_map_length);
    let pixel_offset = HEADER_SIZE + usize::from(id_length) + color_map_bytes;

    let too_large = || DecodeError::DimensionsTooLarge {
        width: u32::from(width),
        height: u32::from(height),
    };
    let pixels = usize::from(width)
        .checked_mul(usize::from(height))
        .ok_or_else(too_large)?;

    // Raw data must be complete. An RLE packet of 1 + bpp/8 bytes yields at
    // most 128 pixels, which bounds how short the stream may be.
    let stream_len = match kind {
        TgaKind::Rle { bpp } => pixels
            .div_ceil(MAX_PACKET)
            .checked_mul(1 + usize::from(bpp / 8)),
        TgaKind::Raw { bpp } => pixels.checked_mul(usize::from(bpp / 8)),
        TgaKind::Gray8 { .. } => Some(pixels),
    };
    let required = stream_len
        .and_then(|n| n.checked_add(pixel_offset))
        .ok_or_else(too_large)?;
    r.require(required)?;

    Ok(TgaHeader {
        width: u32::from(width),
        height: u32::from(height),
        kind,
        flip_x: descriptor & FLIP_X != 0,
        flip_y: descriptor & FLIP_Y != 0,
        pixel_offset,
    })
}

/// Decode to `G8` or `BGRA8`, then apply the header's flip flags.
///
/// Source row 0 lands in the last output row for every variant.
pub(crate) fn decode_pixels(
    data: &[u8],
    header: &TgaHeader,
    stop: &dyn Stop,
) -> Result<Vec<u8>, DecodeError> {
    let w = header.width as usize;
    let h = header.height as usize;
    let out_bpp = header.kind.output_bpp();
    let too_large = || DecodeError::DimensionsTooLarge {
        width: header.width,
        height: header.height,
    };
    let row_len = w.checked_mul(out_bpp).ok_or_else(too_large)?;
    let mut out = vec![0u8; row_len.checked_mul(h).ok_or_else(too_large)?];

    let r = ByteReader::new(data, FORMAT);
    match header.kind {
        TgaKind::Gray8 { paletted } => {
            if paletted {
                log::debug!("TGA color map skipped; indices stored as G8");
            }
            for src_y in 0..h {
                if src_y % 16 == 0 {
                    stop.check()?;
                }
                let src = r.bytes_at(header.pixel_offset + src_y * w, w)?;
                let dst_y = h - 1 - src_y;
                out[dst_y * row_len..][..row_len].copy_from_slice(src);
            }
        }
        TgaKind::Raw { bpp: 32 } => {
            for src_y in 0..h {
                if src_y % 16 == 0 {
                    stop.check()?;
                }
                let src = r.bytes_at(header.pixel_offset + src_y * row_len, row_len)?;
                let dst_y = h - 1 - src_y;
                out[dst_y * row_len..][..row_len].copy_from_slice(src);
            }
        }
        TgaKind::Raw { bpp } => {
            let mut cursor = r.cursor_at(header.pixel_offset);
            for src_y in 0..h {
                if src_y % 16 == 0 {
                    stop.check()?;
                }
                let dst_y = h - 1 - src_y;
                for px in out[dst_y * row_len..][..row_len].chunks_exact_mut(4) {
                    px.copy_from_slice(&read_pixel(&mut cursor, bpp)?);
                }
            }
        }
        TgaKind::Rle { bpp } => {
            let mut rle = RleDecoder::new(r.cursor_at(header.pixel_offset), bpp);
            for src_y in 0..h {
                if src_y % 16 == 0 {
                    stop.check()?;
                }
                let dst_y = h - 1 - src_y;
                for px in out[dst_y * row_len..][..row_len].chunks_exact_mut(4) {
                    px.copy_from_slice(&rle.next_pixel()?);
                }
            }
        }
    }

    if header.flip_x {
        flip_horizontal(&mut out, w, out_bpp);
    }
    if header.flip_y {
        flip_vertical(&mut out, w, h, out_bpp);
    }
    Ok(out)
}

/// Read one 16/24/32-bit TGA pixel as BGRA8.
///
/// 16-bit pixels are A1R5G5B5; each 5-bit field is shifted left by three
/// without replicating the high bits, and the attribute bit becomes 0x80.
fn read_pixel(cursor: &mut Cursor<'_>, bpp: u8) -> Result<[u8; 4], DecodeError> {
    match bpp {
        32 => {
            let s = cursor.read_slice(4)?;
            Ok([s[0], s[1], s[2], s[3]])
        }
        24 => {
            let s = cursor.read_slice(3)?;
            Ok([s[0], s[1], s[2], 255])
        }
        _ => {
            let s = cursor.read_slice(2)?;
            Ok(expand_a1r5g5b5(u16::from_le_bytes([s[0], s[1]])))
        }
    }
}

#[inline]
pub(crate) fn expand_a1r5g5b5(v: u16) -> [u8; 4] {
    [
        ((v & 0x1F) << 3) as u8,
        (((v >> 5) & 0x1F) << 3) as u8,
        (((v >> 10) & 0x1F) << 3) as u8,
        if v & 0x8000 != 0 { 0x80 } else { 0 },
    ]
}

/// TGA packet decoder. Packets may span scanlines; a packet that runs past
/// the last pixel is simply not drained.
struct RleDecoder<'a> {
    cursor: Cursor<'a>,
    bpp: u8,
    /// Pixels left in the current packet.
    remaining: usize,
    /// Current packet repeats `pixel`; otherwise every pixel is read.
    repeat: bool,
    pixel: [u8; 4],
}

impl<'a> RleDecoder<'a> {
    fn new(cursor: Cursor<'a>, bpp: u8) -> Self {
        Self {
            cursor,
            bpp,
            remaining: 0,
            repeat: false,
            pixel: [0; 4],
        }
    }

    fn next_pixel(&mut self) -> Result<[u8; 4], DecodeError> {
        if self.remaining == 0 {
            let packet = self.cursor.read_u8()?;
            self.remaining = usize::from(packet & 0x7F) + 1;
            self.repeat = packet & 0x80 != 0;
            if self.repeat {
                self.pixel = read_pixel(&mut self.cursor, self.bpp)?;
            }
        }
        if !self.repeat {
            self.pixel = read_pixel(&mut self.cursor, self.bpp)?;
        }
        self.remaining -= 1;
        Ok(self.pixel)
    }
}

/// Mirror every row in place.
pub(crate) fn flip_horizontal(buf: &mut [u8], width: usize, bpp: usize) {
    for row in buf.chunks_exact_mut(width * bpp) {
        for x in 0..width / 2 {
            let (left, right) = row.split_at_mut((width - 1 - x) * bpp);
            left[x * bpp..][..bpp].swap_with_slice(&mut right[..bpp]);
        }
    }
}

/// Reverse the row order in place.
pub(crate) fn flip_vertical(buf: &mut [u8], width: usize, height: usize, bpp: usize) {
    let row_len = width * bpp;
    for y in 0..height / 2 {
        let (top, bottom) = buf.split_at_mut((height - 1 - y) * row_len);
        top[y * row_len..][..row_len].swap_with_slice(&mut bottom[..row_len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enough::Unstoppable;

    fn header(color_map_type: u8, image_type: u8, w: u16, h: u16, bpp: u8, desc: u8) -> Vec<u8> {
        let mut v = vec![0u8; HEADER_SIZE];
        v[1] = color_map_type;
        v[2] = image_type;
        v[12..14].copy_from_slice(&w.to_le_bytes());
        v[14..16].copy_from_slice(&h.to_le_bytes());
        v[16] = bpp;
        v[17] = desc;
        v
    }

    fn decode(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
        let h = parse_header(data)?;
        decode_pixels(data, &h, &Unstoppable)
    }

    #[test]
    fn raw_32bit_reverses_rows() {
        let mut data = header(0, 2, 2, 2, 32, 0);
        data.extend_from_slice(&[
            0x00, 0x00, 0xFF, 0xFF, 0x00, 0xFF, 0x00, 0xFF, //
            0xFF, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        ]);
        let out = decode(&data).unwrap();
        assert_eq!(&out[..8], &data[HEADER_SIZE + 8..]);
        assert_eq!(&out[8..], &data[HEADER_SIZE..HEADER_SIZE + 8]);
    }

    #[test]
    fn raw_24bit_adds_opaque_alpha() {
        let mut data = header(0, 2, 1, 1, 24, 0);
        data.extend_from_slice(&[1, 2, 3]);
        assert_eq!(decode(&data).unwrap(), [1, 2, 3, 255]);
    }

    #[test]
    fn a1r5g5b5_shifts_without_replication() {
        assert_eq!(expand_a1r5g5b5(0xFFFF), [0xF8, 0xF8, 0xF8, 0x80]);
        assert_eq!(expand_a1r5g5b5(0x7C00), [0, 0, 0xF8, 0]);
        assert_eq!(expand_a1r5g5b5(0x03E0), [0, 0xF8, 0, 0]);
        assert_eq!(expand_a1r5g5b5(0x8001), [0x08, 0, 0, 0x80]);
    }

    #[test]
    fn id_field_and_color_map_are_skipped() {
        let mut data = header(0, 2, 1, 1, 24, 0);
        data[0] = 3;
        data[5..7].copy_from_slice(&2u16.to_le_bytes());
        data[7] = 24;
        data.extend_from_slice(&[0xAA; 3 + 6]);
        data.extend_from_slice(&[7, 8, 9]);
        assert_eq!(decode(&data).unwrap(), [7, 8, 9, 255]);
    }

    #[test]
    fn rle_packets_span_rows() {
        // 3x2: one run of 4 red, then 2 literal pixels.
        let mut data = header(0, 10, 3, 2, 24, 0);
        data.extend_from_slice(&[0x83, 0, 0, 255]);
        data.extend_from_slice(&[0x01, 1, 1, 1, 2, 2, 2]);
        let out = decode(&data).unwrap();
        let red = [0, 0, 255, 255];
        // Source row 0 (red x3) is the last output row.
        assert_eq!(&out[12..], [red, red, red].concat());
        assert_eq!(&out[..12], [red, [1, 1, 1, 255], [2, 2, 2, 255]].concat());
    }

    #[test]
    fn rle_overlong_final_run_is_clipped() {
        let mut data = header(0, 10, 2, 1, 32, 0);
        data.extend_from_slice(&[0xFF, 1, 2, 3, 4]);
        assert_eq!(decode(&data).unwrap(), [1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn rle_truncated_stream_fails() {
        let mut data = header(0, 10, 4, 1, 16, 0);
        data.extend_from_slice(&[0x81, 0xFF, 0x7F]);
        assert!(matches!(
            decode(&data),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn gray_and_paletted_alpha_are_single_channel() {
        let mut gray = header(0, 3, 2, 2, 8, 0);
        gray.extend_from_slice(&[1, 2, 3, 4]);
        assert_eq!(decode(&gray).unwrap(), [3, 4, 1, 2]);

        let mut pal = header(1, 1, 1, 2, 8, 0);
        pal[5..7].copy_from_slice(&256u16.to_le_bytes());
        pal[7] = 32;
        pal.extend_from_slice(&[0u8; 1024]);
        pal.extend_from_slice(&[10, 20]);
        let h = parse_header(&pal).unwrap();
        assert_eq!(h.kind, TgaKind::Gray8 { paletted: true });
        assert_eq!(decode_pixels(&pal, &h, &Unstoppable).unwrap(), [20, 10]);
    }

    #[test]
    fn unsupported_depth_and_type() {
        let mut data = header(0, 2, 1, 1, 8, 0);
        data.push(0);
        assert!(matches!(
            decode(&data),
            Err(DecodeError::UnsupportedBitDepth { depth: 8, .. })
        ));
        let data = header(0, 10, 1, 1, 15, 0);
        assert!(matches!(
            decode(&data),
            Err(DecodeError::UnsupportedBitDepth { depth: 15, .. })
        ));
        let data = header(1, 9, 1, 1, 8, 0);
        assert!(matches!(
            decode(&data),
            Err(DecodeError::UnsupportedCompression { mode: 9, .. })
        ));
    }

    #[test]
    fn raw_short_data_fails_at_header() {
        let mut data = header(0, 2, 2, 2, 32, 0);
        data.extend_from_slice(&[0; 15]);
        assert!(matches!(
            parse_header(&data),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn rle_stream_too_short_for_dimensions() {
        // 65535x65535 at 32 bpp needs at least 33554432 packets.
        let mut data = header(0, 10, 65535, 65535, 32, 0);
        data.extend_from_slice(&[0xFF, 1, 2, 3, 4]);
        assert!(matches!(
            parse_header(&data),
            Err(DecodeError::TruncatedInput { actual: 23, .. })
        ));

        // 256 pixels: two maximal run packets are exactly enough.
        let mut data = header(0, 10, 16, 16, 24, 0);
        data.extend_from_slice(&[0xFF, 1, 2, 3, 0xFF, 1, 2, 3]);
        assert!(parse_header(&data).is_ok());
        data.truncate(data.len() - 1);
        assert!(matches!(
            parse_header(&data),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn flips_are_involutions() {
        let orig: Vec<u8> = (0..24).collect();
        let mut buf = orig.clone();
        flip_horizontal(&mut buf, 3, 4);
        assert_eq!(&buf[..12], &[8, 9, 10, 11, 4, 5, 6, 7, 0, 1, 2, 3]);
        flip_horizontal(&mut buf, 3, 4);
        assert_eq!(buf, orig);
        flip_vertical(&mut buf, 3, 2, 4);
        assert_eq!(&buf[..12], &orig[12..]);
        flip_vertical(&mut buf, 3, 2, 4);
        assert_eq!(buf, orig);
    }
}
