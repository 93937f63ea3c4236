//! PCX header parsing and RLE plane decoding.

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::error::DecodeError;
use crate::pixel::ImageFormat;
use crate::reader::{ByteReader, Cursor};

const FORMAT: ImageFormat = ImageFormat::Pcx;

pub(crate) const HEADER_SIZE: usize = 128;
pub(crate) const PALETTE_SIZE: usize = 256 * 3;

const MANUFACTURER_ZSOFT: u8 = 10;
const MAX_RUN: usize = 63;

/// Supported plane layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PcxLayout {
    /// One 8-bit index plane plus a trailing 256-entry palette.
    Indexed,
    /// Separate 8-bit R, G and B planes per scanline.
    Rgb,
}

#[derive(Clone, Debug)]
pub(crate) struct PcxHeader {
    pub width: u32,
    pub height: u32,
    pub layout: PcxLayout,
    /// Encoded bytes per plane per scanline, never less than `width`.
    segment_len: usize,
    /// End of the pixel stream; the palette follows for indexed files.
    stream_end: usize,
}

pub(crate) fn parse_header(data: &[u8]) -> Result<PcxHeader, DecodeError> {
    let r = ByteReader::new(data, FORMAT);
    r.require(HEADER_SIZE)?;

    let manufacturer = r.u8_at(0)?;
    if manufacturer != MANUFACTURER_ZSOFT {
        return Err(DecodeError::malformed(
            FORMAT,
            alloc::format!("manufacturer byte {manufacturer}, expected 10"),
        ));
    }
    let bits = r.u8_at(3)?;
    let x_min = r.u16_at(4)?;
    let y_min = r.u16_at(6)?;
    let x_max = r.u16_at(8)?;
    let y_max = r.u16_at(10)?;
    let planes = r.u8_at(65)?;
    let bytes_per_line = r.u16_at(66)?;

    let layout = match (planes, bits) {
        (1, 8) => PcxLayout::Indexed,
        (3, 8) => PcxLayout::Rgb,
        _ => {
            return Err(DecodeError::UnsupportedPlaneLayout {
                format: FORMAT,
                planes: u16::from(planes),
                bits: u16::from(bits),
            });
        }
    };

    if x_max < x_min || y_max < y_min {
        return Err(DecodeError::malformed(
            FORMAT,
            alloc::format!("window ({x_min},{y_min})-({x_max},{y_max}) is inverted"),
        ));
    }
    let width = u32::from(x_max - x_min) + 1;
    let height = u32::from(y_max - y_min) + 1;

    let stream_end = match layout {
        PcxLayout::Indexed => {
            r.require(HEADER_SIZE + PALETTE_SIZE)?;
            data.len() - PALETTE_SIZE
        }
        PcxLayout::Rgb => data.len(),
    };

    // A two-byte run yields at most 63 bytes, so a stream shorter than
    // 2/63 of the decoded planes cannot fill them.
    let segment_len = usize::from(bytes_per_line).max(width as usize);
    let planes = match layout {
        PcxLayout::Indexed => 1,
        PcxLayout::Rgb => 3,
    };
    let encoded = segment_len
        .checked_mul(planes * height as usize)
        .and_then(|n| n.checked_mul(2))
        .ok_or(DecodeError::DimensionsTooLarge { width, height })?;
    let min_stream = encoded.div_ceil(MAX_RUN);
    let available = stream_end.saturating_sub(HEADER_SIZE);
    if available < min_stream {
        return Err(DecodeError::truncated(
            FORMAT,
            data.len() - available + min_stream,
            data.len(),
        ));
    }

    Ok(PcxHeader {
        width,
        height,
        layout,
        segment_len,
        stream_end,
    })
}

/// Decode to top-down BGRA8.
pub(crate) fn decode_pixels(
    data: &[u8],
    header: &PcxHeader,
    stop: &dyn Stop,
) -> Result<Vec<u8>, DecodeError> {
    let w = header.width as usize;
    let h = header.height as usize;
    let row_len = w * 4;
    let stream = ByteReader::new(&data[..header.stream_end], FORMAT);
    let mut rle = RleStream::new(stream.cursor_at(HEADER_SIZE));

    match header.layout {
        PcxLayout::Indexed => {
            let palette = read_palette(&data[header.stream_end..]);
            let mut out = vec![0u8; row_len * h];
            for (y, row) in out.chunks_exact_mut(row_len).enumerate() {
                if y % 16 == 0 {
                    stop.check()?;
                }
                rle.fill_segment(header.segment_len, |x, index| {
                    if x < w {
                        row[x * 4..][..4].copy_from_slice(&palette[usize::from(index)]);
                    }
                })?;
            }
            Ok(out)
        }
        PcxLayout::Rgb => {
            let mut out = vec![0xFFu8; row_len * h];
            for (y, row) in out.chunks_exact_mut(row_len).enumerate() {
                if y % 16 == 0 {
                    stop.check()?;
                }
                // Planes are stored R, G, B; BGRA lanes are 2, 1, 0.
                for lane in [2usize, 1, 0] {
                    rle.fill_segment(header.segment_len, |x, value| {
                        if x < w {
                            row[x * 4 + lane] = value;
                        }
                    })?;
                }
            }
            Ok(out)
        }
    }
}

/// 256-entry BGRA palette from RGB triplets; entry 0 is transparent.
fn read_palette(rgb: &[u8]) -> [[u8; 4]; 256] {
    let mut palette = [[0u8; 4]; 256];
    for (i, (entry, c)) in palette.iter_mut().zip(rgb.chunks_exact(3)).enumerate() {
        *entry = [c[2], c[1], c[0], if i == 0 { 0 } else { 255 }];
    }
    palette
}

/// PCX byte-run decoder.
///
/// A run is cut at the end of a segment and the rest of it (`overflow`) is
/// emitted at the start of the next segment, whether that is the next plane
/// or the next scanline.
pub(crate) struct RleStream<'a> {
    cursor: Cursor<'a>,
    value: u8,
    overflow: usize,
}

impl<'a> RleStream<'a> {
    pub(crate) fn new(cursor: Cursor<'a>) -> Self {
        Self {
            cursor,
            value: 0,
            overflow: 0,
        }
    }

    /// Next `(value, count)` run with `count <= max`, `count >= 1`.
    fn next_run(&mut self, max: usize) -> Result<(u8, usize), DecodeError> {
        while self.overflow == 0 {
            let b = self.cursor.read_u8()?;
            if b & 0xC0 == 0xC0 {
                self.overflow = usize::from(b & 0x3F);
                self.value = self.cursor.read_u8()?;
            } else {
                self.overflow = 1;
                self.value = b;
            }
        }
        let count = self.overflow.min(max);
        self.overflow -= count;
        Ok((self.value, count))
    }

    /// Decode exactly `len` bytes, calling `put(column, value)` for each.
    pub(crate) fn fill_segment(
        &mut self,
        len: usize,
        mut put: impl FnMut(usize, u8),
    ) -> Result<(), DecodeError> {
        let mut x = 0;
        while x < len {
            let (value, count) = self.next_run(len - x)?;
            for col in x..x + count {
                put(col, value);
            }
            x += count;
        }
        Ok(())
    }

    #[cfg(test)]
    fn overflow(&self) -> usize {
        self.overflow
    }
}
