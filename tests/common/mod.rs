//! In-memory builders for the test files. Nothing here reads from disk.

#![allow(dead_code)]

pub fn checkerboard(w: usize, h: usize, bpp: usize) -> Vec<u8> {
    let mut pixels = vec![0u8; w * h * bpp];
    for y in 0..h {
        for x in 0..w {
            let off = (y * w + x) * bpp;
            for c in 0..bpp {
                pixels[off + c] = if (x + y) % 2 == 0 {
                    200 + (c as u8 * 10)
                } else {
                    10 + (c as u8 * 30)
                };
            }
        }
    }
    pixels
}

pub fn noise_pattern(w: usize, h: usize, bpp: usize) -> Vec<u8> {
    let mut pixels = vec![0u8; w * h * bpp];
    let mut state: u32 = 0xDEAD_BEEF;
    for p in pixels.iter_mut() {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        *p = state as u8;
    }
    pixels
}

/// Reverse row order of a packed buffer.
pub fn flip_rows(pixels: &[u8], row_len: usize) -> Vec<u8> {
    pixels
        .chunks_exact(row_len)
        .rev()
        .flatten()
        .copied()
        .collect()
}

/// Append an opaque alpha byte to every 3-byte pixel.
pub fn add_alpha(bgr: &[u8]) -> Vec<u8> {
    bgr.chunks_exact(3)
        .flat_map(|p| [p[0], p[1], p[2], 255])
        .collect()
}

// ── BMP ──────────────────────────────────────────────────────────────

/// BMP with a 40-byte info header. `rows` are top-first, unpadded.
pub fn bmp_file(
    w: u32,
    h: u32,
    bit_count: u16,
    top_down: bool,
    palette: &[[u8; 4]],
    rows: &[u8],
) -> Vec<u8> {
    let row_bytes = w as usize * usize::from(bit_count / 8);
    let stride = if bit_count == 32 {
        row_bytes
    } else {
        row_bytes.div_ceil(4) * 4
    };
    let pixel_offset = 14 + 40 + palette.len() * 4;
    let mut v = Vec::new();
    v.extend_from_slice(b"BM");
    v.extend_from_slice(&((pixel_offset + stride * h as usize) as u32).to_le_bytes());
    v.extend_from_slice(&[0; 4]);
    v.extend_from_slice(&(pixel_offset as u32).to_le_bytes());
    v.extend_from_slice(&40u32.to_le_bytes());
    v.extend_from_slice(&(w as i32).to_le_bytes());
    let height = if top_down { -(h as i32) } else { h as i32 };
    v.extend_from_slice(&height.to_le_bytes());
    v.extend_from_slice(&1u16.to_le_bytes());
    v.extend_from_slice(&bit_count.to_le_bytes());
    v.extend_from_slice(&0u32.to_le_bytes());
    v.extend_from_slice(&[0; 12]);
    v.extend_from_slice(&(palette.len() as u32).to_le_bytes());
    v.extend_from_slice(&[0; 4]);
    for entry in palette {
        v.extend_from_slice(entry);
    }
    let file_rows: Vec<&[u8]> = if top_down {
        rows.chunks_exact(row_bytes).collect()
    } else {
        rows.chunks_exact(row_bytes).rev().collect()
    };
    for row in file_rows {
        v.extend_from_slice(row);
        v.resize(v.len() + stride - row_bytes, 0);
    }
    v
}

// ── TGA ──────────────────────────────────────────────────────────────

/// TGA with no id field and no color map. `payload` is stored as given.
pub fn tga_file(image_type: u8, w: u16, h: u16, bpp: u8, descriptor: u8, payload: &[u8]) -> Vec<u8> {
    let mut v = vec![0u8; 18];
    v[2] = image_type;
    v[12..14].copy_from_slice(&w.to_le_bytes());
    v[14..16].copy_from_slice(&h.to_le_bytes());
    v[16] = bpp;
    v[17] = descriptor;
    v.extend_from_slice(payload);
    v
}

/// TGA run-length encode `pixels` of `bpp` bytes each.
pub fn tga_rle(pixels: &[u8], bpp: usize) -> Vec<u8> {
    let px: Vec<&[u8]> = pixels.chunks_exact(bpp).collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < px.len() {
        let mut run = 1;
        while i + run < px.len() && run < 128 && px[i + run] == px[i] {
            run += 1;
        }
        if run > 1 {
            out.push(0x80 | (run - 1) as u8);
            out.extend_from_slice(px[i]);
            i += run;
        } else {
            let start = i;
            i += 1;
            while i < px.len() && i - start < 128 && !(i + 1 < px.len() && px[i + 1] == px[i]) {
                i += 1;
            }
            out.push((i - start - 1) as u8);
            for p in &px[start..i] {
                out.extend_from_slice(p);
            }
        }
    }
    out
}

// ── PCX ──────────────────────────────────────────────────────────────

pub fn pcx_header(planes: u8, w: u16, h: u16, bytes_per_line: u16) -> Vec<u8> {
    let mut v = vec![0u8; 128];
    v[0] = 10;
    v[1] = 5;
    v[2] = 1;
    v[3] = 8;
    v[8..10].copy_from_slice(&(w - 1).to_le_bytes());
    v[10..12].copy_from_slice(&(h - 1).to_le_bytes());
    v[65] = planes;
    v[66..68].copy_from_slice(&bytes_per_line.to_le_bytes());
    v
}

/// PCX run-length encode one segment. Runs never cross the segment end.
pub fn pcx_rle(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let mut run = 1;
        while i + run < bytes.len() && run < 63 && bytes[i + run] == bytes[i] {
            run += 1;
        }
        if run == 1 && bytes[i] < 0xC0 {
            out.push(bytes[i]);
        } else {
            out.push(0xC0 | run as u8);
            out.push(bytes[i]);
        }
        i += run;
    }
    out
}

/// RGB triplets for a 256-entry VGA palette.
pub fn pcx_palette(entries: &[(usize, [u8; 3])]) -> Vec<u8> {
    let mut p = vec![0u8; 768];
    for &(i, rgb) in entries {
        p[i * 3..i * 3 + 3].copy_from_slice(&rgb);
    }
    p
}

// ── ICO ──────────────────────────────────────────────────────────────

/// ICO directory with `(width, bit_count, payload)` entries.
pub fn ico_file(entries: &[(u8, u16, &[u8])]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&0u16.to_le_bytes());
    v.extend_from_slice(&1u16.to_le_bytes());
    v.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    let mut offset = 6 + entries.len() * 16;
    for &(width, bits, payload) in entries {
        v.extend_from_slice(&[width, width, 0, 0]);
        v.extend_from_slice(&1u16.to_le_bytes());
        v.extend_from_slice(&bits.to_le_bytes());
        v.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        v.extend_from_slice(&(offset as u32).to_le_bytes());
        offset += payload.len();
    }
    for &(_, _, payload) in entries {
        v.extend_from_slice(payload);
    }
    v
}

/// Header-less 32-bit DIB as stored in an icon. `bgrx` rows are top-first.
pub fn icon_dib(w: u32, h: u32, bgrx: &[u8]) -> Vec<u8> {
    // Bottom-up, so the XOR rows land first and the mask area after them.
    let rows = [&vec![0u8; bgrx.len()][..], bgrx].concat();
    let bmp = bmp_file(w, h * 2, 32, false, &[], &rows);
    bmp[14..].to_vec()
}
