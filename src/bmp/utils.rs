//! BMP palette and bitfield helpers.

use crate::bits::BitfieldChannel;

/// Opaque black, used for palette slots past `biClrUsed`.
pub(crate) const EMPTY_ENTRY: [u8; 4] = [0, 0, 0, 255];

/// Build a 256-entry BGRA palette from BGRX quads, alpha forced to 255.
pub(crate) fn build_palette(quads: &[u8]) -> [[u8; 4]; 256] {
    let mut palette = [EMPTY_ENTRY; 256];
    for (entry, quad) in palette.iter_mut().zip(quads.chunks_exact(4)) {
        *entry = [quad[0], quad[1], quad[2], 255];
    }
    palette
}

/// Decomposed R, G, B, A masks of a 32-bit bitfield image.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BitfieldMasks {
    pub red: BitfieldChannel,
    pub green: BitfieldChannel,
    pub blue: BitfieldChannel,
    pub alpha: BitfieldChannel,
    /// Alpha comes from the mask; otherwise it is forced to 255.
    pub has_alpha: bool,
}

impl BitfieldMasks {
    pub(crate) fn new([r, g, b, a]: [u32; 4], alpha_allowed: bool) -> Self {
        Self {
            red: BitfieldChannel::from_mask(r),
            green: BitfieldChannel::from_mask(g),
            blue: BitfieldChannel::from_mask(b),
            alpha: BitfieldChannel::from_mask(a),
            has_alpha: alpha_allowed && a != 0,
        }
    }

    /// All three color masks are exactly 8 bits wide.
    pub(crate) fn is_rgb8(&self) -> bool {
        self.red.is_8bit() && self.green.is_8bit() && self.blue.is_8bit()
    }

    /// Masks describe the plain B, G, R, X byte order.
    pub(crate) fn is_plain_bgrx(&self) -> bool {
        self.is_rgb8()
            && self.red.mask == 0x00FF_0000
            && self.green.mask == 0x0000_FF00
            && self.blue.mask == 0x0000_00FF
            && !self.has_alpha
    }

    /// Expand one little-endian pixel word into a BGRA pixel.
    #[inline]
    pub(crate) fn write_bgra(&self, word: u32, px: &mut [u8]) {
        px[0] = self.blue.extract(word);
        px[1] = self.green.extract(word);
        px[2] = self.red.extract(word);
        px[3] = if self.has_alpha {
            self.alpha.extract(word)
        } else {
            255
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_promotes_to_opaque_bgra() {
        let quads = [1, 2, 3, 0, 4, 5, 6, 99];
        let pal = build_palette(&quads);
        assert_eq!(pal[0], [1, 2, 3, 255]);
        assert_eq!(pal[1], [4, 5, 6, 255]);
        assert_eq!(pal[2], EMPTY_ENTRY);
        assert_eq!(pal[255], EMPTY_ENTRY);
    }

    #[test]
    fn rgb565_style_masks_rescale() {
        let masks = BitfieldMasks::new([0xF800, 0x07E0, 0x001F, 0], true);
        assert!(!masks.is_rgb8());
        let mut px = [0u8; 4];
        masks.write_bgra(0xFFFF, &mut px);
        assert_eq!(px, [255, 255, 255, 255]);
        masks.write_bgra(0xF800, &mut px);
        assert_eq!(px, [0, 0, 255, 255]);
    }

    #[test]
    fn alpha_mask_only_when_allowed() {
        let word = 0x80FF_0000;
        let mut px = [0u8; 4];
        BitfieldMasks::new([0x00FF_0000, 0xFF00, 0xFF, 0xFF00_0000], true).write_bgra(word, &mut px);
        assert_eq!(px, [0, 0, 255, 0x80]);
        BitfieldMasks::new([0x00FF_0000, 0xFF00, 0xFF, 0xFF00_0000], false).write_bgra(word, &mut px);
        assert_eq!(px, [0, 0, 255, 255]);
    }

    #[test]
    fn plain_bgrx_detection() {
        assert!(BitfieldMasks::new([0x00FF_0000, 0xFF00, 0xFF, 0], false).is_plain_bgrx());
        assert!(!BitfieldMasks::new([0xFF, 0xFF00, 0x00FF_0000, 0], false).is_plain_bgrx());
        assert!(BitfieldMasks::new([0xFF, 0xFF00, 0x00FF_0000, 0], false).is_rgb8());
    }
}
