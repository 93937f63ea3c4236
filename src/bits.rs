//! Bit-math helpers for bitfield masks and scanline strides.

/// Trailing zero bits of `v`; zero for an empty mask.
#[inline]
pub(crate) fn count_trailing_zeros(v: u32) -> u32 {
    if v == 0 { 0 } else { v.trailing_zeros() }
}

/// Leading zero bits of `v`; 32 for an empty mask.
#[inline]
pub(crate) fn count_leading_zeros(v: u32) -> u32 {
    v.leading_zeros()
}

/// Round `value` up to the next multiple of `alignment` (a power of two).
#[inline]
pub(crate) fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// One color channel of a bitfield pixel word.
///
/// `shift` is the mask's trailing zero count and `width` the span between
/// its lowest and highest set bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BitfieldChannel {
    pub mask: u32,
    pub shift: u32,
    pub width: u32,
}

impl BitfieldChannel {
    pub(crate) fn from_mask(mask: u32) -> Self {
        let shift = count_trailing_zeros(mask);
        let width = 32 - (shift + count_leading_zeros(mask));
        Self { mask, shift, width }
    }

    /// Whether the mask spans exactly 8 bits.
    pub(crate) fn is_8bit(&self) -> bool {
        self.mask != 0 && self.width == 8
    }

    /// Extract this channel from `word` and rescale it to 0..=255.
    ///
    /// Scales by `255 / (2^width - 1)` with round-half-up.
    #[inline]
    pub(crate) fn extract(&self, word: u32) -> u8 {
        if self.width == 0 {
            return 0;
        }
        let value = u64::from((word & self.mask) >> self.shift);
        let max = (1u64 << self.width) - 1;
        ((value * 255 + max / 2) / max).min(255) as u8
    }
}
