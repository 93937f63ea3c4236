/// Source file format, used both as the decode selector and as the
/// detection result.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Portable Network Graphics (external adapter).
    Png,
    /// JPEG (external adapter).
    Jpeg,
    /// Single channel JPEG (external adapter).
    GrayscaleJpeg,
    /// Windows bitmap.
    Bmp,
    /// Windows icon resource.
    Ico,
    /// OpenEXR (external adapter).
    Exr,
    /// ZSoft PCX.
    Pcx,
    /// Truevision TGA.
    Tga,
    /// Unknown or unrecognized.
    Invalid,
}

impl ImageFormat {
    /// Whether this format is decoded by an external library adapter.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Self::Png | Self::Jpeg | Self::GrayscaleJpeg | Self::Exr
        )
    }
}

/// Channel order of a pixel buffer.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// 4 channels, R G B A.
    Rgba,
    /// 4 channels, B G R A.
    Bgra,
    /// Single channel.
    Gray,
    Invalid,
}

impl ChannelLayout {
    /// Number of channels.
    pub fn channels(&self) -> usize {
        match self {
            Self::Rgba | Self::Bgra => 4,
            Self::Gray => 1,
            Self::Invalid => 0,
        }
    }
}

/// Bytes per pixel for a layout at `bit_depth` bits per channel.
pub fn bytes_per_pixel(layout: ChannelLayout, bit_depth: u8) -> usize {
    layout.channels() * usize::from(bit_depth).div_ceil(8)
}

/// Canonical texture formats every decode is normalized into.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureSourceFormat {
    Invalid,
    /// 8-bit single channel.
    G8,
    /// 16-bit single channel (native endian). Not produced by any decoder here.
    G16,
    /// 8-bit B G R A.
    Bgra8,
    /// Shared-exponent BGRE. Not produced by any decoder here.
    Bgre8,
    /// 16-bit integer R G B A (native endian).
    Rgba16,
    /// 16-bit half-float R G B A (native endian).
    Rgba16F,
    /// 8-bit R G B A.
    Rgba8,
    /// Shared-exponent RGBE. Not produced by any decoder here.
    Rgbe8,
}

impl TextureSourceFormat {
    /// Channel layout and bits per channel of this format's pixel buffer.
    pub fn layout(&self) -> (ChannelLayout, u8) {
        match self {
            Self::G8 => (ChannelLayout::Gray, 8),
            Self::G16 => (ChannelLayout::Gray, 16),
            Self::Bgra8 | Self::Bgre8 => (ChannelLayout::Bgra, 8),
            Self::Rgba8 | Self::Rgbe8 => (ChannelLayout::Rgba, 8),
            Self::Rgba16 | Self::Rgba16F => (ChannelLayout::Rgba, 16),
            Self::Invalid => (ChannelLayout::Invalid, 0),
        }
    }

    /// Bytes per pixel for this format.
    pub fn bytes_per_pixel(&self) -> usize {
        let (layout, depth) = self.layout();
        bytes_per_pixel(layout, depth)
    }
}

/// Typed pixels a [`crate::DecodedImage`] buffer can be viewed as.
#[cfg(feature = "rgb")]
pub trait TexturePixel: Copy {
    /// Texture format whose buffer has this pixel's memory layout.
    const FORMAT: TextureSourceFormat;
}

#[cfg(feature = "rgb")]
impl TexturePixel for rgb::alt::BGRA<u8> {
    const FORMAT: TextureSourceFormat = TextureSourceFormat::Bgra8;
}

#[cfg(feature = "rgb")]
impl TexturePixel for rgb::RGBA<u8> {
    const FORMAT: TextureSourceFormat = TextureSourceFormat::Rgba8;
}

#[cfg(feature = "rgb")]
impl TexturePixel for rgb::alt::Gray<u8> {
    const FORMAT: TextureSourceFormat = TextureSourceFormat::G8;
}
