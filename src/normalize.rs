//! Mapping from a codec's native pixel layout to a canonical texture format.

use crate::pixel::{ChannelLayout, ImageFormat, TextureSourceFormat};

/// Canonical format for a source of `format` storing `layout` at `depth`
/// bits per channel.
///
/// For ICO pass the embedded image's format. [`TextureSourceFormat::Invalid`]
/// means no rule applies and the decode must not proceed.
pub(crate) fn texture_format_for(
    format: ImageFormat,
    layout: ChannelLayout,
    depth: u8,
) -> TextureSourceFormat {
    match format {
        // These codecs emit their output layout directly.
        ImageFormat::Bmp | ImageFormat::Pcx => TextureSourceFormat::Bgra8,
        ImageFormat::Tga => match layout {
            ChannelLayout::Gray => TextureSourceFormat::G8,
            _ => TextureSourceFormat::Bgra8,
        },
        ImageFormat::Exr => match (layout, depth) {
            (ChannelLayout::Rgba, 16) => TextureSourceFormat::Rgba16F,
            _ => TextureSourceFormat::Invalid,
        },
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::GrayscaleJpeg => {
            match (layout, depth) {
                (ChannelLayout::Invalid, _) | (_, 0) => TextureSourceFormat::Invalid,
                (_, 1..=8) => TextureSourceFormat::Rgba8,
                (_, 16) => TextureSourceFormat::Rgba16,
                _ => TextureSourceFormat::Invalid,
            }
        }
        ImageFormat::Ico | ImageFormat::Invalid => TextureSourceFormat::Invalid,
    }
}
