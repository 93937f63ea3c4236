//! [`ExternalDecoder`] backed by the `image` crate.

use alloc::string::ToString;
use alloc::vec::Vec;
use std::io::Cursor;

use image::{ColorType, ImageDecoder as _, ImageReader};

use super::{ExternalDecoder, ExternalInfo, LibraryGuard};
use crate::error::DecodeError;
use crate::pixel::{ChannelLayout, ImageFormat};

/// PNG, JPEG and EXR through `image`, one call at a time.
///
/// Which formats are available follows the `png`, `jpeg` and `exr` features.
#[derive(Clone, Debug)]
pub struct ImageCrateDecoder {
    guard: LibraryGuard,
}

impl Default for ImageCrateDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCrateDecoder {
    /// Adapter serialized on the process-wide [`LibraryGuard::shared`] lock.
    pub fn new() -> Self {
        Self::with_guard(LibraryGuard::shared())
    }

    /// Adapter serialized on a caller-provided lock.
    pub fn with_guard(guard: LibraryGuard) -> Self {
        Self { guard }
    }

    fn image_format(format: ImageFormat) -> Option<image::ImageFormat> {
        match format {
            #[cfg(feature = "png")]
            ImageFormat::Png => Some(image::ImageFormat::Png),
            #[cfg(feature = "jpeg")]
            ImageFormat::Jpeg | ImageFormat::GrayscaleJpeg => Some(image::ImageFormat::Jpeg),
            #[cfg(feature = "exr")]
            ImageFormat::Exr => Some(image::ImageFormat::OpenExr),
            _ => None,
        }
    }

    fn require_format(format: ImageFormat) -> Result<image::ImageFormat, DecodeError> {
        Self::image_format(format).ok_or(DecodeError::UnsupportedFormat(format))
    }
}

fn external_error(format: ImageFormat, err: image::ImageError) -> DecodeError {
    DecodeError::External {
        format,
        reason: err.to_string(),
    }
}

/// Native layout as the texture pipeline sees it.
///
/// EXR always reports half-float RGBA and grayscale JPEG always reports gray,
/// whatever the file's own channel set.
fn native_layout(format: ImageFormat, color: ColorType) -> (ChannelLayout, u8) {
    match format {
        ImageFormat::Exr => (ChannelLayout::Rgba, 16),
        ImageFormat::GrayscaleJpeg => (ChannelLayout::Gray, 8),
        _ => {
            let channels = u16::from(color.channel_count()).max(1);
            let depth = (color.bits_per_pixel() / channels) as u8;
            if color.has_color() {
                (ChannelLayout::Rgba, depth)
            } else {
                (ChannelLayout::Gray, depth)
            }
        }
    }
}

fn u16_bytes(samples: Vec<u16>) -> Vec<u8> {
    samples.into_iter().flat_map(u16::to_ne_bytes).collect()
}

#[cfg(feature = "exr")]
fn half_bytes(image: &image::DynamicImage) -> Vec<u8> {
    image
        .to_rgba32f()
        .into_raw()
        .into_iter()
        .flat_map(|v| half::f16::from_f32(v).to_ne_bytes())
        .collect()
}

impl ExternalDecoder for ImageCrateDecoder {
    fn supports(&self, format: ImageFormat) -> bool {
        Self::image_format(format).is_some()
    }

    fn probe(&self, format: ImageFormat, data: &[u8]) -> Result<ExternalInfo, DecodeError> {
        let image_format = Self::require_format(format)?;
        let _held = self.guard.lock();
        let decoder = ImageReader::with_format(Cursor::new(data), image_format)
            .into_decoder()
            .map_err(|e| external_error(format, e))?;
        let (width, height) = decoder.dimensions();
        let (layout, bit_depth) = native_layout(format, decoder.color_type());
        Ok(ExternalInfo {
            width,
            height,
            layout,
            bit_depth,
        })
    }

    fn decode(
        &self,
        format: ImageFormat,
        data: &[u8],
        layout: ChannelLayout,
        bit_depth: u8,
    ) -> Result<Vec<u8>, DecodeError> {
        let image_format = Self::require_format(format)?;
        let _held = self.guard.lock();
        let mut image = image::load_from_memory_with_format(data, image_format)
            .map_err(|e| external_error(format, e))?;
        if format == ImageFormat::GrayscaleJpeg {
            image = image::DynamicImage::ImageLuma8(image.to_luma8());
        }
        log::debug!(
            "{format:?}: {}x{} {:?} -> {layout:?}/{bit_depth}",
            image.width(),
            image.height(),
            image.color()
        );

        let pixels = match (layout, bit_depth) {
            #[cfg(feature = "exr")]
            (ChannelLayout::Rgba, 16) if format == ImageFormat::Exr => half_bytes(&image),
            (ChannelLayout::Rgba, 8) => image.to_rgba8().into_raw(),
            (ChannelLayout::Rgba, 16) => u16_bytes(image.to_rgba16().into_raw()),
            (ChannelLayout::Bgra, 8) => {
                let mut px = image.to_rgba8().into_raw();
                for p in px.chunks_exact_mut(4) {
                    p.swap(0, 2);
                }
                px
            }
            (ChannelLayout::Gray, 8) => image.to_luma8().into_raw(),
            (ChannelLayout::Gray, 16) => u16_bytes(image.to_luma16().into_raw()),
            _ => {
                return Err(DecodeError::InvalidRequest(
                    "external decoders cannot produce this layout",
                ));
            }
        };
        Ok(pixels)
    }
}
