use alloc::vec::Vec;

use enough::Stop;
#[cfg(feature = "rgb")]
use rgb::AsPixels as _;

use crate::bmp::{self, BmpHeader, BmpOptions};
use crate::detect::detect_format;
use crate::error::{DecodeError, DecodeWarning};
use crate::external::{ExternalDecoder, ExternalInfo};
use crate::ico::{self, IcoImage};
use crate::limits::Limits;
use crate::normalize::texture_format_for;
use crate::pcx::{self, PcxHeader};
use crate::pixel::{ChannelLayout, ImageFormat, TextureSourceFormat};
use crate::tga::{self, TgaHeader, TgaKind};

/// The file a decoded image came from, as stored before normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub format: ImageFormat,
    /// Channel layout as found in the source.
    pub layout: ChannelLayout,
    /// Bits per channel as found in the source.
    pub bit_depth: u8,
}

/// Header-level facts, available without decoding pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub source: SourceDescriptor,
    /// Canonical format a full decode will produce.
    pub texture_format: TextureSourceFormat,
}

impl ImageInfo {
    /// Exact byte length of the decoded pixel buffer.
    pub fn buffer_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.texture_format.bytes_per_pixel())
    }
}

/// A fully decoded image in one canonical texture format.
///
/// `pixels().len()` is always `width * height * bytes_per_pixel`, with rows
/// packed top to bottom and 16-bit samples in native endian order.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub texture_format: TextureSourceFormat,
    pub source: SourceDescriptor,
    pixels: Vec<u8>,
    warnings: Vec<DecodeWarning>,
}

impl DecodedImage {
    /// Channel layout of [`Self::pixels`].
    pub fn channel_layout(&self) -> ChannelLayout {
        self.texture_format.layout().0
    }

    /// Bits per channel of [`Self::pixels`].
    pub fn bit_depth(&self) -> u8 {
        self.texture_format.layout().1
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.texture_format.bytes_per_pixel()
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Take ownership of the pixel buffer.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Conditions noticed while decoding that did not stop it.
    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    /// Header-level summary of this image.
    pub fn info(&self) -> ImageInfo {
        ImageInfo {
            width: self.width,
            height: self.height,
            source: self.source,
            texture_format: self.texture_format,
        }
    }

    /// Reinterpret the pixel data as a typed pixel slice.
    ///
    /// Returns [`DecodeError::LayoutMismatch`] unless `P` matches
    /// [`Self::texture_format`].
    #[cfg(feature = "rgb")]
    pub fn as_pixels<P: crate::TexturePixel>(&self) -> Result<&[P], DecodeError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        if self.texture_format != P::FORMAT {
            return Err(DecodeError::LayoutMismatch {
                expected: P::FORMAT,
                actual: self.texture_format,
            });
        }
        Ok(self.pixels().as_pixels())
    }

    /// Borrowed [`imgref::ImgRef`] view of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn as_imgref<P: crate::TexturePixel>(&self) -> Result<imgref::ImgRef<'_, P>, DecodeError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgRef::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }

    /// Copy into an owned [`imgref::ImgVec`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec<P: crate::TexturePixel>(&self) -> Result<imgref::ImgVec<P>, DecodeError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgVec::new(
            pixels.to_vec(),
            self.width as usize,
            self.height as usize,
        ))
    }
}

/// A parsed header, ready to decode.
enum Codec<'a> {
    Bmp(BmpHeader),
    Tga(TgaHeader),
    Pcx(PcxHeader),
    Ico(IcoImage, Option<&'a dyn ExternalDecoder>),
    External(&'a dyn ExternalDecoder, ExternalInfo),
}

impl<'a> Codec<'a> {
    fn parse(
        format: ImageFormat,
        data: &[u8],
        external: Option<&'a dyn ExternalDecoder>,
    ) -> Result<Self, DecodeError> {
        Ok(match format {
            ImageFormat::Bmp => Codec::Bmp(bmp::parse_header(data, BmpOptions::default())?),
            ImageFormat::Tga => Codec::Tga(tga::parse_header(data)?),
            ImageFormat::Pcx => Codec::Pcx(pcx::parse_header(data)?),
            ImageFormat::Ico => Codec::Ico(ico::parse(data, external)?, external),
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::GrayscaleJpeg | ImageFormat::Exr => {
                let ext = external
                    .filter(|e| e.supports(format))
                    .ok_or(DecodeError::UnsupportedFormat(format))?;
                Codec::External(ext, ext.probe(format, data)?)
            }
            ImageFormat::Invalid => {
                return Err(DecodeError::InvalidRequest("format must not be Invalid"));
            }
        })
    }

    fn dimensions(&self) -> (u32, u32) {
        match self {
            Codec::Bmp(h) => (h.width, h.height),
            Codec::Tga(h) => (h.width, h.height),
            Codec::Pcx(h) => (h.width, h.height),
            Codec::Ico(image, _) => image.dimensions(),
            Codec::External(_, info) => (info.width, info.height),
        }
    }

    /// Layout and depth the codec itself works in.
    fn native_layout(&self) -> (ChannelLayout, u8) {
        match self {
            Codec::Bmp(_) | Codec::Pcx(_) => (ChannelLayout::Bgra, 8),
            Codec::Tga(h) => match h.kind {
                TgaKind::Gray8 { .. } => (ChannelLayout::Gray, 8),
                _ => (ChannelLayout::Bgra, 8),
            },
            Codec::Ico(image, _) => image.native_layout(),
            Codec::External(_, info) => (info.layout, info.bit_depth),
        }
    }

    fn texture_format(&self, format: ImageFormat) -> TextureSourceFormat {
        let (layout, depth) = self.native_layout();
        let rule_format = match self {
            Codec::Ico(image, _) => image.sub_format(),
            _ => format,
        };
        texture_format_for(rule_format, layout, depth)
    }

    fn warnings(&self) -> Vec<DecodeWarning> {
        match self {
            Codec::Bmp(h) => h.warnings.clone(),
            Codec::Ico(image, _) => image.warnings.clone(),
            _ => Vec::new(),
        }
    }

    fn decode(
        &self,
        format: ImageFormat,
        data: &[u8],
        target: TextureSourceFormat,
        stop: &dyn Stop,
    ) -> Result<Vec<u8>, DecodeError> {
        match self {
            Codec::Bmp(h) => bmp::decode_pixels(data, h, stop),
            Codec::Tga(h) => tga::decode_pixels(data, h, stop),
            Codec::Pcx(h) => pcx::decode_pixels(data, h, stop),
            Codec::Ico(image, external) => {
                ico::decode_pixels(data, image, *external, target.layout(), stop)
            }
            Codec::External(ext, _) => {
                let (layout, depth) = target.layout();
                ext.decode(format, data, layout, depth)
            }
        }
    }
}

#[cfg(feature = "external")]
fn default_external() -> Option<&'static dyn ExternalDecoder> {
    static DEFAULT: std::sync::OnceLock<crate::external::ImageCrateDecoder> =
        std::sync::OnceLock::new();
    Some(DEFAULT.get_or_init(crate::external::ImageCrateDecoder::new))
}

#[cfg(not(feature = "external"))]
fn default_external() -> Option<&'static dyn ExternalDecoder> {
    None
}

/// Decode request builder.
///
/// Without [`Self::with_format`] the format is detected from magic bytes,
/// which never finds TGA or PCX.
#[derive(Clone, Copy)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    format: Option<ImageFormat>,
    limits: Option<&'a Limits>,
    external: Option<&'a dyn ExternalDecoder>,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            format: None,
            limits: None,
            external: default_external(),
        }
    }

    /// Decode as `format` instead of detecting it.
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Decoder for PNG, JPEG and EXR (and PNG icons), replacing the built-in
    /// one.
    pub fn with_external(mut self, external: &'a dyn ExternalDecoder) -> Self {
        self.external = Some(external);
        self
    }

    /// Disable every external decoder; PNG, JPEG and EXR then fail with
    /// [`DecodeError::UnsupportedFormat`].
    pub fn without_external(mut self) -> Self {
        self.external = None;
        self
    }

    fn resolve_format(&self) -> Result<ImageFormat, DecodeError> {
        if self.data.is_empty() {
            return Err(DecodeError::InvalidRequest("input is empty"));
        }
        match self.format {
            Some(ImageFormat::Invalid) => {
                Err(DecodeError::InvalidRequest("format must not be Invalid"))
            }
            Some(format) => Ok(format),
            None => match detect_format(self.data) {
                ImageFormat::Invalid => Err(DecodeError::UnrecognizedFormat),
                format => Ok(format),
            },
        }
    }

    fn prepare(&self) -> Result<(ImageFormat, Codec<'a>, ImageInfo), DecodeError> {
        let format = self.resolve_format()?;
        let codec = Codec::parse(format, self.data, self.external)?;
        let (width, height) = codec.dimensions();
        let (layout, bit_depth) = codec.native_layout();
        if width == 0 || height == 0 {
            return Err(DecodeError::malformed(
                format,
                alloc::format!("zero dimension {width}x{height}"),
            ));
        }
        let info = ImageInfo {
            width,
            height,
            source: SourceDescriptor {
                format,
                layout,
                bit_depth,
            },
            texture_format: codec.texture_format(format),
        };
        Ok((format, codec, info))
    }

    /// Read the header only.
    pub fn probe(&self) -> Result<ImageInfo, DecodeError> {
        self.prepare().map(|(_, _, info)| info)
    }

    /// Decode to the canonical texture format.
    ///
    /// The texture format mapping and all limits are checked before the
    /// pixel buffer is allocated.
    pub fn decode(self, stop: impl Stop) -> Result<DecodedImage, DecodeError> {
        let (format, codec, info) = self.prepare()?;
        if info.texture_format == TextureSourceFormat::Invalid {
            return Err(DecodeError::UnmappedTextureFormat {
                layout: info.source.layout,
                depth: info.source.bit_depth,
            });
        }

        let expected = info.buffer_len().ok_or(DecodeError::DimensionsTooLarge {
            width: info.width,
            height: info.height,
        })?;
        if let Some(limits) = self.limits {
            limits.check(info.width, info.height)?;
            limits.check_memory(expected)?;
        }
        stop.check()?;

        let pixels = codec.decode(format, self.data, info.texture_format, &stop)?;
        if pixels.len() != expected {
            return Err(DecodeError::OutputSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        log::debug!(
            "decoded {format:?} {}x{} as {:?}",
            info.width,
            info.height,
            info.texture_format
        );

        Ok(DecodedImage {
            width: info.width,
            height: info.height,
            texture_format: info.texture_format,
            source: info.source,
            pixels,
            warnings: codec.warnings(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use enough::Unstoppable;

    struct FakeExternal {
        info: ExternalInfo,
        fill: u8,
        short: bool,
    }

    impl ExternalDecoder for FakeExternal {
        fn supports(&self, format: ImageFormat) -> bool {
            format.is_external()
        }

        fn probe(&self, _: ImageFormat, _: &[u8]) -> Result<ExternalInfo, DecodeError> {
            Ok(self.info)
        }

        fn decode(
            &self,
            _: ImageFormat,
            _: &[u8],
            layout: ChannelLayout,
            bit_depth: u8,
        ) -> Result<Vec<u8>, DecodeError> {
            let len = self.info.width as usize
                * self.info.height as usize
                * crate::pixel::bytes_per_pixel(layout, bit_depth);
            Ok(vec![self.fill; if self.short { len - 1 } else { len }])
        }
    }

    fn fake(layout: ChannelLayout, bit_depth: u8) -> FakeExternal {
        FakeExternal {
            info: ExternalInfo {
                width: 2,
                height: 3,
                layout,
                bit_depth,
            },
            fill: 7,
            short: false,
        }
    }

    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0];

    #[test]
    fn empty_and_invalid_requests() {
        assert!(matches!(
            DecodeRequest::new(&[]).decode(Unstoppable),
            Err(DecodeError::InvalidRequest(_))
        ));
        assert!(matches!(
            DecodeRequest::new(&[1, 2, 3])
                .with_format(ImageFormat::Invalid)
                .decode(Unstoppable),
            Err(DecodeError::InvalidRequest(_))
        ));
        assert!(matches!(
            DecodeRequest::new(&[1, 2, 3]).decode(Unstoppable),
            Err(DecodeError::UnrecognizedFormat)
        ));
    }

    #[test]
    fn gray_png_promotes_to_rgba8() {
        let ext = fake(ChannelLayout::Gray, 8);
        let img = DecodeRequest::new(PNG_MAGIC)
            .with_external(&ext)
            .decode(Unstoppable)
            .unwrap();
        assert_eq!(img.texture_format, TextureSourceFormat::Rgba8);
        assert_eq!(img.source.layout, ChannelLayout::Gray);
        assert_eq!(img.channel_layout(), ChannelLayout::Rgba);
        assert_eq!(img.pixels().len(), 2 * 3 * 4);
    }

    #[test]
    fn exr_maps_to_half_float() {
        let ext = fake(ChannelLayout::Rgba, 16);
        let info = DecodeRequest::new(&[0x76, 0x2F, 0x31, 0x01])
            .with_external(&ext)
            .probe()
            .unwrap();
        assert_eq!(info.source.format, ImageFormat::Exr);
        assert_eq!(info.texture_format, TextureSourceFormat::Rgba16F);
        assert_eq!(info.buffer_len(), Some(2 * 3 * 8));
    }

    #[test]
    fn unmapped_format_fails_before_decode() {
        let ext = fake(ChannelLayout::Rgba, 32);
        assert!(matches!(
            DecodeRequest::new(PNG_MAGIC).with_external(&ext).decode(Unstoppable),
            Err(DecodeError::UnmappedTextureFormat {
                layout: ChannelLayout::Rgba,
                depth: 32
            })
        ));
    }

    #[test]
    fn short_external_output_is_rejected() {
        let mut ext = fake(ChannelLayout::Rgba, 8);
        ext.short = true;
        assert!(matches!(
            DecodeRequest::new(PNG_MAGIC).with_external(&ext).decode(Unstoppable),
            Err(DecodeError::OutputSizeMismatch {
                expected: 24,
                actual: 23
            })
        ));
    }

    #[test]
    fn missing_external_decoder() {
        assert!(matches!(
            DecodeRequest::new(PNG_MAGIC)
                .without_external()
                .decode(Unstoppable),
            Err(DecodeError::UnsupportedFormat(ImageFormat::Png))
        ));
    }

    #[test]
    fn limits_apply_before_decode() {
        let ext = fake(ChannelLayout::Rgba, 8);
        let limits = Limits {
            max_memory_bytes: Some(10),
            ..Limits::default()
        };
        assert!(matches!(
            DecodeRequest::new(PNG_MAGIC)
                .with_external(&ext)
                .with_limits(&limits)
                .decode(Unstoppable),
            Err(DecodeError::LimitExceeded(_))
        ));
    }

    #[test]
    fn zero_sized_external_image_is_malformed() {
        let mut ext = fake(ChannelLayout::Rgba, 8);
        ext.info.width = 0;
        assert!(matches!(
            DecodeRequest::new(PNG_MAGIC).with_external(&ext).probe(),
            Err(DecodeError::MalformedHeader { .. })
        ));
    }
}
