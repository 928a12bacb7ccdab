//! Texture loading and generation

use crate::error::{AssetKind, LoadError, Result};
use crate::loader::ResourceLoader;
use crate::runtime::run_blocking;
use crate::source::AssetSource;
use crate::Bundle;
use async_trait::async_trait;
use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageFormat};

/// How the texture's channels are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureSemantic {
    /// Color data, stored sRGB
    #[default]
    Color,
    /// Tangent-space normals, stored linear
    Normal,
    /// Non-color data such as masks or roughness, stored linear
    Raw,
}

/// Pixel format of a loaded texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8Srgb,
    Rgba8Unorm,
}

impl TextureSemantic {
    fn format(self) -> TextureFormat {
        match self {
            Self::Color => TextureFormat::Rgba8Srgb,
            Self::Normal | Self::Raw => TextureFormat::Rgba8Unorm,
        }
    }
}

/// Options applied when creating a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureOptions {
    pub semantic: TextureSemantic,
    /// Whether a full mip chain should be allocated by the consumer
    pub mipmaps: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self::new(TextureSemantic::Color)
    }
}

impl TextureOptions {
    /// Options for `semantic` with mipmaps enabled
    pub fn new(semantic: TextureSemantic) -> Self {
        Self {
            semantic,
            mipmaps: true,
        }
    }
}

/// A decoded RGBA8 texture
#[derive(Debug, Clone)]
pub struct TextureResource {
    pub name: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub semantic: TextureSemantic,
    /// Mip levels the consumer should allocate, including the base level
    pub mip_levels: u32,
    pub data: Vec<u8>,
}

impl TextureResource {
    /// Build a texture from an already decoded image
    pub fn generate(image: DynamicImage, name: Option<String>, options: TextureOptions) -> Self {
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        let mip_levels = if options.mipmaps {
            32 - width.max(height).max(1).leading_zeros()
        } else {
            1
        };

        Self {
            name,
            width,
            height,
            format: options.semantic.format(),
            semantic: options.semantic,
            mip_levels,
            data: rgba.into_raw(),
        }
    }

    /// Size of the base level in bytes
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }
}

/// Loads PNG and JPEG textures
#[derive(Debug, Clone)]
pub struct TextureLoader {
    main: Bundle,
    extensions: Vec<String>,
    options: TextureOptions,
}

impl TextureLoader {
    /// Create a loader that resolves names in `main`
    pub fn new(main: Bundle, extensions: Vec<String>, options: TextureOptions) -> Self {
        Self {
            main,
            extensions,
            options,
        }
    }

    /// Decode a texture from binary data
    pub fn decode(
        data: &[u8],
        name: Option<String>,
        options: TextureOptions,
    ) -> Result<TextureResource> {
        let format = image::guess_format(data)
            .map_err(|e| LoadError::decode(AssetKind::Texture, e.to_string()))?;

        match format {
            ImageFormat::Jpeg | ImageFormat::Png => {}
            _ => {
                return Err(LoadError::UnsupportedFormat(format!(
                    "Only JPG/JPEG and PNG textures are supported, got {:?}",
                    format.extensions_str()
                )))
            }
        }

        let img = ImageReader::with_format(std::io::Cursor::new(data), format).decode()?;
        Ok(TextureResource::generate(img, name, options))
    }

    /// Load with explicit options instead of the loader defaults
    pub async fn load_with(
        &self,
        source: &AssetSource,
        options: TextureOptions,
    ) -> Result<TextureResource> {
        let bytes = source.resolve(&self.main, &self.extensions)?.read().await?;
        let name = source.resource_name();
        run_blocking(move || TextureLoader::decode(&bytes, name, options)).await
    }
}

#[async_trait]
impl ResourceLoader for TextureLoader {
    type Output = TextureResource;

    fn kind(&self) -> AssetKind {
        AssetKind::Texture
    }

    async fn load(&self, source: &AssetSource) -> Result<TextureResource> {
        self.load_with(source, self.options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut data = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut data), format)
            .expect("Failed to encode test image");
        data
    }

    #[test]
    fn test_decode_png() {
        let png = encode(ImageFormat::Png, 4, 2);
        let texture = TextureLoader::decode(&png, Some("red".into()), TextureOptions::default())
            .unwrap();

        assert_eq!((texture.width, texture.height), (4, 2));
        assert_eq!(texture.format, TextureFormat::Rgba8Srgb);
        assert_eq!(texture.mip_levels, 3);
        assert_eq!(texture.byte_size(), 4 * 2 * 4);
        assert_eq!(&texture.data[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_jpeg_as_normal_map() {
        let jpeg = encode(ImageFormat::Jpeg, 1, 1);
        let texture =
            TextureLoader::decode(&jpeg, None, TextureOptions::new(TextureSemantic::Normal))
                .unwrap();

        assert_eq!(texture.format, TextureFormat::Rgba8Unorm);
        assert_eq!(texture.semantic, TextureSemantic::Normal);
        assert_eq!(texture.mip_levels, 1);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = TextureLoader::decode(b"definitely not an image", None, TextureOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Decode { kind: AssetKind::Texture, .. }));
    }

    #[test]
    fn test_generate_without_mipmaps() {
        let img = DynamicImage::new_rgba8(16, 8);
        let options = TextureOptions {
            semantic: TextureSemantic::Raw,
            mipmaps: false,
        };
        let texture = TextureResource::generate(img, Some("mask".into()), options);
        assert_eq!(texture.mip_levels, 1);
        assert_eq!(texture.format, TextureFormat::Rgba8Unorm);
    }
}
