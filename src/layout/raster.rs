//! Decoded raster images ready for embedding.

use serde::Serialize;

use crate::error::{Error, Result};

/// Pixel layout of a [`RasterImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorSpace {
    /// One byte per pixel
    Gray,
    /// Three bytes per pixel
    Rgb,
}

impl ColorSpace {
    /// PDF color space name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::Gray => "DeviceGray",
            ColorSpace::Rgb => "DeviceRGB",
        }
    }

    /// Bytes per pixel.
    pub fn components(&self) -> usize {
        match self {
            ColorSpace::Gray => 1,
            ColorSpace::Rgb => 3,
        }
    }
}

/// An 8-bit image with alpha flattened onto white.
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// Identifies the image within one document; equal keys share one
    /// embedded object.
    pub key: String,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Pixel layout
    pub color_space: ColorSpace,

    /// Row-major pixel data
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Decode an encoded image (PNG) into raw pixels.
    pub fn decode(key: impl Into<String>, data: &[u8]) -> Result<Self> {
        let key = key.into();
        let img = image::load_from_memory(data)
            .map_err(|e| Error::Layout(format!("cannot decode image {}: {}", key, e)))?;
        let (width, height) = (img.width(), img.height());
        if width == 0 || height == 0 {
            return Err(Error::Layout(format!("image {} is empty", key)));
        }

        let has_color = img.color().has_color();
        let rgba = img.to_rgba8();
        let color_space = if has_color {
            ColorSpace::Rgb
        } else {
            ColorSpace::Gray
        };

        let mut pixels = Vec::with_capacity(width as usize * height as usize * color_space.components());
        for px in rgba.pixels() {
            let [r, g, b, a] = px.0;
            let flat = |c: u8| -> u8 {
                // c * a + 255 * (255 - a), rounded
                ((c as u32 * a as u32 + 255 * (255 - a as u32) + 127) / 255) as u8
            };
            match color_space {
                ColorSpace::Gray => pixels.push(flat(r)),
                ColorSpace::Rgb => pixels.extend_from_slice(&[flat(r), flat(g), flat(b)]),
            }
        }

        Ok(Self {
            key,
            width,
            height,
            color_space,
            pixels,
        })
    }

    /// Height for a given display width, keeping the aspect ratio.
    pub fn height_for_width(&self, width: f32) -> f32 {
        width * self.height as f32 / self.width as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(img: RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_decode_rgb() {
        let img = RgbaImage::from_pixel(4, 2, Rgba([200, 10, 20, 255]));
        let raster = RasterImage::decode("logo", &png(img)).unwrap();
        assert_eq!((raster.width, raster.height), (4, 2));
        assert_eq!(raster.color_space, ColorSpace::Rgb);
        assert_eq!(raster.pixels.len(), 4 * 2 * 3);
        assert_eq!(&raster.pixels[..3], &[200, 10, 20]);
        assert_eq!(raster.height_for_width(30.0), 15.0);
    }

    #[test]
    fn test_transparent_pixels_become_white() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 0]));
        let raster = RasterImage::decode("logo", &png(img)).unwrap();
        assert_eq!(raster.pixels, vec![255, 255, 255]);
    }

    #[test]
    fn test_decode_garbage() {
        let err = RasterImage::decode("logo", b"not an image").unwrap_err();
        assert!(matches!(err, Error::Layout(_)));
    }
}
