//! Asset provisioning: QR code rasters for the page header.
//!
//! [`QrProvisioner::generate`] encodes a payload as a square PNG and hands
//! back an [`AssetRef`]. The reference owns its backing storage; a
//! temporary file is deleted when the reference is released or dropped.

use std::io::{Cursor, Write};
use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Side length of generated QR images, in pixels.
pub const QR_SIZE_PX: u32 = 256;

/// Light modules around the symbol on each side.
const QUIET_ZONE: u32 = 4;

/// How a generated asset is backed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetStorage {
    /// A temporary PNG file, removed on release
    #[default]
    TempFile,
    /// An in-memory PNG buffer
    Memory,
}

/// Handle to a generated raster image.
#[derive(Debug)]
pub struct AssetRef {
    backing: Backing,
    size_px: u32,
}

#[derive(Debug)]
enum Backing {
    TempFile(NamedTempFile),
    Memory(Vec<u8>),
}

impl AssetRef {
    /// Wrap an in-memory PNG.
    pub fn from_png(data: Vec<u8>, size_px: u32) -> Self {
        Self {
            backing: Backing::Memory(data),
            size_px,
        }
    }

    /// Side length in pixels.
    pub fn size_px(&self) -> u32 {
        self.size_px
    }

    /// Path of the backing file, if the asset lives on disk.
    pub fn path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::TempFile(file) => Some(file.path()),
            Backing::Memory(_) => None,
        }
    }

    /// Read the PNG bytes.
    pub fn png_bytes(&self) -> Result<Vec<u8>> {
        match &self.backing {
            Backing::TempFile(file) => Ok(std::fs::read(file.path())?),
            Backing::Memory(data) => Ok(data.clone()),
        }
    }

    /// Release the asset, deleting any temporary backing file.
    ///
    /// Dropping the reference also deletes the file; calling this surfaces
    /// deletion errors instead of ignoring them.
    pub fn release(self) -> Result<()> {
        match self.backing {
            Backing::TempFile(file) => Ok(file.close()?),
            Backing::Memory(_) => Ok(()),
        }
    }
}

/// Generates QR code assets.
#[derive(Debug, Clone)]
pub struct QrProvisioner {
    size_px: u32,
    ec_level: EcLevel,
    storage: AssetStorage,
}

impl QrProvisioner {
    /// Create a provisioner producing 256 px images at error-correction
    /// level M (about 15% recovery).
    pub fn new() -> Self {
        Self {
            size_px: QR_SIZE_PX,
            ec_level: EcLevel::M,
            storage: AssetStorage::TempFile,
        }
    }

    /// Set how generated assets are backed.
    pub fn with_storage(mut self, storage: AssetStorage) -> Self {
        self.storage = storage;
        self
    }

    /// Set the output side length in pixels.
    ///
    /// Generation fails when the size leaves less than one pixel per module.
    pub fn with_size(mut self, size_px: u32) -> Self {
        self.size_px = size_px.max(1);
        self
    }

    /// Encode `payload` as a QR code image.
    pub fn generate(&self, payload: &str) -> Result<AssetRef> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.ec_level)?;
        let modules = code.width() as u32 + 2 * QUIET_ZONE;
        if self.size_px < modules {
            return Err(Error::AssetEncode(format!(
                "{} px is too small for a {}-module symbol",
                self.size_px, modules
            )));
        }
        let png = encode_png(&rasterize(&code, self.size_px))?;

        let backing = match self.storage {
            AssetStorage::TempFile => {
                let mut file = tempfile::Builder::new()
                    .prefix("qrcode-")
                    .suffix(".png")
                    .tempfile()
                    .map_err(|e| Error::AssetEncode(format!("temporary file: {}", e)))?;
                file.write_all(&png)
                    .and_then(|_| file.flush())
                    .map_err(|e| Error::AssetEncode(format!("temporary file: {}", e)))?;
                Backing::TempFile(file)
            }
            AssetStorage::Memory => Backing::Memory(png),
        };

        log::debug!(
            "Generated {}x{} QR code (version {:?}) for {:?}",
            self.size_px,
            self.size_px,
            code.version(),
            payload
        );

        Ok(AssetRef {
            backing,
            size_px: self.size_px,
        })
    }
}

impl Default for QrProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale the symbol (plus quiet zone) to exactly `size` pixels per side.
fn rasterize(code: &QrCode, size: u32) -> GrayImage {
    let width = code.width() as u32;
    let colors = code.to_colors();
    let total = width + 2 * QUIET_ZONE;

    GrayImage::from_fn(size, size, |x, y| {
        let mx = (x * total / size) as i64 - QUIET_ZONE as i64;
        let my = (y * total / size) as i64 - QUIET_ZONE as i64;
        let inside = mx >= 0 && my >= 0 && mx < width as i64 && my < width as i64;
        let dark = inside && colors[(my as usize) * width as usize + mx as usize] == Color::Dark;
        if dark {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

fn encode_png(img: &GrayImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| Error::AssetEncode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_temp_file_is_removed_on_release() {
        let asset = QrProvisioner::new().generate("https://miff.me").unwrap();
        let path = asset.path().unwrap().to_path_buf();
        assert!(path.exists());

        let png = asset.png_bytes().unwrap();
        assert!(png.starts_with(b"\x89PNG"));

        asset.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_generate_temp_file_is_removed_on_drop() {
        let asset = QrProvisioner::new().generate("https://miff.me").unwrap();
        let path = asset.path().unwrap().to_path_buf();
        drop(asset);
        assert!(!path.exists());
    }

    #[test]
    fn test_generate_size() {
        let asset = QrProvisioner::new()
            .with_storage(AssetStorage::Memory)
            .generate("https://miff.me")
            .unwrap();
        assert!(asset.path().is_none());
        assert_eq!(asset.size_px(), QR_SIZE_PX);

        let img = image::load_from_memory(&asset.png_bytes().unwrap()).unwrap();
        assert_eq!((img.width(), img.height()), (QR_SIZE_PX, QR_SIZE_PX));
    }

    #[test]
    fn test_quiet_zone_is_light_and_symbol_has_dark_modules() {
        let code = QrCode::with_error_correction_level(b"https://miff.me", EcLevel::M).unwrap();
        let img = rasterize(&code, QR_SIZE_PX);
        assert_eq!(img.get_pixel(0, 0), &Luma([255]));
        assert_eq!(img.get_pixel(QR_SIZE_PX - 1, QR_SIZE_PX - 1), &Luma([255]));
        assert!(img.pixels().any(|p| p.0[0] == 0));
    }

    #[test]
    fn test_size_below_module_count() {
        // At level M https://miff.me needs version 2: 25 modules plus the quiet zone.
        let provisioner = QrProvisioner::new().with_storage(AssetStorage::Memory);

        let err = provisioner.clone().with_size(20).generate("https://miff.me").unwrap_err();
        assert!(matches!(err, Error::AssetEncode(_)));

        let asset = provisioner.with_size(33).generate("https://miff.me").unwrap();
        assert_eq!(asset.size_px(), 33);
    }

    #[test]
    fn test_payload_too_long() {
        let payload = "x".repeat(8000);
        let err = QrProvisioner::new().generate(&payload).unwrap_err();
        assert!(matches!(err, Error::AssetEncode(_)));
    }
}
