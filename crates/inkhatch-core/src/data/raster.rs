use crate::error::{Error, ImageError};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::path::Path;

/// RGBA raster handed to the hatching pipeline.
///
/// Row-major, 8 bits per component, straight (non-premultiplied) alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    /// Wrap a raw RGBA buffer of `width * height * 4` bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::Empty { width, height });
        }
        let expected = width as usize * height as usize * 4;
        let actual = data.len();
        if actual != expected {
            return Err(ImageError::InvalidBuffer { expected, actual });
        }
        let pixels = RgbaImage::from_raw(width, height, data)
            .ok_or(ImageError::InvalidBuffer { expected, actual })?;
        Ok(Self { pixels })
    }

    /// Build from any decoded image, converting to RGBA8.
    pub fn from_dynamic(img: DynamicImage) -> Result<Self, ImageError> {
        let pixels = img.to_rgba8();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(ImageError::Empty {
                width: pixels.width(),
                height: pixels.height(),
            });
        }
        Ok(Self { pixels })
    }

    /// Create a uniformly coloured image.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::Empty { width, height });
        }
        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, image::Rgba(rgba)),
        })
    }

    /// Decode an image file from disk.
    ///
    /// Read failures surface as [`Error::Io`], unreadable contents as
    /// [`ImageError::Decode`].
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(io) => Error::Io(io),
            other => Error::Image(ImageError::Decode {
                reason: format!("{}: {}", path.display(), other),
            }),
        })?;
        let raster = Self::from_dynamic(img)?;
        tracing::debug!(
            "Loaded raster {}x{} from {}",
            raster.width(),
            raster.height(),
            path.display()
        );
        Ok(raster)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// RGBA components at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x < self.width() && y < self.height() {
            Some(self.pixels.get_pixel(x, y).0)
        } else {
            None
        }
    }

    /// Resample to the given pixel grid with a Lanczos filter.
    ///
    /// Returns a clone when the size already matches.
    pub fn resized_to(&self, width: u32, height: u32) -> RasterImage {
        if width == self.width() && height == self.height() {
            return self.clone();
        }
        let pixels = imageops::resize(&self.pixels, width.max(1), height.max(1), FilterType::Lanczos3);
        Self { pixels }
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }
}
