//! Error handling for InkHatch
//!
//! Provides the error types shared by every layer of the workspace:
//! - Image errors (raster loading and buffer validation)
//! - Geometry errors (canvas validation)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Raster image error type
///
/// Represents errors raised while building a [`crate::RasterImage`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    /// The pixel buffer length does not match the declared dimensions
    #[error("Invalid pixel buffer: expected {expected} bytes, got {actual}")]
    InvalidBuffer {
        /// Expected byte count (`width * height * 4`).
        expected: usize,
        /// Actual byte count supplied.
        actual: usize,
    },

    /// The image has no pixels
    #[error("Empty image: {width}x{height}")]
    Empty {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// The image file could not be decoded
    #[error("Failed to decode image: {reason}")]
    Decode {
        /// The reason decoding failed.
        reason: String,
    },
}

/// Geometry error type
///
/// Represents invalid physical dimensions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Canvas dimensions are zero, negative or not finite
    #[error("Invalid canvas size: {width_mm}mm x {height_mm}mm")]
    InvalidCanvas {
        /// Canvas width in millimeters.
        width_mm: f64,
        /// Canvas height in millimeters.
        height_mm: f64,
    },
}

/// Main error type for InkHatch
///
/// A unified error type that can represent any error from the core layer.
#[derive(Error, Debug)]
pub enum Error {
    /// Raster image error
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is an image error
    pub fn is_image_error(&self) -> bool {
        matches!(self, Error::Image(_))
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_error_display() {
        let err = ImageError::InvalidBuffer {
            expected: 16,
            actual: 12,
        };
        assert_eq!(
            err.to_string(),
            "Invalid pixel buffer: expected 16 bytes, got 12"
        );

        let err = ImageError::Empty {
            width: 0,
            height: 10,
        };
        assert_eq!(err.to_string(), "Empty image: 0x10");
    }

    #[test]
    fn test_geometry_error_display() {
        let err = GeometryError::InvalidCanvas {
            width_mm: -1.0,
            height_mm: 50.0,
        };
        assert_eq!(err.to_string(), "Invalid canvas size: -1mm x 50mm");
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = ImageError::Decode {
            reason: "truncated".to_string(),
        }
        .into();
        assert!(err.is_image_error());
        assert!(!err.is_geometry_error());

        let err: Error = GeometryError::InvalidCanvas {
            width_mm: 0.0,
            height_mm: 1.0,
        }
        .into();
        assert!(err.is_geometry_error());
        assert_eq!(err.to_string(), "Invalid canvas size: 0mm x 1mm");
    }
}
