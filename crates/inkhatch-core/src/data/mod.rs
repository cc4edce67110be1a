//! Data models for the hatching pipeline input.
//!
//! Contains the colour channel model, the physical canvas and the raster
//! image handed over by the hosting application.

mod raster;

pub use raster::RasterImage;

use crate::error::GeometryError;
use crate::units::{mm_to_px, mm_to_px_count};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ink channel
///
/// One colour separation processed independently through intensity
/// extraction and line synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Cyan ink
    Cyan,
    /// Magenta ink
    Magenta,
    /// Yellow ink
    Yellow,
    /// Black (key) ink
    Black,
    /// Single grayscale channel
    Gray,
}

impl Channel {
    /// The four process channels in conventional order.
    pub const CMYK: [Channel; 4] = [
        Channel::Cyan,
        Channel::Magenta,
        Channel::Yellow,
        Channel::Black,
    ];

    /// Short lowercase identifier used in file names and SVG ids.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Cyan => "cyan",
            Self::Magenta => "magenta",
            Self::Yellow => "yellow",
            Self::Black => "black",
            Self::Gray => "gray",
        }
    }

    /// Stroke colour used when rendering this channel.
    pub fn stroke_color(&self) -> &'static str {
        match self {
            Self::Cyan => "#00ffff",
            Self::Magenta => "#ff00ff",
            Self::Yellow => "#ffff00",
            Self::Black => "#000000",
            Self::Gray => "#333333",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cyan => write!(f, "Cyan"),
            Self::Magenta => write!(f, "Magenta"),
            Self::Yellow => write!(f, "Yellow"),
            Self::Black => write!(f, "Black"),
            Self::Gray => write!(f, "Gray"),
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "c" | "cyan" => Ok(Self::Cyan),
            "m" | "magenta" => Ok(Self::Magenta),
            "y" | "yellow" => Ok(Self::Yellow),
            "k" | "black" | "key" => Ok(Self::Black),
            "gray" | "grey" | "grayscale" => Ok(Self::Gray),
            _ => Err(format!("Unknown channel: {}", s)),
        }
    }
}

/// Physical drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    /// Width in millimeters
    pub width_mm: f64,
    /// Height in millimeters
    pub height_mm: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
        }
    }
}

impl Canvas {
    /// Create a canvas, rejecting zero, negative or non-finite sizes.
    pub fn new(width_mm: f64, height_mm: f64) -> Result<Self, GeometryError> {
        let canvas = Self {
            width_mm,
            height_mm,
        };
        canvas.validate()?;
        Ok(canvas)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(self.width_mm) && valid(self.height_mm) {
            Ok(())
        } else {
            Err(GeometryError::InvalidCanvas {
                width_mm: self.width_mm,
                height_mm: self.height_mm,
            })
        }
    }

    /// Canvas size in (fractional) pixels.
    pub fn size_px(&self) -> (f64, f64) {
        (mm_to_px(self.width_mm), mm_to_px(self.height_mm))
    }

    /// Pixel grid the raster is resampled to before extraction.
    pub fn pixel_grid(&self) -> (u32, u32) {
        (mm_to_px_count(self.width_mm), mm_to_px_count(self.height_mm))
    }
}
