//! Channel intensity extraction
//!
//! Decomposes a raster into per-channel ink intensity maps. Each pixel is
//! composited onto white, split into naive CMYK (or inverted luma for the
//! grayscale channel), then white-point and contrast mapped into [0, 1].
//! Channels never interact here.

use crate::params::ChannelTone;
use inkhatch_core::{Canvas, Channel, RasterImage};

/// Neighbourhood radius used when sampling a map along a scan line.
pub const BOX_FILTER_RADIUS: i64 = 3;

/// Dense per-pixel intensity for one channel, values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityMap {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl IntensityMap {
    /// Build a map from row-major values. Values are clamped into [0, 1].
    ///
    /// Returns `None` when `data` does not hold `width * height` values.
    pub fn from_values(width: u32, height: u32, data: Vec<f32>) -> Option<Self> {
        if data.len() != width as usize * height as usize {
            return None;
        }
        let data = data.into_iter().map(clamp_unit).collect();
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// A map with the same value everywhere.
    pub fn uniform(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![clamp_unit(value); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Intensity at `(x, y)`; zero outside the map.
    pub fn get(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0.0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Mean intensity of the square neighbourhood around `(x, y)`.
    ///
    /// The centre is the nearest pixel. Cells outside the map are ignored;
    /// if none is inside, the result is zero.
    pub fn box_average(&self, x: f64, y: f64, radius: i64) -> f32 {
        if !x.is_finite() || !y.is_finite() {
            return 0.0;
        }
        let cx = x.round() as i64;
        let cy = y.round() as i64;
        let x0 = (cx - radius).max(0);
        let x1 = (cx + radius).min(self.width as i64 - 1);
        let y0 = (cy - radius).max(0);
        let y1 = (cy + radius).min(self.height as i64 - 1);
        if x0 > x1 || y0 > y1 {
            return 0.0;
        }

        let mut sum = 0.0f64;
        let mut count = 0u32;
        for py in y0..=y1 {
            let row = py as usize * self.width as usize;
            for px in x0..=x1 {
                sum += self.data[row + px as usize] as f64;
                count += 1;
            }
        }
        (sum / count as f64) as f32
    }

    /// Largest value in the map.
    pub fn max_value(&self) -> f32 {
        self.data.iter().copied().fold(0.0, f32::max)
    }

    pub fn values(&self) -> &[f32] {
        &self.data
    }
}

/// Raw ink amount for one pixel before tone mapping.
pub fn channel_value(rgba: [u8; 4], channel: Channel) -> f64 {
    let alpha = rgba[3] as f64 / 255.0;
    let composite = |c: u8| (c as f64 / 255.0) * alpha + (1.0 - alpha);
    let r = composite(rgba[0]);
    let g = composite(rgba[1]);
    let b = composite(rgba[2]);

    if channel == Channel::Gray {
        return 1.0 - (0.2126 * r + 0.7152 * g + 0.0722 * b);
    }

    let k = 1.0 - r.max(g).max(b);
    if channel == Channel::Black {
        return k;
    }
    if k >= 1.0 {
        return 0.0;
    }
    let component = match channel {
        Channel::Cyan => r,
        Channel::Magenta => g,
        _ => b,
    };
    (1.0 - component - k) / (1.0 - k)
}

/// White-point rescale followed by the contrast curve.
pub fn apply_tone(value: f64, tone: ChannelTone) -> f64 {
    let w = tone.white_point;
    let v = if value <= w {
        0.0
    } else {
        (value - w) / (1.0 - w)
    };
    let v = v.powf(tone.contrast).clamp(0.0, 1.0);
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Extract one channel from an image at its native resolution.
pub fn extract_channel(image: &RasterImage, channel: Channel, tone: ChannelTone) -> IntensityMap {
    let data = image
        .as_rgba()
        .pixels()
        .map(|p| apply_tone(channel_value(p.0, channel), tone) as f32)
        .collect();
    IntensityMap {
        width: image.width(),
        height: image.height(),
        data,
    }
}

/// Resample `image` to the canvas pixel grid, then extract `channel`.
pub fn extract_for_canvas(
    image: &RasterImage,
    canvas: &Canvas,
    channel: Channel,
    tone: ChannelTone,
) -> IntensityMap {
    let (width, height) = canvas.pixel_grid();
    let resized = image.resized_to(width, height);
    tracing::debug!(
        "Extracting {} intensity on {}x{} grid (contrast {}, white point {})",
        channel,
        width,
        height,
        tone.contrast,
        tone.white_point
    );
    extract_channel(&resized, channel, tone)
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
