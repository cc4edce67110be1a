//! Hatching parameters
//!
//! One immutable [`Parameters`] value describes a complete run: tone
//! mapping, hatch geometry, segment cleanup and the pen plotter machine.
//! All lengths are in millimeters and the hatch angle is in degrees.

use crate::error::{ParameterError, ParameterResult};
use inkhatch_core::Channel;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Upper bound on sub-lines per scan section.
pub const MAX_LINES_LIMIT: u32 = 64;

/// Smallest accepted distance between scan centerlines (mm).
pub const MIN_SECTION_WIDTH_MM: f64 = 0.05;

/// Tone mapping applied to one channel during extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelTone {
    /// Contrast exponent (gamma)
    pub contrast: f64,
    /// Values at or below this level map to zero
    pub white_point: f64,
}

impl Default for ChannelTone {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            white_point: 0.0,
        }
    }
}

/// Hatching parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Pen tip diameter, used as SVG stroke width (mm)
    pub pen_diameter: f64,
    /// Hatch angle, shared by all channels (degrees)
    pub line_angle: f64,
    /// Distance between scan centerlines (mm)
    pub section_width: f64,
    /// Distance between parallel sub-lines of one section (mm)
    pub line_spacing: f64,
    /// Segments shorter than this are dropped (mm)
    pub min_line_length: f64,
    /// Contrast exponent applied to every channel
    pub contrast: f64,
    /// Gaps up to this length are closed when merging (mm)
    pub max_merge_distance: f64,
    /// Maximum number of sub-lines per section
    pub max_lines_per_channel: u32,
    /// Per-channel white point in [0, 1); missing channels use 0
    pub white_point: BTreeMap<Channel, f64>,
    /// Drawing feed rate (mm/min)
    pub feed_rate: f64,
    /// Z height with the pen touching the paper (mm)
    pub pen_down_z: f64,
    /// Z height with the pen lifted (mm)
    pub pen_up_z: f64,
    /// Travel moves up to this length keep the pen down (mm)
    pub prevent_zhop_distance: f64,
    /// Channels to process
    pub enabled_channels: Vec<Channel>,
    /// Stacking order, top-most channel first
    pub channel_order: Vec<Channel>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            pen_diameter: 0.3,
            line_angle: 45.0,
            section_width: 5.0,
            line_spacing: 0.4,
            min_line_length: 1.0,
            contrast: 1.0,
            max_merge_distance: 0.5,
            max_lines_per_channel: 5,
            white_point: BTreeMap::new(),
            feed_rate: 1500.0,
            pen_down_z: 0.0,
            pen_up_z: 3.0,
            prevent_zhop_distance: 2.0,
            enabled_channels: Channel::CMYK.to_vec(),
            channel_order: vec![
                Channel::Black,
                Channel::Cyan,
                Channel::Magenta,
                Channel::Yellow,
            ],
        }
    }
}

impl Parameters {
    /// Parameters for a single grayscale channel.
    pub fn grayscale() -> Self {
        Self {
            enabled_channels: vec![Channel::Gray],
            channel_order: vec![Channel::Gray],
            ..Self::default()
        }
    }

    /// Check every value against its accepted range.
    pub fn validate(&self) -> ParameterResult<()> {
        check_range("pen_diameter", self.pen_diameter, 0.01, 10.0)?;
        if !self.line_angle.is_finite() {
            return Err(ParameterError::invalid("line_angle", "must be finite"));
        }
        check_range(
            "section_width",
            self.section_width,
            MIN_SECTION_WIDTH_MM,
            1000.0,
        )?;
        check_range("line_spacing", self.line_spacing, 0.0, 100.0)?;
        check_range("min_line_length", self.min_line_length, 0.0, 1000.0)?;
        check_range("contrast", self.contrast, 0.05, 20.0)?;
        check_range("max_merge_distance", self.max_merge_distance, 0.0, 1000.0)?;
        if self.max_lines_per_channel == 0 || self.max_lines_per_channel > MAX_LINES_LIMIT {
            return Err(ParameterError::out_of_range(
                "max_lines_per_channel",
                self.max_lines_per_channel as f64,
                1.0,
                MAX_LINES_LIMIT as f64,
            ));
        }
        for (channel, &w) in &self.white_point {
            if !(w.is_finite() && (0.0..1.0).contains(&w)) {
                return Err(ParameterError::out_of_range(
                    &format!("white_point.{}", channel.key()),
                    w,
                    0.0,
                    1.0,
                ));
            }
        }
        check_range("feed_rate", self.feed_rate, 1.0, 100_000.0)?;
        check_range("pen_down_z", self.pen_down_z, -100.0, 100.0)?;
        check_range("pen_up_z", self.pen_up_z, -100.0, 100.0)?;
        if self.pen_up_z <= self.pen_down_z {
            return Err(ParameterError::Incompatible(format!(
                "pen_up_z ({}) must be above pen_down_z ({})",
                self.pen_up_z, self.pen_down_z
            )));
        }
        check_range(
            "prevent_zhop_distance",
            self.prevent_zhop_distance,
            0.0,
            1000.0,
        )?;
        check_unique("enabled_channels", &self.enabled_channels)?;
        check_unique("channel_order", &self.channel_order)?;
        let has_gray = self.enabled_channels.contains(&Channel::Gray);
        if has_gray && self.enabled_channels.len() > 1 {
            return Err(ParameterError::Incompatible(
                "gray cannot be combined with CMYK channels".to_string(),
            ));
        }
        Ok(())
    }

    /// White point for `channel`, defaulting to zero.
    pub fn white_point_for(&self, channel: Channel) -> f64 {
        self.white_point.get(&channel).copied().unwrap_or(0.0)
    }

    pub fn tone_for(&self, channel: Channel) -> ChannelTone {
        ChannelTone {
            contrast: self.contrast,
            white_point: self.white_point_for(channel),
        }
    }

    /// Position of `channel` among the enabled channels.
    pub fn channel_index(&self, channel: Channel) -> Option<usize> {
        self.enabled_channels.iter().position(|&c| c == channel)
    }

    /// Order in which enabled channels are plotted.
    ///
    /// The reverse of `channel_order`, so the top-most channel is drawn
    /// last. Enabled channels missing from `channel_order` go first.
    pub fn plot_order(&self) -> Vec<Channel> {
        let mut order: Vec<Channel> = self
            .enabled_channels
            .iter()
            .copied()
            .filter(|c| !self.channel_order.contains(c))
            .collect();
        order.extend(
            self.channel_order
                .iter()
                .rev()
                .copied()
                .filter(|c| self.enabled_channels.contains(c)),
        );
        order
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> ParameterResult<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ParameterError::out_of_range(name, value, min, max))
    }
}

fn check_unique(name: &str, channels: &[Channel]) -> ParameterResult<()> {
    let mut seen = BTreeSet::new();
    for channel in channels {
        if !seen.insert(*channel) {
            return Err(ParameterError::invalid(
                name,
                format!("{} is listed more than once", channel),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_valid() {
        assert!(Parameters::default().validate().is_ok());
        assert!(Parameters::grayscale().validate().is_ok());
    }

    #[test]
    fn test_white_point_range() {
        let mut params = Parameters::default();
        params.white_point.insert(Channel::Cyan, 1.0);
        let err = params.validate().unwrap_err();
        assert!(matches!(err, ParameterError::OutOfRange { ref name, .. } if name == "white_point.cyan"));

        params.white_point.insert(Channel::Cyan, 0.2);
        assert!(params.validate().is_ok());
        assert_eq!(params.white_point_for(Channel::Cyan), 0.2);
        assert_eq!(params.white_point_for(Channel::Black), 0.0);
    }

    #[test]
    fn test_resource_bounds() {
        let params = Parameters {
            max_lines_per_channel: 65,
            ..Parameters::default()
        };
        assert!(params.validate().is_err());

        let params = Parameters {
            max_lines_per_channel: 0,
            ..Parameters::default()
        };
        assert!(params.validate().is_err());

        let params = Parameters {
            section_width: 0.01,
            ..Parameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_negative_spacing_rejected() {
        let params = Parameters {
            line_spacing: -0.1,
            ..Parameters::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParameterError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_pen_heights_incompatible() {
        let params = Parameters {
            pen_up_z: 0.0,
            pen_down_z: 1.0,
            ..Parameters::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParameterError::Incompatible(_))
        ));
    }

    #[test]
    fn test_duplicate_and_mixed_channels() {
        let params = Parameters {
            enabled_channels: vec![Channel::Cyan, Channel::Cyan],
            ..Parameters::default()
        };
        assert!(params.validate().is_err());

        let params = Parameters {
            enabled_channels: vec![Channel::Gray, Channel::Black],
            ..Parameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_plot_order() {
        let params = Parameters::default();
        assert_eq!(
            params.plot_order(),
            vec![
                Channel::Yellow,
                Channel::Magenta,
                Channel::Cyan,
                Channel::Black
            ]
        );

        let params = Parameters {
            enabled_channels: vec![Channel::Cyan, Channel::Black],
            channel_order: vec![Channel::Cyan],
            ..Parameters::default()
        };
        assert_eq!(params.plot_order(), vec![Channel::Black, Channel::Cyan]);
        assert_eq!(params.channel_index(Channel::Black), Some(1));
        assert_eq!(params.channel_index(Channel::Yellow), None);
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let params: Parameters =
            serde_json::from_str(r#"{"line_angle": 30.0, "white_point": {"black": 0.1}}"#)
                .unwrap();
        assert_eq!(params.line_angle, 30.0);
        assert_eq!(params.section_width, 5.0);
        assert_eq!(params.white_point_for(Channel::Black), 0.1);
    }
}
