//! Plot configuration files
//!
//! A [`PlotConfig`] bundles the canvas size, the hatching parameters and the
//! export options. Files are JSON or TOML, chosen by extension. Every section
//! and every field is optional; missing values take their defaults.

use crate::error::{SettingsError, SettingsResult};
use inkhatch_camtools::{GcodeOptions, Parameters};
use inkhatch_core::Canvas;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supported on-disk formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> SettingsResult<Self> {
        if path.extension().is_some_and(|ext| ext == "json") {
            Ok(Self::Json)
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            Ok(Self::Toml)
        } else {
            Err(SettingsError::UnsupportedFormat(
                path.extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "(none)".to_string()),
            ))
        }
    }
}

/// Output options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// One program per channel instead of a combined one
    pub per_channel: bool,
    /// Insert an M0 pause between channel blocks
    pub pause_between_channels: bool,
    /// Stamp the generation time into the G-code header
    pub include_timestamp: bool,
    /// Output directory; the image's directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            per_channel: false,
            pause_between_channels: true,
            include_timestamp: true,
            out_dir: None,
        }
    }
}

impl ExportSettings {
    pub fn gcode_options(&self) -> GcodeOptions {
        GcodeOptions {
            include_timestamp: self.include_timestamp,
            pause_between_channels: self.pause_between_channels,
        }
    }
}

/// Complete plot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlotConfig {
    /// Drawing surface
    pub canvas: Canvas,
    /// Hatching and machine parameters
    pub parameters: Parameters,
    /// Output options
    pub export: ExportSettings,
}

impl PlotConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content, format)?;
        tracing::debug!("Loaded plot config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate config text.
    pub fn parse(content: &str, format: ConfigFormat) -> SettingsResult<Self> {
        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content).map_err(|e| {
            SettingsError::SaveError(format!("{}: {}", path.display(), e))
        })?;
        tracing::debug!("Saved plot config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        self.canvas.validate()?;
        self.parameters.validate()?;

        if self
            .export
            .out_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(SettingsError::InvalidSetting {
                key: "export.out_dir".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Defaults rendered as a TOML document.
    pub fn default_toml() -> SettingsResult<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }
}
