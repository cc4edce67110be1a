//! InkHatch Settings Crate
//!
//! Loads, validates and saves plot configuration files.

pub mod config;
pub mod error;

pub use config::{ConfigFormat, ExportSettings, PlotConfig};
pub use error::{SettingsError, SettingsResult};
