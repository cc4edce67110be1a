//! # InkHatch
//!
//! Turns raster images into multi-channel pen-plotter hatching. Each CMYK
//! (or grayscale) channel becomes rows of parallel lines whose local count
//! follows the ink density, emitted as G-code and as an SVG preview.
//!
//! ## Architecture
//!
//! 1. **inkhatch-core** - Raster and canvas types, units, shared aliases
//! 2. **inkhatch-camtools** - Hatching pipeline, path ordering, G-code/SVG output, scheduler
//! 3. **inkhatch-settings** - Plot configuration files
//! 4. **inkhatch** - Command-line driver

pub mod cli;

pub use cli::{run, Cli};

pub use inkhatch_camtools::{
    ChannelResult, GcodeOptions, HatchPipeline, HatchScheduler, Parameters, PlotExporter,
    PlotOutput, RunOutcome, RunTarget, SchedulerConfig,
};
pub use inkhatch_core::{Canvas, Channel, RasterImage};
pub use inkhatch_settings::{ExportSettings, PlotConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Logs to stderr at INFO unless `RUST_LOG` says otherwise, leaving stdout
/// free for `--print-defaults`.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
