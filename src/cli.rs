//! Command-line driver
//!
//! Loads the image and plot configuration, runs every enabled channel
//! through the scheduler and writes the G-code and SVG files.

use anyhow::{bail, Context, Result};
use clap::Parser;
use inkhatch_camtools::{
    HatchScheduler, PlotExporter, RunOutcome, RunTarget, SchedulerConfig, SchedulerEvent,
};
use inkhatch_core::RasterImage;
use inkhatch_settings::PlotConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")");

/// Turn a raster image into pen-plotter hatching.
#[derive(Debug, Clone, Parser)]
#[command(name = "inkhatch", version, long_version = LONG_VERSION)]
pub struct Cli {
    /// Source image (PNG, JPEG, ...)
    #[arg(required_unless_present = "print_defaults")]
    pub image: Option<PathBuf>,

    /// Plot configuration file (.toml or .json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Canvas width in millimeters
    #[arg(long)]
    pub width_mm: Option<f64>,

    /// Canvas height in millimeters
    #[arg(long)]
    pub height_mm: Option<f64>,

    /// Output directory (default: next to the image)
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Write one G-code/SVG pair per channel
    #[arg(long)]
    pub per_channel: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    pub print_defaults: bool,
}

impl Cli {
    /// Configuration file contents with command-line overrides applied.
    pub fn resolve_config(&self) -> Result<PlotConfig> {
        let mut config = match &self.config {
            Some(path) => PlotConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PlotConfig::default(),
        };
        if let Some(width) = self.width_mm {
            config.canvas.width_mm = width;
        }
        if let Some(height) = self.height_mm {
            config.canvas.height_mm = height;
        }
        if let Some(dir) = &self.out_dir {
            config.export.out_dir = Some(dir.clone());
        }
        config.export.per_channel |= self.per_channel;
        config.validate().context("Invalid plot configuration")?;
        Ok(config)
    }
}

fn output_dir(config: &PlotConfig, image: &Path) -> PathBuf {
    match &config.export.out_dir {
        Some(dir) => dir.clone(),
        None => image
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// Run the command and return the paths written.
pub async fn run(cli: Cli) -> Result<Vec<PathBuf>> {
    if cli.print_defaults {
        print!("{}", PlotConfig::default_toml()?);
        return Ok(Vec::new());
    }
    let Some(image_path) = cli.image.clone() else {
        bail!("No input image given");
    };

    let config = cli.resolve_config()?;
    let image = RasterImage::from_file(&image_path)
        .with_context(|| format!("Failed to load image {}", image_path.display()))?;
    tracing::info!(
        "Hatching {} ({}x{}) onto {}x{}mm",
        image_path.display(),
        image.width(),
        image.height(),
        config.canvas.width_mm,
        config.canvas.height_mm
    );

    let scheduler = HatchScheduler::with_config(
        config.canvas,
        SchedulerConfig {
            debounce: Duration::ZERO,
            ..SchedulerConfig::default()
        },
    )?;
    let mut events = scheduler.subscribe();
    let reporter = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let SchedulerEvent::Progress {
                channel,
                done,
                total,
            } = event
            {
                tracing::debug!("{}: {}/{} sections", channel, done, total);
            }
        }
    });

    scheduler.set_image(Arc::new(image));
    let outcome = scheduler
        .request(RunTarget::All, config.parameters.clone())?
        .wait()
        .await?;
    reporter.abort();

    match outcome {
        RunOutcome::Completed(channels) => {
            tracing::info!("Hatched {} channel(s)", channels.len())
        }
        RunOutcome::Skipped(reason) => bail!("Nothing to plot: {:?}", reason),
        RunOutcome::Cancelled => bail!("Hatching was cancelled"),
    }

    let results = scheduler.snapshot();
    let exporter = PlotExporter::new(
        config.canvas,
        config.parameters.clone(),
        config.export.gcode_options(),
    );
    let dir = output_dir(&config, &image_path);
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plot".to_string());

    let mut written = Vec::new();
    if config.export.per_channel {
        for (channel, output) in exporter.export_per_channel(&results) {
            written.extend(output.write_files(&dir, &format!("{}_{}", stem, channel.key()))?);
        }
    } else {
        let output = exporter.export_combined(&results);
        tracing::info!(
            "{} segments, {:.1}mm drawn, {:.1}mm travel, {} pen lifts",
            output.stats.segments,
            output.stats.drawn_length,
            output.stats.travel_length,
            output.stats.pen_lifts
        );
        written.extend(output.write_files(&dir, &stem)?);
    }
    Ok(written)
}
