//! Synchronous hatching pipeline
//!
//! Runs extraction, scan generation, synthesis and consolidation for one
//! channel or for every enabled channel. The async scheduler drives the
//! same steps batch by batch.

use crate::channels::{extract_channel, IntensityMap};
use crate::consolidate::{consolidate, ConsolidateSettings, FilteredSegment};
use crate::error::HatchResult;
use crate::params::Parameters;
use crate::scan::{generate_scan_lines, ClippedSegment, ScanSettings};
use crate::synth::{synthesize_segment, RawSegment, SynthSettings};
use inkhatch_core::{mm_to_px, Canvas, Channel, ProgressCallback, RasterImage};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Sections processed between progress reports and cooperative yields.
pub const BATCH_SIZE: usize = 50;

/// Published output for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelResult {
    pub channel: Channel,
    pub segments: Vec<FilteredSegment>,
    /// Number of scan sections that crossed the canvas
    pub sections: usize,
    /// Raw runs before consolidation
    pub raw_segments: usize,
}

/// One run's worth of inputs: canvas, parameters and the resampled raster.
#[derive(Debug, Clone)]
pub struct HatchPipeline {
    canvas: Canvas,
    params: Parameters,
    raster: Arc<RasterImage>,
}

impl HatchPipeline {
    /// Validate inputs and resample `image` to the canvas pixel grid.
    pub fn new(image: &RasterImage, canvas: Canvas, params: Parameters) -> HatchResult<Self> {
        canvas.validate()?;
        params.validate()?;
        let (width, height) = canvas.pixel_grid();
        Ok(Self {
            canvas,
            params,
            raster: Arc::new(image.resized_to(width, height)),
        })
    }

    /// Reuse a raster that is already on the canvas grid.
    ///
    /// Falls back to resampling when the size does not match.
    pub fn with_raster(
        raster: Arc<RasterImage>,
        canvas: Canvas,
        params: Parameters,
    ) -> HatchResult<Self> {
        canvas.validate()?;
        params.validate()?;
        let (width, height) = canvas.pixel_grid();
        let raster = if raster.width() == width && raster.height() == height {
            raster
        } else {
            Arc::new(raster.resized_to(width, height))
        };
        Ok(Self {
            canvas,
            params,
            raster,
        })
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn raster(&self) -> &Arc<RasterImage> {
        &self.raster
    }

    pub fn intensity_map(&self, channel: Channel) -> IntensityMap {
        extract_channel(&self.raster, channel, self.params.tone_for(channel))
    }

    pub fn scan_settings(&self, channel: Channel) -> ScanSettings {
        let (width, height) = self.canvas.size_px();
        ScanSettings {
            width,
            height,
            angle_deg: self.params.line_angle,
            section_width: mm_to_px(self.params.section_width),
            channel_count: self.params.enabled_channels.len(),
            channel_index: self.params.channel_index(channel).unwrap_or(0),
            line_spacing: mm_to_px(self.params.line_spacing),
        }
    }

    pub fn synth_settings(&self) -> SynthSettings {
        let (width, height) = self.canvas.size_px();
        SynthSettings {
            max_lines: self.params.max_lines_per_channel,
            line_spacing: mm_to_px(self.params.line_spacing),
            width,
            height,
        }
    }

    pub fn consolidate_settings(&self) -> ConsolidateSettings {
        ConsolidateSettings {
            max_merge_distance: mm_to_px(self.params.max_merge_distance),
            min_line_length: self.params.min_line_length,
        }
    }

    pub fn scan_lines(&self, channel: Channel) -> Vec<ClippedSegment> {
        generate_scan_lines(&self.scan_settings(channel))
    }

    /// Raw runs for a batch of sections.
    pub fn synthesize_batch(
        &self,
        channel: Channel,
        sections: &[ClippedSegment],
        map: &IntensityMap,
    ) -> Vec<RawSegment> {
        let settings = self.synth_settings();
        sections
            .iter()
            .flat_map(|s| synthesize_segment(channel, s, map, &settings))
            .collect()
    }

    /// Merge and filter the raw runs of a finished channel.
    pub fn finish_channel(
        &self,
        channel: Channel,
        sections: usize,
        raw: Vec<RawSegment>,
    ) -> ChannelResult {
        let raw_segments = raw.len();
        let segments = consolidate(raw, &self.consolidate_settings());
        ChannelResult {
            channel,
            segments,
            sections,
            raw_segments,
        }
    }

    /// Run one channel start to finish.
    pub fn run_channel(&self, channel: Channel, progress: Option<&ProgressCallback>) -> ChannelResult {
        let map = self.intensity_map(channel);
        self.run_channel_with_map(channel, &map, progress)
    }

    /// Run one channel with a precomputed intensity map.
    pub fn run_channel_with_map(
        &self,
        channel: Channel,
        map: &IntensityMap,
        progress: Option<&ProgressCallback>,
    ) -> ChannelResult {
        let started = Instant::now();
        let lines = self.scan_lines(channel);
        let total = lines.len() as u64;
        let mut raw = Vec::new();
        let mut done = 0u64;

        for batch in lines.chunks(BATCH_SIZE) {
            raw.extend(self.synthesize_batch(channel, batch, map));
            done += batch.len() as u64;
            if let Some(cb) = progress {
                cb(done, total);
            }
        }

        let result = self.finish_channel(channel, lines.len(), raw);
        tracing::info!(
            "{}: {} sections, {} raw runs, {} segments in {:?}",
            channel,
            result.sections,
            result.raw_segments,
            result.segments.len(),
            started.elapsed()
        );
        result
    }

    /// Run every enabled channel in order.
    pub fn run_all(&self, progress: Option<&ProgressCallback>) -> BTreeMap<Channel, ChannelResult> {
        self.params
            .enabled_channels
            .iter()
            .map(|&channel| (channel, self.run_channel(channel, progress)))
            .collect()
    }
}
