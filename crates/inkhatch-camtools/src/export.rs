//! Plot export
//!
//! Builds motion programs from published channel results and renders them
//! as G-code plus a matching SVG. Combined export plots channels bottom-most
//! first and carries the pen position from one channel block to the next.

use crate::motion::{
    GcodeOptions, GcodeWriter, MachineSettings, MotionEmitter, MotionProgram, ProgramStats,
};
use crate::optimizer::{optimize_path, to_toolpath};
use crate::params::Parameters;
use crate::pipeline::ChannelResult;
use crate::vector::SvgWriter;
use anyhow::{Context, Result};
use inkhatch_core::{Canvas, Channel, Point};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Rendered output for one program.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOutput {
    pub gcode: String,
    pub svg: String,
    pub stats: ProgramStats,
}

impl PlotOutput {
    /// Write `<stem>.gcode` and `<stem>.svg` into `dir`.
    pub fn write_files(&self, dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        let gcode_path = dir.join(format!("{}.gcode", stem));
        let svg_path = dir.join(format!("{}.svg", stem));
        std::fs::write(&gcode_path, &self.gcode)
            .with_context(|| format!("Failed to write {}", gcode_path.display()))?;
        std::fs::write(&svg_path, &self.svg)
            .with_context(|| format!("Failed to write {}", svg_path.display()))?;
        tracing::info!(
            "Wrote {} and {}",
            gcode_path.display(),
            svg_path.display()
        );
        Ok(vec![gcode_path, svg_path])
    }
}

/// Turns channel results into plotter programs.
#[derive(Debug, Clone)]
pub struct PlotExporter {
    canvas: Canvas,
    params: Parameters,
    options: GcodeOptions,
    origin: Point,
}

impl PlotExporter {
    pub fn new(canvas: Canvas, params: Parameters, options: GcodeOptions) -> Self {
        Self {
            canvas,
            params,
            options,
            origin: Point::default(),
        }
    }

    /// Tool position at program start (default: machine origin).
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    fn machine(&self) -> MachineSettings {
        MachineSettings::from(&self.params)
    }

    /// Motion for `channels` in the given order, chained by tool position.
    pub fn build_program(
        &self,
        results: &BTreeMap<Channel, ChannelResult>,
        channels: &[Channel],
    ) -> MotionProgram {
        let emitter = MotionEmitter::new(self.machine());
        let mut position = self.origin;
        let mut blocks = Vec::new();
        for channel in channels {
            let Some(result) = results.get(channel) else {
                continue;
            };
            let toolpath = to_toolpath(&result.segments, &self.canvas);
            let path = optimize_path(&toolpath, position);
            let block = emitter.emit(*channel, &path, position);
            tracing::debug!(
                "{}: {} segments, {:.1}mm travel after ordering",
                channel,
                block.stats.segments,
                path.travel_distance
            );
            position = block.exit;
            blocks.push(block);
        }
        MotionProgram { blocks }
    }

    fn render(&self, program: &MotionProgram) -> PlotOutput {
        let gcode = GcodeWriter::new(self.machine(), self.options).write(program);
        let svg = SvgWriter::new(self.canvas, self.params.pen_diameter).write_program(program);
        PlotOutput {
            gcode,
            svg,
            stats: program.stats(),
        }
    }

    /// Every published channel in one program, top-most channel plotted last.
    pub fn export_combined(&self, results: &BTreeMap<Channel, ChannelResult>) -> PlotOutput {
        let program = self.build_program(results, &self.params.plot_order());
        self.render(&program)
    }

    /// An independent program per published channel, in plotting order.
    pub fn export_per_channel(
        &self,
        results: &BTreeMap<Channel, ChannelResult>,
    ) -> Vec<(Channel, PlotOutput)> {
        self.params
            .plot_order()
            .into_iter()
            .filter(|c| results.contains_key(c))
            .map(|channel| {
                let program = self.build_program(results, &[channel]);
                (channel, self.render(&program))
            })
            .collect()
    }

    /// Quick SVG straight from the segments, in plotting order.
    pub fn preview_svg(&self, results: &BTreeMap<Channel, ChannelResult>) -> String {
        let layers: Vec<(Channel, &[_])> = self
            .params
            .plot_order()
            .into_iter()
            .filter_map(|c| results.get(&c).map(|r| (c, r.segments.as_slice())))
            .collect();
        SvgWriter::new(self.canvas, self.params.pen_diameter).write_preview(&layers)
    }
}
