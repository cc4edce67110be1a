//! Motion program emission
//!
//! Turns an ordered toolpath into pen plotter motion. Short hops between
//! segments keep the pen down and draw a connecting drag line; longer ones
//! lift the pen. The same decisions are recorded as strokes so the vector
//! preview matches what the machine draws.

use crate::optimizer::OptimizedPath;
use crate::params::Parameters;
use inkhatch_core::units::format_coord;
use inkhatch_core::{Channel, Point};

/// Positions closer than this (mm) count as the same point.
const POSITION_EPSILON: f64 = 1e-6;

/// Abstract pen plotter command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCommand {
    LiftPen,
    TravelTo(Point),
    LowerPen,
    DrawTo(Point),
}

/// A line the pen actually puts on paper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub start: Point,
    pub end: Point,
    /// True for connecting lines drawn instead of lifting the pen
    pub drag: bool,
}

/// Machine settings that shape the motion program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineSettings {
    /// Drawing feed rate (mm/min)
    pub feed_rate: f64,
    /// Z with the pen on the paper
    pub pen_down_z: f64,
    /// Z with the pen lifted
    pub pen_up_z: f64,
    /// Hops up to this length are dragged instead of lifted (mm)
    pub prevent_zhop_distance: f64,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self::from(&Parameters::default())
    }
}

impl From<&Parameters> for MachineSettings {
    fn from(params: &Parameters) -> Self {
        Self {
            feed_rate: params.feed_rate,
            pen_down_z: params.pen_down_z,
            pen_up_z: params.pen_up_z,
            prevent_zhop_distance: params.prevent_zhop_distance,
        }
    }
}

/// Summary figures for a program or a channel block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgramStats {
    pub segments: usize,
    /// Length of hatch strokes (mm)
    pub drawn_length: f64,
    /// Pen-up travel (mm)
    pub travel_length: f64,
    /// Length of drag lines (mm)
    pub drag_length: f64,
    pub pen_lifts: usize,
    pub drag_count: usize,
}

impl ProgramStats {
    /// Pen-down time at `feed_rate` mm/min, in minutes.
    pub fn estimated_minutes(&self, feed_rate: f64) -> f64 {
        if feed_rate > 0.0 {
            (self.drawn_length + self.drag_length) / feed_rate
        } else {
            0.0
        }
    }

    fn accumulate(&mut self, other: &ProgramStats) {
        self.segments += other.segments;
        self.drawn_length += other.drawn_length;
        self.travel_length += other.travel_length;
        self.drag_length += other.drag_length;
        self.pen_lifts += other.pen_lifts;
        self.drag_count += other.drag_count;
    }
}

/// Motion for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelProgram {
    pub channel: Channel,
    pub commands: Vec<MotionCommand>,
    pub strokes: Vec<Stroke>,
    pub stats: ProgramStats,
    /// Tool position after the final command
    pub exit: Point,
}

/// One or more channel blocks in plotting order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MotionProgram {
    pub blocks: Vec<ChannelProgram>,
}

impl MotionProgram {
    pub fn stats(&self) -> ProgramStats {
        let mut total = ProgramStats::default();
        for block in &self.blocks {
            total.accumulate(&block.stats);
        }
        total
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.blocks.iter().map(|b| b.channel).collect()
    }
}

/// Pen state machine driving command emission.
#[derive(Debug, Clone, Copy)]
pub struct MotionEmitter {
    settings: MachineSettings,
}

impl MotionEmitter {
    pub fn new(settings: MachineSettings) -> Self {
        Self { settings }
    }

    /// Emit commands for `path`, starting pen-up at `start`.
    pub fn emit(&self, channel: Channel, path: &OptimizedPath, start: Point) -> ChannelProgram {
        let mut commands = Vec::new();
        let mut strokes = Vec::new();
        let mut stats = ProgramStats::default();
        let mut position = start;
        let mut pen_down = false;

        for seg in &path.segments {
            if !seg.start.is_finite() || !seg.end.is_finite() {
                tracing::warn!("Skipping {} segment with non-finite coordinates", channel);
                continue;
            }

            let hop = position.distance_to(&seg.start);
            if hop > POSITION_EPSILON {
                if pen_down && hop > self.settings.prevent_zhop_distance {
                    commands.push(MotionCommand::LiftPen);
                    stats.pen_lifts += 1;
                    pen_down = false;
                }
                if pen_down {
                    commands.push(MotionCommand::DrawTo(seg.start));
                    strokes.push(Stroke {
                        start: position,
                        end: seg.start,
                        drag: true,
                    });
                    stats.drag_count += 1;
                    stats.drag_length += hop;
                } else {
                    commands.push(MotionCommand::TravelTo(seg.start));
                    stats.travel_length += hop;
                }
            }

            if !pen_down {
                commands.push(MotionCommand::LowerPen);
                pen_down = true;
            }
            commands.push(MotionCommand::DrawTo(seg.end));
            strokes.push(Stroke {
                start: seg.start,
                end: seg.end,
                drag: false,
            });
            stats.segments += 1;
            stats.drawn_length += seg.length();
            position = seg.end;
        }

        if pen_down {
            commands.push(MotionCommand::LiftPen);
            stats.pen_lifts += 1;
        }

        ChannelProgram {
            channel,
            commands,
            strokes,
            stats,
            exit: position,
        }
    }
}

/// G-code rendering options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GcodeOptions {
    /// Write a generation timestamp in the header
    pub include_timestamp: bool,
    /// Insert an `M0` pause between channel blocks
    pub pause_between_channels: bool,
}

impl Default for GcodeOptions {
    fn default() -> Self {
        Self {
            include_timestamp: true,
            pause_between_channels: true,
        }
    }
}

/// Renders a [`MotionProgram`] as G-code text.
#[derive(Debug, Clone, Copy)]
pub struct GcodeWriter {
    settings: MachineSettings,
    options: GcodeOptions,
}

impl GcodeWriter {
    pub fn new(settings: MachineSettings, options: GcodeOptions) -> Self {
        Self { settings, options }
    }

    pub fn write(&self, program: &MotionProgram) -> String {
        let mut gcode = String::new();
        let stats = program.stats();
        let feed = format!("{:.0}", self.settings.feed_rate);
        let pen_up = format_coord(self.settings.pen_up_z);
        let pen_down = format_coord(self.settings.pen_down_z);

        gcode.push_str("; InkHatch pen plotter G-code\n");
        if self.options.include_timestamp {
            gcode.push_str(&format!(
                "; Generated: {}\n",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        let channel_names: Vec<String> =
            program.channels().iter().map(|c| c.to_string()).collect();
        gcode.push_str(&format!("; Channels: {}\n", channel_names.join(", ")));
        gcode.push_str(&format!("; Segments: {}\n", stats.segments));
        gcode.push_str(&format!("; Drawn length: {:.1}mm\n", stats.drawn_length));
        gcode.push_str(&format!("; Travel length: {:.1}mm\n", stats.travel_length));
        gcode.push_str(&format!(
            "; Pen lifts: {}, drag lines: {}\n",
            stats.pen_lifts, stats.drag_count
        ));
        gcode.push_str(&format!("; Feed rate: {} mm/min\n", feed));
        gcode.push_str(&format!(
            "; Estimated time: {:.1} minutes\n",
            stats.estimated_minutes(self.settings.feed_rate)
        ));
        gcode.push_str(";\n");

        gcode.push_str("G21 ; Set units to millimeters\n");
        gcode.push_str("G90 ; Absolute positioning\n");
        gcode.push_str(&format!("G0 Z{} ; Pen up\n", pen_up));

        for (i, block) in program.blocks.iter().enumerate() {
            if i > 0 && self.options.pause_between_channels {
                gcode.push_str(&format!("M0 ; Change pen for {}\n", block.channel));
            }
            gcode.push('\n');
            gcode.push_str(&format!(
                "; Channel: {} ({} segments, {:.1}mm)\n",
                block.channel, block.stats.segments, block.stats.drawn_length
            ));
            for cmd in &block.commands {
                match cmd {
                    MotionCommand::LiftPen => {
                        gcode.push_str(&format!("G0 Z{}\n", pen_up));
                    }
                    MotionCommand::TravelTo(p) => {
                        gcode.push_str(&format!(
                            "G0 X{} Y{}\n",
                            format_coord(p.x),
                            format_coord(p.y)
                        ));
                    }
                    MotionCommand::LowerPen => {
                        gcode.push_str(&format!("G1 Z{} F{}\n", pen_down, feed));
                    }
                    MotionCommand::DrawTo(p) => {
                        gcode.push_str(&format!(
                            "G1 X{} Y{} F{}\n",
                            format_coord(p.x),
                            format_coord(p.y),
                            feed
                        ));
                    }
                }
            }
        }

        gcode.push_str("\n; End of plot\n");
        gcode.push_str(&format!("G0 Z{} ; Pen up\n", pen_up));
        gcode.push_str("G0 X0 Y0 ; Return to origin\n");
        gcode.push_str("M2 ; End program\n");
        gcode
    }
}
