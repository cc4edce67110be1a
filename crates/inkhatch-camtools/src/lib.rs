//! # InkHatch Hatching Engine
//!
//! Converts a raster image into variable-density pen plotter hatching,
//! split across ink channels, and compiles it into travel-optimized
//! G-code with a matching SVG drawing.
//!
//! ## Pipeline
//!
//! - **Channels**: per-channel intensity maps with contrast and white point
//! - **Scan**: rotated scan centerlines clipped to the canvas
//! - **Synth**: intensity-driven sub-lines along each scan section
//! - **Consolidate**: gap merging and minimum-length filtering
//! - **Optimizer**: greedy nearest-neighbour segment ordering
//! - **Motion / Vector**: pen state machine, G-code and SVG output
//!
//! ## Execution
//!
//! - **Pipeline**: synchronous per-channel runs with progress reporting
//! - **Scheduler**: debounced, cancellable, batched runs on tokio
//! - **Export**: combined and per-channel plot programs

pub mod channels;
pub mod consolidate;
pub mod error;
pub mod export;
pub mod motion;
pub mod optimizer;
pub mod params;
pub mod pipeline;
pub mod scan;
pub mod scheduler;
pub mod synth;
pub mod vector;

// Re-export commonly used items
pub use channels::{extract_channel, extract_for_canvas, IntensityMap};
pub use consolidate::{consolidate, ConsolidateSettings, FilteredSegment};
pub use error::{HatchError, HatchResult, ParameterError, ParameterResult};
pub use export::{PlotExporter, PlotOutput};
pub use motion::{
    ChannelProgram, GcodeOptions, GcodeWriter, MachineSettings, MotionCommand, MotionEmitter,
    MotionProgram, ProgramStats, Stroke,
};
pub use optimizer::{optimize_path, travel_distance, OptimizedPath, ToolpathSegment};
pub use params::{ChannelTone, Parameters};
pub use pipeline::{ChannelResult, HatchPipeline};
pub use scan::{
    clip_line_to_rect, clip_segment_to_rect, generate_scan_lines, ClippedSegment, ScanSettings,
};
pub use scheduler::{
    CancellationToken, HatchScheduler, HatchSnapshot, RunOutcome, RunTarget, RunTicket,
    SchedulerConfig, SchedulerEvent, SkipReason,
};
pub use synth::{required_lines, subline_offset, synthesize_segment, RawSegment, SynthSettings};
pub use vector::SvgWriter;
