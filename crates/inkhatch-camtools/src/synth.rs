//! Variable-density line synthesis
//!
//! Each clipped scan section carries up to `max_lines` parallel sub-lines.
//! Sub-line `i` is drawn wherever `i < ceil(max_lines * intensity)`, so the
//! local number of lines follows the local darkness of the channel.
//! Offset sub-lines are clipped to the canvas, so sections running along
//! an edge never draw off the sheet.

use crate::channels::{IntensityMap, BOX_FILTER_RADIUS};
use crate::scan::{clip_segment_to_rect, ClippedSegment};
use inkhatch_core::{Channel, Point};

/// Inputs for synthesizing one channel, lengths in px.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthSettings {
    /// Maximum number of sub-lines per section
    pub max_lines: u32,
    /// Distance between neighbouring sub-lines (px)
    pub line_spacing: f64,
    /// Canvas width (px), the same rectangle the scan lines were clipped to
    pub width: f64,
    /// Canvas height (px)
    pub height: f64,
}

impl SynthSettings {
    /// Factors taking canvas px to intensity map cells.
    ///
    /// The map grid is the canvas rounded to whole pixels, so this is
    /// within half a pixel of 1.
    fn map_scale(&self, map: &IntensityMap) -> (f64, f64) {
        let scale = |cells: u32, size: f64| {
            if size > 0.0 && size.is_finite() {
                cells as f64 / size
            } else {
                1.0
            }
        };
        (scale(map.width(), self.width), scale(map.height(), self.height))
    }
}

/// A contiguous run of active samples on one sub-line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSegment {
    pub channel: Channel,
    pub section: usize,
    pub sub_line: u32,
    /// Parametric start along the section centerline
    pub t0: f64,
    /// Parametric end along the section centerline
    pub t1: f64,
    pub start: Point,
    pub end: Point,
}

impl RawSegment {
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}

/// Number of sub-lines switched on at `intensity`.
pub fn required_lines(max_lines: u32, intensity: f32) -> u32 {
    if !intensity.is_finite() || intensity <= 0.0 {
        return 0;
    }
    let n = (max_lines as f64 * intensity.min(1.0) as f64).ceil();
    (n as u32).min(max_lines)
}

/// Perpendicular offset of sub-line `index`: 0, +s, -s, +2s, -2s, ...
pub fn subline_offset(index: u32, spacing: f64) -> f64 {
    if index == 0 {
        return 0.0;
    }
    let step = index.div_ceil(2) as f64;
    if index % 2 == 1 {
        step * spacing
    } else {
        -step * spacing
    }
}

/// Number of sampling intervals for a section of `length` px.
pub fn sample_steps(length: f64) -> usize {
    let steps = (length / 2.0).ceil();
    if steps.is_finite() && steps > 0.0 {
        steps as usize
    } else {
        0
    }
}

/// Box-filtered intensity at `steps + 1` evenly spaced points, both ends included.
///
/// Empty for a zero-length segment.
pub fn sample_profile(
    segment: &ClippedSegment,
    map: &IntensityMap,
    settings: &SynthSettings,
) -> Vec<f32> {
    let steps = sample_steps(segment.length());
    if steps == 0 {
        return Vec::new();
    }
    let (sx, sy) = settings.map_scale(map);
    (0..=steps)
        .map(|j| {
            let p = segment.point_at(j as f64 / steps as f64);
            map.box_average(p.x * sx, p.y * sy, BOX_FILTER_RADIUS)
        })
        .collect()
}

/// Turn one clipped section into raw sub-line segments.
///
/// Output is ordered by sub-line, then by position along the section.
pub fn synthesize_segment(
    channel: Channel,
    segment: &ClippedSegment,
    map: &IntensityMap,
    settings: &SynthSettings,
) -> Vec<RawSegment> {
    let profile = sample_profile(segment, map, settings);
    let Some(direction) = (segment.end - segment.start).normalized() else {
        return Vec::new();
    };
    if profile.is_empty() {
        return Vec::new();
    }

    let normal = direction.perpendicular();
    let steps = profile.len() - 1;
    let active: Vec<u32> = profile
        .iter()
        .map(|&v| required_lines(settings.max_lines, v))
        .collect();
    let peak = profile.iter().copied().fold(0.0f32, f32::max);
    let max_lines = required_lines(settings.max_lines, peak);

    let mut out = Vec::new();
    for line_index in 0..max_lines {
        let shift = normal * subline_offset(line_index, settings.line_spacing);
        let mut run_start: Option<usize> = None;
        for j in 0..=steps {
            let on = j < active.len() && line_index < active[j];
            match (on, run_start) {
                (true, None) => run_start = Some(j),
                (false, Some(first)) => {
                    let run = (first, j - 1);
                    out.extend(make_run(channel, segment, settings, line_index, shift, run, steps));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(first) = run_start {
            let run = (first, steps);
            out.extend(make_run(channel, segment, settings, line_index, shift, run, steps));
        }
    }
    out
}

/// Samples `first..=last` of one sub-line, clipped to the canvas.
fn make_run(
    channel: Channel,
    segment: &ClippedSegment,
    settings: &SynthSettings,
    sub_line: u32,
    shift: Point,
    (first, last): (usize, usize),
    steps: usize,
) -> Option<RawSegment> {
    let t0 = first as f64 / steps as f64;
    let t1 = last as f64 / steps as f64;
    let start = segment.point_at(t0) + shift;
    let end = segment.point_at(t1) + shift;
    let (lo, hi) = clip_segment_to_rect(start, end, settings.width, settings.height)?;
    // Clamp away rounding left over from the clip
    let at = |u: f64| {
        let p = start.lerp(&end, u);
        Point::new(p.x.clamp(0.0, settings.width), p.y.clamp(0.0, settings.height))
    };
    Some(RawSegment {
        channel,
        section: segment.section,
        sub_line,
        t0: t0 + (t1 - t0) * lo,
        t1: t0 + (t1 - t0) * hi,
        start: at(lo),
        end: at(hi),
    })
}
