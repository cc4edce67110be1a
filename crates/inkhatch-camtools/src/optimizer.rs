//! Toolpath optimizer
//!
//! Orders plotter segments with a greedy nearest-neighbour walk to cut
//! pen-up travel. Segments may be reversed but are never split.

use crate::consolidate::FilteredSegment;
use inkhatch_core::{px_to_mm, Canvas, Channel, Point};

/// A segment in plotter millimeters (origin bottom-left, Y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolpathSegment {
    pub channel: Channel,
    pub start: Point,
    pub end: Point,
}

impl ToolpathSegment {
    /// Convert a canvas-pixel segment into the plotter frame.
    pub fn from_filtered(segment: &FilteredSegment, canvas: &Canvas) -> Self {
        let to_plotter =
            |p: Point| Point::new(px_to_mm(p.x), canvas.height_mm - px_to_mm(p.y));
        Self {
            channel: segment.channel,
            start: to_plotter(segment.start),
            end: to_plotter(segment.end),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            channel: self.channel,
            start: self.end,
            end: self.start,
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}

/// Segments in plotting order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptimizedPath {
    pub segments: Vec<ToolpathSegment>,
    /// Total pen travel between segments (mm)
    pub travel_distance: f64,
    /// Tool position after the last segment
    pub exit: Point,
}

/// Convert a channel's filtered segments into plotter segments.
pub fn to_toolpath(segments: &[FilteredSegment], canvas: &Canvas) -> Vec<ToolpathSegment> {
    segments
        .iter()
        .map(|s| ToolpathSegment::from_filtered(s, canvas))
        .collect()
}

/// Greedy nearest-neighbour ordering starting at `start`.
///
/// Every step picks the closest endpoint over all remaining segments. Ties
/// go to the lowest input index, and a segment's start wins over its end.
pub fn optimize_path(segments: &[ToolpathSegment], start: Point) -> OptimizedPath {
    let mut visited = vec![false; segments.len()];
    let mut ordered = Vec::with_capacity(segments.len());
    let mut position = start;
    let mut travel = 0.0;

    for _ in 0..segments.len() {
        let mut best: Option<(usize, bool, f64)> = None;
        for (i, seg) in segments.iter().enumerate() {
            if visited[i] {
                continue;
            }
            for (reverse, endpoint) in [(false, seg.start), (true, seg.end)] {
                let d = position.distance_to(&endpoint);
                let better = match best {
                    None => true,
                    Some((_, _, best_d)) => d < best_d,
                };
                if better {
                    best = Some((i, reverse, d));
                }
            }
        }

        let Some((index, reverse, distance)) = best else {
            break;
        };
        visited[index] = true;
        let seg = if reverse {
            segments[index].reversed()
        } else {
            segments[index]
        };
        if distance.is_finite() {
            travel += distance;
        }
        position = seg.end;
        ordered.push(seg);
    }

    OptimizedPath {
        segments: ordered,
        travel_distance: travel,
        exit: position,
    }
}

/// Travel needed to plot `segments` in the given order and orientation.
pub fn travel_distance(segments: &[ToolpathSegment], start: Point) -> f64 {
    let mut position = start;
    let mut total = 0.0;
    for seg in segments {
        total += position.distance_to(&seg.start);
        position = seg.end;
    }
    total
}
