//! Segment consolidation
//!
//! Closes small gaps between raw runs on the same sub-line, then drops
//! pieces too short to plot. Merging runs first, so two short runs that
//! sit close together can survive the length filter as one stroke.

use crate::synth::RawSegment;
use inkhatch_core::{px_to_mm, Channel, Point};
use serde::{Deserialize, Serialize};

/// Gap closing and length filtering thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsolidateSettings {
    /// Largest gap that is bridged (px)
    pub max_merge_distance: f64,
    /// Shortest segment kept (mm)
    pub min_line_length: f64,
}

/// A plottable hatch segment in canvas pixels (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilteredSegment {
    pub channel: Channel,
    pub section: usize,
    pub sub_line: u32,
    pub start: Point,
    pub end: Point,
}

impl FilteredSegment {
    pub fn length_px(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    pub fn length_mm(&self) -> f64 {
        px_to_mm(self.length_px())
    }
}

/// Join runs of the same sub-line whose gap is at most `max_gap` px.
///
/// Runs are grouped by channel, section and sub-line and walked in order of
/// `t0`. Output keeps that grouping order.
pub fn merge_segments(mut raw: Vec<RawSegment>, max_gap: f64) -> Vec<RawSegment> {
    raw.sort_by(|a, b| {
        (a.channel, a.section, a.sub_line)
            .cmp(&(b.channel, b.section, b.sub_line))
            .then(a.t0.total_cmp(&b.t0))
    });

    let mut merged: Vec<RawSegment> = Vec::with_capacity(raw.len());
    for seg in raw {
        if let Some(last) = merged.last_mut() {
            let same_line = last.channel == seg.channel
                && last.section == seg.section
                && last.sub_line == seg.sub_line;
            if same_line && last.end.distance_to(&seg.start) <= max_gap {
                last.end = seg.end;
                last.t1 = seg.t1;
                continue;
            }
        }
        merged.push(seg);
    }
    merged
}

/// Drop segments shorter than `min_length_mm`, zero-length or non-finite ones.
pub fn filter_short(merged: Vec<RawSegment>, min_length_mm: f64) -> Vec<FilteredSegment> {
    let mut dropped_degenerate = 0usize;
    let kept: Vec<FilteredSegment> = merged
        .into_iter()
        .filter_map(|seg| {
            if !seg.start.is_finite() || !seg.end.is_finite() {
                dropped_degenerate += 1;
                return None;
            }
            let length_mm = px_to_mm(seg.length());
            if length_mm <= 0.0 || length_mm < min_length_mm {
                return None;
            }
            Some(FilteredSegment {
                channel: seg.channel,
                section: seg.section,
                sub_line: seg.sub_line,
                start: seg.start,
                end: seg.end,
            })
        })
        .collect();
    if dropped_degenerate > 0 {
        tracing::warn!("Dropped {} segments with non-finite coordinates", dropped_degenerate);
    }
    kept
}

/// Merge, then filter.
pub fn consolidate(raw: Vec<RawSegment>, settings: &ConsolidateSettings) -> Vec<FilteredSegment> {
    let merged = merge_segments(raw, settings.max_merge_distance);
    filter_short(merged, settings.min_line_length)
}
