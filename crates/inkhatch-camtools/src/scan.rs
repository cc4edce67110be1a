//! Scan geometry
//!
//! Generates the rotated, evenly spaced scan centerlines that carry the
//! hatch and clips them against the canvas rectangle. Coordinates are
//! canvas pixels with the origin at the top-left corner.

use inkhatch_core::Point;

/// Hits closer than this (px) are treated as the same boundary point.
const DUPLICATE_TOLERANCE: f64 = 0.1;

/// Slack allowed when testing whether a hit lies on an edge.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Inputs for one channel's scan line set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanSettings {
    /// Canvas width (px)
    pub width: f64,
    /// Canvas height (px)
    pub height: f64,
    /// Hatch angle (degrees)
    pub angle_deg: f64,
    /// Distance between centerlines (px)
    pub section_width: f64,
    /// Number of enabled channels
    pub channel_count: usize,
    /// Index of this channel among the enabled ones
    pub channel_index: usize,
    /// Sub-line spacing, used for channel interleaving (px)
    pub line_spacing: f64,
}

/// A scan centerline clipped to the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippedSegment {
    /// Index of the section in the full (unclipped) line set
    pub section: usize,
    pub start: Point,
    pub end: Point,
}

impl ClippedSegment {
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// Point at parameter `t` in [0, 1] along the segment.
    pub fn point_at(&self, t: f64) -> Point {
        self.start.lerp(&self.end, t)
    }
}

/// Number of sections needed to sweep the canvas diagonal twice over.
pub fn section_count(width: f64, height: f64, section_width: f64) -> usize {
    let diagonal = (width * width + height * height).sqrt();
    let n = (diagonal / section_width).ceil();
    if n.is_finite() && n > 0.0 {
        n as usize * 2
    } else {
        0
    }
}

/// Generate all scan centerlines that cross the canvas, ascending by section.
pub fn generate_scan_lines(settings: &ScanSettings) -> Vec<ClippedSegment> {
    let ScanSettings {
        width,
        height,
        angle_deg,
        section_width,
        channel_count,
        channel_index,
        line_spacing,
    } = *settings;

    let inputs_finite = [width, height, angle_deg, section_width, line_spacing]
        .iter()
        .all(|v| v.is_finite());
    if !inputs_finite || section_width <= 0.0 || width <= 0.0 || height <= 0.0 {
        tracing::warn!("Degenerate scan settings, no scan lines generated: {:?}", settings);
        return Vec::new();
    }

    let theta = angle_deg.to_radians();
    let direction = Point::new(theta.cos(), theta.sin());
    let normal = Point::new(-theta.sin(), theta.cos());
    let center = Point::new(width / 2.0, height / 2.0);

    let interleave = if channel_count > 1 {
        channel_index as f64 * line_spacing
    } else {
        0.0
    };

    let n = section_count(width, height, section_width);
    let half = (n / 2) as f64;
    let mut lines = Vec::new();
    for i in 0..n {
        let offset = (i as f64 - half) * section_width + interleave;
        let origin = center + normal * offset;
        if let Some((start, end)) = clip_line_to_rect(origin, direction, width, height) {
            lines.push(ClippedSegment {
                section: i,
                start,
                end,
            });
        }
    }

    tracing::debug!(
        "Generated {} of {} scan sections at {} deg",
        lines.len(),
        n,
        angle_deg
    );
    lines
}

/// Clip the infinite line `origin + t * direction` to `[0, width] x [0, height]`.
///
/// Returns the two boundary points ordered by `t`, or `None` when the line
/// misses the rectangle, only touches a corner, or the input is degenerate.
pub fn clip_line_to_rect(
    origin: Point,
    direction: Point,
    width: f64,
    height: f64,
) -> Option<(Point, Point)> {
    if !origin.is_finite() || !direction.is_finite() || direction.length() < f64::EPSILON {
        return None;
    }

    let mut hits: Vec<(f64, Point)> = Vec::with_capacity(4);

    if direction.x.abs() > f64::EPSILON {
        for edge_x in [0.0, width] {
            let t = (edge_x - origin.x) / direction.x;
            let y = origin.y + t * direction.y;
            if within(y, height) {
                hits.push((t, Point::new(edge_x, y.clamp(0.0, height))));
            }
        }
    }
    if direction.y.abs() > f64::EPSILON {
        for edge_y in [0.0, height] {
            let t = (edge_y - origin.y) / direction.y;
            let x = origin.x + t * direction.x;
            if within(x, width) {
                hits.push((t, Point::new(x.clamp(0.0, width), edge_y)));
            }
        }
    }

    hits.retain(|(t, p)| t.is_finite() && p.is_finite());
    hits.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut distinct: Vec<Point> = Vec::with_capacity(2);
    for (_, p) in hits {
        let duplicate = distinct
            .last()
            .is_some_and(|last| last.distance_to(&p) <= DUPLICATE_TOLERANCE);
        if !duplicate {
            distinct.push(p);
        }
    }

    match distinct.as_slice() {
        [a, b] => Some((*a, *b)),
        _ => None,
    }
}

fn within(v: f64, max: f64) -> bool {
    v >= -EDGE_TOLERANCE && v <= max + EDGE_TOLERANCE
}

/// Clip the segment `a..b` to `[0, width] x [0, height]`.
///
/// Returns the parameters along `a..b` of the part that lies inside, or
/// `None` when nothing does. A zero-length segment is kept whole if its
/// point is inside.
pub fn clip_segment_to_rect(a: Point, b: Point, width: f64, height: f64) -> Option<(f64, f64)> {
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    let direction = b - a;
    let len_sq = direction.x * direction.x + direction.y * direction.y;
    if len_sq < f64::EPSILON {
        return (within(a.x, width) && within(a.y, height)).then_some((0.0, 1.0));
    }

    let (p, q) = clip_line_to_rect(a, direction, width, height)?;
    let param = |pt: Point| ((pt.x - a.x) * direction.x + (pt.y - a.y) * direction.y) / len_sq;
    let lo = param(p).max(0.0);
    let hi = param(q).min(1.0);
    (hi - lo > EDGE_TOLERANCE).then_some((lo, hi))
}
