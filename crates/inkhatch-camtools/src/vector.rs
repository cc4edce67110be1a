//! SVG output
//!
//! Mirrors a motion program as an SVG drawing in millimeters, one group
//! per channel. Groups are written in plotting order so the last plotted
//! channel paints on top.

use crate::consolidate::FilteredSegment;
use crate::motion::{MotionProgram, Stroke};
use inkhatch_core::units::format_coord;
use inkhatch_core::{px_to_mm, Canvas, Channel, Point};

/// Writes SVG documents for one canvas.
#[derive(Debug, Clone, Copy)]
pub struct SvgWriter {
    canvas: Canvas,
    pen_diameter: f64,
}

impl SvgWriter {
    pub fn new(canvas: Canvas, pen_diameter: f64) -> Self {
        Self {
            canvas,
            pen_diameter,
        }
    }

    /// Document matching what the plotter draws, drag lines included.
    pub fn write_program(&self, program: &MotionProgram) -> String {
        let mut svg = self.open_document();
        for block in &program.blocks {
            let (drags, hatch): (Vec<&Stroke>, Vec<&Stroke>) =
                block.strokes.iter().partition(|s| s.drag);
            self.open_group(&mut svg, block.channel);
            for stroke in hatch {
                self.push_line(&mut svg, "    ", self.flip(stroke.start), self.flip(stroke.end));
            }
            if !drags.is_empty() {
                svg.push_str(&format!(
                    "    <g id=\"{}-drag\" opacity=\"0.5\">\n",
                    block.channel.key()
                ));
                for stroke in drags {
                    self.push_line(&mut svg, "      ", self.flip(stroke.start), self.flip(stroke.end));
                }
                svg.push_str("    </g>\n");
            }
            svg.push_str("  </g>\n");
        }
        svg.push_str("</svg>\n");
        svg
    }

    /// Preview straight from filtered segments, without motion planning.
    ///
    /// `layers` are written in the order given, last on top.
    pub fn write_preview(&self, layers: &[(Channel, &[FilteredSegment])]) -> String {
        let mut svg = self.open_document();
        for (channel, segments) in layers {
            self.open_group(&mut svg, *channel);
            for seg in segments.iter() {
                let to_mm = |p: Point| Point::new(px_to_mm(p.x), px_to_mm(p.y));
                self.push_line(&mut svg, "    ", to_mm(seg.start), to_mm(seg.end));
            }
            svg.push_str("  </g>\n");
        }
        svg.push_str("</svg>\n");
        svg
    }

    fn open_document(&self) -> String {
        let w = format_coord(self.canvas.width_mm);
        let h = format_coord(self.canvas.height_mm);
        let mut svg = String::new();
        svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
        svg.push_str(&format!(
            "<svg width=\"{w}mm\" height=\"{h}mm\" viewBox=\"0 0 {w} {h}\" xmlns=\"http://www.w3.org/2000/svg\">\n"
        ));
        svg
    }

    fn open_group(&self, svg: &mut String, channel: Channel) {
        svg.push_str(&format!(
            "  <g id=\"{}\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\" fill=\"none\">\n",
            channel.key(),
            channel.stroke_color(),
            format_coord(self.pen_diameter)
        ));
    }

    fn push_line(&self, svg: &mut String, indent: &str, a: Point, b: Point) {
        svg.push_str(&format!(
            "{}<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" />\n",
            indent,
            format_coord(a.x),
            format_coord(a.y),
            format_coord(b.x),
            format_coord(b.y)
        ));
    }

    /// Plotter frame (Y up) back to SVG frame (Y down).
    fn flip(&self, p: Point) -> Point {
        Point::new(p.x, self.canvas.height_mm - p.y)
    }
}
