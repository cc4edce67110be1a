use inkhatch_camtools::{
    optimize_path, GcodeOptions, GcodeWriter, MachineSettings, MotionEmitter, MotionProgram,
    ToolpathSegment,
};
use inkhatch_core::{Channel, Point};

fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> ToolpathSegment {
    ToolpathSegment {
        channel: Channel::Black,
        start: Point::new(x0, y0),
        end: Point::new(x1, y1),
    }
}

fn gcode_for(segments: &[ToolpathSegment]) -> String {
    let settings = MachineSettings {
        feed_rate: 1500.0,
        pen_down_z: 0.0,
        pen_up_z: 3.0,
        prevent_zhop_distance: 2.0,
    };
    let path = optimize_path(segments, Point::default());
    let block = MotionEmitter::new(settings).emit(Channel::Black, &path, Point::default());
    let program = MotionProgram {
        blocks: vec![block],
    };
    GcodeWriter::new(
        settings,
        GcodeOptions {
            include_timestamp: false,
            pause_between_channels: true,
        },
    )
    .write(&program)
}

#[test]
fn test_short_hop_drags_with_pen_down() {
    let gcode = gcode_for(&[seg(10.0, 10.0, 20.0, 10.0), seg(20.0, 11.5, 10.0, 11.5)]);
    assert!(gcode.contains(
        "G1 X20.000 Y10.000 F1500\nG1 X20.000 Y11.500 F1500\nG1 X10.000 Y11.500 F1500\n"
    ));
    assert_eq!(gcode.matches("G1 Z0.000").count(), 1);
}

#[test]
fn test_long_hop_lifts_pen() {
    let gcode = gcode_for(&[seg(10.0, 10.0, 20.0, 10.0), seg(20.0, 13.0, 10.0, 13.0)]);
    assert!(gcode.contains(
        "G1 X20.000 Y10.000 F1500\nG0 Z3.000\nG0 X20.000 Y13.000\nG1 Z0.000 F1500\nG1 X10.000 Y13.000 F1500\n"
    ));
    assert_eq!(gcode.matches("G1 Z0.000").count(), 2);
}

#[test]
fn test_program_always_ends_pen_up() {
    let gcode = gcode_for(&[seg(1.0, 1.0, 2.0, 2.0)]);
    let tail: Vec<&str> = gcode.lines().rev().take(4).collect();
    assert_eq!(
        tail,
        vec![
            "M2 ; End program",
            "G0 X0 Y0 ; Return to origin",
            "G0 Z3.000 ; Pen up",
            "; End of plot"
        ]
    );
    let empty = gcode_for(&[]);
    assert!(!empty.contains("G1"));
}
