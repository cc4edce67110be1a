use inkhatch_camtools::{subline_offset, GcodeOptions, HatchPipeline, Parameters, PlotExporter};
use inkhatch_core::{mm_to_px, Canvas, Channel, RasterImage};

fn flat_black_params() -> Parameters {
    Parameters {
        enabled_channels: vec![Channel::Black],
        channel_order: vec![Channel::Black],
        line_angle: 0.0,
        section_width: 5.0,
        line_spacing: 0.4,
        max_lines_per_channel: 5,
        min_line_length: 2.0,
        max_merge_distance: 0.0,
        ..Parameters::default()
    }
}

#[test]
fn test_flat_black_gives_five_full_lines_per_section() {
    let image = RasterImage::filled(10, 10, [0, 0, 0, 255]).unwrap();
    let canvas = Canvas::new(50.0, 50.0).unwrap();
    let params = flat_black_params();
    let spacing = mm_to_px(params.line_spacing);
    let pipeline = HatchPipeline::new(&image, canvas, params).unwrap();
    let (_, height) = canvas.size_px();

    let sections = pipeline.scan_lines(Channel::Black);
    assert!(!sections.is_empty());
    let result = pipeline.run_channel(Channel::Black, None);
    assert_eq!(result.sections, sections.len());

    let mut expected_total = 0;
    for section in &sections {
        // Sections on the top and bottom edge keep only the sub-lines on the sheet
        let expected: Vec<u32> = (0..5)
            .filter(|&i| (0.0..=height).contains(&(section.start.y + subline_offset(i, spacing))))
            .collect();
        expected_total += expected.len();

        let on_section: Vec<_> = result
            .segments
            .iter()
            .filter(|s| s.section == section.section)
            .collect();
        let sub_lines: Vec<u32> = on_section.iter().map(|s| s.sub_line).collect();
        assert_eq!(sub_lines, expected);
        for seg in on_section {
            assert!((seg.length_px() - section.length()).abs() < 1e-6);
            assert!(seg.length_mm() >= 2.0);
        }
    }

    // Interior sections carry all five
    assert!(expected_total > 4 * sections.len());
    assert_eq!(result.raw_segments, expected_total);
    assert_eq!(result.segments.len(), expected_total);
}

#[test]
fn test_identical_inputs_are_deterministic() {
    let mut pixels = Vec::new();
    for y in 0..32u32 {
        for x in 0..32u32 {
            pixels.extend_from_slice(&[(x * 8) as u8, (y * 8) as u8, 128, 255]);
        }
    }
    let image = RasterImage::from_rgba(32, 32, pixels).unwrap();
    let canvas = Canvas::new(40.0, 30.0).unwrap();
    let params = Parameters {
        line_angle: 30.0,
        ..Parameters::default()
    };

    let run = || {
        let pipeline = HatchPipeline::new(&image, canvas, params.clone()).unwrap();
        let results = pipeline.run_all(None);
        let exporter = PlotExporter::new(
            canvas,
            params.clone(),
            GcodeOptions {
                include_timestamp: false,
                pause_between_channels: true,
            },
        );
        let output = exporter.export_combined(&results);
        (results, output)
    };

    let (first_results, first_output) = run();
    let (second_results, second_output) = run();
    assert_eq!(first_results, second_results);
    assert_eq!(first_output.gcode, second_output.gcode);
    assert_eq!(first_output.svg, second_output.svg);
    assert!(first_output.stats.segments > 0);
}

#[test]
fn test_grayscale_follows_dark_half() {
    // Left half black, right half white
    let mut pixels = Vec::new();
    for _y in 0..10 {
        for x in 0..20 {
            let v = if x < 10 { 0 } else { 255 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    let image = RasterImage::from_rgba(20, 10, pixels).unwrap();
    let canvas = Canvas::new(40.0, 20.0).unwrap();
    let mut params = Parameters {
        line_angle: 0.0,
        ..Parameters::grayscale()
    };
    // Ignore faint resampling ripple on the white side
    params.white_point.insert(Channel::Gray, 0.1);
    let pipeline = HatchPipeline::new(&image, canvas, params).unwrap();
    let result = pipeline.run_channel(Channel::Gray, None);

    assert!(!result.segments.is_empty());
    let (width_px, _) = canvas.size_px();
    for seg in &result.segments {
        assert_eq!(seg.channel, Channel::Gray);
        assert!(seg.start.x.max(seg.end.x) < width_px * 0.65);
    }
}

#[test]
fn test_channels_interleave_instead_of_overlapping() {
    // Pure black: K is full, C/M/Y are empty
    let image = RasterImage::filled(8, 8, [0, 0, 0, 255]).unwrap();
    let canvas = Canvas::new(30.0, 30.0).unwrap();
    let params = Parameters {
        enabled_channels: vec![Channel::Cyan, Channel::Black],
        line_angle: 0.0,
        ..Parameters::default()
    };
    let pipeline = HatchPipeline::new(&image, canvas, params).unwrap();
    let cyan = pipeline.scan_lines(Channel::Cyan);
    let black = pipeline.scan_lines(Channel::Black);
    let shift = black[0].start.y - cyan[0].start.y;
    assert!((shift - inkhatch_core::mm_to_px(0.4)).abs() < 1e-9);

    let results = pipeline.run_all(None);
    assert!(results[&Channel::Cyan].segments.is_empty());
    assert!(!results[&Channel::Black].segments.is_empty());
}
