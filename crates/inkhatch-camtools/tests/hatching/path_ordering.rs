use inkhatch_camtools::{optimize_path, travel_distance, ToolpathSegment};
use inkhatch_core::{Channel, Point};

/// Small deterministic generator so the segment set is reproducible.
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn random_segments(count: usize, seed: u64) -> Vec<ToolpathSegment> {
    let mut rng = Lcg(seed);
    (0..count)
        .map(|_| {
            let start = Point::new(rng.next_f64() * 200.0, rng.next_f64() * 150.0);
            let angle = rng.next_f64() * std::f64::consts::TAU;
            let len = 2.0 + rng.next_f64() * 20.0;
            ToolpathSegment {
                channel: Channel::Black,
                start,
                end: start + Point::new(angle.cos(), angle.sin()) * len,
            }
        })
        .collect()
}

#[test]
fn test_every_segment_visited_once() {
    let input = random_segments(150, 7);
    let path = optimize_path(&input, Point::default());
    assert_eq!(path.segments.len(), input.len());

    let mut used = vec![false; path.segments.len()];
    for seg in &input {
        let found = path
            .segments
            .iter()
            .enumerate()
            .position(|(i, s)| !used[i] && (s == seg || *s == seg.reversed()));
        let index = found.expect("segment missing from optimized path");
        used[index] = true;
    }
    assert!(used.iter().all(|&u| u));
}

#[test]
fn test_greedy_beats_input_order() {
    for seed in [1, 42, 2024] {
        let input = random_segments(200, seed);
        let origin = Point::default();
        let path = optimize_path(&input, origin);

        let naive = travel_distance(&input, origin);
        assert!(path.travel_distance <= naive);
        assert!((path.travel_distance - travel_distance(&path.segments, origin)).abs() < 1e-6);
        assert_eq!(path.exit, path.segments.last().unwrap().end);
    }
}

#[test]
fn test_ordering_is_deterministic() {
    let input = random_segments(100, 99);
    let a = optimize_path(&input, Point::new(5.0, 5.0));
    let b = optimize_path(&input, Point::new(5.0, 5.0));
    assert_eq!(a, b);
}
