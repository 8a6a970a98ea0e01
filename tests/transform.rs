//! End-to-end properties of the sort transform through the public API.

use image::{Rgb, RgbImage};
use pixsort::sorting::keys::pixel_key;
use pixsort::sorting::{
    AlignConfig, CancelToken, Criterion, EngineConfig, Pattern, SortEngine, SortError, SortEvent,
    SortJob, SortParams, Strategy,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

fn noise_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |_, _| Rgb(rng.random::<[u8; 3]>()))
}

fn row_image(row: &[[u8; 3]]) -> RgbImage {
    RgbImage::from_fn(row.len() as u32, 1, |x, _| Rgb(row[x as usize]))
}

fn row_pixels(image: &RgbImage, y: u32) -> Vec<Rgb<u8>> {
    (0..image.width()).map(|x| *image.get_pixel(x, y)).collect()
}

fn histogram(pixels: impl IntoIterator<Item = Rgb<u8>>) -> BTreeMap<[u8; 3], usize> {
    let mut counts = BTreeMap::new();
    for p in pixels {
        *counts.entry(p.0).or_insert(0) += 1;
    }
    counts
}

fn engine(strategy: Strategy, reshape: bool) -> SortEngine {
    SortEngine::new(EngineConfig {
        align: AlignConfig {
            strategy,
            reshape,
            ..AlignConfig::default()
        },
        ..EngineConfig::default()
    })
}

fn all_engines() -> Vec<SortEngine> {
    vec![
        engine(Strategy::Rotate, true),
        engine(Strategy::Rotate, false),
        engine(Strategy::Shear, true),
    ]
}

// =========================================================================
// Dimensions
// =========================================================================

#[test]
fn output_dimensions_match_input() {
    let sizes = [(1, 1), (1, 7), (7, 1), (13, 5), (40, 30)];
    let angles = [-135, -90, -30, 0, 17, 45, 90, 180, 1000];
    for engine in all_engines() {
        for (w, h) in sizes {
            let img = noise_image(w, h, u64::from(w * 100 + h));
            for angle in angles {
                let params = SortParams::new(angle, Criterion::Hue, 0.7).with_seed(1);
                let out = engine.transform(&img, &params, |_| {}).unwrap();
                assert_eq!(
                    out.dimensions(),
                    (w, h),
                    "{w}x{h} at {angle} with {:?}",
                    engine.config().align
                );
            }
        }
    }
}

#[test]
fn zero_area_image_is_returned_unchanged() {
    for (w, h) in [(0, 0), (0, 4), (4, 0)] {
        let img = RgbImage::new(w, h);
        let mut seen = Vec::new();
        let out = SortEngine::default()
            .transform(&img, &SortParams::default(), |p| seen.push(p))
            .unwrap();
        assert_eq!(out.dimensions(), (w, h));
        assert_eq!(seen, vec![100]);
    }
}

// =========================================================================
// Angle 0: rows are permuted, never recolored
// =========================================================================

#[test]
fn angle_zero_preserves_row_histograms() {
    let img = noise_image(32, 16, 7);
    for engine in all_engines() {
        for criterion in Criterion::ALL {
            let out = engine
                .transform(&img, &SortParams::new(0, criterion, 1.0), |_| {})
                .unwrap();
            for y in 0..img.height() {
                assert_eq!(
                    histogram(row_pixels(&out, y)),
                    histogram(row_pixels(&img, y)),
                    "row {y} by {criterion}"
                );
            }
        }
    }
}

#[test]
fn already_sorted_rows_are_unchanged() {
    let row: Vec<[u8; 3]> = (0..50u8).map(|v| [v * 5, v * 5, v * 5]).collect();
    let img = row_image(&row);
    let out = SortEngine::default()
        .transform(&img, &SortParams::new(0, Criterion::Brightness, 1.0), |_| {})
        .unwrap();
    assert_eq!(out, img);
}

#[test]
fn full_intensity_rows_are_sorted_by_key() {
    let img = noise_image(48, 12, 8);
    for criterion in Criterion::ALL {
        let out = SortEngine::default()
            .transform(&img, &SortParams::new(0, criterion, 1.0), |_| {})
            .unwrap();
        for y in 0..out.height() {
            let keys: Vec<f32> = row_pixels(&out, y)
                .iter()
                .map(|p| pixel_key(criterion, p))
                .collect();
            assert!(
                keys.windows(2).all(|w| w[0] <= w[1]),
                "row {y} not ascending by {criterion}"
            );
        }
    }
}

// =========================================================================
// Progress
// =========================================================================

#[test]
fn progress_is_monotonic_and_ends_at_100() {
    let img = noise_image(10, 10, 9);
    for engine in all_engines() {
        for angle in [0, 30, 90, -60] {
            let mut seen = Vec::new();
            engine
                .transform(&img, &SortParams::new(angle, Criterion::Hue, 1.0), |p| {
                    seen.push(p)
                })
                .unwrap();
            assert!(!seen.is_empty());
            assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
            assert_eq!(seen.last(), Some(&100));
        }
    }
}

// =========================================================================
// Parameter fallbacks
// =========================================================================

#[test]
fn unknown_criterion_matches_brightness() {
    let img = noise_image(20, 15, 10);
    let unknown = SortParams::new(30, Criterion::from_name("Unknown"), 0.5).with_seed(4);
    let brightness = SortParams::new(30, Criterion::Brightness, 0.5).with_seed(4);
    for engine in all_engines() {
        assert_eq!(
            engine.transform(&img, &unknown, |_| {}).unwrap(),
            engine.transform(&img, &brightness, |_| {}).unwrap()
        );
    }
}

#[test]
fn stub_patterns_match_linear() {
    let img = noise_image(20, 15, 11);
    let linear = SortParams::new(-20, Criterion::Saturation, 0.8).with_seed(5);
    for engine in all_engines() {
        let expected = engine.transform(&img, &linear, |_| {}).unwrap();
        for name in ["Radial", "Spiral", "Wave"] {
            let params = linear.with_pattern(Pattern::from_name(name));
            assert_eq!(engine.transform(&img, &params, |_| {}).unwrap(), expected, "{name}");
        }
    }
}

#[test]
fn out_of_range_intensity_sorts_fully() {
    let img = noise_image(16, 4, 12);
    let engine = SortEngine::default();
    let full = engine
        .transform(&img, &SortParams::new(0, Criterion::Minimum, 1.0), |_| {})
        .unwrap();
    for intensity in [0.0, -1.0, 5.0, f32::NAN] {
        let params = SortParams::new(0, Criterion::Minimum, intensity);
        assert_eq!(engine.transform(&img, &params, |_| {}).unwrap(), full);
    }
}

// =========================================================================
// Intensity
// =========================================================================

/// Rows of distinct grays in strictly descending order: sorting moves every
/// pixel, so a position is unchanged exactly when the blend kept it.
fn reversed_rows(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        let v = (width - x) as u8;
        Rgb([v, v, v])
    })
}

fn changed_fraction(before: &RgbImage, after: &RgbImage) -> f32 {
    let changed = before
        .pixels()
        .zip(after.pixels())
        .filter(|(a, b)| a != b)
        .count();
    changed as f32 / (before.width() * before.height()) as f32
}

#[test]
fn changed_fraction_tracks_intensity() {
    let img = reversed_rows(250, 400);
    let engine = SortEngine::default();
    for (p, seed) in [(0.02f32, 1u64), (0.25, 2), (0.6, 3)] {
        let params = SortParams::new(0, Criterion::Brightness, p).with_seed(seed);
        let out = engine.transform(&img, &params, |_| {}).unwrap();
        let fraction = changed_fraction(&img, &out);
        assert!((fraction - p).abs() < 0.01, "p={p} fraction={fraction}");
    }
}

#[test]
fn changed_fraction_tracks_intensity_without_seed() {
    let img = reversed_rows(250, 400);
    let out = SortEngine::default()
        .transform(&img, &SortParams::new(0, Criterion::Brightness, 0.1), |_| {})
        .unwrap();
    let fraction = changed_fraction(&img, &out);
    assert!((fraction - 0.1).abs() < 0.01, "fraction={fraction}");
}

#[test]
fn seeded_runs_are_reproducible_and_thread_independent() {
    let img = noise_image(64, 48, 13);
    let params = SortParams::new(25, Criterion::Hue, 0.4).with_seed(77);
    let sequential = SortEngine::default();
    let parallel = SortEngine::new(EngineConfig {
        parallel: true,
        batch_lines: 7,
        ..EngineConfig::default()
    });
    let a = sequential.transform(&img, &params, |_| {}).unwrap();
    let b = sequential.transform(&img, &params, |_| {}).unwrap();
    let c = parallel.transform(&img, &params, |_| {}).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, c);
}

// =========================================================================
// Concrete scenarios
// =========================================================================

#[test]
fn brightness_row_scenario() {
    let img = row_image(&[[10, 10, 10], [200, 200, 200], [50, 50, 50], [0, 0, 0]]);
    for engine in all_engines() {
        let out = engine
            .transform(&img, &SortParams::new(0, Criterion::Brightness, 1.0), |_| {})
            .unwrap();
        assert_eq!(
            out,
            row_image(&[[0, 0, 0], [10, 10, 10], [50, 50, 50], [200, 200, 200]])
        );
    }
}

#[test]
fn hue_row_scenario() {
    let img = row_image(&[[0, 255, 0], [0, 0, 255], [255, 0, 0]]);
    let out = SortEngine::default()
        .transform(&img, &SortParams::new(0, Criterion::Hue, 1.0), |_| {})
        .unwrap();
    assert_eq!(out, row_image(&[[255, 0, 0], [0, 255, 0], [0, 0, 255]]));
}

// =========================================================================
// Shear strategy
// =========================================================================

#[test]
fn shear_is_a_permutation_at_any_angle() {
    let img = noise_image(30, 20, 14);
    let engine = engine(Strategy::Shear, true);
    for angle in [-150, -75, -10, 33, 60, 90, 135] {
        let out = engine
            .transform(&img, &SortParams::new(angle, Criterion::Brightness, 1.0), |_| {})
            .unwrap();
        assert_eq!(
            histogram(out.pixels().copied()),
            histogram(img.pixels().copied()),
            "angle {angle}"
        );
    }
}

#[test]
fn vertical_shear_sorts_columns_along_the_angle() {
    let img = noise_image(9, 14, 15);
    for (angle, upward) in [(90, true), (-90, false)] {
        let out = engine(Strategy::Shear, true)
            .transform(&img, &SortParams::new(angle, Criterion::Brightness, 1.0), |_| {})
            .unwrap();
        for x in 0..out.width() {
            let mut keys: Vec<f32> = (0..out.height())
                .map(|y| pixel_key(Criterion::Brightness, out.get_pixel(x, y)))
                .collect();
            if upward {
                keys.reverse();
            }
            assert!(keys.windows(2).all(|w| w[0] <= w[1]), "column {x} at {angle}");
        }
    }
}

#[test]
fn horizontal_shear_at_180_sorts_right_to_left() {
    let img = row_image(&[[10, 10, 10], [200, 200, 200], [50, 50, 50], [0, 0, 0]]);
    let params = SortParams::new(180, Criterion::Brightness, 1.0);
    let expected = row_image(&[[200, 200, 200], [50, 50, 50], [10, 10, 10], [0, 0, 0]]);
    for engine in [engine(Strategy::Shear, true), engine(Strategy::Rotate, true)] {
        assert_eq!(engine.transform(&img, &params, |_| {}).unwrap(), expected);
    }
}

// =========================================================================
// Cancellation and background jobs
// =========================================================================

#[test]
fn cancelling_mid_run_stops_after_current_line() {
    let img = noise_image(12, 12, 16);
    let token = CancelToken::new();
    let mut seen = Vec::new();
    let result = SortEngine::default().transform_with_cancel(
        &img,
        &SortParams::default(),
        &token,
        |p| {
            seen.push(p);
            token.cancel();
        },
    );
    assert!(matches!(result, Err(SortError::Cancelled)));
    assert_eq!(seen.len(), 1);
}

#[test_log::test]
fn job_delivers_exactly_one_result() {
    let img = noise_image(10, 10, 17);
    let job = SortJob::spawn(SortEngine::default(), &img, SortParams::default()).unwrap();
    let events: Vec<SortEvent> = job.events().iter().collect();
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert!(events.last().is_some_and(SortEvent::is_terminal));

    let progress: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            SortEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last(), Some(&100));

    match events.last() {
        Some(SortEvent::Finished(out)) => assert_eq!(out.dimensions(), (10, 10)),
        other => panic!("expected Finished, got {other:?}"),
    }
}

#[test]
fn job_matches_synchronous_transform() {
    let img = noise_image(25, 18, 18);
    let params = SortParams::new(40, Criterion::Intensity, 0.5).with_seed(3);
    let expected = SortEngine::default().transform(&img, &params, |_| {}).unwrap();
    let job = SortJob::spawn(SortEngine::default(), &img, params).unwrap();
    assert_eq!(job.wait(|_| {}).unwrap(), expected);
}
