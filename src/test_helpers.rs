//! Shared test utilities for the pixsort unit tests.
//!
//! Image builders with predictable content, plus histogram helpers for
//! asserting that a sort only permutes pixels.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let img = image_from_rows(&[&[[10, 10, 10], [0, 0, 0]]]);
//! let out = engine.transform(&img, &params, |_| {}).unwrap();
//! assert_eq!(row_histograms(&out), row_histograms(&img));
//! ```

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

// =========================================================================
// Image builders
// =========================================================================

/// Image where every pixel is distinct (for sizes up to 256 x 256).
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([x as u8, y as u8, ((x * 7 + y * 13) % 256) as u8])
    })
}

pub fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(rgb))
}

/// Deterministic pseudo-random image.
pub fn noise_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |_, _| Rgb(rng.random::<[u8; 3]>()))
}

/// Build an image from rows of RGB triples. Panics on ragged rows.
pub fn image_from_rows(rows: &[&[[u8; 3]]]) -> RgbImage {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |r| r.len()) as u32;
    assert!(
        rows.iter().all(|r| r.len() as u32 == width),
        "ragged rows in test image"
    );
    RgbImage::from_fn(width, height, |x, y| Rgb(rows[y as usize][x as usize]))
}

// =========================================================================
// Histograms
// =========================================================================

/// Count of each color in one row.
pub fn row_histogram(image: &RgbImage, y: u32) -> BTreeMap<[u8; 3], usize> {
    let mut counts = BTreeMap::new();
    for x in 0..image.width() {
        *counts.entry(image.get_pixel(x, y).0).or_insert(0) += 1;
    }
    counts
}

pub fn row_histograms(image: &RgbImage) -> Vec<BTreeMap<[u8; 3], usize>> {
    (0..image.height()).map(|y| row_histogram(image, y)).collect()
}
