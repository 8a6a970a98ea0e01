//! Sorting one line and blending it back into place.
//!
//! Blending is positional: at each index the output takes either the sorted
//! pixel or the original one, never a mix of their colors.

use super::keys::extract_keys_into;
use super::params::{Criterion, Intensity};
use image::Rgb;
use rand::Rng;

/// Buffers reused across [`sort_and_blend`] calls on one thread.
#[derive(Debug, Default)]
pub struct LineScratch {
    keys: Vec<f32>,
    order: Vec<usize>,
    sorted: Vec<Rgb<u8>>,
}

impl LineScratch {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Indices of `keys` in ascending key order.
///
/// Uses `f32::total_cmp`, so the comparator is a total order even if a key
/// were ever NaN. The sort is stable: equal keys keep their input order.
pub fn sort_order(keys: &[f32], order: &mut Vec<usize>) {
    order.clear();
    order.extend(0..keys.len());
    order.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));
}

/// `line` reordered by ascending key.
pub fn sort_line(line: &[Rgb<u8>], keys: &[f32]) -> Vec<Rgb<u8>> {
    debug_assert_eq!(line.len(), keys.len());
    let mut order = Vec::with_capacity(keys.len());
    sort_order(keys, &mut order);
    order.iter().map(|&i| line[i]).collect()
}

/// Replace each position of `line` with the pixel from `sorted` with
/// probability `intensity`. At full intensity `line` becomes `sorted`
/// and `rng` is not touched.
pub fn blend_line<R: Rng + ?Sized>(
    line: &mut [Rgb<u8>],
    sorted: &[Rgb<u8>],
    intensity: Intensity,
    rng: &mut R,
) {
    debug_assert_eq!(line.len(), sorted.len());
    if intensity.is_full() {
        line.copy_from_slice(sorted);
        return;
    }
    let p = intensity.value();
    for (dst, src) in line.iter_mut().zip(sorted) {
        if rng.random::<f32>() < p {
            *dst = *src;
        }
    }
}

/// Extract keys, sort, and blend `line` in place.
pub fn sort_and_blend<R: Rng + ?Sized>(
    line: &mut [Rgb<u8>],
    criterion: Criterion,
    intensity: Intensity,
    rng: &mut R,
    scratch: &mut LineScratch,
) {
    if line.len() < 2 {
        return;
    }
    extract_keys_into(line, criterion, &mut scratch.keys);
    sort_order(&scratch.keys, &mut scratch.order);
    scratch.sorted.clear();
    scratch.sorted.extend(scratch.order.iter().map(|&i| line[i]));
    blend_line(line, &scratch.sorted, intensity, rng);
}
