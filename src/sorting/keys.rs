//! Per-line sort key extraction.

use super::metrics;
use super::params::Criterion;
use image::Rgb;

/// Key for a single pixel under `criterion`.
#[inline]
pub fn pixel_key(criterion: Criterion, pixel: &Rgb<u8>) -> f32 {
    let rgb = metrics::normalize(pixel.0);
    match criterion {
        Criterion::Brightness => metrics::brightness(rgb),
        Criterion::Hue => metrics::hue(rgb),
        Criterion::Saturation => metrics::saturation(rgb),
        Criterion::Intensity => metrics::lightness(rgb),
        Criterion::Minimum => metrics::minimum(rgb),
    }
}

/// Keys for every pixel of `line`, index-aligned with it.
pub fn extract_keys(line: &[Rgb<u8>], criterion: Criterion) -> Vec<f32> {
    let mut keys = Vec::with_capacity(line.len());
    extract_keys_into(line, criterion, &mut keys);
    keys
}

/// Like [`extract_keys`], reusing `keys` as the output buffer.
pub fn extract_keys_into(line: &[Rgb<u8>], criterion: Criterion, keys: &mut Vec<f32>) {
    keys.clear();
    keys.extend(line.iter().map(|px| pixel_key(criterion, px)));
}
