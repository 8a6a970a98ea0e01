//! Pure color metrics used as sort keys.
//!
//! All functions here take channels normalized to `[0, 1]` and are total:
//! gray pixels (`max == min`) and black pixels (`max == 0`) yield `0.0`
//! rather than NaN.

/// Normalize an 8-bit RGB triple to `[0, 1]` floats.
#[inline]
pub fn normalize(rgb: [u8; 3]) -> [f32; 3] {
    [
        f32::from(rgb[0]) / 255.0,
        f32::from(rgb[1]) / 255.0,
        f32::from(rgb[2]) / 255.0,
    ]
}

#[inline]
fn max3([r, g, b]: [f32; 3]) -> f32 {
    r.max(g).max(b)
}

#[inline]
fn min3([r, g, b]: [f32; 3]) -> f32 {
    r.min(g).min(b)
}

/// Arithmetic mean of the channels. No gamma, no luma weights.
#[inline]
pub fn brightness([r, g, b]: [f32; 3]) -> f32 {
    (r + g + b) / 3.0
}

/// HSV hue as a fraction of a full turn, in `[0, 1)`.
///
/// Red is 0, green 1/3, blue 2/3. When several channels share the maximum,
/// red wins over green and green over blue; the formula gives the same
/// value either way.
#[inline]
pub fn hue(rgb: [f32; 3]) -> f32 {
    let [r, g, b] = rgb;
    let max = max3(rgb);
    let delta = max - min3(rgb);
    if delta == 0.0 {
        return 0.0;
    }

    let rc = (max - r) / delta;
    let gc = (max - g) / delta;
    let bc = (max - b) / delta;

    let sector = if r == max {
        bc - gc
    } else if g == max {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };

    let h = (sector / 6.0).rem_euclid(1.0);
    // rem_euclid can round a tiny negative up to exactly 1.0
    if h >= 1.0 { 0.0 } else { h }
}

/// HSV saturation, `delta / max`, zero for black.
#[inline]
pub fn saturation(rgb: [f32; 3]) -> f32 {
    let max = max3(rgb);
    if max == 0.0 {
        return 0.0;
    }
    (max - min3(rgb)) / max
}

/// HSL lightness, `(max + min) / 2`.
#[inline]
pub fn lightness(rgb: [f32; 3]) -> f32 {
    (max3(rgb) + min3(rgb)) / 2.0
}

/// Smallest channel.
#[inline]
pub fn minimum(rgb: [f32; 3]) -> f32 {
    min3(rgb)
}
