//! Geometric alignment: turning an arbitrary sort angle into axis-aligned lines.
//!
//! Two strategies, chosen once per [`Aligner`]:
//!
//! | Strategy | Forward | Lines | Inverse |
//! |---|---|---|---|
//! | [`Strategy::Rotate`] | rotate by `-angle` (optionally growing the canvas) | rows | rotate by `+angle` into the original canvas |
//! | [`Strategy::Shear`] | one wrap-around shear, `tan` or `cot` of the angle | rows or columns | the opposite shear |
//!
//! Rotation is lossy at the borders: pixels that leave the canvas are
//! dropped and uncovered pixels come from the [`Boundary`] policy. The shear
//! displaces whole rows or columns by integer amounts with toroidal wrap, so
//! its round trip is an exact permutation.
//!
//! Angle 0 is lossless under both strategies: the rotation maps every pixel
//! center onto itself and the shear offsets are all zero.

use super::params::Angle;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use log::debug;
use serde::{Deserialize, Serialize};

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// How the sort angle is reduced to axis-aligned lines.
///
/// Both strategies sort ascending in the direction the angle points: at 0
/// left to right, at 90 bottom to top, at 180 right to left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Rotate,
    Shear,
}

/// Resampling used by the rotation strategy and the canvas fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Nearest,
    Bilinear,
}

impl Interpolation {
    fn filter(self) -> FilterType {
        match self {
            Interpolation::Nearest => FilterType::Nearest,
            Interpolation::Bilinear => FilterType::Triangle,
        }
    }
}

/// What a rotation samples outside the source canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// Repeat the nearest edge pixel.
    #[default]
    Clamp,
    /// Black, `[0, 0, 0]`.
    Fill,
}

/// Which lines of the aligned image get sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortAxis {
    /// Each row, left to right.
    Rows,
    /// Each column, top to bottom.
    Columns,
}

/// Options for [`Aligner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignConfig {
    pub strategy: Strategy,
    pub interpolation: Interpolation,
    /// Grow the canvas on the forward rotation so no source pixel is cut off.
    pub reshape: bool,
    pub boundary: Boundary,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            interpolation: Interpolation::default(),
            reshape: true,
            boundary: Boundary::default(),
        }
    }
}

/// Record of a forward alignment, needed to undo it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    pub axis: SortAxis,
    /// The angle points against increasing line index, so each aligned
    /// line must be read back to front.
    pub reversed: bool,
    kind: AlignmentKind,
    /// Dimensions of the image before alignment.
    source: (u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AlignmentKind {
    Rotation { degrees: f64 },
    RowShear { factor: f64 },
    ColumnShear { factor: f64 },
}

/// Forward and inverse alignment for one configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aligner {
    config: AlignConfig,
}

impl Aligner {
    pub fn new(config: AlignConfig) -> Self {
        Self { config }
    }

    /// Transform `image` so lines along `angle` become rows or columns.
    pub fn forward(&self, image: &RgbImage, angle: Angle) -> (RgbImage, Alignment) {
        let source = image.dimensions();
        let kind = match self.config.strategy {
            Strategy::Rotate => AlignmentKind::Rotation {
                degrees: f64::from(angle.degrees()),
            },
            Strategy::Shear if angle.is_near_horizontal() => AlignmentKind::RowShear {
                factor: tan_degrees(angle.degrees()),
            },
            Strategy::Shear => AlignmentKind::ColumnShear {
                factor: cot_degrees(angle.degrees()),
            },
        };

        // Rotation always lands the angle on +x; shear lines keep the image's
        // own orientation (rows left to right, columns top to bottom).
        let reversed = match kind {
            AlignmentKind::Rotation { .. } => false,
            AlignmentKind::RowShear { .. } => angle.degrees().abs() > 90,
            AlignmentKind::ColumnShear { .. } => angle.degrees() > 0,
        };

        let (aligned, axis) = match kind {
            AlignmentKind::Rotation { degrees } => {
                let canvas = if self.config.reshape {
                    rotated_dimensions(source.0, source.1, -degrees)
                } else {
                    source
                };
                let out = rotate(
                    image,
                    -degrees,
                    canvas,
                    self.config.interpolation,
                    self.config.boundary,
                );
                (out, SortAxis::Rows)
            }
            AlignmentKind::RowShear { factor } => (shear_columns(image, factor), SortAxis::Rows),
            AlignmentKind::ColumnShear { factor } => {
                (shear_rows(image, factor), SortAxis::Columns)
            }
        };

        debug!(
            "aligned {}x{} -> {}x{} ({:?}, sorting {:?}, reversed {})",
            source.0,
            source.1,
            aligned.width(),
            aligned.height(),
            kind,
            axis,
            reversed
        );

        (
            aligned,
            Alignment {
                axis,
                reversed,
                kind,
                source,
            },
        )
    }

    /// Undo [`Aligner::forward`] and return an image with the source's
    /// exact dimensions.
    pub fn inverse(&self, image: &RgbImage, alignment: &Alignment) -> RgbImage {
        let (width, height) = alignment.source;
        let restored = match alignment.kind {
            AlignmentKind::Rotation { degrees } => rotate(
                image,
                degrees,
                (width, height),
                self.config.interpolation,
                self.config.boundary,
            ),
            AlignmentKind::RowShear { factor } => shear_columns(image, -factor),
            AlignmentKind::ColumnShear { factor } => shear_rows(image, -factor),
        };
        fit_to_canvas(&restored, width, height, self.config.interpolation)
    }
}

// ============================================================================
// Trigonometry with exact values at multiples of 45 degrees
// ============================================================================

/// `(sin, cos)` of an angle in degrees, exact at multiples of 90.
fn sin_cos_degrees(degrees: f64) -> (f64, f64) {
    if degrees.fract() == 0.0 && (degrees as i64).rem_euclid(90) == 0 {
        return match (degrees as i64).rem_euclid(360) {
            0 => (0.0, 1.0),
            90 => (1.0, 0.0),
            180 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        };
    }
    degrees.to_radians().sin_cos()
}

fn tan_degrees(degrees: i32) -> f64 {
    match degrees.rem_euclid(180) {
        0 => 0.0,
        45 => 1.0,
        135 => -1.0,
        _ => f64::from(degrees).to_radians().tan(),
    }
}

fn cot_degrees(degrees: i32) -> f64 {
    match degrees.rem_euclid(180) {
        90 => 0.0,
        45 => 1.0,
        135 => -1.0,
        _ => 1.0 / f64::from(degrees).to_radians().tan(),
    }
}

// ============================================================================
// Rotation
// ============================================================================

/// Bounding-box dimensions of a `width` x `height` canvas rotated by `degrees`.
pub fn rotated_dimensions(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let (s, c) = sin_cos_degrees(degrees);
    let (w, h) = (f64::from(width), f64::from(height));
    let out_w = (w * c.abs() + h * s.abs() + 0.5).floor() as u32;
    let out_h = (w * s.abs() + h * c.abs() + 0.5).floor() as u32;
    (out_w.max(1), out_h.max(1))
}

/// Rotate `image` counter-clockwise by `degrees` about its center into a
/// canvas of `canvas` dimensions, sharing that center.
pub fn rotate(
    image: &RgbImage,
    degrees: f64,
    canvas: (u32, u32),
    interpolation: Interpolation,
    boundary: Boundary,
) -> RgbImage {
    let (out_w, out_h) = canvas;
    let (in_w, in_h) = image.dimensions();
    if in_w == 0 || in_h == 0 {
        return RgbImage::new(out_w, out_h);
    }

    let (s, c) = sin_cos_degrees(degrees);
    let cx_in = (f64::from(in_w) - 1.0) / 2.0;
    let cy_in = (f64::from(in_h) - 1.0) / 2.0;
    let cx_out = (f64::from(out_w) - 1.0) / 2.0;
    let cy_out = (f64::from(out_h) - 1.0) / 2.0;

    RgbImage::from_fn(out_w, out_h, |xo, yo| {
        let dx = f64::from(xo) - cx_out;
        let dy = f64::from(yo) - cy_out;
        // Inverse mapping: output pixel -> source coordinate
        let x = dx * c - dy * s + cx_in;
        let y = dx * s + dy * c + cy_in;
        match interpolation {
            Interpolation::Nearest => sample(image, x.round() as i64, y.round() as i64, boundary),
            Interpolation::Bilinear => sample_bilinear(image, x, y, boundary),
        }
    })
}

fn sample(image: &RgbImage, x: i64, y: i64, boundary: Boundary) -> Rgb<u8> {
    let (w, h) = (i64::from(image.width()), i64::from(image.height()));
    let inside = (0..w).contains(&x) && (0..h).contains(&y);
    match (inside, boundary) {
        (true, _) => *image.get_pixel(x as u32, y as u32),
        (false, Boundary::Fill) => BLACK,
        (false, Boundary::Clamp) => *image.get_pixel(x.clamp(0, w - 1) as u32, y.clamp(0, h - 1) as u32),
    }
}

fn sample_bilinear(image: &RgbImage, x: f64, y: f64, boundary: Boundary) -> Rgb<u8> {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (xi, yi) = (x0 as i64, y0 as i64);

    let p00 = sample(image, xi, yi, boundary);
    let p10 = sample(image, xi + 1, yi, boundary);
    let p01 = sample(image, xi, yi + 1, boundary);
    let p11 = sample(image, xi + 1, yi + 1, boundary);

    let mut out = [0u8; 3];
    for (ch, value) in out.iter_mut().enumerate() {
        let top = f64::from(p00[ch]) * (1.0 - fx) + f64::from(p10[ch]) * fx;
        let bottom = f64::from(p01[ch]) * (1.0 - fx) + f64::from(p11[ch]) * fx;
        *value = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

// ============================================================================
// Shear
// ============================================================================

#[inline]
fn shear_offset(factor: f64, position: u32, center: f64) -> i64 {
    ((f64::from(position) - center) * factor).round() as i64
}

/// Displace each column vertically by `round(factor * (x - cx))`, wrapping
/// around the top and bottom edges.
///
/// A line with slope `-factor` (y pointing down) becomes a row.
pub fn shear_columns(image: &RgbImage, factor: f64) -> RgbImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || factor == 0.0 {
        return image.clone();
    }
    let cx = (f64::from(w) - 1.0) / 2.0;
    let offsets: Vec<i64> = (0..w).map(|x| shear_offset(factor, x, cx)).collect();
    RgbImage::from_fn(w, h, |x, y| {
        let src_y = (i64::from(y) - offsets[x as usize]).rem_euclid(i64::from(h));
        *image.get_pixel(x, src_y as u32)
    })
}

/// Displace each row horizontally by `round(factor * (y - cy))`, wrapping
/// around the left and right edges.
pub fn shear_rows(image: &RgbImage, factor: f64) -> RgbImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || factor == 0.0 {
        return image.clone();
    }
    let cy = (f64::from(h) - 1.0) / 2.0;
    let offsets: Vec<i64> = (0..h).map(|y| shear_offset(factor, y, cy)).collect();
    RgbImage::from_fn(w, h, |x, y| {
        let src_x = (i64::from(x) - offsets[y as usize]).rem_euclid(i64::from(w));
        *image.get_pixel(src_x as u32, y)
    })
}

// ============================================================================
// Canvas fit
// ============================================================================

/// Scale `image` uniformly to fit inside `width` x `height` and paste it
/// centered on a black canvas of exactly that size.
///
/// Returns a copy unchanged when the dimensions already match.
pub fn fit_to_canvas(
    image: &RgbImage,
    width: u32,
    height: u32,
    interpolation: Interpolation,
) -> RgbImage {
    let (cur_w, cur_h) = image.dimensions();
    if (cur_w, cur_h) == (width, height) {
        return image.clone();
    }
    let mut canvas = RgbImage::new(width, height);
    if cur_w == 0 || cur_h == 0 || width == 0 || height == 0 {
        return canvas;
    }

    let scale = (f64::from(height) / f64::from(cur_h)).min(f64::from(width) / f64::from(cur_w));
    let new_w = ((f64::from(cur_w) * scale).round() as u32).clamp(1, width);
    let new_h = ((f64::from(cur_h) * scale).round() as u32).clamp(1, height);
    debug!("canvas fit {cur_w}x{cur_h} -> {new_w}x{new_h} on {width}x{height}");

    let resized = imageops::resize(image, new_w, new_h, interpolation.filter());
    let left = i64::from((width - new_w) / 2);
    let top = i64::from((height - new_h) / 2);
    imageops::replace(&mut canvas, &resized, left, top);
    canvas
}
