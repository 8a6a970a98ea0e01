//! Parameter types for a sort run.
//!
//! These types describe *what* to sort and how strongly, never *how* the
//! pixels get there. Every constructor is total: unknown names and
//! out-of-range numbers resolve to a documented default instead of failing,
//! so a shell can pass user input straight through.
//!
//! ## Types
//!
//! | Type | Meaning | Fallback |
//! |---|---|---|
//! | [`Criterion`] | the sort key | unknown names → `Brightness` |
//! | [`Pattern`] | line topology | unknown names → `Linear`; stubs sort linearly |
//! | [`Angle`] | integer degrees | normalized into `[-180, 180)` |
//! | [`Intensity`] | blend fraction in `(0, 1]` | invalid → `1.0` |
//! | [`Randomness`] | entropy or a fixed seed for the blend draws | entropy |
//!
//! [`SortParams`] bundles them for the engine.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The scalar a pixel is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Criterion {
    /// Arithmetic mean of R, G, B.
    #[default]
    Brightness,
    /// HSV hue in `[0, 1)`.
    Hue,
    /// HSV saturation.
    Saturation,
    /// HSL lightness, `(max + min) / 2`.
    Intensity,
    /// Smallest channel.
    Minimum,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Brightness,
        Criterion::Hue,
        Criterion::Saturation,
        Criterion::Intensity,
        Criterion::Minimum,
    ];

    /// Resolve a display name. Matching ignores ASCII case and surrounding
    /// whitespace; anything else resolves to [`Criterion::Brightness`].
    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        match Self::ALL
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(trimmed))
        {
            Some(criterion) => *criterion,
            None => {
                warn!("unknown sort criterion {trimmed:?}, using Brightness");
                Criterion::Brightness
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Criterion::Brightness => "Brightness",
            Criterion::Hue => "Hue",
            Criterion::Saturation => "Saturation",
            Criterion::Intensity => "Intensity",
            Criterion::Minimum => "Minimum",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for Criterion {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<String> for Criterion {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<Criterion> for String {
    fn from(criterion: Criterion) -> Self {
        criterion.name().to_string()
    }
}

/// Line topology.
///
/// Only straight lines are implemented. `Radial`, `Spiral` and `Wave` are
/// accepted so callers can name them, but [`Pattern::effective`] maps them
/// back to `Linear` and the output is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Pattern {
    #[default]
    Linear,
    Radial,
    Spiral,
    Wave,
}

impl Pattern {
    pub const ALL: [Pattern; 4] = [
        Pattern::Linear,
        Pattern::Radial,
        Pattern::Spiral,
        Pattern::Wave,
    ];

    /// Resolve a display name; unknown names resolve to [`Pattern::Linear`].
    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        match Self::ALL
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(trimmed))
        {
            Some(pattern) => *pattern,
            None => {
                warn!("unknown sort pattern {trimmed:?}, using Linear");
                Pattern::Linear
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Pattern::Linear => "Linear",
            Pattern::Radial => "Radial",
            Pattern::Spiral => "Spiral",
            Pattern::Wave => "Wave",
        }
    }

    /// The pattern the engine actually runs.
    pub fn effective(self) -> Pattern {
        if self != Pattern::Linear {
            debug!("pattern {} is not implemented, sorting linearly", self.name());
        }
        Pattern::Linear
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for Pattern {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<String> for Pattern {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.name().to_string()
    }
}

/// Sort direction in integer degrees, counter-clockwise from the +x axis.
///
/// Always stored normalized into `[-180, 180)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Angle(i32);

impl Angle {
    pub fn new(degrees: i32) -> Self {
        // i64 so that i32::MIN + 180 cannot overflow
        let normalized = (i64::from(degrees) + 180).rem_euclid(360) - 180;
        Self(normalized as i32)
    }

    pub fn degrees(self) -> i32 {
        self.0
    }

    pub fn radians(self) -> f64 {
        f64::from(self.0).to_radians()
    }

    /// True when the direction lies within 45 degrees of the horizontal axis.
    pub fn is_near_horizontal(self) -> bool {
        let a = self.0.abs();
        a <= 45 || a >= 135
    }
}

impl From<i32> for Angle {
    fn from(degrees: i32) -> Self {
        Self::new(degrees)
    }
}

/// Fraction of positions that take their sorted pixel, in `(0, 1]`.
///
/// Values above 1 clamp to 1. Zero, negative and non-finite values fall
/// back to the default of 1.0 (full sort).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intensity(f32);

impl Intensity {
    pub const FULL: Intensity = Intensity(1.0);

    pub fn new(value: f32) -> Self {
        if !value.is_finite() || value <= 0.0 {
            warn!("intensity {value} is out of range, using 1.0");
            return Self::FULL;
        }
        Self(value.min(1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn is_full(self) -> bool {
        self.0 >= 1.0
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self::FULL
    }
}

/// Source of the per-pixel blend draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Randomness {
    /// Fresh OS-seeded draws on every call; output is not reproducible.
    #[default]
    Entropy,
    /// Deterministic draws derived from this seed and the line index.
    Seeded(u64),
}

impl From<Option<u64>> for Randomness {
    fn from(seed: Option<u64>) -> Self {
        seed.map_or(Randomness::Entropy, Randomness::Seeded)
    }
}

/// Everything the engine needs to know about one sort run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SortParams {
    pub angle: Angle,
    pub criterion: Criterion,
    pub pattern: Pattern,
    pub intensity: Intensity,
    pub randomness: Randomness,
}

impl SortParams {
    pub fn new(angle: i32, criterion: Criterion, intensity: f32) -> Self {
        Self {
            angle: Angle::new(angle),
            criterion,
            intensity: Intensity::new(intensity),
            ..Self::default()
        }
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.randomness = Randomness::Seeded(seed);
        self
    }
}
