//! Configuration file support.
//!
//! Handles loading, validating and merging `pixsort.toml`. Stock defaults are
//! serialized to a TOML table, the user's file is merged on top of it key by
//! key, and the result is deserialized and validated. Command-line flags are
//! applied afterwards by the binary.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [sort]
//! angle = 0                 # Degrees, counter-clockwise from the +x axis
//! criterion = "Brightness"  # Brightness, Hue, Saturation, Intensity, Minimum
//! pattern = "Linear"        # Linear (Radial, Spiral, Wave sort linearly)
//! intensity = 1.0           # Fraction of positions that take the sorted pixel
//! # seed = 42               # Fixed seed for reproducible partial sorts
//!
//! [geometry]
//! strategy = "rotate"       # rotate or shear
//! interpolation = "nearest" # nearest or bilinear
//! reshape = true            # Grow the canvas while rotated
//! boundary = "clamp"        # clamp or fill (black)
//!
//! [processing]
//! # max_processes = 4       # Worker threads (omit for auto = CPU cores)
//! parallel = false          # Sort lines on the thread pool
//! batch_lines = 64          # Lines per parallel batch
//! ```
//!
//! ## Partial Configuration
//!
//! Files are sparse; override just the values you want:
//!
//! ```toml
//! [sort]
//! criterion = "Hue"
//! angle = 30
//! ```
//!
//! Unknown keys are rejected to catch typos early. Unknown criterion and
//! pattern *names* are not: they fall back to their defaults, the same way
//! the engine treats them.

use crate::sorting::{
    AlignConfig, Angle, Boundary, Criterion, EngineConfig, Intensity, Interpolation, Pattern,
    SortParams, Strategy,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "pixsort.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `pixsort.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PixsortConfig {
    pub sort: SortConfig,
    pub geometry: GeometryConfig,
    pub processing: ProcessingConfig,
}

impl PixsortConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.batch_lines == 0 {
            return Err(ConfigError::Validation(
                "processing.batch_lines must be at least 1".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1 (omit for auto)".into(),
            ));
        }
        Ok(())
    }

    pub fn sort_params(&self) -> SortParams {
        SortParams {
            angle: Angle::new(self.sort.angle),
            criterion: self.sort.criterion,
            pattern: self.sort.pattern,
            intensity: Intensity::new(self.sort.intensity),
            randomness: self.sort.seed.into(),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            align: AlignConfig {
                strategy: self.geometry.strategy,
                interpolation: self.geometry.interpolation,
                reshape: self.geometry.reshape,
                boundary: self.geometry.boundary,
            },
            parallel: self.processing.parallel,
            batch_lines: self.processing.batch_lines,
        }
    }
}

/// What to sort by and how strongly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SortConfig {
    pub angle: i32,
    pub criterion: Criterion,
    pub pattern: Pattern,
    pub intensity: f32,
    /// Seed for the intensity blend. Absent means a fresh seed per run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            angle: 0,
            criterion: Criterion::default(),
            pattern: Pattern::default(),
            intensity: 1.0,
            seed: None,
        }
    }
}

/// How lines along the angle are made axis-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeometryConfig {
    pub strategy: Strategy,
    pub interpolation: Interpolation,
    pub reshape: bool,
    pub boundary: Boundary,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        let align = AlignConfig::default();
        Self {
            strategy: align.strategy,
            interpolation: align.interpolation,
            reshape: align.reshape,
            boundary: align.boundary,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Size of the global thread pool.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
    /// Sort lines concurrently on the thread pool.
    pub parallel: bool,
    /// Lines per parallel batch; progress is reported between batches.
    pub batch_lines: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_processes: None,
            parallel: false,
            batch_lines: EngineConfig::default().batch_lines,
        }
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Stock defaults as a TOML table, the base every user file merges onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PixsortConfig::default())?)
}

/// Recursively merge `overlay` onto `base`. Tables merge key by key; any
/// other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse the TOML file at `path`, or `None` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    read_toml(path).map(Some)
}

fn read_toml(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PixsortConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PixsortConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration.
///
/// An explicit path must exist. Without one, `pixsort.toml` in the working
/// directory is used if present, and stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<PixsortConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(read_toml(path)?),
        None => load_raw_config(Path::new(CONFIG_FILE_NAME))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `pixsort.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pixsort configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# pixsort reads ./pixsort.toml, or the file passed with --config.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Sort
# ---------------------------------------------------------------------------
[sort]
# Direction of the sorted lines in degrees, counter-clockwise from the
# +x axis. Any integer is accepted and normalized into [-180, 180).
angle = 0

# Key each pixel is ordered by: Brightness, Hue, Saturation, Intensity
# (HSL lightness) or Minimum (smallest channel). Unknown names fall back
# to Brightness.
criterion = "Brightness"

# Line topology. Only Linear is implemented; Radial, Spiral and Wave are
# accepted and sort linearly.
pattern = "Linear"

# Fraction of positions in each line that take their sorted pixel, in
# (0, 1]. Values above 1 clamp to 1; zero or less means 1.
intensity = 1.0

# Fixed seed for the intensity blend, for reproducible partial sorts.
# seed = 42

# ---------------------------------------------------------------------------
# Geometry
# ---------------------------------------------------------------------------
[geometry]
# rotate: rotate the canvas so lines become rows, sort, rotate back.
# shear:  shift whole rows or columns with wrap-around; lossless.
strategy = "rotate"

# Resampling for rotation: nearest or bilinear.
interpolation = "nearest"

# Grow the canvas while rotated so no pixel is cut off.
reshape = true

# What rotation samples outside the image: clamp (nearest edge pixel)
# or fill (black).
boundary = "clamp"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum worker threads.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# Sort lines concurrently. Output is identical either way when a seed is set.
parallel = false

# Lines per parallel batch. Progress and cancellation are checked between
# batches.
batch_lines = 64
"##
}
