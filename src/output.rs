//! CLI output formatting.
//!
//! # Output Format
//!
//! ```text
//! Sorting photo.jpg (640x480)
//!     Criterion: Hue
//!     Angle: 30°
//!     Intensity: 100%
//!     Strategy: rotate
//! [####################....................]  50%
//! [########################################] 100%
//! Wrote sorted.png (640x480) in 1.24s
//! ```
//!
//! On failure the last line is replaced by the error and its causes:
//!
//! ```text
//! Sort failed: sort cancelled
//! ```
//!
//! # Architecture
//!
//! Every `format_*` function is pure and returns strings; the binary's
//! printer thread does the writing.

use crate::sorting::{EngineConfig, Pattern, SortFailure, SortParams, Strategy};
use std::path::Path;
use std::time::Duration;

/// Width of the progress bar in characters, brackets excluded.
pub const BAR_WIDTH: usize = 40;

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn strategy_label(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Rotate => "rotate",
        Strategy::Shear => "shear",
    }
}

/// Header lines describing the run about to start.
pub fn format_run_header(
    input: &Path,
    dimensions: (u32, u32),
    params: &SortParams,
    engine: &EngineConfig,
) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Sorting {} ({}x{})",
            file_label(input),
            dimensions.0,
            dimensions.1
        ),
        format!("    Criterion: {}", params.criterion),
        format!("    Angle: {}°", params.angle.degrees()),
    ];
    if params.pattern != Pattern::Linear {
        lines.push(format!("    Pattern: {} (sorted as Linear)", params.pattern));
    }
    lines.push(format!(
        "    Intensity: {}%",
        (params.intensity.value() * 100.0).round() as u32
    ));
    lines.push(format!("    Strategy: {}", strategy_label(engine.align.strategy)));
    lines
}

/// One progress bar line. Values above 100 draw as 100.
pub fn format_progress(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// Whether `percent` starts a new `step`-sized band compared to `previous`.
///
/// The engine reports once per line; the CLI only draws a bar when the
/// band changes, and always for the first report and for 100.
pub fn is_progress_milestone(previous: Option<u8>, percent: u8, step: u8) -> bool {
    let step = step.max(1);
    match previous {
        None => true,
        Some(prev) if percent == 100 => prev != 100,
        Some(prev) => percent / step > prev / step,
    }
}

/// Completion line for a written output file.
pub fn format_summary(output: &Path, dimensions: (u32, u32), elapsed: Duration) -> Vec<String> {
    vec![format!(
        "Wrote {} ({}x{}) in {:.2}s",
        file_label(output),
        dimensions.0,
        dimensions.1,
        elapsed.as_secs_f64()
    )]
}

/// The failure message followed by one indented line per cause.
pub fn format_failure(failure: &SortFailure) -> Vec<String> {
    let mut lines = vec![format!("Sort failed: {}", failure.message)];
    lines.extend(
        failure
            .causes
            .iter()
            .map(|cause| format!("    Caused by: {cause}")),
    );
    lines
}
