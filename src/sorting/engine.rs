//! The sort pipeline: align, sort every line, undo the alignment.
//!
//! [`SortEngine::transform`] is synchronous and CPU-bound. Shells that must
//! stay responsive run it through [`SortJob`](super::job::SortJob) instead.
//!
//! ```text
//! normalize params → Aligner::forward → for each line: keys → sort → blend → progress
//!                  → Aligner::inverse → canvas fit → image with the input's dimensions
//! ```
//!
//! ## Progress
//!
//! The callback fires once per line, in line order, with
//! `floor(100 * (line + 1) / lines)`. The sequence is non-decreasing and
//! always ends at exactly 100. A zero-area input emits a single 100.
//!
//! ## Randomness
//!
//! Each line gets its own `StdRng`. With [`Randomness::Seeded`] that rng is
//! derived from the seed and the line index, so output is reproducible and
//! does not depend on whether lines ran in parallel.

use super::geometry::{AlignConfig, Aligner, SortAxis};
use super::line::{LineScratch, sort_and_blend};
use super::params::{Randomness, SortParams};
use image::{Rgb, RgbImage};
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SortError {
    #[error("sort cancelled")]
    Cancelled,
    #[error("failed to assemble a {width}x{height} pixel buffer")]
    Buffer { width: u32, height: u32 },
    #[error("sort worker panicked: {0}")]
    Worker(String),
    #[error("could not start sort worker")]
    Spawn(#[from] std::io::Error),
}

/// Engine options, fixed for the lifetime of a [`SortEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub align: AlignConfig,
    /// Sort lines on the rayon pool.
    pub parallel: bool,
    /// Lines per parallel batch. Progress and cancellation are observed
    /// between batches.
    pub batch_lines: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            align: AlignConfig::default(),
            parallel: false,
            batch_lines: 64,
        }
    }
}

/// Cooperative cancellation flag, checked between lines.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Percent complete after finishing line `line` (zero-based) of `total`.
pub fn progress_percent(line: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (((line + 1).min(total) * 100) / total) as u8
}

const LINE_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

fn line_rng(randomness: Randomness, line: usize) -> StdRng {
    match randomness {
        Randomness::Seeded(seed) => {
            StdRng::seed_from_u64(seed ^ (line as u64).wrapping_mul(LINE_SEED_MIX))
        }
        Randomness::Entropy => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Aligned pixels laid out line after line, so every sort line is one
/// contiguous slice regardless of axis.
struct LineBuffer {
    pixels: Vec<Rgb<u8>>,
    line_len: usize,
    width: u32,
    height: u32,
    axis: SortAxis,
}

impl LineBuffer {
    fn gather(image: &RgbImage, axis: SortAxis) -> Self {
        let (width, height) = image.dimensions();
        let (pixels, line_len) = match axis {
            SortAxis::Rows => (image.pixels().copied().collect(), width as usize),
            SortAxis::Columns => (
                (0..width)
                    .flat_map(|x| (0..height).map(move |y| *image.get_pixel(x, y)))
                    .collect(),
                height as usize,
            ),
        };
        Self {
            pixels,
            line_len,
            width,
            height,
            axis,
        }
    }

    fn line_count(&self) -> usize {
        if self.line_len == 0 {
            0
        } else {
            self.pixels.len() / self.line_len
        }
    }

    fn reverse_lines(&mut self) {
        if self.line_len == 0 {
            return;
        }
        for line in self.pixels.chunks_mut(self.line_len) {
            line.reverse();
        }
    }

    fn into_image(self) -> Result<RgbImage, SortError> {
        let (w, h) = (self.width as usize, self.height as usize);
        let raw: Vec<u8> = match self.axis {
            SortAxis::Rows => self.pixels.iter().flat_map(|p| p.0).collect(),
            SortAxis::Columns => (0..h)
                .flat_map(|y| (0..w).map(move |x| (x, y)))
                .flat_map(|(x, y)| self.pixels[x * h + y].0)
                .collect(),
        };
        RgbImage::from_raw(self.width, self.height, raw).ok_or(SortError::Buffer {
            width: self.width,
            height: self.height,
        })
    }
}

/// The pixel-sort pipeline for one engine configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortEngine {
    config: EngineConfig,
    aligner: Aligner,
}

impl SortEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            aligner: Aligner::new(config.align),
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Sort `image` and return a new image of the same dimensions.
    ///
    /// The input is never modified.
    pub fn transform(
        &self,
        image: &RgbImage,
        params: &SortParams,
        on_progress: impl FnMut(u8),
    ) -> Result<RgbImage, SortError> {
        self.transform_with_cancel(image, params, &CancelToken::new(), on_progress)
    }

    /// [`SortEngine::transform`] that stops with [`SortError::Cancelled`]
    /// once `cancel` is set.
    pub fn transform_with_cancel(
        &self,
        image: &RgbImage,
        params: &SortParams,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(u8),
    ) -> Result<RgbImage, SortError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            debug!("zero-area {width}x{height} input, nothing to sort");
            on_progress(100);
            return Ok(image.clone());
        }

        let pattern = params.pattern.effective();
        debug!(
            "sorting {width}x{height} by {} at {} degrees, intensity {}, pattern {pattern}",
            params.criterion,
            params.angle.degrees(),
            params.intensity.value()
        );

        let (aligned, alignment) = self.aligner.forward(image, params.angle);
        let mut lines = LineBuffer::gather(&aligned, alignment.axis);
        drop(aligned);
        if alignment.reversed {
            lines.reverse_lines();
        }

        self.sort_lines(&mut lines, params, cancel, &mut on_progress)?;

        if alignment.reversed {
            lines.reverse_lines();
        }
        let sorted = lines.into_image()?;
        Ok(self.aligner.inverse(&sorted, &alignment))
    }

    fn sort_lines(
        &self,
        lines: &mut LineBuffer,
        params: &SortParams,
        cancel: &CancelToken,
        on_progress: &mut impl FnMut(u8),
    ) -> Result<(), SortError> {
        let total = lines.line_count();
        let line_len = lines.line_len;
        if total == 0 {
            on_progress(100);
            return Ok(());
        }

        // At most one batch of all lines, so the chunk size stays in bounds
        let batch = if self.config.parallel {
            self.config.batch_lines.clamp(1, total)
        } else {
            1
        };
        let criterion = params.criterion;
        let intensity = params.intensity;
        let randomness = params.randomness;
        let mut scratch = LineScratch::new();
        let chunk_len = line_len.saturating_mul(batch);

        for (batch_index, chunk) in lines.pixels.chunks_mut(chunk_len).enumerate() {
            if cancel.is_cancelled() {
                debug!("cancelled before line {}", batch_index * batch);
                return Err(SortError::Cancelled);
            }
            let first = batch_index * batch;

            if self.config.parallel {
                chunk.par_chunks_mut(line_len).enumerate().for_each_init(
                    LineScratch::new,
                    |scratch, (offset, line)| {
                        let mut rng = line_rng(randomness, first + offset);
                        sort_and_blend(line, criterion, intensity, &mut rng, scratch);
                    },
                );
            } else {
                for (offset, line) in chunk.chunks_mut(line_len).enumerate() {
                    let mut rng = line_rng(randomness, first + offset);
                    sort_and_blend(line, criterion, intensity, &mut rng, &mut scratch);
                }
            }

            let done = chunk.len() / line_len;
            for line in first..first + done {
                on_progress(progress_percent(line, total));
            }
        }
        Ok(())
    }
}
