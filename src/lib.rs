//! # pixsort
//!
//! A pixel-sort transform: every straight line of pixels running along a
//! chosen angle is reordered by a color key, optionally only at a random
//! fraction of its positions. The output always has the input's exact
//! dimensions.
//!
//! # Architecture: Align, Sort, Restore
//!
//! ```text
//! 1. Align    image  →  aligned image   (lines along the angle become rows or columns)
//! 2. Sort     lines  →  sorted lines    (key per pixel, stable sort, intensity blend)
//! 3. Restore  aligned → image           (inverse alignment + canvas fit)
//! ```
//!
//! Each line is independent, so step 2 can run on the rayon pool. The whole
//! pipeline is synchronous; [`sorting::SortJob`] moves it onto a worker
//! thread and turns it into a stream of progress, result and error events.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sorting`] | The transform: parameters, color metrics, alignment, engine, background job |
//! | [`config`] | `pixsort.toml` loading, stock defaults, merging and validation |
//! | [`codec`] | Decode any supported file to RGB8 and encode by output extension |
//! | [`output`] | CLI output formatting: run header, progress bar, summary, failures |
//!
//! # Design Decisions
//!
//! ## Total Parameters
//!
//! Nothing about the *parameters* of a sort can fail. Unknown criterion and
//! pattern names resolve to `Brightness` and `Linear`, out-of-range
//! intensities resolve to a full sort, and any integer angle is normalized.
//! The only engine errors are cancellation and internal faults; see
//! [`sorting::SortError`].
//!
//! ## Two Alignment Strategies
//!
//! Rotation ([`sorting::Strategy::Rotate`]) resamples the canvas, so
//! arbitrary angles blur or clip a little at the borders. Shear
//! ([`sorting::Strategy::Shear`]) shifts whole rows or columns by integer
//! amounts with wrap-around: the round trip is an exact permutation, at the
//! cost of lines that are digitally stepped rather than resampled.
//!
//! ## Positional Blend
//!
//! At intensity `p` each position independently takes its sorted pixel with
//! probability `p`. Pixels are never mixed, so every output color exists in
//! the aligned input. A seed makes the draws reproducible regardless of
//! threading, because every line derives its own generator from the seed
//! and its index.

pub mod codec;
pub mod config;
pub mod output;
pub mod sorting;

#[cfg(test)]
pub(crate) mod test_helpers;
