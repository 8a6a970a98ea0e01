//! Pixel sorting.
//!
//! The pipeline reads an RGB image, reorders the pixels inside every line
//! running along the sort angle, and returns an image of the same size.
//! Nothing in here touches the filesystem; [`crate::codec`] handles files.
//!
//! | Module | Role |
//! |--------|------|
//! | [`params`] | `Criterion`, `Pattern`, `Angle`, `Intensity`, `SortParams` |
//! | [`metrics`] | Pure color metrics on normalized channels |
//! | [`keys`] | One sort key per pixel of a line |
//! | [`line`] | Stable sort of one line and the intensity blend |
//! | [`geometry`] | Rotation and shear alignment, canvas fit |
//! | [`engine`] | `SortEngine`: the full pipeline with progress and cancellation |
//! | [`job`] | `SortJob`: the pipeline on a worker thread with an event channel |

pub mod engine;
pub mod geometry;
pub mod job;
pub mod keys;
pub mod line;
pub mod metrics;
pub mod params;

pub use engine::{CancelToken, EngineConfig, SortEngine, SortError};
pub use geometry::{AlignConfig, Boundary, Interpolation, Strategy};
pub use job::{SortEvent, SortFailure, SortJob};
pub use params::{Angle, Criterion, Intensity, Pattern, Randomness, SortParams};
