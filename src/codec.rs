//! Reading and writing image files.
//!
//! The engine only sees `RgbImage`. Everything is decoded to 8-bit RGB on
//! the way in (alpha and extra precision are dropped) and written back out
//! in the format named by the output extension.
//!
//! | Extension | Format |
//! |---|---|
//! | `png` (or none) | PNG |
//! | `jpg`, `jpeg` | JPEG |
//! | `tif`, `tiff` | TIFF |
//! | `webp` | WebP (lossless) |
//! | `bmp` | BMP |

use image::{ImageError, ImageFormat, ImageReader, RgbImage};
use log::debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

const OUTPUT_FORMATS: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
];

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("failed to encode {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("unsupported output format {0:?}")]
    UnsupportedFormat(String),
}

/// Decode the image at `path` into 8-bit RGB.
///
/// The format is sniffed from the file contents, not the extension.
pub fn load_rgb(path: &Path) -> Result<RgbImage, CodecError> {
    let image = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|source| CodecError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(
        "decoded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image.to_rgb8())
}

/// Output format for `path`, from its extension. No extension means PNG.
pub fn output_format(path: &Path) -> Result<ImageFormat, CodecError> {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Ok(ImageFormat::Png);
    };
    OUTPUT_FORMATS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(ext))
        .map(|(_, format)| *format)
        .filter(|format| format.writing_enabled())
        .ok_or_else(|| CodecError::UnsupportedFormat(ext.to_string()))
}

/// Encode `image` to `path` in the format its extension names.
pub fn save_rgb(image: &RgbImage, path: &Path) -> Result<(), CodecError> {
    let format = output_format(path)?;
    image
        .save_with_format(path, format)
        .map_err(|source| CodecError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("encoded {} as {format:?}", path.display());
    Ok(())
}
