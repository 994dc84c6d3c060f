//! Crop-image heuristic
//!
//! Decides whether an upload is plausibly a crop photo before a prediction
//! is made. Two modes, selected by [`ValidationMode`]:
//!
//! - **Green dominance**: resize to 224×224 RGB and average
//!   `G − (R + B) / 2` over every pixel; below the threshold is rejected.
//! - **Dimensions**: read only the header; width and height must both reach
//!   the configured minimum.

use crate::config::{DetectionConfig, ValidationMode};
use crate::{Error, Result};
use image::imageops::FilterType;
use image::{ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Side length of the square copy the green score is computed on
pub const SAMPLE_SIZE: u32 = 224;

/// Bicubic resampling for the score copy
pub const SAMPLE_FILTER: FilterType = FilterType::CatmullRom;

/// Client-facing message for uploads that fail the heuristic
pub const NOT_A_CROP_MESSAGE: &str = "Please upload a valid crop image";

/// Facts about an accepted upload
#[derive(Debug, Clone, Copy)]
pub struct ImageCheck {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Present in green-dominance mode only
    pub green_score: Option<f32>,
}

impl ImageCheck {
    /// File extension for storing the upload
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }
}

/// Run the configured heuristic over raw upload bytes
///
/// Undecodable data yields `Error::Image`; a decodable image that fails the
/// heuristic yields `Error::InvalidInput(NOT_A_CROP_MESSAGE)`.
pub fn validate_image(bytes: &[u8], config: &DetectionConfig) -> Result<ImageCheck> {
    let format = image::guess_format(bytes)?;

    match config.validation {
        ValidationMode::GreenDominance => {
            let rgb = image::load_from_memory_with_format(bytes, format)?.to_rgb8();
            let (width, height) = rgb.dimensions();
            let score = green_score(&rgb);
            debug!(width, height, score, "Computed green score");

            if score < config.green_threshold {
                return Err(Error::InvalidInput(NOT_A_CROP_MESSAGE.to_string()));
            }

            Ok(ImageCheck {
                format,
                width,
                height,
                green_score: Some(score),
            })
        }
        ValidationMode::Dimensions => {
            let check = read_header(bytes, format)?;
            debug!(width = check.width, height = check.height, "Read image dimensions");

            if check.width < config.min_dimension || check.height < config.min_dimension {
                return Err(Error::InvalidInput(NOT_A_CROP_MESSAGE.to_string()));
            }
            Ok(check)
        }
    }
}

/// Identify an upload without applying the crop heuristic
///
/// Used for history uploads, which only need to be a readable image.
pub fn inspect_image(bytes: &[u8]) -> Result<ImageCheck> {
    let format = image::guess_format(bytes)?;
    read_header(bytes, format)
}

fn read_header(bytes: &[u8], format: ImageFormat) -> Result<ImageCheck> {
    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format).into_dimensions()?;
    Ok(ImageCheck {
        format,
        width,
        height,
        green_score: None,
    })
}

/// Mean green dominance of an image resampled to [`SAMPLE_SIZE`]²
pub fn green_score(image: &RgbImage) -> f32 {
    let sample = image::imageops::resize(image, SAMPLE_SIZE, SAMPLE_SIZE, SAMPLE_FILTER);

    let total: f64 = sample
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            f64::from(g) - (f64::from(r) + f64::from(b)) / 2.0
        })
        .sum();

    (total / f64::from(SAMPLE_SIZE * SAMPLE_SIZE)) as f32
}
