//! Image preparation: turn an uploaded photo into a size-bounded,
//! base64-encoded JPEG for model input.
//!
//! Everything here is input validation and a pure image transform — no
//! model calls. Failures are client errors and never reach the pipeline.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use thiserror::Error;
use tracing::debug;

/// Maximum accepted upload size. Prevents OOM on adversarial files.
const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Pixel-count ceiling applied before full decode (decompression bombs).
const MAX_PIXELS: u64 = 89_478_485; // matches Pillow's default decode guard

/// Longest edge of the image handed to the model.
const MAX_DIMENSION: u32 = 1024;

/// Encoded-output budget, chosen to keep the base64 form comfortably
/// under typical model-server request limits.
const MAX_ENCODED_KB: usize = 4800;

/// Starting JPEG quality and the step between attempts.
const START_QUALITY: u8 = 85;
const QUALITY_STEP: u8 = 15;
/// Below this quality, shrink dimensions instead of degrading further.
const MIN_QUALITY: u8 = 20;
/// Quality after a dimension shrink.
const RESET_QUALITY: u8 = 50;
/// Shrink factor when quality alone cannot meet the budget.
const SHRINK_FACTOR: f32 = 0.8;
/// Give up shrinking below this edge length.
const MIN_DIMENSION: u32 = 100;
/// Hard cap on encode attempts.
const MAX_ATTEMPTS: u32 = 5;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Failed to read image file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Image file exceeds {limit_mb}MB limit ({actual_mb}MB)")]
    TooLarge { limit_mb: u64, actual_mb: u64 },

    #[error("Image dimensions {width}x{height} exceed the pixel limit")]
    TooManyPixels { width: u32, height: u32 },

    #[error("Not a decodable image: {0}")]
    Decode(String),

    #[error("Could not compress image under {0}KB")]
    BudgetExceeded(usize),
}

/// A prepared image: base64 JPEG plus the dimensions it was encoded at.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub base64: String,
    pub width: u32,
    pub height: u32,
}

/// Read, validate, bound, and encode an image file.
pub fn prepare_file(path: &Path) -> Result<PreparedImage, PrepError> {
    let metadata = std::fs::metadata(path)?;
    if metadata.len() > MAX_FILE_BYTES {
        return Err(PrepError::TooLarge {
            limit_mb: MAX_FILE_BYTES / (1024 * 1024),
            actual_mb: metadata.len() / (1024 * 1024),
        });
    }

    let bytes = std::fs::read(path)?;
    prepare_bytes(&bytes)
}

/// Validate and encode raw image bytes.
pub fn prepare_bytes(bytes: &[u8]) -> Result<PreparedImage, PrepError> {
    if bytes.len() as u64 > MAX_FILE_BYTES {
        return Err(PrepError::TooLarge {
            limit_mb: MAX_FILE_BYTES / (1024 * 1024),
            actual_mb: bytes.len() as u64 / (1024 * 1024),
        });
    }

    // Dimension check from the header alone, before committing to a
    // full decode of a potentially hostile file.
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PrepError::Decode(e.to_string()))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| PrepError::Decode(e.to_string()))?;
    if (width as u64) * (height as u64) > MAX_PIXELS {
        return Err(PrepError::TooManyPixels { width, height });
    }

    let decoded =
        image::load_from_memory(bytes).map_err(|e| PrepError::Decode(e.to_string()))?;

    let bounded = downscale(decoded);
    encode_within_budget(bounded.to_rgb8())
}

/// Scale so the longest edge is at most `MAX_DIMENSION`. Small images
/// are never upscaled.
fn downscale(img: DynamicImage) -> DynamicImage {
    let (w, h) = img.dimensions();
    let largest = w.max(h);
    if largest <= MAX_DIMENSION {
        return img;
    }

    let scale = MAX_DIMENSION as f32 / largest as f32;
    let new_w = ((w as f32 * scale).round() as u32).max(1);
    let new_h = ((h as f32 * scale).round() as u32).max(1);
    debug!(from = format!("{w}x{h}"), to = format!("{new_w}x{new_h}"), "downscaling image");
    img.resize_exact(new_w, new_h, FilterType::CatmullRom)
}

/// Re-encode at decreasing quality, shrinking dimensions once quality
/// bottoms out, until the output fits the byte budget.
fn encode_within_budget(mut img: RgbImage) -> Result<PreparedImage, PrepError> {
    let budget = MAX_ENCODED_KB * 1024;
    let mut quality = START_QUALITY;

    for attempt in 0..MAX_ATTEMPTS {
        let jpeg = encode_jpeg(&img, quality)?;
        if jpeg.len() <= budget {
            debug!(
                attempt,
                quality,
                width = img.width(),
                height = img.height(),
                bytes = jpeg.len(),
                "image encoded within budget"
            );
            return Ok(PreparedImage {
                base64: BASE64.encode(&jpeg),
                width: img.width(),
                height: img.height(),
            });
        }

        if quality >= MIN_QUALITY + QUALITY_STEP {
            quality -= QUALITY_STEP;
        } else {
            let new_w = ((img.width() as f32 * SHRINK_FACTOR) as u32).max(1);
            let new_h = ((img.height() as f32 * SHRINK_FACTOR) as u32).max(1);
            if new_w.min(new_h) < MIN_DIMENSION {
                break;
            }
            img = image::imageops::resize(&img, new_w, new_h, FilterType::CatmullRom);
            quality = RESET_QUALITY;
        }
    }

    Err(PrepError::BudgetExceeded(MAX_ENCODED_KB))
}

fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, PrepError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| PrepError::Decode(format!("JPEG encoding failed: {e}")))?;
    Ok(out)
}
