//! Image preprocessing for OCR.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::median_filter;
use tracing::debug;

use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// 3x3 sharpen kernel, normalized by its sum (16).
const SHARPEN_KERNEL: [i32; 9] = [-2, -2, -2, -2, 32, -2, -2, -2, -2];
const SHARPEN_DIVISOR: i32 = 16;

/// Image preprocessor for the OCR ensemble.
pub struct ImagePreprocessor {
    /// Integer upscale factor.
    upscale: u32,
    /// Contrast boost of the enhanced pass.
    contrast_factor: f64,
    /// Median filter radius of the enhanced pass.
    median_radius: u32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            upscale: 2,
            contrast_factor: 1.8,
            median_radius: 1,
        }
    }

    /// Create a preprocessor from OCR configuration.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            upscale: config.upscale.max(1),
            contrast_factor: config.contrast_factor,
            median_radius: config.median_radius,
        }
    }

    /// Decode image bytes and undo EXIF rotation.
    pub fn load(&self, data: &[u8]) -> Result<DynamicImage, OcrError> {
        let image =
            image::load_from_memory(data).map_err(|e| OcrError::InvalidImage(e.to_string()))?;
        let orientation = read_exif_orientation(data);
        if orientation != 1 {
            debug!("Applying EXIF orientation {}", orientation);
        }
        Ok(apply_orientation(image, orientation))
    }

    /// Grayscale and upscale. Input to the base pass, and the starting point of the
    /// enhanced pass.
    pub fn prepare_base(&self, image: &DynamicImage) -> Result<GrayImage, OcrError> {
        let gray = to_grayscale(image);
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage("image has no pixels".to_string()));
        }

        let (new_width, new_height) = width
            .checked_mul(self.upscale)
            .zip(height.checked_mul(self.upscale))
            .ok_or_else(|| {
                OcrError::Preprocessing(format!(
                    "{}x{} cannot be upscaled {}x",
                    width, height, self.upscale
                ))
            })?;

        debug!(
            "Upscaling {}x{} -> {}x{}",
            width, height, new_width, new_height
        );

        if self.upscale == 1 {
            return Ok(gray);
        }
        Ok(image::imageops::resize(
            &gray,
            new_width,
            new_height,
            FilterType::Lanczos3,
        ))
    }

    /// Autocontrast, contrast boost, median denoise, sharpen.
    pub fn enhance(&self, base: &GrayImage) -> GrayImage {
        let stretched = autocontrast(base);
        let boosted = adjust_contrast(&stretched, self.contrast_factor);
        let denoised = if self.median_radius > 0 {
            median_filter(&boosted, self.median_radius, self.median_radius)
        } else {
            boosted
        };
        sharpen(&denoised)
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Read EXIF orientation tag from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Apply an EXIF orientation transform.
///
/// 1 = normal, 2 = mirrored, 3 = 180, 4 = flipped vertically,
/// 5 = mirrored + 90 CW, 6 = 90 CW, 7 = mirrored + 270 CW, 8 = 270 CW.
pub fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

/// ITU-R 601-2 luma with 16-bit fixed point weights. Alpha is dropped.
fn to_grayscale(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let luma = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
        gray.put_pixel(x, y, Luma([luma.min(255) as u8]));
    }

    gray
}

/// Stretch the darkest pixel to 0 and the brightest to 255.
fn autocontrast(image: &GrayImage) -> GrayImage {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let lo = histogram.iter().position(|&count| count > 0);
    let hi = histogram.iter().rposition(|&count| count > 0);
    let (lo, hi) = match (lo, hi) {
        (Some(lo), Some(hi)) if hi > lo => (lo as f64, hi as f64),
        _ => return image.clone(),
    };

    let scale = 255.0 / (hi - lo);
    let offset = -lo * scale;
    let mut lut = [0u8; 256];
    for (ix, slot) in lut.iter_mut().enumerate() {
        let value = (ix as f64 * scale + offset) as i32;
        *slot = value.clamp(0, 255) as u8;
    }

    map_pixels(image, &lut)
}

/// Blend towards (factor < 1) or away from (factor > 1) the mean gray level.
fn adjust_contrast(image: &GrayImage, factor: f64) -> GrayImage {
    let count = image.width() as f64 * image.height() as f64;
    if count == 0.0 {
        return image.clone();
    }
    let sum: f64 = image.pixels().map(|p| p[0] as f64).sum();
    let mean = (sum / count + 0.5).floor();

    let mut lut = [0u8; 256];
    for (ix, slot) in lut.iter_mut().enumerate() {
        let value = mean + factor * (ix as f64 - mean);
        *slot = if value <= 0.0 {
            0
        } else if value >= 255.0 {
            255
        } else {
            value as u8
        };
    }

    map_pixels(image, &lut)
}

/// 3x3 sharpen; the outermost rows and columns are copied unchanged.
fn sharpen(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = image.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = 0i32;
            for (k, weight) in SHARPEN_KERNEL.iter().enumerate() {
                let dx = (k % 3) as u32;
                let dy = (k / 3) as u32;
                acc += weight * image.get_pixel(x + dx - 1, y + dy - 1)[0] as i32;
            }
            let value = (acc as f32 / SHARPEN_DIVISOR as f32).round() as i32;
            out.put_pixel(x, y, Luma([value.clamp(0, 255) as u8]));
        }
    }

    out
}

fn map_pixels(image: &GrayImage, lut: &[u8; 256]) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel[0] = lut[pixel[0] as usize];
    }
    out
}
