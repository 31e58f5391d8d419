//! Image decode, resize, rotate and JPEG encode.

use image::{DynamicImage, Rgba, RgbaImage, codecs::jpeg::JpegEncoder, imageops::FilterType};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

use crate::errors::{Error, Result};

/// Fill for canvas areas not covered by a rotated image
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Decode an uploaded image, detecting the format from its content.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Encode as baseline JPEG. Alpha is dropped, so transparent pixels come out black.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
    Ok(out)
}

/// Resolve the output size of a resize. A zero dimension is derived from the other one so the
/// source aspect ratio is kept.
pub fn target_dimensions(source: (u32, u32), width: u32, height: u32) -> Result<(u32, u32)> {
    let (src_w, src_h) = source;
    match (width, height) {
        (0, 0) => Err(Error::bad_request("width and height cannot both be zero")),
        (0, h) => Ok((scale(h, src_w, src_h), h)),
        (w, 0) => Ok((w, scale(w, src_h, src_w))),
        (w, h) => Ok((w, h)),
    }
}

fn scale(known: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = (known as f64 * numerator as f64 / denominator as f64).round();
    (scaled as u32).max(1)
}

/// Resize with Lanczos3 resampling.
pub fn resize(image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage> {
    let (w, h) = target_dimensions((image.width(), image.height()), width, height)?;
    if (w, h) == (image.width(), image.height()) {
        return Ok(image.clone());
    }
    Ok(image.resize_exact(w, h, FilterType::Lanczos3))
}

/// Rotate counter-clockwise by `degrees`.
///
/// Quarter turns are exact pixel transposes. Any other angle is resampled onto a canvas large
/// enough to hold the whole rotated image, with transparent corners.
pub fn rotate(image: DynamicImage, degrees: i64) -> DynamicImage {
    match degrees.rem_euclid(360) {
        0 => image,
        90 => image.rotate270(),
        180 => image.rotate180(),
        270 => image.rotate90(),
        angle => rotate_onto_canvas(&image.to_rgba8(), angle as f32),
    }
}

fn rotate_onto_canvas(source: &RgbaImage, degrees: f32) -> DynamicImage {
    let (width, height) = source.dimensions();
    let (out_w, out_h) = rotated_bounds(width, height, degrees);

    // imageproc rotates clockwise for positive angles in image space (y grows downwards)
    let projection = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
        * Projection::rotate(-degrees.to_radians())
        * Projection::translate(-(width as f32) / 2.0, -(height as f32) / 2.0);

    let mut canvas = RgbaImage::from_pixel(out_w, out_h, TRANSPARENT);
    warp_into(source, &projection, Interpolation::Bicubic, TRANSPARENT, &mut canvas);
    DynamicImage::ImageRgba8(canvas)
}

/// Bounding box of a `width` x `height` rectangle rotated by `degrees`.
pub fn rotated_bounds(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (w, h) = (width as f32, height as f32);
    let out_w = w * cos.abs() + h * sin.abs();
    let out_h = w * sin.abs() + h * cos.abs();
    (snap(out_w), snap(out_h))
}

// Ceil, ignoring float noise just above an integer
fn snap(extent: f32) -> u32 {
    ((extent - 0.01).ceil() as u32).max(1)
}
