//! QR code rendering.

use image::{DynamicImage, GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};

use crate::config::ErrorCorrection;
use crate::errors::{Error, Result};

/// Modules of light border required around the symbol
const QUIET_ZONE: u32 = 4;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::Low => EcLevel::L,
            ErrorCorrection::Medium => EcLevel::M,
            ErrorCorrection::Quartile => EcLevel::Q,
            ErrorCorrection::High => EcLevel::H,
        }
    }
}

/// Encode `content` and rasterise it onto a `size` x `size` white canvas.
///
/// Modules are drawn at the largest whole-pixel scale that fits and the symbol is centred. When
/// the symbol plus quiet zone is wider than `size` the canvas grows to one pixel per module.
pub fn render(content: &str, level: ErrorCorrection, size: u32) -> Result<DynamicImage> {
    if content.is_empty() {
        return Err(Error::EmptyContent { symbology: "a QR code" });
    }
    let code = QrCode::with_error_correction_level(content.as_bytes(), level.into())?;
    let modules = code.width() as u32;
    let colors = code.to_colors();

    let span = modules + 2 * QUIET_ZONE;
    let scale = (size / span).max(1);
    let canvas_size = size.max(span);
    let offset = (canvas_size - span * scale) / 2 + QUIET_ZONE * scale;

    let mut canvas = GrayImage::from_pixel(canvas_size, canvas_size, LIGHT);
    for (index, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let (col, row) = (index as u32 % modules, index as u32 / modules);
        let (x0, y0) = (offset + col * scale, offset + row * scale);
        for y in y0..y0 + scale {
            for x in x0..x0 + scale {
                canvas.put_pixel(x, y, DARK);
            }
        }
    }

    tracing::debug!(modules, scale, canvas_size, "rendered QR code");
    Ok(DynamicImage::ImageLuma8(canvas))
}
