//! Code 128 barcode rendering.

use barcoders::sym::code128::Code128;
use image::{DynamicImage, GrayImage, Luma};

use crate::errors::{Error, Result};

/// Prefix selecting Code 128 character set B (printable ASCII)
const CHARSET_B: char = 'Ɓ';

const SYMBOLOGY: &str = "Code 128";

/// Encode `content` as Code 128 and draw it `height` pixels tall, `module_width` pixels per
/// module. Width is therefore proportional to the encoded length.
pub fn render(content: &str, height: u32, module_width: u32) -> Result<DynamicImage> {
    if content.is_empty() {
        return Err(Error::EmptyContent { symbology: SYMBOLOGY });
    }
    // barcoders reads its charset selectors (À, Ɓ, Ć) as control characters, not data
    if let Some(invalid) = content.chars().find(|c| !(' '..='~').contains(c)) {
        return Err(Error::Barcode {
            message: format!("cannot encode {content:?} as {SYMBOLOGY}: {invalid:?} is not printable ASCII"),
        });
    }

    let symbol = Code128::new(format!("{CHARSET_B}{content}")).map_err(|e| Error::Barcode {
        message: format!("cannot encode {content:?} as {SYMBOLOGY}: {e}"),
    })?;
    let modules = symbol.encode();

    let width = modules.len() as u32 * module_width;
    let mut image = GrayImage::from_pixel(width, height, Luma([255]));
    for (index, _) in modules.iter().enumerate().filter(|(_, bar)| **bar == 1) {
        let x0 = index as u32 * module_width;
        for x in x0..x0 + module_width {
            for y in 0..height {
                image.put_pixel(x, y, Luma([0]));
            }
        }
    }

    Ok(DynamicImage::ImageLuma8(image))
}
