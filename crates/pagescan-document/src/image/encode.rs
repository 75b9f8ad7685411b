// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-page encoding for images mode.

use ::image::codecs::jpeg::JpegEncoder;
use ::image::{DynamicImage, ImageError, ImageFormat};
use pagescan_core::ImageEncoding;

/// Encode a page bitmap as JPEG (at `jpeg_quality`, 1-100) or PNG.
pub fn encode_page(
    image: &DynamicImage,
    encoding: ImageEncoding,
    jpeg_quality: u8,
) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    match encoding {
        ImageEncoding::Jpeg => {
            // JPEG has no alpha; flatten to RGB first.
            let rgb = image.to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality);
            rgb.write_with_encoder(encoder)?;
        }
        ImageEncoding::Png => {
            let mut cursor = std::io::Cursor::new(&mut buffer);
            image.write_to(&mut cursor, ImageFormat::Png)?;
        }
    }
    Ok(buffer)
}
