//! QR image rendering

use std::io::Cursor;
use std::str::FromStr;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use serde::{Deserialize, Serialize};

use crate::config::QrConfig;
use crate::utils::errors::{EventPassError, Result};

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// QR error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

impl FromStr for ErrorCorrection {
    type Err = EventPassError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "L" => Ok(ErrorCorrection::L),
            "M" => Ok(ErrorCorrection::M),
            "Q" => Ok(ErrorCorrection::Q),
            "H" => Ok(ErrorCorrection::H),
            other => Err(EventPassError::validation(format!("Unknown error correction level: {}", other))),
        }
    }
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrOptions {
    /// Width and height of the output image in pixels
    pub size: u32,
    /// Quiet zone around the code, in modules
    pub margin: u32,
    pub error_correction: ErrorCorrection,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            size: 200,
            margin: 2,
            error_correction: ErrorCorrection::M,
        }
    }
}

impl QrOptions {
    pub fn from_config(config: &QrConfig) -> Result<Self> {
        Ok(Self {
            size: config.size,
            margin: config.margin,
            error_correction: config.error_correction.parse()?,
        })
    }

    pub fn with_size(self, size: u32) -> Self {
        Self { size, ..self }
    }
}

/// Render `payload` as a square grayscale QR image of exactly `options.size` pixels
pub fn render_qr_image(payload: &str, options: &QrOptions) -> Result<GrayImage> {
    if payload.is_empty() {
        return Err(EventPassError::RenderFailure("QR payload is empty".to_string()));
    }
    if options.size == 0 {
        return Err(EventPassError::RenderFailure("QR size must be greater than 0".to_string()));
    }

    let code = QrCode::with_error_correction_level(payload.as_bytes(), options.error_correction.into())
        .map_err(|e| EventPassError::RenderFailure(format!("Failed to encode QR code: {}", e)))?;

    let width = code.width() as u32;
    let total_modules = width + 2 * options.margin;
    let module_px = options.size / total_modules;
    if module_px == 0 {
        return Err(EventPassError::RenderFailure(format!(
            "Size {}px is too small for a {}-module code with margin {}",
            options.size, width, options.margin
        )));
    }

    // Center the code; leftover pixels widen the quiet zone
    let offset = (options.size - module_px * total_modules) / 2 + options.margin * module_px;
    let colors = code.to_colors();

    let mut image = GrayImage::from_pixel(options.size, options.size, LIGHT);
    for (index, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let module_x = index as u32 % width;
        let module_y = index as u32 / width;
        let x0 = offset + module_x * module_px;
        let y0 = offset + module_y * module_px;
        for y in y0..y0 + module_px {
            for x in x0..x0 + module_px {
                image.put_pixel(x, y, DARK);
            }
        }
    }

    Ok(image)
}

/// Render `payload` as PNG bytes
pub fn render_qr(payload: &str, options: &QrOptions) -> Result<Vec<u8>> {
    let image = render_qr_image(payload, options)?;
    encode_png(DynamicImage::ImageLuma8(image))
}

pub(crate) fn encode_png(image: DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_produces_png_of_requested_size() {
        let png = render_qr("eventpass://attendance/abc", &QrOptions::default()).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!(decoded.width(), 200);
        assert_eq!(decoded.height(), 200);
    }

    #[test]
    fn test_margin_is_light() {
        let image = render_qr_image("hello", &QrOptions::default()).unwrap();
        assert_eq!(*image.get_pixel(0, 0), LIGHT);
        assert_eq!(*image.get_pixel(199, 199), LIGHT);
        assert!(image.pixels().any(|p| *p == DARK));
    }

    #[test]
    fn test_empty_payload_fails() {
        let err = render_qr("", &QrOptions::default()).unwrap_err();
        assert!(matches!(err, EventPassError::RenderFailure(_)));
    }

    #[test]
    fn test_too_small_size_fails() {
        let err = render_qr("hello", &QrOptions::default().with_size(10)).unwrap_err();
        assert!(matches!(err, EventPassError::RenderFailure(_)));

        let err = render_qr("hello", &QrOptions::default().with_size(0)).unwrap_err();
        assert!(matches!(err, EventPassError::RenderFailure(_)));
    }

    #[test]
    fn test_error_correction_parsing() {
        assert_eq!("h".parse::<ErrorCorrection>().unwrap(), ErrorCorrection::H);
        assert!("z".parse::<ErrorCorrection>().is_err());
    }
}
