//! QR artifact rendering for payment URLs.

use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

use crate::error::PaylinkError;

/// Pixels per QR module. With the renderer's default 4-module quiet zone
/// this matches the artifact the reference hardware scanners were tuned
/// against.
pub const MODULE_PIXELS: u32 = 10;

/// Render `data` as a PNG QR code (error-correction level L).
pub fn encode_png(data: &str) -> Result<Vec<u8>, PaylinkError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::L)
        .map_err(|e| PaylinkError::Qr(e.to_string()))?;
    let rendered = code
        .render::<Luma<u8>>()
        .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(rendered)
        .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| PaylinkError::Qr(e.to_string()))?;
    Ok(png)
}

/// Inline `data:` URI for embedding the PNG directly in a page.
pub fn data_uri(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, png)
    )
}
