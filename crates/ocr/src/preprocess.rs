use image::{DynamicImage, GrayImage};
use std::io::Cursor;
use thiserror::Error;

/// Longest side handed to the OCR engine; bigger photos are scaled down.
const MAX_SIDE: u32 = 2800;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Decode a phone photo (JPEG / PNG / WEBP / …) into 8-bit grayscale.
pub fn decode_grayscale(data: &[u8]) -> Result<GrayImage, PreprocessError> {
    let img = image::load_from_memory(data)?;
    let img = if img.width() > MAX_SIDE || img.height() > MAX_SIDE {
        img.resize(MAX_SIDE, MAX_SIDE, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };
    Ok(img.to_luma8())
}

/// PNG-encode a grayscale image for engines that take encoded bytes.
pub fn encode_png(gray: &GrayImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(gray.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
