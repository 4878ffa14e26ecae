//! Final rasterization step of a crop commit: cut the source-pixel rect
//! out of the original raster at 1:1 scale and encode it as a lossless
//! PNG, embedded as a `data:` URL the catalog can display directly.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

use crate::geometry::PixelRect;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to encode crop: {0}")]
    Encode(String),
    #[error("not a base64 image data url")]
    InvalidDataUrl,
    #[error("failed to decode image payload: {0}")]
    Decode(String),
}

/// Crop `rect` out of `source` and encode the region as PNG bytes.
/// The caller guarantees `rect` lies inside the source
/// ([`crate::geometry::SourceRect::to_pixel_rect`] already clamped it).
pub fn crop_to_png(source: &DynamicImage, rect: PixelRect) -> Result<Vec<u8>, RasterError> {
    let view = source.crop_imm(rect.x, rect.y, rect.width, rect.height);
    let buffer = view.to_rgba8();

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(buffer)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|err| RasterError::Encode(err.to_string()))?;
    Ok(png)
}

pub fn encode_data_url(png: &[u8]) -> String {
    format!("{}{}", PNG_DATA_URL_PREFIX, BASE64.encode(png))
}

/// Raw bytes of a `data:image/*;base64,` URL, for re-decoding stored crops
/// and uploads that arrive from the frontend as data URLs.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, RasterError> {
    let payload = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, data)| data)
        .ok_or(RasterError::InvalidDataUrl)?;
    BASE64
        .decode(payload)
        .map_err(|err| RasterError::Decode(err.to_string()))
}

pub fn is_data_url(source: &str) -> bool {
    source.starts_with("data:")
}
