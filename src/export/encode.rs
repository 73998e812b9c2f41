//! Image encoding: `DynamicImage` → base64 PNG data URI.
//!
//! The report service embeds each capture as an image in the generated PDF
//! and accepts them as `data:image/png;base64,…` strings inside the JSON
//! request body. PNG keeps chart lines and axis labels crisp.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Prefix of every data URI produced here.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encode a captured region as a PNG data URI.
pub fn encode_data_url(img: &DynamicImage) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded capture → {} bytes base64", b64.len());

    Ok(format!("{PNG_DATA_URL_PREFIX}{b64}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([16, 185, 129, 255])));
        let url = encode_data_url(&img).expect("encode should succeed");
        let payload = url
            .strip_prefix(PNG_DATA_URL_PREFIX)
            .expect("data URI prefix");
        let decoded = STANDARD.decode(payload).expect("valid base64");
        assert_eq!(&decoded[1..4], b"PNG");
    }
}
