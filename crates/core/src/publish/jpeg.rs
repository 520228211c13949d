use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::shared::frame::Frame;

/// Encodes a frame to JPEG for broadcast.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode(
        frame.data(),
        frame.width(),
        frame.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}
