use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use super::geometry::ImageSize;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
const DATA_URL_PREFIX: &str = "base64,";

/// Latest mirrored frame of the device screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Screenshot {
    pub image_base64: String,
    pub size: Option<ImageSize>,
}

impl Screenshot {
    /// Wraps a base64 frame, reading the native size from the PNG header when present.
    pub fn from_base64(encoded: &str) -> Self {
        let payload = match encoded.find(DATA_URL_PREFIX) {
            Some(idx) if encoded.starts_with("data:") => &encoded[idx + DATA_URL_PREFIX.len()..],
            _ => encoded,
        };
        let payload = payload.trim();
        let size = STANDARD
            .decode(payload)
            .ok()
            .and_then(|bytes| png_dimensions(&bytes));
        Self {
            image_base64: payload.to_string(),
            size,
        }
    }
}

/// Width and height from a PNG IHDR chunk.
pub fn png_dimensions(bytes: &[u8]) -> Option<ImageSize> {
    if bytes.len() < 24 || bytes[..8] != PNG_SIGNATURE || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    let size = ImageSize::new(width, height);
    (!size.is_empty()).then_some(size)
}

#[cfg(test)]
pub(crate) fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes
}
