//! Board rendering pipeline
//!
//! Stages, leaf first:
//! - [`layout`]: tile index to pixel rectangle
//! - [`images`]: tile image references to canonical JPEG payloads
//! - [`compose`]: game state to a [`paint::Scene`]
//! - [`svg`]: scene to an SVG document
//! - [`raster`]: SVG document to PNG bytes

pub mod compose;
pub mod images;
pub mod layout;
pub mod paint;
pub mod raster;
pub mod svg;

use sha2::{Digest, Sha256};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// A rendered board
#[derive(Debug, Clone)]
pub struct BoardImage {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl BoardImage {
    /// Hex SHA-256 of the PNG bytes, used for determinism checks.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.png_data))
    }

    pub fn is_png(&self) -> bool {
        self.png_data.starts_with(PNG_SIGNATURE)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.png_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let img = BoardImage { width: 1, height: 1, png_data: b"abc".to_vec() };
        assert_eq!(
            img.digest(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(!img.is_png());
    }
}
