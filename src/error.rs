//! Error types for the board renderer

use thiserror::Error;

/// Result type alias for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering a board
///
/// Only the scene/raster variants ever escape [`crate::BoardRenderer::render`];
/// the image and network variants are produced inside the image normalizer
/// and downgraded to "tile without an image".
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to compose or serialize the board scene
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// The rasterizer rejected the vector document or could not encode it
    #[error("Rasterization failed: {0}")]
    RasterError(String),

    /// A tile image could not be decoded or re-encoded
    #[error("Image processing failed: {0}")]
    ImageError(String),

    /// Network error while fetching an external tile image
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Malformed game or team payload
    #[error("Invalid input: {0}")]
    InputError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageError(err.to_string())
    }
}

impl From<resvg::usvg::Error> for Error {
    fn from(err: resvg::usvg::Error) -> Self {
        Error::RasterError(format!("SVG parse error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InputError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Other(format!("Blocking render task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        assert_eq!(Error::Timeout(5000).to_string(), "Operation timed out after 5000ms");
        assert!(Error::RasterError("bad".into()).to_string().contains("bad"));
    }
}
