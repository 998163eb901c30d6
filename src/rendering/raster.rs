//! Rasterizer: SVG document -> PNG bytes via resvg

use std::sync::{Arc, OnceLock};

use resvg::{tiny_skia, usvg};

use crate::{Error, Result};

static SYSTEM_FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();

/// Font database shared by every render in the process.
///
/// Scanning system fonts is slow, so it happens once; with
/// `load_system_fonts == false` text is laid out against an empty database
/// and simply does not appear.
fn font_database(load_system_fonts: bool) -> Arc<usvg::fontdb::Database> {
    if !load_system_fonts {
        return Arc::new(usvg::fontdb::Database::new());
    }
    SYSTEM_FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            log::debug!("Loaded {} system font faces", db.len());
            Arc::new(db)
        })
        .clone()
}

/// Parse `svg` and paint it onto a `width` x `height` canvas.
///
/// Fails if the document is malformed or declares a size other than the
/// one requested.
pub fn rasterize_svg(svg: &str, width: u32, height: u32, load_system_fonts: bool) -> Result<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.fontdb = font_database(load_system_fonts);

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    if size.width() != width || size.height() != height {
        return Err(Error::RasterError(format!(
            "document is {}x{}, expected {}x{}",
            size.width(),
            size.height(),
            width,
            height
        )));
    }

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| Error::RasterError(format!("failed to allocate {}x{} pixmap", width, height)))?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| Error::RasterError(format!("PNG encoding failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"32\" height=\"16\" viewBox=\"0 0 32 16\"><rect width=\"32\" height=\"16\" fill=\"#ff0000\"/></svg>";

    #[test]
    fn rasterizes_to_png_of_declared_size() {
        let png = rasterize_svg(SQUARE, 32, 16, false).expect("rasterize");
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
        let img = image::load_from_memory(&png).expect("decode").to_rgba8();
        assert_eq!(img.dimensions(), (32, 16));
        assert_eq!(img.get_pixel(5, 5).0, [255, 0, 0, 255]);
    }

    #[test]
    fn rejects_malformed_documents() {
        let err = rasterize_svg("<svg><text>a & b</text></svg>", 10, 10, false).unwrap_err();
        assert!(matches!(err, Error::RasterError(_)));
    }

    #[test]
    fn rejects_unexpected_dimensions() {
        assert!(rasterize_svg(SQUARE, 64, 64, false).is_err());
    }
}
