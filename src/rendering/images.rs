//! Tile image normalization.
//!
//! Every tile image ends up as a square JPEG the size of a tile, whatever it
//! started as: an embedded image in another format, an http(s) URL, or an
//! already-normalized JPEG (passed through untouched). Failures never leave
//! this module: [`ImageNormalizer::normalize`] logs them and returns `None`,
//! so a broken image only costs that tile its picture.

use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::StreamExt;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageReader, Limits, Rgb, RgbImage, RgbaImage};
use url::Url;

use crate::model::{GameConfig, ImageRef};
use crate::rendering::layout::{TILE_COUNT, TILE_SIZE};
use crate::{Error, Result, RendererConfig};

/// Normalized images keyed by tile index
pub type TileImages = BTreeMap<u32, Arc<NormalizedImage>>;

/// A tile image in the canonical encoding, ready to embed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub data: Vec<u8>,
}

impl NormalizedImage {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", ImageRef::CANONICAL_FORMAT, BASE64.encode(&self.data))
    }
}

#[derive(Debug, Clone, Copy)]
struct Transcode {
    size: u32,
    quality: u8,
    max_dimension: u32,
}

#[derive(Clone)]
pub struct ImageNormalizer {
    client: reqwest::Client,
    transcode: Transcode,
    max_bytes: usize,
    timeout_ms: u64,
    concurrency: usize,
}

impl ImageNormalizer {
    pub fn new(config: &RendererConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            transcode: Transcode {
                size: TILE_SIZE as u32,
                quality: config.jpeg_quality,
                max_dimension: config.max_image_dimension,
            },
            max_bytes: config.max_image_bytes,
            timeout_ms: config.fetch_timeout_ms,
            concurrency: config.image_concurrency.max(1),
        })
    }

    /// Normalize one reference, or `None` if it cannot be used.
    pub async fn normalize(&self, image: &ImageRef) -> Option<NormalizedImage> {
        match self.try_normalize(image).await {
            Ok(normalized) => Some(normalized),
            Err(e) => {
                log::warn!("Dropping tile image {}: {}", image.describe(), e);
                None
            }
        }
    }

    pub async fn try_normalize(&self, image: &ImageRef) -> Result<NormalizedImage> {
        match image {
            ImageRef::Inline { data, .. } if image.is_canonical() => {
                self.check_size(data.len())?;
                Ok(NormalizedImage { data: data.clone() })
            }
            ImageRef::Inline { data, format } => {
                self.check_size(data.len())?;
                log::debug!("Re-encoding inline {} tile image", format);
                self.transcode_blocking(data.clone()).await
            }
            ImageRef::External(url) => {
                let bytes = self.fetch(url).await?;
                self.transcode_blocking(bytes).await
            }
            ImageRef::UnsupportedScheme(raw) => Err(Error::ImageError(format!(
                "cannot resolve {:?}; it must be turned into an http(s) URL or inline image before rendering",
                raw
            ))),
            ImageRef::Unrecognized(_) => Err(Error::ImageError("unrecognized image reference".into())),
        }
    }

    /// Normalize every tile image of a game.
    ///
    /// Identical references are processed once. Up to `image_concurrency`
    /// images are in flight at a time; the result does not depend on the
    /// order they finish in.
    pub async fn normalize_tiles(&self, game: &GameConfig) -> TileImages {
        let mut unique: Vec<(&ImageRef, Vec<u32>)> = Vec::new();
        let mut seen: HashMap<&ImageRef, usize> = HashMap::new();
        for tile in 1..=TILE_COUNT {
            let Some(image) = game.task_for(tile).and_then(|t| t.image_ref.as_ref()) else {
                continue;
            };
            match seen.get(image) {
                Some(&i) => unique[i].1.push(tile),
                None => {
                    seen.insert(image, unique.len());
                    unique.push((image, vec![tile]));
                }
            }
        }

        // futures built up front keep the returned future Send
        let pending: Vec<_> = unique.iter().map(|(image, _)| self.normalize(image)).collect();
        let results: Vec<Option<NormalizedImage>> = futures::stream::iter(pending)
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut tiles = TileImages::new();
        let mut usable = 0;
        for ((_, tile_list), result) in unique.iter().zip(results) {
            if let Some(normalized) = result {
                usable += 1;
                let shared = Arc::new(normalized);
                for &tile in tile_list {
                    tiles.insert(tile, shared.clone());
                }
            }
        }
        log::debug!("Normalized {} of {} distinct tile images", usable, unique.len());
        tiles
    }

    fn check_size(&self, len: usize) -> Result<()> {
        if len > self.max_bytes {
            return Err(Error::ImageError(format!("{} bytes exceeds the {} byte limit", len, self.max_bytes)));
        }
        Ok(())
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let mut resp = self.client.get(url.clone()).send().await.map_err(|e| self.fetch_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::NetworkError(format!("{} returned HTTP {}", url, status)));
        }

        if let Some(content_type) = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            let content_type = content_type.to_ascii_lowercase();
            if !content_type.starts_with("image/") && !content_type.contains("octet-stream") {
                return Err(Error::ImageError(format!("{} is {}, not an image", url, content_type)));
            }
        }

        if let Some(len) = resp.content_length() {
            self.check_size(usize::try_from(len).unwrap_or(usize::MAX))?;
        }

        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(|e| self.fetch_error(e))? {
            self.check_size(body.len() + chunk.len())?;
            body.extend_from_slice(&chunk);
        }
        log::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }

    fn fetch_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.timeout_ms)
        } else {
            Error::from(err)
        }
    }

    async fn transcode_blocking(&self, bytes: Vec<u8>) -> Result<NormalizedImage> {
        let settings = self.transcode;
        let data = tokio::task::spawn_blocking(move || transcode(&bytes, settings)).await??;
        Ok(NormalizedImage { data })
    }
}

/// Decode, cover-fit to a square, flatten onto white and encode as JPEG.
fn transcode(bytes: &[u8], settings: Transcode) -> Result<Vec<u8>> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(settings.max_dimension);
    limits.max_image_height = Some(settings.max_dimension);

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::ImageError(format!("unreadable image data: {}", e)))?;
    reader.limits(limits);
    let decoded = reader.decode()?;

    let fitted = decoded.resize_to_fill(settings.size, settings.size, FilterType::Lanczos3);
    let flat = flatten_onto_white(&fitted.to_rgba8());

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, settings.quality).encode(
        flat.as_raw(),
        flat.width(),
        flat.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

fn flatten_onto_white(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba};

    fn png_bytes(img: RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img).write_to(&mut out, ImageFormat::Png).expect("encode png");
        out.into_inner()
    }

    fn normalizer() -> ImageNormalizer {
        ImageNormalizer::new(&RendererConfig::default()).expect("normalizer")
    }

    #[test]
    fn transparent_pixels_become_white() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        let flat = flatten_onto_white(&img);
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);

        let half = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let flat = flatten_onto_white(&half);
        assert_eq!(flat.get_pixel(0, 0).0, [127, 127, 127]);
    }

    #[test]
    fn transcode_covers_the_tile_square() {
        let wide = RgbaImage::from_pixel(300, 100, Rgba([200, 10, 10, 255]));
        let settings = Transcode { size: 140, quality: 80, max_dimension: 8192 };
        let jpeg = transcode(&png_bytes(wide), settings).expect("transcode");
        let decoded = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg).expect("jpeg");
        assert_eq!((decoded.width(), decoded.height()), (140, 140));
    }

    #[test]
    fn transcode_rejects_oversized_dimensions() {
        let tall = RgbaImage::from_pixel(10, 64, Rgba([0, 0, 0, 255]));
        let settings = Transcode { size: 140, quality: 80, max_dimension: 32 };
        assert!(transcode(&png_bytes(tall), settings).is_err());
    }

    #[tokio::test]
    async fn canonical_inline_images_pass_through_unchanged() {
        let settings = Transcode { size: 140, quality: 80, max_dimension: 8192 };
        let jpeg = transcode(&png_bytes(RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]))), settings).unwrap();
        let reference = ImageRef::inline(jpeg.clone(), "image/jpeg");
        let normalized = normalizer().normalize(&reference).await.expect("normalized");
        assert_eq!(normalized.data, jpeg);
        // a second pass is a no-op too
        let again = ImageRef::parse(&normalized.to_data_uri()).unwrap();
        assert_eq!(normalizer().normalize(&again).await.unwrap(), normalized);
    }

    #[tokio::test]
    async fn inline_png_is_reencoded_as_jpeg() {
        let reference = ImageRef::inline(png_bytes(RgbaImage::from_pixel(50, 80, Rgba([0, 0, 255, 90]))), "image/png");
        let normalized = normalizer().normalize(&reference).await.expect("normalized");
        let decoded = image::load_from_memory_with_format(&normalized.data, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (140, 140));
        assert!(normalized.to_data_uri().starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn unusable_references_are_dropped() {
        let n = normalizer();
        assert!(n.normalize(&ImageRef::inline(b"not an image".to_vec(), "image/png")).await.is_none());
        assert!(n.normalize(&ImageRef::UnsupportedScheme("attachment://a.png".into())).await.is_none());
        assert!(n.normalize(&ImageRef::Unrecognized("???".into())).await.is_none());
    }

    #[tokio::test]
    async fn oversized_inline_payloads_are_dropped() {
        let config = RendererConfig { max_image_bytes: 16, ..Default::default() };
        let n = ImageNormalizer::new(&config).unwrap();
        let err = n.try_normalize(&ImageRef::inline(vec![0u8; 64], "image/jpeg")).await.unwrap_err();
        assert!(matches!(err, Error::ImageError(_)));
    }

    #[tokio::test]
    async fn identical_references_share_one_result() {
        let mut game = GameConfig::default();
        let png = png_bytes(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])));
        for tile in ["3", "4", "120"] {
            game.tile_tasks.insert(
                tile.to_string(),
                crate::model::TileTask {
                    name: Some("same".into()),
                    description: None,
                    image_ref: Some(ImageRef::inline(png.clone(), "image/png")),
                },
            );
        }
        let images = normalizer().normalize_tiles(&game).await;
        assert_eq!(images.len(), 2);
        assert!(Arc::ptr_eq(&images[&3], &images[&4]));
    }
}
