//! Snakeboard
//!
//! Renders the board of a Snakes & Ladders game to a PNG: 100 numbered tiles
//! with optional task labels and images, decorative snakes and ladders, and a
//! marker for every team.
//!
//! # Pipeline
//!
//! - **Layout**: tile index to pixel rectangle (boustrophedon, tile 1 bottom-left)
//! - **Image normalization**: every tile image becomes a canonical JPEG,
//!   failures degrade to "no image on this tile"
//! - **Composition**: a typed scene graph serialized once to SVG
//! - **Rasterization**: SVG to PNG through resvg
//!
//! # Example
//!
//! ```no_run
//! use snakeboard::{BoardRenderer, GameConfig, RendererConfig, TeamPosition};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let game: GameConfig = serde_json::from_str(r#"{
//!     "tileTasks": { "7": { "name": "Bake a cake" } },
//!     "snakes": { "16": 6 },
//!     "ladders": { "1": 38 }
//! }"#)?;
//! let teams = vec![TeamPosition::new("Team Alpha", 15)];
//!
//! let renderer = BoardRenderer::new(RendererConfig::default())?;
//! let board = renderer.render(&game, &teams).await?;
//! std::fs::write("board.png", &board.png_data)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod model;
pub use model::{BoardLink, GameConfig, GameSnapshot, ImageRef, TeamPosition, TileTask};

pub mod rendering;
pub use rendering::BoardImage;

// HTTP surface (axum); the CLI `serve` subcommand depends on it
#[cfg(feature = "server")]
pub mod server;

use rendering::images::{ImageNormalizer, TileImages};
use rendering::layout::BOARD_SIZE;
use rendering::paint::Scene;
use rendering::{compose, raster, svg};

/// Configuration for the board renderer
///
/// Defaults follow the production bot: a 5 second fetch timeout, JPEG
/// quality 80 and system fonts for text.
///
/// # Examples
///
/// ```
/// let cfg = snakeboard::RendererConfig::default();
/// assert_eq!(cfg.fetch_timeout_ms, 5000);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// User agent sent when fetching external tile images
    pub user_agent: String,
    /// Hard timeout per external image fetch in milliseconds
    pub fetch_timeout_ms: u64,
    /// Quality of the canonical JPEG encoding (1..=100)
    pub jpeg_quality: u8,
    /// Largest fetched or inline image payload accepted, in bytes
    pub max_image_bytes: usize,
    /// Largest width or height the image decoder accepts
    pub max_image_dimension: u32,
    /// How many tile images are normalized at once
    pub image_concurrency: usize,
    /// Whether the rasterizer loads host fonts (text is invisible without them)
    pub load_system_fonts: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("SnakeboardRenderer/{}", env!("CARGO_PKG_VERSION")),
            fetch_timeout_ms: 5000,
            jpeg_quality: 80,
            max_image_bytes: 10 * 1024 * 1024,
            max_image_dimension: 8192,
            image_concurrency: num_cpus::get().max(4),
            load_system_fonts: true,
        }
    }
}

impl RendererConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::ConfigError(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if self.image_concurrency == 0 {
            return Err(Error::ConfigError("image_concurrency must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Renders game snapshots to PNG boards
///
/// Cheap to clone; clones share the HTTP client. Holds no per-render state,
/// so any number of renders may run concurrently.
#[derive(Clone)]
pub struct BoardRenderer {
    config: RendererConfig,
    normalizer: ImageNormalizer,
}

impl BoardRenderer {
    pub fn new(config: RendererConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = ImageNormalizer::new(&config)?;
        Ok(Self { config, normalizer })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Normalize every tile image of `game`. Unusable images are left out.
    pub async fn prepare_images(&self, game: &GameConfig) -> TileImages {
        self.normalizer.normalize_tiles(game).await
    }

    /// Build the board scene from already normalized images.
    pub fn compose(&self, game: &GameConfig, teams: &[TeamPosition], images: &TileImages) -> Scene {
        compose::compose_board(game, teams, images)
    }

    /// Render one snapshot of a game and its teams.
    ///
    /// Image problems never fail the render; the affected tile is drawn
    /// without its image. An error means the board itself could not be
    /// produced.
    pub async fn render(&self, game: &GameConfig, teams: &[TeamPosition]) -> Result<BoardImage> {
        for warning in game.input_warnings(teams) {
            log::warn!("Drawing as given: {}", warning);
        }

        let images = self.prepare_images(game).await;
        let scene = self.compose(game, teams, &images);
        let document = svg::to_svg(&scene);
        log::debug!(
            "Composed board: {} tile images, {} teams, {} bytes of SVG",
            images.len(),
            teams.len(),
            document.len()
        );

        let load_fonts = self.config.load_system_fonts;
        let png_data = tokio::task::spawn_blocking(move || {
            raster::rasterize_svg(&document, BOARD_SIZE, BOARD_SIZE, load_fonts)
        })
        .await??;

        Ok(BoardImage { width: BOARD_SIZE, height: BOARD_SIZE, png_data })
    }
}

/// Render a board with the default configuration and return the PNG bytes.
pub async fn render_board(game: &GameConfig, teams: &[TeamPosition]) -> Result<Vec<u8>> {
    let renderer = BoardRenderer::new(RendererConfig::default())?;
    Ok(renderer.render(game, teams).await?.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RendererConfig::default();
        assert!(config.user_agent.starts_with("SnakeboardRenderer/"));
        assert_eq!(config.jpeg_quality, 80);
        assert!(config.image_concurrency >= 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_settings() {
        let config = RendererConfig { jpeg_quality: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
        let config = RendererConfig { image_concurrency: 0, ..Default::default() };
        assert!(matches!(BoardRenderer::new(config), Err(Error::ConfigError(_))));
    }
}
