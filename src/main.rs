use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use snakeboard::{BoardRenderer, GameSnapshot, RendererConfig};

#[derive(Parser, Debug)]
#[command(name = "snakeboard", version, about = "Render Snakes & Ladders boards to PNG")]
struct Cli {
    /// Timeout for each external tile image fetch
    #[arg(long, global = true, default_value_t = 5000)]
    fetch_timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one game snapshot to a PNG file
    Render {
        /// JSON game snapshot (tileTasks, snakes, ladders, teams)
        #[arg(long)]
        game: PathBuf,
        /// Where to write the board image
        #[arg(long, default_value = "board.png")]
        out: PathBuf,
    },
    /// Serve board images over HTTP
    #[cfg(feature = "server")]
    Serve {
        /// JSON file holding one game snapshot or an array of them
        #[arg(long)]
        games: PathBuf,
        /// Listen address, defaults to 0.0.0.0:$PORT or 0.0.0.0:8080
        #[arg(long)]
        addr: Option<std::net::SocketAddr>,
    },
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

async fn render(renderer: BoardRenderer, game: &Path, out: &Path) -> anyhow::Result<()> {
    let snapshot: GameSnapshot = serde_json::from_str(&read_file(game)?)
        .with_context(|| format!("parsing game snapshot {}", game.display()))?;

    let board = renderer.render(&snapshot.config, &snapshot.teams).await?;
    std::fs::write(out, &board.png_data).with_context(|| format!("writing {}", out.display()))?;
    log::info!(
        "Wrote {}x{} board for game {} to {}",
        board.width,
        board.height,
        snapshot.id,
        out.display()
    );
    Ok(())
}

#[cfg(feature = "server")]
async fn serve(renderer: BoardRenderer, games: &Path, addr: Option<std::net::SocketAddr>) -> anyhow::Result<()> {
    use snakeboard::server::{self, AppState, InMemoryGameStore};

    let store = InMemoryGameStore::from_json(&read_file(games)?)
        .with_context(|| format!("loading games from {}", games.display()))?;
    log::info!("Loaded {} games", store.len());

    let app = server::router(AppState::new(store, renderer));
    let addr = addr.unwrap_or_else(server::default_addr);
    log::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = RendererConfig { fetch_timeout_ms: cli.fetch_timeout_ms, ..Default::default() };
    let renderer = BoardRenderer::new(config)?;

    match cli.command {
        Command::Render { game, out } => render(renderer, &game, &out).await,
        #[cfg(feature = "server")]
        Command::Serve { games, addr } => serve(renderer, &games, addr).await,
    }
}
