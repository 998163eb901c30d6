//! HTTP surface: board image endpoint and health check.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::Deserialize;

use crate::model::{GameConfig, GameSnapshot, TeamPosition};
use crate::rendering::BoardImage;
use crate::{BoardRenderer, Result};

/// Read-only view of stored games, looked up once per request.
pub trait GameStore: Send + Sync {
    fn snapshot(&self, game_id: &str) -> Option<GameSnapshot>;
}

/// Produces the board image for a request.
pub trait BoardRender: Send + Sync {
    fn render<'a>(&'a self, game: &'a GameConfig, teams: &'a [TeamPosition]) -> BoxFuture<'a, Result<BoardImage>>;
}

impl BoardRender for BoardRenderer {
    fn render<'a>(&'a self, game: &'a GameConfig, teams: &'a [TeamPosition]) -> BoxFuture<'a, Result<BoardImage>> {
        Box::pin(BoardRenderer::render(self, game, teams))
    }
}

/// Games held in memory, keyed by id
#[derive(Debug, Default)]
pub struct InMemoryGameStore {
    games: DashMap<String, GameSnapshot>,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(snapshots: impl IntoIterator<Item = GameSnapshot>) -> Self {
        let store = Self::new();
        for snapshot in snapshots {
            store.insert(snapshot);
        }
        store
    }

    /// Parse a JSON document holding either one game or an array of games.
    pub fn from_json(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Games {
            Many(Vec<GameSnapshot>),
            One(Box<GameSnapshot>),
        }

        let snapshots = match serde_json::from_str::<Games>(json)? {
            Games::Many(games) => games,
            Games::One(game) => vec![*game],
        };
        Ok(Self::from_snapshots(snapshots))
    }

    /// Insert or replace a game.
    pub fn insert(&self, snapshot: GameSnapshot) {
        self.games.insert(snapshot.id.clone(), snapshot);
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl GameStore for InMemoryGameStore {
    fn snapshot(&self, game_id: &str) -> Option<GameSnapshot> {
        self.games.get(game_id).map(|entry| entry.value().clone())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub games: Arc<dyn GameStore>,
    pub renderer: Arc<dyn BoardRender>,
}

impl AppState {
    pub fn new(games: impl GameStore + 'static, renderer: impl BoardRender + 'static) -> Self {
        Self { games: Arc::new(games), renderer: Arc::new(renderer) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/games/:game_id/board", get(board_image))
        .with_state(state)
}

/// Bind address: `PORT` from the environment or 8080, on all interfaces.
pub fn default_addr() -> SocketAddr {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8080);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

async fn healthz() -> &'static str {
    "ok"
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

pub async fn board_image(Path(game_id): Path<String>, State(state): State<AppState>) -> Response {
    let Some(snapshot) = state.games.snapshot(&game_id) else {
        return json_error(StatusCode::NOT_FOUND, "Game not found");
    };

    match state.renderer.render(&snapshot.config, &snapshot.teams).await {
        Ok(board) => {
            log::info!("Rendered board for game {} ({} bytes)", game_id, board.png_data.len());
            let length = board.png_data.len().to_string();
            (
                [
                    (header::CONTENT_TYPE, "image/png".to_string()),
                    (header::CONTENT_LENGTH, length),
                    (header::CACHE_CONTROL, "no-cache".to_string()),
                ],
                board.into_bytes(),
            )
                .into_response()
        }
        Err(e) => {
            log::error!(
                "Failed to render board for game {}: {} (game: {}, teams: {})",
                game_id,
                e,
                serde_json::to_string(&snapshot.config).unwrap_or_default(),
                serde_json::to_string(&snapshot.teams).unwrap_or_default()
            );
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate board image")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_single_game_or_a_list() {
        let one = InMemoryGameStore::from_json(r#"{"_id":"g1","snakes":{"16":6}}"#).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one.snapshot("g1").unwrap().config.snakes.get("16"), Some(&6));

        let many = InMemoryGameStore::from_json(
            r#"[{"id":"a","teams":[{"teamName":"Red","currentPosition":4}]},{"id":"b"}]"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many.snapshot("a").unwrap().teams[0].current_position, 4);
        assert!(many.snapshot("missing").is_none());
    }

    #[test]
    fn insert_replaces_existing_game() {
        let store = InMemoryGameStore::new();
        let mut game: GameSnapshot = serde_json::from_str(r#"{"id":"g"}"#).unwrap();
        store.insert(game.clone());
        game.teams.push(crate::TeamPosition::new("Blue", 9));
        store.insert(game);
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot("g").unwrap().teams.len(), 1);
    }

    #[test]
    fn rejects_malformed_store_files() {
        assert!(InMemoryGameStore::from_json("{not json").is_err());
    }
}
