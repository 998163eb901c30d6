//! Game and team records handed to the renderer.
//!
//! These mirror the JSON the bot and API layers store for a game. Image
//! references are classified once, while deserializing, so the rest of the
//! crate never inspects string prefixes again.

use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::rendering::layout::TILE_COUNT;

/// Board configuration of a single game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Tasks keyed by tile index ("1".."100")
    #[serde(default)]
    pub tile_tasks: BTreeMap<String, TileTask>,
    /// Snake head tile -> tail tile
    #[serde(default, deserialize_with = "tile_value_map")]
    pub snakes: BTreeMap<String, i32>,
    /// Ladder bottom tile -> top tile
    #[serde(default, deserialize_with = "tile_value_map")]
    pub ladders: BTreeMap<String, i32>,
}

/// A task attached to a tile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "imageRef",
        alias = "image",
        deserialize_with = "image_ref_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_ref: Option<ImageRef>,
}

/// Position of one team on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPosition {
    pub team_name: String,
    #[serde(default = "starting_tile")]
    pub current_position: i32,
}

fn starting_tile() -> i32 {
    1
}

impl TeamPosition {
    pub fn new(team_name: impl Into<String>, current_position: i32) -> Self {
        Self { team_name: team_name.into(), current_position }
    }

    /// Glyph drawn on the team's marker: the last character of its name.
    pub fn marker_glyph(&self) -> Option<char> {
        self.team_name.chars().last()
    }
}

/// A game and its teams as loaded by the HTTP layer or the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub config: GameConfig,
    #[serde(default)]
    pub teams: Vec<TeamPosition>,
}

/// A snake or ladder, from the tile a team lands on to where it ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLink {
    pub start: i32,
    pub end: i32,
}

impl GameConfig {
    /// Snakes as head -> tail links, ordered by head tile.
    pub fn snake_links(&self) -> Vec<BoardLink> {
        links_from(&self.snakes, "snake")
    }

    /// Ladders as bottom -> top links, ordered by bottom tile.
    pub fn ladder_links(&self) -> Vec<BoardLink> {
        links_from(&self.ladders, "ladder")
    }

    pub fn task_for(&self, tile: u32) -> Option<&TileTask> {
        self.tile_tasks.get(&tile.to_string())
    }

    /// Describe inputs the renderer draws as-is even though they break the
    /// board rules. Nothing here is rejected or clamped.
    pub fn input_warnings(&self, teams: &[TeamPosition]) -> Vec<String> {
        let mut out = Vec::new();
        let on_board = |t: i32| (1..=TILE_COUNT as i32).contains(&t);

        for link in self.snake_links() {
            if link.start <= link.end {
                out.push(format!("snake {} -> {} does not go down", link.start, link.end));
            }
            if !on_board(link.start) || !on_board(link.end) {
                out.push(format!("snake {} -> {} leaves the board", link.start, link.end));
            }
        }
        for link in self.ladder_links() {
            if link.start >= link.end {
                out.push(format!("ladder {} -> {} does not go up", link.start, link.end));
            }
            if !on_board(link.start) || !on_board(link.end) {
                out.push(format!("ladder {} -> {} leaves the board", link.start, link.end));
            }
            if self.snakes.contains_key(&link.start.to_string()) {
                out.push(format!("tile {} is both a snake head and a ladder bottom", link.start));
            }
        }
        for team in teams {
            if team.team_name.is_empty() {
                out.push("team with an empty name has no marker glyph".to_string());
            }
            if !on_board(team.current_position) {
                out.push(format!(
                    "team {:?} is at {} which is off the board",
                    team.team_name, team.current_position
                ));
            }
        }
        out
    }
}

fn links_from(map: &BTreeMap<String, i32>, kind: &str) -> Vec<BoardLink> {
    let mut links: Vec<BoardLink> = map
        .iter()
        .filter_map(|(key, &end)| match key.trim().parse::<i32>() {
            Ok(start) => Some(BoardLink { start, end }),
            Err(_) => {
                log::warn!("Skipping {} with non-numeric tile key {:?}", kind, key);
                None
            }
        })
        .collect();
    links.sort_by_key(|l| (l.start, l.end));
    links
}

// Stored games sometimes carry tile numbers as strings.
fn tile_value_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TileValue {
        Number(i32),
        Text(String),
    }

    let raw = BTreeMap::<String, TileValue>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            let tile = match value {
                TileValue::Number(n) => n,
                TileValue::Text(s) => s.trim().parse::<i32>().map_err(|_| {
                    D::Error::custom(format!("tile value for {:?} is not a number: {:?}", key, s))
                })?,
            };
            Ok((key, tile))
        })
        .collect()
}

fn image_ref_field<'de, D>(deserializer: D) -> Result<Option<ImageRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(ImageRef::parse))
}

/// Where a tile image comes from.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ImageRef {
    /// Image bytes embedded in the record (`data:<mime>;base64,...`)
    Inline { data: Vec<u8>, format: String },
    /// An http(s) resource to fetch
    External(Url),
    /// A locator whose scheme the renderer cannot resolve, e.g. a chat
    /// attachment reference that should have been resolved upstream
    UnsupportedScheme(String),
    /// Anything else, kept verbatim
    Unrecognized(String),
}

impl ImageRef {
    /// MIME type every tile image is normalized to.
    pub const CANONICAL_FORMAT: &'static str = "image/jpeg";

    /// Classify a stored reference. Blank strings mean "no image".
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Some(rest) = raw.strip_prefix("data:") {
            return Some(Self::parse_data_uri(rest).unwrap_or_else(|| Self::Unrecognized(raw.to_string())));
        }

        Some(match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::External(url),
            Ok(_) => Self::UnsupportedScheme(raw.to_string()),
            Err(_) => Self::Unrecognized(raw.to_string()),
        })
    }

    fn parse_data_uri(rest: &str) -> Option<Self> {
        let (header, payload) = rest.split_once(',')?;
        let format = header.strip_suffix(";base64")?.trim().to_ascii_lowercase();
        if !format.starts_with("image/") {
            return None;
        }
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let data = BASE64.decode(compact.as_bytes()).ok()?;
        if data.is_empty() {
            return None;
        }
        Some(Self::Inline { data, format })
    }

    pub fn inline(data: Vec<u8>, format: impl Into<String>) -> Self {
        Self::Inline { data, format: format.into() }
    }

    /// Whether this is already an embedded image in the canonical encoding.
    pub fn is_canonical(&self) -> bool {
        matches!(self, Self::Inline { format, .. } if format == Self::CANONICAL_FORMAT || format == "image/jpg")
    }

    /// Short human-readable form for logs (never the full payload).
    pub fn describe(&self) -> String {
        match self {
            Self::Inline { data, format } => format!("inline {} ({} bytes)", format, data.len()),
            Self::External(url) => url.to_string(),
            Self::UnsupportedScheme(raw) | Self::Unrecognized(raw) => {
                let short: String = raw.chars().take(48).collect();
                if short.len() < raw.len() {
                    format!("{}...", short)
                } else {
                    short
                }
            }
        }
    }

    fn to_source(&self) -> String {
        match self {
            Self::Inline { data, format } => format!("data:{};base64,{}", format, BASE64.encode(data)),
            Self::External(url) => url.to_string(),
            Self::UnsupportedScheme(raw) | Self::Unrecognized(raw) => raw.clone(),
        }
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageRef({})", self.describe())
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_game_json_from_the_api() {
        let json = r#"{
            "tileTasks": {
                "5": { "name": "Kill a dragon", "description": "any", "imageRef": "https://example.com/d.png" },
                "7": { "name": "Fish", "image": "attachment://fish.png" },
                "9": { "name": "Blank", "imageRef": "" }
            },
            "snakes": { "16": 6, "99": "12" },
            "ladders": { "1": 38 }
        }"#;
        let cfg: GameConfig = serde_json::from_str(json).expect("parse");
        assert_eq!(cfg.snakes.get("99"), Some(&12));
        assert!(matches!(cfg.task_for(5).unwrap().image_ref, Some(ImageRef::External(_))));
        assert!(matches!(cfg.task_for(7).unwrap().image_ref, Some(ImageRef::UnsupportedScheme(_))));
        assert_eq!(cfg.task_for(9).unwrap().image_ref, None);
        assert!(cfg.task_for(10).is_none());
    }

    #[test]
    fn rejects_non_numeric_link_values() {
        let json = r#"{ "snakes": { "16": "six" } }"#;
        assert!(serde_json::from_str::<GameConfig>(json).is_err());
    }

    #[test]
    fn links_are_sorted_numerically_and_skip_bad_keys() {
        let mut cfg = GameConfig::default();
        cfg.snakes.insert("100".into(), 3);
        cfg.snakes.insert("16".into(), 6);
        cfg.snakes.insert("head".into(), 2);
        let links = cfg.snake_links();
        assert_eq!(links, vec![BoardLink { start: 16, end: 6 }, BoardLink { start: 100, end: 3 }]);
    }

    #[test]
    fn classifies_image_references() {
        let jpeg = ImageRef::parse("data:image/jpeg;base64,/9j/AA==").unwrap();
        assert!(jpeg.is_canonical());

        let png = ImageRef::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert!(matches!(&png, ImageRef::Inline { format, .. } if format == "image/png"));
        assert!(!png.is_canonical());

        assert!(matches!(ImageRef::parse("data:image/png;base64,@@@"), Some(ImageRef::Unrecognized(_))));
        assert!(matches!(ImageRef::parse("data:text/plain;base64,aGk="), Some(ImageRef::Unrecognized(_))));
        assert!(matches!(ImageRef::parse("blob:https://x/1"), Some(ImageRef::UnsupportedScheme(_))));
        assert!(matches!(ImageRef::parse("not an image"), Some(ImageRef::Unrecognized(_))));
        assert_eq!(ImageRef::parse("   "), None);
    }

    #[test]
    fn inline_reference_serializes_back_to_a_data_uri() {
        let r = ImageRef::parse("data:image/jpeg;base64,/9j/AA==").unwrap();
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"data:image/jpeg;base64,/9j/AA==\"");
    }

    #[test]
    fn warns_about_rule_breaking_inputs() {
        let mut cfg = GameConfig::default();
        cfg.snakes.insert("6".into(), 16);
        cfg.ladders.insert("6".into(), 40);
        let teams = vec![TeamPosition::new("", 120)];
        let warnings = cfg.input_warnings(&teams);
        assert!(warnings.iter().any(|w| w.contains("does not go down")));
        assert!(warnings.iter().any(|w| w.contains("both a snake head")));
        assert!(warnings.iter().any(|w| w.contains("empty name")));
        assert!(warnings.iter().any(|w| w.contains("off the board")));
    }

    #[test]
    fn snapshot_flattens_config_and_teams() {
        let json = r#"{ "_id": "g1", "snakes": {"16": 6}, "teams": [{"teamName": "Team Alpha", "currentPosition": 15}] }"#;
        let snap: GameSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.id, "g1");
        assert_eq!(snap.config.snake_links().len(), 1);
        assert_eq!(snap.teams[0].marker_glyph(), Some('a'));
    }
}
