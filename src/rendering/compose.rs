//! Build the board scene: tiles, snakes, ladders and team markers.
//!
//! Paint order is background, tiles (base, image, number badge, task label),
//! ladders, snakes, then team markers on top.

use std::f32::consts::PI;

use crate::model::{BoardLink, GameConfig, TeamPosition, TileTask};
use crate::rendering::images::{NormalizedImage, TileImages};
use crate::rendering::layout::{self, Point, BOARD_SIZE, TILE_COUNT, TILE_SIZE};
use crate::rendering::paint::{
    Definition, FontWeight, GradientStop, LineCap, Paint, PaintCommand, PathData, Scene, Stroke, Style,
    TextAnchor, Transform,
};

const BOARD_BACKGROUND: &str = "#3e2f1c";

const TILE_INSET: f32 = 2.0;
const TILE_RADIUS: f32 = 10.0;
const TILE_FILLS: [&str; 2] = ["#fdf3dc", "#f3d9a4"];
const TILE_BORDER: &str = "#b08d57";

const BADGE_OFFSET: f32 = 20.0;
const BADGE_RADIUS: f32 = 14.0;

/// Task names longer than this are cut to `LABEL_KEEP_CHARS` plus "..."
pub const LABEL_MAX_CHARS: usize = 24;
pub const LABEL_KEEP_CHARS: usize = 21;
const LABEL_HEIGHT: f32 = 30.0;
const LABEL_MARGIN: f32 = 8.0;

const SNAKE_SEGMENTS: usize = 6;
const SNAKE_MAX_AMPLITUDE: f32 = 36.0;
/// (outline, body, highlight) per snake, cycled by index
const SNAKE_COLORS: [(&str, &str, &str); 4] = [
    ("#1e4620", "#4caf50", "#c5e1a5"),
    ("#6d1b1b", "#e53935", "#ffcdd2"),
    ("#3c1f5c", "#8e44ad", "#d7bde2"),
    ("#6e3b00", "#f39c12", "#fdebd0"),
];

const LADDER_HALF_WIDTH: f32 = 14.0;
/// Smallest per-axis rail offset, so axis-aligned ladders keep their width
pub const LADDER_MIN_OFFSET: f32 = 8.0;
pub const RUNG_SPACING: f32 = 30.0;
pub const MIN_RUNGS: usize = 3;
/// Corner-to-corner needs 59; only ladders leaving the board reach this
pub const MAX_RUNGS: usize = 64;
const LADDER_DARK: &str = "#5d3a1a";
const LADDER_LIGHT: &str = "#d2a679";
const LADDER_RUNG: &str = "#a0522d";
const LABEL_INK: &str = "#fff8e1";

pub const MARKER_RADIUS: f32 = 16.0;
pub const MARKER_MARGIN_X: f32 = 30.0;
pub const MARKER_MARGIN_Y: f32 = 108.0;
pub const MARKER_STAGGER: f32 = 26.0;
/// Marker fill and the glyph colour that reads on it
pub const TEAM_COLORS: [(&str, &str); 8] = [
    ("#e74c3c", "#ffffff"),
    ("#3498db", "#ffffff"),
    ("#2ecc71", "#0b3d1f"),
    ("#f1c40f", "#3d3200"),
    ("#9b59b6", "#ffffff"),
    ("#e67e22", "#ffffff"),
    ("#1abc9c", "#073b33"),
    ("#ecf0f1", "#2c3e50"),
];

/// Compose the full board. Pure: the same inputs give the same scene.
pub fn compose_board(game: &GameConfig, teams: &[TeamPosition], images: &TileImages) -> Scene {
    let mut scene = Scene::new(BOARD_SIZE, BOARD_SIZE, BOARD_BACKGROUND);

    for tile in 1..=TILE_COUNT {
        let image = images.get(&tile).map(|i| i.as_ref());
        draw_tile(&mut scene, tile as i32, game.task_for(tile), image);
    }

    for (i, link) in game.ladder_links().iter().enumerate() {
        draw_ladder(&mut scene, i, *link);
    }

    for (i, link) in game.snake_links().iter().enumerate() {
        draw_snake(&mut scene, i, *link);
    }

    for (i, team) in teams.iter().enumerate() {
        draw_marker(&mut scene, i, team);
    }

    scene
}

/// Task label text, cut down to fit the tile.
pub fn truncate_label(name: &str) -> String {
    if name.chars().count() > LABEL_MAX_CHARS {
        let kept: String = name.chars().take(LABEL_KEEP_CHARS).collect();
        format!("{}...", kept)
    } else {
        name.to_string()
    }
}

fn draw_tile(scene: &mut Scene, tile: i32, task: Option<&TileTask>, image: Option<&NormalizedImage>) {
    let (px, py) = layout::tile_to_pixel(tile);
    let (x, y) = (px as f32, py as f32);
    let size = TILE_SIZE as f32 - 2.0 * TILE_INSET;

    // checkerboard on the unflipped grid
    let (row, col) = layout::logical_cell(tile);
    let fill = TILE_FILLS[(row + col).rem_euclid(2) as usize];

    let mut cmds = vec![PaintCommand::Rect {
        x: x + TILE_INSET,
        y: y + TILE_INSET,
        width: size,
        height: size,
        radius: TILE_RADIUS,
        style: Style::fill(Paint::color(fill)).with_stroke(Stroke::new(Paint::color(TILE_BORDER), 1.5)),
    }];

    if let Some(image) = image {
        let clip_id = format!("tile-clip-{}", tile);
        scene.define(Definition::ClipRoundedRect {
            id: clip_id.clone(),
            x: x + TILE_INSET,
            y: y + TILE_INSET,
            width: size,
            height: size,
            radius: TILE_RADIUS,
        });
        cmds.push(PaintCommand::Image {
            x: x + TILE_INSET,
            y: y + TILE_INSET,
            width: size,
            height: size,
            href: image.to_data_uri(),
            clip: Some(clip_id),
        });
    }

    cmds.push(PaintCommand::Circle {
        cx: x + BADGE_OFFSET,
        cy: y + BADGE_OFFSET,
        r: BADGE_RADIUS,
        style: Style::fill(Paint::color("#2c3e50")).with_fill_opacity(0.85),
    });
    cmds.push(PaintCommand::Text {
        x: x + BADGE_OFFSET,
        y: y + BADGE_OFFSET,
        text: tile.to_string(),
        size: 13.0,
        weight: FontWeight::Bold,
        anchor: TextAnchor::Middle,
        fill: Paint::color("#ffffff"),
    });

    let name = task.and_then(|t| t.name.as_deref()).map(str::trim).unwrap_or("");
    if !name.is_empty() {
        let half = TILE_SIZE as f32 / 2.0;
        cmds.push(PaintCommand::Rect {
            x: x + LABEL_MARGIN,
            y: y + half - LABEL_HEIGHT / 2.0,
            width: TILE_SIZE as f32 - 2.0 * LABEL_MARGIN,
            height: LABEL_HEIGHT,
            radius: 6.0,
            style: Style::fill(Paint::color("#ffffff")).with_fill_opacity(0.85),
        });
        cmds.push(PaintCommand::Text {
            x: x + half,
            y: y + half,
            text: truncate_label(name),
            size: 11.0,
            weight: FontWeight::Bold,
            anchor: TextAnchor::Middle,
            fill: Paint::color("#2c2c2c"),
        });
    }

    scene.push(PaintCommand::group(cmds));
}

/// Points along a snake's body, head first.
///
/// The lateral offset is a sine wave under a half-sine envelope, so it is
/// zero at both ends and largest mid-body. The first and last points are
/// exactly the head and tail.
pub fn snake_spine(head: Point, tail: Point) -> Vec<Point> {
    let (dx, dy) = (tail.x - head.x, tail.y - head.y);
    let length = dx.hypot(dy);
    if length < f32::EPSILON {
        return vec![head, tail];
    }
    let (nx, ny) = (-dy / length, dx / length);
    let amplitude = (length * 0.18).min(SNAKE_MAX_AMPLITUDE);

    let mut points = Vec::with_capacity(SNAKE_SEGMENTS + 1);
    points.push(head);
    for i in 1..SNAKE_SEGMENTS {
        let s = i as f32 / SNAKE_SEGMENTS as f32;
        let offset = amplitude * (PI * s).sin() * (3.0 * PI * s).sin();
        points.push(head.lerp(tail, s).offset(nx * offset, ny * offset));
    }
    points.push(tail);
    points
}

/// Smooth curve through `points` (Catmull-Rom converted to cubic Béziers).
pub fn smooth_path(points: &[Point]) -> PathData {
    let Some(&first) = points.first() else {
        return PathData::new();
    };
    let mut path = PathData::new().move_to(first);
    let last = points.len() - 1;
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];
        let c1 = Point::new(p1.x + (p2.x - p0.x) / 6.0, p1.y + (p2.y - p0.y) / 6.0);
        let c2 = Point::new(p2.x - (p3.x - p1.x) / 6.0, p2.y - (p3.y - p1.y) / 6.0);
        path = path.cubic_to(c1, c2, p2);
    }
    path
}

/// Angle in degrees of the vector from `a` to `b`.
fn heading(a: Point, b: Point) -> f32 {
    (b.y - a.y).atan2(b.x - a.x).to_degrees()
}

fn draw_snake(scene: &mut Scene, index: usize, link: BoardLink) {
    let head = layout::tile_center(link.start);
    let tail = layout::tile_center(link.end);
    let spine = snake_spine(head, tail);
    let body = smooth_path(&spine);
    let (outline, fill, highlight) = SNAKE_COLORS[index % SNAKE_COLORS.len()];

    let gradient_id = format!("snake-body-{}", index);
    scene.define(Definition::LinearGradient {
        id: gradient_id.clone(),
        from: head,
        to: tail,
        stops: vec![
            GradientStop::new(0.0, outline),
            GradientStop::new(0.15, fill),
            GradientStop::new(0.5, highlight),
            GradientStop::new(0.85, fill),
            GradientStop::new(1.0, outline),
        ],
    });

    let mut cmds = vec![
        PaintCommand::Group {
            transform: Some(Transform::Translate(3.0, 4.0)),
            opacity: 1.0,
            children: vec![PaintCommand::Path {
                data: body.clone(),
                style: Style::stroke(Stroke::new(Paint::color("#000000"), 24.0).with_opacity(0.25)),
            }],
        },
        PaintCommand::Path {
            data: body.clone(),
            style: Style::stroke(Stroke::new(Paint::color(outline), 22.0)),
        },
        PaintCommand::Path {
            data: body.clone(),
            style: Style::stroke(Stroke::new(Paint::gradient(gradient_id), 16.0)),
        },
        PaintCommand::Path {
            data: body,
            style: Style::stroke(Stroke::new(Paint::color("#ffffff"), 4.0).with_opacity(0.35)),
        },
    ];

    // tail tip points along the direction of travel into the tail
    let before_tail = spine[spine.len().saturating_sub(2)];
    cmds.push(PaintCommand::Group {
        transform: Some(Transform::Rotate { degrees: heading(before_tail, tail), cx: tail.x, cy: tail.y }),
        opacity: 1.0,
        children: vec![PaintCommand::Path {
            data: PathData::new()
                .move_to(tail.offset(-6.0, -8.0))
                .quad_to(tail.offset(10.0, -3.0), tail.offset(20.0, 0.0))
                .quad_to(tail.offset(10.0, 3.0), tail.offset(-6.0, 8.0))
                .close(),
            style: Style::fill(Paint::color(fill)).with_stroke(Stroke::new(Paint::color(outline), 2.0)),
        }],
    });

    // head faces away from the body
    let after_head = spine.get(1).copied().unwrap_or(tail);
    cmds.push(PaintCommand::Group {
        transform: Some(Transform::Rotate { degrees: heading(after_head, head), cx: head.x, cy: head.y }),
        opacity: 1.0,
        children: snake_head(head, outline, fill),
    });

    scene.push(PaintCommand::group(cmds));
}

/// Head drawn facing +x around `h`; the caller rotates it into place.
fn snake_head(h: Point, outline: &str, fill: &str) -> Vec<PaintCommand> {
    let tongue = Stroke::new(Paint::color("#c0392b"), 2.0);
    let mut cmds = vec![PaintCommand::Path {
        data: PathData::new()
            .move_to(h.offset(18.0, 0.0))
            .line_to(h.offset(30.0, 0.0))
            .line_to(h.offset(36.0, -5.0))
            .move_to(h.offset(30.0, 0.0))
            .line_to(h.offset(36.0, 5.0)),
        style: Style::stroke(tongue),
    }];

    cmds.push(PaintCommand::Ellipse {
        cx: h.x,
        cy: h.y,
        rx: 21.0,
        ry: 16.0,
        style: Style::fill(Paint::color(fill)).with_stroke(Stroke::new(Paint::color(outline), 3.0)),
    });

    for side in [-1.0f32, 1.0] {
        cmds.push(PaintCommand::Circle {
            cx: h.x + 5.0,
            cy: h.y + side * 7.0,
            r: 5.0,
            style: Style::fill(Paint::color("#ffffff")).with_stroke(Stroke::new(Paint::color(outline), 1.0)),
        });
        cmds.push(PaintCommand::Circle {
            cx: h.x + 6.5,
            cy: h.y + side * 7.0,
            r: 2.4,
            style: Style::fill(Paint::color("#000000")),
        });
        cmds.push(PaintCommand::Circle {
            cx: h.x + 16.0,
            cy: h.y + side * 3.5,
            r: 1.4,
            style: Style::fill(Paint::color(outline)),
        });
    }
    cmds
}

/// Rails and rungs of one ladder in board pixels
#[derive(Debug, Clone, PartialEq)]
pub struct LadderGeometry {
    pub left_rail: (Point, Point),
    pub right_rail: (Point, Point),
    pub rungs: Vec<(Point, Point)>,
    pub length: f32,
}

fn clamp_min_magnitude(v: f32, min: f32) -> f32 {
    if v.abs() >= min {
        v
    } else if v < 0.0 {
        -min
    } else {
        min
    }
}

pub fn ladder_geometry(bottom: Point, top: Point) -> LadderGeometry {
    let (dx, dy) = (top.x - bottom.x, top.y - bottom.y);
    let angle = dy.atan2(dx);
    let length = dx.hypot(dy);

    // perpendicular to the direction of travel
    let off_x = clamp_min_magnitude(-angle.sin() * LADDER_HALF_WIDTH, LADDER_MIN_OFFSET);
    let off_y = clamp_min_magnitude(angle.cos() * LADDER_HALF_WIDTH, LADDER_MIN_OFFSET);

    let left_rail = (bottom.offset(off_x, off_y), top.offset(off_x, off_y));
    let right_rail = (bottom.offset(-off_x, -off_y), top.offset(-off_x, -off_y));

    let count = ((length / RUNG_SPACING).floor() as usize).clamp(MIN_RUNGS, MAX_RUNGS);
    let rungs = (1..=count)
        .map(|i| {
            let t = i as f32 / (count + 1) as f32;
            (left_rail.0.lerp(left_rail.1, t), right_rail.0.lerp(right_rail.1, t))
        })
        .collect();

    LadderGeometry { left_rail, right_rail, rungs, length }
}

fn draw_ladder(scene: &mut Scene, index: usize, link: BoardLink) {
    let bottom = layout::tile_center(link.start);
    let top = layout::tile_center(link.end);
    let geometry = ladder_geometry(bottom, top);

    let gradient_id = format!("ladder-rail-{}", index);
    scene.define(Definition::LinearGradient {
        id: gradient_id.clone(),
        from: bottom,
        to: top,
        stops: vec![
            GradientStop::new(0.0, LADDER_DARK),
            GradientStop::new(0.5, LADDER_LIGHT),
            GradientStop::new(1.0, LADDER_DARK),
        ],
    });

    let rails = [geometry.left_rail, geometry.right_rail];
    let mut shadow = Vec::new();
    let mut cmds = Vec::new();

    for (from, to) in rails {
        shadow.push(PaintCommand::Line {
            from,
            to,
            stroke: Stroke::new(Paint::color("#000000"), 9.0).with_opacity(0.3),
        });
        cmds.push(PaintCommand::Line {
            from,
            to,
            stroke: Stroke::new(Paint::gradient(gradient_id.clone()), 7.0).with_cap(LineCap::Butt),
        });
    }

    for &(from, to) in &geometry.rungs {
        shadow.push(PaintCommand::Line {
            from,
            to,
            stroke: Stroke::new(Paint::color("#000000"), 6.0).with_opacity(0.3),
        });
        cmds.push(PaintCommand::Line {
            from,
            to,
            stroke: Stroke::new(Paint::color(LADDER_RUNG), 5.0).with_cap(LineCap::Round),
        });
    }

    for (from, to) in rails {
        for p in [from, to] {
            cmds.push(PaintCommand::Circle {
                cx: p.x,
                cy: p.y,
                r: 5.0,
                style: Style::fill(Paint::color(LADDER_DARK)).with_stroke(Stroke::new(Paint::color(LADDER_LIGHT), 1.5)),
            });
        }
    }

    let label = bottom.offset(0.0, 34.0);
    cmds.push(PaintCommand::Rect {
        x: label.x - 22.0,
        y: label.y - 9.0,
        width: 44.0,
        height: 18.0,
        radius: 9.0,
        style: Style::fill(Paint::color(LADDER_DARK)).with_fill_opacity(0.9),
    });
    // drawn arrow, then the destination tile
    cmds.push(PaintCommand::Path {
        data: ladder_label_arrow(label.offset(-11.0, 0.0)),
        style: Style::fill(Paint::color(LABEL_INK)),
    });
    cmds.push(PaintCommand::Text {
        x: label.x - 3.0,
        y: label.y,
        text: link.end.to_string(),
        size: 11.0,
        weight: FontWeight::Bold,
        anchor: TextAnchor::Start,
        fill: Paint::color(LABEL_INK),
    });

    let mut all = vec![PaintCommand::Group {
        transform: Some(Transform::Translate(3.0, 3.0)),
        opacity: 1.0,
        children: shadow,
    }];
    all.extend(cmds);
    scene.push(PaintCommand::group(all));
}

/// Upward arrow centred on `c`, 8px wide and 12px tall.
pub fn ladder_label_arrow(c: Point) -> PathData {
    PathData::new()
        .move_to(c.offset(0.0, -6.0))
        .line_to(c.offset(4.0, -1.0))
        .line_to(c.offset(1.5, -1.0))
        .line_to(c.offset(1.5, 6.0))
        .line_to(c.offset(-1.5, 6.0))
        .line_to(c.offset(-1.5, -1.0))
        .line_to(c.offset(-4.0, -1.0))
        .close()
}

/// Centre of the `index`-th team's marker when it stands on `tile`.
pub fn marker_center(index: usize, tile: i32) -> Point {
    let (x, y) = layout::tile_to_pixel(tile);
    Point::new(
        x as f32 + MARKER_MARGIN_X + (index % 4) as f32 * MARKER_STAGGER,
        y as f32 + MARKER_MARGIN_Y,
    )
}

fn draw_marker(scene: &mut Scene, index: usize, team: &TeamPosition) {
    let c = marker_center(index, team.current_position);
    let (fill, ink) = TEAM_COLORS[index % TEAM_COLORS.len()];

    let mut cmds = vec![
        PaintCommand::Circle {
            cx: c.x + 2.0,
            cy: c.y + 3.0,
            r: MARKER_RADIUS,
            style: Style::fill(Paint::color("#000000")).with_fill_opacity(0.35),
        },
        PaintCommand::Circle {
            cx: c.x,
            cy: c.y,
            r: MARKER_RADIUS,
            style: Style::fill(Paint::color(fill)).with_stroke(Stroke::new(Paint::color("#ffffff"), 3.0)),
        },
    ];

    if let Some(glyph) = team.marker_glyph() {
        cmds.push(PaintCommand::Text {
            x: c.x,
            y: c.y,
            text: glyph.to_string(),
            size: 16.0,
            weight: FontWeight::Bold,
            anchor: TextAnchor::Middle,
            fill: Paint::color(ink),
        });
    }

    scene.push(PaintCommand::group(cmds));
}
