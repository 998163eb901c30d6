//! Scene graph for the board: typed drawing commands and shared definitions.
//!
//! The composer only ever builds these values; turning them into markup is
//! the job of `svg.rs`, which is also the single place text gets escaped.

use std::fmt::Write as _;

use crate::rendering::layout::Point;

/// How a shape is filled or stroked
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    None,
    /// Any CSS colour literal (`#rrggbb`, `white`, ...)
    Color(String),
    /// Reference to a gradient definition by id
    Gradient(String),
}

impl Paint {
    pub fn color(c: impl Into<String>) -> Self {
        Paint::Color(c.into())
    }

    pub fn gradient(id: impl Into<String>) -> Self {
        Paint::Gradient(id.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub paint: Paint,
    pub width: f32,
    pub cap: LineCap,
    pub opacity: f32,
}

impl Stroke {
    pub fn new(paint: Paint, width: f32) -> Self {
        Self { paint, width, cap: LineCap::Round, opacity: 1.0 }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }
}

/// Fill and stroke of a shape
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub fill: Paint,
    pub fill_opacity: f32,
    pub stroke: Option<Stroke>,
}

impl Style {
    pub fn fill(paint: Paint) -> Self {
        Self { fill: paint, fill_opacity: 1.0, stroke: None }
    }

    pub fn stroke(stroke: Stroke) -> Self {
        Self { fill: Paint::None, fill_opacity: 1.0, stroke: Some(stroke) }
    }

    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn with_fill_opacity(mut self, opacity: f32) -> Self {
        self.fill_opacity = opacity;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Translate(f32, f32),
    /// Rotation in degrees around a point
    Rotate { degrees: f32, cx: f32, cy: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    Close,
}

/// Path builder with deterministic serialization (two decimals)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData {
    segments: Vec<PathSegment>,
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, p: Point) -> Self {
        self.segments.push(PathSegment::MoveTo(p));
        self
    }

    pub fn line_to(mut self, p: Point) -> Self {
        self.segments.push(PathSegment::LineTo(p));
        self
    }

    pub fn quad_to(mut self, c: Point, p: Point) -> Self {
        self.segments.push(PathSegment::QuadTo(c, p));
        self
    }

    pub fn cubic_to(mut self, c1: Point, c2: Point, p: Point) -> Self {
        self.segments.push(PathSegment::CubicTo(c1, c2, p));
        self
    }

    pub fn close(mut self) -> Self {
        self.segments.push(PathSegment::Close);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First and last on-curve points.
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        let on_curve = |s: &PathSegment| match *s {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => Some(p),
            PathSegment::QuadTo(_, p) | PathSegment::CubicTo(_, _, p) => Some(p),
            PathSegment::Close => None,
        };
        let first = self.segments.iter().find_map(on_curve)?;
        let last = self.segments.iter().rev().find_map(on_curve)?;
        Some((first, last))
    }

    pub fn to_svg_data(&self) -> String {
        let mut d = String::new();
        for seg in &self.segments {
            if !d.is_empty() {
                d.push(' ');
            }
            // Writing to a String cannot fail.
            let _ = match *seg {
                PathSegment::MoveTo(p) => write!(d, "M {}", fmt_point(p)),
                PathSegment::LineTo(p) => write!(d, "L {}", fmt_point(p)),
                PathSegment::QuadTo(c, p) => write!(d, "Q {} {}", fmt_point(c), fmt_point(p)),
                PathSegment::CubicTo(c1, c2, p) => {
                    write!(d, "C {} {} {}", fmt_point(c1), fmt_point(c2), fmt_point(p))
                }
                PathSegment::Close => write!(d, "Z"),
            };
        }
        d
    }
}

fn fmt_point(p: Point) -> String {
    format!("{} {}", fmt_num(p.x), fmt_num(p.y))
}

/// Format a coordinate with at most two decimals and no trailing zeros.
pub fn fmt_num(v: f32) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    // avoid "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let s = format!("{:.2}", rounded);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: String,
    pub opacity: f32,
}

impl GradientStop {
    pub fn new(offset: f32, color: impl Into<String>) -> Self {
        Self { offset, color: color.into(), opacity: 1.0 }
    }
}

/// Shared resources referenced by id from commands
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// Gradient in user space between two points
    LinearGradient {
        id: String,
        from: Point,
        to: Point,
        stops: Vec<GradientStop>,
    },
    ClipRoundedRect {
        id: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
    },
}

impl Definition {
    pub fn id(&self) -> &str {
        match self {
            Definition::LinearGradient { id, .. } | Definition::ClipRoundedRect { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        style: Style,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        style: Style,
    },
    Ellipse {
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        style: Style,
    },
    Path {
        data: PathData,
        style: Style,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    /// Free text; `text` is raw and may contain anything a player typed
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        weight: FontWeight,
        anchor: TextAnchor,
        fill: Paint,
    },
    /// Raster image scaled to cover its box (`slice`), optionally clipped
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        href: String,
        clip: Option<String>,
    },
    Group {
        transform: Option<Transform>,
        opacity: f32,
        children: Vec<PaintCommand>,
    },
}

impl PaintCommand {
    pub fn group(children: Vec<PaintCommand>) -> Self {
        PaintCommand::Group { transform: None, opacity: 1.0, children }
    }

    /// Visit this command and every nested child in paint order.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a PaintCommand)) {
        f(self);
        if let PaintCommand::Group { children, .. } = self {
            for c in children {
                c.walk(f);
            }
        }
    }
}

/// A complete board drawing
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub defs: Vec<Definition>,
    pub commands: Vec<PaintCommand>,
}

impl Scene {
    pub fn new(width: u32, height: u32, background: impl Into<String>) -> Self {
        Self {
            width,
            height,
            background: background.into(),
            defs: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn define(&mut self, def: Definition) {
        self.defs.push(def);
    }

    pub fn push(&mut self, cmd: PaintCommand) {
        self.commands.push(cmd);
    }

    pub fn definition(&self, id: &str) -> Option<&Definition> {
        self.defs.iter().find(|d| d.id() == id)
    }

    /// Flattened view of every command, groups included, in paint order.
    pub fn flatten(&self) -> Vec<&PaintCommand> {
        let mut out = Vec::new();
        for c in &self.commands {
            c.walk(&mut |cmd| out.push(cmd));
        }
        out
    }

    /// All text nodes with their positions, in paint order.
    pub fn texts(&self) -> Vec<(f32, f32, &str)> {
        self.flatten()
            .into_iter()
            .filter_map(|c| match c {
                PaintCommand::Text { x, y, text, .. } => Some((*x, *y, text.as_str())),
                _ => None,
            })
            .collect()
    }
}
