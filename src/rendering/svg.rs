//! Serialize a [`Scene`] into an SVG document.
//!
//! Every attribute value and text node goes through [`escape_xml`]; task
//! names and team names are player-supplied.

use std::fmt::Write as _;

use crate::rendering::paint::{
    fmt_num, Definition, FontWeight, LineCap, Paint, PaintCommand, Scene, Stroke, Style, TextAnchor,
    Transform,
};

const FONT_FAMILY: &str = "DejaVu Sans, Arial, Helvetica, sans-serif";

/// Escape text for use in XML attribute values and text nodes.
///
/// Control characters XML 1.0 cannot carry at all are dropped.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(' '),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

pub fn to_svg(scene: &Scene) -> String {
    let mut svg = String::with_capacity(64 * 1024);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = scene.width,
        h = scene.height
    );

    if !scene.defs.is_empty() {
        svg.push_str("<defs>");
        for def in &scene.defs {
            write_definition(&mut svg, def);
        }
        svg.push_str("</defs>");
    }

    let _ = write!(
        svg,
        "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
        scene.width,
        scene.height,
        escape_xml(&scene.background)
    );

    for cmd in &scene.commands {
        write_command(&mut svg, cmd);
    }

    svg.push_str("</svg>");
    svg
}

fn write_definition(svg: &mut String, def: &Definition) {
    match def {
        Definition::LinearGradient { id, from, to, stops } => {
            let _ = write!(
                svg,
                "<linearGradient id=\"{}\" gradientUnits=\"userSpaceOnUse\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">",
                escape_xml(id),
                fmt_num(from.x),
                fmt_num(from.y),
                fmt_num(to.x),
                fmt_num(to.y)
            );
            for stop in stops {
                let _ = write!(
                    svg,
                    "<stop offset=\"{}\" stop-color=\"{}\" stop-opacity=\"{}\"/>",
                    fmt_num(stop.offset),
                    escape_xml(&stop.color),
                    fmt_num(stop.opacity)
                );
            }
            svg.push_str("</linearGradient>");
        }
        Definition::ClipRoundedRect { id, x, y, width, height, radius } => {
            let _ = write!(
                svg,
                "<clipPath id=\"{}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" ry=\"{}\"/></clipPath>",
                escape_xml(id),
                fmt_num(*x),
                fmt_num(*y),
                fmt_num(*width),
                fmt_num(*height),
                fmt_num(*radius),
                fmt_num(*radius)
            );
        }
    }
}

fn paint_attr(paint: &Paint) -> String {
    match paint {
        Paint::None => "none".to_string(),
        Paint::Color(c) => escape_xml(c),
        Paint::Gradient(id) => format!("url(#{})", escape_xml(id)),
    }
}

fn stroke_attrs(stroke: &Stroke) -> String {
    let cap = match stroke.cap {
        LineCap::Butt => "butt",
        LineCap::Round => "round",
    };
    let mut s = format!(
        " stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"{}\" stroke-linejoin=\"round\"",
        paint_attr(&stroke.paint),
        fmt_num(stroke.width),
        cap
    );
    if stroke.opacity < 1.0 {
        let _ = write!(s, " stroke-opacity=\"{}\"", fmt_num(stroke.opacity));
    }
    s
}

fn style_attrs(style: &Style) -> String {
    let mut s = format!(" fill=\"{}\"", paint_attr(&style.fill));
    if style.fill_opacity < 1.0 {
        let _ = write!(s, " fill-opacity=\"{}\"", fmt_num(style.fill_opacity));
    }
    if let Some(stroke) = &style.stroke {
        s.push_str(&stroke_attrs(stroke));
    }
    s
}

fn transform_attr(t: &Transform) -> String {
    match *t {
        Transform::Translate(dx, dy) => format!(" transform=\"translate({} {})\"", fmt_num(dx), fmt_num(dy)),
        Transform::Rotate { degrees, cx, cy } => format!(
            " transform=\"rotate({} {} {})\"",
            fmt_num(degrees),
            fmt_num(cx),
            fmt_num(cy)
        ),
    }
}

fn write_command(svg: &mut String, cmd: &PaintCommand) {
    match cmd {
        PaintCommand::Rect { x, y, width, height, radius, style } => {
            let _ = write!(
                svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{r}\" ry=\"{r}\"{}/>",
                fmt_num(*x),
                fmt_num(*y),
                fmt_num(*width),
                fmt_num(*height),
                style_attrs(style),
                r = fmt_num(*radius)
            );
        }
        PaintCommand::Circle { cx, cy, r, style } => {
            let _ = write!(
                svg,
                "<circle cx=\"{}\" cy=\"{}\" r=\"{}\"{}/>",
                fmt_num(*cx),
                fmt_num(*cy),
                fmt_num(*r),
                style_attrs(style)
            );
        }
        PaintCommand::Ellipse { cx, cy, rx, ry, style } => {
            let _ = write!(
                svg,
                "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\"{}/>",
                fmt_num(*cx),
                fmt_num(*cy),
                fmt_num(*rx),
                fmt_num(*ry),
                style_attrs(style)
            );
        }
        PaintCommand::Path { data, style } => {
            if data.is_empty() {
                return;
            }
            let _ = write!(svg, "<path d=\"{}\"{}/>", escape_xml(&data.to_svg_data()), style_attrs(style));
        }
        PaintCommand::Line { from, to, stroke } => {
            let _ = write!(
                svg,
                "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"{}/>",
                fmt_num(from.x),
                fmt_num(from.y),
                fmt_num(to.x),
                fmt_num(to.y),
                stroke_attrs(stroke)
            );
        }
        PaintCommand::Text { x, y, text, size, weight, anchor, fill } => {
            let anchor = match anchor {
                TextAnchor::Start => "start",
                TextAnchor::Middle => "middle",
            };
            let weight = match weight {
                FontWeight::Normal => "normal",
                FontWeight::Bold => "bold",
            };
            let _ = write!(
                svg,
                "<text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" text-anchor=\"{}\" dominant-baseline=\"central\" fill=\"{}\">{}</text>",
                fmt_num(*x),
                fmt_num(*y),
                FONT_FAMILY,
                fmt_num(*size),
                weight,
                anchor,
                paint_attr(fill),
                escape_xml(text)
            );
        }
        PaintCommand::Image { x, y, width, height, href, clip } => {
            let clip = clip
                .as_ref()
                .map(|id| format!(" clip-path=\"url(#{})\"", escape_xml(id)))
                .unwrap_or_default();
            let _ = write!(
                svg,
                "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid slice\"{} xlink:href=\"{}\"/>",
                fmt_num(*x),
                fmt_num(*y),
                fmt_num(*width),
                fmt_num(*height),
                clip,
                escape_xml(href)
            );
        }
        PaintCommand::Group { transform, opacity, children } => {
            svg.push_str("<g");
            if let Some(t) = transform {
                svg.push_str(&transform_attr(t));
            }
            if *opacity < 1.0 {
                let _ = write!(svg, " opacity=\"{}\"", fmt_num(*opacity));
            }
            svg.push('>');
            for child in children {
                write_command(svg, child);
            }
            svg.push_str("</g>");
        }
    }
}
