//! Text measurement and rasterisation
//!
//! Fonts are looked up once per family in the system font database and
//! leaked for the lifetime of the process. When no usable font exists
//! (headless boxes without fonts), measurement falls back to a per-char
//! estimate and drawing is skipped.

use std::collections::HashMap;
use std::fs;
use std::sync::{Mutex, OnceLock};

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use rusttype::{Font, Scale, point as rt_point};
use tiny_skia::{Pixmap, PixmapPaint, Transform};

use crate::domain::{Color, Point};

/// Estimated glyph advance as a fraction of the font size
const FALLBACK_ADVANCE: f32 = 0.6;
/// Estimated line height as a multiple of the font size
const FALLBACK_LINE_HEIGHT: f32 = 1.2;

fn db() -> &'static Database {
    static DB: OnceLock<Database> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = Database::new();
        db.load_system_fonts();
        log::debug!("Loaded {} system font faces", db.len());
        db
    })
}

/// Font for a family name, `None` when nothing matches
pub fn font_for(family: &str) -> Option<&'static Font<'static>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Option<&'static Font<'static>>>>> =
        OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));

    if let Some(font) = cache
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .get(family)
    {
        return *font;
    }

    let loaded = load_font_from_system(family)
        .or_else(|| load_font_from_system("Sans"))
        .map(|font| &*Box::leak(Box::new(font)));
    if loaded.is_none() {
        log::warn!("No usable font for family {family:?}");
    }

    cache
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .insert(family.to_string(), loaded);
    loaded
}

fn load_font_from_system(family: &str) -> Option<Font<'static>> {
    let families: Vec<Family<'_>> = match family.trim() {
        "" | "Sans" | "sans-serif" => vec![Family::SansSerif],
        "Serif" | "serif" => vec![Family::Serif],
        "Monospace" | "monospace" => vec![Family::Monospace],
        other => vec![Family::Name(other), Family::SansSerif],
    };

    let query = Query {
        families: &families,
        weight: Weight::NORMAL,
        stretch: Stretch::Normal,
        style: Style::Normal,
    };

    let id = db().query(&query)?;
    let face = db().face(id)?;

    match &face.source {
        fontdb::Source::File(path) | fontdb::Source::SharedFile(path, _) => {
            let bytes = fs::read(path).ok()?;
            Font::try_from_vec_and_index(bytes, face.index)
        }
        fontdb::Source::Binary(bytes) => {
            Font::try_from_vec_and_index(bytes.as_ref().as_ref().to_vec(), face.index)
        }
    }
}

fn line_height(font: &Font<'_>, scale: Scale) -> f32 {
    let v = font.v_metrics(scale);
    v.ascent - v.descent + v.line_gap
}

fn line_width(font: &Font<'_>, scale: Scale, line: &str) -> f32 {
    font.layout(line, scale, rt_point(0.0, 0.0))
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .fold(0.0, f32::max)
}

/// Width and height of a (possibly multi-line) text block
pub fn measure_text(text: &str, family: &str, size: f32) -> (f32, f32) {
    let line_count = text.lines().count().max(1) as f32;
    match font_for(family) {
        Some(font) => {
            let scale = Scale::uniform(size);
            let width = text
                .lines()
                .map(|line| line_width(font, scale, line))
                .fold(0.0, f32::max);
            (width, line_count * line_height(font, scale))
        }
        None => {
            let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
            (
                longest as f32 * size * FALLBACK_ADVANCE,
                line_count * size * FALLBACK_LINE_HEIGHT,
            )
        }
    }
}

/// Draw a text block whose top-left is `origin` in local coordinates
#[allow(clippy::too_many_arguments)]
pub fn draw_text(
    pixmap: &mut Pixmap,
    text: &str,
    family: &str,
    size: f32,
    color: Color,
    origin: Point,
    opacity: f32,
    transform: Transform,
) {
    let Some(font) = font_for(family) else {
        log::debug!("Skipping text {text:?}: no font");
        return;
    };
    let (width, height) = measure_text(text, family, size);
    let Some(mut layer) = Pixmap::new(width.ceil() as u32 + 2, height.ceil() as u32 + 2) else {
        return;
    };

    let scale = Scale::uniform(size);
    let advance = line_height(font, scale);
    let ascent = font.v_metrics(scale).ascent;
    let (lw, lh) = (layer.width() as i32, layer.height() as i32);
    let [r, g, b, a] = color.to_rgba_u8();
    let data = layer.data_mut();

    for (row, line) in text.lines().enumerate() {
        let baseline = rt_point(1.0, 1.0 + ascent + row as f32 * advance);
        for glyph in font.layout(line, scale, baseline) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, v| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 || px >= lw || py >= lh {
                    return;
                }
                let alpha = (v.clamp(0.0, 1.0) * f32::from(a)) as u16;
                let idx = ((py * lw + px) * 4) as usize;
                // Overlapping glyph edges keep the stronger coverage
                if alpha as u8 > data[idx + 3] {
                    data[idx] = (u16::from(r) * alpha / 255) as u8;
                    data[idx + 1] = (u16::from(g) * alpha / 255) as u8;
                    data[idx + 2] = (u16::from(b) * alpha / 255) as u8;
                    data[idx + 3] = alpha as u8;
                }
            });
        }
    }

    let paint = PixmapPaint {
        opacity,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(
        0,
        0,
        layer.as_ref(),
        &paint,
        transform.pre_translate(origin.x - 1.0, origin.y - 1.0),
        None,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_grows_with_text() {
        let (short_w, one_line) = measure_text("ab", "Sans", 20.0);
        let (long_w, _) = measure_text("abcdefgh", "Sans", 20.0);
        let (_, two_lines) = measure_text("ab\ncd", "Sans", 20.0);
        assert!(long_w > short_w);
        assert!(two_lines > one_line);
    }

    #[test]
    fn test_empty_text_has_one_line_height() {
        let (w, h) = measure_text("", "Sans", 10.0);
        assert_eq!(w, 0.0);
        assert!(h > 0.0);
    }
}
