//! Browser window frame drawn around exports
//!
//! Adds a fixed-height title bar above the image with window controls, an
//! optional URL bar and an optional capture date.

use chrono::{DateTime, Local};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tiny_skia::{
    FillRule, LineCap, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

use crate::domain::{Color, Point};
use crate::error::EditorError;
use crate::render::geometry::ellipse_path;
use crate::render::image::{pixmap_from_rgba, rgba_from_pixmap};
use crate::render::text::{draw_text, measure_text};

/// Height of the title bar
pub const FRAME_HEADER_HEIGHT: u32 = 40;

const HEADER_FONT: &str = "Sans";
const HEADER_FONT_SIZE: f32 = 13.0;
const URL_BAR_HEIGHT: f32 = 24.0;
const MAC_BUTTON_RADIUS: f32 = 6.0;
const MAC_BUTTON_SPACING: f32 = 20.0;
const WINDOWS_BUTTON_WIDTH: f32 = 46.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStyle {
    #[default]
    Mac,
    Windows,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameConfig {
    pub style: FrameStyle,
    /// Text of the URL bar; no bar when unset
    pub url: Option<String>,
    /// Print the export date in the title bar
    pub show_date: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            style: FrameStyle::Mac,
            url: None,
            show_date: false,
        }
    }
}

impl FrameStyle {
    fn header_color(self) -> Color {
        match self {
            FrameStyle::Mac => Color::rgb(232, 232, 232),
            FrameStyle::Windows => Color::rgb(243, 243, 243),
        }
    }

    /// Horizontal span left free for the URL bar
    fn url_span(self, width: f32) -> (f32, f32) {
        match self {
            FrameStyle::Mac => (80.0, width - 20.0),
            FrameStyle::Windows => (12.0, width - WINDOWS_BUTTON_WIDTH * 3.0 - 12.0),
        }
    }
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    let [r, g, b, a] = color.to_rgba_u8();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn fill_rect(pixmap: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, color: Color) {
    if let Some(rect) = Rect::from_xywh(x, y, w, h) {
        pixmap.fill_rect(rect, &paint(color), Transform::identity(), None);
    }
}

fn stroke_lines(pixmap: &mut Pixmap, lines: &[(Point, Point)], color: Color) {
    let mut pb = PathBuilder::new();
    for (a, b) in lines {
        pb.move_to(a.x, a.y);
        pb.line_to(b.x, b.y);
    }
    let Some(path) = pb.finish() else {
        return;
    };
    let stroke = Stroke {
        width: 1.0,
        line_cap: LineCap::Square,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
}

fn draw_mac_controls(pixmap: &mut Pixmap) {
    let cy = FRAME_HEADER_HEIGHT as f32 / 2.0;
    let colors = [
        Color::rgb(255, 95, 87),
        Color::rgb(254, 188, 46),
        Color::rgb(40, 200, 64),
    ];
    for (i, color) in colors.into_iter().enumerate() {
        let cx = MAC_BUTTON_SPACING * (i as f32 + 1.0);
        if let Some(path) = ellipse_path(cx, cy, MAC_BUTTON_RADIUS, MAC_BUTTON_RADIUS) {
            pixmap.fill_path(
                &path,
                &paint(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }
}

fn draw_windows_controls(pixmap: &mut Pixmap, width: f32) {
    let cy = FRAME_HEADER_HEIGHT as f32 / 2.0;
    let glyph = Color::rgb(60, 60, 60);
    let slot = |i: f32| width - WINDOWS_BUTTON_WIDTH * (3.0 - i) + WINDOWS_BUTTON_WIDTH / 2.0;
    let h = 5.0;

    // Minimize
    let x = slot(0.0);
    stroke_lines(pixmap, &[(Point::new(x - h, cy), Point::new(x + h, cy))], glyph);

    // Maximize
    let x = slot(1.0);
    let (l, r, t, b) = (x - h, x + h, cy - h, cy + h);
    stroke_lines(
        pixmap,
        &[
            (Point::new(l, t), Point::new(r, t)),
            (Point::new(r, t), Point::new(r, b)),
            (Point::new(r, b), Point::new(l, b)),
            (Point::new(l, b), Point::new(l, t)),
        ],
        glyph,
    );

    // Close
    let x = slot(2.0);
    stroke_lines(
        pixmap,
        &[
            (Point::new(x - h, cy - h), Point::new(x + h, cy + h)),
            (Point::new(x + h, cy - h), Point::new(x - h, cy + h)),
        ],
        glyph,
    );
}

fn draw_label(pixmap: &mut Pixmap, text: &str, origin: Point) {
    draw_text(
        pixmap,
        text,
        HEADER_FONT,
        HEADER_FONT_SIZE,
        Color::rgb(70, 70, 70),
        origin,
        1.0,
        Transform::identity(),
    );
}

/// Draw the frame using `now` as the printed date
pub fn apply_frame_at(
    image: &RgbaImage,
    config: &FrameConfig,
    now: DateTime<Local>,
) -> Result<RgbaImage, EditorError> {
    let (width, height) = (image.width(), image.height() + FRAME_HEADER_HEIGHT);
    let mut pixmap = Pixmap::new(width, height).ok_or(EditorError::Pixmap { width, height })?;
    let w = width as f32;
    let header = FRAME_HEADER_HEIGHT as f32;

    fill_rect(&mut pixmap, 0.0, 0.0, w, header, config.style.header_color());
    stroke_lines(
        &mut pixmap,
        &[(Point::new(0.0, header - 0.5), Point::new(w, header - 0.5))],
        Color::rgb(200, 200, 200),
    );

    match config.style {
        FrameStyle::Mac => draw_mac_controls(&mut pixmap),
        FrameStyle::Windows => draw_windows_controls(&mut pixmap, w),
    }

    let (mut left, mut right) = config.style.url_span(w);

    if config.show_date {
        let date = now.format("%Y-%m-%d %H:%M").to_string();
        let (tw, th) = measure_text(&date, HEADER_FONT, HEADER_FONT_SIZE);
        let x = right - tw;
        if x > left {
            draw_label(&mut pixmap, &date, Point::new(x, (header - th) / 2.0));
            right = x - 12.0;
        }
    }

    if let Some(url) = config.url.as_deref().filter(|u| !u.is_empty())
        && right - left > 40.0
    {
        let top = (header - URL_BAR_HEIGHT) / 2.0;
        fill_rect(&mut pixmap, left, top, right - left, URL_BAR_HEIGHT, Color::WHITE);
        left += 10.0;
        let (_, th) = measure_text(url, HEADER_FONT, HEADER_FONT_SIZE);
        draw_label(&mut pixmap, url, Point::new(left, (header - th) / 2.0));
    }

    let source = pixmap_from_rgba(image)?;
    pixmap.draw_pixmap(
        0,
        FRAME_HEADER_HEIGHT as i32,
        source.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    Ok(rgba_from_pixmap(&pixmap))
}

/// Draw the frame, dated now
pub fn apply_frame(image: &RgbaImage, config: &FrameConfig) -> Result<RgbaImage, EditorError> {
    apply_frame_at(image, config, Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn test_frame_adds_header() {
        let out = apply_frame(&black(300, 100), &FrameConfig::default()).unwrap();
        assert_eq!(out.dimensions(), (300, 140));
        assert_eq!(out.get_pixel(150, 45).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(150, 5).0, [232, 232, 232, 255]);
    }

    #[test]
    fn test_mac_controls() {
        let out = apply_frame(&black(300, 10), &FrameConfig::default()).unwrap();
        assert_eq!(out.get_pixel(20, 20).0, [255, 95, 87, 255]);
        assert_eq!(out.get_pixel(60, 20).0, [40, 200, 64, 255]);
    }

    #[test]
    fn test_url_bar_is_white() {
        let config = FrameConfig {
            style: FrameStyle::Windows,
            url: Some("https://example.com".to_string()),
            show_date: false,
        };
        let out = apply_frame(&black(400, 10), &config).unwrap();
        // Left edge of the bar, before any glyph
        assert_eq!(out.get_pixel(15, 10).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(5, 10).0, [243, 243, 243, 255]);
    }
}
