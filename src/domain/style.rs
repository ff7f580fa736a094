//! Style and transform records plus the factories that build them from
//! tool settings

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::geometry::Point;
use super::settings::ToolSettings;

/// Smallest scale factor a transform may carry
pub const MIN_SCALE: f32 = 0.01;

/// Serializable RGBA color, stored as `#rrggbb` or `#rrggbbaa`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with the alpha channel replaced
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Same color with alpha multiplied by `opacity` in [0, 1]
    pub fn faded(self, opacity: f32) -> Self {
        let a = (f32::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        self.with_alpha(a)
    }

    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    /// Relative luminance in [0, 1], used to pick readable label colors
    pub fn luminance(self) -> f32 {
        (0.2126 * f32::from(self.r) + 0.7152 * f32::from(self.g) + 0.0722 * f32::from(self.b))
            / 255.0
    }
}

impl Default for Color {
    fn default() -> Self {
        // Default red
        Color::rgb(230, 26, 26)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "#{:02x}{:02x}{:02x}{:02x}",
                self.r, self.g, self.b, self.a
            )
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(format!("bad color {s:?}"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("bad color {s:?}: {e}"))
        };
        match hex.len() {
            3 => {
                let expand = |c: char| -> Result<u8, String> {
                    let v = c
                        .to_digit(16)
                        .ok_or_else(|| format!("bad color {s:?}"))?;
                    Ok((v * 17) as u8)
                };
                let mut chars = hex.chars();
                let (Some(r), Some(g), Some(b)) = (chars.next(), chars.next(), chars.next())
                else {
                    return Err(format!("bad color {s:?}"));
                };
                Ok(Color::rgb(expand(r)?, expand(g)?, expand(b)?))
            }
            6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Color::rgba(
                channel(0)?,
                channel(2)?,
                channel(4)?,
                channel(6)?,
            )),
            _ => Err(format!("bad color {s:?}: expected #rgb, #rrggbb or #rrggbbaa")),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

/// Visual style shared by every annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationStyle {
    pub color: Color,
    /// Stroke width in canvas units, always > 0
    pub stroke_width: f32,
    /// Opacity in [0, 1]
    pub opacity: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
}

impl AnnotationStyle {
    /// Default style for a tool, derived from the current settings
    pub fn from_settings(settings: &ToolSettings) -> Self {
        Self {
            color: settings.color,
            stroke_width: sanitize_stroke(settings.stroke_width),
            opacity: sanitize_opacity(settings.opacity),
            fill: settings.background_color,
        }
    }

    /// Same style with an explicit opacity (clamped to [0, 1])
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            opacity: sanitize_opacity(opacity),
            ..self
        }
    }

    pub fn is_valid(&self) -> bool {
        self.stroke_width.is_finite()
            && self.stroke_width > 0.0
            && (0.0..=1.0).contains(&self.opacity)
    }
}

fn sanitize_stroke(width: f32) -> f32 {
    if width.is_finite() && width > 0.0 {
        width
    } else {
        1.0
    }
}

fn sanitize_opacity(opacity: f32) -> f32 {
    if opacity.is_finite() {
        opacity.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Anchor position plus linear scale and rotation (degrees)
///
/// Canvas position of a local point is
/// `translate(x, y) * rotate(rotation) * scale(scale_x, scale_y) * local`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    #[serde(default)]
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Point::ZERO)
    }
}

impl Transform {
    /// Unscaled, unrotated transform anchored at `anchor`
    pub fn at(anchor: Point) -> Self {
        Self {
            x: anchor.x,
            y: anchor.y,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
        }
    }

    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Same transform moved by an offset
    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Scale position and size by independent factors (document resize)
    pub fn scaled(self, sx: f32, sy: f32) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
            scale_x: (self.scale_x * sx).max(MIN_SCALE),
            scale_y: (self.scale_y * sy).max(MIN_SCALE),
            rotation: self.rotation,
        }
    }

    /// Clamp scale to positive values, replace non-finite fields
    pub fn sanitized(self) -> Self {
        let finite_or = |v: f32, d: f32| if v.is_finite() { v } else { d };
        Self {
            x: finite_or(self.x, 0.0),
            y: finite_or(self.y, 0.0),
            scale_x: finite_or(self.scale_x, 1.0).max(MIN_SCALE),
            scale_y: finite_or(self.scale_y, 1.0).max(MIN_SCALE),
            rotation: finite_or(self.rotation, 0.0),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.rotation.is_finite()
            && self.scale_x.is_finite()
            && self.scale_y.is_finite()
            && self.scale_x > 0.0
            && self.scale_y > 0.0
    }

    /// Map a local point into canvas space
    pub fn map_point(&self, local: Point) -> Point {
        let scaled = Point::new(local.x * self.scale_x, local.y * self.scale_y);
        scaled.rotate(self.rotation.to_radians()) + self.anchor()
    }

    pub fn to_skia(&self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_translate(self.x, self.y)
            .pre_rotate(self.rotation)
            .pre_scale(self.scale_x, self.scale_y)
    }
}

/// Most-recently-used colors, newest first, without duplicates
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecentColors {
    colors: VecDeque<Color>,
}

impl RecentColors {
    pub const CAPACITY: usize = 5;

    pub fn from_colors(colors: impl IntoIterator<Item = Color>) -> Self {
        let mut ring = Self::default();
        let collected: Vec<Color> = colors.into_iter().collect();
        // Oldest first so the first item ends up most recent
        for color in collected.into_iter().rev() {
            ring.push(color);
        }
        ring
    }

    /// Record a color use, moving it to the front
    pub fn push(&mut self, color: Color) {
        self.colors.retain(|c| *c != color);
        self.colors.push_front(color);
        self.colors.truncate(Self::CAPACITY);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Color> {
        self.colors.iter()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Color> {
        self.colors.iter().copied().collect()
    }
}
