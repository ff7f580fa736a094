//! Tool settings supplied by the editor shell

use serde::{Deserialize, Serialize};

use super::annotation::PointerDirection;
use super::style::Color;

/// Current tool settings, applied to every new annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolSettings {
    pub color: Color,
    pub stroke_width: f32,
    pub opacity: f32,
    pub font_family: String,
    pub font_size: f32,
    /// Fill/background color for text, callout and shapes
    pub background_color: Option<Color>,
    /// Whether to draw a drop shadow under new annotations
    pub has_shadow: bool,
    /// Text placed by the text and callout tools
    pub text: String,
    /// Which side of the callout box the pointer leaves from
    pub pointer_direction: PointerDirection,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: Color::default(),
            stroke_width: 3.0,
            opacity: 1.0,
            font_family: "Sans".to_string(),
            font_size: 20.0,
            background_color: None,
            has_shadow: false,
            text: "Text".to_string(),
            pointer_direction: PointerDirection::Bottom,
        }
    }
}
