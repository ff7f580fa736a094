//! Configuration persistence for capmark settings

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::{Color, ToolSettings};
use crate::export::{
    DEFAULT_QUALITY, ExportConfig, ExportFormat, FrameConfig, PaddingConfig, WatermarkSettings,
};
use crate::session::state::DEFAULT_BLUR_PIXEL_SIZE;

/// Save location for exports (Pictures or Documents)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveLocation {
    #[default]
    Pictures,
    Documents,
}

/// Editor configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Settings new annotations start from
    pub tool_settings: ToolSettings,
    /// Most recent first
    pub recent_colors: Vec<Color>,
    /// Blur block size (4-32)
    pub blur_pixel_size: u32,
    /// Where exported files go when no path is given
    pub save_location: SaveLocation,
    pub export_format: ExportFormat,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Image file stamped on exports; no watermark when unset
    pub watermark_path: Option<PathBuf>,
    pub watermark: WatermarkSettings,
    pub browser_frame: Option<FrameConfig>,
    pub padding: Option<PaddingConfig>,
    /// Undo depth; unlimited when unset
    pub history_limit: Option<usize>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tool_settings: ToolSettings::default(),
            recent_colors: Vec::new(),
            blur_pixel_size: DEFAULT_BLUR_PIXEL_SIZE,
            save_location: SaveLocation::Pictures,
            export_format: ExportFormat::Png,
            jpeg_quality: DEFAULT_QUALITY,
            watermark_path: None,
            watermark: WatermarkSettings::default(),
            browser_frame: None,
            padding: None,
            history_limit: Some(100),
        }
    }
}

impl EditorConfig {
    /// Directory name under the platform config dir
    pub const APP_DIR: &'static str = "capmark";

    /// Default location of the config file
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::APP_DIR).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            log::warn!("No config directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {err:#}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) {
        let Some(path) = Self::path() else {
            log::error!("No config directory, cannot save config");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            log::error!("Failed to save config: {err:#}");
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Export settings without the watermark image, which is loaded separately
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            watermark: None,
            browser_frame: self.browser_frame.clone(),
            padding: self.padding,
            format: self.export_format,
            quality: self.jpeg_quality,
        }
    }

    /// Timestamped output path in the configured save location
    pub fn output_path(&self) -> Option<PathBuf> {
        let mut path = match self.save_location {
            SaveLocation::Pictures => {
                dirs::picture_dir().or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))
            }
            SaveLocation::Documents => {
                dirs::document_dir().or_else(|| dirs::home_dir().map(|h| h.join("Documents")))
            }
        }?;
        let name = chrono::Local::now()
            .format("Capmark_%Y-%m-%d_%H-%M-%S")
            .to_string();
        path.push(format!("{name}.{}", self.export_format.extension()));
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = EditorConfig {
            blur_pixel_size: 20,
            export_format: ExportFormat::Webp,
            recent_colors: vec![Color::rgb(1, 2, 3)],
            padding: Some(PaddingConfig::default()),
            ..EditorConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(EditorConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"exportFormat": "jpeg"}"#).unwrap();
        let config = EditorConfig::load_from(&path).unwrap();
        assert_eq!(config.export_format, ExportFormat::Jpeg);
        assert_eq!(config.blur_pixel_size, DEFAULT_BLUR_PIXEL_SIZE);
        assert_eq!(config.tool_settings, ToolSettings::default());
    }

    #[test]
    fn test_garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(EditorConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_output_path_extension() {
        let config = EditorConfig {
            export_format: ExportFormat::Jpeg,
            ..EditorConfig::default()
        };
        if let Some(path) = config.output_path() {
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
        }
    }
}
