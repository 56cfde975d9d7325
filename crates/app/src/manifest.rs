use std::path::Path;

use scrollreel_core::{AppConfig, ElementId, MediaKind, Result};
use serde::{Deserialize, Serialize};

/// Headless description of a page: its scrollable height and the media
/// elements laid out on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub config: AppConfig,
    pub document_height: f64,
    pub elements: Vec<ElementSpec>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(content)?;
        manifest.config.validate()?;
        Ok(manifest)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementSpec {
    Video {
        id: u32,
        top: f64,
        height: f64,
        #[serde(default)]
        src: String,
        duration: f64,
    },
    ImageSequence {
        id: u32,
        top: f64,
        height: f64,
        #[serde(default = "default_canvas_width")]
        width: f64,
        frames_path: String,
        /// Raw attribute value; validated when the sequence is built.
        frames_count: serde_json::Value,
    },
}

impl ElementSpec {
    pub fn id(&self) -> ElementId {
        match self {
            Self::Video { id, .. } | Self::ImageSequence { id, .. } => ElementId(*id),
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Video { .. } => MediaKind::Video,
            Self::ImageSequence { .. } => MediaKind::ImageSequence,
        }
    }

    pub fn top(&self) -> f64 {
        match self {
            Self::Video { top, .. } | Self::ImageSequence { top, .. } => *top,
        }
    }

    pub fn height(&self) -> f64 {
        match self {
            Self::Video { height, .. } | Self::ImageSequence { height, .. } => *height,
        }
    }
}

/// Renders a JSON value the way it would appear in an HTML attribute.
pub fn attribute_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn default_canvas_width() -> f64 {
    360.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_elements() {
        let manifest = Manifest::from_json_str(
            r#"{
                "document_height": 3000,
                "elements": [
                    { "kind": "video", "id": 1, "top": 900, "height": 500, "duration": 6.5 },
                    { "kind": "image_sequence", "id": 2, "top": 1800, "height": 640,
                      "frames_path": "frames/intro", "frames_count": "48" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.elements.len(), 2);
        assert_eq!(manifest.elements[0].kind(), MediaKind::Video);
        assert_eq!(manifest.elements[1].id(), ElementId(2));
        assert_eq!(manifest.config.scrub.frame_extension, "webp");
    }

    #[test]
    fn attribute_text_keeps_strings_verbatim() {
        assert_eq!(attribute_text(&serde_json::json!("12")), "12");
        assert_eq!(attribute_text(&serde_json::json!(12)), "12");
        assert_eq!(attribute_text(&serde_json::json!(-1)), "-1");
    }
}
