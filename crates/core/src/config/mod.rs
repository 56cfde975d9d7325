use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{activation::ActivationPolicy, loader::LoadStrategy, Result, ScrollReelError};

/// Top-level configuration structure for the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scrub: ScrubConfig,
    pub activation: ActivationConfig,
    pub reveal: RevealConfig,
    pub snow: SnowConfig,
}

impl AppConfig {
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let scrub = &self.scrub;
        if !scrub.seek_hysteresis_seconds.is_finite() || scrub.seek_hysteresis_seconds < 0.0 {
            return Err(invalid("seek hysteresis must be a non-negative number"));
        }
        if scrub.frame_extension.trim().is_empty() {
            return Err(invalid("frame extension cannot be empty"));
        }
        if scrub.frame_padding == 0 {
            return Err(invalid("frame padding must be at least 1"));
        }
        if scrub.load_strategy == LoadStrategy::Bounded(0) {
            return Err(invalid("bounded loading needs at least one request in flight"));
        }

        let activation = &self.activation;
        if !(activation.desktop_min_width > 0.0) {
            return Err(invalid("desktop breakpoint must be positive"));
        }
        if !(activation.proximity_margin_px >= 0.0) {
            return Err(invalid("proximity margin cannot be negative"));
        }

        let reveal = &self.reveal;
        if !(0.0..=1.0).contains(&reveal.threshold) {
            return Err(invalid("reveal threshold must lie in [0, 1]"));
        }
        if !(0.0..100.0).contains(&reveal.bottom_inset_percent) {
            return Err(invalid("reveal bottom inset must lie in [0, 100)"));
        }

        let snow = &self.snow;
        if !(snow.friction > 0.0 && snow.friction <= 1.0) {
            return Err(invalid("snow friction must lie in (0, 1]"));
        }
        if snow.tilt_divisor == 0.0 || !snow.tilt_divisor.is_finite() {
            return Err(invalid("snow tilt divisor must be a non-zero number"));
        }
        if !(snow.interaction_radius >= 0.0) {
            return Err(invalid("snow interaction radius cannot be negative"));
        }
        if snow.min_size > snow.max_size || snow.min_fall_speed > snow.max_fall_speed {
            return Err(invalid("snow ranges must be ordered min <= max"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ScrollReelError {
    ScrollReelError::invalid_config(msg)
}

/// Settings shared by the scrubbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubConfig {
    /// Seeks smaller than this many seconds are skipped.
    pub seek_hysteresis_seconds: f64,
    pub frame_extension: String,
    /// Zero-padding width of frame numbers in file names.
    pub frame_padding: usize,
    pub load_strategy: LoadStrategy,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            seek_hysteresis_seconds: 0.05,
            frame_extension: "webp".to_string(),
            frame_padding: 3,
            load_strategy: LoadStrategy::Eager,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    /// Viewports at least this wide are treated as desktop.
    pub desktop_min_width: f64,
    /// How far ahead of the viewport lazy elements activate.
    pub proximity_margin_px: f64,
    pub generous: ActivationPolicy,
    pub constrained: ActivationPolicy,
}

impl ActivationConfig {
    /// Media query matching desktop-class viewports.
    pub fn desktop_query(&self) -> String {
        format!("(min-width: {}px)", self.desktop_min_width)
    }
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            desktop_min_width: 768.0,
            proximity_margin_px: 200.0,
            generous: ActivationPolicy::generous_default(),
            constrained: ActivationPolicy::constrained_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Fraction of the element that must be visible.
    pub threshold: f64,
    /// Percentage of the viewport height ignored at the bottom edge.
    pub bottom_inset_percent: f64,
}

impl RevealConfig {
    /// Intersection observer root margin for the bottom inset.
    pub fn root_margin(&self) -> String {
        format!("0px 0px -{}% 0px", self.bottom_inset_percent)
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            bottom_inset_percent: 10.0,
        }
    }
}

/// Tuning for the falling snow backdrop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowConfig {
    pub particle_count: usize,
    pub interaction_radius: f64,
    pub push_strength: f64,
    pub friction: f64,
    /// Device tilt in degrees is divided by this to get horizontal drift.
    pub tilt_divisor: f64,
    /// Added to the fall speed each step while it is below `min_fall_speed`.
    pub recovery: f64,
    pub min_fall_speed: f64,
    pub max_fall_speed: f64,
    pub max_drift: f64,
    pub min_size: f64,
    pub max_size: f64,
    pub min_opacity: f64,
    /// How far past the sides a flake may drift before it respawns.
    pub horizontal_margin: f64,
    pub bottom_margin: f64,
    pub spawn_height: f64,
}

impl Default for SnowConfig {
    fn default() -> Self {
        Self {
            particle_count: 150,
            interaction_radius: 150.0,
            push_strength: 5.0,
            friction: 0.98,
            tilt_divisor: 20.0,
            recovery: 0.05,
            min_fall_speed: 1.0,
            max_fall_speed: 3.0,
            max_drift: 0.5,
            min_size: 1.0,
            max_size: 3.0,
            min_opacity: 0.5,
            horizontal_margin: 50.0,
            bottom_margin: 10.0,
            spawn_height: -10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation;

    #[test]
    fn defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json_str(
            r#"{
                "scrub": { "frame_extension": "jpg", "load_strategy": { "bounded": 4 } },
                "activation": { "constrained": { "video": "disabled", "image_sequence": "eager" } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.scrub.frame_extension, "jpg");
        assert_eq!(config.scrub.load_strategy, LoadStrategy::Bounded(4));
        assert_eq!(config.scrub.seek_hysteresis_seconds, 0.05);
        assert_eq!(config.activation.constrained.image_sequence, Activation::Eager);
        assert_eq!(config.snow.particle_count, 150);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = AppConfig::from_json_str(r#"{ "reveal": { "threshold": 1.5 } }"#).unwrap_err();
        assert!(matches!(err, ScrollReelError::InvalidConfig(_)));

        let err = AppConfig::from_json_str(r#"{ "snow": { "tilt_divisor": 0 } }"#).unwrap_err();
        assert!(format!("{err}").contains("tilt"));
    }

    #[test]
    fn renders_observer_strings() {
        assert_eq!(RevealConfig::default().root_margin(), "0px 0px -10% 0px");
        assert_eq!(ActivationConfig::default().desktop_query(), "(min-width: 768px)");
    }
}
