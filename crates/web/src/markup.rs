//! Selectors, attribute names and parsing shared by the DOM binding.

use scrollreel_core::{AppConfig, ElementId};

pub const CONFIG_SCRIPT_ID: &str = "scrollreel-config";

pub const VIDEO_SELECTOR: &str = ".scroll-video";
pub const SEQUENCE_SELECTOR: &str = ".scroll-canvas";
pub const REVEAL_SELECTOR: &str = ".reveal";
pub const REVEALED_CLASS: &str = "active";

pub const FRAMES_PATH_ATTR: &str = "data-frames-path";
pub const FRAMES_COUNT_ATTR: &str = "data-frames-count";
/// Set on every managed element so observer callbacks can find its id.
pub const ELEMENT_ID_ATTR: &str = "data-scrollreel-id";

pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

pub const SNOW_CANVAS_ID: &str = "snow-canvas";
pub const MENU_BUTTON_ID: &str = "mobile-menu-btn";
pub const MENU_ID: &str = "mobile-menu";
pub const MENU_HIDDEN_CLASS: &str = "hidden";
pub const HERO_ID: &str = "hero-visual";
pub const HERO_IMAGE_SRC: &str = "assets/images/hero-logo.png";
pub const HERO_IMAGE_ALT: &str = "Зимний Фестиваль 2026";
pub const HERO_IMAGE_CLASS: &str = "mx-auto max-w-xs md:max-w-md h-auto animate-fade-in";

/// Reads the page config from the text of the config script tag. A missing
/// tag yields the defaults; a malformed one is logged and also yields them.
pub fn config_from_script(text: Option<&str>) -> AppConfig {
    let Some(text) = text.map(str::trim).filter(|text| !text.is_empty()) else {
        return AppConfig::default();
    };

    match AppConfig::from_json_str(text) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring page config");
            AppConfig::default()
        }
    }
}

pub fn parse_element_id(value: Option<&str>) -> Option<ElementId> {
    value?.trim().parse().ok().map(ElementId)
}

/// Hands out element ids. An element already tagged keeps its id, so media
/// and reveal observers agree on it.
#[derive(Debug)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Returns the id for an element whose id attribute reads `existing`,
    /// and whether the attribute must be written.
    pub fn id_for(&mut self, existing: Option<&str>) -> (ElementId, bool) {
        if let Some(id) = parse_element_id(existing) {
            self.next = self.next.max(id.0.saturating_add(1));
            return (id, false);
        }
        let id = ElementId(self.next);
        self.next += 1;
        (id, true)
    }
}

/// CSS colour for a snowflake of the given opacity.
pub fn snow_fill(opacity: f64) -> String {
    format!("rgba(255, 255, 255, {opacity})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_when_missing_or_broken() {
        assert_eq!(config_from_script(None), AppConfig::default());
        assert_eq!(config_from_script(Some("   ")), AppConfig::default());
        assert_eq!(config_from_script(Some("{ not json")), AppConfig::default());
    }

    #[test]
    fn config_overrides_selected_fields() {
        let config = config_from_script(Some(
            r#"{ "snow": { "particle_count": 40 }, "scrub": { "frame_extension": "jpg" } }"#,
        ));
        assert_eq!(config.snow.particle_count, 40);
        assert_eq!(config.scrub.frame_extension, "jpg");
        assert_eq!(config.reveal, AppConfig::default().reveal);
    }

    #[test]
    fn element_ids_parse_from_attributes() {
        assert_eq!(parse_element_id(Some("7")), Some(ElementId(7)));
        assert_eq!(parse_element_id(Some("x")), None);
        assert_eq!(parse_element_id(None), None);
    }

    #[test]
    fn tagged_elements_keep_their_id() {
        let mut ids = IdAllocator::default();
        let (media, fresh) = ids.id_for(None);
        assert_eq!((media, fresh), (ElementId(1), true));

        let tag = media.0.to_string();
        assert_eq!(ids.id_for(Some(&tag)), (media, false));
        assert_eq!(ids.id_for(None), (ElementId(2), true));
    }

    #[test]
    fn fresh_ids_never_collide_with_existing_tags() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.id_for(Some("9")), (ElementId(9), false));
        assert_eq!(ids.id_for(None), (ElementId(10), true));
    }

    #[test]
    fn snow_fill_is_white_with_alpha() {
        assert_eq!(snow_fill(0.5), "rgba(255, 255, 255, 0.5)");
    }
}
