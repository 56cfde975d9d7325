use std::collections::BTreeSet;

use crate::{config::RevealConfig, ElementId, ElementRect};

/// Fraction of `rect` visible inside the viewport once the bottom
/// `bottom_inset` fraction of it is ignored.
pub fn visible_ratio(rect: ElementRect, viewport_height: f64, bottom_inset: f64) -> f64 {
    let visible_bottom = viewport_height * (1.0 - bottom_inset);
    let top = rect.top.max(0.0);
    let bottom = rect.bottom().min(visible_bottom);
    if rect.height <= 0.0 {
        return if rect.top >= 0.0 && rect.top <= visible_bottom {
            1.0
        } else {
            0.0
        };
    }
    ((bottom - top) / rect.height).clamp(0.0, 1.0)
}

/// One-shot reveal-on-scroll: every observed element is reported exactly
/// once, the first time it becomes visible enough, then forgotten.
#[derive(Debug, Clone)]
pub struct RevealTracker {
    threshold: f64,
    bottom_inset: f64,
    observed: BTreeSet<ElementId>,
    revealed: BTreeSet<ElementId>,
}

impl RevealTracker {
    pub fn new(config: &RevealConfig) -> Self {
        Self {
            threshold: config.threshold,
            bottom_inset: config.bottom_inset_percent / 100.0,
            observed: BTreeSet::new(),
            revealed: BTreeSet::new(),
        }
    }

    pub fn observe(&mut self, id: ElementId) {
        if !self.revealed.contains(&id) {
            self.observed.insert(id);
        }
    }

    /// Feeds an intersection signal. Returns `true` when the element should
    /// be revealed now; it is unobserved afterwards.
    pub fn on_intersection(&mut self, id: ElementId, is_intersecting: bool) -> bool {
        if !is_intersecting || !self.observed.remove(&id) {
            return false;
        }
        self.revealed.insert(id);
        true
    }

    /// Geometry-based variant of [`Self::on_intersection`].
    pub fn on_geometry(&mut self, id: ElementId, rect: ElementRect, viewport_height: f64) -> bool {
        let ratio = visible_ratio(rect, viewport_height, self.bottom_inset);
        self.on_intersection(id, ratio > 0.0 && ratio >= self.threshold)
    }

    pub fn is_revealed(&self, id: ElementId) -> bool {
        self.revealed.contains(&id)
    }

    /// Elements still waiting to be revealed.
    pub fn pending(&self) -> usize {
        self.observed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_ignores_the_bottom_inset() {
        // Viewport 1000 with a 10% inset leaves 900 px; 50 of 100 visible.
        let ratio = visible_ratio(ElementRect::new(850.0, 100.0), 1_000.0, 0.1);
        assert!((ratio - 0.5).abs() < 1e-9);
        assert_eq!(visible_ratio(ElementRect::new(950.0, 100.0), 1_000.0, 0.1), 0.0);
    }

    #[test]
    fn reveals_each_element_once() {
        let mut tracker = RevealTracker::new(&RevealConfig::default());
        let id = ElementId(4);
        tracker.observe(id);

        assert!(!tracker.on_geometry(id, ElementRect::new(895.0, 100.0), 1_000.0));
        assert!(tracker.on_geometry(id, ElementRect::new(880.0, 100.0), 1_000.0));
        assert!(!tracker.on_geometry(id, ElementRect::new(100.0, 100.0), 1_000.0));

        assert!(tracker.is_revealed(id));
        assert_eq!(tracker.pending(), 0);

        tracker.observe(id);
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn unobserved_elements_are_ignored() {
        let mut tracker = RevealTracker::new(&RevealConfig::default());
        assert!(!tracker.on_intersection(ElementId(9), true));
    }
}
