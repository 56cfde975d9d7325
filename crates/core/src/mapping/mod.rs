use serde::{Deserialize, Serialize};

/// Vertical slice of an element's bounding box, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementRect {
    pub top: f64,
    pub height: f64,
}

impl ElementRect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Normalised scroll position of an element, always within `[0, 1]`.
///
/// `0.0` means the element's top edge sits on the bottom of the viewport,
/// `1.0` means its bottom edge has just left through the top.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Progress(f64);

impl Progress {
    pub const START: Progress = Progress(0.0);
    pub const END: Progress = Progress(1.0);

    /// Clamps `value` into `[0, 1]`. NaN collapses to the start.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::START;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Progress {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

/// Maps an element's geometry to its scroll progress.
///
/// Returns `None` when the element is entirely off screen: its bottom above
/// the viewport or its top below it. An element touching either edge still
/// yields a value.
pub fn scroll_progress(rect: ElementRect, viewport_height: f64) -> Option<Progress> {
    if rect.bottom() < 0.0 || rect.top > viewport_height {
        return None;
    }

    let total_travel = viewport_height + rect.height;
    if total_travel <= 0.0 {
        return Some(Progress::START);
    }
    let distance_covered = viewport_height - rect.top;
    Some(Progress::new(distance_covered / total_travel))
}
