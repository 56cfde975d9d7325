use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{config::ActivationConfig, ElementId, ElementRect, MediaKind};

/// The user's reduced-motion preference, sampled once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPreference {
    #[default]
    NoPreference,
    Reduce,
}

impl MotionPreference {
    /// From the result of the `(prefers-reduced-motion: reduce)` query.
    pub fn from_reduce_query(matches: bool) -> Self {
        if matches {
            Self::Reduce
        } else {
            Self::NoPreference
        }
    }

    pub fn allows_motion(self) -> bool {
        self == Self::NoPreference
    }
}

/// Coarse capability class of the device, derived from viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    /// Desktop-class viewport; heavy media may load up front.
    Generous,
    /// Narrow viewport; defer loading until needed.
    Constrained,
}

impl DeviceClass {
    pub fn from_viewport_width(width: f64, breakpoint: f64) -> Self {
        Self::from_min_width_match(width >= breakpoint)
    }

    /// From the result of a `(min-width: <breakpoint>px)` media query.
    pub fn from_min_width_match(matches: bool) -> Self {
        if matches {
            Self::Generous
        } else {
            Self::Constrained
        }
    }
}

/// When a media source gets constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// At page-ready time.
    Eager,
    /// Once the element comes within the proximity margin of the viewport.
    OnApproach,
    /// Never; the page shows the other variant on this device class.
    Disabled,
}

/// Activation per media kind for one device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationPolicy {
    pub video: Activation,
    pub image_sequence: Activation,
}

impl ActivationPolicy {
    pub fn generous_default() -> Self {
        Self {
            video: Activation::Eager,
            image_sequence: Activation::Disabled,
        }
    }

    pub fn constrained_default() -> Self {
        Self {
            video: Activation::Disabled,
            image_sequence: Activation::OnApproach,
        }
    }

    pub fn for_kind(&self, kind: MediaKind) -> Activation {
        match kind {
            MediaKind::Video => self.video,
            MediaKind::ImageSequence => self.image_sequence,
        }
    }
}

/// Whether `rect` lies within `margin` pixels of the viewport. Edge contact
/// counts.
pub fn approaches_viewport(rect: ElementRect, viewport_height: f64, margin: f64) -> bool {
    rect.bottom() >= -margin && rect.top <= viewport_height + margin
}

/// Decides when each media element gets its scrubber, and guarantees lazy
/// elements are constructed at most once.
#[derive(Debug, Clone)]
pub struct LazyActivator {
    device_class: DeviceClass,
    policy: ActivationPolicy,
    margin: f64,
    initialized: BTreeSet<ElementId>,
}

impl LazyActivator {
    pub fn new(device_class: DeviceClass, config: &ActivationConfig) -> Self {
        let policy = match device_class {
            DeviceClass::Generous => config.generous,
            DeviceClass::Constrained => config.constrained,
        };
        Self {
            device_class,
            policy,
            margin: config.proximity_margin_px,
            initialized: BTreeSet::new(),
        }
    }

    pub fn device_class(&self) -> DeviceClass {
        self.device_class
    }

    pub fn activation_for(&self, kind: MediaKind) -> Activation {
        self.policy.for_kind(kind)
    }

    pub fn margin_px(&self) -> f64 {
        self.margin
    }

    /// Root margin string for an intersection observer.
    pub fn root_margin(&self) -> String {
        format!("{}px", self.margin)
    }

    /// Feeds an intersection signal. Returns `true` exactly once per element:
    /// the first time it is reported as intersecting.
    pub fn on_intersection(&mut self, id: ElementId, is_intersecting: bool) -> bool {
        if !is_intersecting {
            return false;
        }
        self.initialized.insert(id)
    }

    /// Geometry-based variant of [`Self::on_intersection`] for hosts without
    /// an intersection observer.
    pub fn on_geometry(&mut self, id: ElementId, rect: ElementRect, viewport_height: f64) -> bool {
        let near = approaches_viewport(rect, viewport_height, self.margin);
        self.on_intersection(id, near)
    }

    pub fn is_initialized(&self, id: ElementId) -> bool {
        self.initialized.contains(&id)
    }
}
