use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{mapping::scroll_progress, ElementRect, MediaSource, Result, ScrollReelError};

/// Stable identity of a page element bound to a scrubber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything that can report where it currently sits in the viewport.
pub trait ElementGeometry {
    fn bounding_rect(&self) -> ElementRect;
}

/// Coalesces bursts of scroll and resize events into one recompute per
/// rendered frame.
#[derive(Debug, Default, Clone)]
pub struct FrameGate {
    pending: bool,
}

impl FrameGate {
    /// Returns `true` when the caller must schedule an animation frame; a
    /// frame is already scheduled otherwise.
    pub fn request(&mut self) -> bool {
        !std::mem::replace(&mut self.pending, true)
    }

    /// Consumes the pending request. Returns whether one existed.
    pub fn begin_frame(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

struct RegisteredScrubber {
    id: ElementId,
    element: Box<dyn ElementGeometry>,
    source: Box<dyn MediaSource>,
}

/// Pushes scroll progress into every registered media source.
#[derive(Default)]
pub struct ScrollDriver {
    entries: Vec<RegisteredScrubber>,
    gate: FrameGate,
    frames: u64,
}

impl ScrollDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs `source` with the element used to sample its geometry.
    pub fn register<E, S>(&mut self, id: ElementId, element: E, source: S) -> Result<()>
    where
        E: ElementGeometry + 'static,
        S: MediaSource + 'static,
    {
        if self.is_registered(id) {
            return Err(ScrollReelError::DuplicateRegistration(id));
        }

        tracing::debug!(element = %id, kind = ?source.kind(), "registered scrubber");
        self.entries.push(RegisteredScrubber {
            id,
            element: Box::new(element),
            source: Box::new(source),
        });
        Ok(())
    }

    pub fn is_registered(&self, id: ElementId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Call on every scroll or resize event. See [`FrameGate::request`].
    pub fn request_frame(&mut self) -> bool {
        self.gate.request()
    }

    /// Runs the coalesced recompute if one was requested since the last
    /// frame. Returns the number of sources updated.
    pub fn on_animation_frame(&mut self, viewport_height: f64) -> usize {
        if !self.gate.begin_frame() {
            return 0;
        }
        self.frames += 1;
        self.recompute(viewport_height)
    }

    /// Recomputes every source immediately, bypassing the frame gate.
    pub fn recompute(&mut self, viewport_height: f64) -> usize {
        let mut updated = 0;
        for entry in &mut self.entries {
            let rect = entry.element.bounding_rect();
            if let Some(progress) = scroll_progress(rect, viewport_height) {
                entry.source.update(progress);
                updated += 1;
            }
        }
        updated
    }

    pub fn resize_all(&mut self) {
        for entry in &mut self.entries {
            entry.source.resize();
        }
    }

    /// Animation frames that actually ran a recompute.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl fmt::Debug for ScrollDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<ElementId> = self.entries.iter().map(|entry| entry.id).collect();
        f.debug_struct("ScrollDriver")
            .field("entries", &ids)
            .field("gate", &self.gate)
            .field("frames", &self.frames)
            .finish()
    }
}
