//! Scroll-drivable media sources.

use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::Progress;

mod sequence;
mod video;

pub use sequence::{frame_index_for, FrameFetcher, ImageSequenceScrubber, SequenceState};
pub use video::{VideoElement, VideoScrubber, VideoState};

/// The two kinds of scrubbable media on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    ImageSequence,
}

/// Something that can be moved to a scroll position and redrawn.
///
/// The scroll driver only ever talks to this trait.
pub trait MediaSource {
    fn kind(&self) -> MediaKind;

    /// Moves the media to `progress`. Never fails; a source that is not ready
    /// keeps showing what it last showed.
    fn update(&mut self, progress: Progress);

    /// Re-fits the source to its element after a layout change.
    fn resize(&mut self) {}
}

impl<T: MediaSource + ?Sized> MediaSource for Box<T> {
    fn kind(&self) -> MediaKind {
        (**self).kind()
    }

    fn update(&mut self, progress: Progress) {
        (**self).update(progress)
    }

    fn resize(&mut self) {
        (**self).resize()
    }
}

/// Shared sources stay reachable from load callbacks while registered with
/// the driver.
impl<T: MediaSource + ?Sized> MediaSource for Rc<RefCell<T>> {
    fn kind(&self) -> MediaKind {
        self.borrow().kind()
    }

    fn update(&mut self, progress: Progress) {
        self.borrow_mut().update(progress)
    }

    fn resize(&mut self) {
        self.borrow_mut().resize()
    }
}
