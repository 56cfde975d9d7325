use crate::{MediaKind, MediaSource, Progress};

/// Playback surface a [`VideoScrubber`] seeks.
pub trait VideoElement {
    /// Whether duration and dimensions are known (`HAVE_METADATA` or later).
    fn has_metadata(&self) -> bool;

    /// Media duration in seconds. May be NaN or infinite.
    fn duration(&self) -> f64;

    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    /// Asks the element to start fetching so metadata eventually arrives.
    fn load(&mut self);

    fn source(&self) -> String {
        String::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoState {
    /// Waiting for the element's `loadedmetadata` signal.
    MetadataPending,
    Ready { duration: f64 },
}

/// Seeks a video to the time matching the scroll position. Never plays it.
#[derive(Debug)]
pub struct VideoScrubber<V> {
    video: V,
    state: VideoState,
    hysteresis: f64,
}

impl<V: VideoElement> VideoScrubber<V> {
    /// Smallest seek, in seconds, worth issuing.
    pub const DEFAULT_HYSTERESIS: f64 = 0.05;

    pub fn new(video: V) -> Self {
        Self::with_hysteresis(video, Self::DEFAULT_HYSTERESIS)
    }

    pub fn with_hysteresis(video: V, hysteresis: f64) -> Self {
        let mut scrubber = Self {
            video,
            state: VideoState::MetadataPending,
            hysteresis,
        };

        if scrubber.video.has_metadata() {
            scrubber.on_metadata_loaded();
        } else {
            scrubber.video.load();
        }
        scrubber
    }

    /// Call when the element reports metadata. Moves to the start position.
    pub fn on_metadata_loaded(&mut self) {
        let duration = self.video.duration();
        tracing::info!(src = %self.video.source(), duration, "video metadata loaded");
        self.state = VideoState::Ready { duration };
        self.update(Progress::START);
    }

    pub fn update(&mut self, progress: Progress) {
        let VideoState::Ready { duration } = self.state else {
            return;
        };
        // Unknown, streaming or zero-length media stays where it is.
        if !duration.is_finite() || duration <= 0.0 {
            return;
        }

        let target = duration * progress.value();
        if (self.video.current_time() - target).abs() > self.hysteresis {
            self.video.set_current_time(target);
        }
    }

    pub fn state(&self) -> VideoState {
        self.state
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut V {
        &mut self.video
    }
}

impl<V: VideoElement> MediaSource for VideoScrubber<V> {
    fn kind(&self) -> MediaKind {
        MediaKind::Video
    }

    fn update(&mut self, progress: Progress) {
        VideoScrubber::update(self, progress)
    }
}
