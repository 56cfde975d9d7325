use crate::{
    assets::{FrameSet, FrameSetState, FrameStatus, LoadOutcome, SequenceSource},
    loader::{FrameQueue, LoadStrategy},
    render::{backing_size, draw_cover, effective_pixel_ratio, FrameCanvas, FrameImage},
    MediaKind, MediaSource, Progress,
};

/// Issues frame requests on behalf of an [`ImageSequenceScrubber`].
///
/// Completion is reported back asynchronously through
/// [`ImageSequenceScrubber::on_frame_settled`]; `fetch` itself must not call
/// into the scrubber.
pub trait FrameFetcher {
    type Image: FrameImage;

    /// Starts loading frame `index` (0-based) from `url`. Returns `None` when
    /// the request could not even be issued; the frame then counts as failed.
    fn fetch(&mut self, index: usize, url: &str) -> Option<Self::Image>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    /// No frame has settled yet.
    Loading,
    /// Some frames settled, others are still in flight.
    PartiallyLoaded,
    /// Every frame settled, successfully or not.
    FullyLoaded,
}

/// Maps a scroll position to a 0-based frame index. A single-frame sequence
/// always resolves to frame 0.
pub fn frame_index_for(progress: Progress, count: usize) -> usize {
    if count <= 1 {
        return 0;
    }

    let last = count - 1;
    let raw = (progress.value() * last as f64).floor();
    if raw <= 0.0 {
        0
    } else {
        (raw as usize).min(last)
    }
}

/// Simulates video on a canvas by blitting the frame nearest to the scroll
/// position out of a numbered still sequence.
pub struct ImageSequenceScrubber<C, F>
where
    C: FrameCanvas,
    F: FrameFetcher<Image = C::Image>,
{
    canvas: C,
    fetcher: F,
    source: SequenceSource,
    images: Vec<Option<C::Image>>,
    frames: FrameSet,
    queue: FrameQueue,
    current_frame: Option<usize>,
}

impl<C, F> ImageSequenceScrubber<C, F>
where
    C: FrameCanvas,
    F: FrameFetcher<Image = C::Image>,
{
    /// Fits the canvas and starts requesting frames right away.
    pub fn new(canvas: C, source: SequenceSource, fetcher: F, strategy: LoadStrategy) -> Self {
        let count = source.count();
        let mut scrubber = Self {
            canvas,
            fetcher,
            images: (0..count).map(|_| None).collect(),
            frames: FrameSet::new(count),
            queue: FrameQueue::new(count, strategy),
            source,
            current_frame: None,
        };

        tracing::debug!(
            path = scrubber.source.path(),
            count,
            ?strategy,
            "starting image sequence"
        );
        scrubber.resize();
        scrubber.issue_pending();
        scrubber
    }

    /// Records the outcome of a frame request. The first frame is drawn as
    /// soon as it arrives so the canvas is never blank.
    pub fn on_frame_settled(&mut self, index: usize, outcome: LoadOutcome) -> FrameSetState {
        if self.queue.is_cancelled() {
            return self.frames.state();
        }

        let state = self.settle(index, outcome);
        if outcome == LoadOutcome::Loaded && index == 0 {
            self.update(Progress::START);
        }
        self.issue_pending();
        state
    }

    pub fn update(&mut self, progress: Progress) {
        let index = frame_index_for(progress, self.source.count());
        if self.frames.status(index) != Some(FrameStatus::Loaded) {
            return;
        }
        let Some(image) = self.images[index].as_ref().filter(|image| image.is_drawable()) else {
            return;
        };
        if self.current_frame == Some(index) {
            return;
        }

        self.current_frame = Some(index);
        tracing::trace!(frame = index, "drawing frame");
        draw_cover(&mut self.canvas, image);
    }

    /// Refits the backing store to the element's box and redraws the frame
    /// on screen, if any.
    pub fn resize(&mut self) {
        let css = self.canvas.bounding_size();
        let ratio = effective_pixel_ratio(self.canvas.device_pixel_ratio());
        let (width, height) = backing_size(css, ratio);
        self.canvas.set_backing_size(width, height);
        self.canvas.set_scale(ratio);

        let current = self
            .current_frame
            .and_then(|index| self.images[index].as_ref())
            .filter(|image| image.is_complete());
        if let Some(image) = current {
            draw_cover(&mut self.canvas, image);
        }
    }

    /// Stops issuing requests and ignores results still in flight.
    pub fn cancel(&mut self) {
        self.queue.cancel();
    }

    pub fn state(&self) -> SequenceState {
        let frames = self.frames.state();
        if frames.fully_loaded {
            SequenceState::FullyLoaded
        } else if frames.settled > 0 {
            SequenceState::PartiallyLoaded
        } else {
            SequenceState::Loading
        }
    }

    pub fn frames(&self) -> &FrameSet {
        &self.frames
    }

    pub fn source(&self) -> &SequenceSource {
        &self.source
    }

    /// Frame on screen, if one was drawn.
    pub fn current_frame(&self) -> Option<usize> {
        self.current_frame
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn settle(&mut self, index: usize, outcome: LoadOutcome) -> FrameSetState {
        let before = self.frames.settled();
        let state = self.frames.record_result(index, outcome);
        if state.settled == before {
            return state;
        }

        self.queue.settle();
        if outcome == LoadOutcome::Failed {
            tracing::warn!(url = %self.source.frame_url(index + 1), "frame failed to load");
        }
        if state.fully_loaded {
            tracing::debug!(
                path = self.source.path(),
                loaded = self.frames.loaded(),
                total = state.total,
                "image sequence fully loaded"
            );
        }
        state
    }

    fn issue_pending(&mut self) {
        loop {
            let batch = self.queue.next_batch();
            if batch.is_empty() {
                return;
            }

            let mut refused = Vec::new();
            for index in batch {
                let url = self.source.frame_url(index + 1);
                match self.fetcher.fetch(index, &url) {
                    Some(image) => self.images[index] = Some(image),
                    None => refused.push(index),
                }
            }
            if refused.is_empty() {
                return;
            }
            for index in refused {
                self.settle(index, LoadOutcome::Failed);
            }
        }
    }
}

impl<C, F> MediaSource for ImageSequenceScrubber<C, F>
where
    C: FrameCanvas,
    F: FrameFetcher<Image = C::Image>,
{
    fn kind(&self) -> MediaKind {
        MediaKind::ImageSequence
    }

    fn update(&mut self, progress: Progress) {
        ImageSequenceScrubber::update(self, progress)
    }

    fn resize(&mut self) {
        ImageSequenceScrubber::resize(self)
    }
}

impl<C, F> Drop for ImageSequenceScrubber<C, F>
where
    C: FrameCanvas,
    F: FrameFetcher<Image = C::Image>,
{
    fn drop(&mut self) {
        self.queue.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{CanvasOp, RecordingCanvas, RecordingFetcher};
    use crate::render::{cover_fit, Size};

    type TestScrubber = ImageSequenceScrubber<RecordingCanvas, RecordingFetcher>;

    fn scrubber(count: usize) -> TestScrubber {
        scrubber_with(count, LoadStrategy::Eager)
    }

    fn scrubber_with(count: usize, strategy: LoadStrategy) -> TestScrubber {
        let source = SequenceSource::new("frames", count).unwrap();
        ImageSequenceScrubber::new(
            RecordingCanvas::new(Size::new(320.0, 180.0), 2.0),
            source,
            RecordingFetcher::new(Size::new(1280.0, 720.0)),
            strategy,
        )
    }

    fn load_all(scrubber: &mut TestScrubber) {
        for index in 0..scrubber.source().count() {
            scrubber.on_frame_settled(index, LoadOutcome::Loaded);
        }
    }

    #[test]
    fn resolves_frame_indices() {
        assert_eq!(frame_index_for(Progress::new(0.55), 10), 4);
        assert_eq!(frame_index_for(Progress::END, 10), 9);
        assert_eq!(frame_index_for(Progress::START, 10), 0);
        for step in 0..=10 {
            assert_eq!(frame_index_for(Progress::new(step as f64 / 10.0), 1), 0);
        }
    }

    #[test]
    fn construction_requests_every_frame_and_fits_the_canvas() {
        let scrubber = scrubber(4);
        assert_eq!(
            scrubber.fetcher().requested(),
            [
                "frames/frame_001.webp",
                "frames/frame_002.webp",
                "frames/frame_003.webp",
                "frames/frame_004.webp",
            ]
        );
        assert_eq!(scrubber.canvas().backing(), (640, 360));
        assert_eq!(scrubber.canvas().scale(), 2.0);
        assert_eq!(scrubber.state(), SequenceState::Loading);
    }

    #[test]
    fn first_frame_is_drawn_as_soon_as_it_loads() {
        let mut scrubber = scrubber(5);
        scrubber.on_frame_settled(2, LoadOutcome::Loaded);
        assert!(scrubber.canvas().drawn_frames().is_empty());

        scrubber.on_frame_settled(0, LoadOutcome::Loaded);
        assert_eq!(scrubber.canvas().drawn_frames(), vec![0]);
        assert_eq!(scrubber.state(), SequenceState::PartiallyLoaded);
    }

    #[test]
    fn repeated_progress_draws_once() {
        let mut scrubber = scrubber(10);
        load_all(&mut scrubber);
        let before = scrubber.canvas().draw_count();

        scrubber.update(Progress::new(0.55));
        scrubber.update(Progress::new(0.55));
        assert_eq!(scrubber.canvas().draw_count(), before + 1);
        assert_eq!(scrubber.current_frame(), Some(4));
    }

    #[test]
    fn single_frame_sequence_always_shows_frame_zero() {
        let mut scrubber = scrubber(1);
        load_all(&mut scrubber);
        for step in 0..=10 {
            scrubber.update(Progress::new(step as f64 / 10.0));
        }
        assert_eq!(scrubber.canvas().drawn_frames(), vec![0]);
    }

    #[test]
    fn failed_frame_completes_the_set_but_never_draws() {
        let mut scrubber = scrubber(10);
        for index in 0..10 {
            let outcome = if index == 6 {
                LoadOutcome::Failed
            } else {
                LoadOutcome::Loaded
            };
            scrubber.on_frame_settled(index, outcome);
        }

        assert_eq!(scrubber.frames().settled(), 10);
        assert_eq!(scrubber.state(), SequenceState::FullyLoaded);

        let draws = scrubber.canvas().draw_count();
        for _ in 0..3 {
            scrubber.update(Progress::new(0.7));
        }
        assert_eq!(scrubber.canvas().draw_count(), draws);
        assert_eq!(scrubber.current_frame(), Some(0));
    }

    #[test]
    fn resize_redraws_the_current_frame() {
        let mut scrubber = scrubber(3);
        load_all(&mut scrubber);
        let draws = scrubber.canvas().draw_count();

        scrubber.resize();
        scrubber.resize();
        assert_eq!(scrubber.canvas().draw_count(), draws + 2);
        assert_eq!(scrubber.canvas().backing(), (640, 360));
        assert_eq!(scrubber.canvas().drawn_frames().last(), Some(&0));
    }

    #[test]
    fn resize_follows_a_changed_css_box() {
        let mut scrubber = scrubber(3);
        scrubber.on_frame_settled(0, LoadOutcome::Loaded);

        scrubber.canvas.set_css_size(Size::new(100.0, 100.0));
        scrubber.resize();

        let canvas = scrubber.canvas();
        assert_eq!(canvas.backing(), (200, 200));
        assert_eq!(canvas.scale(), 2.0);
        let expected = cover_fit(Size::new(100.0, 100.0), Size::new(1280.0, 720.0));
        assert_eq!(
            canvas.ops().last(),
            Some(&CanvasOp::Draw {
                frame: 0,
                dest: expected
            })
        );
        assert_eq!(expected.height, 100.0);
        assert!((expected.width - 1280.0 / 7.2).abs() < 1e-9);
        assert!((expected.x + (expected.width - 100.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn decoded_frames_wait_for_their_load_result() {
        let mut scrubber = scrubber(3);
        assert!(scrubber.images[0].as_ref().is_some_and(|image| image.is_drawable()));

        scrubber.update(Progress::START);
        assert_eq!(scrubber.canvas().draw_count(), 0);
        assert_eq!(scrubber.current_frame(), None);
    }

    #[test]
    fn zero_sized_canvas_skips_drawing() {
        let source = SequenceSource::new("frames", 2).unwrap();
        let mut scrubber = ImageSequenceScrubber::new(
            RecordingCanvas::new(Size::new(0.0, 0.0), 1.0),
            source,
            RecordingFetcher::new(Size::new(10.0, 10.0)),
            LoadStrategy::Eager,
        );
        scrubber.on_frame_settled(0, LoadOutcome::Loaded);
        assert_eq!(scrubber.canvas().draw_count(), 0);
        assert_eq!(scrubber.current_frame(), Some(0));
    }

    #[test]
    fn bounded_loading_requests_more_as_frames_settle() {
        let mut scrubber = scrubber_with(5, LoadStrategy::Bounded(2));
        assert_eq!(scrubber.fetcher().requested().len(), 2);

        scrubber.on_frame_settled(0, LoadOutcome::Loaded);
        assert_eq!(scrubber.fetcher().requested().len(), 3);

        scrubber.cancel();
        scrubber.on_frame_settled(1, LoadOutcome::Loaded);
        assert_eq!(scrubber.fetcher().requested().len(), 3);
        assert_eq!(scrubber.frames().settled(), 1);
    }

    #[test]
    fn refused_requests_count_as_failures() {
        let source = SequenceSource::new("frames", 3).unwrap();
        let mut fetcher = RecordingFetcher::new(Size::new(10.0, 10.0));
        fetcher.refuse(1);
        let mut scrubber = ImageSequenceScrubber::new(
            RecordingCanvas::new(Size::new(10.0, 10.0), 1.0),
            source,
            fetcher,
            LoadStrategy::Bounded(1),
        );
        scrubber.on_frame_settled(0, LoadOutcome::Loaded);

        assert_eq!(scrubber.frames().failed(), vec![1]);
        assert_eq!(scrubber.frames().settled(), 2);
        assert_eq!(
            scrubber.fetcher().requested(),
            ["frames/frame_001.webp", "frames/frame_003.webp"]
        );
    }
}
