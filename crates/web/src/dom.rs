use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use gloo::events::EventListener;
use scrollreel_core::{
    ElementGeometry, ElementRect, FrameCanvas, FrameFetcher, FrameImage, ImageSequenceScrubber,
    LoadOutcome, Rect, Result, ScrollReelError, ScrubConfig, SequenceSource, Size, VideoElement,
};
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Element, HtmlCanvasElement, HtmlImageElement, HtmlVideoElement,
};

use crate::markup::{FRAMES_COUNT_ATTR, FRAMES_PATH_ATTR};

/// `HTMLMediaElement.HAVE_METADATA`.
const HAVE_METADATA: u16 = 1;

pub type WebSequence = ImageSequenceScrubber<WebCanvas, WebFetcher>;

/// Geometry of a live DOM element, read on every recompute.
pub struct DomElement(pub Element);

impl ElementGeometry for DomElement {
    fn bounding_rect(&self) -> ElementRect {
        let rect = self.0.get_bounding_client_rect();
        ElementRect::new(rect.top(), rect.height())
    }
}

pub struct WebImage(HtmlImageElement);

impl FrameImage for WebImage {
    fn is_complete(&self) -> bool {
        self.0.complete()
    }

    fn natural_size(&self) -> Size {
        Size::new(self.0.natural_width() as f64, self.0.natural_height() as f64)
    }
}

pub struct WebCanvas {
    element: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl WebCanvas {
    pub fn new(element: HtmlCanvasElement) -> Result<Self> {
        let context = element
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|context| context.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or_else(|| ScrollReelError::msg("canvas has no 2d context"))?;
        Ok(Self { element, context })
    }
}

impl FrameCanvas for WebCanvas {
    type Image = WebImage;

    fn bounding_size(&self) -> Size {
        let rect = self.element.get_bounding_client_rect();
        Size::new(rect.width(), rect.height())
    }

    fn client_size(&self) -> Size {
        Size::new(
            self.element.client_width() as f64,
            self.element.client_height() as f64,
        )
    }

    fn device_pixel_ratio(&self) -> f64 {
        web_sys::window().map_or(1.0, |window| window.device_pixel_ratio())
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.element.set_width(width);
        self.element.set_height(height);
    }

    fn set_scale(&mut self, factor: f64) {
        if let Err(err) = self.context.set_transform(factor, 0.0, 0.0, factor, 0.0, 0.0) {
            tracing::warn!(?err, "canvas transform rejected");
        }
    }

    fn clear(&mut self, area: Rect) {
        self.context.clear_rect(area.x, area.y, area.width, area.height);
    }

    fn draw_image(&mut self, image: &WebImage, dest: Rect) {
        let drawn = self.context.draw_image_with_html_image_element_and_dw_and_dh(
            &image.0,
            dest.x,
            dest.y,
            dest.width,
            dest.height,
        );
        if let Err(err) = drawn {
            tracing::warn!(?err, src = %image.0.src(), "frame draw failed");
        }
    }
}

/// Starts image downloads and reports each one back to the scrubber that
/// owns this fetcher.
pub struct WebFetcher {
    owner: Weak<RefCell<WebSequence>>,
    listeners: Vec<EventListener>,
}

impl WebFetcher {
    fn new(owner: Weak<RefCell<WebSequence>>) -> Self {
        Self {
            owner,
            listeners: Vec::new(),
        }
    }
}

impl FrameFetcher for WebFetcher {
    type Image = WebImage;

    fn fetch(&mut self, index: usize, url: &str) -> Option<WebImage> {
        let image = HtmlImageElement::new().ok()?;

        for (event, outcome) in [("load", LoadOutcome::Loaded), ("error", LoadOutcome::Failed)] {
            let owner = self.owner.clone();
            self.listeners.push(EventListener::once(&image, event, move |_| {
                if let Some(sequence) = owner.upgrade() {
                    sequence.borrow_mut().on_frame_settled(index, outcome);
                }
            }));
        }

        image.set_src(url);
        Some(WebImage(image))
    }
}

/// Builds a sequence scrubber from a canvas carrying the frame attributes.
pub fn sequence_from_canvas(
    canvas: HtmlCanvasElement,
    scrub: &ScrubConfig,
) -> Result<Rc<RefCell<WebSequence>>> {
    let source = SequenceSource::from_attributes(
        canvas.get_attribute(FRAMES_PATH_ATTR).as_deref(),
        canvas.get_attribute(FRAMES_COUNT_ATTR).as_deref(),
        scrub,
    )?;
    let canvas = WebCanvas::new(canvas)?;
    let strategy = scrub.load_strategy;

    Ok(Rc::new_cyclic(|owner| {
        RefCell::new(ImageSequenceScrubber::new(
            canvas,
            source,
            WebFetcher::new(owner.clone()),
            strategy,
        ))
    }))
}

pub struct WebVideo(pub HtmlVideoElement);

impl VideoElement for WebVideo {
    fn has_metadata(&self) -> bool {
        self.0.ready_state() >= HAVE_METADATA
    }

    fn duration(&self) -> f64 {
        self.0.duration()
    }

    fn current_time(&self) -> f64 {
        self.0.current_time()
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.0.set_current_time(seconds);
    }

    fn load(&mut self) {
        self.0.load();
    }

    fn source(&self) -> String {
        self.0.current_src()
    }
}
