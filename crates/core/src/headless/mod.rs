//! In-memory implementations of the host traits. Used by the command line
//! simulation and by tests.

use std::{cell::Cell, rc::Rc};

use crate::{
    media::{FrameFetcher, VideoElement},
    render::{FrameCanvas, FrameImage, Rect, Size},
    ElementGeometry, ElementRect,
};

/// A frame that is always decoded at a fixed size.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticImage {
    pub index: usize,
    pub size: Size,
}

impl FrameImage for StaticImage {
    fn is_complete(&self) -> bool {
        true
    }

    fn natural_size(&self) -> Size {
        self.size
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    Clear(Rect),
    Draw { frame: usize, dest: Rect },
}

/// Canvas that records every command it receives.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    css_size: Size,
    device_pixel_ratio: f64,
    backing: (u32, u32),
    scale: f64,
    ops: Vec<CanvasOp>,
}

impl RecordingCanvas {
    pub fn new(css_size: Size, device_pixel_ratio: f64) -> Self {
        Self {
            css_size,
            device_pixel_ratio,
            backing: (0, 0),
            scale: 1.0,
            ops: Vec::new(),
        }
    }

    pub fn set_css_size(&mut self, size: Size) {
        self.css_size = size;
    }

    pub fn backing(&self) -> (u32, u32) {
        self.backing
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    /// Frame indices in the order they were drawn.
    pub fn drawn_frames(&self) -> Vec<usize> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                CanvasOp::Draw { frame, .. } => Some(*frame),
                CanvasOp::Clear(_) => None,
            })
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.drawn_frames().len()
    }
}

impl FrameCanvas for RecordingCanvas {
    type Image = StaticImage;

    fn bounding_size(&self) -> Size {
        self.css_size
    }

    fn client_size(&self) -> Size {
        self.css_size
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.backing = (width, height);
        self.scale = 1.0;
    }

    fn set_scale(&mut self, factor: f64) {
        self.scale = factor;
    }

    fn clear(&mut self, area: Rect) {
        self.ops.push(CanvasOp::Clear(area));
    }

    fn draw_image(&mut self, image: &StaticImage, dest: Rect) {
        self.ops.push(CanvasOp::Draw {
            frame: image.index,
            dest,
        });
    }
}

/// Fetcher that hands out [`StaticImage`]s and remembers what was asked for.
/// Results are delivered by the caller through `on_frame_settled`.
#[derive(Debug, Clone)]
pub struct RecordingFetcher {
    image_size: Size,
    requested: Vec<String>,
    refused: Vec<usize>,
}

impl RecordingFetcher {
    pub fn new(image_size: Size) -> Self {
        Self {
            image_size,
            requested: Vec::new(),
            refused: Vec::new(),
        }
    }

    /// Makes the request for frame `index` fail to issue.
    pub fn refuse(&mut self, index: usize) {
        self.refused.push(index);
    }

    pub fn requested(&self) -> &[String] {
        &self.requested
    }
}

impl FrameFetcher for RecordingFetcher {
    type Image = StaticImage;

    fn fetch(&mut self, index: usize, url: &str) -> Option<StaticImage> {
        if self.refused.contains(&index) {
            return None;
        }
        self.requested.push(url.to_string());
        Some(StaticImage {
            index,
            size: self.image_size,
        })
    }
}

/// Video element stand-in with counters for loads and seeks.
#[derive(Debug, Clone, Default)]
pub struct FakeVideo {
    pub src: String,
    pub duration: f64,
    pub current_time: f64,
    pub metadata_ready: bool,
    pub loads: usize,
    pub seeks: usize,
}

impl FakeVideo {
    /// A video whose metadata is already available.
    pub fn ready(duration: f64) -> Self {
        Self {
            duration,
            metadata_ready: true,
            ..Self::default()
        }
    }

    /// A video still waiting for metadata.
    pub fn pending(duration: f64) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }
}

impl VideoElement for FakeVideo {
    fn has_metadata(&self) -> bool {
        self.metadata_ready
    }

    fn duration(&self) -> f64 {
        if self.metadata_ready {
            self.duration
        } else {
            f64::NAN
        }
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.current_time = seconds;
        self.seeks += 1;
    }

    fn load(&mut self) {
        self.loads += 1;
    }

    fn source(&self) -> String {
        self.src.clone()
    }
}

/// Document scroll offset shared by every [`SimElement`] on a page.
#[derive(Debug, Clone, Default)]
pub struct ScrollPosition(Rc<Cell<f64>>);

impl ScrollPosition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, offset: f64) {
        self.0.set(offset);
    }

    pub fn get(&self) -> f64 {
        self.0.get()
    }
}

/// Element laid out at a fixed document offset.
#[derive(Debug, Clone)]
pub struct SimElement {
    pub document_top: f64,
    pub height: f64,
    scroll: ScrollPosition,
}

impl SimElement {
    pub fn new(document_top: f64, height: f64, scroll: &ScrollPosition) -> Self {
        Self {
            document_top,
            height,
            scroll: scroll.clone(),
        }
    }
}

impl ElementGeometry for SimElement {
    fn bounding_rect(&self) -> ElementRect {
        ElementRect::new(self.document_top - self.scroll.get(), self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elements_follow_the_shared_scroll_offset() {
        let scroll = ScrollPosition::new();
        let element = SimElement::new(1_200.0, 300.0, &scroll);
        assert_eq!(element.bounding_rect(), ElementRect::new(1_200.0, 300.0));

        scroll.set(500.0);
        assert_eq!(element.bounding_rect(), ElementRect::new(700.0, 300.0));
    }
}
