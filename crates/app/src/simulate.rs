use std::{cell::RefCell, rc::Rc};

use scrollreel_core::{
    activation::approaches_viewport,
    headless::{FakeVideo, RecordingCanvas, RecordingFetcher, ScrollPosition, SimElement},
    Activation, DeviceClass, ElementGeometry, ImageSequenceScrubber, LoadOutcome, MediaKind,
    MediaSource, MotionPreference, PageContext, Result, ScrollReelError, SequenceSource, Size,
    VideoScrubber,
};
use serde::Serialize;

use crate::manifest::{attribute_text, ElementSpec, Manifest};

type HeadlessSequence = ImageSequenceScrubber<RecordingCanvas, RecordingFetcher>;

/// Natural size of every simulated frame.
const FRAME_SIZE: Size = Size {
    width: 1080.0,
    height: 1920.0,
};

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub step: f64,
    /// Scroll events fired per step; they coalesce into one frame.
    pub events_per_step: usize,
    /// 1-based frame numbers that fail to load in every sequence.
    pub fail_frames: Vec<usize>,
    pub reduced_motion: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 800.0,
            step: 50.0,
            events_per_step: 3,
            fail_frames: Vec::new(),
            reduced_motion: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub device_class: DeviceClass,
    pub motion: MotionPreference,
    pub steps: usize,
    pub frames_rendered: u64,
    pub elements: Vec<ElementReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElementReport {
    pub id: u32,
    pub kind: MediaKind,
    pub activation: Activation,
    /// Scroll offset at which the scrubber was built.
    pub activated_at: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seeks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_time: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub drawn_frames: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_frames: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

enum Scrubber {
    Video(Rc<RefCell<VideoScrubber<FakeVideo>>>),
    Sequence(Rc<RefCell<HeadlessSequence>>),
}

struct Slot {
    spec: ElementSpec,
    element: SimElement,
    activation: Activation,
    scrubber: Option<Scrubber>,
    activated_at: Option<f64>,
    error: Option<String>,
}

/// Scrolls a headless page from top to bottom and reports what every
/// scrubber did.
pub fn run(manifest: &Manifest, options: &SimulationOptions) -> Result<SimulationReport> {
    if !(options.step > 0.0) {
        return Err(ScrollReelError::invalid_config("scroll step must be positive"));
    }

    let config = &manifest.config;
    let device_class = DeviceClass::from_viewport_width(
        options.viewport_width,
        config.activation.desktop_min_width,
    );
    let motion = MotionPreference::from_reduce_query(options.reduced_motion);
    let mut page = PageContext::new(config.clone(), device_class, motion);
    let scroll = ScrollPosition::new();
    let viewport = options.viewport_height;

    let mut slots: Vec<Slot> = manifest
        .elements
        .iter()
        .map(|spec| Slot {
            element: SimElement::new(spec.top(), spec.height(), &scroll),
            activation: page.activation_for(spec.kind()),
            spec: spec.clone(),
            scrubber: None,
            activated_at: None,
            error: None,
        })
        .collect();

    for slot in slots.iter_mut().filter(|slot| slot.activation == Activation::Eager) {
        match build(&slot.spec, manifest) {
            Ok(scrubber) => {
                let registered = match &scrubber {
                    Scrubber::Video(video) => {
                        page.register(slot.spec.id(), slot.element.clone(), video.clone())
                    }
                    Scrubber::Sequence(sequence) => {
                        page.register(slot.spec.id(), slot.element.clone(), sequence.clone())
                    }
                };
                match registered {
                    Ok(()) => {
                        if let Scrubber::Sequence(sequence) = &scrubber {
                            deliver_frames(sequence, &options.fail_frames);
                        }
                        slot.scrubber = Some(scrubber);
                        slot.activated_at = Some(0.0);
                    }
                    Err(err) => slot.error = Some(err.to_string()),
                }
            }
            Err(err) => slot.error = Some(err.to_string()),
        }
    }
    page.start(viewport);

    let max_offset = (manifest.document_height - viewport).max(0.0);
    let mut offset = 0.0;
    let mut steps = 0;
    loop {
        scroll.set(offset);
        let waiting = slots.iter_mut().filter(|slot| {
            slot.activation == Activation::OnApproach && slot.activated_at.is_none()
        });
        for slot in waiting {
            activate_on_approach(&mut page, slot, manifest, options, offset);
        }

        for _ in 0..options.events_per_step {
            page.on_scroll();
        }
        page.on_animation_frame(viewport);
        steps += 1;

        if offset >= max_offset {
            break;
        }
        offset = (offset + options.step).min(max_offset);
    }

    tracing::info!(steps, frames = page.driver().frames_rendered(), "simulation finished");
    Ok(SimulationReport {
        device_class,
        motion,
        steps,
        frames_rendered: page.driver().frames_rendered(),
        elements: slots.iter().map(report).collect(),
    })
}

fn activate_on_approach(
    page: &mut PageContext,
    slot: &mut Slot,
    manifest: &Manifest,
    options: &SimulationOptions,
    offset: f64,
) {
    let near = approaches_viewport(
        slot.element.bounding_rect(),
        options.viewport_height,
        page.activator().margin_px(),
    );
    let spec = &slot.spec;
    let built = &mut slot.scrubber;
    let activated = page.activate_lazy(spec.id(), near, slot.element.clone(), || {
        match build(spec, manifest)? {
            Scrubber::Video(video) => {
                *built = Some(Scrubber::Video(video.clone()));
                Ok(Box::new(video) as Box<dyn MediaSource>)
            }
            Scrubber::Sequence(sequence) => {
                *built = Some(Scrubber::Sequence(sequence.clone()));
                Ok(Box::new(sequence) as Box<dyn MediaSource>)
            }
        }
    });

    match activated {
        Ok(true) => {
            tracing::debug!(element = %spec.id(), offset, "activated on approach");
            slot.activated_at = Some(offset);
            if let Some(Scrubber::Sequence(sequence)) = &slot.scrubber {
                deliver_frames(sequence, &options.fail_frames);
            }
        }
        Ok(false) => {}
        Err(err) => {
            tracing::warn!(element = %spec.id(), error = %err, "activation failed");
            slot.activated_at = Some(offset);
            slot.error = Some(err.to_string());
        }
    }
}

fn build(spec: &ElementSpec, manifest: &Manifest) -> Result<Scrubber> {
    let scrub = &manifest.config.scrub;
    match spec {
        ElementSpec::Video { src, duration, .. } => {
            let mut video = FakeVideo::ready(*duration);
            video.src = src.clone();
            let scrubber = VideoScrubber::with_hysteresis(video, scrub.seek_hysteresis_seconds);
            Ok(Scrubber::Video(Rc::new(RefCell::new(scrubber))))
        }
        ElementSpec::ImageSequence {
            height,
            width,
            frames_path,
            frames_count,
            ..
        } => {
            let count = attribute_text(frames_count);
            let source = SequenceSource::from_attributes(Some(frames_path), Some(&count), scrub)?;
            let scrubber = ImageSequenceScrubber::new(
                RecordingCanvas::new(Size::new(*width, *height), 1.0),
                source,
                RecordingFetcher::new(FRAME_SIZE),
                scrub.load_strategy,
            );
            Ok(Scrubber::Sequence(Rc::new(RefCell::new(scrubber))))
        }
    }
}

/// Settles every frame in request order, failing the listed frame numbers.
fn deliver_frames(sequence: &Rc<RefCell<HeadlessSequence>>, fail_frames: &[usize]) {
    let count = sequence.borrow().source().count();
    for index in 0..count {
        let outcome = if fail_frames.contains(&(index + 1)) {
            LoadOutcome::Failed
        } else {
            LoadOutcome::Loaded
        };
        sequence.borrow_mut().on_frame_settled(index, outcome);
    }
}

fn report(slot: &Slot) -> ElementReport {
    let mut report = ElementReport {
        id: slot.spec.id().0,
        kind: slot.spec.kind(),
        activation: slot.activation,
        activated_at: slot.activated_at,
        seeks: None,
        final_time: None,
        drawn_frames: Vec::new(),
        failed_frames: Vec::new(),
        error: slot.error.clone(),
    };

    match &slot.scrubber {
        Some(Scrubber::Video(video)) => {
            let video = video.borrow();
            report.seeks = Some(video.video().seeks);
            report.final_time = Some(video.video().current_time);
        }
        Some(Scrubber::Sequence(sequence)) => {
            let sequence = sequence.borrow();
            report.drawn_frames = sequence.canvas().drawn_frames();
            report.failed_frames = sequence.frames().failed();
        }
        None => {}
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        Manifest::from_json_str(
            r#"{
                "document_height": 4000,
                "elements": [
                    { "kind": "video", "id": 1, "top": 1000, "height": 600, "duration": 8.0 },
                    { "kind": "image_sequence", "id": 2, "top": 2000, "height": 600,
                      "frames_path": "frames/intro", "frames_count": 12 },
                    { "kind": "image_sequence", "id": 3, "top": 3000, "height": 600,
                      "frames_path": "frames/outro", "frames_count": "0" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn desktop_scrubs_video_only() {
        let report = run(&manifest(), &SimulationOptions::default()).unwrap();

        assert_eq!(report.device_class, DeviceClass::Generous);
        let video = &report.elements[0];
        assert_eq!(video.activated_at, Some(0.0));
        assert!(video.seeks.unwrap() > 0);
        assert_eq!(video.final_time, Some(8.0));
        assert!(report.elements[1].activated_at.is_none());
        assert_eq!(report.frames_rendered as usize, report.steps);
    }

    #[test]
    fn phone_activates_sequences_lazily_and_reports_bad_counts() {
        let options = SimulationOptions {
            viewport_width: 390.0,
            fail_frames: vec![5],
            ..SimulationOptions::default()
        };
        let report = run(&manifest(), &options).unwrap();

        assert_eq!(report.device_class, DeviceClass::Constrained);
        assert!(report.elements[0].activated_at.is_none());

        let intro = &report.elements[1];
        // Top at 2000 comes within 200 px of an 800 px viewport at 1000.
        assert_eq!(intro.activated_at, Some(1_000.0));
        assert_eq!(intro.failed_frames, vec![4]);
        assert!(!intro.drawn_frames.contains(&4));
        assert_eq!(intro.drawn_frames.first(), Some(&0));

        let outro = &report.elements[2];
        assert!(outro.error.as_deref().unwrap().contains("positive"));
    }

    #[test]
    fn reduced_motion_leaves_everything_idle() {
        let options = SimulationOptions {
            reduced_motion: true,
            ..SimulationOptions::default()
        };
        let report = run(&manifest(), &options).unwrap();

        assert_eq!(report.frames_rendered, 0);
        assert!(report
            .elements
            .iter()
            .all(|element| element.activation == Activation::Disabled
                && element.activated_at.is_none()));
    }

    #[test]
    fn rejects_non_positive_steps() {
        let options = SimulationOptions {
            step: 0.0,
            ..SimulationOptions::default()
        };
        assert!(run(&manifest(), &options).is_err());
    }
}
