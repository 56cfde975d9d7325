use crate::{
    activation::{Activation, DeviceClass, LazyActivator, MotionPreference},
    config::AppConfig,
    reveal::RevealTracker,
    ElementGeometry, ElementId, MediaKind, MediaSource, Progress, Result, ScrollDriver,
};

/// Everything the page's scroll effects share, built once at startup and
/// handed to whichever host drives it.
#[derive(Debug)]
pub struct PageContext {
    config: AppConfig,
    motion: MotionPreference,
    activator: LazyActivator,
    driver: ScrollDriver,
    reveal: RevealTracker,
}

impl PageContext {
    pub fn new(config: AppConfig, device_class: DeviceClass, motion: MotionPreference) -> Self {
        if !motion.allows_motion() {
            tracing::info!("reduced motion requested; scroll effects disabled");
        }
        Self {
            activator: LazyActivator::new(device_class, &config.activation),
            reveal: RevealTracker::new(&config.reveal),
            driver: ScrollDriver::new(),
            motion,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn motion_allowed(&self) -> bool {
        self.motion.allows_motion()
    }

    pub fn device_class(&self) -> DeviceClass {
        self.activator.device_class()
    }

    /// Activation for `kind` on this page. Always disabled under reduced
    /// motion.
    pub fn activation_for(&self, kind: MediaKind) -> Activation {
        if !self.motion_allowed() {
            return Activation::Disabled;
        }
        self.activator.activation_for(kind)
    }

    /// Registers an eagerly constructed source.
    pub fn register<E, S>(&mut self, id: ElementId, element: E, source: S) -> Result<()>
    where
        E: ElementGeometry + 'static,
        S: MediaSource + 'static,
    {
        if !self.motion_allowed() {
            return Ok(());
        }
        self.driver.register(id, element, source)
    }

    /// Initial recompute so the first paint is correct before any scroll.
    pub fn start(&mut self, viewport_height: f64) -> usize {
        if !self.motion_allowed() {
            return 0;
        }
        self.driver.recompute(viewport_height)
    }

    /// Feeds an intersection signal for a lazily activated element. On the
    /// first intersection `build` runs, the new source is moved to the start
    /// and registered. Returns whether a source was activated.
    ///
    /// The element is marked as initialised before `build` runs, so a source
    /// that fails to build is never retried.
    pub fn activate_lazy<E, S, B>(
        &mut self,
        id: ElementId,
        is_intersecting: bool,
        element: E,
        build: B,
    ) -> Result<bool>
    where
        E: ElementGeometry + 'static,
        S: MediaSource + 'static,
        B: FnOnce() -> Result<S>,
    {
        if !self.motion_allowed() || !self.activator.on_intersection(id, is_intersecting) {
            return Ok(false);
        }

        let mut source = build()?;
        tracing::debug!(element = %id, kind = ?source.kind(), "lazy activation");
        source.update(Progress::START);
        self.driver.register(id, element, source)?;
        Ok(true)
    }

    /// Call on every scroll event. Returns `true` when the host must request
    /// an animation frame.
    pub fn on_scroll(&mut self) -> bool {
        self.motion_allowed() && self.driver.request_frame()
    }

    /// Call on every resize event. Refits sources immediately and schedules a
    /// progress recompute like a scroll would.
    pub fn on_resize(&mut self) -> bool {
        if !self.motion_allowed() {
            return false;
        }
        self.driver.resize_all();
        self.driver.request_frame()
    }

    pub fn on_animation_frame(&mut self, viewport_height: f64) -> usize {
        self.driver.on_animation_frame(viewport_height)
    }

    pub fn activator(&self) -> &LazyActivator {
        &self.activator
    }

    pub fn driver(&self) -> &ScrollDriver {
        &self.driver
    }

    pub fn reveal(&self) -> &RevealTracker {
        &self.reveal
    }

    pub fn reveal_mut(&mut self) -> &mut RevealTracker {
        &mut self.reveal
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{
        headless::{FakeVideo, ScrollPosition, SimElement},
        ScrollReelError, VideoScrubber,
    };

    fn page(class: DeviceClass, motion: MotionPreference) -> PageContext {
        PageContext::new(AppConfig::default(), class, motion)
    }

    #[test]
    fn reduced_motion_disables_everything() {
        let mut page = page(DeviceClass::Generous, MotionPreference::Reduce);
        let scroll = ScrollPosition::new();

        assert_eq!(page.activation_for(MediaKind::Video), Activation::Disabled);
        page.register(
            ElementId(1),
            SimElement::new(0.0, 400.0, &scroll),
            VideoScrubber::new(FakeVideo::ready(4.0)),
        )
        .unwrap();
        assert!(page.driver().is_empty());
        assert!(!page.on_scroll());
        assert!(!page.on_resize());
    }

    #[test]
    fn eager_video_follows_the_scroll() {
        let mut page = page(DeviceClass::Generous, MotionPreference::NoPreference);
        let scroll = ScrollPosition::new();
        let video = Rc::new(RefCell::new(VideoScrubber::new(FakeVideo::ready(10.0))));
        page.register(ElementId(1), SimElement::new(600.0, 400.0, &scroll), video.clone())
            .unwrap();

        // Element top at 600 in an 800 px viewport: 200 / 1200 of the way.
        assert_eq!(page.start(800.0), 1);
        let time = video.borrow().video().current_time;
        assert!((time - 10.0 / 6.0).abs() < 1e-9);

        scroll.set(1_000.0);
        assert!(page.on_scroll());
        assert!(!page.on_scroll());
        assert_eq!(page.on_animation_frame(800.0), 1);
        let time = video.borrow().video().current_time;
        assert!((time - 10.0 * 1_200.0 / 1_200.0).abs() < 1e-9);
    }

    #[test]
    fn lazy_sources_build_once_and_start_at_zero() {
        let mut page = page(DeviceClass::Constrained, MotionPreference::NoPreference);
        let scroll = ScrollPosition::new();
        let builds = Rc::new(RefCell::new(0));

        for _ in 0..3 {
            let builds = builds.clone();
            page.activate_lazy(ElementId(5), true, SimElement::new(0.0, 10.0, &scroll), || {
                *builds.borrow_mut() += 1;
                let mut video = FakeVideo::ready(2.0);
                video.current_time = 1.0;
                Ok(VideoScrubber::new(video))
            })
            .unwrap();
        }

        assert_eq!(*builds.borrow(), 1);
        assert_eq!(page.driver().len(), 1);
    }

    #[derive(Default)]
    struct Updates(Rc<RefCell<Vec<f64>>>);

    impl MediaSource for Updates {
        fn kind(&self) -> MediaKind {
            MediaKind::ImageSequence
        }

        fn update(&mut self, progress: Progress) {
            self.0.borrow_mut().push(progress.value());
        }
    }

    #[test]
    fn lazy_activation_moves_the_new_source_to_the_start() {
        let mut page = page(DeviceClass::Constrained, MotionPreference::NoPreference);
        let scroll = ScrollPosition::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let source = Updates(seen.clone());
        let activated = page
            .activate_lazy(ElementId(3), true, SimElement::new(0.0, 400.0, &scroll), || {
                Ok(source)
            })
            .unwrap();

        assert!(activated);
        assert_eq!(*seen.borrow(), vec![0.0]);
    }

    #[test]
    fn lazy_video_is_rewound_after_construction() {
        let mut page = page(DeviceClass::Constrained, MotionPreference::NoPreference);
        let scroll = ScrollPosition::new();
        let video = Rc::new(RefCell::new(VideoScrubber::new(FakeVideo::ready(6.0))));
        video.borrow_mut().video_mut().current_time = 4.0;

        let built = video.clone();
        page.activate_lazy(ElementId(4), true, SimElement::new(0.0, 400.0, &scroll), || {
            Ok(built)
        })
        .unwrap();

        assert_eq!(video.borrow().video().current_time, 0.0);
    }

    #[test]
    fn failed_builds_are_not_retried() {
        let mut page = page(DeviceClass::Constrained, MotionPreference::NoPreference);
        let scroll = ScrollPosition::new();

        let err = page
            .activate_lazy(ElementId(2), true, SimElement::new(0.0, 10.0, &scroll), || {
                Err::<VideoScrubber<FakeVideo>, _>(ScrollReelError::invalid_config("count"))
            })
            .unwrap_err();
        assert!(matches!(err, ScrollReelError::InvalidConfig(_)));

        let activated = page
            .activate_lazy(ElementId(2), true, SimElement::new(0.0, 10.0, &scroll), || {
                Ok(VideoScrubber::new(FakeVideo::ready(1.0)))
            })
            .unwrap();
        assert!(!activated);
        assert!(page.driver().is_empty());
    }
}
