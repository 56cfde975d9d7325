use std::{cell::RefCell, rc::Rc};

use gloo::{
    events::EventListener,
    render::{request_animation_frame, AnimationFrame},
};
use scrollreel_core::{
    Activation, AppConfig, DeviceClass, ElementId, MediaKind, MediaSource, MotionPreference,
    PageContext, Result, ScrollReelError, ScrubConfig, VideoScrubber, VideoState,
};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    Document, Element, HtmlCanvasElement, HtmlVideoElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, Window,
};

use crate::{
    dom::{sequence_from_canvas, DomElement, WebVideo},
    markup::{
        parse_element_id, IdAllocator, ELEMENT_ID_ATTR, REDUCED_MOTION_QUERY, REVEALED_CLASS, REVEAL_SELECTOR,
        SEQUENCE_SELECTOR, VIDEO_SELECTOR,
    },
};

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

thread_local! {
    static PAGE: RefCell<Option<Rc<LandingPage>>> = const { RefCell::new(None) };
}

/// Installs the scroll effects on `document` and keeps them alive for the
/// lifetime of the page.
pub fn mount(document: &Document, config: AppConfig) -> Result<()> {
    let window = web_sys::window().ok_or_else(|| ScrollReelError::msg("no window"))?;

    let reduce = media_matches(&window, REDUCED_MOTION_QUERY);
    let desktop = media_matches(&window, &config.activation.desktop_query());
    let motion = MotionPreference::from_reduce_query(reduce);
    let device_class = DeviceClass::from_min_width_match(desktop);
    tracing::info!(?device_class, ?motion, "mounting scroll effects");

    let page = Rc::new(LandingPage {
        window,
        document: document.clone(),
        context: RefCell::new(PageContext::new(config, device_class, motion)),
        frame: RefCell::new(None),
        listeners: RefCell::new(Vec::new()),
        observers: RefCell::new(Vec::new()),
        ids: RefCell::new(IdAllocator::default()),
    });

    if page.context.borrow().motion_allowed() {
        page.install_media()?;
        page.install_listeners();
        page.install_reveal()?;
        let viewport = page.viewport_height();
        page.context.borrow_mut().start(viewport);
    }

    PAGE.with(|slot| *slot.borrow_mut() = Some(page));
    Ok(())
}

fn media_matches(window: &Window, query: &str) -> bool {
    window
        .match_media(query)
        .ok()
        .flatten()
        .is_some_and(|list| list.matches())
}

struct LandingPage {
    window: Window,
    document: Document,
    context: RefCell<PageContext>,
    frame: RefCell<Option<AnimationFrame>>,
    listeners: RefCell<Vec<EventListener>>,
    observers: RefCell<Vec<(IntersectionObserver, ObserverCallback)>>,
    ids: RefCell<IdAllocator>,
}

impl LandingPage {
    fn viewport_height(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|height| height.as_f64())
            .unwrap_or(0.0)
    }

    fn assign_id(&self, element: &Element) -> ElementId {
        let existing = element.get_attribute(ELEMENT_ID_ATTR);
        let (id, fresh) = self.ids.borrow_mut().id_for(existing.as_deref());
        if fresh {
            if let Err(err) = element.set_attribute(ELEMENT_ID_ATTR, &id.0.to_string()) {
                tracing::warn!(?err, element = %id, "could not tag element");
            }
        }
        id
    }

    fn select(&self, selector: &str) -> Vec<Element> {
        let Ok(nodes) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|index| nodes.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn install_media(self: &Rc<Self>) -> Result<()> {
        let mut lazy = Vec::new();

        for (selector, kind) in [
            (VIDEO_SELECTOR, MediaKind::Video),
            (SEQUENCE_SELECTOR, MediaKind::ImageSequence),
        ] {
            let activation = self.context.borrow().activation_for(kind);
            for element in self.select(selector) {
                match activation {
                    Activation::Disabled => {}
                    Activation::OnApproach => lazy.push(element),
                    Activation::Eager => {
                        let id = self.assign_id(&element);
                        let scrub = self.context.borrow().config().scrub.clone();
                        let registered = self.build_source(&element, &scrub).and_then(|source| {
                            self.context
                                .borrow_mut()
                                .register(id, DomElement(element.clone()), source)
                        });
                        if let Err(err) = registered {
                            tracing::warn!(element = %id, error = %err, "scrubber not installed");
                        }
                    }
                }
            }
        }

        if lazy.is_empty() {
            return Ok(());
        }

        let margin = self.context.borrow().activator().root_margin();
        let page = Rc::downgrade(self);
        let observer = self.observe(&margin, None, move |entry, observer| {
            if let Some(page) = page.upgrade() {
                page.on_media_intersection(entry, observer);
            }
        })?;
        for element in lazy {
            self.assign_id(&element);
            observer.observe(&element);
        }
        Ok(())
    }

    fn on_media_intersection(
        &self,
        entry: IntersectionObserverEntry,
        observer: &IntersectionObserver,
    ) {
        let target = entry.target();
        let Some(id) = parse_element_id(target.get_attribute(ELEMENT_ID_ATTR).as_deref()) else {
            return;
        };

        let scrub = self.context.borrow().config().scrub.clone();
        let activated = self.context.borrow_mut().activate_lazy(
            id,
            entry.is_intersecting(),
            DomElement(target.clone()),
            || self.build_source(&target, &scrub),
        );
        match activated {
            Ok(true) => observer.unobserve(&target),
            Ok(false) => {}
            Err(err) => {
                observer.unobserve(&target);
                tracing::warn!(element = %id, error = %err, "lazy scrubber not installed");
            }
        }
    }

    /// Never touches `context`; it runs while the context is borrowed.
    fn build_source(
        &self,
        element: &Element,
        scrub: &ScrubConfig,
    ) -> Result<Box<dyn MediaSource>> {
        if let Some(canvas) = element.dyn_ref::<HtmlCanvasElement>() {
            let sequence = sequence_from_canvas(canvas.clone(), scrub)?;
            return Ok(Box::new(sequence));
        }

        let video = element
            .dyn_ref::<HtmlVideoElement>()
            .ok_or_else(|| ScrollReelError::msg("scroll media must be a video or a canvas"))?;
        let scrubber = Rc::new(RefCell::new(VideoScrubber::with_hysteresis(
            WebVideo(video.clone()),
            scrub.seek_hysteresis_seconds,
        )));

        if scrubber.borrow().state() == VideoState::MetadataPending {
            let pending = Rc::downgrade(&scrubber);
            self.listeners
                .borrow_mut()
                .push(EventListener::once(video, "loadedmetadata", move |_| {
                    if let Some(scrubber) = pending.upgrade() {
                        scrubber.borrow_mut().on_metadata_loaded();
                    }
                }));
        }
        Ok(Box::new(scrubber))
    }

    fn install_listeners(self: &Rc<Self>) {
        let mut listeners = self.listeners.borrow_mut();

        let page = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.window, "scroll", move |_| {
            if let Some(page) = page.upgrade() {
                if page.context.borrow_mut().on_scroll() {
                    page.schedule_frame();
                }
            }
        }));

        let page = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.window, "resize", move |_| {
            if let Some(page) = page.upgrade() {
                if page.context.borrow_mut().on_resize() {
                    page.schedule_frame();
                }
            }
        }));
    }

    /// Requests at most one animation frame at a time.
    fn schedule_frame(self: &Rc<Self>) {
        if self.frame.borrow().is_some() {
            return;
        }
        let page = Rc::downgrade(self);
        let handle = request_animation_frame(move |_| {
            if let Some(page) = page.upgrade() {
                page.frame.borrow_mut().take();
                let viewport = page.viewport_height();
                page.context.borrow_mut().on_animation_frame(viewport);
            }
        });
        *self.frame.borrow_mut() = Some(handle);
    }

    fn install_reveal(self: &Rc<Self>) -> Result<()> {
        let elements = self.select(REVEAL_SELECTOR);
        if elements.is_empty() {
            return Ok(());
        }

        let (margin, threshold) = {
            let context = self.context.borrow();
            let reveal = &context.config().reveal;
            (reveal.root_margin(), reveal.threshold)
        };
        let page = Rc::downgrade(self);
        let observer = self.observe(&margin, Some(threshold), move |entry, observer| {
            let Some(page) = page.upgrade() else {
                return;
            };
            let target = entry.target();
            let Some(id) = parse_element_id(target.get_attribute(ELEMENT_ID_ATTR).as_deref())
            else {
                return;
            };
            if page
                .context
                .borrow_mut()
                .reveal_mut()
                .on_intersection(id, entry.is_intersecting())
            {
                if let Err(err) = target.class_list().add_1(REVEALED_CLASS) {
                    tracing::warn!(?err, element = %id, "reveal class not applied");
                }
                observer.unobserve(&target);
            }
        })?;

        for element in elements {
            let id = self.assign_id(&element);
            self.context.borrow_mut().reveal_mut().observe(id);
            observer.observe(&element);
        }
        Ok(())
    }

    fn observe<F>(
        &self,
        root_margin: &str,
        threshold: Option<f64>,
        mut on_entry: F,
    ) -> Result<IntersectionObserver>
    where
        F: FnMut(IntersectionObserverEntry, &IntersectionObserver) + 'static,
    {
        let callback: ObserverCallback = Closure::new(
            move |entries: js_sys::Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    on_entry(entry.unchecked_into(), &observer);
                }
            },
        );

        let options = IntersectionObserverInit::new();
        options.set_root_margin(root_margin);
        if let Some(threshold) = threshold {
            options.set_threshold(&JsValue::from_f64(threshold));
        }

        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)
                .map_err(|err| ScrollReelError::msg(format!("intersection observer: {err:?}")))?;
        self.observers
            .borrow_mut()
            .push((observer.clone(), callback));
        Ok(observer)
    }
}

impl Drop for LandingPage {
    fn drop(&mut self) {
        for (observer, _) in self.observers.borrow().iter() {
            observer.disconnect();
        }
    }
}
