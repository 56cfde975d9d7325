use std::{cell::RefCell, f64::consts::TAU, rc::Rc};

use gloo::{
    events::EventListener,
    render::{request_animation_frame, AnimationFrame},
};
use js_sys::{Function, Promise, Reflect};
use scrollreel_core::{Result, ScrollReelError, SnowConfig, SnowField};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    CanvasRenderingContext2d, DeviceOrientationEvent, Document, HtmlCanvasElement, MouseEvent,
    Window,
};

use crate::markup::{snow_fill, REDUCED_MOTION_QUERY, SNOW_CANVAS_ID};

thread_local! {
    static SNOW: RefCell<Option<Rc<Backdrop>>> = const { RefCell::new(None) };
}

/// Starts the snow loop on `#snow-canvas` if the page has one.
pub fn mount(document: &Document, config: SnowConfig) -> Result<()> {
    let Some(canvas) = document.get_element_by_id(SNOW_CANVAS_ID) else {
        return Ok(());
    };
    let window = web_sys::window().ok_or_else(|| ScrollReelError::msg("no window"))?;
    let reduce = window
        .match_media(REDUCED_MOTION_QUERY)
        .ok()
        .flatten()
        .is_some_and(|list| list.matches());
    if reduce {
        tracing::info!("reduced motion requested; snow stays still");
        return Ok(());
    }

    let canvas = canvas
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| ScrollReelError::msg("#snow-canvas is not a canvas"))?;
    let context = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|context| context.dyn_into::<CanvasRenderingContext2d>().ok())
        .ok_or_else(|| ScrollReelError::msg("snow canvas has no 2d context"))?;

    let (width, height) = window_size(&window);
    let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
    let backdrop = Rc::new(Backdrop {
        window,
        canvas,
        context,
        field: RefCell::new(SnowField::new(config, width, height, seed)),
        frame: RefCell::new(None),
        listeners: RefCell::new(Vec::new()),
    });

    backdrop.fit_canvas();
    backdrop.install_listeners();
    backdrop.tick();
    SNOW.with(|slot| *slot.borrow_mut() = Some(backdrop));
    Ok(())
}

fn window_size(window: &Window) -> (f64, f64) {
    let read = |value: std::result::Result<JsValue, JsValue>| {
        value.ok().and_then(|value| value.as_f64()).unwrap_or(0.0)
    };
    (read(window.inner_width()), read(window.inner_height()))
}

struct Backdrop {
    window: Window,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    field: RefCell<SnowField>,
    frame: RefCell<Option<AnimationFrame>>,
    listeners: RefCell<Vec<EventListener>>,
}

impl Backdrop {
    fn fit_canvas(&self) {
        let (width, height) = window_size(&self.window);
        self.canvas.set_width(width as u32);
        self.canvas.set_height(height as u32);
        self.field.borrow_mut().resize(width, height);
    }

    fn tick(self: &Rc<Self>) {
        self.field.borrow_mut().step();
        self.draw();

        let backdrop = Rc::downgrade(self);
        let handle = request_animation_frame(move |_| {
            if let Some(backdrop) = backdrop.upgrade() {
                backdrop.tick();
            }
        });
        *self.frame.borrow_mut() = Some(handle);
    }

    fn draw(&self) {
        let field = self.field.borrow();
        let (width, height) = field.size();
        self.context.clear_rect(0.0, 0.0, width, height);

        for flake in field.particles() {
            self.context.begin_path();
            if self.context.arc(flake.x, flake.y, flake.size, 0.0, TAU).is_err() {
                continue;
            }
            self.context.set_fill_style_str(&snow_fill(flake.opacity));
            self.context.fill();
        }
    }

    fn install_listeners(self: &Rc<Self>) {
        let mut listeners = self.listeners.borrow_mut();

        let backdrop = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.window, "resize", move |_| {
            if let Some(backdrop) = backdrop.upgrade() {
                backdrop.fit_canvas();
            }
        }));

        let backdrop = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.window, "mousemove", move |event| {
            let (Some(backdrop), Some(event)) = (backdrop.upgrade(), event.dyn_ref::<MouseEvent>())
            else {
                return;
            };
            backdrop
                .field
                .borrow_mut()
                .set_pointer(event.client_x() as f64, event.client_y() as f64);
        }));

        let backdrop = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.window, "mouseout", move |_| {
            if let Some(backdrop) = backdrop.upgrade() {
                backdrop.field.borrow_mut().clear_pointer();
            }
        }));

        match orientation_permission_request(&self.window) {
            Some((constructor, request)) => {
                let backdrop = Rc::downgrade(self);
                listeners.push(EventListener::once(&self.window, "click", move |_| {
                    if let Some(backdrop) = backdrop.upgrade() {
                        backdrop.request_orientation(constructor, request);
                    }
                }));
            }
            None => listeners.push(self.orientation_listener()),
        }
    }

    fn orientation_listener(self: &Rc<Self>) -> EventListener {
        let backdrop = Rc::downgrade(self);
        EventListener::new(&self.window, "deviceorientation", move |event| {
            let (Some(backdrop), Some(event)) =
                (backdrop.upgrade(), event.dyn_ref::<DeviceOrientationEvent>())
            else {
                return;
            };
            backdrop.field.borrow_mut().set_tilt(event.gamma());
        })
    }

    /// Asks for motion access, which some browsers only grant from a user
    /// gesture, and listens for tilt once it is granted.
    fn request_orientation(self: Rc<Self>, constructor: JsValue, request: Function) {
        let promise = match request.call0(&constructor).map(|value| value.dyn_into::<Promise>()) {
            Ok(Ok(promise)) => promise,
            Ok(Err(value)) | Err(value) => {
                tracing::warn!(?value, "orientation permission request failed");
                return;
            }
        };

        spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(state) if state.as_string().as_deref() == Some("granted") => {
                    let listener = self.orientation_listener();
                    self.listeners.borrow_mut().push(listener);
                }
                Ok(state) => tracing::info!(?state, "orientation permission not granted"),
                Err(err) => tracing::warn!(?err, "orientation permission request failed"),
            }
        });
    }
}

/// `DeviceOrientationEvent.requestPermission`, when the browser has it.
fn orientation_permission_request(window: &Window) -> Option<(JsValue, Function)> {
    let constructor = Reflect::get(window, &JsValue::from_str("DeviceOrientationEvent")).ok()?;
    if constructor.is_undefined() {
        return None;
    }
    let request = Reflect::get(&constructor, &JsValue::from_str("requestPermission")).ok()?;
    let request = request.dyn_into::<Function>().ok()?;
    Some((constructor, request))
}
