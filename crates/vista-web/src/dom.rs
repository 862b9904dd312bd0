// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! DOM-backed platform capabilities: container surface, window resize,
//! `requestAnimationFrame` pacing and `performance.now()` time.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use vista_scene_port::RenderSurface;
use vista_viewport::{FrameCallback, FrameScheduler, ResizeSource, ResizeSubscription, TimeSource};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, Performance, Window};

/// A container element the viewport draws into.
#[derive(Clone, Debug)]
pub struct DomSurface {
    element: HtmlElement,
}

impl DomSurface {
    /// Wrap `element`.
    pub fn new(element: HtmlElement) -> Self {
        Self { element }
    }

    /// Look up a container by id. `None` when the element is absent or not
    /// an HTML element.
    pub fn by_id(id: &str) -> Option<Self> {
        web_sys::window()?
            .document()?
            .get_element_by_id(id)?
            .dyn_into::<HtmlElement>()
            .ok()
            .map(Self::new)
    }

    /// The wrapped element.
    pub fn element(&self) -> &HtmlElement {
        &self.element
    }
}

impl RenderSurface for DomSurface {
    fn content_box(&self) -> (u32, u32) {
        let width = u32::try_from(self.element.client_width()).unwrap_or(0);
        let height = u32::try_from(self.element.client_height()).unwrap_or(0);
        (width, height)
    }

    fn device_pixel_ratio(&self) -> f32 {
        web_sys::window().map_or(1.0, |w| w.device_pixel_ratio() as f32)
    }

    fn clear(&mut self) {
        while let Some(child) = self.element.first_child() {
            if self.element.remove_child(&child).is_err() {
                break;
            }
        }
    }
}

/// `resize` listeners on `window`.
#[derive(Default)]
pub struct WindowResizeSource {
    listeners: RefCell<BTreeMap<u64, Closure<dyn FnMut()>>>,
    next: Cell<u64>,
}

impl WindowResizeSource {
    /// Source with no listeners.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResizeSource for WindowResizeSource {
    fn subscribe(&self, mut handler: Box<dyn FnMut()>) -> ResizeSubscription {
        let id = self.next.get();
        self.next.set(id + 1);
        let closure = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
        if let Some(window) = web_sys::window() {
            if let Err(err) =
                window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
            {
                tracing::warn!(target: "vista", ?err, "resize listener not attached");
            }
        }
        self.listeners.borrow_mut().insert(id, closure);
        ResizeSubscription(id)
    }

    fn unsubscribe(&self, subscription: ResizeSubscription) {
        let Some(closure) = self.listeners.borrow_mut().remove(&subscription.0) else {
            return;
        };
        if let Some(window) = web_sys::window() {
            warn_on_failure(
                window.remove_event_listener_with_callback("resize", closure.as_ref().unchecked_ref()),
                "resize listener not removed",
            );
        }
    }
}

impl std::fmt::Debug for WindowResizeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowResizeSource")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

#[derive(Default)]
struct RafState {
    frame: RefCell<Option<FrameCallback>>,
    // Kept alive between requests; replaced only by `start`, never while running.
    closure: RefCell<Option<Closure<dyn FnMut()>>>,
    handle: Cell<Option<i32>>,
    generation: Cell<u64>,
}

impl RafState {
    fn request(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = self.closure.borrow();
        let Some(closure) = closure.as_ref() else {
            return;
        };
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(handle) => self.handle.set(Some(handle)),
            Err(err) => tracing::error!(target: "vista", ?err, "requestAnimationFrame failed"),
        }
    }

    fn run(self: &Rc<Self>) {
        self.handle.set(None);
        let taken = self.frame.borrow_mut().take();
        let Some(mut frame) = taken else {
            return;
        };
        let generation = self.generation.get();
        frame();
        if self.generation.get() == generation {
            *self.frame.borrow_mut() = Some(frame);
            self.request();
        }
    }
}

/// Display-refresh pacing through `requestAnimationFrame`.
#[derive(Clone, Default)]
pub struct RafScheduler(Rc<RafState>);

impl RafScheduler {
    /// Scheduler with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameScheduler for RafScheduler {
    fn start(&self, frame: FrameCallback) {
        self.cancel();
        *self.0.frame.borrow_mut() = Some(frame);
        let weak: Weak<RafState> = Rc::downgrade(&self.0);
        let closure = Closure::wrap(Box::new(move || {
            if let Some(state) = weak.upgrade() {
                state.run();
            }
        }) as Box<dyn FnMut()>);
        *self.0.closure.borrow_mut() = Some(closure);
        self.0.request();
    }

    fn cancel(&self) {
        self.0.generation.set(self.0.generation.get() + 1);
        self.0.frame.borrow_mut().take();
        if let Some(handle) = self.0.handle.take() {
            if let Some(window) = web_sys::window() {
                warn_on_failure(window.cancel_animation_frame(handle), "cancelAnimationFrame failed");
            }
        }
    }
}

impl std::fmt::Debug for RafScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RafScheduler")
            .field("pending", &self.0.handle.get())
            .finish_non_exhaustive()
    }
}

/// `performance.now()`, falling back to `Date.now()` without a window.
#[derive(Clone, Debug)]
pub struct PerformanceTime {
    performance: Option<Performance>,
}

impl PerformanceTime {
    /// Bind to the current window's `performance`.
    pub fn new() -> Self {
        Self {
            performance: web_sys::window().as_ref().and_then(Window::performance),
        }
    }
}

impl Default for PerformanceTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for PerformanceTime {
    fn now(&self) -> Duration {
        let ms = self
            .performance
            .as_ref()
            .map_or_else(js_sys::Date::now, Performance::now);
        millis_to_duration(ms)
    }
}

/// Millisecond timestamp as a duration. Negative and non-finite readings are zero.
pub(crate) fn millis_to_duration(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::from_secs_f64(ms / 1000.0)
    } else {
        Duration::ZERO
    }
}

/// Log a failed DOM cleanup call. Returns whether `result` was ok.
pub(crate) fn warn_on_failure<E: std::fmt::Debug>(result: Result<(), E>, message: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(target: "vista", ?err, "{message}");
            false
        }
    }
}
