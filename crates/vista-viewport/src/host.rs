// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewport host: owns the session, the render loop and the resize subscription.
//!
//! Teardown runs in a fixed order: stop frame scheduling, remove the resize
//! subscription, revoke liveness so pending asset callbacks go inert, then
//! release the session (which clears the surface).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use vista_scene_port::Backend;

use crate::clock::TimeSource;
use crate::diagnostics::{DiagnosticsSink, Field};
use crate::error::ViewportError;
use crate::liveness::Liveness;
use crate::loader::{AssetSource, Spawner};
use crate::render_loop::{FramePass, FrameScheduler, LoopState, RenderLoop};
use crate::session::{Session, ViewportSetup};

/// Handle returned by [`ResizeSource::subscribe`].
///
/// Not `Clone`: handing it back to [`ResizeSource::unsubscribe`] consumes it,
/// so a subscription can only be removed once.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ResizeSubscription(pub u64);

/// Host viewport resize notifications.
pub trait ResizeSource {
    /// Register `handler` for every resize.
    fn subscribe(&self, handler: Box<dyn FnMut()>) -> ResizeSubscription;

    /// Remove a registration.
    fn unsubscribe(&self, subscription: ResizeSubscription);
}

/// Host capabilities a viewport runs against.
pub struct Platform<B: Backend> {
    /// Rendering backend.
    pub backend: Rc<B>,
    /// Display refresh signal.
    pub scheduler: Rc<dyn FrameScheduler>,
    /// Window resize notifications.
    pub resize: Rc<dyn ResizeSource>,
    /// Monotonic time.
    pub time: Rc<dyn TimeSource>,
    /// Asset byte fetcher.
    pub source: Rc<dyn AssetSource>,
    /// UI-thread task spawner.
    pub spawner: Rc<dyn Spawner>,
    /// Diagnostics.
    pub sink: Rc<dyn DiagnosticsSink>,
}

impl<B: Backend> Clone for Platform<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Rc::clone(&self.backend),
            scheduler: Rc::clone(&self.scheduler),
            resize: Rc::clone(&self.resize),
            time: Rc::clone(&self.time),
            source: Rc::clone(&self.source),
            spawner: Rc::clone(&self.spawner),
            sink: Rc::clone(&self.sink),
        }
    }
}

impl<B: Backend> std::fmt::Debug for Platform<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}

/// Shared handle to a live session.
pub type SessionHandle<B> = Rc<RefCell<Session<B>>>;

/// One mount-to-unmount viewport lifecycle.
pub struct ViewportHost<B: Backend + 'static> {
    platform: Platform<B>,
    session: Option<SessionHandle<B>>,
    driver: RenderLoop,
    subscription: Option<ResizeSubscription>,
    liveness: Liveness,
    torn_down: bool,
}

impl<B: Backend + 'static> ViewportHost<B> {
    /// Host with no session yet.
    pub fn new(platform: Platform<B>) -> Self {
        let driver = RenderLoop::new(Rc::clone(&platform.scheduler));
        Self {
            platform,
            session: None,
            driver,
            subscription: None,
            liveness: Liveness::new(),
            torn_down: false,
        }
    }

    /// Build the session on `surface` and subscribe to resize.
    ///
    /// An absent surface is reported through the diagnostics sink and leaves
    /// the host untouched, so the call can be repeated once the surface exists.
    pub fn initialize(
        &mut self,
        surface: Option<B::Surface>,
        setup: &ViewportSetup,
    ) -> Result<(), ViewportError> {
        if self.torn_down {
            return Err(ViewportError::TornDown);
        }
        if self.session.is_some() {
            return Err(ViewportError::AlreadyInitialized);
        }
        let sink = &self.platform.sink;
        let Some(surface) = surface else {
            sink.error("Container element not found", &[]);
            return Err(ViewportError::MissingSurface);
        };

        let session = match Session::build(
            &*self.platform.backend,
            surface,
            Rc::clone(&self.platform.time),
            setup,
        ) {
            Ok(session) => session,
            Err(err) => {
                sink.error("viewport initialization failed", &[Field::new("cause", &err)]);
                return Err(err.into());
            }
        };
        let (width, height) = session.renderer_size();
        let aspect = session.camera().aspect();
        let session = Rc::new(RefCell::new(session));

        let weak = Rc::downgrade(&session);
        self.subscription = Some(self.platform.resize.subscribe(Box::new(move || {
            if let Some(session) = weak.upgrade() {
                if let Ok(mut session) = session.try_borrow_mut() {
                    session.resize_to_surface();
                }
            }
        })));
        self.session = Some(session);

        sink.info(
            "viewport initialized",
            &[
                Field::new("width", &width),
                Field::new("height", &height),
                Field::new("aspect", &aspect),
            ],
        );
        Ok(())
    }

    /// Start the render loop against the current session.
    pub fn start_loop(&mut self) -> Result<(), ViewportError> {
        if self.torn_down {
            return Err(ViewportError::TornDown);
        }
        let Some(session) = &self.session else {
            return Err(ViewportError::NotInitialized);
        };
        let pass: Rc<RefCell<dyn FramePass>> = session.clone();
        self.driver.start(Rc::downgrade(&pass))?;
        self.platform.sink.trace("render loop started", &[]);
        Ok(())
    }

    /// Apply the surface's current size. No-op without a live session.
    pub fn handle_resize(&self) {
        let Some(session) = &self.session else {
            return;
        };
        if let Ok(mut session) = session.try_borrow_mut() {
            session.resize_to_surface();
        }
    }

    /// Stop the loop, drop the resize subscription, revoke liveness and
    /// release the surface. Idempotent and safe before `initialize`.
    ///
    /// A session borrowed elsewhere at this point releases when its last
    /// handle drops.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.driver.stop();
        if let Some(subscription) = self.subscription.take() {
            self.platform.resize.unsubscribe(subscription);
        }
        self.liveness.revoke();
        if let Some(session) = self.session.take() {
            match session.try_borrow_mut() {
                Ok(mut session) => session.release(),
                Err(_) => self
                    .platform
                    .sink
                    .warn("session busy during teardown; release deferred to drop", &[]),
            }
            let frames = self.driver.frames();
            self.platform
                .sink
                .info("viewport torn down", &[Field::new("frames", &frames)]);
        }
    }

    /// Shared handle to the session, if initialized and not torn down.
    pub fn session(&self) -> Option<SessionHandle<B>> {
        self.session.clone()
    }

    /// Weak handle for callbacks that must not extend the session's life.
    pub fn session_weak(&self) -> Weak<RefCell<Session<B>>> {
        self.session.as_ref().map_or_else(Weak::new, Rc::downgrade)
    }

    /// Run `f` against the session.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut Session<B>) -> R) -> Option<R> {
        let session = self.session.as_ref()?;
        let mut session = session.try_borrow_mut().ok()?;
        Some(f(&mut session))
    }

    /// Liveness flag revoked on teardown.
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    /// Render loop state.
    pub fn loop_state(&self) -> LoopState {
        self.driver.state()
    }

    /// Frames executed by this host's loop.
    pub fn frames(&self) -> u64 {
        self.driver.frames()
    }

    /// Whether a session exists.
    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// Whether `teardown` ran.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Host capabilities.
    pub fn platform(&self) -> &Platform<B> {
        &self.platform
    }
}

impl<B: Backend + 'static> Drop for ViewportHost<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<B: Backend + 'static> std::fmt::Debug for ViewportHost<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportHost")
            .field("driver", &self.driver)
            .field("initialized", &self.session.is_some())
            .field("subscribed", &self.subscription.is_some())
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}
