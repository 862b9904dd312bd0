// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene controller: mounts a [`SceneProfile`] into a viewport host.
//!
//! Mount order: initialize the host, populate placeholder content, start the
//! loop, then issue the asset loads. The loop never waits for an asset; the
//! scene renders whatever it currently holds.

use std::rc::Rc;

use vista_scene_port::{Backend, DecodedModel, EnvironmentMap};

use crate::diagnostics::Field;
use crate::error::ViewportError;
use crate::host::{Platform, SessionHandle, ViewportHost};
use crate::loader::{AssetLoader, LoadError, LoadHandlers};
use crate::profile::{EnvironmentSetup, SceneProfile};
use crate::render_loop::LoopState;

/// Mounts and unmounts one profile.
pub struct SceneController<B: Backend + 'static> {
    profile: SceneProfile,
    platform: Platform<B>,
    host: Option<ViewportHost<B>>,
}

impl<B: Backend + 'static> SceneController<B> {
    /// Unmounted controller.
    pub fn new(profile: SceneProfile, platform: Platform<B>) -> Self {
        Self {
            profile,
            platform,
            host: None,
        }
    }

    /// Mount onto `surface`.
    ///
    /// An absent surface is logged and leaves the controller unmounted, so
    /// mount can be retried once the container exists.
    pub fn mount(&mut self, surface: Option<B::Surface>) -> Result<(), ViewportError> {
        if self.host.is_some() {
            self.platform.sink.warn(
                "viewport already mounted; ignoring mount",
                &[Field::new("profile", &self.profile.name)],
            );
            return Err(ViewportError::AlreadyInitialized);
        }

        let mut host = ViewportHost::new(self.platform.clone());
        host.initialize(surface, &self.profile.setup)?;
        host.with_session(|session| {
            let placeholder = self.profile.populate(session.scene_mut());
            session.set_placeholder(placeholder);
        });
        host.start_loop()?;
        self.issue_loads(&host);
        self.platform.sink.info(
            "viewport mounted",
            &[Field::new("profile", &self.profile.name)],
        );
        self.host = Some(host);
        Ok(())
    }

    /// Tear the viewport down. Idempotent.
    pub fn unmount(&mut self) {
        if let Some(mut host) = self.host.take() {
            host.teardown();
        }
    }

    fn issue_loads(&self, host: &ViewportHost<B>) {
        let loader = AssetLoader::new(
            Rc::clone(&self.platform.source),
            Rc::clone(&self.platform.spawner),
            Rc::clone(&self.platform.sink),
            host.liveness(),
        )
        .with_decoder_path(self.profile.draco_decoder_path.clone());

        loader.load_model(&self.profile.model.url, self.model_handlers(host));

        if let EnvironmentSetup::Hdr { url, fallback } = &self.profile.environment {
            let weak = host.session_weak();
            let fallback = *fallback;
            let sink = Rc::clone(&self.platform.sink);
            let fail_sink = Rc::clone(&self.platform.sink);
            let url_owned = url.clone();
            loader.load_environment(
                url,
                LoadHandlers::new(
                    move |map: EnvironmentMap| {
                        let Some(session) = weak.upgrade() else {
                            return;
                        };
                        let Ok(mut session) = session.try_borrow_mut() else {
                            sink.warn("session busy; environment dropped", &[]);
                            return;
                        };
                        let (width, height) = (map.width, map.height);
                        session.apply_environment(map);
                        sink.info(
                            "environment loaded",
                            &[
                                Field::new("url", &url_owned),
                                Field::new("width", &width),
                                Field::new("height", &height),
                            ],
                        );
                    },
                    {
                        let weak = host.session_weak();
                        move |err: LoadError| {
                            fail_sink.error(
                                "An error happened during texture loading",
                                &[Field::new("cause", &err)],
                            );
                            if let Some(session) = weak.upgrade() {
                                if let Ok(mut session) = session.try_borrow_mut() {
                                    session.apply_background(fallback);
                                }
                            }
                        }
                    },
                ),
            );
        }
    }

    fn model_handlers(&self, host: &ViewportHost<B>) -> LoadHandlers<DecodedModel> {
        let weak = host.session_weak();
        let backend = Rc::clone(&self.platform.backend);
        let placement = self.profile.model.clone();
        let sink = Rc::clone(&self.platform.sink);
        let fail_sink = Rc::clone(&self.platform.sink);
        let progress_sink = Rc::clone(&self.platform.sink);
        let progress_url = placement.url.clone();

        LoadHandlers::new(
            move |mut model: DecodedModel| {
                let Some(session) = weak.upgrade() else {
                    return;
                };
                let Ok(mut session) = session.try_borrow_mut() else {
                    sink.warn("session busy; model dropped", &[]);
                    return;
                };
                model.root.transform = placement.transform;
                model.root.cast_shadow = placement.cast_shadow;
                let clips = model.clips.len();
                session.attach_model(&*backend, model);
                sink.info(
                    "model loaded",
                    &[
                        Field::new("url", &placement.url),
                        Field::new("clips", &clips),
                    ],
                );
            },
            move |err: LoadError| {
                fail_sink.error(
                    "An error happened during model loading",
                    &[Field::new("cause", &err)],
                );
            },
        )
        .on_progress(move |fraction| {
            let message = format!("{:.0}% loaded", fraction * 100.0);
            progress_sink.trace(&message, &[Field::new("url", &progress_url)]);
        })
    }

    /// Whether a viewport is mounted.
    pub fn is_mounted(&self) -> bool {
        self.host.is_some()
    }

    /// The profile being mounted.
    pub fn profile(&self) -> &SceneProfile {
        &self.profile
    }

    /// The mounted host.
    pub fn host(&self) -> Option<&ViewportHost<B>> {
        self.host.as_ref()
    }

    /// Mutable access to the mounted host.
    pub fn host_mut(&mut self) -> Option<&mut ViewportHost<B>> {
        self.host.as_mut()
    }

    /// Loop state of the mounted host (`Idle` when unmounted).
    pub fn loop_state(&self) -> LoopState {
        self.host.as_ref().map_or(LoopState::Idle, ViewportHost::loop_state)
    }

    /// Shared handle to the mounted session.
    pub fn session(&self) -> Option<SessionHandle<B>> {
        self.host.as_ref().and_then(ViewportHost::session)
    }
}

impl<B: Backend + 'static> std::fmt::Debug for SceneController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneController")
            .field("profile", &self.profile.name)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}
