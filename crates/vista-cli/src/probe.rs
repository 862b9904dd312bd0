// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless probe: mount a profile against assets on disk, run frames,
//! unmount, and report what happened.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use futures::executor::LocalPool;
use serde::Serialize;
use vista_app_core::prefs::ViewportPrefs;
use vista_headless::{
    DirSource, HeadlessBackend, HeadlessSurface, ManualResize, ManualScheduler, ManualTime,
};
use vista_scene_port::Background;
use vista_viewport::{
    DiagnosticsSink, Field, LoopState, Platform, SceneController, SceneProfile, Severity,
    TracingSink,
};

/// What to probe.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub profile: String,
    pub assets: PathBuf,
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub frame_ms: u64,
    pub resize: Option<(u32, u32)>,
    pub verbose: bool,
    pub prefs: ViewportPrefs,
}

/// Outcome of one probe run.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub profile: String,
    pub model_url: String,
    pub loop_state: String,
    pub frames: u64,
    pub nodes: usize,
    pub model_loaded: bool,
    pub active_clip: Option<String>,
    pub background: String,
    pub renderer_size: (u32, u32),
    pub aspect: f32,
    pub warnings: u32,
    pub errors: u32,
    pub torn_down_cleanly: bool,
}

/// Forwards to `tracing` and counts warnings and errors.
struct CountingSink {
    inner: TracingSink,
    warnings: Cell<u32>,
    errors: Cell<u32>,
}

impl DiagnosticsSink for CountingSink {
    fn emit(&self, severity: Severity, message: &str, fields: &[Field<'_>]) {
        match severity {
            Severity::Warn => self.warnings.set(self.warnings.get() + 1),
            Severity::Error => self.errors.set(self.errors.get() + 1),
            Severity::Trace | Severity::Info => {}
        }
        self.inner.emit(severity, message, fields);
    }
}

fn describe_background(background: Option<Background>) -> String {
    match background {
        None => "none".to_owned(),
        Some(Background::Color(color)) => format!("#{:06x}", color.hex()),
        Some(Background::Environment) => "environment".to_owned(),
    }
}

fn describe_state(state: LoopState) -> String {
    format!("{state:?}").to_lowercase()
}

/// Run a probe.
pub fn run(opts: &ProbeOptions) -> Result<ProbeReport> {
    let mut profile = SceneProfile::by_name(&opts.profile).ok_or_else(|| {
        anyhow!(
            "unknown profile {:?} (expected one of: {})",
            opts.profile,
            SceneProfile::NAMES.join(", ")
        )
    })?;
    profile.apply_prefs(&opts.prefs);
    let model_url = profile.model.url.clone();

    let scheduler = ManualScheduler::new();
    let resize = ManualResize::new();
    let time = ManualTime::new();
    let mut pool = LocalPool::new();
    let sink = Rc::new(CountingSink {
        inner: TracingSink::new(opts.verbose),
        warnings: Cell::new(0),
        errors: Cell::new(0),
    });
    let platform = Platform {
        backend: Rc::new(HeadlessBackend::new()),
        scheduler: Rc::new(scheduler.clone()),
        resize: Rc::new(resize.clone()),
        time: Rc::new(time.clone()),
        source: Rc::new(DirSource::new(&opts.assets)),
        spawner: Rc::new(pool.spawner()),
        sink: sink.clone(),
    };

    let surface = HeadlessSurface::new(opts.width, opts.height);
    let mut controller = SceneController::new(profile, platform);
    controller
        .mount(Some(surface.clone()))
        .context("viewport failed to mount")?;
    pool.run_until_stalled();

    let resize_at = opts.frames / 2;
    for frame in 0..opts.frames {
        if let Some((width, height)) = opts.resize.filter(|_| frame == resize_at) {
            surface.set_content_box(width, height);
            resize.fire();
        }
        time.advance_ms(opts.frame_ms);
        scheduler.step();
        pool.run_until_stalled();
    }

    let loop_state = describe_state(controller.loop_state());
    let frames = controller.host().map_or(0, |h| h.frames());
    let session = controller
        .session()
        .ok_or_else(|| anyhow!("mounted viewport has no session"))?;
    let (nodes, model_loaded, active_clip, background, renderer_size, aspect) = {
        let session = session.borrow();
        (
            session.scene().len(),
            session.model().is_some(),
            session
                .animation()
                .mixer()
                .and_then(|m| m.active_clip())
                .map(|c| c.name.clone()),
            describe_background(session.scene().background()),
            session.renderer_size(),
            session.camera().aspect(),
        )
    };

    controller.unmount();
    let torn_down_cleanly = !scheduler.is_scheduled()
        && resize.active_subscriptions() == 0
        && surface.children().is_empty()
        && session.borrow().is_released();

    Ok(ProbeReport {
        profile: opts.profile.clone(),
        model_url,
        loop_state,
        frames,
        nodes,
        model_loaded,
        active_clip,
        background,
        renderer_size,
        aspect,
        warnings: sink.warnings.get(),
        errors: sink.errors.get(),
        torn_down_cleanly,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use vista_headless::fixtures;
    use vista_scene_port::Color;

    fn options(assets: PathBuf) -> ProbeOptions {
        ProbeOptions {
            profile: "skinning-morphing".into(),
            assets,
            width: 800,
            height: 600,
            frames: 4,
            frame_ms: 16,
            resize: None,
            verbose: false,
            prefs: ViewportPrefs::default(),
        }
    }

    fn write(root: &std::path::Path, rel: &str, bytes: &[u8]) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn backgrounds_describe_compactly() {
        assert_eq!(describe_background(None), "none");
        assert_eq!(
            describe_background(Some(Background::Color(Color::from_hex(0x333333)))),
            "#333333"
        );
        assert_eq!(describe_background(Some(Background::Environment)), "environment");
    }

    #[test]
    fn probe_with_assets_loads_and_tears_down() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "models/gltf/RobotExpressive/RobotExpressive.glb",
            &fixtures::animated_model(&[("Idle", 2.0)]),
        );
        write(
            dir.path(),
            "textures/equirectangular/venice_sunset_1k.hdr",
            &fixtures::tiny_hdr(),
        );

        let report = run(&options(dir.path().to_path_buf())).unwrap();
        assert!(report.model_loaded);
        assert_eq!(report.active_clip.as_deref(), Some("Idle"));
        assert_eq!(report.background, "environment");
        assert_eq!(report.frames, 4);
        assert_eq!(report.loop_state, "running");
        assert_eq!(report.errors, 0);
        assert!(report.torn_down_cleanly);
    }

    #[test]
    fn missing_assets_are_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path().to_path_buf());
        opts.resize = Some((400, 400));
        let report = run(&opts).unwrap();
        assert!(!report.model_loaded);
        assert_eq!(report.errors, 2);
        assert_eq!(report.background, "#333333");
        assert_eq!(report.renderer_size, (400, 400));
        assert!((report.aspect - 1.0).abs() < f32::EPSILON);
        assert!(report.torn_down_cleanly);
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path().to_path_buf());
        opts.profile = "orbit".into();
        let err = run(&opts).unwrap_err();
        assert!(err.to_string().contains("unknown profile"));
    }
}
