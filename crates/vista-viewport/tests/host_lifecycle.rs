// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use approx::assert_relative_eq;
use vista_headless::{Event, FailAt, Harness, HeadlessBackend, HeadlessSurface};
use vista_viewport::{LoopError, LoopState, Severity, ViewportError, ViewportHost, ViewportSetup};

fn mounted(harness: &Harness, width: u32, height: u32) -> (ViewportHost<HeadlessBackend>, HeadlessSurface) {
    let surface = HeadlessSurface::new(width, height);
    let mut host = ViewportHost::new(harness.platform());
    host.initialize(Some(surface.clone()), &ViewportSetup::default())
        .expect("initialize");
    host.start_loop().expect("start loop");
    (host, surface)
}

#[test]
fn initialize_sizes_camera_and_renderer_from_the_content_box() {
    let harness = Harness::new();
    let (host, surface) = mounted(&harness, 800, 600);

    let session = host.session().expect("session");
    let session = session.borrow();
    assert_relative_eq!(session.camera().aspect(), 800.0 / 600.0);
    assert_eq!(session.renderer_size(), (800, 600));
    // Prior contents are cleared before the canvas and overlay attach.
    assert_eq!(surface.children(), vec!["canvas", "stats"]);
    assert_eq!(harness.resize.active_subscriptions(), 1);
    assert_eq!(host.loop_state(), LoopState::Starting);
}

#[test]
fn device_pixel_ratio_reaches_the_renderer() {
    let harness = Harness::new();
    let surface = HeadlessSurface::new(300, 150).with_pixel_ratio(2.0);
    let mut host = ViewportHost::new(harness.platform());
    host.initialize(Some(surface), &ViewportSetup::default()).unwrap();
    host.start_loop().unwrap();
    assert!(harness.frame(16));
    let probe = harness.journal().last_render().unwrap();
    assert_relative_eq!(probe.pixel_ratio, 2.0);
    assert_eq!(probe.size, (300, 150));
}

#[test]
fn first_frame_moves_loop_to_running() {
    let harness = Harness::new();
    let (host, _surface) = mounted(&harness, 640, 480);
    assert!(harness.frame(16));
    assert_eq!(host.loop_state(), LoopState::Running);
    assert_eq!(host.frames(), 1);
}

#[test]
fn resize_mid_run_updates_the_next_frame() {
    let harness = Harness::new();
    let (host, surface) = mounted(&harness, 800, 600);
    assert!(harness.frame(16));
    let before = host
        .with_session(|s| s.camera().projection_revision())
        .unwrap();

    surface.set_content_box(400, 300);
    harness.resize.fire();
    assert!(harness.frame(16));

    let probe = harness.journal().last_render().unwrap();
    assert_eq!(probe.size, (400, 300));
    assert_relative_eq!(probe.aspect, 400.0 / 300.0);
    let after = host
        .with_session(|s| s.camera().projection_revision())
        .unwrap();
    assert!(after > before);
}

#[test]
fn zero_height_box_never_produces_nan() {
    let harness = Harness::new();
    let (host, surface) = mounted(&harness, 800, 0);
    assert_relative_eq!(host.with_session(|s| s.camera().aspect()).unwrap(), 1.0);
    surface.set_content_box(0, 0);
    host.handle_resize();
    let aspect = host.with_session(|s| s.camera().aspect()).unwrap();
    assert!(aspect.is_finite());
    assert!(host
        .with_session(|s| s.camera().projection().is_finite())
        .unwrap());
}

#[test]
fn missing_surface_is_reported_and_retryable() {
    let harness = Harness::new();
    let mut host = ViewportHost::new(harness.platform());

    let err = host.initialize(None, &ViewportSetup::default());
    assert!(matches!(err, Err(ViewportError::MissingSurface)));
    assert!(harness
        .sink
        .contains(Severity::Error, "Container element not found"));
    assert!(!host.is_initialized());
    assert_eq!(harness.resize.active_subscriptions(), 0);

    host.initialize(Some(HeadlessSurface::new(10, 10)), &ViewportSetup::default())
        .expect("retry after the surface exists");
    assert!(host.is_initialized());
}

#[test]
fn double_initialize_is_rejected() {
    let harness = Harness::new();
    let (mut host, _surface) = mounted(&harness, 10, 10);
    let again = host.initialize(Some(HeadlessSurface::new(5, 5)), &ViewportSetup::default());
    assert!(matches!(again, Err(ViewportError::AlreadyInitialized)));
    assert_eq!(harness.resize.active_subscriptions(), 1);
}

#[test]
fn start_loop_requires_a_session_and_runs_once() {
    let harness = Harness::new();
    let mut host = ViewportHost::new(harness.platform());
    assert!(matches!(host.start_loop(), Err(ViewportError::NotInitialized)));

    host.initialize(Some(HeadlessSurface::new(10, 10)), &ViewportSetup::default())
        .unwrap();
    host.start_loop().unwrap();
    assert!(matches!(
        host.start_loop(),
        Err(ViewportError::Loop(LoopError::AlreadyStarted))
    ));
    assert_eq!(harness.scheduler.starts(), 1);
}

#[test]
fn teardown_is_ordered_and_idempotent() {
    let harness = Harness::new();
    let (mut host, surface) = mounted(&harness, 800, 600);
    assert!(harness.frame(16));
    let liveness = host.liveness();

    host.teardown();
    host.teardown();

    assert_eq!(host.loop_state(), LoopState::Stopped);
    assert_eq!(harness.scheduler.cancels(), 1);
    assert!(!harness.scheduler.is_scheduled());
    assert_eq!(harness.resize.active_subscriptions(), 0);
    assert_eq!(harness.resize.unsubscribes(), 1);
    assert!(!liveness.is_alive());
    assert!(surface.children().is_empty());
    assert_eq!(
        harness.journal().count(|e| *e == Event::RendererDisposed),
        1
    );
    assert_eq!(
        harness.journal().count(|e| *e == Event::ControlsDisposed),
        1
    );
    assert!(harness.sink.errors().is_empty());
}

#[test]
fn teardown_while_session_is_borrowed_releases_on_last_drop() {
    let harness = Harness::new();
    let (mut host, surface) = mounted(&harness, 800, 600);
    let session = host.session().expect("session");
    {
        let held = session.borrow();
        host.teardown();
        assert!(!held.is_released());
    }
    assert!(harness.sink.contains(Severity::Warn, "release deferred"));
    assert!(!harness.scheduler.is_scheduled());
    assert_eq!(harness.resize.active_subscriptions(), 0);

    drop(session);
    drop(host);
    assert!(surface.children().is_empty());
    assert_eq!(
        harness.journal().count(|e| *e == Event::RendererDisposed),
        1
    );
    assert_eq!(
        harness.journal().count(|e| *e == Event::ControlsDisposed),
        1
    );
}

#[test]
fn teardown_before_initialize_is_harmless() {
    let harness = Harness::new();
    let mut host = ViewportHost::new(harness.platform());
    host.teardown();
    host.teardown();
    assert_eq!(harness.scheduler.cancels(), 0);
    assert_eq!(harness.resize.unsubscribes(), 0);
    assert!(matches!(
        host.initialize(Some(HeadlessSurface::new(1, 1)), &ViewportSetup::default()),
        Err(ViewportError::TornDown)
    ));
}

#[test]
fn resize_after_teardown_is_skipped() {
    let harness = Harness::new();
    let (mut host, surface) = mounted(&harness, 800, 600);
    host.teardown();
    surface.set_content_box(100, 100);
    harness.resize.fire();
    host.handle_resize();
    assert!(harness.journal().renders().is_empty());
}

#[test]
fn frame_queued_before_teardown_does_not_render() {
    let harness = Harness::new();
    let (mut host, _surface) = mounted(&harness, 800, 600);
    let queued = harness.scheduler.take_queued();
    host.teardown();
    if let Some(mut frame) = queued {
        frame();
    }
    assert!(harness.journal().renders().is_empty());
}

#[test]
fn dropping_the_host_tears_it_down() {
    let harness = Harness::new();
    let (host, surface) = mounted(&harness, 800, 600);
    drop(host);
    assert_eq!(harness.resize.active_subscriptions(), 0);
    assert_eq!(harness.scheduler.cancels(), 1);
    assert!(surface.children().is_empty());
}

#[test]
fn backend_failure_releases_partial_construction() {
    let harness = Harness::new();
    harness.backend.fail_at(Some(FailAt::Controls));
    let surface = HeadlessSurface::new(800, 600);
    let mut host = ViewportHost::new(harness.platform());

    let err = host.initialize(Some(surface.clone()), &ViewportSetup::default());
    assert!(matches!(err, Err(ViewportError::Backend(_))));
    assert!(surface.children().is_empty());
    assert_eq!(
        harness.journal().count(|e| *e == Event::RendererDisposed),
        1
    );
    assert_eq!(harness.resize.active_subscriptions(), 0);
    assert_eq!(harness.sink.errors().len(), 1);
}
