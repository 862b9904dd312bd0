// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use proptest::prelude::*;
use vista_headless::{Harness, HeadlessSurface, ManualTime};
use vista_viewport::{Clock, Liveness, Progress, ViewportHost, ViewportSetup};

proptest! {
    #[test]
    fn resize_keeps_aspect_and_bumps_projection(
        sizes in prop::collection::vec((1_u32..4000, 1_u32..4000), 1..12)
    ) {
        let harness = Harness::new();
        let surface = HeadlessSurface::new(640, 480);
        let mut host = ViewportHost::new(harness.platform());
        host.initialize(Some(surface.clone()), &ViewportSetup::default()).unwrap();

        let mut revision = host.with_session(|s| s.camera().projection_revision()).unwrap();
        for (width, height) in sizes {
            surface.set_content_box(width, height);
            harness.resize.fire();
            let (aspect, next, size) = host
                .with_session(|s| (s.camera().aspect(), s.camera().projection_revision(), s.renderer_size()))
                .unwrap();
            let expected = width as f32 / height as f32;
            prop_assert!((aspect - expected).abs() <= expected * 1e-6);
            prop_assert!(next > revision);
            prop_assert_eq!(size, (width, height));
            revision = next;
        }
    }

    #[test]
    fn clock_deltas_are_never_negative(
        readings in prop::collection::vec(0_u64..10_000, 1..32)
    ) {
        let time = ManualTime::new();
        let mut clock = Clock::new(Rc::new(time.clone()));
        let mut high_water = 0_u64;
        for ms in readings {
            time.set(Duration::from_millis(ms));
            let delta = clock.tick();
            prop_assert!(delta >= 0.0);
            prop_assert!(delta.is_finite());
            if ms <= high_water {
                prop_assert!(delta.abs() < f32::EPSILON);
            }
            high_water = high_water.max(ms);
        }
    }

    #[test]
    fn progress_is_monotonic_and_bounded(
        reports in prop::collection::vec(prop::num::f32::ANY, 0..32)
    ) {
        let seen: Rc<RefCell<Vec<f32>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut progress = Progress::new(
            Some(Box::new(move |f: f32| sink.borrow_mut().push(f))),
            Liveness::new(),
        );
        for value in reports {
            progress.report(value);
        }
        let seen = seen.borrow();
        prop_assert!(seen.iter().all(|f| (0.0..=1.0).contains(f)));
        prop_assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }
}
