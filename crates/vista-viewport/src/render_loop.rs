// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Render loop driver: `Idle → Starting → Running → Stopped`.
//!
//! The driver never times frames itself. A [`FrameScheduler`] (display
//! refresh in the browser, single-stepping in tests) invokes the frame
//! callback; the callback re-checks the loop state so a frame queued before
//! `stop` never runs afterwards.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use thiserror::Error;

/// Callback invoked once per display refresh.
pub type FrameCallback = Box<dyn FnMut()>;

/// Source of frame pacing (e.g. `requestAnimationFrame`).
pub trait FrameScheduler {
    /// Begin invoking `frame` once per refresh until [`FrameScheduler::cancel`].
    fn start(&self, frame: FrameCallback);

    /// Stop invoking the current callback and drop it.
    fn cancel(&self);
}

/// Something that renders one complete frame.
pub trait FramePass {
    /// Whether every resource a frame touches is constructed and live.
    fn is_ready(&self) -> bool;

    /// Execute one synchronous frame.
    fn run_frame(&mut self);
}

/// Loop lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// No frames scheduled.
    Idle,
    /// Scheduled; first frame not yet executed.
    Starting,
    /// At least one frame executed.
    Running,
    /// Terminal. A new session starts from a fresh `Idle` driver.
    Stopped,
}

/// Errors starting the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoopError {
    /// The frame pass is missing or not ready.
    #[error("render loop cannot start: scene not ready")]
    NotReady,
    /// `start` called on a loop that is already scheduled.
    #[error("render loop already started")]
    AlreadyStarted,
    /// `start` called after `stop`.
    #[error("render loop stopped; start a new session")]
    Terminal,
}

/// Drives one [`FramePass`] through a [`FrameScheduler`].
pub struct RenderLoop {
    state: Rc<Cell<LoopState>>,
    scheduler: Rc<dyn FrameScheduler>,
    frames: Rc<Cell<u64>>,
}

impl RenderLoop {
    /// Idle driver on `scheduler`.
    pub fn new(scheduler: Rc<dyn FrameScheduler>) -> Self {
        Self {
            state: Rc::new(Cell::new(LoopState::Idle)),
            scheduler,
            frames: Rc::new(Cell::new(0)),
        }
    }

    /// Current state.
    pub fn state(&self) -> LoopState {
        self.state.get()
    }

    /// Frames executed so far.
    pub fn frames(&self) -> u64 {
        self.frames.get()
    }

    /// Schedule `pass`. Holds it weakly; a dropped pass ends frames silently.
    pub fn start(&mut self, pass: Weak<RefCell<dyn FramePass>>) -> Result<(), LoopError> {
        match self.state.get() {
            LoopState::Idle => {}
            LoopState::Starting | LoopState::Running => return Err(LoopError::AlreadyStarted),
            LoopState::Stopped => return Err(LoopError::Terminal),
        }
        let Some(live) = pass.upgrade() else {
            return Err(LoopError::NotReady);
        };
        let ready = live.try_borrow().is_ok_and(|p| p.is_ready());
        drop(live);
        if !ready {
            return Err(LoopError::NotReady);
        }

        self.state.set(LoopState::Starting);
        let state = Rc::clone(&self.state);
        let frames = Rc::clone(&self.frames);
        self.scheduler.start(Box::new(move || {
            if matches!(state.get(), LoopState::Stopped | LoopState::Idle) {
                return;
            }
            let Some(pass) = pass.upgrade() else {
                return;
            };
            // Busy with a load callback or teardown: skip this frame.
            let Ok(mut pass) = pass.try_borrow_mut() else {
                return;
            };
            if !pass.is_ready() {
                return;
            }
            if state.get() == LoopState::Starting {
                state.set(LoopState::Running);
            }
            pass.run_frame();
            frames.set(frames.get() + 1);
        }));
        Ok(())
    }

    /// Stop the loop. Idempotent; the scheduler is only cancelled when this
    /// driver actually scheduled frames.
    pub fn stop(&mut self) {
        let previous = self.state.replace(LoopState::Stopped);
        if matches!(previous, LoopState::Starting | LoopState::Running) {
            self.scheduler.cancel();
        }
    }
}

impl std::fmt::Debug for RenderLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("state", &self.state.get())
            .field("frames", &self.frames.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Stepper {
        frame: RefCell<Option<FrameCallback>>,
        cancels: Cell<u32>,
    }

    impl Stepper {
        fn step(&self) -> bool {
            let taken = self.frame.borrow_mut().take();
            match taken {
                Some(mut cb) => {
                    cb();
                    let mut slot = self.frame.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(cb);
                    }
                    true
                }
                None => false,
            }
        }
    }

    impl FrameScheduler for Stepper {
        fn start(&self, frame: FrameCallback) {
            *self.frame.borrow_mut() = Some(frame);
        }

        fn cancel(&self) {
            self.cancels.set(self.cancels.get() + 1);
            self.frame.borrow_mut().take();
        }
    }

    #[derive(Default)]
    struct Pass {
        ready: bool,
        frames: u32,
    }

    impl FramePass for Pass {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn run_frame(&mut self) {
            self.frames += 1;
        }
    }

    fn ready_pass() -> Rc<RefCell<Pass>> {
        Rc::new(RefCell::new(Pass {
            ready: true,
            frames: 0,
        }))
    }

    fn weak(pass: &Rc<RefCell<Pass>>) -> Weak<RefCell<dyn FramePass>> {
        let pass: Rc<RefCell<dyn FramePass>> = pass.clone();
        Rc::downgrade(&pass)
    }

    #[test]
    fn start_transitions_through_starting_to_running() {
        let sched = Rc::new(Stepper::default());
        let mut lp = RenderLoop::new(sched.clone());
        let pass = ready_pass();
        assert_eq!(lp.state(), LoopState::Idle);
        assert_eq!(lp.start(weak(&pass)), Ok(()));
        assert_eq!(lp.state(), LoopState::Starting);
        assert!(sched.step());
        assert_eq!(lp.state(), LoopState::Running);
        assert!(sched.step());
        assert_eq!(pass.borrow().frames, 2);
        assert_eq!(lp.frames(), 2);
    }

    #[test]
    fn not_ready_pass_does_not_schedule() {
        let sched = Rc::new(Stepper::default());
        let mut lp = RenderLoop::new(sched.clone());
        let pass = Rc::new(RefCell::new(Pass::default()));
        assert_eq!(lp.start(weak(&pass)), Err(LoopError::NotReady));
        assert_eq!(lp.state(), LoopState::Idle);
        assert!(!sched.step());
    }

    #[test]
    fn at_most_one_loop_per_driver() {
        let sched = Rc::new(Stepper::default());
        let mut lp = RenderLoop::new(sched);
        let pass = ready_pass();
        assert_eq!(lp.start(weak(&pass)), Ok(()));
        assert_eq!(lp.start(weak(&pass)), Err(LoopError::AlreadyStarted));
    }

    #[test]
    fn stopped_is_terminal_and_idempotent() {
        let sched = Rc::new(Stepper::default());
        let mut lp = RenderLoop::new(sched.clone());
        let pass = ready_pass();
        assert_eq!(lp.start(weak(&pass)), Ok(()));
        lp.stop();
        lp.stop();
        assert_eq!(sched.cancels.get(), 1);
        assert_eq!(lp.state(), LoopState::Stopped);
        assert_eq!(lp.start(weak(&pass)), Err(LoopError::Terminal));
    }

    #[test]
    fn stop_before_start_does_not_cancel_scheduler() {
        let sched = Rc::new(Stepper::default());
        let mut lp = RenderLoop::new(sched.clone());
        lp.stop();
        assert_eq!(sched.cancels.get(), 0);
        assert_eq!(lp.state(), LoopState::Stopped);
    }

    #[test]
    fn queued_frame_after_stop_is_inert() {
        let sched = Rc::new(Stepper::default());
        let mut lp = RenderLoop::new(sched.clone());
        let pass = ready_pass();
        assert_eq!(lp.start(weak(&pass)), Ok(()));
        // Simulate a callback already handed to the display before cancel.
        let mut queued = sched.frame.borrow_mut().take();
        lp.stop();
        if let Some(cb) = queued.as_mut() {
            cb();
        }
        assert_eq!(pass.borrow().frames, 0);
    }

    #[test]
    fn dropped_pass_ends_frames_silently() {
        let sched = Rc::new(Stepper::default());
        let mut lp = RenderLoop::new(sched.clone());
        let pass = ready_pass();
        assert_eq!(lp.start(weak(&pass)), Ok(()));
        drop(pass);
        assert!(sched.step());
        assert_eq!(lp.frames(), 0);
    }

    #[test]
    fn busy_pass_skips_the_frame_and_resumes() {
        let sched = Rc::new(Stepper::default());
        let mut lp = RenderLoop::new(sched.clone());
        let pass = ready_pass();
        assert_eq!(lp.start(weak(&pass)), Ok(()));
        {
            let _held = pass.borrow();
            assert!(sched.step());
            assert_eq!(lp.frames(), 0);
            assert_eq!(lp.state(), LoopState::Starting);
        }
        assert!(sched.step());
        assert_eq!(pass.borrow().frames, 1);
        assert_eq!(lp.state(), LoopState::Running);
    }
}
