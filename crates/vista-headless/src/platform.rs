// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic stand-ins for display refresh, window resize and time.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use vista_viewport::{FrameCallback, FrameScheduler, ResizeSource, ResizeSubscription, TimeSource};

#[derive(Default)]
struct SchedulerState {
    frame: RefCell<Option<FrameCallback>>,
    generation: Cell<u64>,
    starts: Cell<u32>,
    cancels: Cell<u32>,
}

/// Frame scheduler that only runs frames when stepped.
#[derive(Clone, Default)]
pub struct ManualScheduler(Rc<SchedulerState>);

impl ManualScheduler {
    /// Idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame. Returns `false` when nothing is scheduled.
    pub fn step(&self) -> bool {
        let taken = self.0.frame.borrow_mut().take();
        let Some(mut frame) = taken else {
            return false;
        };
        let generation = self.0.generation.get();
        frame();
        // Keep the callback unless it was cancelled or replaced while running.
        let mut slot = self.0.frame.borrow_mut();
        if slot.is_none() && self.0.generation.get() == generation {
            *slot = Some(frame);
        }
        true
    }

    /// Run up to `n` frames; returns how many ran.
    pub fn step_n(&self, n: usize) -> usize {
        (0..n).take_while(|_| self.step()).count()
    }

    /// Whether a callback is registered.
    pub fn is_scheduled(&self) -> bool {
        self.0.frame.borrow().is_some()
    }

    /// Number of `start` calls.
    pub fn starts(&self) -> u32 {
        self.0.starts.get()
    }

    /// Number of `cancel` calls.
    pub fn cancels(&self) -> u32 {
        self.0.cancels.get()
    }

    /// Take the registered callback without running it, as if the display had
    /// already queued it.
    pub fn take_queued(&self) -> Option<FrameCallback> {
        self.0.frame.borrow_mut().take()
    }
}

impl FrameScheduler for ManualScheduler {
    fn start(&self, frame: FrameCallback) {
        self.0.starts.set(self.0.starts.get() + 1);
        self.0.generation.set(self.0.generation.get() + 1);
        *self.0.frame.borrow_mut() = Some(frame);
    }

    fn cancel(&self) {
        self.0.cancels.set(self.0.cancels.get() + 1);
        self.0.generation.set(self.0.generation.get() + 1);
        self.0.frame.borrow_mut().take();
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("scheduled", &self.is_scheduled())
            .field("starts", &self.starts())
            .field("cancels", &self.cancels())
            .finish()
    }
}

#[derive(Default)]
struct ResizeState {
    handlers: RefCell<BTreeMap<u64, Box<dyn FnMut()>>>,
    removed_while_firing: RefCell<Vec<u64>>,
    next: Cell<u64>,
    unsubscribes: Cell<u32>,
}

/// Resize signal fired by hand.
#[derive(Clone, Default)]
pub struct ManualResize(Rc<ResizeState>);

impl ManualResize {
    /// Signal with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notify every subscriber.
    pub fn fire(&self) {
        let mut firing = std::mem::take(&mut *self.0.handlers.borrow_mut());
        for handler in firing.values_mut() {
            handler();
        }
        let removed = std::mem::take(&mut *self.0.removed_while_firing.borrow_mut());
        let mut handlers = self.0.handlers.borrow_mut();
        for (id, handler) in firing {
            if !removed.contains(&id) {
                handlers.entry(id).or_insert(handler);
            }
        }
    }

    /// Live subscriptions.
    pub fn active_subscriptions(&self) -> usize {
        self.0.handlers.borrow().len()
    }

    /// Number of `unsubscribe` calls.
    pub fn unsubscribes(&self) -> u32 {
        self.0.unsubscribes.get()
    }
}

impl ResizeSource for ManualResize {
    fn subscribe(&self, handler: Box<dyn FnMut()>) -> ResizeSubscription {
        let id = self.0.next.get();
        self.0.next.set(id + 1);
        self.0.handlers.borrow_mut().insert(id, handler);
        ResizeSubscription(id)
    }

    fn unsubscribe(&self, subscription: ResizeSubscription) {
        self.0.unsubscribes.set(self.0.unsubscribes.get() + 1);
        if self.0.handlers.borrow_mut().remove(&subscription.0).is_none() {
            self.0.removed_while_firing.borrow_mut().push(subscription.0);
        }
    }
}

impl std::fmt::Debug for ManualResize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualResize")
            .field("active", &self.active_subscriptions())
            .field("unsubscribes", &self.unsubscribes())
            .finish()
    }
}

/// Time source advanced by hand.
#[derive(Clone, Debug, Default)]
pub struct ManualTime(Rc<Cell<Duration>>);

impl ManualTime {
    /// Source reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }

    /// Move time forward by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Jump to an absolute reading (may go backwards).
    pub fn set(&self, to: Duration) {
        self.0.set(to);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_inside_frame_is_honoured() {
        let sched = ManualScheduler::new();
        let inner = sched.clone();
        sched.start(Box::new(move || inner.cancel()));
        assert!(sched.step());
        assert!(!sched.is_scheduled());
        assert!(!sched.step());
    }

    #[test]
    fn step_n_stops_when_idle() {
        let sched = ManualScheduler::new();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        sched.start(Box::new(move || seen.set(seen.get() + 1)));
        assert_eq!(sched.step_n(3), 3);
        sched.cancel();
        assert_eq!(sched.step_n(3), 0);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn resize_subscriptions_are_tracked() {
        let resize = ManualResize::new();
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        let sub = resize.subscribe(Box::new(move || seen.set(seen.get() + 1)));
        resize.fire();
        assert_eq!(resize.active_subscriptions(), 1);
        resize.unsubscribe(sub);
        resize.fire();
        assert_eq!(hits.get(), 1);
        assert_eq!(resize.active_subscriptions(), 0);
    }
}
