// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless backend and deterministic platform for vista-viewport.
//!
//! This crate provides:
//! - [`HeadlessBackend`]: renderer/controls/overlay/mixer that record calls
//! - [`ManualScheduler`], [`ManualResize`], [`ManualTime`]: step-driven platform
//! - [`MemorySource`] / [`DirSource`]: asset bytes from memory or disk
//! - [`RecordingSink`]: diagnostics captured for assertions
//! - [`Harness`]: all of the above wired into a [`Platform`]

mod backend;
pub mod fixtures;
mod platform;
mod sink;
mod source;

use std::rc::Rc;

use futures::executor::LocalPool;
use vista_viewport::Platform;

pub use backend::*;
pub use platform::*;
pub use sink::*;
pub use source::*;

/// A complete headless platform plus the executor that drives asset tasks.
pub struct Harness {
    /// Backend shared with the platform.
    pub backend: Rc<HeadlessBackend>,
    /// Frame pacing.
    pub scheduler: ManualScheduler,
    /// Resize signal.
    pub resize: ManualResize,
    /// Time.
    pub time: ManualTime,
    /// In-memory assets.
    pub source: MemorySource,
    /// Captured diagnostics.
    pub sink: Rc<RecordingSink>,
    pool: LocalPool,
}

impl Harness {
    /// Harness with a verbose recording sink and no assets.
    pub fn new() -> Self {
        Self {
            backend: Rc::new(HeadlessBackend::new()),
            scheduler: ManualScheduler::new(),
            resize: ManualResize::new(),
            time: ManualTime::new(),
            source: MemorySource::new(),
            sink: Rc::new(RecordingSink::new(true)),
            pool: LocalPool::new(),
        }
    }

    /// Platform handles for a host or controller.
    pub fn platform(&self) -> Platform<HeadlessBackend> {
        Platform {
            backend: Rc::clone(&self.backend),
            scheduler: Rc::new(self.scheduler.clone()),
            resize: Rc::new(self.resize.clone()),
            time: Rc::new(self.time.clone()),
            source: Rc::new(self.source.clone()),
            spawner: Rc::new(self.pool.spawner()),
            sink: self.sink.clone(),
        }
    }

    /// Backend journal.
    pub fn journal(&self) -> &Journal {
        self.backend.journal()
    }

    /// Run asset tasks until none can make progress.
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Advance time by `ms` and run one frame. Returns whether a frame ran.
    pub fn frame(&self, ms: u64) -> bool {
        self.time.advance_ms(ms);
        self.scheduler.step()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("scheduler", &self.scheduler)
            .field("resize", &self.resize)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
