//! Progress reporting for the resampling loop.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;

/// Receives resampling progress from the coordinating thread.
///
/// Calls happen at batch checkpoints only, never from worker threads, so
/// implementations need no synchronisation of their own.
pub trait ProgressObserver {
    fn on_start(&self, _total: usize) {}

    /// `completed` iterations of `total` have been folded into the result.
    fn on_progress(&self, completed: usize, total: usize);

    fn on_finish(&self, _total: usize) {}
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Logs a line each time another `every` resamples have completed.
#[derive(Debug)]
pub struct TracingProgress {
    every: usize,
    logged: AtomicUsize,
}

impl Default for TracingProgress {
    fn default() -> Self {
        Self::new(5)
    }
}

impl TracingProgress {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            logged: AtomicUsize::new(0),
        }
    }
}

impl ProgressObserver for TracingProgress {
    fn on_start(&self, total: usize) {
        self.logged.store(0, Ordering::Relaxed);
        info!(total, "resampling started");
    }

    fn on_progress(&self, completed: usize, total: usize) {
        let step = completed / self.every;
        if step > self.logged.load(Ordering::Relaxed) {
            self.logged.store(step, Ordering::Relaxed);
            info!(completed, total, "resampling progress");
        }
    }

    fn on_finish(&self, total: usize) {
        info!(total, "resampling finished");
    }
}
