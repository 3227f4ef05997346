//! Terminal progress bar for the resampling loop.

use indicatif::{ProgressBar, ProgressStyle};

use dew_core::ProgressObserver;

const TEMPLATE: &str = "{spinner:.cyan} resampling [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// Draws resampling progress on stderr. Hidden when stderr is not a terminal.
#[derive(Debug, Clone)]
pub struct BarProgress {
    bar: ProgressBar,
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }

    /// A bar that never draws.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressObserver for BarProgress {
    fn on_start(&self, total: usize) {
        self.bar.reset();
        self.bar.set_length(total as u64);
    }

    fn on_progress(&self, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
    }

    fn on_finish(&self, _total: usize) {
        self.bar.finish_and_clear();
    }
}
