//! Terminal progress for the matching and rendering stages

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::LazyLock;

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] {{prefix:>10}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Coordinates one progress bar per pipeline stage
///
/// Stages run one after another; starting a new stage finishes the previous
/// one. A hidden manager tracks positions without drawing anything.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    stage: Option<ProgressBar>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a manager drawing to stderr
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            stage: None,
        }
    }

    /// Create a manager that never draws
    pub fn hidden() -> Self {
        Self {
            multi_progress: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            stage: None,
        }
    }

    /// Begin a stage of `total` steps
    pub fn start_stage(&mut self, label: &str, total: usize) {
        self.finish_stage();
        let bar = ProgressBar::new(total as u64);
        bar.set_style(STAGE_STYLE.clone());
        bar.set_prefix(label.to_string());
        self.stage = Some(self.multi_progress.add(bar));
    }

    /// Advance the current stage by one step
    pub fn advance(&self) {
        if let Some(ref bar) = self.stage {
            bar.inc(1);
        }
    }

    /// Steps completed in the current stage
    pub fn position(&self) -> u64 {
        self.stage.as_ref().map_or(0, ProgressBar::position)
    }

    /// Finish the current stage, if any
    pub fn finish_stage(&mut self) {
        if let Some(bar) = self.stage.take() {
            bar.finish();
        }
    }

    /// Clean up all progress displays
    pub fn finish(&mut self) {
        self.finish_stage();
        let _ = self.multi_progress.clear();
    }
}
