//! Terminal palette for human-readable output
//!
//! JSON mode never styles text.

use std::sync::LazyLock;

use implflow_core::Progress;
use owo_colors::Style;

/// Styles keyed by what is being shown rather than by color
pub struct Palette {
    /// Branch names, worktree paths, plan titles
    pub branch: Style,
    /// Commit hashes, PR URLs, finished phases
    pub done: Style,
    /// Phases with outstanding tasks
    pub pending: Style,
    pub warning: Style,
    pub error: Style,
}

impl Palette {
    fn new() -> Self {
        Self {
            branch: Style::new().cyan().bold(),
            done: Style::new().green(),
            pending: Style::new().dimmed(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
        }
    }

    /// `done` once every task is checked, `pending` otherwise (including empty phases)
    pub fn for_progress(&self, progress: &Progress) -> Style {
        if progress.total > 0 && progress.completed == progress.total {
            self.done
        } else {
            self.pending
        }
    }
}

pub static PALETTE: LazyLock<Palette> = LazyLock::new(Palette::new);
