// src/utils/progress_config.rs

use indicatif::{ProgressBar, ProgressStyle};
use std::env;

/// Progress display settings for a classification run.
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Whether to show a progress bar at all
    pub enabled: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ProgressConfig {
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Reads `PROGRESS_ENABLED`; anything unparseable keeps the bar on.
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("PROGRESS_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }

    /// A bar over `total` records if progress is enabled, None otherwise.
    pub fn create_progress_bar(&self, total: usize) -> Option<ProgressBar> {
        if !self.enabled || total == 0 {
            return None;
        }
        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")
            .map(|s| s.progress_chars("█▉▊▋▌▍▎▏  "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message("Classifying...");
        Some(pb)
    }
}
