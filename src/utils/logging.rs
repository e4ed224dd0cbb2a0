// src/utils/logging.rs - Logging helpers for the classification layers
use log::{debug, info, warn};
use std::time::{Duration, Instant};

use crate::classification::remote::{RemoteClassification, RemoteError};
use crate::models::stats_models::ClassificationStats;

/// Tags every line with the layer that produced it and the time since
/// the run started.
#[derive(Clone)]
pub struct ClassificationLogger {
    start_time: Instant,
}

impl Default for ClassificationLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassificationLogger {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    fn elapsed(&self) -> f32 {
        self.start_time.elapsed().as_secs_f32()
    }

    pub fn log_start(&self, run_id: &str, total: usize) {
        info!(
            "[PIPELINE] 🚀 Starting clinic classification (run ID: {}) for {} records",
            run_id, total
        );
    }

    pub fn log_skipped_seen(&self, count: usize) {
        if count > 0 {
            info!(
                "[PIPELINE] ⏭️  Skipping {} records already in storage [+{:.1}s]",
                count,
                self.elapsed()
            );
        }
    }

    pub fn log_batch_processing_start(&self, total: usize, batch_size: usize, batch_count: usize) {
        info!(
            "[PIPELINE] ⚙️  Processing {} records in {} batches (batch size: {})",
            total, batch_count, batch_size
        );
    }

    pub fn log_batch_progress(&self, batch_num: usize, total_batches: usize, records_in_batch: usize) {
        debug!(
            "[PIPELINE] 📦 Batch {}/{} ({} records) [+{:.1}s]",
            batch_num,
            total_batches,
            records_in_batch,
            self.elapsed()
        );
    }

    pub fn log_batch_pause(&self, delay: Duration) {
        debug!("[PIPELINE] ⏸️  Pausing {:.1}s before next batch", delay.as_secs_f32());
    }

    pub fn log_rule_exclude(&self, name: &str, keyword: Option<&str>) {
        info!(
            "[RULE-EXCLUDE] 🚫 '{}' (keyword: {})",
            name,
            keyword.unwrap_or("unknown")
        );
    }

    pub fn log_rule_accept(&self, name: &str, doctor_name: Option<&str>) {
        info!(
            "[RULE-ACCEPT] ✅ '{}' (doctor: {})",
            name,
            doctor_name.unwrap_or("-")
        );
    }

    pub fn log_remote_request(&self, name: &str) {
        debug!("[REMOTE] 🤖 Classifying '{}'", name);
    }

    pub fn log_remote_result(&self, name: &str, result: &RemoteClassification) {
        let emoji = if result.is_private_clinic() { "✅" } else { "🚫" };
        info!(
            "[REMOTE-RESULT] {} '{}' → {} ({}): {}",
            emoji, name, result.category, result.confidence, result.reason
        );
    }

    pub fn log_remote_failure(&self, name: &str, error: &RemoteError) {
        warn!("[REMOTE-FAIL] ❌ '{}' discarded: {}", name, error);
    }

    pub fn log_duplicates(&self, count: usize) {
        if count > 0 {
            info!("[PIPELINE] 🔁 Dropped {} duplicate records within the batch", count);
        }
    }

    pub fn log_summary(&self, stats: &ClassificationStats, saved: usize) {
        info!(
            "[PIPELINE] 📊 Classification complete in {:.1}s: {} records → {} kept ({} by rule, {} by model), {} discarded",
            self.elapsed(),
            stats.total,
            stats.kept,
            stats.rule_accepted,
            stats.remote_accepted,
            stats.discarded()
        );
        info!(
            "[PIPELINE] 🚫 Discarded: {} rule-excluded, {} rejected by model, {} failed",
            stats.rule_excluded, stats.remote_rejected, stats.failed
        );
        info!(
            "[PIPELINE] 💾 Saved {} new records ({} duplicates dropped, {} already stored)",
            saved, stats.duplicates, stats.skipped_seen
        );
    }
}
