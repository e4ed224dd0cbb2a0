// src/classification/pipeline.rs
//
// Runs each record through the rules, escalates the undecided ones to the
// remote classifier, and enriches whatever is accepted.
use anyhow::{Context, Result};
use futures::future::join_all;
use log::info;
use std::collections::HashSet;
use std::sync::Arc;

use crate::classification::doctor_name::extract_doctor_name;
use crate::classification::remote::RemoteClassifier;
use crate::classification::rules::{classify_by_rule, exclusion_reason, RuleDecision};
use crate::models::core::{Confidence, DecisionOrigin, EnrichedRecord, RawRecord};
use crate::models::stats_models::{ClassificationStats, RecordOutcome};
use crate::storage::RecordStore;
use crate::utils::config::BatchConfig;
use crate::utils::logging::ClassificationLogger;
use crate::utils::progress_config::ProgressConfig;

pub struct ClassificationPipeline {
    remote: Arc<dyn RemoteClassifier>,
    logger: ClassificationLogger,
    progress: ProgressConfig,
}

impl ClassificationPipeline {
    pub fn new(remote: Arc<dyn RemoteClassifier>) -> Self {
        Self {
            remote,
            logger: ClassificationLogger::new(),
            progress: ProgressConfig::disabled(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressConfig) -> Self {
        self.progress = progress;
        self
    }

    pub fn logger(&self) -> &ClassificationLogger {
        &self.logger
    }

    /// Classifies one record. Never fails: remote errors become
    /// `RecordOutcome::Failed` so a bad record cannot abort its batch.
    pub async fn classify_outcome(&self, record: &RawRecord) -> RecordOutcome {
        let name = record.name.as_str();
        match classify_by_rule(name) {
            RuleDecision::Excluded => {
                self.logger.log_rule_exclude(name, exclusion_reason(name).as_deref());
                RecordOutcome::RuleExcluded
            }
            RuleDecision::Accepted => {
                let doctor_name = extract_doctor_name(name);
                self.logger.log_rule_accept(name, doctor_name.as_deref());
                enrich(record, Confidence::High, DecisionOrigin::RuleAccept, doctor_name)
            }
            RuleDecision::Undecided => {
                self.logger.log_remote_request(name);
                match self.remote.classify_remote(name).await {
                    Ok(result) => {
                        self.logger.log_remote_result(name, &result);
                        if result.is_private_clinic() {
                            let doctor_name = result
                                .doctor_name
                                .clone()
                                .filter(|n| !n.trim().is_empty())
                                .or_else(|| extract_doctor_name(name));
                            enrich(record, result.confidence, DecisionOrigin::RemoteModel, doctor_name)
                        } else {
                            RecordOutcome::RemoteRejected {
                                category: result.category,
                            }
                        }
                    }
                    Err(e) => {
                        self.logger.log_remote_failure(name, &e);
                        RecordOutcome::Failed { error: e.to_string() }
                    }
                }
            }
        }
    }

    pub async fn classify(&self, record: &RawRecord) -> Option<EnrichedRecord> {
        self.classify_outcome(record).await.into_record()
    }

    /// Classifies `records` in groups of `batch.batch_size`, concurrently
    /// within a group, pausing `batch.delay` between groups. Outcomes come
    /// back in input order.
    pub async fn classify_in_batches(&self, records: &[RawRecord], batch: &BatchConfig) -> Vec<RecordOutcome> {
        let batch_size = batch.batch_size.max(1);
        let total_batches = (records.len() + batch_size - 1) / batch_size;
        self.logger
            .log_batch_processing_start(records.len(), batch_size, total_batches);

        let pb = self.progress.create_progress_bar(records.len());
        let mut outcomes = Vec::with_capacity(records.len());

        for (index, chunk) in records.chunks(batch_size).enumerate() {
            self.logger.log_batch_progress(index + 1, total_batches, chunk.len());

            let results = join_all(chunk.iter().map(|record| self.classify_outcome(record))).await;
            outcomes.extend(results);

            if let Some(pb) = &pb {
                pb.inc(chunk.len() as u64);
            }

            if index + 1 < total_batches && !batch.delay.is_zero() {
                self.logger.log_batch_pause(batch.delay);
                tokio::time::sleep(batch.delay).await;
            }
        }

        if let Some(pb) = pb {
            pb.finish_with_message("Classification complete");
        }
        outcomes
    }
}

/// Rule accepts are always `High`; remote accepts carry the model's confidence.
fn enrich(record: &RawRecord, confidence: Confidence, origin: DecisionOrigin, doctor_name: Option<String>) -> RecordOutcome {
    RecordOutcome::Kept(EnrichedRecord::new(record, confidence, origin, doctor_name))
}

/// Keeps the first record per dedup key. Returns the survivors and the
/// number dropped.
pub fn dedupe_within_batch(records: Vec<EnrichedRecord>) -> (Vec<EnrichedRecord>, usize) {
    let before = records.len();
    let mut keys = HashSet::with_capacity(before);
    let unique: Vec<EnrichedRecord> = records.into_iter().filter(|r| keys.insert(r.dedup_key())).collect();
    let dropped = before - unique.len();
    (unique, dropped)
}

/// Full run: skip stored records, classify the rest, dedupe, save.
pub async fn run_classification(
    records: Vec<RawRecord>,
    store: &mut dyn RecordStore,
    pipeline: &ClassificationPipeline,
    batch: &BatchConfig,
) -> Result<ClassificationStats> {
    let received = records.len();
    let fresh: Vec<RawRecord> = records
        .into_iter()
        .filter(|r| !store.is_seen(&r.dedup_key()))
        .collect();
    let skipped_seen = received - fresh.len();
    pipeline.logger().log_skipped_seen(skipped_seen);

    let outcomes = pipeline.classify_in_batches(&fresh, batch).await;
    let mut stats = ClassificationStats::from_outcomes(&outcomes);
    stats.skipped_seen = skipped_seen;

    let kept: Vec<EnrichedRecord> = outcomes.into_iter().filter_map(RecordOutcome::into_record).collect();
    let (unique, duplicates) = dedupe_within_batch(kept);
    stats.duplicates = duplicates;
    pipeline.logger().log_duplicates(duplicates);

    let saved = store.save(&unique).context("Failed to save classified records")?;
    pipeline.logger().log_summary(&stats, saved);
    info!("Run finished: {} of {} input records kept", unique.len(), received);
    Ok(stats)
}
