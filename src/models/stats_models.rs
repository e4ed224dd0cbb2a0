// src/models/stats_models.rs
use serde::Serialize;

use crate::models::core::{ClassificationDecision, DecisionOrigin, EnrichedRecord};

/// Per-record result of the pipeline. Every variant except `Kept`
/// surfaces as "absent" to storage; they stay distinct for logging and stats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Kept(EnrichedRecord),
    RuleExcluded,
    RemoteRejected { category: String },
    Failed { error: String },
}

impl RecordOutcome {
    pub fn into_record(self) -> Option<EnrichedRecord> {
        match self {
            RecordOutcome::Kept(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&EnrichedRecord> {
        match self {
            RecordOutcome::Kept(record) => Some(record),
            _ => None,
        }
    }

    /// Every non-kept outcome surfaces as `Excluded`.
    pub fn decision(&self) -> ClassificationDecision {
        match self {
            RecordOutcome::Kept(record) => record.decision(),
            _ => ClassificationDecision::Excluded,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationStats {
    pub total: usize,
    pub kept: usize,
    pub rule_accepted: usize,
    pub remote_accepted: usize,
    pub rule_excluded: usize,
    pub remote_rejected: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub skipped_seen: usize,
}

impl ClassificationStats {
    pub fn record(&mut self, outcome: &RecordOutcome) {
        self.total += 1;
        if let ClassificationDecision::Accepted { origin, .. } = outcome.decision() {
            self.kept += 1;
            match origin {
                DecisionOrigin::RuleAccept => self.rule_accepted += 1,
                DecisionOrigin::RemoteModel => self.remote_accepted += 1,
            }
        }
        match outcome {
            RecordOutcome::Kept(_) => {}
            RecordOutcome::RuleExcluded => self.rule_excluded += 1,
            RecordOutcome::RemoteRejected { .. } => self.remote_rejected += 1,
            RecordOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a RecordOutcome>) -> Self {
        let mut stats = Self::default();
        for outcome in outcomes {
            stats.record(outcome);
        }
        stats
    }

    /// Records classified but not kept, whatever the reason.
    pub fn discarded(&self) -> usize {
        self.rule_excluded + self.remote_rejected + self.failed
    }
}
