// src/models/core.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classification::phone::normalize_phone;

/// A business listing as handed over by the retrieval step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(alias = "clinic_name")]
    pub name: String,
    #[serde(default, alias = "phone_number")]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub maps_link: Option<String>,
}

impl RawRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: None,
            address: None,
            maps_link: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_maps_link(mut self, maps_link: impl Into<String>) -> Self {
        self.maps_link = Some(maps_link.into());
        self
    }

    pub fn normalized_phone(&self) -> Option<String> {
        normalize_phone(self.phone.as_deref())
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.name, self.normalized_phone().as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Missing or unrecognized values fall back to `Low`.
    pub fn from_remote(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("high") => Confidence::High,
            Some("medium") => Confidence::Medium,
            _ => Confidence::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which layer produced an accept decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionOrigin {
    RuleAccept,
    RemoteModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationDecision {
    Excluded,
    Accepted {
        confidence: Confidence,
        origin: DecisionOrigin,
    },
}

impl ClassificationDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ClassificationDecision::Accepted { .. })
    }
}

/// The terminal artifact handed to storage. Only built for accepted records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub maps_link: Option<String>,
    pub normalized_phone: Option<String>,
    pub doctor_name: Option<String>,
    pub confidence_score: Confidence,
    pub decision_origin: DecisionOrigin,
}

impl EnrichedRecord {
    pub fn new(
        raw: &RawRecord,
        confidence_score: Confidence,
        decision_origin: DecisionOrigin,
        doctor_name: Option<String>,
    ) -> Self {
        Self {
            name: raw.name.clone(),
            phone: raw.phone.clone(),
            address: raw.address.clone(),
            maps_link: raw.maps_link.clone(),
            normalized_phone: raw.normalized_phone(),
            doctor_name,
            confidence_score,
            decision_origin,
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.name, self.normalized_phone.as_deref())
    }

    pub fn decision(&self) -> ClassificationDecision {
        ClassificationDecision::Accepted {
            confidence: self.confidence_score,
            origin: self.decision_origin,
        }
    }
}

/// Storage identity of a record: lower-cased trimmed name plus normalized phone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    pub name: String,
    pub phone: String,
}

impl DedupKey {
    pub fn new(name: &str, normalized_phone: Option<&str>) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            phone: normalized_phone.unwrap_or("").trim().to_string(),
        }
    }
}
