// src/storage/mod.rs
//
// Downstream collaborator: persists accepted records, idempotent under
// the (lower(name), normalized phone) key.
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::core::{DedupKey, EnrichedRecord};

pub trait RecordStore {
    fn is_seen(&self, key: &DedupKey) -> bool;

    /// Persists records whose key is not stored yet. Returns how many were written.
    fn save(&mut self, records: &[EnrichedRecord]) -> Result<usize>;
}

#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: Vec<EnrichedRecord>,
    seen: HashSet<DedupKey>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }
}

impl RecordStore for InMemoryRecordStore {
    fn is_seen(&self, key: &DedupKey) -> bool {
        self.seen.contains(key)
    }

    fn save(&mut self, records: &[EnrichedRecord]) -> Result<usize> {
        let mut written = 0;
        for record in records {
            if self.seen.insert(record.dedup_key()) {
                self.records.push(record.clone());
                written += 1;
            }
        }
        Ok(written)
    }
}

/// One JSON object per line. Existing keys are loaded on open so
/// reruns over the same input append nothing.
#[derive(Debug)]
pub struct JsonlRecordStore {
    path: PathBuf,
    seen: HashSet<DedupKey>,
}

impl JsonlRecordStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
        }

        let mut seen = HashSet::new();
        if path.exists() {
            let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
            for (line_no, line) in BufReader::new(file).lines().enumerate() {
                let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<EnrichedRecord>(&line) {
                    Ok(record) => {
                        seen.insert(record.dedup_key());
                    }
                    Err(e) => warn!(
                        "Skipping unreadable line {} in {}: {}",
                        line_no + 1,
                        path.display(),
                        e
                    ),
                }
            }
            info!("Loaded {} stored records from {}", seen.len(), path.display());
        }

        Ok(Self { path, seen })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl RecordStore for JsonlRecordStore {
    fn is_seen(&self, key: &DedupKey) -> bool {
        self.seen.contains(key)
    }

    fn save(&mut self, records: &[EnrichedRecord]) -> Result<usize> {
        let fresh: Vec<&EnrichedRecord> = {
            let mut batch_keys = HashSet::new();
            records
                .iter()
                .filter(|r| {
                    let key = r.dedup_key();
                    !self.seen.contains(&key) && batch_keys.insert(key)
                })
                .collect()
        };
        if fresh.is_empty() {
            debug!("Nothing new to write to {}", self.path.display());
            return Ok(0);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {} for append", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        for record in &fresh {
            serde_json::to_writer(&mut writer, record).context("Failed to serialize record")?;
            writer.write_all(b"\n")?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        for record in &fresh {
            self.seen.insert(record.dedup_key());
        }
        Ok(fresh.len())
    }
}
