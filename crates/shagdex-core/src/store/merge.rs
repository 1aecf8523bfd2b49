//! Offline merge/update procedure. Never invoked on the request path: it
//! rewrites the snapshot file consumed by the next process start.
//!
//! Rows in the batch whose `archive_id` already exists replace the stored
//! record; new ids are appended. The merged table is re-sorted by
//! (year, contest, division, placement) for deterministic diffing, and a
//! timestamped backup of the pre-merge snapshot is written before any
//! overwrite.

use super::RecordSet;
use crate::model::ContestRecord;
use anyhow::Context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub updated: usize,
    pub added: usize,
    pub total: usize,
    pub backup: Option<PathBuf>,
}

/// Merge `batch_path` into the snapshot at `snapshot_path`, in place.
pub fn merge_snapshot(
    snapshot_path: &Path,
    batch_path: &Path,
    backup: bool,
) -> anyhow::Result<MergeSummary> {
    let existing = super::load(snapshot_path)
        .with_context(|| format!("loading existing snapshot {}", snapshot_path.display()))?;
    let batch = super::load(batch_path)
        .with_context(|| format!("loading batch {}", batch_path.display()))?;

    let backup_path = if backup {
        let path = backup_path_for(snapshot_path);
        std::fs::copy(snapshot_path, &path)
            .with_context(|| format!("writing backup {}", path.display()))?;
        info!(backup = %path.display(), "pre-merge backup written");
        Some(path)
    } else {
        None
    };

    let (merged, updated, added) = merge_records(
        existing.records().to_vec(),
        batch.records().to_vec(),
    );

    let merged_set = RecordSet::from_records(merged);
    std::fs::write(snapshot_path, merged_set.to_csv())
        .with_context(|| format!("writing merged snapshot {}", snapshot_path.display()))?;

    let summary = MergeSummary {
        updated,
        added,
        total: merged_set.len(),
        backup: backup_path,
    };
    info!(
        updated = summary.updated,
        added = summary.added,
        total = summary.total,
        "snapshot merged"
    );
    Ok(summary)
}

/// Pure merge over in-memory records: de-dup the batch by `archive_id`
/// (keep-last), replace colliding ids field-by-field, append new ids, then
/// re-sort. Exposed separately so the row-count invariants are testable
/// without touching the filesystem.
pub fn merge_records(
    existing: Vec<ContestRecord>,
    batch: Vec<ContestRecord>,
) -> (Vec<ContestRecord>, usize, usize) {
    // Intra-batch de-duplication, keep-last.
    let mut deduped: Vec<ContestRecord> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for record in batch {
        match seen.get(&record.archive_id) {
            Some(&i) => deduped[i] = record,
            None => {
                seen.insert(record.archive_id.clone(), deduped.len());
                deduped.push(record);
            }
        }
    }

    let mut merged = existing;
    let index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, r)| (r.archive_id.clone(), i))
        .collect();

    let mut updated = 0;
    let mut added = 0;
    for record in deduped {
        match index.get(&record.archive_id) {
            Some(&i) => {
                merged[i] = record;
                updated += 1;
            }
            None => {
                merged.push(record);
                added += 1;
            }
        }
    }

    merged.sort_by(|a, b| {
        a.year
            .cmp(&b.year)
            .then_with(|| a.contest_name.cmp(&b.contest_name))
            .then_with(|| a.division.cmp(&b.division))
            .then_with(|| a.placement.cmp(&b.placement))
    });

    (merged, updated, added)
}

fn backup_path_for(snapshot_path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let stem = snapshot_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "snapshot".to_string());
    snapshot_path.with_file_name(format!("{stem}_backup_{stamp}.csv"))
}
