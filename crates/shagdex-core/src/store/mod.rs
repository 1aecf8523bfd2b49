//! Record Store: loads the static archive snapshot once at process start.
//! The table is read-only for the life of the process; the only mutation
//! path is the offline merge procedure in [`merge`], which produces a new
//! snapshot consumed by the next start.

pub mod csv;
pub mod merge;

use crate::errors::LoadError;
use crate::model::{ContestRecord, RecordRow, JUDGE_SLOTS};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Snapshot column set. Loading fails closed if any of these is absent.
pub const REQUIRED_COLUMNS: [&str; 16] = [
    "Archive ID",
    "Contest",
    "Organization",
    "Year",
    "Host Club",
    "Placement",
    "Division",
    "Female Name",
    "Male Name",
    "Couple Name",
    "Judge 1",
    "Judge 2",
    "Judge 3",
    "Judge 4",
    "Judge 5",
    "Record ID",
];

/// The loaded archive. Shared read-only across all requests.
#[derive(Debug, Clone)]
pub struct RecordSet {
    records: Vec<ContestRecord>,
    fingerprint: String,
}

/// Load the snapshot. All-or-nothing: either a complete, fully-typed table
/// comes back, or the store reports itself unloaded via the error.
pub fn load(path: &Path) -> Result<RecordSet, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let set = parse_snapshot(&raw)?;
    info!(
        records = set.len(),
        fingerprint = %&set.fingerprint()[..12],
        path = %path.display(),
        "loaded archive snapshot"
    );
    Ok(set)
}

/// Parse snapshot text. Split out of [`load`] so the merge procedure and
/// tests can go through the same validation.
pub fn parse_snapshot(raw: &str) -> Result<RecordSet, LoadError> {
    let mut lines = raw.lines().enumerate();
    let (_, header_line) = lines.next().ok_or_else(|| LoadError::SchemaMismatch {
        missing: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
    })?;

    let headers = csv::parse_line(header_line);
    let index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim(), i))
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !index.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::SchemaMismatch { missing });
    }

    let col = |name: &str| index[name];
    let mut records = Vec::new();

    for (line_no, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields = csv::parse_line(line);
        let field = |name: &str| -> String {
            fields
                .get(col(name))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let optional = |name: &str| -> Option<String> {
            let v = field(name);
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        };

        let year: i32 = field("Year").parse().map_err(|_| LoadError::MalformedRow {
            line: line_no + 1,
            reason: format!("unparseable Year '{}'", field("Year")),
        })?;
        let placement: u32 = field("Placement")
            .parse()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| LoadError::MalformedRow {
                line: line_no + 1,
                reason: format!("Placement must be a positive integer, got '{}'", field("Placement")),
            })?;
        let archive_id = field("Archive ID");
        if archive_id.is_empty() {
            return Err(LoadError::MalformedRow {
                line: line_no + 1,
                reason: "empty Archive ID".to_string(),
            });
        }

        let mut judges: [Option<String>; JUDGE_SLOTS] = Default::default();
        for (slot, judge) in judges.iter_mut().enumerate() {
            *judge = optional(&format!("Judge {}", slot + 1));
        }

        records.push(ContestRecord {
            archive_id,
            contest_name: optional("Contest"),
            organization: field("Organization"),
            year,
            host_club: optional("Host Club"),
            placement,
            division: field("Division"),
            female_name: optional("Female Name"),
            male_name: optional("Male Name"),
            couple_name: optional("Couple Name"),
            judges,
            record_id: field("Record ID"),
        });
    }

    let fingerprint = hex::encode(Sha256::digest(raw.as_bytes()));
    Ok(RecordSet {
        records,
        fingerprint,
    })
}

impl RecordSet {
    /// For tests and the merge procedure.
    pub fn from_records(records: Vec<ContestRecord>) -> Self {
        Self {
            records,
            fingerprint: String::new(),
        }
    }

    pub fn records(&self) -> &[ContestRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// sha256 of the snapshot bytes; used for logging, never for answers.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// First `n` rows in source order. Context priming only; statistical
    /// answers always go through the query/analytics executors.
    pub fn sample(&self, n: usize) -> &[ContestRecord] {
        &self.records[..n.min(self.records.len())]
    }

    pub fn sample_rows(&self, n: usize) -> Vec<RecordRow> {
        self.sample(n).iter().map(RecordRow::from_record).collect()
    }

    /// Textual overview of the table for the oracle's system prompt:
    /// totals, year span, organization and division counts, most frequent
    /// contests and couples.
    pub fn knowledge_summary(&self) -> String {
        if self.records.is_empty() {
            return "The archive is empty.".to_string();
        }

        let min_year = self.records.iter().map(|r| r.year).min().unwrap_or(0);
        let max_year = self.records.iter().map(|r| r.year).max().unwrap_or(0);

        let orgs = counted(self.records.iter().map(|r| r.organization.as_str()));
        let divisions = counted(self.records.iter().map(|r| r.division.as_str()));
        let contests = counted(
            self.records
                .iter()
                .filter_map(|r| r.contest_name.as_deref()),
        );
        let couples = counted(self.records.iter().filter_map(|r| r.couple_name.as_deref()));

        let mut out = String::new();
        out.push_str("CONTEST ARCHIVE OVERVIEW\n");
        out.push_str(&format!("- Total records: {}\n", self.records.len()));
        out.push_str(&format!("- Time period: {min_year}-{max_year}\n"));
        out.push_str(&format!("- Organizations: {}\n", format_counts(&orgs, orgs.len())));
        out.push_str(&format!(
            "- Divisions: {}\n",
            format_counts(&divisions, divisions.len())
        ));
        out.push_str("\nMOST FREQUENT CONTESTS:\n");
        for (name, count) in contests.iter().take(10) {
            out.push_str(&format!("- {name}: {count} entries\n"));
        }
        out.push_str("\nMOST FREQUENT COUPLES (by contest entries):\n");
        for (name, count) in couples.iter().take(15) {
            out.push_str(&format!("- {name}: {count} entries\n"));
        }
        out.push_str("\nDIVISION HIERARCHY (typical progression): Junior -> Novice -> Amateur -> Pro\n");
        out.push_str("Non-Pro and Overall are special categories.\n");
        out.push_str("Organizations: CSA (regional competitions), NSDC (national championship).\n");
        out
    }

    /// Serialize back to the snapshot format with the canonical column order.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(&REQUIRED_COLUMNS.join(","));
        out.push('\n');
        for r in &self.records {
            let blank = String::new();
            let opt = |v: &Option<String>| csv::quote(v.as_deref().unwrap_or(""));
            let cells = [
                csv::quote(&r.archive_id),
                opt(&r.contest_name),
                csv::quote(&r.organization),
                r.year.to_string(),
                opt(&r.host_club),
                r.placement.to_string(),
                csv::quote(&r.division),
                opt(&r.female_name),
                opt(&r.male_name),
                opt(&r.couple_name),
                csv::quote(r.judges[0].as_ref().unwrap_or(&blank)),
                csv::quote(r.judges[1].as_ref().unwrap_or(&blank)),
                csv::quote(r.judges[2].as_ref().unwrap_or(&blank)),
                csv::quote(r.judges[3].as_ref().unwrap_or(&blank)),
                csv::quote(r.judges[4].as_ref().unwrap_or(&blank)),
                csv::quote(&r.record_id),
            ];
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }
}

/// Count distinct values, sorted by count descending then name for
/// deterministic output.
fn counted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    let mut pairs: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs
}

fn format_counts(pairs: &[(String, usize)], take: usize) -> String {
    pairs
        .iter()
        .take(take)
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}
