//! Filter Engine: a closed specification of optional predicates, combined
//! with AND semantics only. There is no OR, NOT, or grouping.

use crate::model::ContestRecord;
use serde::{Deserialize, Serialize};

/// An unordered set of named predicates. Absent field = no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    /// The literal "Both" means unconstrained (wire compatibility).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub male_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub female_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Range is applied only when BOTH bounds are present (inclusive).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i32>,
    /// Case-insensitive substring match; rows with no contest name are
    /// skipped rather than erroring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contest: Option<String>,
}

/// The matching subset plus both counts. Counts are mandatory so callers can
/// reason about selectivity and detect empty results explicitly.
#[derive(Debug)]
pub struct Filtered<'a> {
    pub rows: Vec<&'a ContestRecord>,
    pub original_count: usize,
    pub filtered_count: usize,
}

impl FilterSpec {
    pub fn matches(&self, r: &ContestRecord) -> bool {
        if let Some(division) = &self.division {
            if r.division != *division {
                return false;
            }
        }
        if let Some(org) = &self.organization {
            if org != "Both" && r.organization != *org {
                return false;
            }
        }
        if let Some(placement) = self.placement {
            if r.placement != placement {
                return false;
            }
        }
        if let Some(male) = &self.male_name {
            if r.male_name.as_deref() != Some(male.as_str()) {
                return false;
            }
        }
        if let Some(female) = &self.female_name {
            if r.female_name.as_deref() != Some(female.as_str()) {
                return false;
            }
        }
        if let Some(year) = self.year {
            if r.year != year {
                return false;
            }
        }
        if let (Some(start), Some(end)) = (self.start_year, self.end_year) {
            if r.year < start || r.year > end {
                return false;
            }
        }
        if let Some(contest) = &self.contest {
            match &r.contest_name {
                Some(name) => {
                    if !name.to_lowercase().contains(&contest.to_lowercase()) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }
}

pub fn apply<'a>(records: &'a [ContestRecord], spec: &FilterSpec) -> Filtered<'a> {
    let rows: Vec<&ContestRecord> = records.iter().filter(|r| spec.matches(r)).collect();
    Filtered {
        original_count: records.len(),
        filtered_count: rows.len(),
        rows,
    }
}
