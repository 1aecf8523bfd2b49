use serde::{Deserialize, Serialize};

/// Number of judge slots on a contest record. Many rows (especially NSDC)
/// carry no judge data at all; absence is a valid state, not an error.
pub const JUDGE_SLOTS: usize = 5;

/// One row of the contest archive. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestRecord {
    /// Stable identifier; unique key for the offline merge procedure.
    pub archive_id: String,
    pub contest_name: Option<String>,
    /// Observed values: "CSA", "NSDC". Kept permissive on purpose.
    pub organization: String,
    pub year: i32,
    pub host_club: Option<String>,
    /// 1 is the only value meaning "win". Values 2-8 observed.
    pub placement: u32,
    /// Open string set: Junior 1, Junior 2, Novice, Amateur, Pro, Sr Pro,
    /// Non-Pro, Masters, Overall and whatever else the source contains.
    pub division: String,
    pub female_name: Option<String>,
    pub male_name: Option<String>,
    pub couple_name: Option<String>,
    pub judges: [Option<String>; JUDGE_SLOTS],
    /// Secondary identifier, distinct from `archive_id`.
    pub record_id: String,
}

impl ContestRecord {
    pub fn is_win(&self) -> bool {
        self.placement == 1
    }

    /// True when `name` appears in either name column (exact match).
    pub fn has_dancer(&self, name: &str) -> bool {
        self.male_name.as_deref() == Some(name) || self.female_name.as_deref() == Some(name)
    }

    /// Judge names present on this row, in slot order.
    pub fn present_judges(&self) -> impl Iterator<Item = &str> {
        self.judges.iter().filter_map(|j| j.as_deref())
    }

    pub fn has_judge(&self, judge: &str) -> bool {
        self.present_judges().any(|j| j == judge)
    }

    pub fn has_judge_data(&self) -> bool {
        self.present_judges().next().is_some()
    }
}

/// A bounded, display-shaped view of a record. Tool results never dump raw
/// rows; they return this subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRow {
    pub contest: Option<String>,
    pub year: i32,
    pub division: String,
    pub organization: String,
    pub placement: u32,
    pub male_name: Option<String>,
    pub female_name: Option<String>,
    pub host_club: Option<String>,
}

impl RecordRow {
    pub fn from_record(r: &ContestRecord) -> Self {
        Self {
            contest: r.contest_name.clone(),
            year: r.year,
            division: r.division.clone(),
            organization: r.organization.clone(),
            placement: r.placement,
            male_name: r.male_name.clone(),
            female_name: r.female_name.clone(),
            host_club: r.host_club.clone(),
        }
    }
}

/// Round to one decimal place. Win rates are reported at this precision
/// unless an operation states otherwise.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Round to two decimal places (win_statistics, partnership_analysis).
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Percentage with a zero-denominator guard: 0 contests means 0%, never a
/// division error.
pub fn percentage(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}
