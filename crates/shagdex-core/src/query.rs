//! Query Executor: the catalog of lookup operations over a filtered subset.
//! Every operation returns a bounded, self-describing result, never an
//! unbounded raw dump.

use crate::errors::ToolError;
use crate::filter::{FilterSpec, Filtered};
use crate::model::{percentage, round1, round2, ContestRecord, RecordRow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Absolute ceiling on any ranked or listed result.
pub const HARD_LIMIT: u32 = 50;
pub const DEFAULT_LIMIT: u32 = 10;
/// Cap on disambiguation candidate lists.
const MAX_CANDIDATES: usize = 10;
/// Minimum similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

pub fn clamp_limit(limit: u32) -> usize {
    limit.clamp(1, HARD_LIMIT) as usize
}

/// Closed catalog of lookup operations. Adding one is a compiler-checked
/// change, not a string-typo risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    RankByWins,
    DancerProfile,
    ResolveName,
    SmartDancerLookup,
    JudgeStatistics,
    UniqueCounts,
    WinStatistics,
    PartnershipAnalysis,
    CareerStatistics,
    YearlyTrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountWhat {
    MaleDancers,
    FemaleDancers,
    AllDancers,
    Couples,
    Contests,
    Venues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    Entries,
    Wins,
}

// ---------------------------------------------------------------------------
// rank_by_wins
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

/// Count rows per name for the given gender. Agnostic to what "win" means:
/// the placement constraint, if any, comes from the caller's filter spec.
/// Ties break by first-encountered order.
pub fn rank_by_wins(filtered: &Filtered<'_>, gender: Gender, limit: usize) -> Vec<NameCount> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new(); // name -> (count, first index)
    for (i, r) in filtered.rows.iter().enumerate() {
        let name = match gender {
            Gender::Male => r.male_name.as_deref(),
            Gender::Female => r.female_name.as_deref(),
        };
        if let Some(name) = name {
            let entry = counts.entry(name).or_insert((0, i));
            entry.0 += 1;
        }
    }
    let mut ranked: Vec<(&str, usize, usize)> =
        counts.into_iter().map(|(n, (c, i))| (n, c, i)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(limit.min(HARD_LIMIT as usize))
        .map(|(name, count, _)| NameCount {
            name: name.to_string(),
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// dancer_profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Total matching rows, independent of the bounded sample below.
    pub total_matching: usize,
    pub rows: Vec<RecordRow>,
}

pub fn dancer_profile(filtered: &Filtered<'_>, limit: usize) -> Profile {
    Profile {
        total_matching: filtered.filtered_count,
        rows: filtered
            .rows
            .iter()
            .take(limit)
            .map(|r| RecordRow::from_record(r))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// resolve_name
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NameResolution {
    /// Zero matches. Includes a spelling suggestion when one is plausible.
    NotFound {
        query: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        suggestion: Option<String>,
    },
    /// Exactly one distinct name matched: expand into a full profile.
    Resolved {
        name: String,
        total_contests: usize,
        wins: usize,
        divisions: Vec<String>,
        years_active: String,
    },
    /// Two or more distinct names: return candidates, do not guess.
    Ambiguous {
        query: String,
        candidates: Vec<String>,
        match_count: usize,
    },
}

/// Case-insensitive substring match against both name columns, deduplicated
/// across the union.
pub fn resolve_name(records: &[ContestRecord], query: &str) -> Result<NameResolution, ToolError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ToolError::missing_parameter("dancer_name"));
    }
    let needle = query.to_lowercase();

    let mut matches: BTreeSet<&str> = BTreeSet::new();
    for r in records {
        for name in [r.male_name.as_deref(), r.female_name.as_deref()]
            .into_iter()
            .flatten()
        {
            if name.to_lowercase().contains(&needle) {
                matches.insert(name);
            }
        }
    }

    match matches.len() {
        0 => Ok(NameResolution::NotFound {
            query: query.to_string(),
            suggestion: spelling_suggestion(records, query),
        }),
        1 => {
            let name = matches.into_iter().next().unwrap_or_default();
            let rows: Vec<&ContestRecord> = records.iter().filter(|r| r.has_dancer(name)).collect();
            let wins = rows.iter().filter(|r| r.is_win()).count();
            Ok(NameResolution::Resolved {
                name: name.to_string(),
                total_contests: rows.len(),
                wins,
                divisions: distinct_in_order(rows.iter().map(|r| r.division.as_str())),
                years_active: year_span(&rows),
            })
        }
        n => Ok(NameResolution::Ambiguous {
            query: query.to_string(),
            candidates: matches
                .into_iter()
                .take(MAX_CANDIDATES)
                .map(str::to_string)
                .collect(),
            match_count: n,
        }),
    }
}

/// Closest known name by Jaro-Winkler similarity, if close enough to be a
/// plausible misspelling.
fn spelling_suggestion(records: &[ContestRecord], query: &str) -> Option<String> {
    let query_lower = query.to_lowercase();
    let mut best: Option<(f64, &str)> = None;
    for name in all_names(records) {
        let score = strsim::jaro_winkler(&query_lower, &name.to_lowercase());
        if score >= SUGGESTION_THRESHOLD && best.map(|(s, _)| score > s).unwrap_or(true) {
            best = Some((score, name));
        }
    }
    best.map(|(_, name)| name.to_string())
}

// ---------------------------------------------------------------------------
// smart_dancer_lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisionStat {
    pub division: String,
    pub contests: usize,
    pub wins: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartSummary {
    pub total_contests: usize,
    pub total_wins: usize,
    /// Percentage, one decimal place. 0 contests means 0, not an error.
    pub win_rate: f64,
    pub career_span: String,
    pub organizations: Vec<String>,
    pub division_breakdown: Vec<DivisionStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SmartLookup {
    NotFound {
        query: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        suggestion: Option<String>,
    },
    Ambiguous {
        query: String,
        possible_matches: Vec<String>,
        match_count: usize,
    },
    Profile {
        dancer_name: String,
        summary: SmartSummary,
        recent_contests: Vec<RecordRow>,
    },
}

/// Single-call composite for "tell me about dancer X": exact-name match
/// first, substring fallback second, candidate list when the fallback stays
/// ambiguous. Exists to answer the common case in exactly one round-trip.
pub fn smart_dancer_lookup(
    records: &[ContestRecord],
    name: &str,
    spec: &FilterSpec,
    limit: usize,
) -> Result<SmartLookup, ToolError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ToolError::missing_parameter("dancer_name"));
    }

    // 1. Exact match in either column.
    let mut rows: Vec<&ContestRecord> = records.iter().filter(|r| r.has_dancer(name)).collect();
    let mut resolved_name = name.to_string();

    if rows.is_empty() {
        // 2. Substring fallback.
        let needle = name.to_lowercase();
        let mut candidates: BTreeSet<&str> = BTreeSet::new();
        for r in records {
            for n in [r.male_name.as_deref(), r.female_name.as_deref()]
                .into_iter()
                .flatten()
            {
                if n.to_lowercase().contains(&needle) {
                    candidates.insert(n);
                }
            }
        }
        match candidates.len() {
            0 => {
                return Ok(SmartLookup::NotFound {
                    query: name.to_string(),
                    suggestion: spelling_suggestion(records, name),
                })
            }
            1 => {
                resolved_name = candidates.into_iter().next().unwrap_or_default().to_string();
                rows = records
                    .iter()
                    .filter(|r| r.has_dancer(&resolved_name))
                    .collect();
            }
            n => {
                // Multiple names: stop here, no further drilling in this call.
                return Ok(SmartLookup::Ambiguous {
                    query: name.to_string(),
                    possible_matches: candidates
                        .into_iter()
                        .take(MAX_CANDIDATES)
                        .map(str::to_string)
                        .collect(),
                    match_count: n,
                });
            }
        }
    }

    // Optional narrowing filters. start_year without end_year runs open-ended
    // to the dancer's last recorded year.
    if let Some(org) = &spec.organization {
        if org != "Both" {
            rows.retain(|r| r.organization == *org);
        }
    }
    if let Some(division) = &spec.division {
        rows.retain(|r| r.division == *division);
    }
    if let Some(start) = spec.start_year {
        let end = spec
            .end_year
            .unwrap_or_else(|| rows.iter().map(|r| r.year).max().unwrap_or(start));
        rows.retain(|r| r.year >= start && r.year <= end);
    }

    let total_contests = rows.len();
    let total_wins = rows.iter().filter(|r| r.is_win()).count();

    let mut breakdown: Vec<DivisionStat> = Vec::new();
    for division in distinct_in_order(rows.iter().map(|r| r.division.as_str())) {
        let in_division: Vec<&&ContestRecord> =
            rows.iter().filter(|r| r.division == division).collect();
        breakdown.push(DivisionStat {
            wins: in_division.iter().filter(|r| r.is_win()).count(),
            contests: in_division.len(),
            division,
        });
    }

    let career_span = if total_contests > 0 {
        year_span(&rows)
    } else {
        "No data".to_string()
    };

    let mut recent: Vec<&ContestRecord> = rows.clone();
    recent.sort_by(|a, b| b.year.cmp(&a.year));
    let recent_contests = recent
        .iter()
        .take(5.min(limit))
        .map(|r| RecordRow::from_record(r))
        .collect();

    Ok(SmartLookup::Profile {
        dancer_name: resolved_name,
        summary: SmartSummary {
            total_contests,
            total_wins,
            win_rate: round1(percentage(total_wins, total_contests)),
            career_span,
            organizations: distinct_in_order(rows.iter().map(|r| r.organization.as_str())),
            division_breakdown: breakdown,
        },
        recent_contests,
    })
}

// ---------------------------------------------------------------------------
// judge_statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeCount {
    pub judge_name: String,
    pub times_judged: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeStatistics {
    pub results: Vec<JudgeCount>,
    pub total_records: usize,
    /// Judge sparsity is always disclosed: many rows carry no judge data
    /// and that materially affects interpretation.
    pub records_with_judge_data: usize,
    pub records_without_judge_data: usize,
    pub note: String,
}

pub fn judge_statistics(filtered: &Filtered<'_>, limit: usize) -> JudgeStatistics {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut with_data = 0;
    for r in &filtered.rows {
        if r.has_judge_data() {
            with_data += 1;
        }
        for judge in r.present_judges() {
            *counts.entry(judge).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let without_data = filtered.filtered_count - with_data;
    JudgeStatistics {
        results: ranked
            .into_iter()
            .take(limit)
            .map(|(judge_name, times_judged)| JudgeCount {
                judge_name: judge_name.to_string(),
                times_judged,
            })
            .collect(),
        total_records: filtered.filtered_count,
        records_with_judge_data: with_data,
        records_without_judge_data: without_data,
        note: format!(
            "{without_data} of {} matching records have no judge data recorded",
            filtered.filtered_count
        ),
    }
}

// ---------------------------------------------------------------------------
// unique_counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueCounts {
    pub count_what: CountWhat,
    pub unique_count: usize,
    pub total_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_male_dancers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_female_dancers: Option<usize>,
}

pub fn unique_counts(filtered: &Filtered<'_>, what: CountWhat) -> UniqueCounts {
    let distinct = |f: fn(&ContestRecord) -> Option<&str>| -> usize {
        filtered
            .rows
            .iter()
            .copied()
            .filter_map(f)
            .collect::<BTreeSet<&str>>()
            .len()
    };

    let (unique_count, males, females) = match what {
        CountWhat::MaleDancers => (distinct(|r| r.male_name.as_deref()), None, None),
        CountWhat::FemaleDancers => (distinct(|r| r.female_name.as_deref()), None, None),
        CountWhat::AllDancers => {
            let mut union: BTreeSet<&str> = BTreeSet::new();
            for r in &filtered.rows {
                union.extend(r.male_name.as_deref());
                union.extend(r.female_name.as_deref());
            }
            (
                union.len(),
                Some(distinct(|r| r.male_name.as_deref())),
                Some(distinct(|r| r.female_name.as_deref())),
            )
        }
        CountWhat::Couples => (distinct(|r| r.couple_name.as_deref()), None, None),
        CountWhat::Contests => (distinct(|r| r.contest_name.as_deref()), None, None),
        CountWhat::Venues => (distinct(|r| r.host_club.as_deref()), None, None),
    };

    UniqueCounts {
        count_what: what,
        unique_count,
        total_entries: filtered.filtered_count,
        unique_male_dancers: males,
        unique_female_dancers: females,
    }
}

// ---------------------------------------------------------------------------
// win_statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinStatistics {
    pub dancer: String,
    pub total_contests: usize,
    pub wins: usize,
    pub top_3_finishes: usize,
    /// Percentage, two decimal places.
    pub win_rate_percent: f64,
}

pub fn win_statistics(filtered: &Filtered<'_>, name: &str) -> Result<WinStatistics, ToolError> {
    let rows = dancer_rows(&filtered.rows, name)?;
    let total = rows.len();
    let wins = rows.iter().filter(|r| r.is_win()).count();
    let top_3 = rows.iter().filter(|r| r.placement <= 3).count();
    Ok(WinStatistics {
        dancer: name.to_string(),
        total_contests: total,
        wins,
        top_3_finishes: top_3,
        win_rate_percent: round2(percentage(wins, total)),
    })
}

// ---------------------------------------------------------------------------
// partnership_analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partnership {
    pub partner: String,
    pub contests_together: usize,
    pub wins_together: usize,
    pub win_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnershipAnalysis {
    pub dancer: String,
    pub total_partners: usize,
    pub partnerships: Vec<Partnership>,
}

pub fn partnership_analysis(
    filtered: &Filtered<'_>,
    name: &str,
    limit: usize,
) -> Result<PartnershipAnalysis, ToolError> {
    let rows = dancer_rows(&filtered.rows, name)?;
    let is_male = rows.iter().any(|r| r.male_name.as_deref() == Some(name));

    let mut grouped: BTreeMap<&str, (usize, usize)> = BTreeMap::new(); // partner -> (contests, wins)
    for r in &rows {
        let partner = if is_male {
            r.female_name.as_deref()
        } else {
            r.male_name.as_deref()
        };
        if let Some(partner) = partner {
            let entry = grouped.entry(partner).or_insert((0, 0));
            entry.0 += 1;
            if r.is_win() {
                entry.1 += 1;
            }
        }
    }

    let mut partnerships: Vec<Partnership> = grouped
        .into_iter()
        .map(|(partner, (contests, wins))| Partnership {
            partner: partner.to_string(),
            contests_together: contests,
            wins_together: wins,
            win_rate: round2(percentage(wins, contests)),
        })
        .collect();
    partnerships.sort_by(|a, b| b.contests_together.cmp(&a.contests_together));

    Ok(PartnershipAnalysis {
        dancer: name.to_string(),
        total_partners: partnerships.len(),
        partnerships: partnerships.into_iter().take(limit).collect(),
    })
}

// ---------------------------------------------------------------------------
// career_statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareerStatistics {
    pub dancer: String,
    pub first_contest_year: i32,
    pub last_contest_year: i32,
    pub career_span_years: i32,
    /// Distinct years with at least one entry; not necessarily contiguous.
    pub years_competed: usize,
    pub total_contests: usize,
    pub unique_partners: usize,
    pub organizations: BTreeMap<String, usize>,
    pub divisions_competed: Vec<String>,
}

pub fn career_statistics(
    filtered: &Filtered<'_>,
    name: &str,
) -> Result<CareerStatistics, ToolError> {
    let rows = dancer_rows(&filtered.rows, name)?;
    let first = rows.iter().map(|r| r.year).min().unwrap_or(0);
    let last = rows.iter().map(|r| r.year).max().unwrap_or(0);

    let is_male = rows.iter().any(|r| r.male_name.as_deref() == Some(name));
    let partners: BTreeSet<&str> = rows
        .iter()
        .filter_map(|r| {
            if is_male {
                r.female_name.as_deref()
            } else {
                r.male_name.as_deref()
            }
        })
        .collect();

    let mut organizations: BTreeMap<String, usize> = BTreeMap::new();
    for r in &rows {
        *organizations.entry(r.organization.clone()).or_insert(0) += 1;
    }

    Ok(CareerStatistics {
        dancer: name.to_string(),
        first_contest_year: first,
        last_contest_year: last,
        career_span_years: last - first + 1,
        years_competed: rows.iter().map(|r| r.year).collect::<BTreeSet<i32>>().len(),
        total_contests: rows.len(),
        unique_partners: partners.len(),
        organizations,
        divisions_competed: distinct_in_order(rows.iter().map(|r| r.division.as_str())),
    })
}

// ---------------------------------------------------------------------------
// yearly_trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyTrend {
    pub metric: TrendMetric,
    pub yearly_data: BTreeMap<i32, usize>,
    pub total_years: usize,
    pub peak_year: Option<i32>,
    pub peak_count: Option<usize>,
}

pub fn yearly_trend(filtered: &Filtered<'_>, metric: TrendMetric) -> YearlyTrend {
    let mut yearly: BTreeMap<i32, usize> = BTreeMap::new();
    for r in &filtered.rows {
        if metric == TrendMetric::Wins && !r.is_win() {
            continue;
        }
        *yearly.entry(r.year).or_insert(0) += 1;
    }

    // Peak: highest count; earliest year wins ties.
    let mut peak: Option<(i32, usize)> = None;
    for (&year, &count) in &yearly {
        if peak.map(|(_, c)| count > c).unwrap_or(true) {
            peak = Some((year, count));
        }
    }

    YearlyTrend {
        metric,
        total_years: yearly.len(),
        peak_year: peak.map(|(y, _)| y),
        peak_count: peak.map(|(_, c)| c),
        yearly_data: yearly,
    }
}

// ---------------------------------------------------------------------------
// shared helpers
// ---------------------------------------------------------------------------

/// Rows for a named dancer within the filtered subset. An unresolvable name
/// is `not_found`: the one case where an empty result is not a zero-valued
/// success.
fn dancer_rows<'a>(
    rows: &[&'a ContestRecord],
    name: &str,
) -> Result<Vec<&'a ContestRecord>, ToolError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ToolError::missing_parameter("dancer_name"));
    }
    let matched: Vec<&ContestRecord> = rows
        .iter()
        .copied()
        .filter(|r| r.has_dancer(name))
        .collect();
    if matched.is_empty() {
        return Err(ToolError::not_found(format!(
            "no records found for '{name}' under the current filters"
        )));
    }
    Ok(matched)
}

/// Distinct values preserving first-encountered order.
fn distinct_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut out = Vec::new();
    for v in values {
        if seen.insert(v) {
            out.push(v.to_string());
        }
    }
    out
}

fn year_span(rows: &[&ContestRecord]) -> String {
    let min = rows.iter().map(|r| r.year).min().unwrap_or(0);
    let max = rows.iter().map(|r| r.year).max().unwrap_or(0);
    if min == max {
        min.to_string()
    } else {
        format!("{min}-{max}")
    }
}

/// All distinct dancer names across both columns.
pub fn all_names(records: &[ContestRecord]) -> BTreeSet<&str> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    for r in records {
        names.extend(r.male_name.as_deref());
        names.extend(r.female_name.as_deref());
    }
    names
}
