//! Analytics Executor: cross-record aggregations (trends, retention,
//! judge/dancer relationships). Read-only over the filtered subset, like the
//! query executor, but each operation spans many dancers or years at once.

use crate::errors::ToolError;
use crate::filter::Filtered;
use crate::model::{percentage, round1, ContestRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Default floor for pair-frequency operations. Rare pairings are noise.
pub const DEFAULT_MIN_PANEL_OCCURRENCES: usize = 5;
pub const DEFAULT_MIN_OUTCOME_OCCURRENCES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    YearlyActiveDancers,
    JudgeDancerFrequency,
    JudgePanelCombinations,
    JudgeDancerOutcomes,
    RetentionAnalysis,
    CareerProgressionTime,
}

// ---------------------------------------------------------------------------
// yearly_active_dancers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyActivity {
    pub year: i32,
    pub male_dancers: usize,
    pub female_dancers: usize,
    pub total_dancers: usize,
    /// Delta versus the previous listed year; absent for the first year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<i64>,
}

/// Distinct participants per year, in ascending year order.
pub fn yearly_active_dancers(filtered: &Filtered<'_>) -> Vec<YearlyActivity> {
    let mut by_year: BTreeMap<i32, (BTreeSet<&str>, BTreeSet<&str>)> = BTreeMap::new();
    for r in &filtered.rows {
        let (males, females) = by_year.entry(r.year).or_default();
        males.extend(r.male_name.as_deref());
        females.extend(r.female_name.as_deref());
    }

    let mut out = Vec::with_capacity(by_year.len());
    let mut previous: Option<usize> = None;
    for (year, (males, females)) in by_year {
        let total = males.len() + females.len();
        out.push(YearlyActivity {
            year,
            male_dancers: males.len(),
            female_dancers: females.len(),
            total_dancers: total,
            change: previous.map(|p| total as i64 - p as i64),
        });
        previous = Some(total);
    }
    out
}

// ---------------------------------------------------------------------------
// judge_dancer_frequency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgedDancer {
    pub dancer: String,
    pub times_judged: usize,
    pub wins: usize,
    /// Win percentage in front of this judge, one decimal place.
    pub win_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeDancerFrequency {
    pub judge: String,
    pub records_judged: usize,
    pub dancers: Vec<JudgedDancer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// How often each dancer appeared in front of one judge. Both name columns
/// contribute on equal terms.
pub fn judge_dancer_frequency(
    filtered: &Filtered<'_>,
    judge: &str,
    limit: usize,
) -> Result<JudgeDancerFrequency, ToolError> {
    let judge = judge.trim();
    if judge.is_empty() {
        return Err(ToolError::missing_parameter("judge_name"));
    }
    // An unknown or unmatched judge is a zero-valued result, not an error:
    // most rows carry no judge data at all.
    let judged: Vec<&&ContestRecord> = filtered
        .rows
        .iter()
        .filter(|r| r.has_judge(judge))
        .collect();

    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new(); // dancer -> (appearances, wins)
    for r in &judged {
        for name in [r.male_name.as_deref(), r.female_name.as_deref()]
            .into_iter()
            .flatten()
        {
            let entry = counts.entry(name).or_insert((0, 0));
            entry.0 += 1;
            if r.is_win() {
                entry.1 += 1;
            }
        }
    }

    let mut dancers: Vec<JudgedDancer> = counts
        .into_iter()
        .map(|(dancer, (times, wins))| JudgedDancer {
            dancer: dancer.to_string(),
            times_judged: times,
            wins,
            win_rate: round1(percentage(wins, times)),
        })
        .collect();
    dancers.sort_by(|a, b| b.times_judged.cmp(&a.times_judged));

    Ok(JudgeDancerFrequency {
        judge: judge.to_string(),
        records_judged: judged.len(),
        note: judged.is_empty().then(|| {
            format!("no matching records judged by '{judge}'")
        }),
        dancers: dancers.into_iter().take(limit).collect(),
    })
}

// ---------------------------------------------------------------------------
// judge_panel_combinations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelPair {
    pub judges: [String; 2],
    pub times_together: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelCombinations {
    pub min_occurrences: usize,
    pub pairs: Vec<PanelPair>,
}

/// Unordered judge pairs that served on the same panel. Pairs are
/// normalized (lexicographically smaller name first) so (A,B) and (B,A)
/// are one key.
pub fn judge_panel_combinations(
    filtered: &Filtered<'_>,
    min_occurrences: usize,
    limit: usize,
) -> PanelCombinations {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for r in &filtered.rows {
        let panel: Vec<&str> = r.present_judges().collect();
        for i in 0..panel.len() {
            for j in (i + 1)..panel.len() {
                let key = if panel[i] <= panel[j] {
                    (panel[i], panel[j])
                } else {
                    (panel[j], panel[i])
                };
                *counts.entry(key).or_insert(0) += 1;
            }
        }
    }

    let mut pairs: Vec<((&str, &str), usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_occurrences)
        .collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    PanelCombinations {
        min_occurrences,
        pairs: pairs
            .into_iter()
            .take(limit)
            .map(|((a, b), times_together)| PanelPair {
                judges: [a.to_string(), b.to_string()],
                times_together,
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// judge_dancer_outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeOutcome {
    pub judge: String,
    pub contests: usize,
    pub wins: usize,
    /// Win percentage in front of this judge, one decimal place.
    pub win_rate: f64,
    /// Signed difference versus the dancer's overall win rate.
    pub vs_overall: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeDancerOutcomes {
    pub dancer: String,
    pub overall_contests: usize,
    pub overall_wins: usize,
    pub overall_win_rate: f64,
    pub min_occurrences: usize,
    pub outcomes: Vec<JudgeOutcome>,
}

/// For one named dancer: every judge who sat on at least `min_occurrences`
/// of their rows, with the dancer's win rate in front of that judge versus
/// their overall rate. Descriptive association only, not a causal claim.
pub fn judge_dancer_outcomes(
    filtered: &Filtered<'_>,
    dancer: &str,
    min_occurrences: usize,
    limit: usize,
) -> Result<JudgeDancerOutcomes, ToolError> {
    let dancer = dancer.trim();
    if dancer.is_empty() {
        return Err(ToolError::missing_parameter("dancer_name"));
    }
    let rows: Vec<&&ContestRecord> = filtered
        .rows
        .iter()
        .filter(|r| r.has_dancer(dancer))
        .collect();
    if rows.is_empty() {
        return Err(ToolError::not_found(format!(
            "no records found for '{dancer}' under the current filters"
        )));
    }

    let overall_wins = rows.iter().filter(|r| r.is_win()).count();
    let overall_rate = percentage(overall_wins, rows.len());

    let mut per_judge: BTreeMap<&str, (usize, usize)> = BTreeMap::new(); // judge -> (contests, wins)
    for r in &rows {
        for judge in r.present_judges() {
            let entry = per_judge.entry(judge).or_insert((0, 0));
            entry.0 += 1;
            if r.is_win() {
                entry.1 += 1;
            }
        }
    }

    let mut outcomes: Vec<JudgeOutcome> = per_judge
        .into_iter()
        .filter(|(_, (contests, _))| *contests >= min_occurrences)
        .map(|(judge, (contests, wins))| {
            let rate = percentage(wins, contests);
            JudgeOutcome {
                judge: judge.to_string(),
                contests,
                wins,
                win_rate: round1(rate),
                vs_overall: round1(rate - overall_rate),
            }
        })
        .collect();
    outcomes.sort_by(|a, b| {
        b.win_rate
            .partial_cmp(&a.win_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.contests.cmp(&a.contests))
    });

    Ok(JudgeDancerOutcomes {
        dancer: dancer.to_string(),
        overall_contests: rows.len(),
        overall_wins,
        overall_win_rate: round1(overall_rate),
        min_occurrences,
        outcomes: outcomes.into_iter().take(limit).collect(),
    })
}

// ---------------------------------------------------------------------------
// retention_analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionAnalysis {
    pub amateur_dancers: usize,
    pub pro_dancers: usize,
    pub advanced_to_pro: usize,
    /// Share of Amateur dancers who ever appear in Pro, one decimal place.
    pub retention_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Intersection of the Amateur and Pro participant sets. Zero Amateur
/// dancers yields a zero rate with an explanatory note, never a division
/// error.
pub fn retention_analysis(filtered: &Filtered<'_>) -> RetentionAnalysis {
    let names_in = |division: &str| -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        for r in filtered.rows.iter().filter(|r| r.division == division) {
            names.extend(r.male_name.as_deref());
            names.extend(r.female_name.as_deref());
        }
        names
    };
    let amateurs = names_in("Amateur");
    let pros = names_in("Pro");
    let advanced = amateurs.intersection(&pros).count();

    RetentionAnalysis {
        amateur_dancers: amateurs.len(),
        pro_dancers: pros.len(),
        advanced_to_pro: advanced,
        retention_rate: round1(percentage(advanced, amateurs.len())),
        note: amateurs
            .is_empty()
            .then(|| "no Amateur records in the filtered subset".to_string()),
    }
}

// ---------------------------------------------------------------------------
// career_progression_time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareerProgression {
    /// Dancers whose first Pro year strictly follows their first Amateur
    /// year. Same-year or Pro-first careers are excluded.
    pub dancers_measured: usize,
    pub average_years: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_years: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_years: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub fn career_progression_time(filtered: &Filtered<'_>) -> CareerProgression {
    let mut first_year: HashMap<(&str, &str), i32> = HashMap::new(); // (dancer, division) -> year
    for r in &filtered.rows {
        if r.division != "Amateur" && r.division != "Pro" {
            continue;
        }
        for name in [r.male_name.as_deref(), r.female_name.as_deref()]
            .into_iter()
            .flatten()
        {
            first_year
                .entry((name, r.division.as_str()))
                .and_modify(|y| *y = (*y).min(r.year))
                .or_insert(r.year);
        }
    }

    let mut deltas: Vec<i32> = Vec::new();
    for ((name, division), &amateur_year) in &first_year {
        if *division != "Amateur" {
            continue;
        }
        if let Some(&pro_year) = first_year.get(&(*name, "Pro")) {
            let delta = pro_year - amateur_year;
            if delta > 0 {
                deltas.push(delta);
            }
        }
    }

    let total: i32 = deltas.iter().sum();
    CareerProgression {
        dancers_measured: deltas.len(),
        average_years: round1(if deltas.is_empty() {
            0.0
        } else {
            f64::from(total) / deltas.len() as f64
        }),
        min_years: deltas.iter().min().copied(),
        max_years: deltas.iter().max().copied(),
        note: deltas
            .is_empty()
            .then(|| "no dancer in the filtered subset progressed from Amateur to Pro".to_string()),
    }
}
