//! Tool surface exposed to the oracle: two tools, a closed argument schema,
//! and a dispatcher that turns caller mistakes into structured error values
//! instead of failures. Raw tool output is never shown to the end user; the
//! oracle composes the reply from it.

use crate::analytics::{self, AnalysisKind};
use crate::errors::ToolError;
use crate::filter::{self, FilterSpec};
use crate::query::{self, CountWhat, Gender, QueryKind, TrendMetric, DEFAULT_LIMIT};
use crate::store::RecordSet;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

pub const QUERY_TOOL: &str = "query_archive";
pub const ANALYZE_TOOL: &str = "analyze_archive";

/// Tool definitions in the oracle wire shape (`name`, `description`,
/// `input_schema`). The enums here must stay in lockstep with [`QueryKind`]
/// and [`AnalysisKind`].
pub fn catalog() -> Vec<Value> {
    vec![
        json!({
            "name": QUERY_TOOL,
            "description": "Look up dancers, judges, contests and placements in the swing dance contest archive. Use this for questions about specific people or ranked lists. All statistics must come from this tool, never from memory.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "query_type": {
                        "type": "string",
                        "enum": [
                            "rank_by_wins", "dancer_profile", "resolve_name",
                            "smart_dancer_lookup", "judge_statistics", "unique_counts",
                            "win_statistics", "partnership_analysis",
                            "career_statistics", "yearly_trend"
                        ],
                        "description": "Which lookup to run. smart_dancer_lookup answers 'tell me about dancer X' in one call."
                    },
                    "filters": {
                        "type": "object",
                        "properties": {
                            "division": {"type": "string", "description": "Exact division, e.g. Pro, Amateur, Novice, Junior 1"},
                            "organization": {"type": "string", "enum": ["CSA", "NSDC", "Both"]},
                            "placement": {"type": "integer", "description": "Exact placement; 1 means a win"},
                            "male_name": {"type": "string"},
                            "female_name": {"type": "string"},
                            "year": {"type": "integer"},
                            "start_year": {"type": "integer", "description": "Inclusive; requires end_year"},
                            "end_year": {"type": "integer", "description": "Inclusive; requires start_year"},
                            "contest": {"type": "string", "description": "Case-insensitive substring of the contest name"},
                            "dancer_name": {"type": "string", "description": "Required by smart_dancer_lookup, resolve_name, win_statistics, partnership_analysis, career_statistics"},
                            "gender": {"type": "string", "enum": ["male", "female"], "description": "Name column for rank_by_wins"},
                            "count_what": {"type": "string", "enum": ["male_dancers", "female_dancers", "all_dancers", "couples", "contests", "venues"]},
                            "metric": {"type": "string", "enum": ["entries", "wins"], "description": "For yearly_trend"}
                        }
                    },
                    "limit": {"type": "integer", "description": "Max results, default 10, hard cap 50"}
                },
                "required": ["query_type"]
            }
        }),
        json!({
            "name": ANALYZE_TOOL,
            "description": "Cross-record analytics over the swing dance contest archive: participation trends, Amateur-to-Pro retention, judge panel and judge/dancer relationships. Use this for aggregate questions that span many dancers or years.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "analysis_type": {
                        "type": "string",
                        "enum": [
                            "yearly_active_dancers", "judge_dancer_frequency",
                            "judge_panel_combinations", "judge_dancer_outcomes",
                            "retention_analysis", "career_progression_time"
                        ]
                    },
                    "filters": {
                        "type": "object",
                        "properties": {
                            "division": {"type": "string"},
                            "organization": {"type": "string", "enum": ["CSA", "NSDC", "Both"]},
                            "start_year": {"type": "integer", "description": "Inclusive; requires end_year"},
                            "end_year": {"type": "integer", "description": "Inclusive; requires start_year"},
                            "judge_name": {"type": "string", "description": "Required by judge_dancer_frequency"},
                            "dancer_name": {"type": "string", "description": "Required by judge_dancer_outcomes"},
                            "min_occurrences": {"type": "integer", "description": "Frequency floor for pair operations (default 5 for panels, 10 for outcomes)"}
                        }
                    },
                    "limit": {"type": "integer", "description": "Max results, default 10, hard cap 50"}
                },
                "required": ["analysis_type"]
            }
        }),
    ]
}

/// Flat argument bag shared by both tools. `deny_unknown_fields` makes a
/// misspelled filter an explicit invalid_filter error instead of a silently
/// unfiltered full-table answer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolFilters {
    pub division: Option<String>,
    pub organization: Option<String>,
    pub placement: Option<u32>,
    pub male_name: Option<String>,
    pub female_name: Option<String>,
    pub year: Option<i32>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub contest: Option<String>,
    pub dancer_name: Option<String>,
    pub judge_name: Option<String>,
    pub gender: Option<Gender>,
    pub count_what: Option<CountWhat>,
    pub metric: Option<TrendMetric>,
    pub min_occurrences: Option<usize>,
}

impl ToolFilters {
    /// The row-predicate subset; operation parameters stay behind.
    pub fn spec(&self) -> FilterSpec {
        FilterSpec {
            division: self.division.clone(),
            organization: self.organization.clone(),
            placement: self.placement,
            male_name: self.male_name.clone(),
            female_name: self.female_name.clone(),
            year: self.year,
            start_year: self.start_year,
            end_year: self.end_year,
            contest: self.contest.clone(),
        }
    }

    fn dancer_name(&self) -> Result<&str, ToolError> {
        self.dancer_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ToolError::missing_parameter("dancer_name"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QueryArgs {
    query_type: QueryKind,
    #[serde(default)]
    filters: ToolFilters,
    #[serde(default = "default_limit")]
    limit: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnalyzeArgs {
    analysis_type: AnalysisKind,
    #[serde(default)]
    filters: ToolFilters,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// Route one tool invocation. Infallible by construction: every failure mode
/// comes back as an error value for the oracle to rephrase.
pub fn dispatch(records: &RecordSet, name: &str, args: &Value) -> Value {
    let result = match name {
        QUERY_TOOL => run_query(records, args),
        ANALYZE_TOOL => run_analysis(records, args),
        other => Err(ToolError::unknown_tool(other)),
    };
    match result {
        Ok(value) => value,
        Err(e) => {
            debug!(tool = name, code = %e.code, "tool invocation rejected");
            e.to_value()
        }
    }
}

fn run_query(records: &RecordSet, args: &Value) -> Result<Value, ToolError> {
    let args: QueryArgs = serde_json::from_value(args.clone())
        .map_err(|e| ToolError::invalid_filter(e.to_string()))?;
    let spec = args.filters.spec();
    let filtered = filter::apply(records.records(), &spec);
    let limit = query::clamp_limit(args.limit);
    debug!(
        query = ?args.query_type,
        filtered = filtered.filtered_count,
        total = filtered.original_count,
        "query tool"
    );

    let result = match args.query_type {
        QueryKind::RankByWins => {
            let gender = args.filters.gender.unwrap_or(Gender::Male);
            to_value(query::rank_by_wins(&filtered, gender, limit))?
        }
        QueryKind::DancerProfile => to_value(query::dancer_profile(&filtered, limit))?,
        QueryKind::ResolveName => {
            // Name resolution always scans the whole archive; narrowing
            // filters would hide the very candidates being searched for.
            to_value(query::resolve_name(records.records(), args.filters.dancer_name()?)?)?
        }
        QueryKind::SmartDancerLookup => to_value(query::smart_dancer_lookup(
            records.records(),
            args.filters.dancer_name()?,
            &spec,
            limit,
        )?)?,
        QueryKind::JudgeStatistics => to_value(query::judge_statistics(&filtered, limit))?,
        QueryKind::UniqueCounts => {
            let what = args
                .filters
                .count_what
                .ok_or_else(|| ToolError::missing_parameter("count_what"))?;
            to_value(query::unique_counts(&filtered, what))?
        }
        QueryKind::WinStatistics => {
            to_value(query::win_statistics(&filtered, args.filters.dancer_name()?)?)?
        }
        QueryKind::PartnershipAnalysis => to_value(query::partnership_analysis(
            &filtered,
            args.filters.dancer_name()?,
            limit,
        )?)?,
        QueryKind::CareerStatistics => {
            to_value(query::career_statistics(&filtered, args.filters.dancer_name()?)?)?
        }
        QueryKind::YearlyTrend => {
            let metric = args.filters.metric.unwrap_or(TrendMetric::Entries);
            to_value(query::yearly_trend(&filtered, metric))?
        }
    };

    Ok(envelope(
        json!(args.query_type),
        filtered.original_count,
        filtered.filtered_count,
        result,
    ))
}

fn run_analysis(records: &RecordSet, args: &Value) -> Result<Value, ToolError> {
    let args: AnalyzeArgs = serde_json::from_value(args.clone())
        .map_err(|e| ToolError::invalid_filter(e.to_string()))?;
    let filtered = filter::apply(records.records(), &args.filters.spec());
    let limit = query::clamp_limit(args.limit);
    debug!(
        analysis = ?args.analysis_type,
        filtered = filtered.filtered_count,
        total = filtered.original_count,
        "analysis tool"
    );

    let result = match args.analysis_type {
        AnalysisKind::YearlyActiveDancers => to_value(analytics::yearly_active_dancers(&filtered))?,
        AnalysisKind::JudgeDancerFrequency => {
            let judge = args
                .filters
                .judge_name
                .as_deref()
                .map(str::trim)
                .filter(|j| !j.is_empty())
                .ok_or_else(|| ToolError::missing_parameter("judge_name"))?;
            to_value(analytics::judge_dancer_frequency(&filtered, judge, limit)?)?
        }
        AnalysisKind::JudgePanelCombinations => {
            let floor = args
                .filters
                .min_occurrences
                .unwrap_or(analytics::DEFAULT_MIN_PANEL_OCCURRENCES);
            to_value(analytics::judge_panel_combinations(&filtered, floor, limit))?
        }
        AnalysisKind::JudgeDancerOutcomes => {
            let floor = args
                .filters
                .min_occurrences
                .unwrap_or(analytics::DEFAULT_MIN_OUTCOME_OCCURRENCES);
            to_value(analytics::judge_dancer_outcomes(
                &filtered,
                args.filters.dancer_name()?,
                floor,
                limit,
            )?)?
        }
        AnalysisKind::RetentionAnalysis => to_value(analytics::retention_analysis(&filtered))?,
        AnalysisKind::CareerProgressionTime => {
            to_value(analytics::career_progression_time(&filtered))?
        }
    };

    Ok(envelope(
        json!(args.analysis_type),
        filtered.original_count,
        filtered.filtered_count,
        result,
    ))
}

/// Every successful result carries both counts so the oracle can state how
/// selective the filters were.
fn envelope(operation: Value, total: usize, filtered: usize, result: Value) -> Value {
    json!({
        "operation": operation,
        "total_records": total,
        "filtered_records": filtered,
        "result": result,
    })
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::new("serialization", e.to_string()))
}
