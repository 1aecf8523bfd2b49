use serde_json::json;
use shagdex_core::model::ContestRecord;
use shagdex_core::store::RecordSet;
use shagdex_core::tools::{self, ANALYZE_TOOL, QUERY_TOOL};

fn archive() -> RecordSet {
    let records: Vec<ContestRecord> = (0..8)
        .map(|i| ContestRecord {
            archive_id: format!("a-{i}"),
            contest_name: Some("Fall Cycle".to_string()),
            organization: if i % 2 == 0 { "CSA" } else { "NSDC" }.to_string(),
            year: 1990 + i,
            host_club: None,
            placement: if i < 4 { 1 } else { 2 },
            division: "Pro".to_string(),
            female_name: Some("Ann Lee".to_string()),
            male_name: Some("Sam West".to_string()),
            couple_name: None,
            judges: Default::default(),
            record_id: format!("r-{i}"),
        })
        .collect();
    RecordSet::from_records(records)
}

#[test]
fn catalog_exposes_exactly_two_tools() {
    let catalog = tools::catalog();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog[0]["name"], QUERY_TOOL);
    assert_eq!(catalog[1]["name"], ANALYZE_TOOL);
    assert!(catalog[0]["input_schema"]["properties"]["query_type"]["enum"].is_array());
}

#[test]
fn successful_results_carry_both_counts() {
    let result = tools::dispatch(
        &archive(),
        QUERY_TOOL,
        &json!({"query_type": "rank_by_wins", "filters": {"placement": 1, "organization": "CSA"}}),
    );
    assert_eq!(result["total_records"], 8);
    assert_eq!(result["filtered_records"], 2);
    assert_eq!(result["result"][0]["name"], "Sam West");
    assert_eq!(result["result"][0]["count"], 2);
}

#[test]
fn unknown_tools_come_back_as_error_values() {
    let result = tools::dispatch(&archive(), "drop_table", &json!({}));
    assert_eq!(result["error"]["code"], "unknown_tool");
}

#[test]
fn misspelled_filters_are_rejected_not_ignored() {
    let result = tools::dispatch(
        &archive(),
        QUERY_TOOL,
        &json!({"query_type": "rank_by_wins", "filters": {"divison": "Pro"}}),
    );
    assert_eq!(result["error"]["code"], "invalid_filter");
}

#[test]
fn unknown_query_types_are_rejected() {
    let result = tools::dispatch(&archive(), QUERY_TOOL, &json!({"query_type": "drop_table"}));
    assert_eq!(result["error"]["code"], "invalid_filter");
}

#[test]
fn operations_that_need_a_dancer_name_say_so() {
    let result = tools::dispatch(
        &archive(),
        QUERY_TOOL,
        &json!({"query_type": "win_statistics"}),
    );
    assert_eq!(result["error"]["code"], "missing_parameter");
}

#[test]
fn limits_are_capped_at_fifty() {
    let result = tools::dispatch(
        &archive(),
        QUERY_TOOL,
        &json!({"query_type": "dancer_profile", "limit": 5000}),
    );
    let rows = result["result"]["rows"].as_array().unwrap();
    assert!(rows.len() <= 50);
    assert_eq!(result["result"]["total_matching"], 8);
}

#[test]
fn analysis_tool_runs_retention_end_to_end() {
    let result = tools::dispatch(
        &archive(),
        ANALYZE_TOOL,
        &json!({"analysis_type": "retention_analysis", "filters": {"organization": "Both"}}),
    );
    assert_eq!(result["filtered_records"], 8);
    assert_eq!(result["result"]["retention_rate"], 0.0);
    assert!(result["result"]["note"].is_string());
}

#[test]
fn judge_dancer_outcomes_require_a_dancer_name() {
    let result = tools::dispatch(
        &archive(),
        ANALYZE_TOOL,
        &json!({"analysis_type": "judge_dancer_outcomes"}),
    );
    assert_eq!(result["error"]["code"], "missing_parameter");
}

#[test]
fn judge_dancer_outcomes_report_the_named_dancer_only() {
    let mut records: Vec<ContestRecord> = archive().records().to_vec();
    for r in records.iter_mut().take(6) {
        r.judges[0] = Some("Pat Quinn".to_string());
    }
    records.push(ContestRecord {
        archive_id: "a-extra".to_string(),
        contest_name: Some("Fall Cycle".to_string()),
        organization: "CSA".to_string(),
        year: 1999,
        host_club: None,
        placement: 1,
        division: "Pro".to_string(),
        female_name: Some("Sue Moore".to_string()),
        male_name: Some("Bob Hart".to_string()),
        couple_name: None,
        judges: [Some("Pat Quinn".to_string()), None, None, None, None],
        record_id: "r-extra".to_string(),
    });

    let result = tools::dispatch(
        &RecordSet::from_records(records),
        ANALYZE_TOOL,
        &json!({
            "analysis_type": "judge_dancer_outcomes",
            "filters": {"dancer_name": "Sam West", "min_occurrences": 5}
        }),
    );
    assert_eq!(result["result"]["dancer"], "Sam West");
    assert_eq!(result["result"]["overall_contests"], 8);
    assert_eq!(result["result"]["overall_wins"], 4);
    assert_eq!(result["result"]["overall_win_rate"], 50.0);
    // Pat Quinn sat on six of Sam's rows, four of them wins.
    let outcomes = result["result"]["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0]["judge"], "Pat Quinn");
    assert_eq!(outcomes[0]["contests"], 6);
    assert_eq!(outcomes[0]["wins"], 4);
    assert_eq!(outcomes[0]["win_rate"], 66.7);
    assert_eq!(outcomes[0]["vs_overall"], 16.7);
}

#[test]
fn unique_counts_require_count_what() {
    let result = tools::dispatch(
        &archive(),
        QUERY_TOOL,
        &json!({"query_type": "unique_counts"}),
    );
    assert_eq!(result["error"]["code"], "missing_parameter");

    let result = tools::dispatch(
        &archive(),
        QUERY_TOOL,
        &json!({"query_type": "unique_counts", "filters": {"count_what": "all_dancers"}}),
    );
    assert_eq!(result["result"]["unique_count"], 2);
    assert_eq!(result["result"]["unique_male_dancers"], 1);
}
