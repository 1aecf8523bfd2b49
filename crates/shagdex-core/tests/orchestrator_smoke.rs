use serde_json::json;
use shagdex_core::cache::AnswerCache;
use shagdex_core::errors::OracleError;
use shagdex_core::model::ContestRecord;
use shagdex_core::orchestrator::Orchestrator;
use shagdex_core::providers::llm::scripted::ScriptedOracle;
use shagdex_core::providers::llm::OracleReply;
use shagdex_core::store::RecordSet;
use std::sync::Arc;
use std::time::Duration;

fn archive() -> Arc<RecordSet> {
    let records: Vec<ContestRecord> = (0..6)
        .map(|i| ContestRecord {
            archive_id: format!("a-{i}"),
            contest_name: Some("Fall Cycle".to_string()),
            organization: "CSA".to_string(),
            year: 1990 + i,
            host_club: None,
            placement: 1,
            division: "Pro".to_string(),
            female_name: Some("Ann Lee".to_string()),
            male_name: Some("Sam West".to_string()),
            couple_name: None,
            judges: Default::default(),
            record_id: format!("r-{i}"),
        })
        .collect();
    Arc::new(RecordSet::from_records(records))
}

fn orchestrator(oracle: Arc<ScriptedOracle>, records: Option<Arc<RecordSet>>) -> Orchestrator {
    Orchestrator::new(
        oracle,
        records,
        AnswerCache::new(16, Duration::from_secs(60)),
        4,
        Duration::from_millis(1),
        3,
    )
}

#[tokio::test]
async fn tool_round_trip_produces_the_final_text() {
    let oracle = Arc::new(ScriptedOracle::new());
    oracle
        .enqueue(OracleReply::tool_call(
            "tu_1",
            "query_archive",
            json!({"query_type": "rank_by_wins", "filters": {"placement": 1}}),
        ))
        .enqueue(OracleReply::text("Sam West leads with 6 wins."));

    let answer = orchestrator(oracle.clone(), Some(archive()))
        .answer("who has the most wins in the pro division?")
        .await;

    assert_eq!(answer, "Sam West leads with 6 wins.");
    assert_eq!(oracle.calls(), 2);
}

#[tokio::test]
async fn an_oracle_that_never_stops_calling_tools_is_bounded() {
    let oracle = Arc::new(ScriptedOracle::new());
    oracle.set_fallback(OracleReply::tool_call(
        "tu_loop",
        "query_archive",
        json!({"query_type": "dancer_profile"}),
    ));

    let answer = orchestrator(oracle.clone(), Some(archive()))
        .answer("tell me absolutely everything about the archive")
        .await;

    assert_eq!(oracle.calls(), 4);
    assert!(answer.contains("narrowing"));
}

#[tokio::test]
async fn transient_failures_get_one_retry() {
    let oracle = Arc::new(ScriptedOracle::new());
    oracle
        .enqueue_error(OracleError::RateLimited)
        .enqueue(OracleReply::text("The archive spans 1990 to 1995."));

    let answer = orchestrator(oracle.clone(), Some(archive()))
        .answer("what years does the contest archive cover?")
        .await;

    assert_eq!(answer, "The archive spans 1990 to 1995.");
    assert_eq!(oracle.calls(), 2);
}

#[tokio::test]
async fn auth_failures_degrade_immediately_without_retry() {
    let oracle = Arc::new(ScriptedOracle::new());
    oracle.enqueue_error(OracleError::Auth);

    let answer = orchestrator(oracle.clone(), Some(archive()))
        .answer("what years does the contest archive cover?")
        .await;

    assert_eq!(oracle.calls(), 1);
    assert!(answer.contains("not configured"));
}

#[tokio::test]
async fn unloaded_archive_answers_degraded_without_calling_the_oracle() {
    let oracle = Arc::new(ScriptedOracle::new());
    let answer = orchestrator(oracle.clone(), None)
        .answer("who has the most wins in the pro division?")
        .await;

    assert_eq!(oracle.calls(), 0);
    assert!(answer.contains("not loaded"));
}

#[tokio::test]
async fn an_empty_question_never_reaches_the_oracle() {
    let oracle = Arc::new(ScriptedOracle::new());
    let answer = orchestrator(oracle.clone(), Some(archive()))
        .answer("   ")
        .await;

    assert_eq!(oracle.calls(), 0);
    assert!(answer.contains("ask a question"));
}

#[tokio::test]
async fn repeated_questions_hit_the_cache() {
    let oracle = Arc::new(ScriptedOracle::new());
    oracle.enqueue(OracleReply::text("Sam West, with 6 wins."));

    let engine = orchestrator(oracle.clone(), Some(archive()));
    let first = engine.answer("who has the most wins overall?").await;
    let second = engine.answer("WHO HAS THE MOST WINS OVERALL?").await;

    assert_eq!(first, second);
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test]
async fn degraded_answers_are_never_cached() {
    let oracle = Arc::new(ScriptedOracle::new());
    oracle
        .enqueue_error(OracleError::Auth)
        .enqueue(OracleReply::text("The archive spans 1990 to 1995."));

    let engine = orchestrator(oracle.clone(), Some(archive()));
    let degraded = engine.answer("what years does the archive cover?").await;
    let recovered = engine.answer("what years does the archive cover?").await;

    assert!(degraded.contains("not configured"));
    assert_eq!(recovered, "The archive spans 1990 to 1995.");
}

#[tokio::test]
async fn empty_final_text_gets_a_fallback_message() {
    let oracle = Arc::new(ScriptedOracle::new());
    oracle.enqueue(OracleReply::text("   "));

    let answer = orchestrator(oracle, Some(archive()))
        .answer("who has the most wins overall?")
        .await;

    assert!(answer.contains("rephrasing"));
}
