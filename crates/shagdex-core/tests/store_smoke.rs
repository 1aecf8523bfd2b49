use shagdex_core::errors::LoadError;
use shagdex_core::store;

const HEADER: &str = "Archive ID,Contest,Organization,Year,Host Club,Placement,Division,Female Name,Male Name,Couple Name,Judge 1,Judge 2,Judge 3,Judge 4,Judge 5,Record ID";

fn snapshot(rows: &[&str]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    out
}

#[test]
fn a_well_formed_snapshot_loads_every_row() {
    let raw = snapshot(&[
        "a1,Fall Cycle,CSA,1990,Ocean Drive Club,1,Pro,Ann Lee,Sam West,Sam West & Ann Lee,Pat Quinn,,,,,r1",
        "a2,\"Spring Cycle, Finals\",NSDC,1991,,2,Amateur,,Bob Hart,,,,,,,r2",
    ]);
    let set = store::parse_snapshot(&raw).unwrap();
    assert_eq!(set.len(), 2);

    let first = &set.records()[0];
    assert_eq!(first.archive_id, "a1");
    assert!(first.is_win());
    assert_eq!(first.present_judges().count(), 1);

    // Quoted commas survive, empty cells become None.
    let second = &set.records()[1];
    assert_eq!(second.contest_name.as_deref(), Some("Spring Cycle, Finals"));
    assert_eq!(second.female_name, None);
    assert!(!second.has_judge_data());
}

#[test]
fn missing_columns_fail_closed() {
    let raw = "Archive ID,Contest,Year\na1,Fall Cycle,1990\n";
    match store::parse_snapshot(raw) {
        Err(LoadError::SchemaMismatch { missing }) => {
            assert!(missing.contains(&"Placement".to_string()));
            assert!(missing.contains(&"Judge 5".to_string()));
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }
}

#[test]
fn non_positive_placements_are_malformed() {
    let raw = snapshot(&["a1,Fall Cycle,CSA,1990,,0,Pro,Ann Lee,Sam West,,,,,,,r1"]);
    assert!(matches!(
        store::parse_snapshot(&raw),
        Err(LoadError::MalformedRow { line: 2, .. })
    ));
}

#[test]
fn unparseable_years_are_malformed() {
    let raw = snapshot(&["a1,Fall Cycle,CSA,ninety,,1,Pro,Ann Lee,Sam West,,,,,,,r1"]);
    assert!(matches!(
        store::parse_snapshot(&raw),
        Err(LoadError::MalformedRow { .. })
    ));
}

#[test]
fn missing_file_reports_not_found() {
    assert!(matches!(
        store::load(std::path::Path::new("/nonexistent/archive.csv")),
        Err(LoadError::NotFound { .. })
    ));
}

#[test]
fn csv_round_trips_through_the_canonical_writer() {
    let raw = snapshot(&[
        "a1,\"Fall Cycle, Finals\",CSA,1990,,1,Pro,Ann Lee,Sam West,,,,,,,r1",
    ]);
    let set = store::parse_snapshot(&raw).unwrap();
    let rewritten = store::parse_snapshot(&set.to_csv()).unwrap();
    assert_eq!(rewritten.len(), 1);
    assert_eq!(
        rewritten.records()[0].contest_name.as_deref(),
        Some("Fall Cycle, Finals")
    );
}

#[test]
fn knowledge_summary_reports_totals_and_span() {
    let raw = snapshot(&[
        "a1,Fall Cycle,CSA,1990,,1,Pro,Ann Lee,Sam West,Sam West & Ann Lee,,,,,,r1",
        "a2,Fall Cycle,CSA,1995,,2,Amateur,Sue Moore,Bob Hart,,,,,,,r2",
    ]);
    let set = store::parse_snapshot(&raw).unwrap();
    let summary = set.knowledge_summary();
    assert!(summary.contains("Total records: 2"));
    assert!(summary.contains("1990-1995"));
    assert!(summary.contains("Fall Cycle: 2 entries"));
    assert!(summary.contains("Sam West & Ann Lee"));
}

#[test]
fn sample_is_bounded_and_in_source_order() {
    let raw = snapshot(&[
        "a1,Fall Cycle,CSA,1990,,1,Pro,Ann Lee,Sam West,,,,,,,r1",
        "a2,Fall Cycle,CSA,1995,,2,Pro,Sue Moore,Bob Hart,,,,,,,r2",
    ]);
    let set = store::parse_snapshot(&raw).unwrap();
    assert_eq!(set.sample(10).len(), 2);
    assert_eq!(set.sample_rows(1)[0].male_name.as_deref(), Some("Sam West"));
}
