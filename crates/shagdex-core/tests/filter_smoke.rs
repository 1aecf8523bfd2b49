use shagdex_core::filter::{apply, FilterSpec};
use shagdex_core::model::ContestRecord;

fn rec(id: &str, year: i32, division: &str, placement: u32) -> ContestRecord {
    ContestRecord {
        archive_id: id.to_string(),
        contest_name: Some("Spring Nationals".to_string()),
        organization: "CSA".to_string(),
        year,
        host_club: Some("Ocean Drive Club".to_string()),
        placement,
        division: division.to_string(),
        female_name: Some("Ann Lee".to_string()),
        male_name: Some("Sam West".to_string()),
        couple_name: Some("Sam West & Ann Lee".to_string()),
        judges: Default::default(),
        record_id: format!("r-{id}"),
    }
}

fn archive() -> Vec<ContestRecord> {
    vec![
        rec("a1", 1995, "Pro", 1),
        rec("a2", 1996, "Pro", 2),
        rec("a3", 1997, "Amateur", 1),
        rec("a4", 1998, "Novice", 3),
    ]
}

#[test]
fn empty_spec_matches_everything() {
    let records = archive();
    let filtered = apply(&records, &FilterSpec::default());
    assert_eq!(filtered.filtered_count, filtered.original_count);
    assert_eq!(filtered.filtered_count, 4);
}

#[test]
fn adding_a_filter_never_grows_the_subset() {
    let records = archive();
    let loose = apply(
        &records,
        &FilterSpec {
            division: Some("Pro".to_string()),
            ..Default::default()
        },
    );
    let tight = apply(
        &records,
        &FilterSpec {
            division: Some("Pro".to_string()),
            placement: Some(1),
            ..Default::default()
        },
    );
    assert!(tight.filtered_count <= loose.filtered_count);
    assert_eq!(loose.filtered_count, 2);
    assert_eq!(tight.filtered_count, 1);
}

#[test]
fn organization_both_is_no_constraint() {
    let mut records = archive();
    records[0].organization = "NSDC".to_string();
    let filtered = apply(
        &records,
        &FilterSpec {
            organization: Some("Both".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(filtered.filtered_count, 4);
}

#[test]
fn year_range_needs_both_bounds() {
    let records = archive();
    let half_open = apply(
        &records,
        &FilterSpec {
            start_year: Some(1997),
            ..Default::default()
        },
    );
    assert_eq!(half_open.filtered_count, 4);

    let closed = apply(
        &records,
        &FilterSpec {
            start_year: Some(1996),
            end_year: Some(1997),
            ..Default::default()
        },
    );
    assert_eq!(closed.filtered_count, 2);
}

#[test]
fn contest_substring_is_case_insensitive_and_skips_missing_names() {
    let mut records = archive();
    records[3].contest_name = None;
    let filtered = apply(
        &records,
        &FilterSpec {
            contest: Some("spring".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(filtered.filtered_count, 3);
}

#[test]
fn name_filters_are_exact_matches() {
    let records = archive();
    let exact = apply(
        &records,
        &FilterSpec {
            male_name: Some("Sam West".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(exact.filtered_count, 4);

    let partial = apply(
        &records,
        &FilterSpec {
            male_name: Some("Sam".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(partial.filtered_count, 0);
}
