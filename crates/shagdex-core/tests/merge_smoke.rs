use shagdex_core::model::ContestRecord;
use shagdex_core::store::{self, merge, RecordSet};

fn rec(id: &str, year: i32, placement: u32, male: &str) -> ContestRecord {
    ContestRecord {
        archive_id: id.to_string(),
        contest_name: Some("Fall Cycle".to_string()),
        organization: "CSA".to_string(),
        year,
        host_club: None,
        placement,
        division: "Pro".to_string(),
        female_name: Some("Ann Lee".to_string()),
        male_name: Some(male.to_string()),
        couple_name: None,
        judges: Default::default(),
        record_id: format!("r-{id}"),
    }
}

#[test]
fn update_only_batches_preserve_the_row_count() {
    let existing = vec![rec("a1", 1990, 1, "Sam West"), rec("a2", 1991, 2, "Bob Hart")];
    let batch = vec![rec("a1", 1990, 3, "Sam West")];

    let (merged, updated, added) = merge::merge_records(existing, batch);
    assert_eq!(merged.len(), 2);
    assert_eq!(updated, 1);
    assert_eq!(added, 0);
    let a1 = merged.iter().find(|r| r.archive_id == "a1").unwrap();
    assert_eq!(a1.placement, 3);
}

#[test]
fn all_new_batches_grow_by_the_deduped_batch_size() {
    let existing = vec![rec("a1", 1990, 1, "Sam West")];
    // a3 appears twice in the batch; the later row wins.
    let batch = vec![
        rec("a2", 1991, 1, "Bob Hart"),
        rec("a3", 1992, 1, "Jo King"),
        rec("a3", 1992, 4, "Jo King"),
    ];

    let (merged, updated, added) = merge::merge_records(existing, batch);
    assert_eq!(merged.len(), 3);
    assert_eq!(updated, 0);
    assert_eq!(added, 2);
    let a3 = merged.iter().find(|r| r.archive_id == "a3").unwrap();
    assert_eq!(a3.placement, 4);
}

#[test]
fn merged_output_is_sorted_for_deterministic_diffs() {
    let existing = vec![rec("a2", 1995, 1, "Sam West")];
    let batch = vec![rec("a1", 1990, 1, "Bob Hart")];

    let (merged, _, _) = merge::merge_records(existing, batch);
    assert_eq!(merged[0].year, 1990);
    assert_eq!(merged[1].year, 1995);
}

#[test]
fn merge_snapshot_rewrites_the_file_and_backs_it_up() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("archive.csv");
    let batch = dir.path().join("batch.csv");

    let existing = RecordSet::from_records(vec![rec("a1", 1990, 1, "Sam West")]);
    std::fs::write(&snapshot, existing.to_csv()).unwrap();
    let incoming = RecordSet::from_records(vec![
        rec("a1", 1990, 2, "Sam West"),
        rec("a2", 1991, 1, "Bob Hart"),
    ]);
    std::fs::write(&batch, incoming.to_csv()).unwrap();

    let summary = merge::merge_snapshot(&snapshot, &batch, true).unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.added, 1);
    assert_eq!(summary.total, 2);

    let backup = summary.backup.expect("backup path");
    assert!(backup.exists());
    assert!(backup
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("archive_backup_"));

    // The pre-merge state survives in the backup, the merge in the snapshot.
    let rewritten = store::load(&snapshot).unwrap();
    assert_eq!(rewritten.len(), 2);
    let original = store::load(&backup).unwrap();
    assert_eq!(original.len(), 1);
    assert_eq!(original.records()[0].placement, 1);
}

#[test]
fn merge_without_backup_leaves_only_the_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("archive.csv");
    let batch = dir.path().join("batch.csv");
    std::fs::write(
        &snapshot,
        RecordSet::from_records(vec![rec("a1", 1990, 1, "Sam West")]).to_csv(),
    )
    .unwrap();
    std::fs::write(
        &batch,
        RecordSet::from_records(vec![rec("a2", 1991, 1, "Bob Hart")]).to_csv(),
    )
    .unwrap();

    let summary = merge::merge_snapshot(&snapshot, &batch, false).unwrap();
    assert!(summary.backup.is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}
