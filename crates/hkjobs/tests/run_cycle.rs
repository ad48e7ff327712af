//! Two simulated daily runs through the full normalize → merge → write →
//! read cycle, exercising novelty flags, first-seen dates, and failure
//! retention without touching the network.

use std::collections::HashMap;

use chrono::NaiveDate;
use hkjobs::adapters::RawPosting;
use hkjobs::{dataset, merge, normalize, ScrapeStatus, University};

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn posting(title: &str, reference: &str, deadline: &str) -> RawPosting {
    RawPosting {
        title: title.to_string(),
        reference: Some(reference.to_string()),
        apply_url: format!("https://example.edu/job/{reference}"),
        department: "Department of Computing".to_string(),
        deadline_text: Some(deadline.to_string()),
        ..RawPosting::default()
    }
}

#[test]
fn test_two_runs_track_novelty_and_survive_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.csv");

    // Day one: HKU and CUHK both scrape successfully.
    let day1 = day("2026-08-28");
    let candidates = vec![
        normalize::normalize(
            &posting("Assistant Professor in Computer Science", "530021", "30 September 2026"),
            University::Hku,
            day1,
        ),
        normalize::normalize(
            &posting("Professor of Surgery", "250101", "15 October 2026"),
            University::Cuhk,
            day1,
        ),
    ];
    let statuses: HashMap<University, ScrapeStatus> = [
        (University::Hku, ScrapeStatus::Scraped(1)),
        (University::Cuhk, ScrapeStatus::Scraped(1)),
    ]
    .into_iter()
    .collect();

    let outcome = merge::merge(candidates, &[], &statuses, day1, 30);
    assert_eq!(outcome.new_count, 2);
    assert!(outcome.records.iter().all(|r| r.is_new));
    dataset::write_dataset(&path, &outcome.records).unwrap();

    // Day two: HKU returns the same posting plus one more, CUHK fails.
    let previous = dataset::read_dataset(&path).unwrap();
    assert_eq!(previous.len(), 2);

    let day2 = day("2026-08-29");
    let candidates = vec![
        normalize::normalize(
            &posting("Assistant Professor in Computer Science", "530021", "30 September 2026"),
            University::Hku,
            day2,
        ),
        normalize::normalize(
            &posting("Lecturer in Statistics", "530099", "31 October 2026"),
            University::Hku,
            day2,
        ),
    ];
    let statuses: HashMap<University, ScrapeStatus> = [
        (University::Hku, ScrapeStatus::Scraped(2)),
        (University::Cuhk, ScrapeStatus::Failed),
    ]
    .into_iter()
    .collect();

    let outcome = merge::merge(candidates, &previous, &statuses, day2, 30);
    dataset::write_dataset(&path, &outcome.records).unwrap();
    let records = dataset::read_dataset(&path).unwrap();
    assert_eq!(records.len(), 3);

    let resighted = records.iter().find(|r| r.id == "HKU-530021").unwrap();
    assert!(!resighted.is_new);
    assert_eq!(resighted.date_added, day1);

    let fresh = records.iter().find(|r| r.id == "HKU-530099").unwrap();
    assert!(fresh.is_new);
    assert_eq!(fresh.date_added, day2);

    // CUHK's record survived the failed scrape, un-flagged.
    let carried = records.iter().find(|r| r.id == "CUHK-250101").unwrap();
    assert!(!carried.is_new);
    assert_eq!(carried.date_added, day1);

    // Deterministic ordering: CUHK sorts before HKU, deadlines ascending.
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["CUHK-250101", "HKU-530021", "HKU-530099"]);
}
