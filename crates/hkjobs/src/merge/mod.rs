//! Run-over-run reconciliation: novelty flags, stable first-seen dates, and
//! retention of records from institutions whose scrape did not succeed.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use crate::record::{JobRecord, University};

/// How a single institution's scrape ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeStatus {
    /// The adapter ran to completion and returned this many postings.
    Scraped(usize),
    /// The adapter returned an error.
    Failed,
    /// The institution was not attempted this run.
    Skipped,
}

#[derive(Debug)]
pub struct MergeOutcome {
    pub records: Vec<JobRecord>,
    /// Records flagged `is_new` in this run.
    pub new_count: usize,
    /// Records carried over from institutions whose scrape did not succeed.
    pub retained: usize,
}

/// Keep a record until its deadline is this many days in the past.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// A record with no deadline is open-ended and always kept; one with a
/// deadline survives until `retention_days` after it passes. A window too
/// large to represent keeps everything rather than panicking.
pub fn within_retention(
    deadline: Option<NaiveDate>,
    run_date: NaiveDate,
    retention_days: i64,
) -> bool {
    let Some(deadline) = deadline else {
        return true;
    };
    match Duration::try_days(retention_days) {
        Some(window) => deadline
            .checked_add_signed(window)
            .map_or(true, |end| end >= run_date),
        None => true,
    }
}

/// Reconcile this run's scraped candidates against the previous dataset.
///
/// Candidates whose id appeared before keep their original `date_added` and
/// are not new; unseen ids get `date_added = run_date` and `is_new = TRUE`.
/// Ids absent from the candidates are dropped, except that an institution
/// whose scrape failed, was skipped, or came back empty while the previous
/// dataset had records for it keeps its previous records unchanged (with
/// `is_new` forced off). The output ordering is deterministic.
pub fn merge(
    candidates: Vec<JobRecord>,
    previous: &[JobRecord],
    statuses: &HashMap<University, ScrapeStatus>,
    run_date: NaiveDate,
    retention_days: i64,
) -> MergeOutcome {
    let previous_by_id: HashMap<&str, &JobRecord> =
        previous.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut previous_counts: HashMap<University, usize> = HashMap::new();
    for record in previous {
        *previous_counts.entry(record.university).or_default() += 1;
    }

    // An empty result from an institution that had records last run looks
    // like a rendering failure, not a cleared job board.
    let retain_for: HashSet<University> = University::ALL
        .into_iter()
        .filter(|uni| {
            let had_records = previous_counts.get(uni).copied().unwrap_or(0) > 0;
            match statuses.get(uni) {
                Some(ScrapeStatus::Scraped(0)) | None => had_records,
                Some(ScrapeStatus::Scraped(_)) => false,
                Some(ScrapeStatus::Failed) | Some(ScrapeStatus::Skipped) => had_records,
            }
        })
        .collect();

    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();
    let mut new_count = 0usize;

    for mut candidate in candidates {
        if !seen_ids.insert(candidate.id.clone()) {
            debug!(id = %candidate.id, "duplicate id within run, keeping first");
            continue;
        }
        if !within_retention(candidate.deadline, run_date, retention_days) {
            continue;
        }
        match previous_by_id.get(candidate.id.as_str()) {
            Some(prior) => {
                candidate.date_added = prior.date_added;
                candidate.is_new = false;
            }
            None => {
                candidate.date_added = run_date;
                candidate.is_new = true;
                new_count += 1;
            }
        }
        records.push(candidate);
    }

    let mut retained = 0usize;
    for record in previous {
        if !retain_for.contains(&record.university) || seen_ids.contains(record.id.as_str()) {
            continue;
        }
        if !within_retention(record.deadline, run_date, retention_days) {
            continue;
        }
        let mut kept = record.clone();
        kept.is_new = false;
        seen_ids.insert(kept.id.clone());
        retained += 1;
        records.push(kept);
    }
    if retained > 0 {
        info!(retained, "carried records from institutions without a successful scrape");
    }

    records.sort_by(|a, b| {
        (a.university.code(), a.deadline.unwrap_or(NaiveDate::MAX), &a.id).cmp(&(
            b.university.code(),
            b.deadline.unwrap_or(NaiveDate::MAX),
            &b.id,
        ))
    });

    MergeOutcome {
        records,
        new_count,
        retained,
    }
}
