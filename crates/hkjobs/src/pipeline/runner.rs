use std::collections::HashMap;
use std::thread;

use crossbeam_channel::bounded;
use tracing::{info, info_span, warn};

use crate::adapters::{AdapterRegistry, RawPosting};
use crate::dataset;
use crate::error::{HkJobsError, Result};
use crate::fetch::{FetchConfig, Fetcher};
use crate::merge::{self, ScrapeStatus};
use crate::normalize;
use crate::pipeline::RunConfig;
use crate::record::University;

/// What a run did, for the caller to report.
#[derive(Debug)]
pub struct RunSummary {
    pub total: usize,
    pub new_count: usize,
    pub retained: usize,
    pub failures: Vec<University>,
}

/// Drives one aggregation run: scrape all target institutions in parallel,
/// normalize, reconcile against the previous dataset, write the new one.
pub struct Runner {
    config: RunConfig,
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<RunSummary> {
        let span = info_span!("run", date = %self.config.run_date);
        let _guard = span.enter();

        let previous = dataset::read_dataset(&self.config.output_path)?;
        let targets = self.config.targets();
        info!(targets = targets.len(), previous = previous.len(), "starting run");

        let results = scrape_all(&targets, &self.config.fetch);

        let mut statuses: HashMap<University, ScrapeStatus> = University::ALL
            .into_iter()
            .filter(|uni| !targets.contains(uni))
            .map(|uni| (uni, ScrapeStatus::Skipped))
            .collect();

        let mut candidates = Vec::new();
        let mut failures = Vec::new();
        for (university, result) in results {
            match result {
                Ok(postings) => {
                    info!(%university, count = postings.len(), "scrape finished");
                    statuses.insert(university, ScrapeStatus::Scraped(postings.len()));
                    candidates.extend(
                        postings
                            .iter()
                            .map(|raw| normalize::normalize(raw, university, self.config.run_date)),
                    );
                }
                Err(e) => {
                    warn!(%university, error = %e, "scrape failed");
                    statuses.insert(university, ScrapeStatus::Failed);
                    failures.push(university);
                }
            }
        }
        failures.sort_by_key(University::code);

        let outcome = merge::merge(
            candidates,
            &previous,
            &statuses,
            self.config.run_date,
            self.config.retention_days,
        );
        dataset::write_dataset(&self.config.output_path, &outcome.records)?;

        info!(
            total = outcome.records.len(),
            new = outcome.new_count,
            retained = outcome.retained,
            failed = failures.len(),
            "run finished"
        );
        Ok(RunSummary {
            total: outcome.records.len(),
            new_count: outcome.new_count,
            retained: outcome.retained,
            failures,
        })
    }
}

type ScrapeResult = (University, std::result::Result<Vec<RawPosting>, HkJobsError>);

/// One thread per institution, each with its own `Fetcher` (and so its own
/// browser, launched only if that institution needs one).
fn scrape_all(targets: &[University], fetch: &FetchConfig) -> Vec<ScrapeResult> {
    let (tx, rx) = bounded::<ScrapeResult>(targets.len());

    let mut handles = Vec::with_capacity(targets.len());
    for &university in targets {
        let tx = tx.clone();
        let fetch = fetch.clone();
        handles.push(thread::spawn(move || {
            let span = info_span!("scrape", %university);
            let _guard = span.enter();
            let result = scrape_one(university, fetch);
            // The receiver outlives all senders; a send failure means the
            // whole run is already gone.
            let _ = tx.send((university, result));
        }));
    }
    drop(tx);

    let mut results: Vec<ScrapeResult> = rx.iter().collect();
    for handle in handles {
        let _ = handle.join();
    }
    results.sort_by_key(|(university, _)| university.code());
    results
}

fn scrape_one(
    university: University,
    fetch: FetchConfig,
) -> std::result::Result<Vec<RawPosting>, HkJobsError> {
    let fetcher = Fetcher::new(fetch)?;
    let adapter = AdapterRegistry::create(university);
    Ok(adapter.scrape(&fetcher)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_reports_counts() {
        let summary = RunSummary {
            total: 12,
            new_count: 3,
            retained: 2,
            failures: vec![University::Cuhk],
        };
        assert_eq!(summary.total, 12);
        assert_eq!(summary.failures, vec![University::Cuhk]);
    }
}
