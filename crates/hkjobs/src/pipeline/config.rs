use std::path::PathBuf;

use chrono::{Local, NaiveDate};

use crate::fetch::FetchConfig;
use crate::merge::DEFAULT_RETENTION_DAYS;
use crate::record::University;

/// Settings for one aggregation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// The CSV dataset, read as last run's state and rewritten at the end.
    pub output_path: PathBuf,
    /// Restrict the run to a single institution; the rest are carried over.
    pub only: Option<University>,
    pub run_date: NaiveDate,
    pub retention_days: i64,
    pub fetch: FetchConfig,
}

impl RunConfig {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            only: None,
            run_date: Local::now().date_naive(),
            retention_days: DEFAULT_RETENTION_DAYS,
            fetch: FetchConfig::default(),
        }
    }

    /// The institutions this run will actually scrape.
    pub fn targets(&self) -> Vec<University> {
        match self.only {
            Some(uni) => vec![uni],
            None => University::ALL.to_vec(),
        }
    }
}
