//! Aggregates academic job postings from the eight Hong Kong university
//! career portals into one flat CSV dataset, tracking which postings are new
//! and when each was first seen.

pub mod adapters;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod record;

pub use error::{HkJobsError, Result};
pub use merge::{MergeOutcome, ScrapeStatus};
pub use pipeline::{RunConfig, RunSummary, Runner};
pub use record::{JobRecord, PositionType, RankCategory, University};
