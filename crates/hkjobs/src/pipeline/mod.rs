pub mod config;
pub mod runner;

pub use config::RunConfig;
pub use runner::{RunSummary, Runner};
