use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hkjobs::{RunConfig, Runner, University};

#[derive(Parser)]
#[command(
    name = "hkjobs",
    version,
    about = "Aggregate academic job postings from Hong Kong university career portals into a CSV dataset"
)]
struct Cli {
    /// Scrape only this institution (e.g. HKU, PolyU, CUHK); others keep
    /// their records from the previous run.
    university: Option<String>,

    /// CSV dataset to read as previous state and rewrite.
    #[arg(short, long, default_value = "jobs.csv")]
    output: PathBuf,

    /// Days a posting is kept after its deadline passes.
    #[arg(long, default_value_t = 30)]
    retention_days: i64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = RunConfig::new(cli.output);
    config.retention_days = cli.retention_days;
    if let Some(code) = &cli.university {
        match University::from_code(code) {
            Some(university) => config.only = Some(university),
            None => {
                let known = University::ALL.map(|u| u.code()).join(", ");
                eprintln!("unknown university code '{code}' (known: {known})");
                return ExitCode::from(2);
            }
        }
    }

    match Runner::new(config).run() {
        Ok(summary) => {
            println!(
                "{} postings ({} new, {} carried over)",
                summary.total, summary.new_count, summary.retained
            );
            if !summary.failures.is_empty() {
                let failed: Vec<&str> = summary.failures.iter().map(|u| u.code()).collect();
                eprintln!("scrape failed for: {}", failed.join(", "));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("run failed: {e}");
            ExitCode::FAILURE
        }
    }
}
