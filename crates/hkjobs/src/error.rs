use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HkJobsError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request for '{url}' failed after {attempts} attempts: {source}")]
    Http {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode JSON from '{url}': {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to launch headless browser: {0}")]
    BrowserLaunch(String),

    #[error("Headless fetch of '{url}' failed: {message}")]
    Rendered { url: String, message: String },
}

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("No listings found at '{url}' ({what})")]
    MissingContent { what: &'static str, url: String },
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write dataset '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to replace dataset '{path}': {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, HkJobsError>;
