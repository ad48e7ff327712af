//! Reading and writing the flat CSV dataset. Writes go through a temporary
//! file in the same directory followed by a rename, so a crash mid-write
//! never leaves a truncated dataset behind.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::DatasetError;
use crate::record::JobRecord;

/// Load the previous run's dataset. A missing file is a first run and yields
/// an empty dataset; rows that fail to deserialize are logged and skipped so
/// one bad row cannot poison the whole merge.
pub fn read_dataset(path: &Path) -> Result<Vec<JobRecord>, DatasetError> {
    if !path.exists() {
        info!(path = %path.display(), "no previous dataset, starting fresh");
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<JobRecord>() {
        match row {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                warn!(path = %path.display(), error = %e, "skipping malformed dataset row");
            }
        }
    }
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "dataset rows dropped while loading");
    }
    info!(path = %path.display(), count = records.len(), "loaded previous dataset");
    Ok(records)
}

/// Serialize the dataset and atomically replace the file at `path`.
pub fn write_dataset(path: &Path, records: &[JobRecord]) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| DatasetError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let tmp = path.with_extension("csv.tmp");
    let mut writer = csv::Writer::from_path(&tmp).map_err(|source| DatasetError::Write {
        path: tmp.clone(),
        source,
    })?;
    for record in records {
        writer.serialize(record).map_err(|source| DatasetError::Write {
            path: tmp.clone(),
            source,
        })?;
    }
    writer.flush().map_err(|source| DatasetError::Write {
        path: tmp.clone(),
        source: csv::Error::from(source),
    })?;
    drop(writer);

    fs::rename(&tmp, path).map_err(|source| DatasetError::Replace {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), count = records.len(), "dataset written");
    Ok(())
}
