//! Record source: loads and decodes the dataset for a job.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{Job, Record};
use crate::storage::Storage;

/// Where the dataset for a job lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetLocator {
    /// One dataset per job: `<dir>/<job>.json`.
    PerJob {
        /// Directory holding the datasets
        dir: PathBuf,
    },
    /// Every job reads the same dataset.
    Shared(PathBuf),
}

impl DatasetLocator {
    /// Per-job datasets under `dir`.
    pub fn per_job(dir: impl Into<PathBuf>) -> Self {
        DatasetLocator::PerJob { dir: dir.into() }
    }

    /// A single dataset shared by all jobs.
    pub fn shared(path: impl Into<PathBuf>) -> Self {
        DatasetLocator::Shared(path.into())
    }

    /// Resolve the dataset path for a job.
    pub fn resolve(&self, job: &Job) -> PathBuf {
        match self {
            DatasetLocator::PerJob { dir } => dir.join(job.dataset_file_name()),
            DatasetLocator::Shared(path) => path.clone(),
        }
    }
}

impl Default for DatasetLocator {
    fn default() -> Self {
        DatasetLocator::per_job("data")
    }
}

/// Loads the records for a job.
///
/// Loading is all-or-nothing: on failure no partial record list is
/// returned.
pub trait RecordSource: Send + Sync {
    /// Load every record for `job`, in dataset order.
    fn load(&self, job: &Job) -> Result<Vec<Record>>;
}

/// [`RecordSource`] reading JSON arrays of records through a [`Storage`].
pub struct JsonRecordSource {
    locator: DatasetLocator,
    storage: Arc<dyn Storage>,
}

impl JsonRecordSource {
    /// Create a source resolving datasets with `locator`.
    pub fn new(locator: DatasetLocator, storage: Arc<dyn Storage>) -> Self {
        Self { locator, storage }
    }

    /// The dataset locator in use.
    pub fn locator(&self) -> &DatasetLocator {
        &self.locator
    }
}

impl RecordSource for JsonRecordSource {
    fn load(&self, job: &Job) -> Result<Vec<Record>> {
        let path = self.locator.resolve(job);
        let data = self
            .storage
            .read(&path)
            .map_err(|e| read_error(&path, e))?;

        let records = decode_records(&path, &data)?;
        log::debug!(
            "Loaded {} records for {} from {}",
            records.len(),
            job,
            path.display()
        );
        Ok(records)
    }
}

/// Decode a JSON array of records.
pub fn decode_records(path: &Path, data: &[u8]) -> Result<Vec<Record>> {
    serde_json::from_slice(data).map_err(|source| Error::DatasetDecode {
        path: path.to_path_buf(),
        source,
    })
}

fn read_error(path: &Path, err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::NotFound => Error::DatasetNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::DatasetRead {
            path: path.to_path_buf(),
            source: err,
        },
    }
}
