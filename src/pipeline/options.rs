//! Report generation options.

use std::path::PathBuf;

use crate::asset::AssetStorage;
use crate::layout::LayoutOptions;
use crate::source::DatasetLocator;

/// Options for a batch of report jobs.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Number of worker threads (and queue capacity)
    pub workers: usize,

    /// Directory receiving `<job>.pdf` files; created if absent
    pub output_dir: PathBuf,

    /// Where each job's dataset is read from
    pub dataset: DatasetLocator,

    /// Text encoded in the header QR code
    pub qr_payload: String,

    /// How QR assets are backed while a job runs
    pub asset_storage: AssetStorage,

    /// Layout options
    pub layout: LayoutOptions,
}

impl ReportOptions {
    /// Create new report options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the dataset locator.
    pub fn with_dataset(mut self, dataset: DatasetLocator) -> Self {
        self.dataset = dataset;
        self
    }

    /// Set the QR payload.
    pub fn with_qr_payload(mut self, payload: impl Into<String>) -> Self {
        self.qr_payload = payload.into();
        self
    }

    /// Set how QR assets are backed.
    pub fn with_asset_storage(mut self, storage: AssetStorage) -> Self {
        self.asset_storage = storage;
        self
    }

    /// Set layout options.
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    /// Set the logo path.
    pub fn with_logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.layout = self.layout.with_logo(path);
        self
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            workers: 10,
            output_dir: PathBuf::from("pdfs"),
            dataset: DatasetLocator::default(),
            qr_payload: "https://miff.me".to_string(),
            asset_storage: AssetStorage::TempFile,
            layout: LayoutOptions::default(),
        }
    }
}
