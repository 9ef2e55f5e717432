//! # rosterpdf
//!
//! Concurrent generation of employee roster PDFs.
//!
//! Each job names one report. A fixed pool of workers drains a bounded job
//! queue; every worker loads the job's records, renders a QR code for the
//! page header, lays out a tabular A4 document and writes it to
//! `<output_dir>/<job>.pdf`. A failing job is reported on its own and never
//! stops its siblings.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rosterpdf::{generate_reports, ReportOptions};
//!
//! fn main() -> rosterpdf::Result<()> {
//!     let options = ReportOptions::new().with_workers(4);
//!     let summary = generate_reports(["zaposleni-0", "zaposleni-1"], &options)?;
//!     println!("{} of {} reports written", summary.succeeded, summary.attempted);
//!     Ok(())
//! }
//! ```
//!
//! ## Components
//!
//! - **Record source** ([`source`]): JSON datasets decoded into [`Record`]s
//! - **Asset provisioner** ([`asset`]): QR code PNGs backed by temporary files
//! - **Layout engine** ([`layout`]): header, table body and footer on A4
//! - **Dispatcher** ([`dispatch`]): bounded queue and worker pool
//! - **Storage** ([`storage`]): filesystem access behind a trait

pub mod asset;
pub mod dispatch;
pub mod error;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod source;
pub mod storage;

// Re-export commonly used types
pub use asset::{AssetRef, AssetStorage, QrProvisioner};
pub use dispatch::{
    BatchSummary, Dispatcher, JobHandler, JobOutcome, JobOutput, JobReport, LogSink, ReportSink,
    Submitter,
};
pub use error::{Error, Result, Stage};
pub use layout::{LayoutEngine, LayoutOptions};
pub use model::{Document, Job, Page, Record, Row};
pub use pipeline::{ReportGenerator, ReportOptions};
pub use source::{DatasetLocator, JsonRecordSource, RecordSource};
pub use storage::{LocalStorage, MemoryStorage, Storage};

use std::path::PathBuf;
use std::sync::Arc;

/// Generate one report per name on the local filesystem.
///
/// Returns once every job has been attempted. Individual failures are in
/// the summary, not in the `Err` case.
///
/// # Example
///
/// ```no_run
/// use rosterpdf::{generate_reports, ReportOptions};
///
/// let summary = generate_reports(["zaposleni-0"], &ReportOptions::default()).unwrap();
/// for report in summary.failures() {
///     eprintln!("{}: {}", report.job, report.error().unwrap());
/// }
/// ```
pub fn generate_reports<I, S>(names: I, options: &ReportOptions) -> Result<BatchSummary>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Rosterpdf::with_options(options.clone()).run(names)
}

/// Generate a single report on the local filesystem, returning its path.
///
/// # Example
///
/// ```no_run
/// use rosterpdf::{generate_report, ReportOptions};
///
/// let path = generate_report("zaposleni-0", &ReportOptions::default())?;
/// println!("wrote {}", path.display());
/// # Ok::<(), rosterpdf::Error>(())
/// ```
pub fn generate_report(name: &str, options: &ReportOptions) -> Result<PathBuf> {
    let job = Job::new(name)?;
    let generator = ReportGenerator::new(options, Arc::new(LocalStorage::new()));
    generator.generate(&job).map(|output| output.path)
}

/// Builder for running a batch of report jobs.
///
/// # Example
///
/// ```no_run
/// use rosterpdf::{DatasetLocator, Rosterpdf};
///
/// let summary = Rosterpdf::new()
///     .workers(4)
///     .output_dir("out")
///     .dataset(DatasetLocator::shared("generated.json"))
///     .logo("assets/logo.png")
///     .run(["zaposleni-0", "zaposleni-1"])?;
/// assert_eq!(summary.attempted, 2);
/// # Ok::<(), rosterpdf::Error>(())
/// ```
pub struct Rosterpdf {
    options: ReportOptions,
    storage: Arc<dyn Storage>,
}

impl Rosterpdf {
    /// Create a builder with default options on the local filesystem.
    pub fn new() -> Self {
        Self::with_options(ReportOptions::default())
    }

    /// Create a builder from existing options.
    pub fn with_options(options: ReportOptions) -> Self {
        Self {
            options,
            storage: Arc::new(LocalStorage::new()),
        }
    }

    /// Set the number of workers.
    pub fn workers(mut self, workers: usize) -> Self {
        self.options = self.options.with_workers(workers);
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_output_dir(dir);
        self
    }

    /// Set the dataset locator.
    pub fn dataset(mut self, dataset: DatasetLocator) -> Self {
        self.options = self.options.with_dataset(dataset);
        self
    }

    /// Set the logo path.
    pub fn logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_logo(path);
        self
    }

    /// Set the QR payload.
    pub fn qr_payload(mut self, payload: impl Into<String>) -> Self {
        self.options = self.options.with_qr_payload(payload);
        self
    }

    /// Use a different storage backend.
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = storage;
        self
    }

    /// The options that will be used.
    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Run every job, logging each report.
    pub fn run<I, S>(self, names: I) -> Result<BatchSummary>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_with_sink(names, &LogSink)
    }

    /// Run every job, sending reports to `sink`.
    pub fn run_with_sink<I, S>(self, names: I, sink: &dyn ReportSink) -> Result<BatchSummary>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dispatcher = Dispatcher::new(self.options.workers)?;
        let generator = ReportGenerator::new(&self.options, self.storage);
        dispatcher.process(names, &generator, sink)
    }
}

impl Default for Rosterpdf {
    fn default() -> Self {
        Self::new()
    }
}
