//! Per-job report pipeline.
//!
//! [`ReportGenerator`] is the [`JobHandler`] the dispatcher runs for every
//! job: load records, generate the QR asset, lay out the document, write
//! it to storage. Everything it creates for a job is owned by that call.

mod options;

pub use options::ReportOptions;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::asset::{AssetRef, QrProvisioner};
use crate::dispatch::{JobHandler, JobOutput};
use crate::error::{Error, Result};
use crate::layout::{LayoutEngine, RasterImage};
use crate::model::{Document, Job};
use crate::source::{JsonRecordSource, RecordSource};
use crate::storage::Storage;

/// Generates one report per job.
pub struct ReportGenerator {
    source: Box<dyn RecordSource>,
    provisioner: QrProvisioner,
    engine: LayoutEngine,
    storage: Arc<dyn Storage>,
    output_dir: PathBuf,
    qr_payload: String,
}

impl ReportGenerator {
    /// Create a generator reading JSON datasets through `storage`.
    pub fn new(options: &ReportOptions, storage: Arc<dyn Storage>) -> Self {
        let source = JsonRecordSource::new(options.dataset.clone(), Arc::clone(&storage));
        Self {
            source: Box::new(source),
            provisioner: QrProvisioner::new().with_storage(options.asset_storage),
            engine: LayoutEngine::new(options.layout.clone()),
            storage,
            output_dir: options.output_dir.clone(),
            qr_payload: options.qr_payload.clone(),
        }
    }

    /// Replace the record source.
    pub fn with_source(mut self, source: impl RecordSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Replace the QR provisioner.
    pub fn with_provisioner(mut self, provisioner: QrProvisioner) -> Self {
        self.provisioner = provisioner;
        self
    }

    /// Where `job`'s report is written.
    pub fn output_path(&self, job: &Job) -> PathBuf {
        self.output_dir.join(job.output_file_name())
    }

    /// Build the document for `job` without writing it.
    pub fn render(&self, job: &Job) -> Result<Document> {
        let records = self.source.load(job)?;
        let logo = self.load_logo()?;
        let asset = self.provision_asset(job);

        let document = self.engine.build(
            &records,
            &logo,
            asset.as_ref(),
            &self.engine.options().title,
        )?;

        if let Some(asset) = asset {
            if let Err(e) = asset.release() {
                log::warn!("{}: failed to remove QR asset: {}", job, e);
            }
        }
        Ok(document)
    }

    /// Run the full pipeline for `job`.
    pub fn generate(&self, job: &Job) -> Result<JobOutput> {
        log::debug!("generating report for {}", job);

        let document = self.render(job)?;
        for page in document.pages.iter().filter(|p| p.overflow_rows > 0) {
            log::warn!(
                "{}: {} of {} rows extend past the bottom margin of page {}",
                job,
                page.overflow_rows,
                page.rows.len(),
                page.number
            );
        }

        let path = self.output_path(job);
        self.commit(&path, &document)?;

        Ok(JobOutput {
            path,
            pages: document.page_count(),
            rows: document.row_count(),
            overflow_rows: document.overflow_rows(),
            asset_embedded: document.pages.iter().all(|p| p.header.has_asset),
        })
    }

    fn load_logo(&self) -> Result<RasterImage> {
        let path = &self.engine.options().logo_path;
        let data = self
            .storage
            .read(path)
            .map_err(|e| Error::Layout(format!("cannot read logo {}: {}", path.display(), e)))?;
        RasterImage::decode("logo", &data)
    }

    fn provision_asset(&self, job: &Job) -> Option<AssetRef> {
        match self.provisioner.generate(&self.qr_payload) {
            Ok(asset) => Some(asset),
            Err(e) => {
                log::warn!("{}: can't generate QR code, continuing without it: {}", job, e);
                None
            }
        }
    }

    fn commit(&self, path: &Path, document: &Document) -> Result<()> {
        self.storage
            .create_dir_all(&self.output_dir)
            .map_err(|source| Error::OutputDir {
                path: self.output_dir.clone(),
                source,
            })?;

        self.storage
            .write(path, document.data())
            .map_err(|source| Error::OutputWrite {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl JobHandler for ReportGenerator {
    fn handle(&self, job: &Job) -> Result<JobOutput> {
        self.generate(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetStorage;
    use crate::model::Record;
    use crate::source::DatasetLocator;
    use crate::storage::MemoryStorage;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::{self, Cursor};

    fn logo_png() -> Vec<u8> {
        let mut buf = Vec::new();
        RgbaImage::from_pixel(6, 3, Rgba([0, 80, 160, 255]))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn storage_with(dataset: &str) -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert("assets/logo.png", logo_png());
        storage.insert("data/a.json", dataset);
        storage
    }

    fn options() -> ReportOptions {
        ReportOptions::new().with_asset_storage(AssetStorage::Memory)
    }

    const DATASET: &str = r#"[
        {"name": "Ana", "age": 31, "email": "ana@example.com", "phone": "111", "address": "A 1"},
        {"name": "Bora", "age": 45, "email": "bora@example.com", "phone": "222", "address": "B 2"}
    ]"#;

    #[test]
    fn test_generate_writes_report() {
        let storage = storage_with(DATASET);
        let generator = ReportGenerator::new(&options(), storage.clone());
        let output = generator.generate(&Job::new("a").unwrap()).unwrap();

        assert_eq!(output.path, PathBuf::from("pdfs/a.pdf"));
        assert_eq!(output.rows, 2);
        assert_eq!(output.pages, 1);
        assert!(output.asset_embedded);
        assert_eq!(storage.created_dirs(), vec![PathBuf::from("pdfs")]);

        let data = storage.get(Path::new("pdfs/a.pdf")).unwrap();
        assert!(data.starts_with(b"%PDF"));
    }

    #[test]
    fn test_missing_dataset_writes_nothing() {
        let storage = storage_with(DATASET);
        let generator = ReportGenerator::new(&options(), storage.clone());
        let err = generator.generate(&Job::new("b").unwrap()).unwrap_err();

        assert!(matches!(err, Error::DatasetNotFound { .. }));
        assert!(!storage.contains(Path::new("pdfs/b.pdf")));
    }

    #[test]
    fn test_missing_logo_fails_job() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert("data/a.json", DATASET);
        let generator = ReportGenerator::new(&options(), storage.clone());
        let err = generator.generate(&Job::new("a").unwrap()).unwrap_err();

        assert!(matches!(err, Error::Layout(_)));
        assert!(storage.paths().iter().all(|p| !p.starts_with("pdfs")));
    }

    #[test]
    fn test_asset_failure_degrades() {
        let storage = storage_with(DATASET);
        let options = options().with_qr_payload("x".repeat(8000));
        let generator = ReportGenerator::new(&options, storage.clone());
        let output = generator.generate(&Job::new("a").unwrap()).unwrap();

        assert!(!output.asset_embedded);
        assert_eq!(output.rows, 2);
        assert!(storage.contains(Path::new("pdfs/a.pdf")));
    }

    #[test]
    fn test_overflow_counted_per_job() {
        struct Generated(usize);

        impl RecordSource for Generated {
            fn load(&self, _job: &Job) -> Result<Vec<Record>> {
                Ok((0..self.0)
                    .map(|i| Record::new(format!("R{}", i), 30, "r@r", "0", "R"))
                    .collect())
            }
        }

        let storage = storage_with("[]");
        let long = ReportGenerator::new(&options(), storage.clone()).with_source(Generated(30));
        let short = ReportGenerator::new(&options(), storage.clone()).with_source(Generated(5));

        let output = long.generate(&Job::new("long").unwrap()).unwrap();
        assert_eq!(output.rows, 30);
        assert_eq!(output.overflow_rows, 8);
        assert!(storage.contains(Path::new("pdfs/long.pdf")));

        let output = short.generate(&Job::new("short").unwrap()).unwrap();
        assert_eq!(output.overflow_rows, 0);
    }

    #[test]
    fn test_custom_source() {
        struct Fixed;

        impl RecordSource for Fixed {
            fn load(&self, _job: &Job) -> Result<Vec<Record>> {
                Ok(vec![Record::new("Zed", 50, "z@z", "0", "Z")])
            }
        }

        let storage = storage_with("[]");
        let generator = ReportGenerator::new(&options(), storage).with_source(Fixed);
        let doc = generator.render(&Job::new("anything").unwrap()).unwrap();
        assert_eq!(doc.rows().next().and_then(|r| r.name()), Some("Zed"));
    }

    #[test]
    fn test_write_failure_is_output_error() {
        struct ReadOnly(MemoryStorage);

        impl Storage for ReadOnly {
            fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
                self.0.read(path)
            }
            fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
                Ok(())
            }
            fn write(&self, _path: &Path, _data: &[u8]) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
            }
        }

        let inner = MemoryStorage::new();
        inner.insert("assets/logo.png", logo_png());
        inner.insert("shared.json", DATASET);
        let options = options().with_dataset(DatasetLocator::shared("shared.json"));
        let generator = ReportGenerator::new(&options, Arc::new(ReadOnly(inner)));

        let err = generator.generate(&Job::new("a").unwrap()).unwrap_err();
        assert!(matches!(err, Error::OutputWrite { .. }));
        assert_eq!(err.stage(), crate::Stage::Output);
    }
}
