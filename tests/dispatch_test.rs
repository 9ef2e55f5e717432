//! Integration tests for the dispatcher running the report pipeline on
//! in-memory storage.

use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{ImageFormat, Luma, GrayImage};
use rosterpdf::{
    AssetStorage, DatasetLocator, Dispatcher, Job, JobHandler, JobOutput, JobReport, LogSink,
    MemoryStorage, ReportGenerator, ReportOptions, ReportSink, Result,
};

fn memory_storage(dataset: &str) -> Arc<MemoryStorage> {
    let mut logo = Vec::new();
    GrayImage::from_pixel(8, 8, Luma([90]))
        .write_to(&mut Cursor::new(&mut logo), ImageFormat::Png)
        .unwrap();

    let storage = Arc::new(MemoryStorage::new());
    storage.insert("assets/logo.png", logo);
    storage.insert("generated.json", dataset);
    storage
}

fn options() -> ReportOptions {
    ReportOptions::new()
        .with_dataset(DatasetLocator::shared("generated.json"))
        .with_asset_storage(AssetStorage::Memory)
}

/// Records every finished report.
#[derive(Default)]
struct Collecting {
    jobs: Mutex<Vec<String>>,
}

impl ReportSink for Collecting {
    fn job_finished(&self, report: &JobReport) {
        self.jobs.lock().unwrap().push(report.job.clone());
    }
}

#[test]
fn test_every_job_written_once_for_any_worker_count() {
    let dataset = r#"[{"name": "Ana", "age": 31, "email": "a@b.c", "phone": "1", "address": "X"}]"#;

    for workers in 1..=5 {
        let storage = memory_storage(dataset);
        let generator = ReportGenerator::new(&options(), storage.clone());
        let sink = Collecting::default();
        let names: Vec<String> = (0..12).map(|i| format!("job-{}", i)).collect();

        let summary = Dispatcher::new(workers)
            .unwrap()
            .process(names.clone(), &generator, &sink)
            .unwrap();

        assert_eq!(summary.succeeded, 12, "workers = {}", workers);

        let finished = sink.jobs.lock().unwrap();
        assert_eq!(finished.len(), 12);
        let unique: HashSet<_> = finished.iter().collect();
        assert_eq!(unique.len(), 12);

        let written: Vec<PathBuf> = storage
            .paths()
            .into_iter()
            .filter(|p| p.starts_with("pdfs"))
            .collect();
        assert_eq!(written.len(), 12);
        for name in &names {
            assert!(storage.contains(&Path::new("pdfs").join(format!("{}.pdf", name))));
        }
    }
}

#[test]
fn test_decode_error_isolated_to_its_job() {
    struct Mixed {
        good: ReportGenerator,
        bad: ReportGenerator,
    }

    impl JobHandler for Mixed {
        fn handle(&self, job: &Job) -> Result<JobOutput> {
            if job.name().starts_with("bad") {
                self.bad.handle(job)
            } else {
                self.good.handle(job)
            }
        }
    }

    let good_storage = memory_storage(
        r#"[{"name": "Ana", "age": 31, "email": "a@b.c", "phone": "1", "address": "X"}]"#,
    );
    let bad_storage = memory_storage(
        r#"[{"name": "Ana", "age": "x", "email": "a@b.c", "phone": "1", "address": "X"}]"#,
    );
    let handler = Mixed {
        good: ReportGenerator::new(&options(), good_storage.clone()),
        bad: ReportGenerator::new(&options(), bad_storage.clone()),
    };

    let summary = Dispatcher::new(2)
        .unwrap()
        .process(["good-1", "bad-1", "good-2"], &handler, &LogSink)
        .unwrap();

    assert_eq!(summary.succeeded, 2);
    let bad = summary.report("bad-1").unwrap();
    assert!(bad.error().unwrap().is_decode());
    assert!(!bad_storage.contains(Path::new("pdfs/bad-1.pdf")));
    assert!(good_storage.contains(Path::new("pdfs/good-1.pdf")));
    assert!(good_storage.contains(Path::new("pdfs/good-2.pdf")));
}

#[test]
fn test_incremental_submission() {
    let storage = memory_storage("[]");
    let generator = ReportGenerator::new(&options(), storage.clone());

    let summary = Dispatcher::new(2)
        .unwrap()
        .run(&generator, &LogSink, |submitter| {
            assert!(submitter.submit("first"));
            assert!(!submitter.submit("first"));
            assert_eq!(submitter.submit_all(["second", "third"]), 2);
            assert_eq!(submitter.enqueued(), 3);
        })
        .unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.skipped_duplicates, vec!["first"]);
    assert!(summary.all_succeeded());
}

#[test]
fn test_summary_serializes() {
    let storage = memory_storage("[]");
    let generator = ReportGenerator::new(&options(), storage);

    let summary = Dispatcher::new(1)
        .unwrap()
        .process(["a", "b/c"], &generator, &LogSink)
        .unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["attempted"], 2);
    assert_eq!(json["succeeded"], 1);
    assert_eq!(json["failed"], 1);
}
