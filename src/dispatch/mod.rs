//! Job dispatcher: a fixed pool of worker threads draining a bounded queue.
//!
//! The queue holds at most as many jobs as there are workers, so a
//! submitter blocks instead of buffering without limit. Dropping the
//! [`Submitter`] closes the queue; workers drain whatever is still buffered
//! and then exit. [`Dispatcher::run`] returns only after every worker has
//! exited.
//!
//! Each job's failure is caught at the worker boundary, including panics,
//! and reported for that job alone.
//!
//! # Example
//!
//! ```no_run
//! use rosterpdf::dispatch::{Dispatcher, JobHandler, JobOutput, LogSink};
//! use rosterpdf::{Job, Result};
//!
//! struct Echo;
//!
//! impl JobHandler for Echo {
//!     fn handle(&self, job: &Job) -> Result<JobOutput> {
//!         Ok(JobOutput {
//!             path: job.output_file_name().into(),
//!             pages: 1,
//!             rows: 0,
//!             overflow_rows: 0,
//!             asset_embedded: false,
//!         })
//!     }
//! }
//!
//! let summary = Dispatcher::new(2)?.run(&Echo, &LogSink, |submitter| {
//!     submitter.submit_all(["a", "b", "c"]);
//! })?;
//! assert_eq!(summary.attempted, 3);
//! # Ok::<(), rosterpdf::Error>(())
//! ```

mod report;

pub use report::{BatchSummary, JobOutcome, JobOutput, JobReport};

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::error::{Error, Result};
use crate::model::Job;

/// Processes one job.
///
/// Handlers are shared by every worker, so they must be `Sync`; any
/// per-job state lives on the stack of [`JobHandler::handle`].
pub trait JobHandler: Sync {
    /// Run the job to completion.
    fn handle(&self, job: &Job) -> Result<JobOutput>;
}

impl<F> JobHandler for F
where
    F: Fn(&Job) -> Result<JobOutput> + Sync,
{
    fn handle(&self, job: &Job) -> Result<JobOutput> {
        self(job)
    }
}

/// Receives job lifecycle events.
pub trait ReportSink: Sync {
    /// A worker picked up a job.
    fn job_started(&self, job: &Job, worker: usize) {
        log::debug!("worker {} started {}", worker, job);
    }

    /// A job finished, successfully or not.
    fn job_finished(&self, report: &JobReport);
}

/// [`ReportSink`] that writes every report to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn job_finished(&self, report: &JobReport) {
        match &report.outcome {
            JobOutcome::Succeeded(output) => {
                log::info!("PDF {} generated successfully", output.path.display());
            }
            JobOutcome::Failed { stage, error } => {
                log::error!("job {} failed at {} stage: {}", report.job, stage, error);
            }
        }
    }
}

/// Owns the worker pool configuration.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    workers: usize,
}

impl Dispatcher {
    /// Create a dispatcher with `workers` threads.
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::Other(
                "worker count must be greater than zero".to_string(),
            ));
        }
        Ok(Self { workers })
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queue capacity; equal to the worker count.
    pub fn capacity(&self) -> usize {
        self.workers
    }

    /// Start the workers, run `submit` on the calling thread to enqueue
    /// jobs, close the queue, and wait for every worker to exit.
    ///
    /// Fails only when a worker thread cannot be spawned. Job failures are
    /// reported in the returned summary.
    pub fn run<H, F>(&self, handler: &H, sink: &dyn ReportSink, submit: F) -> Result<BatchSummary>
    where
        H: JobHandler,
        F: FnOnce(&mut Submitter<'_>),
    {
        let (report_tx, report_rx) = crossbeam_channel::unbounded();

        let skipped = std::thread::scope(|scope| -> Result<Vec<String>> {
            let (queue_tx, queue_rx) = crossbeam_channel::bounded::<Job>(self.capacity());

            for id in 0..self.workers {
                let queue = queue_rx.clone();
                let reports = report_tx.clone();
                std::thread::Builder::new()
                    .name(format!("rosterpdf-worker-{}", id))
                    .spawn_scoped(scope, move || worker_loop(id, queue, handler, sink, reports))?;
            }
            drop(queue_rx);

            log::debug!("dispatcher started {} workers", self.workers);

            let mut submitter = Submitter::new(queue_tx, report_tx.clone(), sink);
            submit(&mut submitter);
            Ok(submitter.close())
        })?;

        drop(report_tx);
        let reports: Vec<JobReport> = report_rx.try_iter().collect();
        Ok(BatchSummary::new(reports, skipped))
    }

    /// Submit `names` and run them to completion.
    pub fn process<H, I, S>(&self, names: I, handler: &H, sink: &dyn ReportSink) -> Result<BatchSummary>
    where
        H: JobHandler,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run(handler, sink, |submitter| {
            submitter.submit_all(names);
        })
    }
}

/// Enqueues jobs for a running [`Dispatcher`].
///
/// Each name is accepted once; later submissions of the same name are
/// skipped. Invalid names are reported as failed jobs without reaching a
/// worker.
pub struct Submitter<'a> {
    queue: Sender<Job>,
    reports: Sender<JobReport>,
    sink: &'a dyn ReportSink,
    seen: HashSet<String>,
    skipped: Vec<String>,
    enqueued: usize,
}

impl<'a> Submitter<'a> {
    fn new(queue: Sender<Job>, reports: Sender<JobReport>, sink: &'a dyn ReportSink) -> Self {
        Self {
            queue,
            reports,
            sink,
            seen: HashSet::new(),
            skipped: Vec::new(),
            enqueued: 0,
        }
    }

    /// Enqueue one job, blocking while the queue is full.
    ///
    /// Returns `true` if the job reached the queue.
    pub fn submit(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if !self.seen.insert(name.clone()) {
            log::warn!("job {} already submitted, skipping", name);
            self.skipped.push(name);
            return false;
        }

        let job = match Job::new(name.clone()) {
            Ok(job) => job,
            Err(e) => {
                self.reject(name, e);
                return false;
            }
        };

        match self.queue.send(job) {
            Ok(()) => {
                self.enqueued += 1;
                true
            }
            Err(_) => {
                self.reject(name, Error::Other("job queue closed".to_string()));
                false
            }
        }
    }

    /// Enqueue every name in order. Returns how many reached the queue.
    pub fn submit_all<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .map(|name| self.submit(name))
            .filter(|&queued| queued)
            .count()
    }

    /// Number of jobs that reached the queue.
    pub fn enqueued(&self) -> usize {
        self.enqueued
    }

    fn reject(&self, name: String, error: Error) {
        let report = JobReport::new(name, None, Duration::ZERO, Err(error));
        self.sink.job_finished(&report);
        let _ = self.reports.send(report);
    }

    /// Close the queue, returning the skipped duplicate names.
    fn close(self) -> Vec<String> {
        self.skipped
    }
}

fn worker_loop<H: JobHandler>(
    id: usize,
    queue: Receiver<Job>,
    handler: &H,
    sink: &dyn ReportSink,
    reports: Sender<JobReport>,
) {
    // recv fails once the queue is closed and empty.
    while let Ok(job) = queue.recv() {
        sink.job_started(&job, id);
        let started = Instant::now();

        let result = match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&job))) {
            Ok(result) => result,
            Err(payload) => Err(Error::WorkerPanic(panic_message(payload.as_ref()))),
        };

        let report = JobReport::new(job.name(), Some(id), started.elapsed(), result);
        sink.job_finished(&report);
        let _ = reports.send(report);
    }
    log::debug!("worker {} exiting", id);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
