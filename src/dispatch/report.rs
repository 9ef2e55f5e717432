//! Per-job reports and batch summaries.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::error::{Error, Stage};

/// What a successful job produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutput {
    /// Where the report was written
    pub path: PathBuf,
    /// Number of pages
    pub pages: u32,
    /// Number of body rows
    pub rows: usize,
    /// Rows that extend past the bottom margin
    pub overflow_rows: usize,
    /// Whether the QR code made it into the header
    pub asset_embedded: bool,
}

/// Result of one job.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    /// The report was written.
    Succeeded(JobOutput),
    /// The job failed; no report was written.
    Failed {
        stage: Stage,
        #[serde(serialize_with = "serialize_display")]
        error: Error,
    },
}

impl JobOutcome {
    fn from_result(result: crate::Result<JobOutput>) -> Self {
        match result {
            Ok(output) => JobOutcome::Succeeded(output),
            Err(error) => JobOutcome::Failed {
                stage: error.stage(),
                error,
            },
        }
    }
}

/// Completion report for one job.
#[derive(Debug, Serialize)]
pub struct JobReport {
    /// Job name
    pub job: String,

    /// Worker that ran the job; `None` when it was rejected at submission
    pub worker: Option<usize>,

    /// Wall time spent on the job
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,

    /// Outcome
    pub outcome: JobOutcome,
}

impl JobReport {
    /// Build a report from a handler result.
    pub fn new(
        job: impl Into<String>,
        worker: Option<usize>,
        elapsed: Duration,
        result: crate::Result<JobOutput>,
    ) -> Self {
        Self {
            job: job.into(),
            worker,
            elapsed,
            outcome: JobOutcome::from_result(result),
        }
    }

    /// Whether the job succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, JobOutcome::Succeeded(_))
    }

    /// The output, if the job succeeded.
    pub fn output(&self) -> Option<&JobOutput> {
        match &self.outcome {
            JobOutcome::Succeeded(output) => Some(output),
            JobOutcome::Failed { .. } => None,
        }
    }

    /// The error, if the job failed.
    pub fn error(&self) -> Option<&Error> {
        match &self.outcome {
            JobOutcome::Succeeded(_) => None,
            JobOutcome::Failed { error, .. } => Some(error),
        }
    }

    /// The failing stage, if the job failed.
    pub fn stage(&self) -> Option<Stage> {
        match &self.outcome {
            JobOutcome::Succeeded(_) => None,
            JobOutcome::Failed { stage, .. } => Some(*stage),
        }
    }
}

/// All reports from one dispatcher run.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    /// Jobs that were attempted (including ones rejected at submission)
    pub attempted: usize,
    /// Jobs that produced a report
    pub succeeded: usize,
    /// Jobs that failed
    pub failed: usize,
    /// Names dropped because they were already submitted
    pub skipped_duplicates: Vec<String>,
    /// Per-job reports, in completion order
    pub reports: Vec<JobReport>,
}

impl BatchSummary {
    /// Aggregate reports.
    pub fn new(reports: Vec<JobReport>, skipped_duplicates: Vec<String>) -> Self {
        let succeeded = reports.iter().filter(|r| r.is_success()).count();
        Self {
            attempted: reports.len(),
            succeeded,
            failed: reports.len() - succeeded,
            skipped_duplicates,
            reports,
        }
    }

    /// Whether every attempted job succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Find the report for a job.
    pub fn report(&self, job: &str) -> Option<&JobReport> {
        self.reports.iter().find(|r| r.job == job)
    }

    /// Failed reports.
    pub fn failures(&self) -> impl Iterator<Item = &JobReport> {
        self.reports.iter().filter(|r| !r.is_success())
    }
}

fn serialize_display<S: Serializer>(err: &Error, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(name: &str) -> JobOutput {
        JobOutput {
            path: PathBuf::from(format!("pdfs/{}.pdf", name)),
            pages: 1,
            rows: 2,
            overflow_rows: 0,
            asset_embedded: true,
        }
    }

    #[test]
    fn test_summary_counts() {
        let reports = vec![
            JobReport::new("a", Some(0), Duration::from_millis(5), Ok(output("a"))),
            JobReport::new(
                "b",
                Some(1),
                Duration::from_millis(3),
                Err(Error::Layout("bad".into())),
            ),
        ];
        let summary = BatchSummary::new(reports, vec!["a".to_string()]);

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_succeeded());
        assert_eq!(summary.report("b").and_then(|r| r.stage()), Some(Stage::Layout));
        assert_eq!(summary.failures().count(), 1);
    }

    #[test]
    fn test_report_serialization() {
        let ok = JobReport::new("a", Some(0), Duration::from_millis(12), Ok(output("a")));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["job"], "a");
        assert_eq!(json["elapsed_ms"], 12);
        assert_eq!(json["outcome"]["status"], "succeeded");
        assert_eq!(json["outcome"]["path"], "pdfs/a.pdf");

        let failed = JobReport::new(
            "b",
            None,
            Duration::ZERO,
            Err(Error::InvalidJobName("b/c".into())),
        );
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["worker"], serde_json::Value::Null);
        assert_eq!(json["outcome"]["status"], "failed");
        assert_eq!(json["outcome"]["stage"], "dispatch");
        assert_eq!(json["outcome"]["error"], "invalid job name: \"b/c\"");
    }
}
