//! Job type.

use serde::Serialize;

use crate::error::{Error, Result};

/// One named request to produce one report.
///
/// The name keys both the dataset (when datasets are per job) and the
/// output file, so it must be usable as a file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Job {
    name: String,
}

impl Job {
    /// Create a job, validating that the name can be used as a file stem.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(Error::InvalidJobName(name));
        }
        Ok(Self { name })
    }

    /// The job name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name of the generated report.
    pub fn output_file_name(&self) -> String {
        format!("{}.pdf", self.name)
    }

    /// File name of the per-job dataset.
    pub fn dataset_file_name(&self) -> String {
        format!("{}.json", self.name)
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_file_names() {
        let job = Job::new("zaposleni-0").unwrap();
        assert_eq!(job.name(), "zaposleni-0");
        assert_eq!(job.output_file_name(), "zaposleni-0.pdf");
        assert_eq!(job.dataset_file_name(), "zaposleni-0.json");
    }

    #[test]
    fn test_job_rejects_unsafe_names() {
        for name in ["", "  ", ".", "..", "a/b", "a\\b", "../etc"] {
            let result = Job::new(name);
            assert!(
                matches!(result, Err(Error::InvalidJobName(_))),
                "{:?} should be rejected",
                name
            );
        }
    }
}
