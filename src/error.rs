//! Error types for rosterpdf.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for rosterpdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating a report.
///
/// Every variant is scoped to a single job. The dispatcher catches them at
/// the worker boundary, so none of them can stop sibling jobs.
#[derive(Error, Debug)]
pub enum Error {
    /// The dataset backing a job does not exist.
    #[error("dataset not found: {}", path.display())]
    DatasetNotFound { path: PathBuf },

    /// I/O failure while reading a dataset.
    #[error("failed to read dataset {}: {source}", path.display())]
    DatasetRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The dataset is not a sequence of well-formed records.
    #[error("failed to decode dataset {}: {source}", path.display())]
    DatasetDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The QR code could not be produced.
    #[error("asset encoding error: {0}")]
    AssetEncode(String),

    /// The document could not be laid out or encoded.
    #[error("layout error: {0}")]
    Layout(String),

    /// The output directory could not be created.
    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The finished document could not be written.
    #[error("failed to write {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The job name cannot be used as a file key.
    #[error("invalid job name: {0:?}")]
    InvalidJobName(String),

    /// A job panicked inside its worker.
    #[error("worker panicked: {0}")]
    WorkerPanic(String),

    /// Uncategorized I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// Pipeline stage at which a job failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Loading or decoding the dataset.
    Source,
    /// Generating the QR asset.
    Asset,
    /// Building the document.
    Layout,
    /// Creating the output directory or writing the file.
    Output,
    /// Accepting or running the job.
    Dispatch,
}

impl Stage {
    /// Human-readable stage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Source => "source",
            Stage::Asset => "asset",
            Stage::Layout => "layout",
            Stage::Output => "output",
            Stage::Dispatch => "dispatch",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// The pipeline stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Error::DatasetNotFound { .. } | Error::DatasetRead { .. } | Error::DatasetDecode { .. } => {
                Stage::Source
            }
            Error::AssetEncode(_) => Stage::Asset,
            Error::Layout(_) => Stage::Layout,
            Error::OutputDir { .. } | Error::OutputWrite { .. } | Error::Io(_) => Stage::Output,
            Error::InvalidJobName(_) | Error::WorkerPanic(_) | Error::Other(_) => Stage::Dispatch,
        }
    }

    /// Whether this is a decode failure of the input dataset.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::DatasetDecode { .. })
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Layout(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Layout(format!("image: {}", err))
    }
}

impl From<qrcode::types::QrError> for Error {
    fn from(err: qrcode::types::QrError) -> Self {
        Error::AssetEncode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DatasetNotFound {
            path: PathBuf::from("data/a.json"),
        };
        assert_eq!(err.to_string(), "dataset not found: data/a.json");

        let err = Error::InvalidJobName("../x".to_string());
        assert_eq!(err.to_string(), "invalid job name: \"../x\"");
    }

    #[test]
    fn test_error_stage() {
        let io_err = || io::Error::new(io::ErrorKind::Other, "boom");

        assert_eq!(Error::AssetEncode("x".into()).stage(), Stage::Asset);
        assert_eq!(Error::Layout("x".into()).stage(), Stage::Layout);
        assert_eq!(
            Error::OutputWrite {
                path: PathBuf::from("pdfs/a.pdf"),
                source: io_err(),
            }
            .stage(),
            Stage::Output
        );
        assert_eq!(
            Error::DatasetRead {
                path: PathBuf::from("a.json"),
                source: io_err(),
            }
            .stage(),
            Stage::Source
        );
        assert_eq!(Error::WorkerPanic("x".into()).stage(), Stage::Dispatch);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_decode_error_flag() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = Error::DatasetDecode {
            path: PathBuf::from("a.json"),
            source,
        };
        assert!(err.is_decode());
        assert_eq!(err.stage(), Stage::Source);
    }
}
